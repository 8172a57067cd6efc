pub mod export_xlsx;

pub use export_xlsx::dashboard_workbook;
