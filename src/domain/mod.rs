pub mod record;
pub mod selection;
pub mod snapshot;

pub use record::RowValidationError;
pub use selection::{DateRange, FilterSelection, QuickFilter};
pub use snapshot::RenderSnapshot;
