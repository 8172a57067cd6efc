// responses/xlsx.rs
use crate::errors::ServerError;
use crate::responses::ResultResp;
use astra::{Body, ResponseBuilder};
use rust_xlsxwriter::Workbook;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Serialize a finished workbook and send it as a download.
pub fn xlsx_response(workbook: &mut Workbook, filename: &str) -> ResultResp {
    let buffer = workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {e}")))?;

    ResponseBuilder::new()
        .status(200)
        .header("Content-Type", XLSX_CONTENT_TYPE)
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        )
        .header("Content-Length", buffer.len())
        .body(Body::from(buffer))
        .map_err(|_| ServerError::InternalError)
}
