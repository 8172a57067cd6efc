use crate::store::LoadError;

/// Errors surfaced by request handlers. Render-time conditions such as an
/// empty selection are not errors and never appear here.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Dataset Error: {0}")]
    Load(#[from] LoadError),
    #[error("Spreadsheet Error: {0}")]
    XlsxError(String),
    #[error("Internal Server Error")]
    InternalError,
}
