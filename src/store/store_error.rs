use crate::domain::record::RowValidationError;

/// The dataset's shape is wrong. Always fatal for the load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("no row has a valid value in columns: {}", .0.join(", "))]
    UnparsableColumns(Vec<String>),
}

/// Everything that can abort a dataset load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("invalid row (strict mode): {0}")]
    Row(#[from] RowValidationError),
}
