use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesAnalyticsError {
    #[error("Data source error for '{path}': {details}")]
    DataSource { path: String, details: String },

    #[error("Validation failed for field '{field}': {details}")]
    Validation { field: &'static str, details: String },

    #[error("Invalid parameter '{param}': {details}")]
    InvalidParameter { param: &'static str, details: String },

    #[error("Unknown analysis kind: {0}")]
    UnknownAnalysis(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SalesAnalyticsError>;
