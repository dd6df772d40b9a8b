use steam_reviews_sources::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    /// The first page request failed, so there is nothing to return
    #[error("Review source unavailable for app {source_id}: {source}")]
    SourceUnavailable {
        source_id: String,
        #[source]
        source: SourceError,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("Document error: {0}")]
    Document(String),
}
