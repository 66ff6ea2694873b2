use thiserror::Error;

/// Batch-level ingestion failures. Record-level problems are counted, not
/// raised.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source unavailable at {path}: {source}")]
    SourceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("no creators loaded; cannot link observations")]
    EmptyPopulation,
}
