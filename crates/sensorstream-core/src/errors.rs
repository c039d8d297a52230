//! Sample source error types

use thiserror::Error;

/// Errors raised while loading a sample source
///
/// All of these are fatal at startup: the process must not begin ingesting
/// without a non-empty source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File could not be opened or read
    #[error("failed to read sample source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV reader failed on a record
    #[error("CSV parse error at line {line} in {path}: {source}")]
    CsvParse {
        path: String,
        line: u64,
        #[source]
        source: csv::Error,
    },

    /// Source contained no data rows
    #[error("no data rows found in sample source {path}")]
    Empty { path: String },
}
