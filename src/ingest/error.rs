use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid file pattern '{0}'")]
    Pattern(String, #[source] glob::PatternError),

    #[error("Failed to list files matching '{0}'")]
    Glob(String, #[source] glob::GlobError),

    #[error("File name '{0}' has no medium token (expected <prefix>_<medium>_...)")]
    MediumToken(PathBuf),

    #[error("Failed to read '{0}'")]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to decompress gzip file '{0}'")]
    Gzip(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse CSV file '{0}'")]
    CsvParse(PathBuf, #[source] PolarsError),

    #[error("Columns of '{path}' do not match previously loaded files (expected {expected:?}, found {found:?})")]
    SchemaMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to clear output directory '{0}'")]
    OutputDirClear(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing CSV output '{0}'")]
    CsvWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing CSV output '{0}'")]
    CsvWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to move finished output into place at '{0}'")]
    Persist(PathBuf, #[source] tempfile::PersistError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
