use polars::error::PolarsError;
use polars::prelude::DataType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{dataset} table is missing required column '{column}'")]
    MissingColumn {
        dataset: &'static str,
        column: String,
    },

    #[error("{dataset} column '{column}' has type {found}, expected {expected}")]
    ColumnType {
        dataset: &'static str,
        column: String,
        expected: &'static str,
        found: DataType,
    },

    #[error("Column '{column}' is null at row {row}")]
    NullValue { column: String, row: usize },

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),
}
