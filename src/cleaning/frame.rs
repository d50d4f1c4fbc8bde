//! Table operations shared by the cleaners and the joins.

use crate::cleaning::error::TransformError;
use polars::prelude::*;
use std::collections::HashSet;

/// Fails with [`TransformError::MissingColumn`] on the first of `columns` absent from `df`.
pub fn require_columns<'a>(
    df: &DataFrame,
    dataset: &'static str,
    columns: impl IntoIterator<Item = &'a String>,
) -> Result<(), TransformError> {
    for column in columns {
        if df.column(column).is_err() {
            return Err(TransformError::MissingColumn {
                dataset,
                column: column.clone(),
            });
        }
    }
    Ok(())
}

/// Keeps only `columns`, in that order.
pub fn project(
    df: &DataFrame,
    dataset: &'static str,
    columns: &[String],
) -> Result<DataFrame, TransformError> {
    require_columns(df, dataset, columns)?;
    Ok(df.select(columns.iter().map(String::as_str))?)
}

/// Drops the rows holding a null in any of `columns`.
pub fn drop_nulls_in(df: &DataFrame, columns: &[String]) -> Result<DataFrame, TransformError> {
    let mut keep = BooleanChunked::full("keep".into(), true, df.height());
    for column in columns {
        let present = df.column(column)?.as_materialized_series().is_not_null();
        keep = &keep & &present;
    }
    Ok(df.filter(&keep)?)
}

/// Drops the rows whose values in `columns` repeat an earlier row, keeping the first occurrence.
///
/// Values are compared through their text rendering; two nulls compare equal.
pub fn drop_duplicates_keep_first(
    df: &DataFrame,
    columns: &[String],
) -> Result<DataFrame, TransformError> {
    let keys = columns
        .iter()
        .map(|column| df.column(column)?.cast(&DataType::String))
        .collect::<PolarsResult<Vec<Column>>>()?;
    let keys = keys
        .iter()
        .map(|column| column.str())
        .collect::<PolarsResult<Vec<&StringChunked>>>()?;

    let mut seen: HashSet<Vec<Option<&str>>> = HashSet::with_capacity(df.height());
    let mut rows: Vec<IdxSize> = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let key: Vec<Option<&str>> = keys.iter().map(|ca| ca.get(row)).collect();
        if seen.insert(key) {
            rows.push(row as IdxSize);
        }
    }

    if rows.len() == df.height() {
        return Ok(df.clone());
    }
    Ok(df.take(&IdxCa::from_vec("row".into(), rows))?)
}

/// A zero-row table with `columns`, all typed as text.
pub fn empty_table(columns: &[String]) -> Result<DataFrame, TransformError> {
    let columns = columns
        .iter()
        .map(|name| Series::new_empty(name.as_str().into(), &DataType::String).into_column())
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Reads `column` as text, rendering numbers and dates as strings.
pub fn string_values(df: &DataFrame, column: &str) -> Result<StringChunked, TransformError> {
    let casted = df.column(column)?.cast(&DataType::String)?;
    Ok(casted.str()?.clone())
}

/// Reads `column` as `f64`. Text that does not parse as a number becomes null.
pub fn float_values(
    df: &DataFrame,
    dataset: &'static str,
    column: &str,
) -> Result<Float64Chunked, TransformError> {
    let source = df.column(column)?;
    let dtype = source.dtype();
    let castable = dtype.is_float()
        || dtype.is_integer()
        || matches!(dtype, DataType::String | DataType::Null);
    if !castable {
        return Err(TransformError::ColumnType {
            dataset,
            column: column.to_string(),
            expected: "a number",
            found: dtype.clone(),
        });
    }
    let casted = source.cast(&DataType::Float64)?;
    Ok(casted.f64()?.clone())
}

/// Per-row first non-null of `primary` and `fallback`.
pub fn coalesce<T: Clone>(
    primary: Vec<Option<T>>,
    fallback: Option<Vec<Option<T>>>,
) -> Vec<Option<T>> {
    match fallback {
        None => primary,
        Some(fallback) => primary
            .into_iter()
            .zip(fallback)
            .map(|(p, f)| p.or(f))
            .collect(),
    }
}
