use crate::cleaning::error::TransformError;
use crate::cleaning::frame::{
    coalesce, drop_duplicates_keep_first, float_values, project, require_columns, string_values,
};
use crate::cleaning::normalize::normalize_municipality_name;
use crate::config::{CoalescedColumn, MunicipalityConfig};
use log::info;
use ordered_float::OrderedFloat;
use polars::prelude::*;
use std::cmp::Reverse;

const DATASET: &str = "municipality";

fn coalesced_text(
    df: &DataFrame,
    column: &CoalescedColumn,
) -> Result<Vec<Option<String>>, TransformError> {
    let read = |name: &str| -> Result<Vec<Option<String>>, TransformError> {
        Ok(string_values(df, name)?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    };
    let fallback = column.fallback.as_deref().map(read).transpose()?;
    Ok(coalesce(read(&column.primary)?, fallback))
}

fn coalesced_float(
    df: &DataFrame,
    column: &CoalescedColumn,
) -> Result<Vec<Option<f64>>, TransformError> {
    let read = |name: &str| -> Result<Vec<Option<f64>>, TransformError> {
        Ok(float_values(df, DATASET, name)?.into_iter().collect())
    };
    let fallback = column.fallback.as_deref().map(read).transpose()?;
    Ok(coalesce(read(&column.primary)?, fallback))
}

/// Cleans the municipality gazetteer down to one row per normalised name.
///
/// The name, latitude and longitude are each taken from their primary column, or from the
/// fallback column where the primary is null. Rows are then ordered by population, largest
/// first (unknown populations last, ties in file order), and only the first row of each
/// normalised name is kept. Coordinates missing from both sources stay null.
///
/// # Errors
///
/// [`TransformError::MissingColumn`] when a configured source column is absent,
/// [`TransformError::ColumnType`] when a coordinate or population column is not numeric text.
pub fn clean_municipality(
    df: &DataFrame,
    config: &MunicipalityConfig,
) -> Result<DataFrame, TransformError> {
    require_columns(
        df,
        DATASET,
        config
            .name
            .sources()
            .chain(config.latitude.sources())
            .chain(config.longitude.sources())
            .chain(std::iter::once(&config.population_column)),
    )?;

    let names: Vec<Option<String>> = coalesced_text(df, &config.name)?
        .into_iter()
        .map(|name| name.map(|n| normalize_municipality_name(&n)))
        .collect();
    let latitudes = coalesced_float(df, &config.latitude)?;
    let longitudes = coalesced_float(df, &config.longitude)?;

    let mut resolved = df.clone();
    resolved.with_column(Series::new(config.name.cleaned.as_str().into(), names))?;
    resolved.with_column(Series::new(config.latitude.cleaned.as_str().into(), latitudes))?;
    resolved.with_column(Series::new(config.longitude.cleaned.as_str().into(), longitudes))?;

    let population = float_values(df, DATASET, &config.population_column)?;
    let mut order: Vec<IdxSize> = (0..df.height() as IdxSize).collect();
    order.sort_by_key(|&row| Reverse(population.get(row as usize).map(OrderedFloat)));
    let by_population = resolved.take(&IdxCa::from_vec("row".into(), order))?;

    let unique = drop_duplicates_keep_first(
        &by_population,
        std::slice::from_ref(&config.name.cleaned),
    )?;
    let cleaned = project(&unique, DATASET, &config.required_columns)?;

    info!(
        "Municipality cleaning kept {} of {} rows",
        cleaned.height(),
        df.height()
    );
    Ok(cleaned)
}
