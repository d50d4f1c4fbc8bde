use crate::cleaning::error::TransformError;
use crate::config::PipelineConfig;
use crate::association::associate::WeatherAssociator;
use crate::LatLon;
use chrono::NaiveDate;
use polars::prelude::*;

/// One row of the associated dataset: a radiation sample, where it was taken and the weather
/// observed nearby on the same day.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociatedRecord {
    pub sampling_start: NaiveDate,
    pub sampling_end: Option<String>,
    pub result: Option<String>,
    pub uncertainty: Option<String>,
    pub unit: Option<String>,
    pub municipality: Option<String>,
    pub species: Option<String>,
    pub nature: Option<String>,
    pub radionuclide: Option<String>,
    pub medium: Option<String>,
    pub location: LatLon,
    pub weather_date: NaiveDate,
    pub snowfall: Option<f64>,
    pub rainfall: Option<f64>,
    /// Great-circle distance between the sampling site and the weather point, meters.
    pub distance_m: f64,
}

fn get_column<'a>(df: &'a DataFrame, col: &str) -> Result<&'a Column, TransformError> {
    df.column(col).map_err(|_| TransformError::MissingColumn {
        dataset: "associated",
        column: col.to_string(),
    })
}

fn text_column(df: &DataFrame, col: &str) -> Result<StringChunked, TransformError> {
    let casted = get_column(df, col)?.cast(&DataType::String)?;
    Ok(casted.str()?.clone())
}

fn float_column(df: &DataFrame, col: &str) -> Result<Float64Chunked, TransformError> {
    let casted = get_column(df, col)?.cast(&DataType::Float64)?;
    Ok(casted.f64()?.clone())
}

fn date_column(df: &DataFrame, col: &str) -> Result<Vec<Option<NaiveDate>>, TransformError> {
    let column = get_column(df, col)?;
    let dates = column.date().map_err(|_| TransformError::ColumnType {
        dataset: "associated",
        column: col.to_string(),
        expected: "a calendar date",
        found: column.dtype().clone(),
    })?;
    Ok(dates.as_date_iter().collect())
}

fn required<T>(value: Option<T>, col: &str, row: usize) -> Result<T, TransformError> {
    value.ok_or_else(|| TransformError::NullValue {
        column: col.to_string(),
        row,
    })
}

impl AssociatedRecord {
    /// Reads the rows of an associated table, before output labels are applied.
    ///
    /// # Errors
    ///
    /// [`TransformError::MissingColumn`] when an expected column is absent and
    /// [`TransformError::NullValue`] when a date, coordinate or distance is null.
    pub fn from_frame(
        df: &DataFrame,
        config: &PipelineConfig,
    ) -> Result<Vec<AssociatedRecord>, TransformError> {
        let rad = &config.radiation;
        let mun = &config.municipality;
        let associator = WeatherAssociator::from_config(config);

        let start = date_column(df, &rad.date_start_column)?;
        let end = text_column(df, &rad.date_end_column)?;
        let result = text_column(df, &rad.result_column)?;
        let uncertainty = text_column(df, &rad.uncertainty_column)?;
        let unit = text_column(df, &rad.unit_column)?;
        let municipality = text_column(df, &rad.municipality_column)?;
        let species = text_column(df, &rad.species_column)?;
        let nature = text_column(df, &rad.nature_column)?;
        let radionuclide = text_column(df, &rad.radionuclide_column)?;
        let medium = text_column(df, &rad.medium_column)?;
        let lat = float_column(df, &mun.latitude.cleaned)?;
        let lon = float_column(df, &mun.longitude.cleaned)?;
        let weather_date = date_column(df, associator.matched_date_column())?;
        let snowfall = float_column(df, &config.weather.snowfall_column)?;
        let rainfall = float_column(df, &config.weather.rainfall_column)?;
        let distance = float_column(df, associator.distance_column())?;

        let owned = |ca: &StringChunked, row: usize| ca.get(row).map(str::to_string);

        (0..df.height())
            .map(|row| {
                Ok(AssociatedRecord {
                    sampling_start: required(start[row], &rad.date_start_column, row)?,
                    sampling_end: owned(&end, row),
                    result: owned(&result, row),
                    uncertainty: owned(&uncertainty, row),
                    unit: owned(&unit, row),
                    municipality: owned(&municipality, row),
                    species: owned(&species, row),
                    nature: owned(&nature, row),
                    radionuclide: owned(&radionuclide, row),
                    medium: owned(&medium, row),
                    location: LatLon(
                        required(lat.get(row), &mun.latitude.cleaned, row)?,
                        required(lon.get(row), &mun.longitude.cleaned, row)?,
                    ),
                    weather_date: required(
                        weather_date[row],
                        associator.matched_date_column(),
                        row,
                    )?,
                    snowfall: snowfall.get(row),
                    rainfall: rainfall.get(row),
                    distance_m: required(distance.get(row), associator.distance_column(), row)?,
                })
            })
            .collect()
    }
}
