use crate::cleaning::dates::{parse_compact_date, parse_date_column};
use crate::cleaning::error::TransformError;
use crate::cleaning::frame::{drop_nulls_in, float_values, project};
use crate::config::WeatherConfig;
use crate::geo::lambert::lambert2e_to_wgs84;
use log::info;
use polars::prelude::*;

const DATASET: &str = "weather";

/// Cleans the gridded daily weather table.
///
/// The table is projected onto [`WeatherConfig::required_columns`] and rows null in
/// [`WeatherConfig::dropna_columns`] are dropped. Grid coordinates are multiplied by
/// [`WeatherConfig::grid_scale`], reprojected from Lambert II étendu to WGS84 into the
/// [`WeatherConfig::geo`] columns and then dropped. Snowfall and rainfall are read as numbers
/// and the compact date code becomes a calendar date; rows whose date does not parse are dropped.
///
/// # Errors
///
/// [`TransformError::MissingColumn`] when a required column is absent,
/// [`TransformError::ColumnType`] when a grid or precipitation column is not numeric.
pub fn clean_weather(df: &DataFrame, config: &WeatherConfig) -> Result<DataFrame, TransformError> {
    let projected = project(df, DATASET, &config.required_columns)?;
    let complete = drop_nulls_in(&projected, &config.dropna_columns)?;

    let scale = config.grid_scale.unwrap_or(1.0);
    let xs = float_values(&complete, DATASET, &config.lambert.x)?;
    let ys = float_values(&complete, DATASET, &config.lambert.y)?;
    let (lat, lon): (Vec<Option<f64>>, Vec<Option<f64>>) = xs
        .into_iter()
        .zip(ys.into_iter())
        .map(|point| match point {
            (Some(x), Some(y)) => {
                let location = lambert2e_to_wgs84(x * scale, y * scale);
                (Some(location.latitude()), Some(location.longitude()))
            }
            _ => (None, None),
        })
        .unzip();

    let mut located = complete.drop_many([config.lambert.x.as_str(), config.lambert.y.as_str()]);
    located.with_column(Series::new(config.geo.lat.as_str().into(), lat))?;
    located.with_column(Series::new(config.geo.lon.as_str().into(), lon))?;
    for column in [&config.snowfall_column, &config.rainfall_column] {
        let amounts = float_values(&located, DATASET, column)?;
        located.with_column(amounts.into_series())?;
    }

    let (cleaned, undated) = parse_date_column(&located, &config.date_column, parse_compact_date)?;
    info!(
        "Weather cleaning kept {} of {} rows ({} incomplete, {} with an invalid date)",
        cleaned.height(),
        df.height(),
        projected.height() - complete.height(),
        undated
    );
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_clean_weather() -> Result<(), Box<dyn std::error::Error>> {
        let raw = df!(
            "LAMBX" => [Some(6000i64), Some(6012), None, Some(6000)],
            "LAMBY" => [Some(22000i64), Some(24287), Some(24287), Some(22000)],
            "DATE" => [20240301i64, 20240301, 20240301, 20240230],
            "PRENEI" => [Some(0.0), None, Some(0.0), Some(1.0)],
            "PRELIQ" => [1.2, 0.4, 3.3, 0.0],
            "T" => [10.1, 9.8, 7.0, 3.0],
        )?;

        let cleaned = clean_weather(&raw, &WeatherConfig::default())?;

        // Null LAMBX and the impossible 30 February are gone
        assert_eq!(cleaned.height(), 2);
        let names: Vec<String> = cleaned
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["DATE", "PRENEI", "PRELIQ", "lat", "lon"]);

        let lat = cleaned.column("lat")?.f64()?;
        let lon = cleaned.column("lon")?.f64()?;
        assert!((lat.get(0).unwrap() - 46.799_948_78).abs() < 1e-6);
        assert!((lon.get(0).unwrap() - 2.336_533_61).abs() < 1e-6);
        assert!((lat.get(1).unwrap() - 48.856_6).abs() < 1e-2);

        // Null snowfall is not an essential column
        assert_eq!(cleaned.column("PRENEI")?.f64()?.get(1), None);
        let dates: Vec<_> = cleaned.column("DATE")?.date()?.as_date_iter().collect();
        assert_eq!(dates, vec![NaiveDate::from_ymd_opt(2024, 3, 1); 2]);
        Ok(())
    }

    #[test]
    fn test_unscaled_grid() -> Result<(), Box<dyn std::error::Error>> {
        let raw = df!(
            "LAMBX" => [600_000.0],
            "LAMBY" => [2_200_000.0],
            "DATE" => ["20240301"],
            "PRENEI" => [0.0],
            "PRELIQ" => [0.0],
        )?;
        let config = WeatherConfig {
            grid_scale: None,
            ..WeatherConfig::default()
        };
        let cleaned = clean_weather(&raw, &config)?;
        assert!((cleaned.column("lat")?.f64()?.get(0).unwrap() - 46.8).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn test_missing_required_column() -> Result<(), Box<dyn std::error::Error>> {
        let raw = df!("LAMBX" => [6000], "LAMBY" => [22000], "DATE" => [20240301])?;
        assert!(matches!(
            clean_weather(&raw, &WeatherConfig::default()),
            Err(TransformError::MissingColumn { column, .. }) if column == "PRENEI"
        ));
        Ok(())
    }
}
