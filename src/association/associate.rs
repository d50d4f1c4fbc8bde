//! The spatio-temporal association: every geolocated radiation sample is paired with the
//! nearest weather grid point observed on its sampling day.

use crate::cleaning::error::TransformError;
use crate::cleaning::frame::{float_values, require_columns};
use crate::config::PipelineConfig;
use crate::geo::nearest::{nearest_same_day, DatedPoint, NearestMatch};
use crate::types::retention::Retention;
use crate::LatLon;
use bon::bon;
use chrono::NaiveDate;
use log::info;
use polars::prelude::*;

/// Radiation rows extended with their matched weather observation.
#[derive(Debug, Clone)]
pub struct Associated {
    pub frame: DataFrame,
    /// Rows that found a same-day weather point within range, out of all geolocated rows.
    pub retention: Retention,
}

/// Joins geolocated radiation samples to same-day weather observations.
///
/// Built once from the column configuration, then applied with [`WeatherAssociator::associate`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherAssociator {
    radiation_date: String,
    radiation_lat: String,
    radiation_lon: String,
    weather_date: String,
    weather_lat: String,
    weather_lon: String,
    snowfall: String,
    rainfall: String,
    matched_date: String,
    distance: String,
    max_distance_m: f64,
    parallel: bool,
}

impl WeatherAssociator {
    pub fn from_config(config: &PipelineConfig) -> Self {
        let weather = &config.weather;
        let association = &config.association;
        Self {
            radiation_date: config.radiation.date_start_column.clone(),
            radiation_lat: config.municipality.latitude.cleaned.clone(),
            radiation_lon: config.municipality.longitude.cleaned.clone(),
            weather_date: weather.date_column.clone(),
            weather_lat: weather.geo.lat.clone(),
            weather_lon: weather.geo.lon.clone(),
            snowfall: weather.snowfall_column.clone(),
            rainfall: weather.rainfall_column.clone(),
            matched_date: format!("{}{}", weather.date_column, association.weather_date_suffix),
            distance: association.distance_column.clone(),
            max_distance_m: association.max_distance_m,
            parallel: association.parallel,
        }
    }

    /// Name of the matched weather date column in the output.
    pub fn matched_date_column(&self) -> &str {
        &self.matched_date
    }

    /// Name of the distance column in the output.
    pub fn distance_column(&self) -> &str {
        &self.distance
    }
}

#[bon]
impl WeatherAssociator {
    /// Pairs every radiation row with the nearest weather point of the same day.
    ///
    /// Rows are kept only when such a point exists within `max_distance_m` (defaults to the
    /// configured bound). Each kept row gets the weather point's date, snowfall and rainfall
    /// plus the great-circle distance in meters. Output rows are ordered by sampling day, then
    /// by their position in `radiation`; `parallel` spreads days over the rayon pool without
    /// changing that order.
    ///
    /// Both date columns must already be calendar dates.
    ///
    /// # Examples
    ///
    /// ```
    /// use polars::prelude::*;
    /// use raindust::{PipelineConfig, WeatherAssociator};
    /// use chrono::NaiveDate;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    /// let radiation = df!(
    ///     "Date de début de prélèvement" => [day],
    ///     "latitude" => [42.6336],
    ///     "longitude" => [8.9375],
    /// )?;
    /// let weather = df!(
    ///     "DATE" => [day, day],
    ///     "lat" => [42.6380, 43.3],
    ///     "lon" => [8.9360, 9.0],
    ///     "PRENEI" => [0.0, 2.0],
    ///     "PRELIQ" => [4.2, 0.0],
    /// )?;
    ///
    /// let associator = WeatherAssociator::from_config(&PipelineConfig::default());
    /// let associated = associator
    ///     .associate()
    ///     .radiation(&radiation)
    ///     .weather(&weather)
    ///     .call()?;
    ///
    /// assert_eq!(associated.frame.height(), 1);
    /// assert_eq!(associated.frame.column("PRELIQ")?.f64()?.get(0), Some(4.2));
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn associate(
        &self,
        radiation: &DataFrame,
        weather: &DataFrame,
        max_distance_m: Option<f64>,
        parallel: Option<bool>,
    ) -> Result<Associated, TransformError> {
        let max_distance_m = max_distance_m.unwrap_or(self.max_distance_m);
        let parallel = parallel.unwrap_or(self.parallel);

        require_columns(
            radiation,
            "radiation",
            [&self.radiation_date, &self.radiation_lat, &self.radiation_lon],
        )?;
        require_columns(
            weather,
            "weather",
            [
                &self.weather_date,
                &self.weather_lat,
                &self.weather_lon,
                &self.snowfall,
                &self.rainfall,
            ],
        )?;

        let samples = dated_points(
            radiation,
            "radiation",
            &self.radiation_date,
            &self.radiation_lat,
            &self.radiation_lon,
        )?;
        let observations = dated_points(
            weather,
            "weather",
            &self.weather_date,
            &self.weather_lat,
            &self.weather_lon,
        )?;

        let matches = nearest_same_day(&samples, &observations, max_distance_m, parallel);
        let frame = self.assemble(radiation, weather, &matches)?;
        let retention = Retention::new(matches.len(), radiation.height());
        info!(
            "Association within {} m retained {} radiation rows",
            max_distance_m, retention
        );
        Ok(Associated { frame, retention })
    }
}

impl WeatherAssociator {
    fn assemble(
        &self,
        radiation: &DataFrame,
        weather: &DataFrame,
        matches: &[NearestMatch],
    ) -> Result<DataFrame, TransformError> {
        let sample_rows = IdxCa::from_vec(
            "sample".into(),
            matches.iter().map(|m| m.query as IdxSize).collect(),
        );
        let observation_rows = IdxCa::from_vec(
            "observation".into(),
            matches.iter().map(|m| m.target as IdxSize).collect(),
        );

        let mut frame = radiation.take(&sample_rows)?;
        let matched_date = weather
            .column(&self.weather_date)?
            .take(&observation_rows)?
            .with_name(self.matched_date.as_str().into());
        frame.with_column(matched_date)?;
        for column in [&self.snowfall, &self.rainfall] {
            let amounts = float_values(weather, "weather", column)?.take(&observation_rows)?;
            frame.with_column(amounts.into_series())?;
        }
        let distances: Vec<f64> = matches.iter().map(|m| m.distance_m).collect();
        frame.with_column(Series::new(self.distance.as_str().into(), distances))?;
        Ok(frame)
    }
}

/// Reads one dated location per row. Rows with a null date or coordinate become non-finite
/// points so that positions keep matching row numbers; the join leaves them out.
fn dated_points(
    df: &DataFrame,
    dataset: &'static str,
    date: &str,
    lat: &str,
    lon: &str,
) -> Result<Vec<DatedPoint>, TransformError> {
    let dates = df.column(date)?;
    if dates.dtype() != &DataType::Date {
        return Err(TransformError::ColumnType {
            dataset,
            column: date.to_string(),
            expected: "a calendar date",
            found: dates.dtype().clone(),
        });
    }
    let lats = float_values(df, dataset, lat)?;
    let lons = float_values(df, dataset, lon)?;

    Ok(dates
        .date()?
        .as_date_iter()
        .zip(lats.into_iter())
        .zip(lons.into_iter())
        .map(|((day, lat), lon)| match (day, lat, lon) {
            (Some(day), Some(lat), Some(lon)) => DatedPoint::new(day, LatLon(lat, lon)),
            _ => DatedPoint::new(NaiveDate::MIN, LatLon(f64::NAN, f64::NAN)),
        })
        .collect())
}
