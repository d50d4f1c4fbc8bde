use crate::cleaning::dates::{parse_date_column, parse_sampling_date};
use crate::cleaning::error::TransformError;
use crate::cleaning::frame::{drop_nulls_in, require_columns, string_values};
use crate::config::{MunicipalityConfig, RadiationConfig};
use crate::types::retention::Retention;
use log::info;
use polars::prelude::*;
use std::collections::HashMap;

/// Radiation rows carrying the coordinates of their municipality.
#[derive(Debug, Clone)]
pub struct Geolocated {
    pub frame: DataFrame,
    /// Rows whose municipality was found with a latitude, out of all cleaned radiation rows.
    pub retention: Retention,
}

/// Attaches municipality coordinates to every radiation row by normalised name.
///
/// Each radiation row looks up the municipality whose cleaned name equals its (normalised)
/// municipality name and receives that municipality's required columns other than the name.
/// Rows without a match, or matched to a municipality without a latitude or longitude, are
/// dropped. The sampling start date is then parsed into a calendar date and rows where it does
/// not parse are dropped too.
///
/// The reported retention counts rows with a non-null matched latitude, before date parsing.
pub fn geolocate_radiation(
    radiation: &DataFrame,
    municipalities: &DataFrame,
    radiation_config: &RadiationConfig,
    municipality_config: &MunicipalityConfig,
) -> Result<Geolocated, TransformError> {
    require_columns(
        radiation,
        "radiation",
        [
            &radiation_config.municipality_column,
            &radiation_config.date_start_column,
        ],
    )?;
    require_columns(
        municipalities,
        "municipality",
        &municipality_config.required_columns,
    )?;
    let name_key = &municipality_config.name.cleaned;
    require_columns(municipalities, "municipality", [name_key])?;

    let municipality_names = string_values(municipalities, name_key)?;
    let mut by_name: HashMap<&str, IdxSize> = HashMap::with_capacity(municipalities.height());
    for (row, name) in municipality_names.into_iter().enumerate() {
        if let Some(name) = name {
            by_name.entry(name).or_insert(row as IdxSize);
        }
    }

    let radiation_names = string_values(radiation, &radiation_config.municipality_column)?;
    let matches: IdxCa = radiation_names
        .into_iter()
        .map(|name| name.and_then(|n| by_name.get(n).copied()))
        .collect();

    let mut joined = radiation.clone();
    for column in municipality_config
        .required_columns
        .iter()
        .filter(|c| *c != name_key)
    {
        let values = municipalities.column(column)?.take(&matches)?;
        joined.with_column(values)?;
    }

    let total = joined.height();
    let located = joined.column(&municipality_config.latitude.cleaned)?;
    let retention = Retention::new(total - located.null_count(), total);

    let coordinates = [
        municipality_config.latitude.cleaned.clone(),
        municipality_config.longitude.cleaned.clone(),
    ];
    let located = drop_nulls_in(&joined, &coordinates)?;
    let (frame, undated) = parse_date_column(
        &located,
        &radiation_config.date_start_column,
        parse_sampling_date,
    )?;

    info!(
        "Geolocation retained {} radiation rows ({} without a sampling date)",
        retention, undated
    );
    Ok(Geolocated { frame, retention })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn municipalities() -> PolarsResult<DataFrame> {
        df!(
            "nom_normalise" => ["ILE-ROUSSE", "CORTE", "SARTENE"],
            "latitude" => [Some(42.6336), Some(42.3061), None],
            "longitude" => [Some(8.9375), Some(9.1497), Some(8.9728)],
        )
    }

    fn radiation() -> PolarsResult<DataFrame> {
        df!(
            "Date de début de prélèvement" => ["2024-03-01", "02/03/2024", "2024-03-03", "2024-03-04", "unknown"],
            "Commune" => ["ILE-ROUSSE", "CORTE", "ATLANTIS", "SARTENE", "CORTE"],
            "Résultat" => ["12.5", "3.1", "0.4", "1.0", "2.2"],
        )
    }

    #[test]
    fn test_unmatched_rows_dropped() -> Result<(), Box<dyn std::error::Error>> {
        let geolocated = geolocate_radiation(
            &radiation()?,
            &municipalities()?,
            &RadiationConfig::default(),
            &MunicipalityConfig::default(),
        )?;

        // ATLANTIS is unknown and SARTENE has no latitude
        assert_eq!(geolocated.retention, Retention::new(3, 5));
        // The undated CORTE row is dropped after the retention is measured
        let frame = &geolocated.frame;
        assert_eq!(frame.height(), 2);

        let communes: Vec<_> = frame.column("Commune")?.str()?.into_iter().collect();
        assert_eq!(communes, vec![Some("ILE-ROUSSE"), Some("CORTE")]);
        let lat: Vec<_> = frame.column("latitude")?.f64()?.into_iter().collect();
        assert_eq!(lat, vec![Some(42.6336), Some(42.3061)]);
        assert!(frame.column("nom_normalise").is_err());

        let dates: Vec<_> = frame
            .column("Date de début de prélèvement")?
            .date()?
            .as_date_iter()
            .collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 1),
                NaiveDate::from_ymd_opt(2024, 3, 2)
            ]
        );
        Ok(())
    }

    #[test]
    fn test_empty_radiation() -> Result<(), Box<dyn std::error::Error>> {
        let config = RadiationConfig::default();
        let empty = crate::cleaning::frame::empty_table(&config.required_columns)?;
        let geolocated = geolocate_radiation(
            &empty,
            &municipalities()?,
            &config,
            &MunicipalityConfig::default(),
        )?;
        assert_eq!(geolocated.frame.height(), 0);
        assert_eq!(geolocated.retention.ratio(), None);
        assert!(geolocated.frame.column("latitude").is_ok());
        Ok(())
    }
}
