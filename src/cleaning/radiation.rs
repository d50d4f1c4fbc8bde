use crate::cleaning::error::TransformError;
use crate::cleaning::frame::{
    drop_duplicates_keep_first, drop_nulls_in, empty_table, project, require_columns,
};
use crate::cleaning::normalize::normalize_name_column;
use crate::config::RadiationConfig;
use log::{info, warn};
use polars::prelude::*;

const DATASET: &str = "radiation";

/// Cleans the concatenated radiation table.
///
/// In order: rows with a null in [`RadiationConfig::dropna_columns`] are dropped, duplicates
/// on [`RadiationConfig::dedup_columns`] are dropped keeping the first occurrence, the
/// municipality name is normalised and the table is projected onto
/// [`RadiationConfig::required_columns`].
///
/// A table without any column, as produced when no export file was found, yields an empty
/// table with the required columns.
///
/// # Errors
///
/// [`TransformError::MissingColumn`] when a configured column is absent.
pub fn clean_radiation(
    df: &DataFrame,
    config: &RadiationConfig,
) -> Result<DataFrame, TransformError> {
    if df.width() == 0 {
        warn!("Radiation table has no columns, continuing with an empty table");
        return empty_table(&config.required_columns);
    }

    require_columns(
        df,
        DATASET,
        config
            .dropna_columns
            .iter()
            .chain(&config.dedup_columns)
            .chain(&config.required_columns)
            .chain(std::iter::once(&config.municipality_column)),
    )?;

    let total = df.height();
    let complete = drop_nulls_in(df, &config.dropna_columns)?;
    let unique = drop_duplicates_keep_first(&complete, &config.dedup_columns)?;
    let normalized = normalize_name_column(&unique, &config.municipality_column)?;
    let cleaned = project(&normalized, DATASET, &config.required_columns)?;

    info!(
        "Radiation cleaning kept {} of {} rows ({} incomplete, {} duplicates)",
        cleaned.height(),
        total,
        total - complete.height(),
        complete.height() - unique.height()
    );
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> PolarsResult<DataFrame> {
        df!(
            "Date de début de prélèvement" => [Some("2024-03-01"), Some("2024-03-01"), Some("2024-03-01"), Some("2024-03-02"), None],
            "Date de fin de prélèvement" => [Some("2024-03-01"); 5],
            "Résultat" => [Some("12.5"), Some("3.0"), Some("12.5"), Some("7.1"), Some("1.0")],
            "Incertitude absolue" => [Some("0.5"), None, Some("0.5"), Some("0.2"), Some("0.1")],
            "Unité" => [Some("becquerel par kg sec"); 5],
            "Commune" => [Some("L'Île-Rousse"), Some("L'Île-Rousse"), Some("L'Île-Rousse"), Some("Corte"), Some("Bastia")],
            "Espèce" => [None::<&str>; 5],
            "Nature" => [Some("Sol"); 5],
            "Radionucléide" => [Some("Cs137"); 5],
            "Milieu de collecte" => [Some("Sol"), Some("Eau"), Some("Sol"), Some("Sol"), Some("Sol")],
            "Code INSEE" => [Some("2B143"); 5],
        )
    }

    #[test]
    fn test_clean_radiation() -> Result<(), Box<dyn std::error::Error>> {
        let config = RadiationConfig::default();
        let cleaned = clean_radiation(&raw()?, &config)?;

        // Null start date dropped, third row duplicates the first; Sol and Eau differ
        assert_eq!(cleaned.height(), 3);
        let media: Vec<_> = cleaned.column("Milieu de collecte")?.str()?.into_iter().collect();
        assert_eq!(media, vec![Some("Sol"), Some("Eau"), Some("Sol")]);

        let communes: Vec<_> = cleaned.column("Commune")?.str()?.into_iter().collect();
        assert_eq!(
            communes,
            vec![Some("ILE-ROUSSE"), Some("ILE-ROUSSE"), Some("CORTE")]
        );

        let names: Vec<String> = cleaned
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, config.required_columns);
        Ok(())
    }

    #[test]
    fn test_missing_column_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let df = raw()?.drop("Radionucléide")?;
        assert!(matches!(
            clean_radiation(&df, &RadiationConfig::default()),
            Err(TransformError::MissingColumn { column, .. }) if column == "Radionucléide"
        ));
        Ok(())
    }

    #[test]
    fn test_zero_width_table() -> Result<(), Box<dyn std::error::Error>> {
        let config = RadiationConfig::default();
        let cleaned = clean_radiation(&DataFrame::empty(), &config)?;
        assert_eq!(cleaned.shape(), (0, config.required_columns.len()));
        Ok(())
    }
}
