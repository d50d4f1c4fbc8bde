use crate::config::RadiationConfig;
use crate::ingest::error::IngestError;
use crate::ingest::reader::read_delimited;
use log::{info, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Lists the radiation exports matching the configured pattern, in discovery order.
pub fn radiation_files(
    raw_dir: &Path,
    config: &RadiationConfig,
) -> Result<Vec<PathBuf>, IngestError> {
    let pattern = raw_dir.join(&config.filename_pattern);
    let pattern = pattern.to_string_lossy().into_owned();
    glob::glob(&pattern)
        .map_err(|e| IngestError::Pattern(pattern.clone(), e))?
        .map(|entry| entry.map_err(|e| IngestError::Glob(pattern.clone(), e)))
        .collect()
}

/// Second `_`-separated token of the file name, e.g. `soil` in `asnr_soil_radiation_data_2024.csv`.
pub fn medium_token(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()?.split('_').nth(1)
}

/// Loads every radiation export into one table and tags each row with its collection medium.
///
/// The medium tag comes from mapping the file name's medium token through
/// [`RadiationConfig::medium_mapping`]; an unmapped token becomes the tag itself. Rows keep
/// file discovery order, then their order within the file. All columns are read as text and
/// every file must carry the same columns as the first one.
///
/// A file that cannot be read or parsed aborts the whole load. No matching file at all
/// yields an empty table.
pub fn concatenate_radiation(
    raw_dir: &Path,
    config: &RadiationConfig,
) -> Result<DataFrame, IngestError> {
    let files = radiation_files(raw_dir, config)?;
    if files.is_empty() {
        warn!(
            "No radiation file matches '{}' in {}",
            config.filename_pattern,
            raw_dir.display()
        );
        return Ok(DataFrame::empty());
    }

    let mut combined: Option<DataFrame> = None;
    for path in &files {
        let token = medium_token(path).ok_or_else(|| IngestError::MediumToken(path.clone()))?;
        let tag = config
            .medium_mapping
            .get(token)
            .map(String::as_str)
            .unwrap_or(token);

        let mut df = read_delimited(path, config.separator as u8)?;
        let medium = Series::new(
            config.medium_column.as_str().into(),
            vec![tag; df.height()],
        );
        df.with_column(medium)?;
        info!(
            "Read {} radiation rows with medium '{}' from {}",
            df.height(),
            tag,
            path.display()
        );

        match combined.as_mut() {
            None => combined = Some(df),
            Some(acc) => {
                let expected = column_names(acc);
                let found = column_names(&df);
                if expected != found {
                    return Err(IngestError::SchemaMismatch {
                        path: path.clone(),
                        expected,
                        found,
                    });
                }
                acc.vstack_mut(&df)?;
            }
        }
    }

    let combined = combined.unwrap_or_else(DataFrame::empty);
    info!(
        "Concatenated {} radiation rows from {} files",
        combined.height(),
        files.len()
    );
    Ok(combined)
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const HEADER: &str = "Date de début de prélèvement;Commune;Résultat;Milieu de collecte";

    fn config() -> RadiationConfig {
        RadiationConfig {
            medium_mapping: BTreeMap::from([("soil".to_string(), "Sol".to_string())]),
            ..RadiationConfig::default()
        }
    }

    fn write(dir: &Path, name: &str, rows: &[&str]) -> std::io::Result<()> {
        let mut content = format!("{HEADER}\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        std::fs::write(dir.join(name), content)
    }

    #[test]
    fn test_medium_token() {
        assert_eq!(
            medium_token(Path::new("/raw/asnr_soil_radiation_data_2024.csv")),
            Some("soil")
        );
        assert_eq!(medium_token(Path::new("/raw/radiation.csv")), None);
    }

    #[test]
    fn test_rows_tagged_and_ordered() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        write(
            dir.path(),
            "asnr_soil_radiation_data_2024.csv",
            &["2024-03-01;Bastia;12.5;", "2024-03-02;Corte;3.1;"],
        )?;
        write(
            dir.path(),
            "asnr_air_radiation_data_2024.csv",
            &["2024-03-03;Calvi;0.4;AIR AMBIANT"],
        )?;

        let df = concatenate_radiation(dir.path(), &config())?;
        assert_eq!(df.height(), 3);

        // Glob yields files alphabetically: "air" before "soil"
        let communes: Vec<_> = df.column("Commune")?.str()?.into_iter().collect();
        assert_eq!(communes, vec![Some("Calvi"), Some("Bastia"), Some("Corte")]);

        // Unmapped token passes through; the file's own column is overwritten
        let media: Vec<_> = df.column("Milieu de collecte")?.str()?.into_iter().collect();
        assert_eq!(media, vec![Some("air"), Some("Sol"), Some("Sol")]);
        Ok(())
    }

    #[test]
    fn test_no_match_is_empty() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let df = concatenate_radiation(dir.path(), &config())?;
        assert_eq!(df.shape(), (0, 0));
        Ok(())
    }

    #[test]
    fn test_mismatched_columns_abort() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        write(dir.path(), "asnr_soil_radiation_data_2024.csv", &["2024-03-01;Bastia;12.5;"])?;
        std::fs::write(
            dir.path().join("asnr_water_radiation_data_2024.csv"),
            "Commune;Résultat\nBastia;1.0\n",
        )?;

        let result = concatenate_radiation(dir.path(), &config());
        assert!(matches!(result, Err(IngestError::SchemaMismatch { .. })));
        Ok(())
    }
}
