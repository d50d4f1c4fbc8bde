//! Typed configuration for every dataset the pipeline touches.
//!
//! Each dataset gets an explicit record naming the columns the cleaners and joins rely on.
//! [`PipelineConfig::default`] reproduces the column names of the production exports
//! (radiation portal CSVs, the municipality gazetteer and the SAFRAN daily grid), and
//! [`PipelineConfig::from_json_file`] loads overrides from a JSON document. Any field left out
//! of the document keeps its default.

pub mod error;

use crate::config::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default upper bound on the radiation site / weather point distance, in meters.
pub const DEFAULT_MAX_DISTANCE_M: f64 = 50_000.0;

/// Top-level configuration grouping all dataset configurations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub radiation: RadiationConfig,
    pub municipality: MunicipalityConfig,
    pub weather: WeatherConfig,
    pub association: AssociationConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Loads a configuration from a JSON file and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] when the file cannot be read or
    /// decoded, and any of the validation errors of [`PipelineConfig::validate`].
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes =
            std::fs::read(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: PipelineConfig = serde_json::from_slice(&bytes)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration is internally consistent.
    ///
    /// Every column a later stage reads must survive the projection of the stage that
    /// produces it, separators must be single ASCII bytes and the association distance must
    /// be a usable bound. Whether the columns exist in the actual files is checked by each
    /// cleaner when it receives its table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_separator("radiation", self.radiation.separator)?;
        check_separator("municipality", self.municipality.separator)?;
        check_separator("weather", self.weather.separator)?;
        check_separator("output", self.output.separator)?;

        let rad = &self.radiation;
        for (role, column) in [
            ("municipality name", &rad.municipality_column),
            ("sampling start date", &rad.date_start_column),
        ] {
            check_required("radiation", role, column, &rad.required_columns)?;
        }

        let mun = &self.municipality;
        for (role, column) in [
            ("cleaned name", &mun.name.cleaned),
            ("latitude", &mun.latitude.cleaned),
            ("longitude", &mun.longitude.cleaned),
        ] {
            check_required("municipality", role, column, &mun.required_columns)?;
        }
        for column in &mun.required_columns {
            if column != &mun.name.cleaned && rad.required_columns.contains(column) {
                return Err(ConfigError::ColumnCollision {
                    column: column.clone(),
                });
            }
        }

        let weather = &self.weather;
        for (role, column) in [
            ("grid x", &weather.lambert.x),
            ("grid y", &weather.lambert.y),
            ("date", &weather.date_column),
            ("snowfall", &weather.snowfall_column),
            ("rainfall", &weather.rainfall_column),
        ] {
            check_required("weather", role, column, &weather.required_columns)?;
        }
        for column in &weather.dropna_columns {
            check_required("weather", "null filter", column, &weather.required_columns)?;
        }

        let max = self.association.max_distance_m;
        if !max.is_finite() || max < 0.0 {
            return Err(ConfigError::MaxDistance(max));
        }
        Ok(())
    }
}

fn check_separator(dataset: &'static str, separator: char) -> Result<(), ConfigError> {
    if separator.is_ascii() {
        Ok(())
    } else {
        Err(ConfigError::Separator { dataset, separator })
    }
}

fn check_required(
    dataset: &'static str,
    role: &'static str,
    column: &str,
    required: &[String],
) -> Result<(), ConfigError> {
    if required.iter().any(|c| c == column) {
        Ok(())
    } else {
        Err(ConfigError::ColumnNotRequired {
            dataset,
            role,
            column: column.to_string(),
        })
    }
}

/// Where raw files are read from and where the cleaned dataset is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_raw_dir: PathBuf,
    pub municipality_filename: String,
    /// May point to a gzip-compressed file; compression is detected from the content.
    pub weather_filename: String,
    pub cleaned_dir: PathBuf,
    pub cleaned_filename: String,
    /// Remove the plain files already present in `cleaned_dir` before writing.
    pub clear_cleaned_dir: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_raw_dir: PathBuf::from("data/raw"),
            municipality_filename: "municipality_data.csv".to_string(),
            weather_filename: "weather_data.csv".to_string(),
            cleaned_dir: PathBuf::from("data/cleaned"),
            cleaned_filename: "data.csv".to_string(),
            clear_cleaned_dir: false,
        }
    }
}

impl PathsConfig {
    pub fn municipality_path(&self) -> PathBuf {
        self.data_raw_dir.join(&self.municipality_filename)
    }

    pub fn weather_path(&self) -> PathBuf {
        self.data_raw_dir.join(&self.weather_filename)
    }

    pub fn output_path(&self) -> PathBuf {
        self.cleaned_dir.join(&self.cleaned_filename)
    }
}

/// Columns and cleaning rules of the radiation portal exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiationConfig {
    /// Glob pattern, relative to the raw data directory. The second `_`-separated token of
    /// each matching file name identifies the collection medium.
    pub filename_pattern: String,
    pub separator: char,
    /// Column receiving the collection medium tag. Overwritten if the export already has it.
    pub medium_column: String,
    /// File name medium token → tag written to `medium_column`. Unmapped tokens are used as-is.
    pub medium_mapping: BTreeMap<String, String>,
    pub municipality_column: String,
    pub date_start_column: String,
    pub date_end_column: String,
    pub result_column: String,
    pub uncertainty_column: String,
    pub unit_column: String,
    pub species_column: String,
    pub nature_column: String,
    pub radionuclide_column: String,
    /// Rows with a null in any of these columns are dropped.
    pub dropna_columns: Vec<String>,
    /// Rows sharing these values are duplicates; the first occurrence is kept.
    pub dedup_columns: Vec<String>,
    /// Columns kept after cleaning, in output order.
    pub required_columns: Vec<String>,
}

impl Default for RadiationConfig {
    fn default() -> Self {
        let date_start = "Date de début de prélèvement".to_string();
        let date_end = "Date de fin de prélèvement".to_string();
        let result = "Résultat".to_string();
        let uncertainty = "Incertitude absolue".to_string();
        let unit = "Unité".to_string();
        let municipality = "Commune".to_string();
        let species = "Espèce".to_string();
        let nature = "Nature".to_string();
        let radionuclide = "Radionucléide".to_string();
        let medium = "Milieu de collecte".to_string();

        Self {
            filename_pattern: "asnr_*_radiation_data_*.csv".to_string(),
            separator: ';',
            medium_mapping: BTreeMap::from([
                ("soil".to_string(), "Sol".to_string()),
                ("water".to_string(), "Eau".to_string()),
            ]),
            dropna_columns: vec![
                result.clone(),
                date_start.clone(),
                municipality.clone(),
                unit.clone(),
                radionuclide.clone(),
                medium.clone(),
            ],
            dedup_columns: vec![
                date_start.clone(),
                date_end.clone(),
                municipality.clone(),
                radionuclide.clone(),
                medium.clone(),
            ],
            required_columns: vec![
                date_start.clone(),
                date_end.clone(),
                result.clone(),
                uncertainty.clone(),
                unit.clone(),
                municipality.clone(),
                species.clone(),
                nature.clone(),
                radionuclide.clone(),
                medium.clone(),
            ],
            medium_column: medium,
            municipality_column: municipality,
            date_start_column: date_start,
            date_end_column: date_end,
            result_column: result,
            uncertainty_column: uncertainty,
            unit_column: unit,
            species_column: species,
            nature_column: nature,
            radionuclide_column: radionuclide,
        }
    }
}

/// A derived attribute read from `primary`, or from `fallback` where `primary` is null,
/// and stored under `cleaned`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoalescedColumn {
    pub primary: String,
    pub fallback: Option<String>,
    pub cleaned: String,
}

impl CoalescedColumn {
    pub fn new(primary: &str, fallback: Option<&str>, cleaned: &str) -> Self {
        Self {
            primary: primary.to_string(),
            fallback: fallback.map(str::to_string),
            cleaned: cleaned.to_string(),
        }
    }

    pub(crate) fn sources(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.primary).chain(self.fallback.iter())
    }
}

/// Columns of the municipality gazetteer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MunicipalityConfig {
    pub separator: char,
    pub name: CoalescedColumn,
    pub latitude: CoalescedColumn,
    pub longitude: CoalescedColumn,
    /// Among municipalities sharing a cleaned name, the most populous one is kept.
    pub population_column: String,
    pub required_columns: Vec<String>,
}

impl Default for MunicipalityConfig {
    fn default() -> Self {
        let name = CoalescedColumn::new("nom_standard", Some("nom_sans_accent"), "nom_normalise");
        let latitude = CoalescedColumn::new("latitude_mairie", Some("latitude_centre"), "latitude");
        let longitude =
            CoalescedColumn::new("longitude_mairie", Some("longitude_centre"), "longitude");
        Self {
            separator: ',',
            required_columns: vec![
                name.cleaned.clone(),
                latitude.cleaned.clone(),
                longitude.cleaned.clone(),
            ],
            name,
            latitude,
            longitude,
            population_column: "population".to_string(),
        }
    }
}

/// Planar grid coordinate columns (NTF Lambert II étendu).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambertColumns {
    pub x: String,
    pub y: String,
}

/// Geographic (WGS84) coordinate columns produced by reprojection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoColumns {
    pub lat: String,
    pub lon: String,
}

/// Columns of the gridded daily weather export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub separator: char,
    pub required_columns: Vec<String>,
    pub dropna_columns: Vec<String>,
    pub lambert: LambertColumns,
    /// Multiplier bringing grid coordinates to meters before reprojection.
    /// The SAFRAN grid stores hectometers, hence `100`.
    pub grid_scale: Option<f64>,
    pub geo: GeoColumns,
    /// Compact `YYYYMMDD` date column.
    pub date_column: String,
    pub snowfall_column: String,
    pub rainfall_column: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            separator: ';',
            required_columns: ["LAMBX", "LAMBY", "DATE", "PRENEI", "PRELIQ"]
                .map(String::from)
                .to_vec(),
            dropna_columns: ["LAMBX", "LAMBY", "DATE"].map(String::from).to_vec(),
            lambert: LambertColumns {
                x: "LAMBX".to_string(),
                y: "LAMBY".to_string(),
            },
            grid_scale: Some(100.0),
            geo: GeoColumns {
                lat: "lat".to_string(),
                lon: "lon".to_string(),
            },
            date_column: "DATE".to_string(),
            snowfall_column: "PRENEI".to_string(),
            rainfall_column: "PRELIQ".to_string(),
        }
    }
}

/// Parameters of the spatio-temporal association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    pub max_distance_m: f64,
    pub distance_column: String,
    /// Appended to the weather date column name to form the matched date column.
    pub weather_date_suffix: String,
    /// Run the per-day nearest-neighbour loop on the rayon thread pool.
    pub parallel: bool,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            max_distance_m: DEFAULT_MAX_DISTANCE_M,
            distance_column: "distance_rad_meteo_m".to_string(),
            weather_date_suffix: "_METEO".to_string(),
            parallel: false,
        }
    }
}

/// Presentation of the delivered file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub separator: char,
    /// Internal column name → label in the delivered file. Absent columns are ignored.
    pub labels: BTreeMap<String, String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let rad = RadiationConfig::default();
        let mun = MunicipalityConfig::default();
        let weather = WeatherConfig::default();
        let association = AssociationConfig::default();
        let labels = [
            (rad.date_start_column, "Date start sampling radioactivity"),
            (rad.date_end_column, "Date end sampling radioactivity"),
            (rad.result_column, "Result radioactivity"),
            (rad.uncertainty_column, "Absolute uncertainty radioactivity"),
            (rad.unit_column, "Unit radioactivity"),
            (rad.municipality_column, "Municipality name"),
            (rad.species_column, "Species"),
            (rad.nature_column, "Nature"),
            (rad.radionuclide_column, "Radionuclide"),
            (rad.medium_column, "Measurement environment"),
            (mun.latitude.cleaned, "Latitude"),
            (mun.longitude.cleaned, "Longitude"),
            (
                format!("{}{}", weather.date_column, association.weather_date_suffix),
                "Date weather",
            ),
            (weather.snowfall_column, "Snowfall"),
            (weather.rainfall_column, "Rainfall"),
            (
                association.distance_column,
                "Distance measurement weather and radiation m",
            ),
        ]
        .into_iter()
        .map(|(from, to)| (from, to.to_string()))
        .collect();

        Self {
            separator: ';',
            labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        PipelineConfig::default()
            .validate()
            .expect("default configuration should validate");
    }

    #[test]
    fn test_partial_json_keeps_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{ "association": {{ "max_distance_m": 25000.0 }}, "paths": {{ "data_raw_dir": "/srv/raw" }} }}"#
        )?;

        let config = PipelineConfig::from_json_file(file.path())?;
        assert_eq!(config.association.max_distance_m, 25_000.0);
        assert_eq!(config.association.distance_column, "distance_rad_meteo_m");
        assert_eq!(config.paths.data_raw_dir, PathBuf::from("/srv/raw"));
        assert_eq!(config.paths.cleaned_filename, "data.csv");
        assert_eq!(config.radiation, RadiationConfig::default());
        Ok(())
    }

    #[test]
    fn test_negative_distance_rejected() {
        let mut config = PipelineConfig::default();
        config.association.max_distance_m = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaxDistance(d)) if d == -1.0
        ));
    }

    #[test]
    fn test_projected_away_column_rejected() {
        let mut config = PipelineConfig::default();
        config
            .radiation
            .required_columns
            .retain(|c| c != "Commune");
        match config.validate() {
            Err(ConfigError::ColumnNotRequired {
                dataset, column, ..
            }) => {
                assert_eq!(dataset, "radiation");
                assert_eq!(column, "Commune");
            }
            other => panic!("expected ColumnNotRequired, got {other:?}"),
        }
    }

    #[test]
    fn test_weather_dropna_must_survive_projection() {
        let mut config = PipelineConfig::default();
        config.weather.dropna_columns.push("TINF_H".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ColumnNotRequired { dataset: "weather", .. })
        ));
    }

    #[test]
    fn test_non_ascii_separator_rejected() {
        let mut config = PipelineConfig::default();
        config.output.separator = '§';
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Separator { dataset: "output", .. })
        ));
    }

    #[test]
    fn test_default_labels_cover_output_columns() {
        let labels = OutputConfig::default().labels;
        assert_eq!(labels["Résultat"], "Result radioactivity");
        assert_eq!(labels["PRENEI"], "Snowfall");
        assert_eq!(labels["DATE_METEO"], "Date weather");
        assert_eq!(
            labels["distance_rad_meteo_m"],
            "Distance measurement weather and radiation m"
        );
    }
}
