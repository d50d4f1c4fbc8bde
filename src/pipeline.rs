//! This module provides the main entry point: a [`Pipeline`] that loads the raw radiation,
//! municipality and weather files, cleans them, associates every radiation sample with
//! same-day weather and writes the result.

use crate::association::associate::WeatherAssociator;
use crate::association::geolocate::geolocate_radiation;
use crate::cleaning::municipality::clean_municipality;
use crate::cleaning::radiation::clean_radiation;
use crate::cleaning::weather::clean_weather;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::ingest::concatenate::concatenate_radiation;
use crate::ingest::reader::read_delimited;
use crate::ingest::writer::{apply_labels, clear_directory, write_csv_atomic};
use crate::types::retention::Retention;
use bon::bon;
use log::info;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

/// Row counts of one run, stage by stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub radiation_raw_rows: usize,
    pub radiation_clean_rows: usize,
    pub municipality_rows: usize,
    pub weather_rows: usize,
    /// Radiation rows whose municipality was found with coordinates.
    pub geolocation: Retention,
    /// Geolocated rows that found same-day weather within range.
    pub association: Retention,
    pub output_rows: usize,
    /// Set once the output file has been written.
    pub output_path: Option<PathBuf>,
}

/// The three raw tables a run starts from.
#[derive(Debug, Clone)]
pub struct RawTables {
    pub radiation: DataFrame,
    pub municipalities: DataFrame,
    pub weather: DataFrame,
}

/// Runs the radiation / weather association end to end.
///
/// # Examples
///
/// ```no_run
/// use raindust::{Pipeline, PipelineConfig, PipelineError};
///
/// # fn run() -> Result<(), PipelineError> {
/// let pipeline = Pipeline::new(PipelineConfig::default())?;
/// let report = pipeline.run()?;
/// println!("{} rows written, association kept {}", report.output_rows, report.association);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

#[bon]
impl Pipeline {
    /// Creates a pipeline after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when the configuration is inconsistent.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Creates a pipeline from a JSON configuration file. Fields missing from the file keep
    /// their default value.
    pub fn from_config_file(path: &Path) -> Result<Self, PipelineError> {
        Ok(Self {
            config: PipelineConfig::from_json_file(path)?,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Reads the raw radiation exports, gazetteer and weather grid from the raw data directory.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Ingest`] when a file cannot be listed, read or parsed.
    pub fn load(&self) -> Result<RawTables, PipelineError> {
        let paths = &self.config.paths;
        let radiation = concatenate_radiation(&paths.data_raw_dir, &self.config.radiation)?;
        let municipalities = read_delimited(
            &paths.municipality_path(),
            self.config.municipality.separator as u8,
        )?;
        let weather = read_delimited(&paths.weather_path(), self.config.weather.separator as u8)?;
        info!(
            "Loaded {} radiation, {} municipality and {} weather rows",
            radiation.height(),
            municipalities.height(),
            weather.height()
        );
        Ok(RawTables {
            radiation,
            municipalities,
            weather,
        })
    }

    /// Cleans the raw tables and associates them. Returns the associated table with its
    /// internal column names, along with the run's row counts.
    ///
    /// `parallel` overrides [`crate::AssociationConfig::parallel`] for this call.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Transform`] when a table lacks a configured column.
    #[builder]
    pub fn process(
        &self,
        raw: &RawTables,
        parallel: Option<bool>,
    ) -> Result<(DataFrame, PipelineReport), PipelineError> {
        let radiation = clean_radiation(&raw.radiation, &self.config.radiation)?;
        let municipalities = clean_municipality(&raw.municipalities, &self.config.municipality)?;
        let weather = clean_weather(&raw.weather, &self.config.weather)?;

        let geolocated = geolocate_radiation(
            &radiation,
            &municipalities,
            &self.config.radiation,
            &self.config.municipality,
        )?;
        let associated = WeatherAssociator::from_config(&self.config)
            .associate()
            .radiation(&geolocated.frame)
            .weather(&weather)
            .maybe_parallel(parallel)
            .call()?;

        let report = PipelineReport {
            radiation_raw_rows: raw.radiation.height(),
            radiation_clean_rows: radiation.height(),
            municipality_rows: municipalities.height(),
            weather_rows: weather.height(),
            geolocation: geolocated.retention,
            association: associated.retention,
            output_rows: associated.frame.height(),
            output_path: None,
        };
        Ok((associated.frame, report))
    }

    /// Loads, processes and writes the labelled result to the configured output path.
    ///
    /// The output file is replaced only once the whole run has succeeded; on error any
    /// previous output is left untouched. With [`crate::PathsConfig::clear_cleaned_dir`] set,
    /// the other files of the cleaned directory are removed after the new output is in place.
    pub fn run(&self) -> Result<PipelineReport, PipelineError> {
        let raw = self.load()?;
        let (mut frame, mut report) = self.process().raw(&raw).call()?;

        let paths = &self.config.paths;
        apply_labels(&mut frame, &self.config.output.labels)?;
        let output_path = paths.output_path();
        write_csv_atomic(&mut frame, &output_path, self.config.output.separator as u8)?;
        if paths.clear_cleaned_dir {
            clear_directory(&paths.cleaned_dir, Some(&output_path))?;
        }

        info!(
            "Run complete: geolocation {}, association {}, {} rows in {}",
            report.geolocation,
            report.association,
            report.output_rows,
            output_path.display()
        );
        report.output_path = Some(output_path);
        Ok(report)
    }
}
