use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse configuration file '{0}'")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("Separator {separator:?} for {dataset} data is not a single-byte ASCII character")]
    Separator {
        dataset: &'static str,
        separator: char,
    },

    // The column is needed after projection but the projection would discard it
    #[error("Column '{column}' used by {dataset} {role} is not among its required columns")]
    ColumnNotRequired {
        dataset: &'static str,
        role: &'static str,
        column: String,
    },

    #[error("Column '{column}' added by geolocation collides with a radiation column")]
    ColumnCollision { column: String },

    #[error("Maximum association distance must be a finite, non-negative number of meters (got {0})")]
    MaxDistance(f64),
}
