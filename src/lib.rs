mod association;
mod cleaning;
mod config;
mod error;
mod geo;
mod ingest;
mod pipeline;
mod types;

pub use error::PipelineError;
pub use pipeline::*;

pub use types::associated_record::AssociatedRecord;
pub use types::lat_lon::LatLon;
pub use types::retention::Retention;

pub use config::error::ConfigError;
pub use config::{
    AssociationConfig, CoalescedColumn, GeoColumns, LambertColumns, MunicipalityConfig,
    OutputConfig, PathsConfig, PipelineConfig, RadiationConfig, WeatherConfig,
    DEFAULT_MAX_DISTANCE_M,
};

pub use geo::lambert::{
    lambert2e_to_wgs84, Ellipsoid, LambertConic, CLARKE_1880_IGN, LAMBERT_II_EXTENDED,
    NTF_TO_WGS84, WGS84,
};
pub use geo::nearest::{nearest_same_day, partition_by_day, DatedPoint, NearestMatch, SphereIndex};
pub use geo::sphere::{chord_to_angle, great_circle_m, unit_vector, EARTH_RADIUS_M};

pub use ingest::concatenate::{concatenate_radiation, medium_token, radiation_files};
pub use ingest::error::IngestError;
pub use ingest::reader::read_delimited;
pub use ingest::writer::{apply_labels, clear_directory, write_csv_atomic};

pub use cleaning::dates::{parse_compact_date, parse_date_column, parse_sampling_date};
pub use cleaning::error::TransformError;
pub use cleaning::municipality::clean_municipality;
pub use cleaning::normalize::{normalize_municipality_name, normalize_name_column};
pub use cleaning::radiation::clean_radiation;
pub use cleaning::weather::clean_weather;

pub use association::associate::{Associated, WeatherAssociator};
pub use association::geolocate::{geolocate_radiation, Geolocated};
