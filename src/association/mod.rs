pub mod associate;
pub mod geolocate;
