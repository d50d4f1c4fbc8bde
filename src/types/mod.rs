pub mod associated_record;
pub mod lat_lon;
pub mod retention;
