pub mod dates;
pub mod error;
pub mod frame;
pub mod municipality;
pub mod normalize;
pub mod radiation;
pub mod weather;
