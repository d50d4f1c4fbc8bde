pub mod lambert;
pub mod nearest;
pub mod sphere;
