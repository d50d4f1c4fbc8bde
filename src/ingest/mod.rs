pub mod concatenate;
pub mod error;
pub mod reader;
pub mod writer;
