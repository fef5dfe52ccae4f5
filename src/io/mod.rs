pub mod error;
pub mod frames;
