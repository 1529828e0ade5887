//! Command line driver: options, image loading and execution
pub mod error;
pub mod eval;
pub mod image;
pub mod options;
pub mod statistics;
