//! The machine and its instruction set
pub mod instruction;
pub mod metrics;
pub mod vm;
