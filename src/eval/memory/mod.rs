//! Memory management for the machine
pub mod heap;
