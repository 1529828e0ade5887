pub mod channel;
pub mod error;
pub mod machine;
pub mod memory;
