extern crate clap;
extern crate codespan_reporting;
extern crate indexmap;
extern crate thiserror;

pub mod driver;
pub mod eval;
