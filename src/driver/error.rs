//! Overall high-level error type
use crate::driver::image::ImageError;
use crate::eval::error::ExecutionError;
use codespan_reporting::diagnostic::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UmError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl UmError {
    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        match self {
            UmError::Image(e) => e.to_diagnostic(),
            UmError::Execution(e) => e.to_diagnostic(),
        }
    }
}
