//! Execution errors
use codespan_reporting::diagnostic::Diagnostic;
use std::io;
use thiserror::Error;

use super::machine::instruction::Operator;
use super::memory::heap::HeapError;

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// wrapped, program counter and instruction word
    #[error("{0}")]
    Traced(Box<ExecutionError>, u32, u32),
    /// wrapped, program counter with no instruction to fetch
    #[error("{0}")]
    Unfetchable(Box<ExecutionError>, u32),
    #[error(transparent)]
    Heap(#[from] HeapError),
    #[error("division by zero")]
    DivisionByZero,
    #[error("unknown operator {0}")]
    UnknownOperation(u32),
    #[error("machine did not halt after {0} steps")]
    DidntTerminate(usize),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ExecutionError {
    /// Strip any trace wrapper
    pub fn root(&self) -> &ExecutionError {
        match self {
            ExecutionError::Traced(e, _, _) | ExecutionError::Unfetchable(e, _) => e.root(),
            e => e,
        }
    }

    /// Program counter at which the error arose
    pub fn pc(&self) -> Option<u32> {
        match self {
            ExecutionError::Traced(_, pc, _) | ExecutionError::Unfetchable(_, pc) => Some(*pc),
            _ => None,
        }
    }

    /// Program counter and instruction word at which the error arose
    pub fn location(&self) -> Option<(u32, u32)> {
        if let ExecutionError::Traced(_, pc, word) = self {
            Some((*pc, *word))
        } else {
            None
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let mut diagnostic = Diagnostic::error().with_message(self.to_string());

        if let Some((pc, word)) = self.location() {
            let note = match Operator::try_from(word >> 28) {
                Ok(operator) => format!("at offset {pc} in {operator} instruction {word:#010x}"),
                Err(()) => format!("at offset {pc} in instruction {word:#010x}"),
            };
            diagnostic = diagnostic.with_notes(vec![note]);
        } else if let ExecutionError::Unfetchable(_, pc) = self {
            diagnostic =
                diagnostic.with_notes(vec![format!("fetching the instruction at offset {pc}")]);
        }

        diagnostic
    }
}
