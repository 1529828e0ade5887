//! Instruction words and their decoding
//!
//! Every instruction is a single 32-bit word with the operator number
//! in the top four bits. Thirteen of the fourteen operators name three
//! registers A, B and C in the low nine bits:
//!
//! ```text
//!  31  28                          8  6 5  3 2  0
//! [ op  ][........unused.........][ A ][ B ][ C ]
//! ```
//!
//! Load immediate names a single register just below the operator and
//! carries a 25 bit value:
//!
//! ```text
//!  31  28 27 25 24                              0
//! [ 13  ][ A  ][             value               ]
//! ```

use std::fmt;

use crate::eval::error::ExecutionError;

/// Index of one of the eight registers
pub type Reg = usize;

/// Width mask of the load immediate value
pub const IMMEDIATE_MASK: u32 = 0x01FF_FFFF;

/// Operator numbers
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operator {
    ConditionalMove = 0,
    ArrayIndex = 1,
    ArrayAmendment = 2,
    Addition = 3,
    Multiplication = 4,
    Division = 5,
    NotAnd = 6,
    Halt = 7,
    Allocation = 8,
    Abandonment = 9,
    Output = 10,
    Input = 11,
    LoadProgram = 12,
    LoadImmediate = 13,
}

impl Operator {
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for Operator {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Operator::ConditionalMove),
            1 => Ok(Operator::ArrayIndex),
            2 => Ok(Operator::ArrayAmendment),
            3 => Ok(Operator::Addition),
            4 => Ok(Operator::Multiplication),
            5 => Ok(Operator::Division),
            6 => Ok(Operator::NotAnd),
            7 => Ok(Operator::Halt),
            8 => Ok(Operator::Allocation),
            9 => Ok(Operator::Abandonment),
            10 => Ok(Operator::Output),
            11 => Ok(Operator::Input),
            12 => Ok(Operator::LoadProgram),
            13 => Ok(Operator::LoadImmediate),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::ConditionalMove => write!(f, "conditional move"),
            Operator::ArrayIndex => write!(f, "array index"),
            Operator::ArrayAmendment => write!(f, "array amendment"),
            Operator::Addition => write!(f, "addition"),
            Operator::Multiplication => write!(f, "multiplication"),
            Operator::Division => write!(f, "division"),
            Operator::NotAnd => write!(f, "not-and"),
            Operator::Halt => write!(f, "halt"),
            Operator::Allocation => write!(f, "allocation"),
            Operator::Abandonment => write!(f, "abandonment"),
            Operator::Output => write!(f, "output"),
            Operator::Input => write!(f, "input"),
            Operator::LoadProgram => write!(f, "load program"),
            Operator::LoadImmediate => write!(f, "load immediate"),
        }
    }
}

/// A decoded instruction
///
/// Fields keep the A / B / C naming of the word layout; operators
/// that ignore a register field do not carry it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// A ← B unless C is zero
    ConditionalMove { a: Reg, b: Reg, c: Reg },
    /// A ← array B at offset C
    ArrayIndex { a: Reg, b: Reg, c: Reg },
    /// array A at offset B ← C
    ArrayAmendment { a: Reg, b: Reg, c: Reg },
    Addition { a: Reg, b: Reg, c: Reg },
    Multiplication { a: Reg, b: Reg, c: Reg },
    Division { a: Reg, b: Reg, c: Reg },
    NotAnd { a: Reg, b: Reg, c: Reg },
    Halt,
    /// B ← handle of a new array of C words
    Allocation { b: Reg, c: Reg },
    /// free the array C
    Abandonment { c: Reg },
    Output { c: Reg },
    Input { c: Reg },
    /// program ← copy of array B, then continue at offset C
    LoadProgram { b: Reg, c: Reg },
    LoadImmediate { a: Reg, value: u32 },
}

impl Instruction {
    /// Decode an instruction word
    pub fn decode(word: u32) -> Result<Self, ExecutionError> {
        let code = word >> 28;
        let operator =
            Operator::try_from(code).map_err(|_| ExecutionError::UnknownOperation(code))?;

        let a = ((word >> 6) & 7) as Reg;
        let b = ((word >> 3) & 7) as Reg;
        let c = (word & 7) as Reg;

        Ok(match operator {
            Operator::ConditionalMove => Instruction::ConditionalMove { a, b, c },
            Operator::ArrayIndex => Instruction::ArrayIndex { a, b, c },
            Operator::ArrayAmendment => Instruction::ArrayAmendment { a, b, c },
            Operator::Addition => Instruction::Addition { a, b, c },
            Operator::Multiplication => Instruction::Multiplication { a, b, c },
            Operator::Division => Instruction::Division { a, b, c },
            Operator::NotAnd => Instruction::NotAnd { a, b, c },
            Operator::Halt => Instruction::Halt,
            Operator::Allocation => Instruction::Allocation { b, c },
            Operator::Abandonment => Instruction::Abandonment { c },
            Operator::Output => Instruction::Output { c },
            Operator::Input => Instruction::Input { c },
            Operator::LoadProgram => Instruction::LoadProgram { b, c },
            Operator::LoadImmediate => Instruction::LoadImmediate {
                a: ((word >> 25) & 7) as Reg,
                value: word & IMMEDIATE_MASK,
            },
        })
    }

    /// The operator of this instruction
    pub fn operator(&self) -> Operator {
        match self {
            Instruction::ConditionalMove { .. } => Operator::ConditionalMove,
            Instruction::ArrayIndex { .. } => Operator::ArrayIndex,
            Instruction::ArrayAmendment { .. } => Operator::ArrayAmendment,
            Instruction::Addition { .. } => Operator::Addition,
            Instruction::Multiplication { .. } => Operator::Multiplication,
            Instruction::Division { .. } => Operator::Division,
            Instruction::NotAnd { .. } => Operator::NotAnd,
            Instruction::Halt => Operator::Halt,
            Instruction::Allocation { .. } => Operator::Allocation,
            Instruction::Abandonment { .. } => Operator::Abandonment,
            Instruction::Output { .. } => Operator::Output,
            Instruction::Input { .. } => Operator::Input,
            Instruction::LoadProgram { .. } => Operator::LoadProgram,
            Instruction::LoadImmediate { .. } => Operator::LoadImmediate,
        }
    }

    /// Encode as the canonical instruction word
    ///
    /// Unused register fields encode as zero. Register indices and
    /// immediates are masked to their field widths.
    pub fn encode(&self) -> u32 {
        let op = self.operator().code() << 28;
        let abc = |a: Reg, b: Reg, c: Reg| {
            op | ((a as u32 & 7) << 6) | ((b as u32 & 7) << 3) | (c as u32 & 7)
        };

        match *self {
            Instruction::ConditionalMove { a, b, c }
            | Instruction::ArrayIndex { a, b, c }
            | Instruction::ArrayAmendment { a, b, c }
            | Instruction::Addition { a, b, c }
            | Instruction::Multiplication { a, b, c }
            | Instruction::Division { a, b, c }
            | Instruction::NotAnd { a, b, c } => abc(a, b, c),
            Instruction::Halt => op,
            Instruction::Allocation { b, c } | Instruction::LoadProgram { b, c } => abc(0, b, c),
            Instruction::Abandonment { c } | Instruction::Output { c } | Instruction::Input { c } => {
                abc(0, 0, c)
            }
            Instruction::LoadImmediate { a, value } => {
                op | ((a as u32 & 7) << 25) | (value & IMMEDIATE_MASK)
            }
        }
    }
}

/// Encode a sequence of instructions as a program
pub fn assemble(instructions: &[Instruction]) -> Vec<u32> {
    instructions.iter().map(Instruction::encode).collect()
}
