//! The abstract instruction stream.
//!
//! The region builder lays code out as [`Instruction`]s. Straight-line statements are opaque
//! ([`Instruction::Code`]); only control transfers and the exception-handling vocabulary are
//! spelled out, since those are what the region tree's offsets have to agree with. Offsets are
//! instruction indices, not byte positions.

use std::fmt;

use crate::body::{StatementId, SyntheticKind};

/// Formats an instruction offset the way IL listings do.
#[must_use]
pub fn format_offset(offset: usize) -> String {
    format!("IL_{offset:04x}")
}

/// One instruction of the laid out method body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// The straight-line code of an expression statement.
    Code(StatementId),

    /// Unconditional branch that stays inside every open protected region.
    Branch {
        /// Target offset.
        target: usize,
    },

    /// Conditional branch, taken when the tested condition is false.
    BranchIf {
        /// Target offset.
        target: usize,
    },

    /// Multi-way branch; falls through when the value matches no case.
    Switch {
        /// Target offset per case.
        targets: Vec<usize>,
    },

    /// Structured exit from one or more protected regions, running their `finally` handlers.
    Leave {
        /// Target offset.
        target: usize,
    },

    /// Return from the method.
    Return,

    /// Throw an exception.
    Throw,

    /// Rethrow the exception being handled.
    Rethrow,

    /// Evaluation of the `when` filter of a catch clause.
    Filter {
        /// The `try` statement owning the clause.
        statement: StatementId,
        /// Index of the clause in source order.
        clause: usize,
    },

    /// End of a filter block; hands the verdict to the runtime.
    EndFilter,

    /// End of a `finally` or `fault` handler.
    EndFinally,

    /// Cleanup code of a desugared statement.
    Cleanup {
        /// The synthetic statement.
        statement: StatementId,
        /// What kind of cleanup runs.
        kind: SyntheticKind,
    },

    /// Creation of a closure for a lambda.
    Closure(StatementId),
}

impl Instruction {
    /// Returns `true` if execution never continues with the next instruction.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Branch { .. }
                | Instruction::Leave { .. }
                | Instruction::Return
                | Instruction::Throw
                | Instruction::Rethrow
                | Instruction::EndFilter
                | Instruction::EndFinally
        )
    }

    /// Returns the branch targets of the instruction.
    #[must_use]
    pub fn targets(&self) -> Vec<usize> {
        match self {
            Instruction::Branch { target }
            | Instruction::BranchIf { target }
            | Instruction::Leave { target } => vec![*target],
            Instruction::Switch { targets } => targets.clone(),
            _ => Vec::new(),
        }
    }

    /// Patches the target in `slot`; returns `false` if the instruction has no such slot.
    pub(crate) fn set_target(&mut self, slot: usize, offset: usize) -> bool {
        match self {
            Instruction::Branch { target }
            | Instruction::BranchIf { target }
            | Instruction::Leave { target }
                if slot == 0 =>
            {
                *target = offset;
                true
            }
            Instruction::Switch { targets } => match targets.get_mut(slot) {
                Some(target) => {
                    *target = offset;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Code(stmt) => write!(f, "code {stmt}"),
            Instruction::Branch { target } => write!(f, "br {}", format_offset(*target)),
            Instruction::BranchIf { target } => write!(f, "brfalse {}", format_offset(*target)),
            Instruction::Switch { targets } => {
                let targets: Vec<String> = targets.iter().map(|&t| format_offset(t)).collect();
                write!(f, "switch ({})", targets.join(", "))
            }
            Instruction::Leave { target } => write!(f, "leave {}", format_offset(*target)),
            Instruction::Return => f.write_str("ret"),
            Instruction::Throw => f.write_str("throw"),
            Instruction::Rethrow => f.write_str("rethrow"),
            Instruction::Filter { statement, clause } => {
                write!(f, "filter {statement}[{clause}]")
            }
            Instruction::EndFilter => f.write_str("endfilter"),
            Instruction::EndFinally => f.write_str("endfinally"),
            Instruction::Cleanup { statement, kind } => {
                write!(f, "cleanup.{} {statement}", kind.to_string().to_lowercase())
            }
            Instruction::Closure(stmt) => write!(f, "newclosure {stmt}"),
        }
    }
}
