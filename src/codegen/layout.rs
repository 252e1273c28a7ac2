//! Label resolution for the instruction stream.
//!
//! [`CodeLayout`] appends instructions and resolves branch targets the way a two-pass
//! assembler does: a branch to a label that is not yet placed records a fixup, and
//! [`CodeLayout::finish`] patches every fixup once all labels are known.

use std::collections::HashMap;

use crate::{
    body::{LabelId, StatementId},
    codegen::Instruction,
    Result,
};

/// Identifies a branch target in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKey {
    /// A user label.
    User(LabelId),
    /// The condition test of a loop, the target of `continue`.
    Head(StatementId),
    /// The start of a switch section.
    Case(StatementId),
    /// The start of an `else` branch.
    Else(StatementId),
    /// The point after a statement.
    EndOf(StatementId),
    /// The shared method epilogue reached by `leave` from protected regions.
    MethodExit,
}

/// Unresolved label reference awaiting its target offset.
#[derive(Debug, Clone)]
struct LabelFixup {
    /// Index of the branching instruction.
    instruction: usize,
    /// Target slot inside the instruction (the case index for switches).
    slot: usize,
    /// The referenced label.
    label: LabelKey,
}

/// An instruction stream under construction.
#[derive(Debug, Default)]
pub struct CodeLayout {
    instructions: Vec<Instruction>,
    /// Placed labels (label -> offset)
    labels: HashMap<LabelKey, usize>,
    /// Pending label references
    fixups: Vec<LabelFixup>,
}

impl CodeLayout {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the offset the next instruction will occupy.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.instructions.len()
    }

    /// Appends an instruction without label operands and returns its offset.
    pub fn emit(&mut self, instruction: Instruction) -> usize {
        let offset = self.instructions.len();
        self.instructions.push(instruction);
        offset
    }

    /// Appends a `br` to `label`.
    pub fn emit_branch(&mut self, label: LabelKey) -> usize {
        self.emit_with_targets(Instruction::Branch { target: 0 }, &[label])
    }

    /// Appends a conditional branch to `label`.
    pub fn emit_branch_if(&mut self, label: LabelKey) -> usize {
        self.emit_with_targets(Instruction::BranchIf { target: 0 }, &[label])
    }

    /// Appends a `leave` to `label`.
    pub fn emit_leave(&mut self, label: LabelKey) -> usize {
        self.emit_with_targets(Instruction::Leave { target: 0 }, &[label])
    }

    /// Appends a `switch` over `labels`.
    pub fn emit_switch(&mut self, labels: &[LabelKey]) -> usize {
        self.emit_with_targets(
            Instruction::Switch {
                targets: vec![0; labels.len()],
            },
            labels,
        )
    }

    fn emit_with_targets(&mut self, instruction: Instruction, labels: &[LabelKey]) -> usize {
        let offset = self.emit(instruction);
        for (slot, &label) in labels.iter().enumerate() {
            self.fixups.push(LabelFixup {
                instruction: offset,
                slot,
                label,
            });
        }
        offset
    }

    /// Places `label` at the current offset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedRegion`] if the label is already placed.
    pub fn define_label(&mut self, label: LabelKey) -> Result<()> {
        let offset = self.offset();
        if let Some(previous) = self.labels.insert(label, offset) {
            return Err(malformed_region!(
                "label {:?} placed twice, at {} and {}",
                label,
                previous,
                offset
            ));
        }
        Ok(())
    }

    /// Returns `true` if any emitted instruction references `label`.
    #[must_use]
    pub fn is_referenced(&self, label: LabelKey) -> bool {
        self.fixups.iter().any(|fixup| fixup.label == label)
    }

    /// Returns `true` if a referenced label is placed at `offset`.
    #[must_use]
    pub fn is_branch_target(&self, offset: usize) -> bool {
        self.fixups
            .iter()
            .any(|fixup| self.labels.get(&fixup.label) == Some(&offset))
    }

    /// Resolves every fixup and returns the finished instruction stream.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnresolvedLabel`] for an unplaced user label and
    /// [`crate::Error::MalformedRegion`] for any other unplaced label.
    pub fn finish(mut self) -> Result<Vec<Instruction>> {
        for fixup in &self.fixups {
            let Some(&offset) = self.labels.get(&fixup.label) else {
                return Err(match fixup.label {
                    LabelKey::User(label) => crate::Error::UnresolvedLabel(label),
                    other => malformed_region!("label {:?} referenced but never placed", other),
                });
            };

            let patched = self
                .instructions
                .get_mut(fixup.instruction)
                .is_some_and(|instruction| instruction.set_target(fixup.slot, offset));
            if !patched {
                return Err(malformed_region!(
                    "instruction {} has no target slot {}",
                    fixup.instruction,
                    fixup.slot
                ));
            }
        }

        Ok(self.instructions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_forward_and_backward_labels() {
        let loop_stmt = StatementId::new(1);
        let mut layout = CodeLayout::new();
        layout.define_label(LabelKey::Head(loop_stmt)).unwrap();
        layout.emit_branch_if(LabelKey::EndOf(loop_stmt));
        layout.emit(Instruction::Code(StatementId::new(2)));
        layout.emit_branch(LabelKey::Head(loop_stmt));
        layout.define_label(LabelKey::EndOf(loop_stmt)).unwrap();
        layout.emit(Instruction::Return);

        let code = layout.finish().unwrap();
        assert_eq!(code[0], Instruction::BranchIf { target: 3 });
        assert_eq!(code[2], Instruction::Branch { target: 0 });
    }

    #[test]
    fn test_switch_fixups() {
        let (a, b) = (StatementId::new(1), StatementId::new(2));
        let mut layout = CodeLayout::new();
        layout.emit_switch(&[LabelKey::Case(a), LabelKey::Case(b)]);
        layout.define_label(LabelKey::Case(a)).unwrap();
        layout.emit(Instruction::Code(a));
        layout.define_label(LabelKey::Case(b)).unwrap();
        layout.emit(Instruction::Code(b));

        assert!(layout.is_branch_target(2));
        assert!(!layout.is_branch_target(0));

        let code = layout.finish().unwrap();
        assert_eq!(code[0].targets(), vec![1, 2]);
    }

    #[test]
    fn test_missing_label() {
        let mut layout = CodeLayout::new();
        layout.emit_leave(LabelKey::User(LabelId::new(3)));
        assert!(layout.is_referenced(LabelKey::User(LabelId::new(3))));
        assert!(matches!(layout.finish(), Err(Error::UnresolvedLabel(_))));

        let mut layout = CodeLayout::new();
        layout.emit_leave(LabelKey::MethodExit);
        assert!(matches!(layout.finish(), Err(Error::MalformedRegion { .. })));
    }

    #[test]
    fn test_duplicate_label() {
        let mut layout = CodeLayout::new();
        layout.define_label(LabelKey::MethodExit).unwrap();
        assert!(layout.define_label(LabelKey::MethodExit).is_err());
    }
}
