//! Anchor location and call splicing for host routines.
//!
//! # Responsibility
//! - Find the Nth call to an anchor method, scanning in a given direction.
//! - Insert one instruction at a fixed distance after that anchor.
//! - Undo exactly the insertions this module performed.
//!
//! # Invariants
//! - A failed splice leaves the routine untouched.
//! - At most one instruction is inserted per successful splice.

use crate::splice::instruction::{HostRoutine, Instruction, MethodRef};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Scan direction over an instruction sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    Forward,
    Reverse,
}

/// Structural description of a splice point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorPattern {
    /// Method whose call marks the anchor.
    pub anchor: MethodRef,
    /// 1-based occurrence counted in scan order.
    pub occurrence: usize,
    pub direction: ScanDirection,
    /// Slots after the anchor where the new instruction lands.
    pub offset: usize,
}

impl AnchorPattern {
    /// Anchors on the last call to `anchor` in forward order.
    pub fn last_call_to(anchor: MethodRef, offset: usize) -> Self {
        Self {
            anchor,
            occurrence: 1,
            direction: ScanDirection::Reverse,
            offset,
        }
    }

    /// Returns the index of the matching anchor, if any.
    pub fn locate(&self, instructions: &[Instruction]) -> Option<usize> {
        if self.occurrence == 0 {
            return None;
        }
        let mut anchors = instructions
            .iter()
            .enumerate()
            .filter(|(_, instruction)| instruction.is_call_to(&self.anchor))
            .map(|(index, _)| index);
        match self.direction {
            ScanDirection::Forward => anchors.nth(self.occurrence - 1),
            ScanDirection::Reverse => anchors.rev().nth(self.occurrence - 1),
        }
    }
}

/// Record of one applied splice, kept for unpatching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSplice {
    pub routine: String,
    pub anchor_index: usize,
    pub insert_index: usize,
    pub inserted: Instruction,
}

/// Inserts `instruction` at the splice point described by `pattern`.
pub fn splice(
    routine: &mut HostRoutine,
    pattern: &AnchorPattern,
    instruction: Instruction,
) -> Result<AppliedSplice, SpliceError> {
    let anchor_index =
        pattern
            .locate(routine.instructions())
            .ok_or_else(|| SpliceError::AnchorNotFound {
                routine: routine.name().to_string(),
                anchor: pattern.anchor.clone(),
            })?;

    let insert_index = anchor_index + pattern.offset;
    if insert_index > routine.len() {
        return Err(SpliceError::SpliceIndexOutOfRange {
            routine: routine.name().to_string(),
            index: insert_index,
            len: routine.len(),
        });
    }

    routine.insert(insert_index, instruction.clone());
    Ok(AppliedSplice {
        routine: routine.name().to_string(),
        anchor_index,
        insert_index,
        inserted: instruction,
    })
}

/// Removes an instruction previously inserted by [`splice`].
///
/// Later foreign insertions may have shifted the slot, so the recorded
/// index is tried first and the nearest equal instruction after it second.
pub fn revert(routine: &mut HostRoutine, applied: &AppliedSplice) -> Result<(), SpliceError> {
    if routine.name() != applied.routine {
        return Err(SpliceError::RoutineMismatch {
            expected: applied.routine.clone(),
            actual: routine.name().to_string(),
        });
    }
    let position = routine
        .instructions()
        .iter()
        .enumerate()
        .skip(applied.insert_index)
        .chain(routine.instructions().iter().enumerate().take(applied.insert_index))
        .find(|(_, instruction)| **instruction == applied.inserted)
        .map(|(index, _)| index)
        .ok_or_else(|| SpliceError::SpliceNotFound {
            routine: routine.name().to_string(),
            index: applied.insert_index,
        })?;
    routine.remove(position);
    Ok(())
}

/// Splices a dispatch call after the last anchor call of one target routine.
#[derive(Debug, Clone)]
pub struct SpliceInjector {
    target_routine: String,
    pattern: AnchorPattern,
    dispatch: MethodRef,
}

impl SpliceInjector {
    /// Injector for `target_routine` that inserts a call to `dispatch`.
    pub fn new(
        target_routine: impl Into<String>,
        pattern: AnchorPattern,
        dispatch: MethodRef,
    ) -> Self {
        Self {
            target_routine: target_routine.into(),
            pattern,
            dispatch,
        }
    }

    /// Name of the only routine this injector patches.
    pub fn target_routine(&self) -> &str {
        &self.target_routine
    }

    /// Method called by the inserted instruction.
    pub fn dispatch(&self) -> &MethodRef {
        &self.dispatch
    }

    /// Patches `routine`, logging the outcome either way.
    pub fn inject(&self, routine: &mut HostRoutine) -> Result<AppliedSplice, SpliceError> {
        let result = if routine.name() == self.target_routine {
            splice(routine, &self.pattern, Instruction::call(self.dispatch.clone()))
        } else {
            Err(SpliceError::RoutineMismatch {
                expected: self.target_routine.clone(),
                actual: routine.name().to_string(),
            })
        };

        match &result {
            Ok(applied) => info!(
                "event=splice_injected module=splice status=ok routine={} anchor={} anchor_index={} insert_index={}",
                applied.routine, self.pattern.anchor, applied.anchor_index, applied.insert_index
            ),
            Err(err) => {
                error!(
                    "event=splice_injected module=splice status=error routine={} error=\"{}\"",
                    routine.name(),
                    err
                );
                info!(
                    "event=fallback_enabled module=splice status=ok routine={} presentation=backup_window",
                    routine.name()
                );
            }
        }
        result
    }
}

/// Splice and unpatch errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpliceError {
    AnchorNotFound { routine: String, anchor: MethodRef },
    SpliceIndexOutOfRange { routine: String, index: usize, len: usize },
    RoutineMismatch { expected: String, actual: String },
    SpliceNotFound { routine: String, index: usize },
}

impl Display for SpliceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnchorNotFound { routine, anchor } => {
                write!(f, "no call to {anchor} found in routine {routine}")
            }
            Self::SpliceIndexOutOfRange {
                routine,
                index,
                len,
            } => write!(
                f,
                "splice index {index} is past the end of routine {routine} (len {len})"
            ),
            Self::RoutineMismatch { expected, actual } => {
                write!(f, "expected routine {expected}, got {actual}")
            }
            Self::SpliceNotFound { routine, index } => {
                write!(f, "spliced call near index {index} is missing from routine {routine}")
            }
        }
    }
}

impl Error for SpliceError {}

#[cfg(test)]
mod tests {
    use super::{revert, splice, AnchorPattern, ScanDirection, SpliceError};
    use crate::splice::instruction::{HostRoutine, Instruction, MethodRef, OpCode};

    fn end_menu() -> MethodRef {
        MethodRef::new("ImGui", "EndMenu")
    }

    fn routine_with_anchors_at(len: usize, anchors: &[usize]) -> HostRoutine {
        let instructions = (0..len)
            .map(|index| {
                if anchors.contains(&index) {
                    Instruction::call(end_menu())
                } else {
                    Instruction::op(OpCode::Nop)
                }
            })
            .collect();
        HostRoutine::new("DrawMenuBar", instructions)
    }

    #[test]
    fn locate_counts_occurrences_in_scan_direction() {
        let routine = routine_with_anchors_at(10, &[1, 4, 7]);
        let mut pattern = AnchorPattern::last_call_to(end_menu(), 1);
        assert_eq!(pattern.locate(routine.instructions()), Some(7));

        pattern.occurrence = 2;
        assert_eq!(pattern.locate(routine.instructions()), Some(4));

        pattern.direction = ScanDirection::Forward;
        assert_eq!(pattern.locate(routine.instructions()), Some(4));

        pattern.occurrence = 4;
        assert_eq!(pattern.locate(routine.instructions()), None);

        pattern.occurrence = 0;
        assert_eq!(pattern.locate(routine.instructions()), None);
    }

    #[test]
    fn splice_past_end_is_rejected_without_mutation() {
        let mut routine = routine_with_anchors_at(4, &[2]);
        let before = routine.clone();
        let err = splice(
            &mut routine,
            &AnchorPattern::last_call_to(end_menu(), 4),
            Instruction::op(OpCode::Pop),
        )
        .expect_err("insert index 6 exceeds len 4");
        assert!(matches!(err, SpliceError::SpliceIndexOutOfRange { index: 6, .. }));
        assert_eq!(routine, before);
    }

    #[test]
    fn splice_at_exact_end_appends() {
        let mut routine = routine_with_anchors_at(5, &[1]);
        let applied = splice(
            &mut routine,
            &AnchorPattern::last_call_to(end_menu(), 4),
            Instruction::op(OpCode::Return),
        )
        .expect("index equal to len is a valid append");
        assert_eq!(applied.insert_index, 5);
        assert_eq!(routine.instructions()[5], Instruction::op(OpCode::Return));
    }

    #[test]
    fn revert_finds_shifted_instruction() {
        let mut routine = routine_with_anchors_at(8, &[2]);
        let original = routine.clone();
        let dispatch = Instruction::call(MethodRef::new("ModMenu", "RenderMenu"));
        let applied = splice(
            &mut routine,
            &AnchorPattern::last_call_to(end_menu(), 4),
            dispatch,
        )
        .expect("splice should succeed");

        routine.insert(0, Instruction::op(OpCode::Nop));
        revert(&mut routine, &applied).expect("revert should locate shifted call");
        routine.remove(0);
        assert_eq!(routine, original);

        let err = revert(&mut routine, &applied).expect_err("second revert has nothing to remove");
        assert!(matches!(err, SpliceError::SpliceNotFound { .. }));
    }
}
