//! Tag-addressed control flow.
//!
//! Anchors are collected once per program into a [`TagMatcher`]. Jumps are
//! then resolved against it into a flat cache indexed by instruction
//! position, so the interpreter never matches tags on the hot path.

use crate::program::{Program, Tag};
use crate::regulation::Regulation;

/// Largest regulated distance that still counts as a match. With 32-bit
/// tags every unregulated anchor is reachable.
pub const MATCH_THRESHOLD: f64 = Tag::BITS as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AnchorEntry {
    tag: Tag,
    index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TagMatcher {
    anchors: Vec<AnchorEntry>,
    regulation: Regulation,
}

impl TagMatcher {
    /// Collects every anchor in program order.
    pub fn from_program(program: &Program, regulation: &Regulation) -> Self {
        let anchors = program
            .iter()
            .enumerate()
            .filter(|(_, inst)| inst.op.is_anchor())
            .map(|(index, inst)| AnchorEntry { tag: inst.tag, index })
            .collect();
        Self {
            anchors,
            regulation: regulation.clone(),
        }
    }

    pub fn num_anchors(&self) -> usize {
        self.anchors.len()
    }

    /// Instruction index of the anchor with the given ordinal.
    pub fn anchor_index(&self, ordinal: usize) -> Option<usize> {
        self.anchors.get(ordinal).map(|a| a.index)
    }

    /// Regulated nearest anchor to `query`, returned as its ordinal.
    ///
    /// Ordering is by regulated distance, then raw distance, then ordinal.
    pub fn match_regulated(&self, query: Tag) -> Option<usize> {
        let mut best: Option<(f64, u32, usize)> = None;
        for (ordinal, anchor) in self.anchors.iter().enumerate() {
            let raw = query.distance(anchor.tag);
            let regulated = (raw as f64 + self.regulation.get(ordinal)).max(0.0);
            if regulated > MATCH_THRESHOLD {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_reg, best_raw, _)) => {
                    regulated < best_reg || (regulated == best_reg && raw < best_raw)
                }
            };
            if better {
                best = Some((regulated, raw, ordinal));
            }
        }
        best.map(|(_, _, ordinal)| ordinal)
    }

    /// Instruction index a jump tagged `query` lands on, if any anchor matches.
    pub fn resolve(&self, query: Tag) -> Option<usize> {
        self.match_regulated(query).and_then(|ord| self.anchor_index(ord))
    }
}

/// Resolves the target of every conditional jump in `program`.
///
/// The result has one slot per instruction. Slots for non-jump
/// instructions hold `idx + 1` and are never read.
pub fn build_jump_cache(program: &Program, matcher: &TagMatcher) -> Vec<usize> {
    program
        .iter()
        .enumerate()
        .map(|(idx, inst)| {
            if inst.op.is_jump() {
                matcher.resolve(inst.tag).unwrap_or(idx + 1)
            } else {
                idx + 1
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Instruction, Op};

    fn program(insts: Vec<Instruction>) -> Program {
        Program::new(insts).unwrap()
    }

    #[test]
    fn single_anchor_resolves_exactly() {
        let p = program(vec![
            Instruction::system(Op::Nop),
            Instruction::anchor(Tag(0xF0)),
            Instruction::jump(Op::JumpIfNEq, 0, 1, Tag(0xF1)),
        ]);
        let matcher = TagMatcher::from_program(&p, &Regulation::new());
        let cache = build_jump_cache(&p, &matcher);
        assert_eq!(cache.len(), p.len());
        assert_eq!(cache[2], 1);
    }

    #[test]
    fn no_anchor_falls_through() {
        let p = program(vec![
            Instruction::jump(Op::JumpIfLess, 0, 1, Tag(3)),
            Instruction::system(Op::Nop),
        ]);
        let matcher = TagMatcher::from_program(&p, &Regulation::new());
        assert_eq!(matcher.match_regulated(Tag(3)), None);
        assert_eq!(build_jump_cache(&p, &matcher), vec![1, 2]);
    }

    #[test]
    fn nearest_anchor_wins_and_ties_go_to_first() {
        let p = program(vec![
            Instruction::anchor(Tag(0b0011)),
            Instruction::anchor(Tag(0b0101)),
            Instruction::anchor(Tag(0b0001)),
        ]);
        let matcher = TagMatcher::from_program(&p, &Regulation::new());
        assert_eq!(matcher.match_regulated(Tag(0b0001)), Some(2));
        // 0b0111 is one bit away from both of the first two anchors.
        assert_eq!(matcher.match_regulated(Tag(0b0111)), Some(0));
    }

    #[test]
    fn regulation_can_steer_and_exclude() {
        let p = program(vec![
            Instruction::anchor(Tag(0)),
            Instruction::anchor(Tag(0b1111)),
        ]);
        let mut reg = Regulation::new();
        reg.set(0, 10.0);
        let matcher = TagMatcher::from_program(&p, &reg);
        assert_eq!(matcher.match_regulated(Tag(0)), Some(1));

        let mut reg = Regulation::new();
        reg.set(0, 100.0);
        reg.set(1, 100.0);
        let matcher = TagMatcher::from_program(&p, &reg);
        assert_eq!(matcher.match_regulated(Tag(0)), None);
    }

    #[test]
    fn negative_regulation_attracts() {
        let p = program(vec![
            Instruction::anchor(Tag(0)),
            Instruction::anchor(Tag(0xFF)),
        ]);
        let mut reg = Regulation::new();
        reg.set(1, -20.0);
        let matcher = TagMatcher::from_program(&p, &reg);
        assert_eq!(matcher.resolve(Tag(1)), Some(1));
        // Clamped at zero, so an exact hit still beats the attracted anchor.
        assert_eq!(matcher.resolve(Tag(0)), Some(0));
    }
}
