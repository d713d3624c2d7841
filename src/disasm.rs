//! Human-readable genome listing. Presentation only.

use std::fmt::Write;

use crate::logic::logic_of;
use crate::matching::TagMatcher;
use crate::program::{Instruction, Op, Program};

const NAME_COLUMN: usize = 12;

const LETTER_PAIRS: usize = 26 * 26;

/// Label for an anchor ordinal: `AA`, `AB`, ... `ZZ`, then `AA1`, `AB1`, ...
pub fn anchor_label(ordinal: usize) -> String {
    let pair = ordinal % LETTER_PAIRS;
    let hi = (pair / 26) as u8;
    let lo = (pair % 26) as u8;
    let mut label: String = [char::from(b'A' + hi), char::from(b'A' + lo)].iter().collect();
    let lap = ordinal / LETTER_PAIRS;
    if lap > 0 {
        let _ = write!(label, "{lap}");
    }
    label
}

fn tag_label(inst: &Instruction, matcher: &TagMatcher) -> String {
    match matcher.match_regulated(inst.tag) {
        Some(ordinal) => anchor_label(ordinal),
        None => "<nowhere>".to_string(),
    }
}

fn mnemonic(out: &mut String, name: &str) {
    let lower = name.to_lowercase();
    let pad = NAME_COLUMN.saturating_sub(lower.len());
    let _ = write!(out, "    {lower}{:pad$}", "");
}

pub fn render_instruction(inst: &Instruction, matcher: &TagMatcher) -> String {
    let info = logic_of(inst.op);
    let mut out = String::new();
    match inst.op {
        Op::Anchor => {
            let _ = write!(out, "{}:", tag_label(inst, matcher));
        }
        Op::JumpIfNEq | Op::JumpIfLess => {
            mnemonic(&mut out, info.name);
            let _ = write!(
                out,
                "r{}, r{}, {}",
                inst.args[0],
                inst.args[1],
                tag_label(inst, matcher)
            );
        }
        _ => {
            mnemonic(&mut out, info.name);
            let regs: Vec<String> = inst.args[..info.arity]
                .iter()
                .map(|r| format!("r{r}"))
                .collect();
            out.push_str(&regs.join(", "));
        }
    }
    out
}

/// One line per instruction, newline-terminated.
pub fn render(program: &Program, matcher: &TagMatcher) -> String {
    let mut out = String::new();
    for inst in program {
        out.push_str(&render_instruction(inst, matcher));
        out.push('\n');
    }
    out
}
