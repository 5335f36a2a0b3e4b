//! Decoder rule registry: a process-wide, immutable table of bit-pattern
//! rules keyed by `(length, instruction_set)`, tried in registration order
//! until one matches.

mod arm;
mod thumb;

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::bitpattern::BitPattern;
use crate::condition::Condition;
use crate::consts::{INSTRUCTION_SET_ARM, INSTRUCTION_SET_THUMBEE};
use crate::error::DecodeError;
use crate::instruction::Instruction;

/// A single registered decoder: a bit pattern to try, and the builder run
/// against its unpacked fields when it matches.
struct Rule {
    pattern: BitPattern,
    build: fn(&HashMap<String, u32>, u32, u8, u8, Condition) -> Option<Instruction>,
}

type Table = HashMap<(u8, u8), Vec<Rule>>;

/// A registration sink decoder modules push their rules into, keyed by
/// `(length, instruction_set)`. Rules within one key are tried in the
/// order they were pushed.
pub(crate) struct Registrar<'a> {
    table: &'a mut Table,
}

impl<'a> Registrar<'a> {
    fn push(
        &mut self,
        length: u8,
        instruction_set: u8,
        pattern: &'static str,
        rename: &[(char, &str)],
        build: fn(&HashMap<String, u32>, u32, u8, u8, Condition) -> Option<Instruction>,
    ) {
        let compiled = BitPattern::compile(pattern, rename, &[]).expect("decoder bit pattern is well-formed");
        debug_assert_eq!(
            compiled.pattern().chars().filter(|c| *c != ' ').count(),
            (length as usize) * 8,
            "pattern {pattern:?} does not cover a {length}-byte instruction"
        );
        self.table.entry((length, instruction_set)).or_default().push(Rule { pattern: compiled, build });
    }

    /// Register a 4-byte ARM rule.
    pub(crate) fn arm(
        &mut self,
        pattern: &'static str,
        rename: &[(char, &str)],
        build: fn(&HashMap<String, u32>, u32, u8, u8, Condition) -> Option<Instruction>,
    ) {
        self.push(4, INSTRUCTION_SET_ARM, pattern, rename, build);
    }

    /// Register a 2-byte (narrow) Thumb rule.
    pub(crate) fn thumb16(
        &mut self,
        pattern: &'static str,
        rename: &[(char, &str)],
        build: fn(&HashMap<String, u32>, u32, u8, u8, Condition) -> Option<Instruction>,
    ) {
        self.push(2, crate::consts::INSTRUCTION_SET_THUMB, pattern, rename, build);
    }

    /// Register a 4-byte (wide) Thumb-2 rule.
    pub(crate) fn thumb32(
        &mut self,
        pattern: &'static str,
        rename: &[(char, &str)],
        build: fn(&HashMap<String, u32>, u32, u8, u8, Condition) -> Option<Instruction>,
    ) {
        self.push(4, crate::consts::INSTRUCTION_SET_THUMB, pattern, rename, build);
    }
}

fn build_table() -> Table {
    let mut table = Table::new();
    let mut registrar = Registrar { table: &mut table };
    arm::register(&mut registrar);
    thumb::register(&mut registrar);
    table
}

fn registry() -> &'static Table {
    static TABLE: OnceLock<Table> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

/// Decode one instruction. For ARM, the condition nibble (bits 31:28) is
/// split off the encoding before any rule sees it, exactly as the upstream
/// decoder always extracts it (this crate does not implement the
/// unconditional-instruction extension space addressed by `cond == 0b1111`;
/// such an encoding decodes normally but is attached
/// [`Condition::Nv`], which never executes). Thumb and ThumbEE encodings
/// carry no condition field of their own and always decode as
/// [`Condition::Al`] at the instruction level; per-instruction gating
/// inside an `IT` block is a property of `cpsr.it()`, not of this field.
pub fn decode(raw_encoding: u32, length: u8, instruction_set: u8) -> Result<Instruction, DecodeError> {
    let (condition, encoding) = if instruction_set == INSTRUCTION_SET_ARM {
        (Condition::from_bits(raw_encoding >> 28), raw_encoding & 0x0fff_ffff)
    } else {
        (Condition::Al, raw_encoding)
    };

    let table = registry();
    let mut rules: Vec<&Rule> = table.get(&(length, instruction_set)).into_iter().flatten().collect();
    if instruction_set == INSTRUCTION_SET_THUMBEE {
        rules.extend(table.get(&(length, crate::consts::INSTRUCTION_SET_THUMB)).into_iter().flatten());
    }

    for rule in rules {
        if let Some(fields) = rule.pattern.unpack(encoding) {
            if let Some(instruction) = (rule.build)(&fields, encoding, length, instruction_set, condition) {
                return Ok(instruction);
            }
        }
    }

    Err(DecodeError::NotFound { encoding, length, instruction_set })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_encoding_reports_not_found() {
        let err = decode(0, 4, INSTRUCTION_SET_ARM).unwrap_err();
        assert!(matches!(err, DecodeError::NotFound { .. }));
    }

    #[test]
    fn decode_is_invariant_to_the_condition_field() {
        let base = 0xe1a0_0000; // movs r0, r0 (AL)
        let a = decode(base, 4, INSTRUCTION_SET_ARM).unwrap();
        let b = decode((base & 0x0fff_ffff) | (0x0_u32 << 28), 4, INSTRUCTION_SET_ARM).unwrap();
        assert_eq!(a.main_opcode, b.main_opcode);
        assert_eq!(a.operands.len(), b.operands.len());
        assert_eq!(b.condition, Condition::Eq);
    }

    /// Swapping only the condition nibble of an ARM encoding never changes
    /// which rule matches or what it extracts; only `condition` itself
    /// differs.
    #[quickcheck_macros::quickcheck]
    fn decode_ignores_the_condition_nibble(body: u32, cond_a: u8, cond_b: u8) -> quickcheck::TestResult {
        let body = body & 0x0fff_ffff;
        let cond_a = (cond_a & 0xf) as u32;
        let cond_b = (cond_b & 0xf) as u32;
        if cond_a == 0xf || cond_b == 0xf {
            return quickcheck::TestResult::discard();
        }
        let (a, b) = (
            decode(body | (cond_a << 28), 4, INSTRUCTION_SET_ARM),
            decode(body | (cond_b << 28), 4, INSTRUCTION_SET_ARM),
        );
        match (a, b) {
            (Ok(a), Ok(b)) => quickcheck::TestResult::from_bool(
                a.main_opcode == b.main_opcode
                    && a.operands == b.operands
                    && a.sets_flags == b.sets_flags
                    && a.shift_type == b.shift_type
                    && a.shift_amount == b.shift_amount,
            ),
            (Err(_), Err(_)) => quickcheck::TestResult::discard(),
            _ => quickcheck::TestResult::failed(),
        }
    }
}
