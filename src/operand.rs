//! The operand model: what an instruction's arguments are, and how to read
//! or write them against a [`crate::thread::Thread`].
//!
//! `Constant`/`Register`/`SRegister`/`DRegister`/`QRegister` mirror the
//! original's four concrete operand classes one-to-one. `Indirect`,
//! `RegisterList`, and `PcRelative` are additions this crate needs for
//! load/store addressing and disassembly that the original expressed ad hoc
//! inside its load/store instruction classes rather than as operands.

use crate::consts::REG_PC;
use crate::error::EmulatorError;
use crate::semantics;
use crate::thread::Thread;
use crate::value::Value;

/// An instruction argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// An immediate value.
    Constant(Value),
    /// A general-purpose register, `r0`..`r15`.
    Register(usize),
    /// A single-precision VFP register, `s0`..`s31`.
    SRegister(usize),
    /// A double-precision VFP/NEON register, `d0`..`d31`. Storage only:
    /// [`Operand::get`]/[`Operand::set`] touch its low 32 bits.
    DRegister(usize),
    /// A quad-word NEON register, `q0`..`q15`. Storage only: see
    /// [`Operand::DRegister`].
    QRegister(usize),
    /// `[base, +/-offset]`-style addressing, covering offset, pre-indexed,
    /// and post-indexed forms.
    Indirect {
        /// The base register.
        base: usize,
        /// The offset, either a [`Operand::Constant`] or a (possibly
        /// shifted) [`Operand::Register`].
        offset: Box<Operand>,
        /// Whether the offset is added (`true`) or subtracted.
        positive: bool,
        /// Pre-indexed (`true`, a.k.a. "offset"/"pre-indexed" addressing):
        /// the offset applies before the access. `false`: post-indexed,
        /// the access uses `base` unchanged and the offset applies after.
        index: bool,
        /// Whether `base` is written back with the offset applied.
        write_back: bool,
        /// Shift type applied to a register offset (ignored for a constant
        /// offset).
        shift_type: u8,
        /// Shift amount applied to a register offset.
        shift_amount: u32,
    },
    /// An ascending bitset of registers, as used by `ldm`/`stm`/`push`/
    /// `pop`.
    RegisterList(u16),
    /// `pc`-relative addressing used by literal-pool loads and `adr`; the
    /// delta is relative to the aligned value of `pc`.
    PcRelative(i64),
}

impl Operand {
    /// Compute the address an [`Operand::Indirect`] operand reads/writes,
    /// applying the offset only when this is pre-indexed/offset
    /// addressing. `pc`-relative indirect addressing rounds the base down
    /// to a word boundary first, per the ARM ARM's literal-pool rule.
    ///
    /// `length` is the executing instruction's own byte length
    /// (`Instruction::length`): [`Thread::pc_raw`] has already been advanced
    /// past the current instruction by the time `exec` runs, so a `pc`-
    /// relative base has to subtract that back off to recover the
    /// architectural `pc`.
    pub fn effective_address(&self, thread: &Thread, length: u8) -> Result<Value, EmulatorError> {
        let Operand::Indirect {
            base,
            offset,
            positive,
            index,
            shift_type,
            shift_amount,
            ..
        } = self
        else {
            unreachable!("effective_address is only defined for Operand::Indirect");
        };

        let base_value = Self::aligned_base(*base, thread, length);
        if !*index {
            return Ok(base_value);
        }
        Self::offset_address(base_value, offset, *positive, *shift_type, *shift_amount, thread, length)
    }

    /// Compute the address written back to `base` after a post-indexed
    /// access, or the same as [`Operand::effective_address`] for
    /// pre-indexed/offset addressing with `write_back` set.
    pub fn writeback_address(&self, thread: &Thread, length: u8) -> Result<Value, EmulatorError> {
        let Operand::Indirect {
            base,
            offset,
            positive,
            shift_type,
            shift_amount,
            ..
        } = self
        else {
            unreachable!("writeback_address is only defined for Operand::Indirect");
        };

        let base_value = Self::aligned_base(*base, thread, length);
        Self::offset_address(base_value, offset, *positive, *shift_type, *shift_amount, thread, length)
    }

    fn aligned_base(base: usize, thread: &Thread, length: u8) -> Value {
        let raw = thread.gpr(base);
        if base == REG_PC {
            if let Value::Int(v) = raw {
                let architectural = v.wrapping_sub(length as u32);
                return Value::Int(architectural & !0b11);
            }
        }
        raw
    }

    fn offset_address(
        base_value: Value,
        offset: &Operand,
        positive: bool,
        shift_type: u8,
        shift_amount: u32,
        thread: &Thread,
        length: u8,
    ) -> Result<Value, EmulatorError> {
        let raw_offset = offset.get(thread, length)?.to_bits();
        let shifted = semantics::shift(32, raw_offset, shift_type, shift_amount, thread.cpsr().c());
        let delta = shifted as i64;
        let delta = if positive { delta } else { -delta };
        Ok(base_value.checked_add(delta)?)
    }

    /// Read this operand's value.
    ///
    /// `length` is the executing instruction's own byte length, needed to
    /// recover the architectural `pc` for [`Operand::PcRelative`] and a
    /// `pc`-based [`Operand::Indirect`]; see [`Operand::effective_address`].
    ///
    /// [`Operand::RegisterList`] has no single scalar value; `ldm`/`stm`
    /// execute by iterating [`Operand::register_list_iter`] directly
    /// instead.
    pub fn get(&self, thread: &Thread, length: u8) -> Result<Value, EmulatorError> {
        match self {
            Operand::Constant(value) => Ok(*value),
            Operand::Register(n) => Ok(thread.gpr(*n)),
            Operand::SRegister(n) => Ok(Value::Int(thread.s(*n))),
            Operand::DRegister(n) => Ok(Value::Int(thread.d(*n) as u32)),
            Operand::QRegister(n) => Ok(Value::Int(thread.q(*n) as u32)),
            Operand::Indirect { .. } => {
                let address = self.effective_address(thread, length)?;
                Ok(thread.memory().load(address, 4)?)
            }
            Operand::PcRelative(delta) => Ok(Self::aligned_base(REG_PC, thread, length).checked_add(*delta)?),
            Operand::RegisterList(_) => {
                unreachable!("RegisterList has no scalar value; use register_list_iter")
            }
        }
    }

    /// Write this operand's value. Only [`Operand::Register`],
    /// [`Operand::SRegister`], [`Operand::DRegister`],
    /// [`Operand::QRegister`], and [`Operand::Indirect`] are mutable.
    pub fn set(&self, thread: &mut Thread, value: Value, length: u8) -> Result<(), EmulatorError> {
        match self {
            Operand::Register(n) => {
                thread.set_gpr(*n, value);
                Ok(())
            }
            Operand::SRegister(n) => {
                thread.set_s(*n, value.to_bits());
                Ok(())
            }
            Operand::DRegister(n) => {
                let low = value.to_bits() as u64;
                let high = thread.d(*n) & !0xffff_ffffu64;
                thread.set_d(*n, high | low);
                Ok(())
            }
            Operand::QRegister(n) => {
                let low = value.to_bits() as u128;
                let high = thread.q(*n) & !0xffff_ffffu128;
                thread.set_q(*n, high | low);
                Ok(())
            }
            Operand::Indirect { .. } => {
                let address = self.effective_address(thread, length)?;
                thread.memory_mut().store(address, value, 4)?;
                Ok(())
            }
            Operand::Constant(_) | Operand::PcRelative(_) | Operand::RegisterList(_) => {
                unreachable!("{self:?} is not a mutable operand")
            }
        }
    }

    /// Ascending register numbers named by a [`Operand::RegisterList`].
    pub fn register_list_iter(&self) -> impl Iterator<Item = usize> + '_ {
        let Operand::RegisterList(mask) = self else {
            unreachable!("register_list_iter is only defined for Operand::RegisterList");
        };
        (0..16).filter(move |r| mask & (1 << r) != 0)
    }
}

fn register_name(n: usize) -> String {
    match n {
        13 => "sp".to_string(),
        14 => "lr".to_string(),
        15 => "pc".to_string(),
        _ => format!("r{n}"),
    }
}

#[cfg(feature = "disassembly")]
impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Constant(value) => write!(f, "#0x{:x}", value.to_bits()),
            Operand::Register(n) => write!(f, "{}", register_name(*n)),
            Operand::SRegister(n) => write!(f, "s{n}"),
            Operand::DRegister(n) => write!(f, "d{n}"),
            Operand::QRegister(n) => write!(f, "q{n}"),
            Operand::Indirect {
                base,
                offset,
                positive,
                index,
                write_back,
                ..
            } => {
                let sign = if *positive { "" } else { "-" };
                if *index {
                    write!(f, "[{}, {sign}{offset}]{}", register_name(*base), if *write_back { "!" } else { "" })
                } else {
                    write!(f, "[{}], {sign}{offset}", register_name(*base))
                }
            }
            Operand::RegisterList(mask) => write!(f, "{{{}}}", format_register_list(*mask)),
            Operand::PcRelative(delta) => write!(f, "#0x{delta:x}"),
        }
    }
}

/// Render a register-list bitmask as a comma-separated list with
/// consecutive runs collapsed to `ra-rb`, e.g. `{r0-r3, r7, lr}`.
#[cfg(feature = "disassembly")]
pub fn format_register_list(mask: u16) -> String {
    let mut parts = Vec::new();
    let mut n = 0usize;
    while n < 16 {
        if mask & (1 << n) == 0 {
            n += 1;
            continue;
        }
        let start = n;
        while n < 16 && mask & (1 << n) != 0 {
            n += 1;
        }
        let end = n - 1;
        if start == end {
            parts.push(register_name(start));
        } else {
            parts.push(format!("{}-{}", register_name(start), register_name(end)));
        }
    }
    parts.join(", ")
}

#[cfg(all(test, feature = "disassembly"))]
mod tests {
    use super::*;

    #[test]
    fn format_register_list_collapses_consecutive_runs() {
        assert_eq!(format_register_list(0b0000_0000_1000_1111), "r0-r3, r7");
        assert_eq!(format_register_list(1 << 14 | 1 << 13), "sp, lr");
        assert_eq!(format_register_list(0), "");
    }

    #[test]
    fn constant_display_is_hex() {
        assert_eq!(Operand::Constant(Value::Int(255)).to_string(), "#0xff");
    }
}
