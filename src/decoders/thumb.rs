//! Thumb (16-bit narrow, plus the wide `bl`/`blx` and `it` forms) decoder
//! rules. `core.py` carried no literal Thumb rule bodies for this crate to
//! transcribe (its pack retained only imports and a docstring), so these are
//! grounded directly in the ARM ARM's Thumb encoding tables the way
//! `decoders/arm.rs`'s rules already are, in the same registration-order
//! dispatch style.

use std::collections::HashMap;

use crate::condition::Condition;
use crate::consts::{REG_LR, REG_PC, REG_SP};
use crate::instruction::Instruction;
use crate::operand::Operand;
use crate::semantics::{self, SRTYPE_ASR, SRTYPE_LSL, SRTYPE_LSR, SRTYPE_ROR};
use crate::thread::Thread;
use crate::value::Value;
use crate::error::EmulatorError;

use super::Registrar;

pub(super) fn register(r: &mut Registrar) {
    register_shift_immediate(r);
    register_add_sub(r);
    register_immediate(r);
    register_alu(r);
    register_hi_register_ops_and_bx(r);
    register_pc_relative_load(r);
    register_load_store_register_offset(r);
    register_load_store_sign_extended(r);
    register_load_store_immediate_offset(r);
    register_load_store_halfword_immediate(r);
    register_sp_relative_load_store(r);
    register_load_address(r);
    register_add_sub_sp_immediate(r);
    register_push_pop(r);
    register_extend_and_reverse(r);
    register_cbz(r);
    register_conditional_branch(r);
    register_unconditional_branch(r);
    register_it(r);
    register_bl_blx_wide(r);
}

fn field(fields: &HashMap<String, u32>, name: &str) -> u32 {
    fields[name]
}

fn set_nzcv(thread: &mut Thread, result: u32, carry: Option<bool>, overflow: Option<bool>) {
    let mut cpsr = thread.cpsr();
    cpsr.set_n(result & 0x8000_0000 != 0);
    cpsr.set_z(result == 0);
    if let Some(c) = carry {
        cpsr.set_c(c);
    }
    if let Some(v) = overflow {
        cpsr.set_v(v);
    }
    thread.set_cpsr(cpsr);
}

/// Branch by a `pc`-relative signed byte `offset`, the way every branch
/// family (narrow `b`, conditional `b`, `cbz`/`cbnz`, and the wide `bl`/`blx`)
/// computes its target: architecturally `pc == location + 4`, but by the time
/// `exec` runs, `execute()` (`src/instruction.rs`) has already advanced
/// `pc_raw()` once by the instruction's own `length`, so it reads
/// `location + 4 + length`. Subtracting `length` back off before adding
/// `offset` and handing the result to [`Thread::goto`] (which re-applies the
/// read-ahead) keeps this in step with how `arm.rs`'s direct branches compute
/// their target. `length` is 2 for every narrow caller and 4 for the wide
/// `bl`/`blx` encoding.
fn branch_target(thread: &Thread, offset: i64, length: u8) -> Result<Value, EmulatorError> {
    thread.pc_raw().checked_add(offset - length as i64)
}

/// Read a general-purpose register the way Thumb hi-register operations
/// (`add`/`cmp`/`mov` with an `rs`/`rd` in `r8`..`r15`) see it: `r15` reads as
/// the architectural `pc` (current instruction's address plus 4), not the
/// raw, already-advanced [`Thread::pc_raw`]/[`Thread::gpr`] value `exec` runs
/// with. `length` is the executing instruction's own byte length.
fn architectural_gpr(thread: &Thread, reg: usize, length: u8) -> Value {
    let raw = thread.gpr(reg);
    if reg == REG_PC {
        if let Value::Int(v) = raw {
            return Value::Int(v.wrapping_sub(length as u32));
        }
    }
    raw
}

/// Move shifted register: `lsl/lsr/asr Rd, Rm, #imm5`.
fn register_shift_immediate(r: &mut Registrar) {
    r.thumb16(
        "000 oo iiiii mmm ddd",
        &[('o', "op"), ('i', "imm"), ('m', "rm"), ('d', "rd")],
        |fields, encoding, length, instruction_set, condition| {
            let op = field(fields, "op");
            if op == 0b11 {
                return None; // add/subtract register or immediate3, handled below
            }
            let rd = field(fields, "rd") as usize;
            let rm = field(fields, "rm") as usize;
            let (shift_type, shift_amount) = semantics::decode_imm_shift(op as u8, field(fields, "imm"));
            let mnemonic = match op {
                0 => "lsl",
                1 => "lsr",
                _ => "asr",
            };
            let operands = vec![Operand::Register(rd), Operand::Register(rm), Operand::Constant(Value::Int(shift_amount))];
            let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let carry_in = thread.cpsr().c();
                let (result, carry) = semantics::shift_c(32, thread.gpr(rm).to_bits(), shift_type, shift_amount, carry_in);
                thread.set_gpr(rd, Value::Int(result));
                set_nzcv(thread, result, Some(carry), None);
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec).set_flags(true))
        },
    );
}

/// Add/subtract register or 3-bit immediate.
fn register_add_sub(r: &mut Registrar) {
    r.thumb16(
        "000 11 k o nnn sss ddd",
        &[('k', "imm"), ('o', "sub"), ('n', "rn_or_imm"), ('s', "rs"), ('d', "rd")],
        |fields, encoding, length, instruction_set, condition| {
            let imm = field(fields, "imm") != 0;
            let sub = field(fields, "sub") != 0;
            let rs = field(fields, "rs") as usize;
            let rd = field(fields, "rd") as usize;
            let rn_or_imm = field(fields, "rn_or_imm");
            let mnemonic = if sub { "sub" } else { "add" };
            let operand2 = if imm { Operand::Constant(Value::Int(rn_or_imm)) } else { Operand::Register(rn_or_imm as usize) };
            let operands = vec![Operand::Register(rd), Operand::Register(rs), operand2];
            let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let rs_val = thread.gpr(rs).to_bits();
                let op2_val = if imm { rn_or_imm } else { thread.gpr(rn_or_imm as usize).to_bits() };
                let (result, carry, overflow) = if sub {
                    semantics::add_with_carry(32, rs_val, !op2_val, true)
                } else {
                    semantics::add_with_carry(32, rs_val, op2_val, false)
                };
                thread.set_gpr(rd, Value::Int(result));
                set_nzcv(thread, result, Some(carry), Some(overflow));
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec).set_flags(true))
        },
    );
}

/// Move/compare/add/subtract with an 8-bit immediate, low registers only.
fn register_immediate(r: &mut Registrar) {
    r.thumb16(
        "001 oo ddd iiiiiiii",
        &[('o', "op"), ('d', "rd"), ('i', "imm8")],
        |fields, encoding, length, instruction_set, condition| {
            let op = field(fields, "op");
            let rd = field(fields, "rd") as usize;
            let imm8 = field(fields, "imm8");
            let mnemonic: &'static str = match op {
                0 => "mov",
                1 => "cmp",
                2 => "add",
                _ => "sub",
            };
            let operands = vec![Operand::Register(rd), Operand::Constant(Value::Int(imm8))];
            let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let rd_val = thread.gpr(rd).to_bits();
                match op {
                    0 => {
                        thread.set_gpr(rd, Value::Int(imm8));
                        set_nzcv(thread, imm8, None, None);
                    }
                    1 => {
                        let (result, carry, overflow) = semantics::add_with_carry(32, rd_val, !imm8, true);
                        set_nzcv(thread, result, Some(carry), Some(overflow));
                    }
                    2 => {
                        let (result, carry, overflow) = semantics::add_with_carry(32, rd_val, imm8, false);
                        thread.set_gpr(rd, Value::Int(result));
                        set_nzcv(thread, result, Some(carry), Some(overflow));
                    }
                    _ => {
                        let (result, carry, overflow) = semantics::add_with_carry(32, rd_val, !imm8, true);
                        thread.set_gpr(rd, Value::Int(result));
                        set_nzcv(thread, result, Some(carry), Some(overflow));
                    }
                }
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec).set_flags(true))
        },
    );
}

/// Two-register ALU operations (`and, eor, lsl, lsr, asr, adc, sbc, ror,
/// tst, neg, cmp, cmn, orr, mul, bic, mvn`), all low registers.
fn register_alu(r: &mut Registrar) {
    r.thumb16(
        "010000 oooo mmm ddd",
        &[('o', "op"), ('m', "rm"), ('d', "rd")],
        |fields, encoding, length, instruction_set, condition| {
            let op = field(fields, "op");
            let rd = field(fields, "rd") as usize;
            let rm = field(fields, "rm") as usize;
            let mnemonic: &'static str = match op {
                0 => "and",
                1 => "eor",
                2 => "lsl",
                3 => "lsr",
                4 => "asr",
                5 => "adc",
                6 => "sbc",
                7 => "ror",
                8 => "tst",
                9 => "neg",
                10 => "cmp",
                11 => "cmn",
                12 => "orr",
                13 => "mul",
                14 => "bic",
                _ => "mvn",
            };
            let writes_rd = !matches!(op, 8 | 10 | 11);
            let operands = vec![Operand::Register(rd), Operand::Register(rm)];
            let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let rd_val = thread.gpr(rd).to_bits();
                let rm_val = thread.gpr(rm).to_bits();
                let carry_in = thread.cpsr().c();
                let (result, carry, overflow): (u32, Option<bool>, Option<bool>) = match op {
                    0 => (rd_val & rm_val, Some(carry_in), None),
                    1 => (rd_val ^ rm_val, Some(carry_in), None),
                    2 => {
                        let (v, c) = semantics::shift_c(32, rd_val, SRTYPE_LSL, rm_val & 0xff, carry_in);
                        (v, Some(c), None)
                    }
                    3 => {
                        let (v, c) = semantics::shift_c(32, rd_val, SRTYPE_LSR, rm_val & 0xff, carry_in);
                        (v, Some(c), None)
                    }
                    4 => {
                        let (v, c) = semantics::shift_c(32, rd_val, SRTYPE_ASR, rm_val & 0xff, carry_in);
                        (v, Some(c), None)
                    }
                    5 => {
                        let (v, c, o) = semantics::add_with_carry(32, rd_val, rm_val, carry_in);
                        (v, Some(c), Some(o))
                    }
                    6 => {
                        let (v, c, o) = semantics::add_with_carry(32, rd_val, !rm_val, carry_in);
                        (v, Some(c), Some(o))
                    }
                    7 => {
                        let (v, c) = semantics::shift_c(32, rd_val, SRTYPE_ROR, rm_val & 0xff, carry_in);
                        (v, Some(c), None)
                    }
                    8 => (rd_val & rm_val, Some(carry_in), None),
                    9 => {
                        let (v, c, o) = semantics::add_with_carry(32, 0, !rm_val, true);
                        (v, Some(c), Some(o))
                    }
                    10 => {
                        let (v, c, o) = semantics::add_with_carry(32, rd_val, !rm_val, true);
                        (v, Some(c), Some(o))
                    }
                    11 => {
                        let (v, c, o) = semantics::add_with_carry(32, rd_val, rm_val, false);
                        (v, Some(c), Some(o))
                    }
                    12 => (rd_val | rm_val, Some(carry_in), None),
                    13 => (rd_val.wrapping_mul(rm_val), None, None),
                    14 => (rd_val & !rm_val, Some(carry_in), None),
                    _ => (!rm_val, Some(carry_in), None),
                };
                if writes_rd {
                    thread.set_gpr(rd, Value::Int(result));
                }
                set_nzcv(thread, result, carry, overflow);
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec).set_flags(true))
        },
    );
}

/// `add/cmp/mov` on any register pair (including `r8`-`r15`), and `bx`/`blx`
/// register-indirect branch-and-exchange.
fn register_hi_register_ops_and_bx(r: &mut Registrar) {
    r.thumb16(
        "010001 oo h s mmm ddd",
        &[('o', "op"), ('h', "h1"), ('s', "h2"), ('m', "rs"), ('d', "rd")],
        |fields, encoding, length, instruction_set, condition| {
            let op = field(fields, "op");
            let h1 = field(fields, "h1");
            let h2 = field(fields, "h2");
            let rs = ((h2 << 3) | field(fields, "rs")) as usize;
            let rd = ((h1 << 3) | field(fields, "rd")) as usize;

            if op == 0b11 {
                let link = h1 != 0;
                let mnemonic = if link { "blx" } else { "bx" };
                let operands = vec![Operand::Register(rs)];
                let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                    let target = thread.gpr(rs).to_bits();
                    let (fixed, thumb_mode) = semantics::fix_pc_addr_bx(target);
                    if link {
                        let lr = thread.pc_raw().checked_add(-4)?;
                        thread.set_lr(lr);
                    }
                    let mut cpsr = thread.cpsr();
                    cpsr.set_thumb(thumb_mode);
                    thread.set_cpsr(cpsr);
                    thread.goto(Value::Int(fixed))?;
                    Ok(())
                };
                return Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec));
            }

            let mnemonic: &'static str = match op {
                0 => "add",
                1 => "cmp",
                _ => "mov",
            };
            let operands = vec![Operand::Register(rd), Operand::Register(rs)];
            let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let rd_val = thread.gpr(rd).to_bits();
                let rs_val = architectural_gpr(thread, rs, instr.length).to_bits();
                match op {
                    0 => {
                        let result = rd_val.wrapping_add(rs_val);
                        if rd == REG_PC {
                            thread.goto(Value::Int(result & !0b1))?;
                        } else {
                            thread.set_gpr(rd, Value::Int(result));
                        }
                    }
                    1 => {
                        let (result, carry, overflow) = semantics::add_with_carry(32, rd_val, !rs_val, true);
                        set_nzcv(thread, result, Some(carry), Some(overflow));
                    }
                    _ => {
                        if rd == REG_PC {
                            let (fixed, thumb_mode) = semantics::fix_pc_addr_bx(rs_val);
                            let mut cpsr = thread.cpsr();
                            cpsr.set_thumb(thumb_mode);
                            thread.set_cpsr(cpsr);
                            thread.goto(Value::Int(fixed))?;
                        } else {
                            thread.set_gpr(rd, Value::Int(rs_val));
                        }
                    }
                }
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

/// PC-relative literal load: `ldr Rd, [pc, #imm8*4]`.
fn register_pc_relative_load(r: &mut Registrar) {
    r.thumb16(
        "01001 ddd iiiiiiii",
        &[('d', "rd"), ('i', "imm8")],
        |fields, encoding, length, instruction_set, condition| {
            let rd = field(fields, "rd") as usize;
            let imm = field(fields, "imm8") * 4;
            let addressing = Operand::Indirect {
                base: REG_PC,
                offset: Box::new(Operand::Constant(Value::Int(imm))),
                positive: true,
                index: true,
                write_back: false,
                shift_type: 0,
                shift_amount: 0,
            };
            let operands = vec![Operand::Register(rd), addressing.clone()];
            let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let value = addressing.get(thread, instr.length)?;
                thread.set_gpr(rd, value);
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, "ldr", operands, exec))
        },
    );
}

/// `ldr/str{,b}` with a plain register offset.
fn register_load_store_register_offset(r: &mut Registrar) {
    r.thumb16(
        "0101 l b 0 mmm nnn ddd",
        &[('l', "load"), ('b', "byte"), ('m', "rm"), ('n', "rn"), ('d', "rd")],
        |fields, encoding, length, instruction_set, condition| {
            let load = field(fields, "load") != 0;
            let byte = field(fields, "byte") != 0;
            let rn = field(fields, "rn") as usize;
            let rd = field(fields, "rd") as usize;
            let rm = field(fields, "rm") as usize;
            let addressing = Operand::Indirect {
                base: rn,
                offset: Box::new(Operand::Register(rm)),
                positive: true,
                index: true,
                write_back: false,
                shift_type: 0,
                shift_amount: 0,
            };
            let mnemonic: &'static str = match (load, byte) {
                (true, true) => "ldrb",
                (true, false) => "ldr",
                (false, true) => "strb",
                (false, false) => "str",
            };
            let operands = vec![Operand::Register(rd), addressing.clone()];
            let length_bytes = if byte { 1 } else { 4 };
            let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let address = addressing.effective_address(thread, instr.length)?;
                if load {
                    let raw = thread.memory().load(address, length_bytes)?.to_bits();
                    thread.set_gpr(rd, Value::Int(raw));
                } else {
                    let value = thread.gpr(rd).to_bits() & if byte { 0xff } else { 0xffff_ffff };
                    thread.memory_mut().store(address, Value::Int(value), length_bytes)?;
                }
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

/// `strh/ldrh/ldsb/ldsh`, sign/zero-extended register-offset loads and a
/// plain halfword store.
fn register_load_store_sign_extended(r: &mut Registrar) {
    r.thumb16(
        "0101 h s 1 mmm nnn ddd",
        &[('h', "h"), ('s', "s"), ('m', "rm"), ('n', "rn"), ('d', "rd")],
        |fields, encoding, length, instruction_set, condition| {
            let h = field(fields, "h") != 0;
            let s = field(fields, "s") != 0;
            let rn = field(fields, "rn") as usize;
            let rd = field(fields, "rd") as usize;
            let rm = field(fields, "rm") as usize;
            let addressing = Operand::Indirect {
                base: rn,
                offset: Box::new(Operand::Register(rm)),
                positive: true,
                index: true,
                write_back: false,
                shift_type: 0,
                shift_amount: 0,
            };
            let mnemonic: &'static str = match (s, h) {
                (false, false) => "strh",
                (false, true) => "ldrh",
                (true, false) => "ldrsb",
                (true, true) => "ldrsh",
            };
            let byte_length = if h { 2 } else { 1 };
            let operands = vec![Operand::Register(rd), addressing.clone()];
            let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let address = addressing.effective_address(thread, instr.length)?;
                if !s && !h {
                    let value = thread.gpr(rd).to_bits() & 0xffff;
                    thread.memory_mut().store(address, Value::Int(value), 2)?;
                } else {
                    let raw = thread.memory().load(address, byte_length)?.to_bits();
                    let value = if s { semantics::signed(byte_length * 8, raw) as u32 } else { raw };
                    thread.set_gpr(rd, Value::Int(value));
                }
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

/// `ldr/str{,b}` with a 5-bit immediate offset (word- or byte-scaled).
fn register_load_store_immediate_offset(r: &mut Registrar) {
    r.thumb16(
        "011 b l iiiii nnn ddd",
        &[('b', "byte"), ('l', "load"), ('i', "imm5"), ('n', "rn"), ('d', "rd")],
        |fields, encoding, length, instruction_set, condition| {
            let byte = field(fields, "byte") != 0;
            let load = field(fields, "load") != 0;
            let rn = field(fields, "rn") as usize;
            let rd = field(fields, "rd") as usize;
            let imm5 = field(fields, "imm5");
            let imm = if byte { imm5 } else { imm5 * 4 };
            let addressing = Operand::Indirect {
                base: rn,
                offset: Box::new(Operand::Constant(Value::Int(imm))),
                positive: true,
                index: true,
                write_back: false,
                shift_type: 0,
                shift_amount: 0,
            };
            let mnemonic: &'static str = match (load, byte) {
                (true, true) => "ldrb",
                (true, false) => "ldr",
                (false, true) => "strb",
                (false, false) => "str",
            };
            let operands = vec![Operand::Register(rd), addressing.clone()];
            let length_bytes = if byte { 1 } else { 4 };
            let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let address = addressing.effective_address(thread, instr.length)?;
                if load {
                    let raw = thread.memory().load(address, length_bytes)?.to_bits();
                    thread.set_gpr(rd, Value::Int(raw));
                } else {
                    let value = thread.gpr(rd).to_bits() & if byte { 0xff } else { 0xffff_ffff };
                    thread.memory_mut().store(address, Value::Int(value), length_bytes)?;
                }
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

/// `ldrh/strh` with a 5-bit halfword-scaled immediate offset.
fn register_load_store_halfword_immediate(r: &mut Registrar) {
    r.thumb16(
        "1000 l iiiii nnn ddd",
        &[('l', "load"), ('i', "imm5"), ('n', "rn"), ('d', "rd")],
        |fields, encoding, length, instruction_set, condition| {
            let load = field(fields, "load") != 0;
            let rn = field(fields, "rn") as usize;
            let rd = field(fields, "rd") as usize;
            let imm = field(fields, "imm5") * 2;
            let addressing = Operand::Indirect {
                base: rn,
                offset: Box::new(Operand::Constant(Value::Int(imm))),
                positive: true,
                index: true,
                write_back: false,
                shift_type: 0,
                shift_amount: 0,
            };
            let mnemonic = if load { "ldrh" } else { "strh" };
            let operands = vec![Operand::Register(rd), addressing.clone()];
            let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let address = addressing.effective_address(thread, instr.length)?;
                if load {
                    let raw = thread.memory().load(address, 2)?.to_bits();
                    thread.set_gpr(rd, Value::Int(raw));
                } else {
                    let value = thread.gpr(rd).to_bits() & 0xffff;
                    thread.memory_mut().store(address, Value::Int(value), 2)?;
                }
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

/// `ldr/str Rd, [sp, #imm8*4]`.
fn register_sp_relative_load_store(r: &mut Registrar) {
    r.thumb16(
        "1001 l ddd iiiiiiii",
        &[('l', "load"), ('d', "rd"), ('i', "imm8")],
        |fields, encoding, length, instruction_set, condition| {
            let load = field(fields, "load") != 0;
            let rd = field(fields, "rd") as usize;
            let imm = field(fields, "imm8") * 4;
            let addressing = Operand::Indirect {
                base: REG_SP,
                offset: Box::new(Operand::Constant(Value::Int(imm))),
                positive: true,
                index: true,
                write_back: false,
                shift_type: 0,
                shift_amount: 0,
            };
            let mnemonic = if load { "ldr" } else { "str" };
            let operands = vec![Operand::Register(rd), addressing.clone()];
            let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let address = addressing.effective_address(thread, instr.length)?;
                if load {
                    let raw = thread.memory().load(address, 4)?.to_bits();
                    thread.set_gpr(rd, Value::Int(raw));
                } else {
                    thread.memory_mut().store(address, thread.gpr(rd), 4)?;
                }
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

/// `add Rd, pc, #imm8*4` (`adr`) and `add Rd, sp, #imm8*4`.
fn register_load_address(r: &mut Registrar) {
    r.thumb16(
        "1010 s ddd iiiiiiii",
        &[('s', "sp"), ('d', "rd"), ('i', "imm8")],
        |fields, encoding, length, instruction_set, condition| {
            let from_sp = field(fields, "sp") != 0;
            let rd = field(fields, "rd") as usize;
            let imm = field(fields, "imm8") * 4;
            let base = if from_sp { REG_SP } else { REG_PC };
            let mnemonic = "add";
            let operands = vec![Operand::Register(rd), Operand::Register(base), Operand::Constant(Value::Int(imm))];
            let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let base_value = if from_sp {
                    thread.gpr(REG_SP)
                } else {
                    let architectural_pc = thread.pc_raw().to_bits().wrapping_sub(instr.length as u32);
                    Value::Int(architectural_pc & !0b11)
                };
                thread.set_gpr(rd, base_value.checked_add(imm as i64)?);
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

/// `add/sub sp, sp, #imm7*4`.
fn register_add_sub_sp_immediate(r: &mut Registrar) {
    r.thumb16(
        "10110000 o iiiiiii",
        &[('o', "sub"), ('i', "imm7")],
        |fields, encoding, length, instruction_set, condition| {
            let sub = field(fields, "sub") != 0;
            let imm = (field(fields, "imm7") * 4) as i64;
            let mnemonic = if sub { "sub" } else { "add" };
            let operands = vec![Operand::Register(REG_SP), Operand::Constant(Value::Int(imm as u32))];
            let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let delta = if sub { -imm } else { imm };
                let sp = thread.sp().checked_add(delta)?;
                thread.set_sp(sp);
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

/// `push`/`pop`, the narrow Thumb encoding (distinct from ARM's plain
/// `stmdb`/`ldmia sp!` aliasing — Thumb gives this its own opcode space
/// with an explicit `lr`/`pc` bit rather than expressing it as a general
/// register list over `r0`-`r15`).
fn register_push_pop(r: &mut Registrar) {
    r.thumb16(
        "1011 l 10 e rrrrrrrr",
        &[('l', "pop"), ('e', "extra"), ('r', "list")],
        |fields, encoding, length, instruction_set, condition| {
            let pop = field(fields, "pop") != 0;
            let extra = field(fields, "extra") != 0;
            let mut list = field(fields, "list") as u16;
            if extra {
                list |= 1 << if pop { REG_PC } else { REG_LR };
            }
            let mnemonic = if pop { "pop" } else { "push" };
            let operands = vec![Operand::RegisterList(list)];
            let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let registers: Vec<usize> = (0..16).filter(|b| list & (1 << b) != 0).collect();
                if pop {
                    let mut address = thread.sp().to_bits() as i64;
                    for reg in &registers {
                        let value = thread.memory().load(Value::Int(address as u32), 4)?;
                        if *reg == REG_PC {
                            let (fixed, thumb_mode) = semantics::fix_pc_addr_load(value.to_bits());
                            let mut cpsr = thread.cpsr();
                            cpsr.set_thumb(thumb_mode);
                            thread.set_cpsr(cpsr);
                            thread.goto(Value::Int(fixed))?;
                        } else {
                            thread.set_gpr(*reg, value);
                        }
                        address += 4;
                    }
                    thread.set_sp(thread.sp().checked_add(registers.len() as i64 * 4)?);
                } else {
                    let start = thread.sp().checked_add(-(registers.len() as i64 * 4))?;
                    let mut address = start;
                    for reg in &registers {
                        thread.memory_mut().store(address, thread.gpr(*reg), 4)?;
                        address = address.checked_add(4)?;
                    }
                    thread.set_sp(start);
                }
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

/// Sign/zero-extend (`sxth/sxtb/uxth/uxtb`) and byte-reverse
/// (`rev/rev16/revsh`), the narrow-Thumb-only "miscellaneous" group with no
/// ARM counterpart this crate implements.
fn register_extend_and_reverse(r: &mut Registrar) {
    r.thumb16(
        "1011 0010 oo mmm ddd",
        &[('o', "op"), ('m', "rm"), ('d', "rd")],
        |fields, encoding, length, instruction_set, condition| {
            let op = field(fields, "op");
            let rd = field(fields, "rd") as usize;
            let rm = field(fields, "rm") as usize;
            let mnemonic: &'static str = match op {
                0 => "sxth",
                1 => "sxtb",
                2 => "uxth",
                _ => "uxtb",
            };
            let operands = vec![Operand::Register(rd), Operand::Register(rm)];
            let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let value = thread.gpr(rm).to_bits();
                let result = match op {
                    0 => semantics::signed(16, value & 0xffff) as u32,
                    1 => semantics::signed(8, value & 0xff) as u32,
                    2 => value & 0xffff,
                    _ => value & 0xff,
                };
                thread.set_gpr(rd, Value::Int(result));
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );

    r.thumb16(
        "1011 1010 oo mmm ddd",
        &[('o', "op"), ('m', "rm"), ('d', "rd")],
        |fields, encoding, length, instruction_set, condition| {
            let op = field(fields, "op");
            if op == 0b11 {
                return None; // reserved
            }
            let rd = field(fields, "rd") as usize;
            let rm = field(fields, "rm") as usize;
            let mnemonic: &'static str = match op {
                0 => "rev",
                1 => "rev16",
                _ => "revsh",
            };
            let operands = vec![Operand::Register(rd), Operand::Register(rm)];
            let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let value = thread.gpr(rm).to_bits();
                let result = match op {
                    0 => value.swap_bytes(),
                    1 => ((value & 0xff00_0000) >> 8) | ((value & 0x00ff_0000) << 8) | ((value & 0xff00) >> 8) | ((value & 0xff) << 8),
                    _ => {
                        let low = (value & 0xff00) >> 8 | (value & 0xff) << 8;
                        semantics::signed(16, low) as u32
                    }
                };
                thread.set_gpr(rd, Value::Int(result));
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

/// `cbz`/`cbnz`: branch forward if a low register is (not) zero, with no
/// ARM counterpart (Thumb-only compare-and-branch). The lone high immediate
/// bit and the low `imm5` run share the field name `imm`, so the bit-pattern
/// compiler concatenates them into one 6-bit value (`i:imm5`) automatically.
fn register_cbz(r: &mut Registrar) {
    r.thumb16(
        "1011 o 0 i 1 iiiii nnn",
        &[('o', "nonzero"), ('i', "imm"), ('n', "rn")],
        |fields, encoding, length, instruction_set, condition| {
            let nonzero = field(fields, "nonzero") != 0;
            let rn = field(fields, "rn") as usize;
            let offset = (field(fields, "imm") * 2) as i64;
            let mnemonic = if nonzero { "cbnz" } else { "cbz" };
            let operands = vec![Operand::Register(rn), Operand::PcRelative(offset)];
            let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let taken = if nonzero { thread.gpr(rn).to_bits() != 0 } else { thread.gpr(rn).to_bits() == 0 };
                if taken {
                    let target = branch_target(thread, offset, instr.length)?;
                    thread.goto(target)?;
                }
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

fn register_conditional_branch(r: &mut Registrar) {
    r.thumb16(
        "1101 cccc iiiiiiii",
        &[('c', "cond"), ('i', "imm8")],
        |fields, encoding, length, instruction_set, _condition| {
            let cond_bits = field(fields, "cond");
            if cond_bits >= 0b1110 {
                return None; // 1110 is the unconditional-branch opcode, 1111 is SVC
            }
            let offset = semantics::signed(8, field(fields, "imm8")) * 2;
            let condition = Condition::from_bits(cond_bits);
            let operands = vec![Operand::PcRelative(offset)];
            let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let target = branch_target(thread, offset, instr.length)?;
                thread.goto(target)?;
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, "b", operands, exec))
        },
    );
}

fn register_unconditional_branch(r: &mut Registrar) {
    r.thumb16(
        "11100 iiiiiiiiiii",
        &[('i', "imm11")],
        |fields, encoding, length, instruction_set, condition| {
            let offset = semantics::signed(11, field(fields, "imm11")) * 2;
            let operands = vec![Operand::PcRelative(offset)];
            let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let target = branch_target(thread, offset, instr.length)?;
                thread.goto(target)?;
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, "b", operands, exec))
        },
    );
}

/// The Thumb-2 `IT`/`ITE`/`ITT`/... directive: establishes up to four
/// following instructions' conditions from `firstcond`/`mask`. Disassembly
/// always shows the base mnemonic `it` rather than the `t`/`e` suffix a
/// real disassembler derives from `mask` against `firstcond`'s low bit —
/// a fidelity gap that doesn't affect execution, which only ever consults
/// the numeric `IT` state.
fn register_it(r: &mut Registrar) {
    r.thumb16(
        "10111111 cccc mmmm",
        &[('c', "firstcond"), ('m', "mask")],
        |fields, encoding, length, instruction_set, condition| {
            let firstcond = field(fields, "firstcond");
            let mask = field(fields, "mask");
            if mask == 0 {
                return None; // a hint instruction (nop/yield/...), not IT
            }
            let itstate = (firstcond << 4) | mask;
            let operands = vec![Operand::Constant(Value::Int(firstcond)), Operand::Constant(Value::Int(mask))];
            let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let mut cpsr = thread.cpsr();
                cpsr.set_it(itstate);
                thread.set_cpsr(cpsr);
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, "it", operands, exec).as_it_block_directive())
        },
    );
}

/// Wide `bl`/`blx` (immediate): the only Thumb-2 32-bit encoding this crate
/// implements, since a Thumb binary's call sites need it regardless of how
/// far the rest of Thumb-2's wide encoding space is carried. `encoding` here
/// is the byte-swapped 32-bit value [`crate::thread::Thread::fetch`]
/// assembles so the first halfword occupies the high 16 bits, the
/// convention the ARM ARM documents wide Thumb-2 encodings in.
fn register_bl_blx_wide(r: &mut Registrar) {
    r.thumb32(
        "11110 s iiiiiiiiii 11 j e k bbbbbbbbbbb",
        &[('s', "s"), ('i', "imm10"), ('j', "j1"), ('e', "exchange"), ('k', "j2"), ('b', "imm11")],
        |fields, encoding, length, instruction_set, condition| {
            let s = field(fields, "s");
            let j1 = field(fields, "j1");
            let j2 = field(fields, "j2");
            let exchange = field(fields, "exchange") != 0;
            let imm10 = field(fields, "imm10");
            let imm11 = field(fields, "imm11");
            let i1 = 1 - (j1 ^ s);
            let i2 = 1 - (j2 ^ s);
            let raw = (s << 23) | (i1 << 22) | (i2 << 21) | (imm10 << 11) | imm11;
            let offset = semantics::signed(24, raw) << 1;
            let mnemonic = if exchange { "bl" } else { "blx" };
            let operands = vec![Operand::PcRelative(offset)];
            let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let target = branch_target(thread, offset, instr.length)?;
                let lr = thread.pc_raw().checked_add(-4)?;
                thread.set_lr(lr);
                if exchange {
                    thread.goto(target)?;
                } else {
                    let aligned = Value::Int(target.to_bits() & !0b11);
                    let mut cpsr = thread.cpsr();
                    cpsr.set_thumb(false);
                    thread.set_cpsr(cpsr);
                    thread.goto(aligned)?;
                }
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}
