//! ARM (32-bit, conditional) decoder rules: the data-processing family (all
//! three operand-2 encodings), branches, single data transfer, halfword/
//! signed transfers, and block data transfer.

use std::collections::HashMap;

use crate::arith;
use crate::condition::Condition;
use crate::consts::REG_PC;
use crate::instruction::Instruction;
use crate::operand::Operand;
use crate::semantics::{self, SRTYPE_LSL, SRTYPE_ROR};
use crate::thread::Thread;
use crate::value::Value;
use crate::error::EmulatorError;

use super::Registrar;

pub(super) fn register(r: &mut Registrar) {
    register_data_processing(r);
    register_branch(r);
    register_single_transfer(r);
    register_halfword_transfer(r);
    register_block_transfer(r);
}

fn field(fields: &HashMap<String, u32>, name: &str) -> u32 {
    fields[name]
}

/// Read a general-purpose register the way ARM data-processing instructions
/// see it: `r15` reads as the architectural `pc` (current instruction's
/// address plus 8), not the raw, already-advanced
/// [`Thread::pc_raw`]/[`Thread::gpr`] value `exec` runs with. ARM
/// instructions are always 4 bytes, so the fixed adjustment below is
/// `pc_raw() - 4`.
fn architectural_gpr(thread: &Thread, reg: usize) -> Value {
    let raw = thread.gpr(reg);
    if reg == REG_PC {
        if let Value::Int(v) = raw {
            return Value::Int(v.wrapping_sub(4));
        }
    }
    raw
}

/// `(mnemonic, writes_rd, reads_rn)` for a data-processing opcode field.
fn opcode_info(op: u32) -> Option<(&'static str, bool, bool)> {
    Some(match op {
        0 => ("and", true, true),
        1 => ("eor", true, true),
        2 => ("sub", true, true),
        3 => ("rsb", true, true),
        4 => ("add", true, true),
        5 => ("adc", true, true),
        6 => ("sbc", true, true),
        7 => ("rsc", true, true),
        8 => ("tst", false, true),
        9 => ("teq", false, true),
        10 => ("cmp", false, true),
        11 => ("cmn", false, true),
        12 => ("orr", true, true),
        13 => ("mov", true, false),
        14 => ("bic", true, true),
        15 => ("mvn", true, false),
        _ => return None,
    })
}

fn data_processing_result(op: u32, rn_val: u32, op2_val: u32, shift_carry: bool, carry_in: bool, v_in: bool) -> (u32, bool, bool) {
    match op {
        0 => (rn_val & op2_val, shift_carry, v_in),
        1 => (rn_val ^ op2_val, shift_carry, v_in),
        2 => semantics::add_with_carry(32, rn_val, !op2_val, true),
        3 => semantics::add_with_carry(32, !rn_val, op2_val, true),
        4 => semantics::add_with_carry(32, rn_val, op2_val, false),
        5 => semantics::add_with_carry(32, rn_val, op2_val, carry_in),
        6 => semantics::add_with_carry(32, rn_val, !op2_val, carry_in),
        7 => semantics::add_with_carry(32, !rn_val, op2_val, carry_in),
        8 => (rn_val & op2_val, shift_carry, v_in),
        9 => (rn_val ^ op2_val, shift_carry, v_in),
        10 => semantics::add_with_carry(32, rn_val, !op2_val, true),
        11 => semantics::add_with_carry(32, rn_val, op2_val, false),
        12 => (rn_val | op2_val, shift_carry, v_in),
        13 => (op2_val, shift_carry, v_in),
        14 => (rn_val & !op2_val, shift_carry, v_in),
        15 => (!op2_val, shift_carry, v_in),
        _ => unreachable!("data-processing opcode is always 4 bits"),
    }
}

fn write_result(thread: &mut Thread, rd: usize, result: Value) {
    if rd == REG_PC {
        let (fixed, switch_thumb) = semantics::fix_pc_addr_alu(result.to_bits(), thread.cpsr().thumb());
        thread.set_gpr(rd, Value::Int(fixed));
        if switch_thumb != thread.cpsr().thumb() {
            let mut cpsr = thread.cpsr();
            cpsr.set_thumb(switch_thumb);
            thread.set_cpsr(cpsr);
        }
    } else {
        thread.set_gpr(rd, result);
    }
}

fn set_flags(thread: &mut Thread, result: u32, carry_out: bool, overflow: bool) {
    let mut cpsr = thread.cpsr();
    cpsr.set_n(result & 0x8000_0000 != 0);
    cpsr.set_z(result == 0);
    cpsr.set_c(carry_out);
    cpsr.set_v(overflow);
    thread.set_cpsr(cpsr);
}

/// A tagged result carries no meaningful bit pattern to derive flags
/// from; a flag-setting tagged op reports everything cleared, matching
/// the CPU having nothing concrete to report.
fn clear_flags(thread: &mut Thread) {
    let mut cpsr = thread.cpsr();
    cpsr.set_n(false);
    cpsr.set_z(false);
    cpsr.set_c(false);
    cpsr.set_v(false);
    thread.set_cpsr(cpsr);
}

/// Build a data-processing instruction whose operand-2 is a fixed
/// `Operand` shaped so that `instr.apply_shift_c` already does the right
/// thing (an already-assembled `Operand::Constant`/`Operand::Register`
/// plus the instruction's own trailing shift).
fn build_fixed_shift(
    op: u32,
    s: bool,
    rd: usize,
    rn: usize,
    op2: Operand,
    shift_type: u8,
    shift_amount: u32,
    encoding: u32,
    length: u8,
    instruction_set: u8,
    condition: Condition,
) -> Option<Instruction> {
    let (mnemonic, writes_rd, reads_rn) = opcode_info(op)?;
    let operands = if !writes_rd {
        vec![Operand::Register(rn), op2.clone()]
    } else if !reads_rn {
        vec![Operand::Register(rd), op2.clone()]
    } else {
        vec![Operand::Register(rd), Operand::Register(rn), op2.clone()]
    };

    let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
        let carry_in = thread.cpsr().c();
        let op2_value = op2.get(thread, 4)?;
        let rn_value = if reads_rn { architectural_gpr(thread, rn) } else { Value::Int(0) };
        // An un-shifted operand pair may carry a pointer tag that the
        // plain bitwise path below would silently discard; try the
        // tag-aware combination first and only fall back once both
        // sides are confirmed to be plain integers.
        if instr.shift_amount == 0 {
            if let Some(result) = arith::combine(op, rn_value, op2_value) {
                let value = result?;
                if writes_rd {
                    write_result(thread, rd, value);
                }
                if instr.sets_flags {
                    clear_flags(thread);
                }
                return Ok(());
            }
        }
        let raw = op2_value.to_bits();
        let (op2_val, shift_carry) = instr.apply_shift_c(raw, carry_in);
        let rn_val = rn_value.to_bits();
        let (result, carry_out, overflow) = data_processing_result(op, rn_val, op2_val, shift_carry, carry_in, thread.cpsr().v());
        if writes_rd {
            write_result(thread, rd, Value::Int(result));
        }
        if instr.sets_flags {
            set_flags(thread, result, carry_out, overflow);
        }
        Ok(())
    };

    Some(
        Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec)
            .set_flags(s)
            .with_shift(shift_type, shift_amount),
    )
}

fn register_data_processing(r: &mut Registrar) {
    // Immediate operand-2: `rotate` doubled is exactly the `Shift_C`
    // amount applied to `imm8` under `ROR`, matching `ARMExpandImm_C`'s own
    // rotate-by-zero passthrough.
    r.arm(
        "____ 00 1 oooo s nnnn dddd rrrr iiiiiiii",
        &[('o', "op"), ('s', "s"), ('n', "rn"), ('d', "rd"), ('r', "rot"), ('i', "imm8")],
        |fields, encoding, length, instruction_set, condition| {
            let op = field(fields, "op");
            let rd = field(fields, "rd") as usize;
            let rn = field(fields, "rn") as usize;
            let s = field(fields, "s") != 0;
            let imm8 = field(fields, "imm8");
            let rot = field(fields, "rot");
            build_fixed_shift(op, s, rd, rn, Operand::Constant(Value::Int(imm8)), SRTYPE_ROR, rot * 2, encoding, length, instruction_set, condition)
        },
    );

    // Register operand-2, shifted by an immediate.
    r.arm(
        "____ 00 0 oooo s nnnn dddd iiiii tt 0 mmmm",
        &[('o', "op"), ('s', "s"), ('n', "rn"), ('d', "rd"), ('i', "shiftimm"), ('t', "shifttype"), ('m', "rm")],
        |fields, encoding, length, instruction_set, condition| {
            let op = field(fields, "op");
            let rd = field(fields, "rd") as usize;
            let rn = field(fields, "rn") as usize;
            let s = field(fields, "s") != 0;
            let rm = field(fields, "rm") as usize;
            let (shift_type, shift_amount) = semantics::decode_imm_shift(field(fields, "shifttype") as u8, field(fields, "shiftimm"));
            build_fixed_shift(op, s, rd, rn, Operand::Register(rm), shift_type, shift_amount, encoding, length, instruction_set, condition)
        },
    );

    // Register operand-2, shifted by a register: the shift amount is only
    // known at execute time (the low byte of `Rs`), so this bypasses
    // `Instruction`'s fixed trailing-shift fields entirely and computes
    // the shift inline.
    r.arm(
        "____ 00 0 oooo x nnnn dddd rrrr 0 tt 1 mmmm",
        &[('o', "op"), ('x', "s"), ('n', "rn"), ('d', "rd"), ('r', "rs"), ('t', "shifttype"), ('m', "rm")],
        |fields, encoding, length, instruction_set, condition| {
            let op = field(fields, "op");
            let (mnemonic, writes_rd, reads_rn) = opcode_info(op)?;
            let rd = field(fields, "rd") as usize;
            let rn = field(fields, "rn") as usize;
            let s = field(fields, "s") != 0;
            let rm = field(fields, "rm") as usize;
            let rs = field(fields, "rs") as usize;
            let shift_type = field(fields, "shifttype") as u8;

            let operands = if !writes_rd {
                vec![Operand::Register(rn), Operand::Register(rm)]
            } else if !reads_rn {
                vec![Operand::Register(rd), Operand::Register(rm)]
            } else {
                vec![Operand::Register(rd), Operand::Register(rn), Operand::Register(rm)]
            };

            let exec = move |instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let carry_in = thread.cpsr().c();
                let shift_amount = thread.gpr(rs).to_bits() & 0xff;
                let rm_value = architectural_gpr(thread, rm);
                let rn_value = if reads_rn { architectural_gpr(thread, rn) } else { Value::Int(0) };
                if shift_amount == 0 {
                    if let Some(result) = arith::combine(op, rn_value, rm_value) {
                        let value = result?;
                        if writes_rd {
                            write_result(thread, rd, value);
                        }
                        if instr.sets_flags {
                            clear_flags(thread);
                        }
                        return Ok(());
                    }
                }
                let rm_val = rm_value.to_bits();
                let (op2_val, shift_carry) = semantics::shift_c(32, rm_val, shift_type, shift_amount, carry_in);
                let rn_val = rn_value.to_bits();
                let (result, carry_out, overflow) = data_processing_result(op, rn_val, op2_val, shift_carry, carry_in, thread.cpsr().v());
                if writes_rd {
                    write_result(thread, rd, Value::Int(result));
                }
                if instr.sets_flags {
                    set_flags(thread, result, carry_out, overflow);
                }
                Ok(())
            };

            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec).set_flags(s))
        },
    );
}

fn register_branch(r: &mut Registrar) {
    // B / BL: 24-bit signed word offset relative to `pc` (`location + 8`
    // architecturally; `exec` sees `pc_raw() == location + 12`, since
    // `execute()` has already advanced it once by the instruction's own
    // length before running the body, so the offset add subtracts 4 rather
    // than 8 to land back on `location + 8 + offset`).
    r.arm(
        "____ 101 l iiiiiiiiiiiiiiiiiiiiiiii",
        &[('l', "link"), ('i', "imm24")],
        |fields, encoding, length, instruction_set, condition| {
            let link = field(fields, "link") != 0;
            let imm24 = field(fields, "imm24");
            let offset = semantics::signed(24, imm24) * 4;
            let mnemonic = if link { "bl" } else { "b" };
            let operands = vec![Operand::PcRelative(offset)];
            let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let target = thread.pc_raw().checked_add(offset - 4)?;
                if link {
                    let lr = thread.pc_raw().checked_add(-8)?;
                    thread.set_lr(lr);
                }
                thread.goto(target)?;
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );

    // BX / BLX (register form): branch and exchange instruction sets.
    r.arm(
        "____ 0001 0010 1111 1111 1111 00l1 mmmm",
        &[('l', "link"), ('m', "rm")],
        |fields, encoding, length, instruction_set, condition| {
            let link = field(fields, "link") != 0;
            let rm = field(fields, "rm") as usize;
            let mnemonic = if link { "blx" } else { "bx" };
            let operands = vec![Operand::Register(rm)];
            let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                // A tagged non-integer target (the `Return` sentinel, a stack
                // or heap pointer) carries no instruction-set-switch bit of
                // its own; only a concrete address's low bit selects Thumb.
                let target = thread.gpr(rm);
                let (goto_value, thumb_mode) = match target {
                    Value::Int(v) => {
                        let (fixed, thumb_mode) = semantics::fix_pc_addr_bx(v);
                        (Value::Int(fixed), thumb_mode)
                    }
                    other => (other, thread.cpsr().thumb()),
                };
                if link {
                    let lr = thread.pc_raw().checked_add(-8)?;
                    thread.set_lr(lr);
                }
                let mut cpsr = thread.cpsr();
                cpsr.set_thumb(thumb_mode);
                thread.set_cpsr(cpsr);
                thread.goto(goto_value)?;
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

fn indirect_operand(
    rn: usize,
    offset: Operand,
    positive: bool,
    index: bool,
    write_back: bool,
) -> Operand {
    Operand::Indirect {
        base: rn,
        offset: Box::new(offset),
        positive,
        index,
        write_back,
        shift_type: 0,
        shift_amount: 0,
    }
}

/// Read `length` bytes through an [`Operand::Indirect`], bypassing
/// [`Operand::get`]'s fixed 4-byte width (which would over-read a byte/
/// halfword transfer). ARM instructions are always 4 bytes, so a `pc`-based
/// addressing mode always subtracts that fixed amount to recover the
/// architectural `pc`.
fn load_sized(thread: &Thread, addressing: &Operand, length: u32) -> Result<u32, EmulatorError> {
    let address = addressing.effective_address(thread, 4)?;
    Ok(thread.memory().load(address, length)?.to_bits())
}

/// Write `length` bytes through an [`Operand::Indirect`], bypassing
/// [`Operand::set`]'s fixed 4-byte width (which would clobber the bytes past
/// a byte/halfword store).
fn store_sized(thread: &mut Thread, addressing: &Operand, value: u32, length: u32) -> Result<(), EmulatorError> {
    let address = addressing.effective_address(thread, 4)?;
    thread.memory_mut().store(address, Value::Int(value), length)?;
    Ok(())
}

/// Apply an [`Operand::Indirect`]'s base-register write-back, if any.
/// [`Operand::get`]/[`Operand::set`] never do this themselves; every
/// load/store rule using a write-back-capable addressing mode must call
/// this once after the access.
fn writeback(thread: &mut Thread, addressing: &Operand) -> Result<(), EmulatorError> {
    if let Operand::Indirect { base, write_back: true, .. } = addressing {
        let target = addressing.writeback_address(thread, 4)?;
        thread.set_gpr(*base, target);
    }
    Ok(())
}

/// `(mnemonic, byte_access, load)` for a single-data-transfer rule.
fn single_transfer_exec(
    byte_access: bool,
    load: bool,
    rd: usize,
    addressing: Operand,
) -> impl Fn(&Instruction, &mut Thread) -> Result<(), EmulatorError> {
    move |_instr, thread| {
        let length = if byte_access { 1 } else { 4 };
        if load {
            let raw = load_sized(thread, &addressing, length)?;
            writeback(thread, &addressing)?;
            let value = Value::Int(raw);
            if rd == REG_PC {
                let (fixed, thumb_mode) = semantics::fix_pc_addr_load(value.to_bits());
                let mut cpsr = thread.cpsr();
                cpsr.set_thumb(thumb_mode);
                thread.set_cpsr(cpsr);
                thread.goto(Value::Int(fixed))?;
            } else {
                thread.set_gpr(rd, value);
            }
        } else {
            let value = thread.gpr(rd).to_bits();
            store_sized(thread, &addressing, value, length)?;
            writeback(thread, &addressing)?;
        }
        Ok(())
    }
}

fn register_single_transfer(r: &mut Registrar) {
    // Immediate offset, word or byte.
    r.arm(
        "____ 01 i p u b w l nnnn dddd oooooooooooo",
        &[('i', "imm"), ('p', "pre"), ('u', "up"), ('b', "byte"), ('w', "wb"), ('l', "load"), ('n', "rn"), ('d', "rd"), ('o', "imm12")],
        |fields, encoding, length, instruction_set, condition| {
            if field(fields, "imm") != 0 {
                return None; // the register-offset form is a separate rule below
            }
            let pre = field(fields, "pre") != 0;
            let up = field(fields, "up") != 0;
            let byte = field(fields, "byte") != 0;
            let wb = field(fields, "wb") != 0;
            let load = field(fields, "load") != 0;
            let rn = field(fields, "rn") as usize;
            let rd = field(fields, "rd") as usize;
            let imm12 = field(fields, "imm12");
            let addressing = indirect_operand(rn, Operand::Constant(Value::Int(imm12)), up, pre, wb || !pre);
            let mnemonic: &'static str = match (load, byte) {
                (true, true) => "ldrb",
                (true, false) => "ldr",
                (false, true) => "strb",
                (false, false) => "str",
            };
            let operands = vec![Operand::Register(rd), addressing.clone()];
            let exec = single_transfer_exec(byte, load, rd, addressing);
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );

    // Register offset (optionally shifted), word or byte.
    r.arm(
        "____ 01 x p u b w l nnnn dddd iiiii tt 0 mmmm",
        &[
            ('x', "imm"),
            ('p', "pre"),
            ('u', "up"),
            ('b', "byte"),
            ('w', "wb"),
            ('l', "load"),
            ('n', "rn"),
            ('d', "rd"),
            ('i', "shiftimm"),
            ('t', "shifttype"),
            ('m', "rm"),
        ],
        |fields, encoding, length, instruction_set, condition| {
            if field(fields, "imm") == 0 {
                return None; // the immediate-offset form above already matched
            }
            let pre = field(fields, "pre") != 0;
            let up = field(fields, "up") != 0;
            let byte = field(fields, "byte") != 0;
            let wb = field(fields, "wb") != 0;
            let load = field(fields, "load") != 0;
            let rn = field(fields, "rn") as usize;
            let rd = field(fields, "rd") as usize;
            let rm = field(fields, "rm") as usize;
            let (shift_type, shift_amount) = semantics::decode_imm_shift(field(fields, "shifttype") as u8, field(fields, "shiftimm"));
            let addressing = Operand::Indirect {
                base: rn,
                offset: Box::new(Operand::Register(rm)),
                positive: up,
                index: pre,
                write_back: wb || !pre,
                shift_type,
                shift_amount,
            };
            let mnemonic: &'static str = match (load, byte) {
                (true, true) => "ldrb",
                (true, false) => "ldr",
                (false, true) => "strb",
                (false, false) => "str",
            };
            let operands = vec![Operand::Register(rd), addressing.clone()];
            let exec = single_transfer_exec(byte, load, rd, addressing);
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

fn register_halfword_transfer(r: &mut Registrar) {
    // Immediate offset: halfword/signed-byte/signed-halfword transfers,
    // the `1 s h 1` bits selecting among {strh, ldrh, ldrsb, ldrsh}.
    r.arm(
        "____ 000 p u 1 w l nnnn dddd iiii 1 s h 1 oooo",
        &[('p', "pre"), ('u', "up"), ('w', "wb"), ('l', "load"), ('n', "rn"), ('d', "rd"), ('i', "immhi"), ('s', "signed"), ('h', "half"), ('o', "immlo")],
        |fields, encoding, length, instruction_set, condition| {
            let pre = field(fields, "pre") != 0;
            let up = field(fields, "up") != 0;
            let wb = field(fields, "wb") != 0;
            let load = field(fields, "load") != 0;
            let signed = field(fields, "signed") != 0;
            let half = field(fields, "half") != 0;
            if !signed && !half {
                return None; // `1 0 0 1` is a multiply/swap encoding, not a transfer
            }
            let rn = field(fields, "rn") as usize;
            let rd = field(fields, "rd") as usize;
            let imm = (field(fields, "immhi") << 4) | field(fields, "immlo");
            let addressing = indirect_operand(rn, Operand::Constant(Value::Int(imm)), up, pre, wb || !pre);
            let mnemonic: &'static str = match (load, signed, half) {
                (false, _, true) => "strh",
                (false, true, false) => "strh", // no plain signed-byte store; falls back to strh encoding space
                (true, false, true) => "ldrh",
                (true, true, false) => "ldrsb",
                (true, true, true) => "ldrsh",
                _ => return None,
            };
            let byte_length = if half { 2 } else { 1 };
            let operands = vec![Operand::Register(rd), addressing.clone()];
            let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                if load {
                    let raw = load_sized(thread, &addressing, byte_length)?;
                    writeback(thread, &addressing)?;
                    let value = if signed { semantics::signed(byte_length * 8, raw) as u32 } else { raw };
                    thread.set_gpr(rd, Value::Int(value));
                } else {
                    let raw = thread.gpr(rd).to_bits() & 0xffff;
                    store_sized(thread, &addressing, raw, 2)?;
                    writeback(thread, &addressing)?;
                }
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}

fn register_block_transfer(r: &mut Registrar) {
    // LDM / STM, all four addressing modes (IA/IB/DA/DB); `push`/`pop` are
    // plain aliases of STMDB/LDMIA with `rn == sp` and are not separate
    // encodings.
    r.arm(
        "____ 100 p u s w l nnnn rrrrrrrrrrrrrrrr",
        &[('p', "pre"), ('u', "up"), ('s', "usermode"), ('w', "wb"), ('l', "load"), ('n', "rn"), ('r', "list")],
        |fields, encoding, length, instruction_set, condition| {
            let pre = field(fields, "pre") != 0;
            let up = field(fields, "up") != 0;
            let wb = field(fields, "wb") != 0;
            let load = field(fields, "load") != 0;
            let rn = field(fields, "rn") as usize;
            let list = field(fields, "list") as u16;
            let mnemonic = if load { "ldm" } else { "stm" };
            let operands = vec![Operand::Register(rn), Operand::RegisterList(list)];
            let exec = move |_instr: &Instruction, thread: &mut Thread| -> Result<(), EmulatorError> {
                let count = list.count_ones() as i64;
                let base = thread.gpr(rn);
                let start = if up {
                    if pre { base.checked_add(4)? } else { base }
                } else if pre {
                    base.checked_add(-count * 4)?
                } else {
                    base.checked_add(-count * 4 + 4)?
                };
                let mut address = start;
                let registers: Vec<usize> = (0..16).filter(|b| list & (1 << b) != 0).collect();
                for reg in &registers {
                    if load {
                        let value = thread.memory().load(address, 4)?;
                        if *reg == REG_PC {
                            let (fixed, thumb_mode) = semantics::fix_pc_addr_load(value.to_bits());
                            let mut cpsr = thread.cpsr();
                            cpsr.set_thumb(thumb_mode);
                            thread.set_cpsr(cpsr);
                            thread.goto(Value::Int(fixed))?;
                        } else {
                            thread.set_gpr(*reg, value);
                        }
                    } else {
                        let value = thread.gpr(*reg);
                        thread.memory_mut().store(address, value, 4)?;
                    }
                    address = address.checked_add(4)?;
                }
                if wb {
                    let new_base = if up { base.checked_add(count * 4)? } else { base.checked_add(-count * 4)? };
                    thread.set_gpr(rn, new_base);
                }
                Ok(())
            };
            Some(Instruction::new(encoding, length, instruction_set, condition, mnemonic, operands, exec))
        },
    );
}
