//! Pure ARM ARM primitive functions: shifts with carry-out, the two
//! "expand immediate" encodings, `AddWithCarry`, `ITAdvance`, and the four
//! `pc`-fixup variants used when a write lands on the program counter.
//!
//! Every shift/rotate here is parameterized by `bits` (the field width `N`)
//! rather than a precomputed `(1<<N)-1` mask, so callers can't pass a mask
//! that disagrees with the width used for sign extension. Internally these
//! widen to `u64`/`u128`/`i64` so a shift amount at the edge of the field
//! (e.g. a 32-bit rotate by 0) never hits a shift-overflow panic.

/// Logical shift left.
pub const SRTYPE_LSL: u8 = 0;
/// Logical shift right.
pub const SRTYPE_LSR: u8 = 1;
/// Arithmetic shift right.
pub const SRTYPE_ASR: u8 = 2;
/// Rotate right.
pub const SRTYPE_ROR: u8 = 3;
/// Rotate right with extend (through the carry flag).
pub const SRTYPE_RRX: u8 = 4;

const fn mask_for(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

fn arith_shr_i64(x: i64, shift: u32) -> i64 {
    if shift >= 64 {
        if x < 0 {
            -1
        } else {
            0
        }
    } else {
        x >> shift
    }
}

/// Sign-extend the low `bits` bits of `x` to a full-width signed integer.
pub fn signed(bits: u32, x: u32) -> i64 {
    debug_assert!((1..=32).contains(&bits));
    let x = (x as u64) & (mask_for(bits) as u64);
    let sign_bit = 1u64 << (bits - 1);
    if x & sign_bit != 0 {
        x as i64 - (1i64 << bits)
    } else {
        x as i64
    }
}

/// `BXWritePC`: fix a branch-and-exchange target, switching to Thumb mode
/// when bit 0 is set.
pub fn fix_pc_addr_bx(pc_addr: u32) -> (u32, bool) {
    if pc_addr & 1 != 0 {
        (pc_addr - 1, true)
    } else {
        (pc_addr & !3, false)
    }
}

/// `BranchWritePC`: fix a direct branch target; the instruction set does
/// not change.
pub fn fix_pc_addr_b(pc_addr: u32, thumb_mode: bool) -> u32 {
    let notmask = if thumb_mode { !1u32 } else { !3u32 };
    pc_addr & notmask
}

/// `LoadWritePC`: fix a `pc` written by a load, which behaves like `bx`.
pub fn fix_pc_addr_load(pc_addr: u32) -> (u32, bool) {
    fix_pc_addr_bx(pc_addr)
}

/// `ALUWritePC`: fix a `pc` written by a data-processing instruction. In
/// Thumb mode this never switches to ARM; in ARM mode it behaves like `bx`.
pub fn fix_pc_addr_alu(pc_addr: u32, thumb_mode: bool) -> (u32, bool) {
    if thumb_mode {
        (pc_addr & !1, true)
    } else {
        fix_pc_addr_bx(pc_addr)
    }
}

/// `LSL_C`.
pub fn lsl_c(bits: u32, x: u32, shift: u32) -> (u32, bool) {
    let mask = mask_for(bits) as u64;
    let shifted = (x as u64).checked_shl(shift).unwrap_or(0);
    ((shifted & mask) as u32, (shifted & (mask + 1)) != 0)
}

/// `LSL`.
pub fn lsl(bits: u32, x: u32, shift: u32) -> u32 {
    let mask = mask_for(bits) as u64;
    ((x as u64).checked_shl(shift).unwrap_or(0) & mask) as u32
}

/// `LSR_C`. `shift` must be at least 1.
pub fn lsr_c(bits: u32, x: u32, shift: u32) -> (u32, bool) {
    debug_assert!(shift >= 1);
    let mask = mask_for(bits) as u64;
    let x = (x as u64).checked_shr(shift - 1).unwrap_or(0);
    (((x >> 1) & mask) as u32, (x & 1) != 0)
}

/// `LSR`.
pub fn lsr(bits: u32, x: u32, shift: u32) -> u32 {
    let mask = mask_for(bits) as u64;
    ((x as u64).checked_shr(shift).unwrap_or(0) & mask) as u32
}

/// `ASR_C`. `shift` must be at least 1.
pub fn asr_c(bits: u32, x: u32, shift: u32) -> (u32, bool) {
    debug_assert!(shift >= 1);
    let shifted = arith_shr_i64(signed(bits, x), shift - 1);
    let carry = shifted & 1 != 0;
    let result = arith_shr_i64(shifted, 1) & mask_for(bits) as i64;
    (result as u32, carry)
}

/// `ASR`.
pub fn asr(bits: u32, x: u32, shift: u32) -> u32 {
    (arith_shr_i64(signed(bits, x), shift) & mask_for(bits) as i64) as u32
}

/// `ROR_C`. `shift` must be between 0 and `bits`.
pub fn ror_c(bits: u32, x: u32, shift: u32) -> (u32, bool) {
    let mask = mask_for(bits) as u128;
    let doubled = (x as u128) * (2 + mask);
    let res = doubled >> shift;
    ((res & mask) as u32, ((res & (mask + 1)) >> 1) != 0)
}

/// `ROR`. `shift` must be between 0 and `bits`.
pub fn ror(bits: u32, x: u32, shift: u32) -> u32 {
    let mask = mask_for(bits) as u128;
    (((x as u128) * (2 + mask) >> shift) & mask) as u32
}

/// `RRX_C`.
pub fn rrx_c(bits: u32, x: u32, carry: bool) -> (u32, bool) {
    let mask = mask_for(bits) as u64;
    let x = x as u64 + if carry { mask + 1 } else { 0 };
    ((x >> 1) as u32, (x & 1) != 0)
}

/// `RRX`.
pub fn rrx(bits: u32, x: u32, carry: bool) -> u32 {
    let mask = mask_for(bits) as u64;
    ((x as u64 + if carry { mask + 1 } else { 0 }) >> 1) as u32
}

/// `DecodeImmShift`: turns a raw 2-bit shift type plus a 5-bit immediate
/// into the effective shift type/amount pair (an immediate 0 means
/// "shift by 32" for everything but `lsl`, and ror-by-0 means `rrx`).
pub fn decode_imm_shift(mut shift_type: u8, mut imm: u32) -> (u8, u32) {
    if shift_type != SRTYPE_LSL && imm == 0 {
        if shift_type == SRTYPE_ROR {
            shift_type = SRTYPE_RRX;
            imm = 1;
        } else {
            imm = 32;
        }
    }
    (shift_type, imm)
}

/// `Shift_C`: apply a shift/rotate, returning the carry flag it produces. A
/// shift amount of 0 is a no-op that passes the incoming carry through.
pub fn shift_c(bits: u32, value: u32, shift_type: u8, shift_amount: u32, carry: bool) -> (u32, bool) {
    if shift_amount == 0 {
        return (value, carry);
    }
    match shift_type {
        SRTYPE_RRX => rrx_c(bits, value, carry),
        SRTYPE_LSL => lsl_c(bits, value, shift_amount),
        SRTYPE_LSR => lsr_c(bits, value, shift_amount),
        SRTYPE_ASR => asr_c(bits, value, shift_amount),
        SRTYPE_ROR => ror_c(bits, value, shift_amount),
        other => unreachable!("invalid shift type {other}"),
    }
}

/// `Shift`: apply a shift/rotate without reporting carry-out.
pub fn shift(bits: u32, value: u32, shift_type: u8, shift_amount: u32, carry: bool) -> u32 {
    match shift_type {
        SRTYPE_RRX => rrx(bits, value, carry),
        SRTYPE_LSL => lsl(bits, value, shift_amount),
        SRTYPE_LSR => lsr(bits, value, shift_amount),
        SRTYPE_ASR => asr(bits, value, shift_amount),
        SRTYPE_ROR => ror(bits, value, shift_amount),
        other => unreachable!("invalid shift type {other}"),
    }
}

/// `ThumbExpandImm_C`: decode a Thumb-2 12-bit modified immediate.
pub fn thumb_expand_imm_c(imm: u32, carry: bool) -> (u32, bool) {
    let top2 = imm >> 10;
    if top2 == 0 {
        let middle2 = imm >> 8;
        let retval = if middle2 == 0 {
            imm
        } else {
            let bottom8 = imm & 0xff;
            let lopart = bottom8 | (bottom8 << 16);
            let mut retval = 0;
            if middle2 & 1 != 0 {
                retval = lopart;
            }
            if middle2 & 2 != 0 {
                retval |= lopart << 8;
            }
            retval
        };
        (retval, carry)
    } else {
        let lshift = 32 - (imm >> 7);
        let res = (0x80 + (imm & 0x7f)) << lshift;
        (res, lshift == 24)
    }
}

/// `ThumbExpandImm`.
pub fn thumb_expand_imm(imm: u32) -> u32 {
    thumb_expand_imm_c(imm, false).0
}

/// `ARMExpandImm_C`: decode an ARM 12-bit modified immediate (an 8-bit
/// value rotated right by an even amount).
pub fn arm_expand_imm_c(imm: u32, carry: bool) -> (u32, bool) {
    let amount = (imm >> 8) * 2;
    if amount == 0 {
        return (imm, carry);
    }
    let byte = imm & 0xff;
    let result = if amount < 8 {
        ((byte as u64 * 0x1_0000_0001) >> amount) as u32
    } else {
        byte << (32 - amount)
    };
    (result, result >> 31 != 0)
}

/// `ARMExpandImm`.
pub fn arm_expand_imm(imm: u32) -> u32 {
    ror(32, imm & 0xff, (imm >> 8) * 2)
}

/// `AddWithCarry`: the shared addition primitive behind `adc`/`adds`/`subs`/
/// comparisons, producing the result plus the carry and overflow flags.
pub fn add_with_carry(bits: u32, x: u32, y: u32, carry_in: bool) -> (u32, bool, bool) {
    let mask = mask_for(bits) as u64;
    let usum_full = x as u64 + y as u64 + carry_in as u64;
    let carry_out = (usum_full >> bits) & 1 != 0;
    let usum = (usum_full & mask) as u32;
    let ssum = signed(bits, x) + signed(bits, y) + carry_in as i64;
    let overflow = ssum != signed(bits, usum);
    (usum, carry_out, overflow)
}

/// `ITAdvance`: roll the Thumb-2 `IT` block state forward by one
/// instruction. Returns 0 once the block's mask bits are exhausted.
pub fn it_advance(itstate: u32) -> u32 {
    if itstate & 0b111 == 0 {
        0
    } else {
        (itstate & 0b1110_0000) + ((itstate & 0b1111) * 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_sign_extends_at_the_field_width() {
        assert_eq!(signed(8, 0xff), -1);
        assert_eq!(signed(8, 0x7f), 127);
        assert_eq!(signed(32, 0xffff_ffff), -1);
    }

    #[test]
    fn fix_pc_addr_bx_switches_to_thumb_on_bit_zero() {
        assert_eq!(fix_pc_addr_bx(0x1001), (0x1000, true));
        assert_eq!(fix_pc_addr_bx(0x1002), (0x1000, false));
    }

    #[test]
    fn ror_rotates_within_the_field_width() {
        assert_eq!(ror(8, 0b1000_0001, 1), 0b1100_0000);
        assert_eq!(ror(32, 0xff, 2), 0xC000_003F);
    }

    #[test]
    fn decode_imm_shift_turns_ror_zero_into_rrx() {
        assert_eq!(decode_imm_shift(SRTYPE_ROR, 0), (SRTYPE_RRX, 1));
        assert_eq!(decode_imm_shift(SRTYPE_LSR, 0), (SRTYPE_LSR, 32));
        assert_eq!(decode_imm_shift(SRTYPE_LSL, 0), (SRTYPE_LSL, 0));
    }

    #[test]
    fn arm_expand_imm_rotates_the_low_byte() {
        assert_eq!(arm_expand_imm(0x0ff), 0xff);
        assert_eq!(arm_expand_imm(0x1ff), 0xC000_003F);
    }

    #[test]
    fn thumb_expand_imm_replicates_the_low_byte() {
        assert_eq!(thumb_expand_imm(0x07f), 0x7f);
        assert_eq!(thumb_expand_imm(0x1ab), 0x00AB_00AB);
        let (res, carry) = thumb_expand_imm_c(0x800, false);
        assert_eq!(res, 0x0080_0000);
        assert!(!carry);
    }

    #[test]
    fn add_with_carry_reports_unsigned_overflow_without_signed_overflow() {
        let (sum, carry, overflow) = add_with_carry(32, 0xffff_ffff, 1, false);
        assert_eq!(sum, 0);
        assert!(carry);
        assert!(!overflow);
    }

    #[test]
    fn it_advance_clears_once_the_mask_is_exhausted() {
        assert_eq!(it_advance(0b1011_1000), 0);
        assert_eq!(it_advance(0b1011_1001), 0b1011_0010);
    }

    /// `Shift_C`'s value half always agrees with the carry-discarding
    /// `Shift`, for every width-32 shift type and amount.
    #[quickcheck_macros::quickcheck]
    fn shift_c_value_matches_shift(value: u32, shift_type_seed: u8, shift_amount: u8, carry: bool) -> bool {
        let shift_type = shift_type_seed % 5;
        let shift_amount = shift_amount as u32;
        shift_c(32, value, shift_type, shift_amount, carry).0 == shift(32, value, shift_type, shift_amount, carry)
    }

    /// Five `ITAdvance` steps always exhaust a mask of at most 4 bits (the
    /// widest an `IT` block supports); a sixth step changes nothing further.
    #[quickcheck_macros::quickcheck]
    fn it_advance_is_idempotent_after_five_steps(itstate: u8) -> bool {
        let mut state = itstate as u32;
        for _ in 0..5 {
            state = it_advance(state);
        }
        it_advance(state) == state
    }
}
