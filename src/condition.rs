//! Instruction condition codes. Every ARM instruction, and a Thumb-2
//! instruction inside an `IT` block, carries a 4-bit condition that gates
//! whether it executes at all.

use strum::{EnumIter, IntoStaticStr};

/// The four condition flags an instruction's condition is tested against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Negative.
    pub n: bool,
    /// Zero.
    pub z: bool,
    /// Carry (or "no borrow" for subtraction).
    pub c: bool,
    /// Signed overflow.
    pub v: bool,
}

/// A 4-bit instruction condition code.
///
/// The upstream table this is grounded on mislabeled `LT` as a second `GT`
/// (both the mnemonic list and the constant list repeated `GT` where `LT`
/// belonged) even though its own behavioral lambda for that code already
/// implemented `N != V` (signed less-than) correctly; the mnemonics below
/// use the correct `Lt`/`Gt` names the ARM ARM table documents, the
/// behavior is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[repr(u8)]
pub enum Condition {
    /// `Z == 1`.
    #[strum(serialize = "eq")]
    Eq = 0,
    /// `Z == 0`.
    #[strum(serialize = "ne")]
    Ne = 1,
    /// `C == 1`.
    #[strum(serialize = "cs")]
    Cs = 2,
    /// `C == 0`.
    #[strum(serialize = "cc")]
    Cc = 3,
    /// `N == 1`.
    #[strum(serialize = "mi")]
    Mi = 4,
    /// `N == 0`.
    #[strum(serialize = "pl")]
    Pl = 5,
    /// `V == 1`.
    #[strum(serialize = "vs")]
    Vs = 6,
    /// `V == 0`.
    #[strum(serialize = "vc")]
    Vc = 7,
    /// `C && !Z`.
    #[strum(serialize = "hi")]
    Hi = 8,
    /// `!C || Z`.
    #[strum(serialize = "ls")]
    Ls = 9,
    /// `N == V`.
    #[strum(serialize = "ge")]
    Ge = 10,
    /// `N != V`.
    #[strum(serialize = "lt")]
    Lt = 11,
    /// `!Z && N == V`.
    #[strum(serialize = "gt")]
    Gt = 12,
    /// `Z || N != V`.
    #[strum(serialize = "le")]
    Le = 13,
    /// Always.
    #[strum(serialize = "")]
    Al = 14,
    /// Never (not a real ARM encoding; reserved).
    #[strum(serialize = "xx")]
    Nv = 15,
}

impl Condition {
    /// Build a condition from its raw 4-bit encoding.
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0xf {
            0 => Condition::Eq,
            1 => Condition::Ne,
            2 => Condition::Cs,
            3 => Condition::Cc,
            4 => Condition::Mi,
            5 => Condition::Pl,
            6 => Condition::Vs,
            7 => Condition::Vc,
            8 => Condition::Hi,
            9 => Condition::Ls,
            10 => Condition::Ge,
            11 => Condition::Lt,
            12 => Condition::Gt,
            13 => Condition::Le,
            14 => Condition::Al,
            _ => Condition::Nv,
        }
    }

    /// The raw 4-bit encoding.
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// The negation of this condition (flipping the low bit), except for
    /// `al`/`nv` which have no defined inverse in the ARM ARM.
    pub fn inverse(self) -> Condition {
        Condition::from_bits(self.bits() ^ 1)
    }

    /// Evaluate this condition against a set of flags.
    pub fn check(self, flags: Flags) -> bool {
        match self {
            Condition::Eq => flags.z,
            Condition::Ne => !flags.z,
            Condition::Cs => flags.c,
            Condition::Cc => !flags.c,
            Condition::Mi => flags.n,
            Condition::Pl => !flags.n,
            Condition::Vs => flags.v,
            Condition::Vc => !flags.v,
            Condition::Hi => flags.c && !flags.z,
            Condition::Ls => !flags.c || flags.z,
            Condition::Ge => flags.n == flags.v,
            Condition::Lt => flags.n != flags.v,
            Condition::Gt => !flags.z && flags.n == flags.v,
            Condition::Le => flags.z || flags.n != flags.v,
            Condition::Al => true,
            Condition::Nv => false,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mnemonic: &'static str = (*self).into();
        f.write_str(mnemonic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(n: bool, z: bool, c: bool, v: bool) -> Flags {
        Flags { n, z, c, v }
    }

    #[test]
    fn eq_and_ne_are_opposites() {
        let f = flags(false, true, false, false);
        assert!(Condition::Eq.check(f));
        assert!(!Condition::Ne.check(f));
    }

    #[test]
    fn signed_comparisons_use_n_xor_v() {
        let overflowed_negative = flags(true, false, false, true);
        assert!(Condition::Gt.check(overflowed_negative));
        assert!(!Condition::Lt.check(overflowed_negative));
    }

    #[test]
    fn al_is_always_true_and_nv_always_false() {
        let f = flags(false, false, false, false);
        assert!(Condition::Al.check(f));
        assert!(!Condition::Nv.check(f));
    }

    #[test]
    fn inverse_flips_the_low_bit() {
        assert_eq!(Condition::Eq.inverse(), Condition::Ne);
        assert_eq!(Condition::Ge.inverse(), Condition::Lt);
    }

    #[test]
    fn from_bits_round_trips_through_display() {
        assert_eq!(Condition::from_bits(12).to_string(), "gt");
        assert_eq!(Condition::from_bits(14).to_string(), "");
    }
}
