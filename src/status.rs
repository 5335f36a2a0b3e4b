//! CPSR/SPSR (`Status`) and FPSCR (`FloatingPointStatus`) bit-field
//! registers, built on top of [`crate::bitpattern`].

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::bitpattern::BitPattern;
use crate::condition::Flags;

/// Repack the `IT` state from its CPSR storage order (low 6 bits from
/// `CPSR[15:10]`, high 2 bits from `CPSR[26:25]`) into the order
/// [`crate::semantics::it_advance`] expects.
fn fix_it(t: u32) -> u32 {
    (t >> 6) + ((t & 0b111111) << 2)
}

/// Inverse of [`fix_it`], applied when packing `IT` back into CPSR storage
/// order.
fn unfix_it(t: u32) -> u32 {
    (t >> 2) + ((t & 0b11) << 6)
}

fn cpsr_pattern() -> &'static BitPattern {
    static PATTERN: OnceLock<BitPattern> = OnceLock::new();
    PATTERN.get_or_init(|| {
        BitPattern::compile(
            "NZCVQttJ ____gggg ttttttEA IFTMMMMM",
            &[('g', "GE"), ('t', "IT")],
            &[("IT", (fix_it as fn(u32) -> u32, unfix_it as fn(u32) -> u32))],
        )
        .expect("CPSR bit pattern is well-formed")
    })
}

/// A processor status register: CPSR when current, SPSR when banked away
/// on an exception the emulator does not model.
///
/// The emulator does not act on `A`/`I`/`F`/`M`: the program always runs in
/// the least restrictive mode, interrupts are never raised, and aborts are
/// left to the host to report as [`crate::error::MemoryError`]. Those bits
/// still round-trip faithfully; they're simply never tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    value: u32,
}

impl Status {
    /// Wrap a raw CPSR/SPSR value.
    pub const fn new(value: u32) -> Self {
        Status { value }
    }

    /// The raw register value.
    pub const fn value(self) -> u32 {
        self.value
    }

    fn fields(self) -> HashMap<String, u32> {
        cpsr_pattern()
            .unpack(self.value)
            .expect("CPSR pattern has no verify bits, so unpack never fails")
    }

    fn field(self, name: &str) -> u32 {
        self.fields().get(name).copied().unwrap_or(0)
    }

    fn set_field(&mut self, name: &str, bits: u32) {
        let mut fields = self.fields();
        fields.insert(name.to_string(), bits);
        self.value = cpsr_pattern().pack(&fields);
    }

    /// Negative flag.
    pub fn n(self) -> bool {
        self.field("N") != 0
    }
    /// Set the negative flag.
    pub fn set_n(&mut self, value: bool) {
        self.set_field("N", value as u32);
    }

    /// Zero flag.
    pub fn z(self) -> bool {
        self.field("Z") != 0
    }
    /// Set the zero flag.
    pub fn set_z(&mut self, value: bool) {
        self.set_field("Z", value as u32);
    }

    /// Carry flag.
    pub fn c(self) -> bool {
        self.field("C") != 0
    }
    /// Set the carry flag.
    pub fn set_c(&mut self, value: bool) {
        self.set_field("C", value as u32);
    }

    /// Overflow flag.
    pub fn v(self) -> bool {
        self.field("V") != 0
    }
    /// Set the overflow flag.
    pub fn set_v(&mut self, value: bool) {
        self.set_field("V", value as u32);
    }

    /// `N`, `Z`, `C`, `V` bundled for [`crate::condition::Condition::check`].
    pub fn flags(self) -> Flags {
        Flags {
            n: self.n(),
            z: self.z(),
            c: self.c(),
            v: self.v(),
        }
    }

    /// Cumulative saturation flag.
    pub fn q(self) -> bool {
        self.field("Q") != 0
    }
    /// Set the cumulative saturation flag.
    pub fn set_q(&mut self, value: bool) {
        self.set_field("Q", value as u32);
    }

    /// Jazelle mode bit.
    pub fn j(self) -> bool {
        self.field("J") != 0
    }
    /// Set the Jazelle mode bit.
    pub fn set_j(&mut self, value: bool) {
        self.set_field("J", value as u32);
    }

    /// Thumb mode flag.
    pub fn thumb(self) -> bool {
        self.field("T") != 0
    }
    /// Set the Thumb mode flag.
    pub fn set_thumb(&mut self, value: bool) {
        self.set_field("T", value as u32);
    }

    /// The eight-bit Thumb-2 `IT` block state.
    pub fn it(self) -> u32 {
        self.field("IT")
    }
    /// Set the `IT` block state.
    pub fn set_it(&mut self, value: u32) {
        self.set_field("IT", value);
    }

    /// The four NEON `GE` flags, packed as a nibble.
    pub fn ge(self) -> u32 {
        self.field("GE")
    }
    /// Set the `GE` flags.
    pub fn set_ge(&mut self, value: u32) {
        self.set_field("GE", value);
    }

    /// Endian flag (1 = big-endian). The emulator always runs little-endian
    /// regardless of this bit.
    pub fn e(self) -> bool {
        self.field("E") != 0
    }
    /// Set the endian flag.
    pub fn set_e(&mut self, value: bool) {
        self.set_field("E", value as u32);
    }

    /// Processor mode field (`M`): 16 user, 17 FIQ, 18 IRQ, 19 supervisor,
    /// 22 monitor, 23 abort, 27 undefined, 31 system.
    pub fn mode(self) -> u32 {
        self.field("M")
    }
    /// Set the processor mode field.
    pub fn set_mode(&mut self, value: u32) {
        self.set_field("M", value);
    }

    /// The processor's instruction set, derived from `J` and `T`: 0 ARM, 1
    /// Thumb, 2 Jazelle, 3 ThumbEE.
    pub fn instruction_set(self) -> u8 {
        (self.j() as u8) * 2 + (self.thumb() as u8)
    }

    /// Set `J`/`T` from an instruction-set id.
    pub fn set_instruction_set(&mut self, instruction_set: u8) {
        self.set_j(instruction_set & 0b10 != 0);
        self.set_thumb(instruction_set & 0b01 != 0);
    }
}

impl From<u32> for Status {
    fn from(value: u32) -> Self {
        Status::new(value)
    }
}

impl From<Status> for u32 {
    fn from(status: Status) -> Self {
        status.value
    }
}

fn fpscr_pattern() -> &'static BitPattern {
    static PATTERN: OnceLock<BitPattern> = OnceLock::new();
    PATTERN.get_or_init(|| {
        BitPattern::compile(
            "NZCVQ_nFRRSS_LLLd__xuoeiD__XUOEI",
            &[
                ('Q', "QC"),
                ('n', "DN"),
                ('F', "FZ"),
                ('R', "RMode"),
                ('S', "stride"),
                ('L', "length"),
                ('d', "IDE"),
                ('x', "IXE"),
                ('u', "UFE"),
                ('o', "OFE"),
                ('e', "DZE"),
                ('i', "IOE"),
                ('D', "IDC"),
                ('X', "IXC"),
                ('U', "UFC"),
                ('O', "OFC"),
                ('E', "DZC"),
                ('I', "IOC"),
            ],
            &[],
        )
        .expect("FPSCR bit pattern is well-formed")
    })
}

/// The VFP/NEON floating-point status register. Only `N`/`Z`/`C`/`V`/`QC`
/// are ever read or written by this emulator; the rest are storage-only
/// round-tripped bits, matching the scope of floating-point support this
/// crate carries (register storage, not arithmetic semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatingPointStatus {
    value: u32,
}

impl FloatingPointStatus {
    /// Wrap a raw FPSCR value.
    pub const fn new(value: u32) -> Self {
        FloatingPointStatus { value }
    }

    /// The raw register value.
    pub const fn value(self) -> u32 {
        self.value
    }

    fn field(self, name: &str) -> u32 {
        fpscr_pattern()
            .unpack(self.value)
            .expect("FPSCR pattern has no verify bits, so unpack never fails")
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    fn set_field(&mut self, name: &str, bits: u32) {
        let mut fields = fpscr_pattern()
            .unpack(self.value)
            .expect("FPSCR pattern has no verify bits, so unpack never fails");
        fields.insert(name.to_string(), bits);
        self.value = fpscr_pattern().pack(&fields);
    }

    /// Negative flag.
    pub fn n(self) -> bool {
        self.field("N") != 0
    }
    /// Set the negative flag.
    pub fn set_n(&mut self, value: bool) {
        self.set_field("N", value as u32);
    }

    /// Zero flag.
    pub fn z(self) -> bool {
        self.field("Z") != 0
    }
    /// Set the zero flag.
    pub fn set_z(&mut self, value: bool) {
        self.set_field("Z", value as u32);
    }

    /// Carry flag.
    pub fn c(self) -> bool {
        self.field("C") != 0
    }
    /// Set the carry flag.
    pub fn set_c(&mut self, value: bool) {
        self.set_field("C", value as u32);
    }

    /// Overflow flag.
    pub fn v(self) -> bool {
        self.field("V") != 0
    }
    /// Set the overflow flag.
    pub fn set_v(&mut self, value: bool) {
        self.set_field("V", value as u32);
    }

    /// Cumulative saturation flag.
    pub fn qc(self) -> bool {
        self.field("QC") != 0
    }
    /// Set the cumulative saturation flag.
    pub fn set_qc(&mut self, value: bool) {
        self.set_field("QC", value as u32);
    }
}

impl From<u32> for FloatingPointStatus {
    fn from(value: u32) -> Self {
        FloatingPointStatus::new(value)
    }
}

impl From<FloatingPointStatus> for u32 {
    fn from(status: FloatingPointStatus) -> Self {
        status.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_field_of_a_concrete_cpsr() {
        //     NZCVQttJ____ggggttttttEAIFTMMMMM
        let s = 0b10110010000000001110100000110000u32;
        let st = Status::new(s);
        assert!(st.n());
        assert!(!st.z());
        assert!(st.c());
        assert!(st.v());
        assert!(!st.q());
        assert_eq!(st.it(), 0b1110_1001);
        assert!(!st.j());
        assert_eq!(st.ge(), 0);
        assert!(!st.e());
        assert!(st.thumb());
        assert_eq!(st.mode(), 16);
        assert_eq!(st.value(), s);
        assert_eq!(st.instruction_set(), 1);
    }

    #[test]
    fn setting_instruction_set_updates_j_and_t_independently() {
        let mut st = Status::new(0b10110010000000001110100000110000);
        st.set_instruction_set(2);
        assert!(st.j());
        assert!(!st.thumb());
        assert!(st.n());
    }

    #[test]
    fn setting_one_field_preserves_the_others() {
        let mut st = Status::new(0);
        st.set_n(true);
        st.set_mode(19);
        assert!(st.n());
        assert_eq!(st.mode(), 19);
        assert!(!st.z());
    }

    #[test]
    fn fpscr_round_trips_the_flags_it_actually_uses() {
        let mut fp = FloatingPointStatus::new(0);
        fp.set_v(true);
        fp.set_qc(true);
        assert!(fp.v());
        assert!(fp.qc());
        assert!(!fp.n());
    }

    #[quickcheck_macros::quickcheck]
    fn status_value_round_trips(v: u32) -> bool {
        Status::new(v).value() == v
    }

    #[quickcheck_macros::quickcheck]
    fn set_instruction_set_only_touches_j_and_t(v: u32, new_set: u8) -> bool {
        let new_set = new_set & 0b11;
        let mut j_probe = Status::new(0);
        j_probe.set_j(true);
        let mut t_probe = Status::new(0);
        t_probe.set_thumb(true);
        let jt_mask = j_probe.value() | t_probe.value();

        let mut st = Status::new(v);
        let before = st.value();
        st.set_instruction_set(new_set);
        let after = st.value();
        (before ^ after) & !jt_mask == 0 && st.instruction_set() == new_set
    }
}
