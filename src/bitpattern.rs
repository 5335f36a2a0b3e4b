//! Compiles a bit-pattern string such as `"aaabbcc b_01_d1f0"` into a set of
//! mask/shift pieces per named field, plus a verify mask/bits pair, so that
//! an encoding can be unpacked into named fields or a field map packed back
//! into an encoding.
//!
//! Characters: `0`/`1` require an exact bit match and contribute to the
//! verify mask/bits; `_` is ignored; a letter names a field. Repeated runs
//! of the same letter form a contiguous slice of that field; a field may
//! also be *discontiguous* — separate runs of the same (possibly renamed)
//! letter are concatenated LSB-first by bit position into one integer.

use std::collections::HashMap;

use crate::error::BitPatternError;

#[derive(Debug, Clone, Copy)]
struct Piece {
    mask: u32,
    right_shift: u32,
}

impl Piece {
    fn new(right_shift: i32, bias: u32) -> Self {
        Piece {
            mask: 1u32 << bias,
            right_shift: (right_shift - bias as i32) as u32,
        }
    }

    fn add_bit(&mut self) {
        self.mask = (self.mask << 1) | self.mask;
    }
}

fn bit_length(mask: u32) -> u32 {
    32 - mask.leading_zeros()
}

/// A pair of functions applied after decode / before encode, respectively.
/// Used e.g. by the `IT` status field to repack `(cond_hi3, mask_low5)`
/// storage order into the order `ITAdvance` expects.
pub type FixUp = (fn(u32) -> u32, fn(u32) -> u32);

/// A compiled bit pattern: masks/shifts per field, plus the verify mask/bits.
#[derive(Debug, Clone)]
pub struct BitPattern {
    pattern: &'static str,
    verify_mask: u32,
    verify_bits: u32,
    fields: Vec<(String, Vec<Piece>)>,
    field_index: HashMap<String, usize>,
    fix_ups: HashMap<String, FixUp>,
}

impl BitPattern {
    /// Compile a pattern string. `rename` remaps single-letter field names
    /// to longer names; `fix_ups` attaches a (decode, encode) pair to a
    /// (possibly renamed) field name.
    pub fn compile(
        pattern: &'static str,
        rename: &[(char, &str)],
        fix_ups: &[(&str, FixUp)],
    ) -> Result<Self, BitPatternError> {
        let rename_map: HashMap<char, &str> = rename.iter().copied().collect();
        let fix_up_map: HashMap<String, FixUp> = fix_ups
            .iter()
            .map(|&(name, pair)| (name.to_string(), pair))
            .collect();

        let mut verify_mask: u32 = 0;
        let mut verify_bits: u32 = 0;
        let mut fields: Vec<(String, Vec<Piece>)> = Vec::new();
        let mut field_index: HashMap<String, usize> = HashMap::new();

        let mut last_field = String::from("_");
        let mut right_shift: i32 = 0;

        for ch in pattern.chars().rev() {
            if ch == ' ' {
                continue;
            } else if ch == '0' || ch == '1' {
                verify_mask |= 1 << right_shift;
                if ch == '1' {
                    verify_bits |= 1 << right_shift;
                }
                last_field = ch.to_string();
            } else if ch == '_' {
                last_field = "_".to_string();
            } else if ch.is_ascii_alphabetic() {
                let name = rename_map
                    .get(&ch)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| ch.to_string());

                if name != last_field {
                    match field_index.get(&name).copied() {
                        None => {
                            let idx = fields.len();
                            fields.push((name.clone(), vec![Piece::new(right_shift, 0)]));
                            field_index.insert(name.clone(), idx);
                        }
                        Some(idx) => {
                            let bias = bit_length(fields[idx].1.last().expect("field has a piece").mask);
                            fields[idx].1.push(Piece::new(right_shift, bias));
                        }
                    }
                } else {
                    let idx = *field_index.get(&name).expect("contiguous run already registered");
                    fields[idx].1.last_mut().expect("field has a piece").add_bit();
                }

                last_field = name;
            } else {
                return Err(BitPatternError::InvalidChar(ch));
            }

            right_shift += 1;
        }

        Ok(BitPattern {
            pattern,
            verify_mask,
            verify_bits,
            fields,
            field_index,
            fix_ups: fix_up_map,
        })
    }

    /// The source pattern string this was compiled from.
    pub const fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// Bits that must be checked against `verify_bits` for a value to match.
    pub const fn verify_mask(&self) -> u32 {
        self.verify_mask
    }

    /// Required bit values under `verify_mask` for a value to match.
    pub const fn verify_bits(&self) -> u32 {
        self.verify_bits
    }

    /// Names of the fields this pattern extracts, in first-appearance order
    /// (scanning the pattern from its end, as the compiler does).
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Unpack `value` into a field-name -> integer map. Returns `None` if
    /// `value` does not satisfy the verify mask/bits.
    pub fn unpack(&self, value: u32) -> Option<HashMap<String, u32>> {
        if value & self.verify_mask != self.verify_bits {
            return None;
        }

        let mut out = HashMap::with_capacity(self.fields.len());
        for (name, pieces) in &self.fields {
            let mut result: u32 = 0;
            for piece in pieces {
                result |= (value >> piece.right_shift) & piece.mask;
            }
            if let Some((decode, _)) = self.fix_ups.get(name) {
                result = decode(result);
            }
            out.insert(name.clone(), result);
        }
        Some(out)
    }

    /// Pack a field-name -> integer map back into an encoding. Fields
    /// missing from `fields` are treated as zero.
    pub fn pack(&self, fields: &HashMap<String, u32>) -> u32 {
        let mut result = self.verify_bits;
        for (name, pieces) in &self.fields {
            let mut bits = fields.get(name).copied().unwrap_or(0);
            if let Some((_, encode)) = self.fix_ups.get(name) {
                bits = encode(bits);
            }
            for piece in pieces {
                result |= (bits & piece.mask) << piece.right_shift;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_discontiguous_and_renamed_field() {
        let parser = BitPattern::compile("aaabbcc b_01_d1f0", &[('b', "omg")], &[]).unwrap();

        let value: u32 = 0b1011011100101100;
        assert!(BitPattern::compile("aaabbcc b_01_d1f0", &[], &[])
            .unwrap()
            .unpack(0b0101110111101110)
            .is_none());

        let fields = parser.unpack(value).unwrap();
        assert_eq!(fields["a"], 5);
        assert_eq!(fields["omg"], 0b101);
        assert_eq!(fields["c"], 0b11);
        assert_eq!(fields["d"], 1);
        assert_eq!(fields["f"], 0);
        assert!(!fields.contains_key("b"));

        assert_eq!(parser.pack(&fields), value);
    }

    #[test]
    fn pack_round_trips_after_mutation() {
        let parser = BitPattern::compile("aaabbcc b_01_d1f0", &[('b', "omg")], &[]).unwrap();
        let mut fields = parser.unpack(0b1011011100101100).unwrap();
        fields.insert("a".to_string(), 3);
        assert_eq!(parser.pack(&fields), 0b0111011100101100);
    }

    #[test]
    fn rejects_invalid_character() {
        let err = BitPattern::compile("abc!", &[], &[]).unwrap_err();
        assert_eq!(err, BitPatternError::InvalidChar('!'));
    }

    #[quickcheck_macros::quickcheck]
    fn unpack_pack_round_trip(a: u8, b: u8, c: u8, d: bool, f: bool) -> bool {
        let parser = BitPattern::compile("aaabbcc b_01_d1f0", &[('b', "omg")], &[]).unwrap();
        let mut fields = HashMap::new();
        fields.insert("a".to_string(), (a & 0b111) as u32);
        fields.insert("omg".to_string(), (b & 0b111) as u32);
        fields.insert("c".to_string(), (c & 0b11) as u32);
        fields.insert("d".to_string(), d as u32);
        fields.insert("f".to_string(), f as u32);

        let packed = parser.pack(&fields);
        let unpacked = parser.unpack(packed).unwrap();
        unpacked == fields
    }
}
