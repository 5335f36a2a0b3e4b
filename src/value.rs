//! Tagged values that flow through registers and memory.
//!
//! Concrete integers, stack-relative pointers, heap handles with an offset,
//! and the singleton `Return` marker all share one type so that a register
//! can symbolically track "this is 12 bytes above the value r13 held at
//! function entry" instead of collapsing to a raw 32-bit number too early.
//! Arithmetic between incompatible kinds (e.g. two heap pointers with
//! different handles) is a [`ValueError`], not a panic.

use crate::error::{MemoryError, ValueError};

/// A register- or memory-sized value, tagged with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// A plain 32-bit integer.
    Int(u32),
    /// An offset relative to the stack pointer's value at some reference
    /// point, in bytes. May be negative.
    Stack(i64),
    /// An offset into a heap allocation identified by `handle`, in bytes.
    Heap {
        /// Allocation handle; heap pointers with different handles never
        /// alias and are not comparable.
        handle: u64,
        /// Byte offset from the start of the allocation. May be negative.
        offset: i64,
    },
    /// The sentinel marking "execution should stop here". Carries no
    /// arithmetic meaning; any attempt to combine it with another value is
    /// a [`ValueError`].
    Return,
}

impl Value {
    /// Human-readable kind name, used in [`ValueError`] messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Stack(_) => "stack pointer",
            Value::Heap { .. } => "heap pointer",
            Value::Return => "return",
        }
    }

    /// True if this value is tagged as a plain integer.
    pub const fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    /// The plain integer this value carries, truncating pointers to their
    /// raw offset. Used where a caller has already established (elsewhere)
    /// that the tag doesn't matter, e.g. formatting for disassembly.
    pub const fn to_bits(&self) -> u32 {
        match self {
            Value::Int(v) => *v,
            Value::Stack(offset) => *offset as u32,
            Value::Heap { offset, .. } => *offset as u32,
            Value::Return => 0,
        }
    }

    /// Move this value forward by `rhs` bytes, preserving its tag.
    pub fn checked_add(self, rhs: i64) -> Result<Value, ValueError> {
        match self {
            Value::Int(v) => Ok(Value::Int(v.wrapping_add(rhs as u32))),
            Value::Stack(offset) => Ok(Value::Stack(offset.wrapping_add(rhs))),
            Value::Heap { handle, offset } => Ok(Value::Heap {
                handle,
                offset: offset.wrapping_add(rhs),
            }),
            Value::Return => Err(ValueError::TokenKindMismatch {
                left: self.kind_name(),
                right: "integer",
            }),
        }
    }

    /// Move this value backward by `rhs` bytes (if `rhs` is an [`Value::Int`]),
    /// or compute the byte distance between two same-kind pointers.
    pub fn checked_sub(self, rhs: Value) -> Result<Value, ValueError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(b))),
            (Value::Stack(a), Value::Int(b)) => Ok(Value::Stack(a - b as i64)),
            (Value::Stack(a), Value::Stack(b)) => Ok(Value::Int((a - b) as u32)),
            (Value::Heap { handle, offset }, Value::Int(b)) => Ok(Value::Heap {
                handle,
                offset: offset - b as i64,
            }),
            (
                Value::Heap { handle: ha, offset: oa },
                Value::Heap { handle: hb, offset: ob },
            ) if ha == hb => Ok(Value::Int((oa - ob) as u32)),
            (a, b) => Err(ValueError::TokenKindMismatch {
                left: a.kind_name(),
                right: b.kind_name(),
            }),
        }
    }

    /// Compare two values of the same kind. Stack pointers and heap
    /// pointers (with a matching handle) order by offset; integers order
    /// numerically. Any other pairing is a [`ValueError`], mirroring how
    /// the tagged pointers this is modeled on refuse to order against a
    /// pointer of a different kind or handle.
    pub fn try_cmp(&self, other: &Value) -> Result<std::cmp::Ordering, ValueError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Stack(a), Value::Stack(b)) => Ok(a.cmp(b)),
            (
                Value::Heap { handle: ha, offset: oa },
                Value::Heap { handle: hb, offset: ob },
            ) if ha == hb => Ok(oa.cmp(ob)),
            (a, b) => Err(ValueError::TokenKindMismatch {
                left: a.kind_name(),
                right: b.kind_name(),
            }),
        }
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v)
    }
}

/// Byte-level access into a value too wide for one load/store, as used by
/// unaligned and sub-word memory accesses. Only plain integers support
/// this; pointers do not decompose into bytes since their meaning lives in
/// the whole offset, not individual bytes of it.
pub trait Decompose: Sized {
    /// Extract `length` bytes (or, if `None`, everything above `offset`)
    /// starting at byte `offset`, little-endian.
    fn decompose(&self, offset: usize, length: Option<usize>) -> Result<u32, MemoryError>;

    /// Return a copy of `self` with `length` bytes (or, if `None`,
    /// everything above `offset`) at byte `offset` replaced by `value`.
    fn replace_decomposed(
        &self,
        offset: usize,
        value: u32,
        length: Option<usize>,
    ) -> Result<Self, MemoryError>;
}

fn byte_mask(length: usize) -> u32 {
    let bits = length.saturating_mul(8);
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

impl Decompose for Value {
    fn decompose(&self, offset: usize, length: Option<usize>) -> Result<u32, MemoryError> {
        let Value::Int(v) = self else {
            return Err(MemoryError::UnsupportedPartialAccess);
        };
        let right_shift = offset.saturating_mul(8);
        let shifted = if right_shift >= 32 { 0 } else { v >> right_shift };
        Ok(match length {
            Some(len) => shifted & byte_mask(len),
            None => shifted,
        })
    }

    fn replace_decomposed(
        &self,
        offset: usize,
        value: u32,
        length: Option<usize>,
    ) -> Result<Self, MemoryError> {
        let Value::Int(v) = self else {
            return Err(MemoryError::UnsupportedPartialAccess);
        };
        let right_shift = offset.saturating_mul(8);
        if right_shift >= 32 {
            return Ok(Value::Int(*v));
        }
        let mask = match length {
            Some(len) => byte_mask(len),
            None => u32::MAX,
        };
        let cleared = v & !(mask.wrapping_shl(right_shift as u32));
        Ok(Value::Int(cleared | ((value & mask) << right_shift)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompose_extracts_byte_in_the_middle() {
        assert_eq!(Value::Int(0x1234_5678).decompose(2, Some(1)).unwrap(), 0x34);
        assert_eq!(Value::Int(0x1234_5678).decompose(2, None).unwrap(), 0x1234);
    }

    #[test]
    fn replace_decomposed_splices_in_a_byte() {
        assert_eq!(
            Value::Int(0x1234_5678).replace_decomposed(2, 0xff, Some(1)).unwrap(),
            Value::Int(0x12ff_5678)
        );
        assert_eq!(
            Value::Int(0x1234_5678).replace_decomposed(2, 0xee, None).unwrap(),
            Value::Int(0x00ee_5678)
        );
    }

    #[test]
    fn stack_pointer_arithmetic_stays_tagged() {
        let sp = Value::Stack(16);
        assert_eq!(sp.checked_add(4).unwrap(), Value::Stack(20));
        assert_eq!(sp.checked_sub(Value::Int(4)).unwrap(), Value::Stack(12));
        assert_eq!(sp.checked_sub(Value::Stack(10)).unwrap(), Value::Int(6));
    }

    #[test]
    fn heap_pointers_with_different_handles_do_not_combine() {
        let a = Value::Heap { handle: 1, offset: 0 };
        let b = Value::Heap { handle: 2, offset: 0 };
        assert!(a.checked_sub(b).is_err());
        assert!(a.try_cmp(&b).is_err());
    }

    #[test]
    fn heap_pointers_with_same_handle_order_by_offset() {
        let a = Value::Heap { handle: 1, offset: 4 };
        let b = Value::Heap { handle: 1, offset: 10 };
        assert_eq!(a.try_cmp(&b), Ok(std::cmp::Ordering::Less));
    }

    #[test]
    fn return_value_rejects_arithmetic() {
        assert!(Value::Return.checked_add(4).is_err());
    }
}
