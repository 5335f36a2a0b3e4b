//! Bi-directional, implicitly infinite stack storage.

use std::collections::VecDeque;

use crate::error::MemoryError;
use crate::value::Value;

use super::AlignedStorage;

/// A word-addressed deque growing in either direction from item 0, used for
/// stack-relative addressing (negative items are "below" the initial
/// `sp`). Unestablished slots read as zero without being materialized; a
/// write establishes every slot between the deque's current extent and the
/// written item.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    content: VecDeque<Value>,
    positive_length: i64,
    negative_length: i64,
}

impl Stack {
    /// An empty stack.
    pub fn new() -> Self {
        Stack {
            content: VecDeque::new(),
            positive_length: -1,
            negative_length: 0,
        }
    }

    fn ensure_item_exists(&mut self, item: i64) {
        if item > self.positive_length {
            let count = item + 1 - self.positive_length;
            for _ in 0..count {
                self.content.push_back(Value::Int(0));
            }
            self.positive_length = item + 1;
        } else if item < self.negative_length {
            let count = self.negative_length - item + 1;
            for _ in 0..count {
                self.content.push_front(Value::Int(0));
            }
            self.negative_length = item - 1;
        }
    }
}

impl AlignedStorage for Stack {
    fn get_item(&self, item: i64, _min_length: u32) -> Result<Value, MemoryError> {
        let index = item - self.negative_length;
        if index >= 0 && (index as usize) < self.content.len() {
            Ok(self.content[index as usize])
        } else {
            Ok(Value::Int(0))
        }
    }

    fn set_item(&mut self, item: i64, value: Value) {
        self.ensure_item_exists(item);
        let index = (item - self.negative_length) as usize;
        self.content[index] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unestablished_slots_read_as_zero() {
        let stack = Stack::new();
        assert_eq!(stack.get(0, 0).unwrap(), Value::Int(0));
        assert_eq!(stack.get(-4, 0).unwrap(), Value::Int(0));
    }

    #[test]
    fn grows_in_both_directions_and_preserves_contents() {
        let mut stack = Stack::new();
        stack.set(0, Value::Int(0x12345678), 0).unwrap();
        assert_eq!(stack.get(0, 0).unwrap(), Value::Int(0x12345678));
        assert_eq!(stack.get(2, 2).unwrap(), Value::Int(0x1234));

        stack.set(-4, Value::Int(0xabcdef90), 0).unwrap();
        assert_eq!(stack.get(-4, 0).unwrap(), Value::Int(0xabcdef90));
        assert!(stack.get(-4, 8).is_err());
    }

    #[test]
    fn a_token_round_trips_through_a_word_aligned_slot() {
        let mut stack = Stack::new();
        stack.set(-16, Value::Stack(-16), 0).unwrap();
        assert_eq!(stack.get(-16, 0).unwrap(), Value::Stack(-16));
    }

    #[quickcheck_macros::quickcheck]
    fn set_then_get_round_trips_an_integer(offset_words: i16, value: u32, width_index: u8) -> bool {
        let mut stack = Stack::new();
        let offset = offset_words as i64 * 4;
        let width = [0u32, 1, 2, 3, 4][(width_index % 5) as usize];
        let expected = if width == 0 || width == 4 { value } else { value & ((1u32 << (width * 8)) - 1) };
        stack.set(offset, Value::Int(value), width).unwrap();
        stack.get(offset, width).unwrap() == Value::Int(expected)
    }

    #[quickcheck_macros::quickcheck]
    fn a_token_round_trips_at_any_word_aligned_offset(offset_words: i16, token_offset: i16) -> bool {
        let mut stack = Stack::new();
        let offset = offset_words as i64 * 4;
        let token = Value::Stack(token_offset as i64);
        stack.set(offset, token, 0).unwrap();
        stack.get(offset, 0).unwrap() == token
    }
}
