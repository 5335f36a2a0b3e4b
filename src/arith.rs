//! Tag-preserving arithmetic for the data-processing ALU.
//!
//! `data_processing_result` in [`crate::decoders::arm`] works purely in
//! `u32`s, which is correct as long as both operands are plain integers.
//! Once one side is a stack offset, a heap pointer, or the `Return`
//! sentinel, the combination has to go through [`Value`]'s own
//! tag-aware arithmetic instead: carry-in stops applying (there is no
//! meaningful "carry into a pointer"), and a flag-setting form reports
//! all flags cleared rather than whatever the raw bit pattern would
//! imply.
use crate::error::ValueError;
use crate::value::Value;

/// Try to combine `rn` and `op2` for opcode `op` without collapsing
/// either to a raw integer first.
///
/// Returns `None` when both operands are plain integers: the caller
/// should fall back to the ordinary `u32` path in that case. Returns
/// `Some(Ok(_))` for the opcodes that have a defined tagged meaning
/// (`add`/`adc` add an integer offset onto a pointer; `sub`/`rsb` take
/// the tag-aware difference `checked_sub` already knows; `mov` just
/// passes operand 2's tag through unchanged). Every other opcode that
/// sees a tagged operand has no defined symbolic meaning and is a
/// [`ValueError::TokenKindMismatch`].
pub fn combine(op: u32, rn: Value, op2: Value) -> Option<Result<Value, ValueError>> {
    if rn.is_int() && op2.is_int() {
        return None;
    }
    Some(match op {
        4 | 5 => add_offset(rn, op2),
        2 => rn.checked_sub(op2),
        3 => op2.checked_sub(rn),
        13 => Ok(op2),
        _ => Err(ValueError::TokenKindMismatch { left: rn.kind_name(), right: op2.kind_name() }),
    })
}

/// `rn + op2`, tag-aware: exactly one side must be a plain integer,
/// which becomes the byte offset applied to the other side's tag.
fn add_offset(rn: Value, op2: Value) -> Result<Value, ValueError> {
    match (rn, op2) {
        (Value::Int(offset), tagged) | (tagged, Value::Int(offset)) => tagged.checked_add(offset as i64),
        (a, b) => Err(ValueError::TokenKindMismatch { left: a.kind_name(), right: b.kind_name() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_plain_integers_fall_back_to_none() {
        assert!(combine(4, Value::Int(1), Value::Int(2)).is_none());
    }

    #[test]
    fn adc_adds_an_integer_offset_onto_a_stack_token() {
        let result = combine(5, Value::Stack(0), Value::Int(17)).unwrap().unwrap();
        assert_eq!(result, Value::Stack(17));
    }

    #[test]
    fn sub_of_two_stack_tokens_yields_a_plain_distance() {
        let result = combine(2, Value::Stack(20), Value::Stack(4)).unwrap().unwrap();
        assert_eq!(result, Value::Int(16));
    }

    #[test]
    fn mov_passes_a_tag_through_unchanged() {
        let result = combine(13, Value::Int(0), Value::Heap { handle: 1, offset: 4 }).unwrap().unwrap();
        assert_eq!(result, Value::Heap { handle: 1, offset: 4 });
    }

    #[test]
    fn bitwise_ops_on_a_tagged_operand_are_a_mismatch() {
        assert!(combine(0, Value::Stack(0), Value::Int(1)).unwrap().is_err());
    }
}
