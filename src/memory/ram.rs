//! Copy-on-write overlay over an immutable [`Rom`].

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::MemoryError;
use crate::value::Value;

use super::{AlignedStorage, Rom};

/// Word-addressed RAM: reads fall through to the backing [`Rom`] until a
/// word has been written, at which point the overlay's copy wins forever.
#[derive(Debug, Clone)]
pub struct Ram {
    rom: Rc<dyn Rom>,
    overlay: HashMap<i64, Value>,
}

impl Ram {
    /// Build a RAM overlaying `rom`, initially identical to it.
    pub fn new(rom: Rc<dyn Rom>) -> Self {
        Ram {
            rom,
            overlay: HashMap::new(),
        }
    }
}

impl AlignedStorage for Ram {
    fn get_item(&self, item: i64, min_length: u32) -> Result<Value, MemoryError> {
        if let Some(value) = self.overlay.get(&item) {
            return Ok(*value);
        }
        let addr = (item * self.align() as i64) as u32;
        let bytes = self.rom.deref_bytes(addr, min_length)?;
        let mut buf = [0u8; 4];
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(Value::Int(u32::from_le_bytes(buf)))
    }

    fn set_item(&mut self, item: i64, value: Value) {
        self.overlay.insert(item, value);
    }
}

#[cfg(test)]
mod tests {
    use super::super::SimulatedRom;
    use super::*;

    fn sample() -> Ram {
        Ram::new(Rc::new(SimulatedRom::new(
            vec![0x90, 0xef, 0xcd, 0xab, 0x78, 0x56, 0x34, 0x12],
            0x1000,
        )))
    }

    #[test]
    fn unmodified_words_read_through_to_rom() {
        let ram = sample();
        assert_eq!(ram.get(0x1000, 0).unwrap(), Value::Int(0xabcdef90));
        assert_eq!(ram.get(0x1004, 0).unwrap(), Value::Int(0x12345678));
        assert_eq!(ram.get(0x1000, 1).unwrap(), Value::Int(0x90));
        assert_eq!(ram.get(0x1002, 2).unwrap(), Value::Int(0xabcd));
    }

    #[test]
    fn a_write_shadows_the_rom_permanently() {
        let mut ram = sample();
        ram.set(0x1000, Value::Int(0xabcdefff), 0).unwrap();
        assert_eq!(ram.get(0x1000, 0).unwrap(), Value::Int(0xabcdefff));
        assert_eq!(ram.get(0x1004, 0).unwrap(), Value::Int(0x12345678));
    }

    #[test]
    fn a_length_wider_than_a_word_is_rejected() {
        let ram = sample();
        assert!(ram.get(0x1000, 8).is_err());
    }

    #[test]
    fn unaligned_sub_word_writes_preserve_neighboring_bytes() {
        let mut ram = sample();
        ram.set(0x1001, Value::Int(0x25), 1).unwrap();
        assert_eq!(ram.get(0x1000, 0).unwrap(), Value::Int(0xabcd2590));

        ram.set(0x1002, Value::Int(0x4321), 2).unwrap();
        assert_eq!(ram.get(0x1000, 0).unwrap(), Value::Int(0x43212590));
        assert_eq!(ram.get(0x1002, 1).unwrap(), Value::Int(0x21));
        assert_eq!(ram.get(0x1003, 1).unwrap(), Value::Int(0x43));
        assert_eq!(ram.get(0x1000, 2).unwrap(), Value::Int(0x2590));
    }
}
