//! The read-only, host-supplied backing store `RAM` overlays.

use crate::error::MemoryError;

/// A source of immutable bytes addressed by VM address.
///
/// Object-safe so a host can hand a thread a boxed implementation without
/// making [`crate::thread::Thread`] generic over it: unlike the decoder
/// registry or operand model, a ROM has no associated-type surface worth
/// preserving across calls.
pub trait Rom: std::fmt::Debug {
    /// Return up to `length` bytes starting at `vmaddr`. Fails if any of the
    /// requested range lies outside the ROM's declared extent.
    fn deref_bytes(&self, vmaddr: u32, length: u32) -> Result<Vec<u8>, MemoryError>;
}

/// An in-memory ROM backed by a flat byte buffer, used in tests and by
/// callers that have already mapped a Mach-O segment into a `Vec<u8>`.
#[derive(Debug, Clone)]
pub struct SimulatedRom {
    vmaddr: u32,
    content: Vec<u8>,
}

impl SimulatedRom {
    /// Wrap `content` as a ROM whose first byte is addressed at `vmaddr`.
    pub fn new(content: Vec<u8>, vmaddr: u32) -> Self {
        SimulatedRom { vmaddr, content }
    }

    /// The base address this ROM was constructed with.
    pub const fn vmaddr(&self) -> u32 {
        self.vmaddr
    }

    /// The raw backing buffer.
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

impl Rom for SimulatedRom {
    fn deref_bytes(&self, vmaddr: u32, length: u32) -> Result<Vec<u8>, MemoryError> {
        let start = vmaddr.checked_sub(self.vmaddr).ok_or(MemoryError::RomOutOfRange { vmaddr, length })?;
        let start = start as usize;
        let end = start.checked_add(length as usize).ok_or(MemoryError::RomOutOfRange { vmaddr, length })?;
        self.content
            .get(start..end)
            .map(<[u8]>::to_vec)
            .ok_or(MemoryError::RomOutOfRange { vmaddr, length })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deref_bytes_reads_a_slice_at_an_offset() {
        let rom = SimulatedRom::new(vec![0x90, 0xef, 0xcd, 0xab, 0x78, 0x56, 0x34, 0x12], 0x1000);
        assert_eq!(rom.deref_bytes(0x1002, 3).unwrap(), vec![0xcd, 0xab, 0x78]);
    }

    #[test]
    fn deref_bytes_rejects_out_of_range_access() {
        let rom = SimulatedRom::new(vec![0; 4], 0x1000);
        assert!(rom.deref_bytes(0x1002, 4).is_err());
        assert!(rom.deref_bytes(0x0ff0, 4).is_err());
    }
}
