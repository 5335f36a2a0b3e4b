//! Error kinds surfaced by the decoder, semantics, memory, and thread layers.

use thiserror::Error;

/// Bit pattern compile-time error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BitPatternError {
    /// A pattern string contained a character that is neither `0`, `1`, `_`,
    /// a field letter, nor a space.
    #[error("invalid character {0:?} in bit pattern")]
    InvalidChar(char),
}

/// Instruction decode error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// No registered decoder rule matched the encoding.
    #[error("cannot decode {instruction_set} instruction {encoding:#x} (length {length})")]
    NotFound {
        /// Raw encoding bits, with any condition field already stripped for ARM.
        encoding: u32,
        /// Instruction length in bytes (2 or 4).
        length: u8,
        /// Instruction-set id (ARM=0, Thumb=1, Jazelle=2, ThumbEE=3).
        instruction_set: u8,
    },
}

/// Tagged-value arithmetic and comparison error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValueError {
    /// An operation combined two token kinds with no defined result, or tried
    /// to compare tokens of different kinds, or mixed a heap token with one
    /// from a different handle where only same-handle arithmetic is defined.
    #[error("cannot combine {left} with {right}")]
    TokenKindMismatch {
        /// Name of the left-hand operand's kind.
        left: &'static str,
        /// Name of the right-hand operand's kind.
        right: &'static str,
    },
}

/// Tagged-memory access error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// A partial (sub-word or unaligned) access landed on a value that does
    /// not support `decompose`/`replace_decomposed` (anything but a plain
    /// integer).
    #[error("cannot perform a partial access on a non-integer value")]
    UnsupportedPartialAccess,
    /// A heap access used a handle that has already been freed.
    #[error("use of freed heap handle {0}")]
    HeapUseAfterFree(u64),
    /// The host ROM reported an address outside its declared range.
    #[error("ROM access out of range at {vmaddr:#x} (length {length})")]
    RomOutOfRange {
        /// Requested VM address.
        vmaddr: u32,
        /// Requested byte length.
        length: u32,
    },
    /// `Memory::free` was asked to free a non-heap address.
    #[error("cannot free a {0} address; only heap pointers can be freed")]
    NotAHeapAddress(&'static str),
    /// A read or write spanned more bytes than fit in a 32-bit [`crate::value::Value`].
    /// No ARM/Thumb load or store this crate implements ever needs more than
    /// 4 bytes; this guards against a caller passing a bogus length rather
    /// than silently truncating.
    #[error("access of {length} bytes (align {align}) would not fit in a 32-bit value")]
    AccessTooWide {
        /// Requested byte length.
        length: u32,
        /// Native pointer width in bytes.
        align: u32,
    },
}

/// A `Condition` value of 15 ("none") was queried for a truth value outside
/// the dispatcher's own "no condition attached" bookkeeping. The dispatcher
/// never produces this if written correctly; kept as a real error rather
/// than a panic so a malformed custom decoder fails loudly instead of
/// crashing the host.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConditionError {
    /// `Condition::check` was called on the "none" sentinel.
    #[error("condition code 15 (\"none\") has no truth value")]
    Unknown,
}

/// Top-level error produced by decoding, executing, or dereferencing memory.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EmulatorError {
    /// See [`BitPatternError`].
    #[error(transparent)]
    BitPattern(#[from] BitPatternError),
    /// See [`DecodeError`].
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// See [`ValueError`].
    #[error(transparent)]
    Value(#[from] ValueError),
    /// See [`MemoryError`].
    #[error(transparent)]
    Memory(#[from] MemoryError),
    /// See [`ConditionError`].
    #[error(transparent)]
    Condition(#[from] ConditionError),
}
