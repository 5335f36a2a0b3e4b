//! Named constants for register indices, instruction-set ids, and memory
//! alignment.

/// Number of general-purpose registers (`r0`..`r15`).
pub const GPR_COUNT: usize = 16;

/// Number of single-precision VFP registers (`s0`..`s31`).
pub const SREGISTER_COUNT: usize = 32;

/// Number of double-precision VFP/NEON registers (`d0`..`d31`).
pub const DREGISTER_COUNT: usize = 32;

/// Number of quad-word NEON registers (`q0`..`q15`).
pub const QREGISTER_COUNT: usize = 16;

/// Stack limit alias register (`sl`, `r10`).
pub const REG_SL: usize = 10;

/// Frame pointer alias register (`fp`, `r11`).
pub const REG_FP: usize = 11;

/// Instruction pointer alias register (`ip`, `r12`).
pub const REG_IP: usize = 12;

/// Stack pointer alias register (`sp`, `r13`).
pub const REG_SP: usize = 13;

/// Link register alias (`lr`, `r14`).
pub const REG_LR: usize = 14;

/// Program counter alias register (`pc`, `r15`).
pub const REG_PC: usize = 15;

/// Native pointer width used by the memory model, in bytes.
pub const DEFAULT_ALIGN: u32 = 4;

/// `pc` read-ahead offset in Thumb mode, in bytes.
pub const PC_OFFSET_THUMB: u32 = 4;

/// `pc` read-ahead offset in ARM mode, in bytes.
pub const PC_OFFSET_ARM: u32 = 8;

/// ARM instruction-set id (`CPSR.{J,T} == 0b00`).
pub const INSTRUCTION_SET_ARM: u8 = 0;

/// Thumb instruction-set id (`CPSR.{J,T} == 0b01`).
pub const INSTRUCTION_SET_THUMB: u8 = 1;

/// Jazelle instruction-set id (`CPSR.{J,T} == 0b10`).
pub const INSTRUCTION_SET_JAZELLE: u8 = 2;

/// ThumbEE instruction-set id (`CPSR.{J,T} == 0b11`).
pub const INSTRUCTION_SET_THUMBEE: u8 = 3;

/// Sentinel condition value meaning "no condition field" (used during
/// decode before a condition has been attached).
pub const COND_NONE: u8 = 15;
