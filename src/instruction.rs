//! A decoded instruction: the condition that gates it, the mnemonic and
//! operands disassembly needs, and the closure that actually carries out
//! its semantics against a [`crate::thread::Thread`].

use crate::condition::Condition;
use crate::error::EmulatorError;
use crate::operand::Operand;
use crate::semantics;
use crate::thread::Thread;

/// The body of an instruction, produced by exactly one decoder rule and run
/// by [`Instruction::execute`] once its condition has passed.
pub type Exec = Box<dyn Fn(&Instruction, &mut Thread) -> Result<(), EmulatorError>>;

/// A fully decoded instruction, ready to run or disassemble.
pub struct Instruction {
    /// Raw encoding bits, condition already stripped for ARM.
    pub encoding: u32,
    /// Length in bytes: 2 (narrow Thumb), 4 (ARM or wide Thumb-2).
    pub length: u8,
    /// Instruction-set id this was decoded under (ARM=0, Thumb=1,
    /// Jazelle=2, ThumbEE=3).
    pub instruction_set: u8,
    /// The condition gating execution. `Al` for unconditional encodings.
    pub condition: Condition,
    /// Disassembly suffix distinguishing narrow/wide Thumb-2 forms of the
    /// same mnemonic (`""`, `".n"`, `".w"`).
    pub width: &'static str,
    /// Mnemonic without condition or width suffix, e.g. `"add"`.
    pub main_opcode: &'static str,
    /// Whether this is a flag-setting form (`adds` vs `add`), folded into
    /// disassembly but not into `main_opcode` so decoders can match on the
    /// base mnemonic.
    pub sets_flags: bool,
    /// Operands in disassembly order.
    pub operands: Vec<Operand>,
    /// A trailing barrel-shifter applied to the last operand, as ARM
    /// disassembly shows it (`lsl #2`, `rrx`, ...). `shift_amount` of 0
    /// means "no shift" and is not printed.
    pub shift_type: u8,
    /// Shift amount; 0 suppresses the shift suffix entirely.
    pub shift_amount: u32,
    /// Set only by the Thumb-2 `IT` family: [`crate::thread::Thread::fetch`]
    /// never overrides this instruction's condition from the live `IT`
    /// state (it always runs `Al`, since it's what *establishes* that
    /// state), and [`crate::thread::Thread::step`] does not run
    /// [`crate::semantics::it_advance`] after it (the state it just wrote
    /// already is the condition for the following instruction).
    pub it_block_directive: bool,
    exec: Exec,
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instruction")
            .field("encoding", &self.encoding)
            .field("length", &self.length)
            .field("opcode", &self.opcode())
            .field("operands", &self.operands)
            .finish()
    }
}

impl Instruction {
    /// Build a decoded instruction. Decoder rules call this once they've
    /// matched an encoding and pulled its operands apart.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        encoding: u32,
        length: u8,
        instruction_set: u8,
        condition: Condition,
        main_opcode: &'static str,
        operands: Vec<Operand>,
        exec: impl Fn(&Instruction, &mut Thread) -> Result<(), EmulatorError> + 'static,
    ) -> Self {
        Instruction {
            encoding,
            length,
            instruction_set,
            condition,
            width: "",
            main_opcode,
            sets_flags: false,
            operands,
            shift_type: 0,
            shift_amount: 0,
            it_block_directive: false,
            exec: Box::new(exec),
        }
    }

    /// Mark this as a flag-setting form (`adds`, `subs`, ...).
    pub fn set_flags(mut self, sets_flags: bool) -> Self {
        self.sets_flags = sets_flags;
        self
    }

    /// Attach a disassembly-only width suffix (`".n"`/`".w"`).
    pub fn with_width(mut self, width: &'static str) -> Self {
        self.width = width;
        self
    }

    /// Attach a trailing barrel shift to show in disassembly.
    pub fn with_shift(mut self, shift_type: u8, shift_amount: u32) -> Self {
        self.shift_type = shift_type;
        self.shift_amount = shift_amount;
        self
    }

    /// Mark this as the Thumb-2 `IT` family directive itself (see the
    /// field doc above).
    pub fn as_it_block_directive(mut self) -> Self {
        self.it_block_directive = true;
        self
    }

    /// `mainOpcode` plus the flag-setting `s` suffix, e.g. `"adds"`.
    pub fn main_opcode_with_flags(&self) -> String {
        if self.sets_flags {
            format!("{}s", self.main_opcode)
        } else {
            self.main_opcode.to_string()
        }
    }

    /// Full mnemonic as shown in disassembly: opcode, condition, width.
    pub fn opcode(&self) -> String {
        format!("{}{}{}", self.main_opcode_with_flags(), self.condition, self.width)
    }

    /// Advance `pc` past this instruction, then, if the condition passes,
    /// run its body. `pc` is advanced *before* the condition check and
    /// *before* the body runs, matching how a real pipeline always fetches
    /// the next instruction regardless of whether this one executes; the
    /// body (a taken branch, a `pop {pc}`, ...) is free to overwrite `pc`
    /// again. `on_branch` fires whenever the condition passed and `pc` no
    /// longer equals the value it held before this call, which in
    /// practice is every executed instruction (the plain-advance case
    /// counts too, not only taken branches).
    pub fn execute(&self, thread: &mut Thread) -> Result<(), EmulatorError> {
        let location = thread.pc_raw();
        thread.set_pc_raw(location.checked_add(self.length as i64)?);
        if self.condition.check(thread.cpsr().flags()) {
            (self.exec)(self, thread)?;
            if thread.pc_raw() != location {
                thread.on_branch(self, location);
            }
        }
        Ok(())
    }

    /// Apply this instruction's trailing shift to `value`, reporting
    /// carry-out. Shifts in this model are always over the full 32-bit
    /// register width.
    pub fn apply_shift_c(&self, value: u32, carry_in: bool) -> (u32, bool) {
        semantics::shift_c(32, value, self.shift_type, self.shift_amount, carry_in)
    }

    /// Apply this instruction's trailing shift to `value`, discarding
    /// carry-out.
    pub fn apply_shift(&self, value: u32, carry_in: bool) -> u32 {
        semantics::shift(32, value, self.shift_type, self.shift_amount, carry_in)
    }
}

#[cfg(feature = "disassembly")]
impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operand_list = self.operands.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        write!(f, "{}\t{operand_list}", self.opcode())?;
        if self.shift_amount != 0 {
            if self.shift_type == semantics::SRTYPE_RRX {
                write!(f, ", rrx")?;
            } else {
                let name = match self.shift_type {
                    semantics::SRTYPE_LSL => "lsl",
                    semantics::SRTYPE_LSR => "lsr",
                    semantics::SRTYPE_ASR => "asr",
                    _ => "ror",
                };
                write!(f, ", {name} #{}", self.shift_amount)?;
            }
        }
        Ok(())
    }
}
