use core::fmt;

/// Fatal machine conditions.
///
/// Out-of-range addresses are not listed here: `I` and every block transfer
/// wrap modulo the 4096-byte address space and emit a warning instead of
/// corrupting unrelated memory.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// ROM does not fit between 0x200 and 0xFFF
    ProgramTooLarge { len: usize },
    /// Fetched two bytes that decode to no documented instruction
    UnknownOpcode { addr: u16, opcode: u16 },
    /// CALL past the 16-frame stack bound
    StackOverflow { pc: u16, depth: usize },
    /// RET without a matching CALL
    StackUnderflow { pc: u16 },
    /// Ticked after a previous fatal condition
    Halted,
    /// Builder misconfiguration
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::ProgramTooLarge { len } => {
                write!(f, "program of {} bytes exceeds 0xE00 bytes of program space", len)
            }
            Error::UnknownOpcode { addr, opcode } => {
                write!(f, "unknown opcode {:#06x} at {:#05x}", opcode, addr)
            }
            Error::StackOverflow { pc, depth } => {
                write!(f, "call stack overflow at pc {:#05x}, depth {}", pc, depth)
            }
            Error::StackUnderflow { pc } => {
                write!(f, "return without call at pc {:#05x}", pc)
            }
            Error::Halted => write!(f, "machine is halted"),
            Error::Config(what) => write!(f, "{}", what),
        }
    }
}
