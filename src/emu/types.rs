/// Result type for CHIP-8 CPU cycle execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip8Result {
    /// Continue executing instructions in the current frame.
    Continue,
    /// Wait for the next frame before continuing
    /// (after a draw or clear, or while blocked on a key press).
    WaitForNextFrame,
}

/// Lifecycle of the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    /// Constructed, no program loaded yet.
    Ready,
    /// A program is loaded and instructions may be executed.
    Running,
    /// Stopped after a fatal error or an explicit stop request.
    Halted,
}

/// Error types that can occur during CHIP-8 emulation.
///
/// Every variant raised while executing carries the address of the
/// instruction that failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },

    #[error("Memory access out of bounds at address {address:#06X} (pc {pc:#06X})")]
    OutOfBoundsAccess { address: usize, pc: u16 },

    #[error("Unknown opcode {opcode:#06X} at {pc:#06X}")]
    UnknownOpcode { opcode: u16, pc: u16 },

    #[error("Stack overflow: subroutine call at {pc:#06X} exceeds the call stack depth")]
    StackOverflow { pc: u16 },

    #[error("Stack underflow: return at {pc:#06X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("Interpreter is not running (state {state:?}, pc {pc:#06X})")]
    NotRunning { state: ExecState, pc: u16 },

    #[error("Invalid {name} clock rate: {hz} Hz")]
    InvalidClock { name: &'static str, hz: f32 },
}

impl Chip8Error {
    /// Program counter at the point of failure, if the error happened while executing.
    pub fn pc(&self) -> Option<u16> {
        match self {
            Self::OutOfBoundsAccess { pc, .. }
            | Self::UnknownOpcode { pc, .. }
            | Self::StackOverflow { pc }
            | Self::StackUnderflow { pc }
            | Self::NotRunning { pc, .. } => Some(*pc),
            Self::RomTooLarge { .. } | Self::InvalidClock { .. } => None,
        }
    }
}

pub const DISPLAY_X: usize = 64;
pub const DISPLAY_Y: usize = 32;
/// A type alias for the CHIP-8 display buffer representation
pub type Display<T> = [[T; DISPLAY_X]; DISPLAY_Y];
