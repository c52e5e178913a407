use super::Chip8Error;

/// Maximum number of nested subroutine calls.
pub const STACK_DEPTH: usize = 16;

/// Bounded LIFO of return addresses.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<u16>,
}

impl CallStack {
    pub fn new() -> Self {
        Self {
            frames: Vec::with_capacity(STACK_DEPTH),
        }
    }

    /// Pushes a return address; `pc` is the address of the calling instruction.
    pub fn push(&mut self, return_address: u16, pc: u16) -> Result<(), Chip8Error> {
        if self.frames.len() >= STACK_DEPTH {
            return Err(Chip8Error::StackOverflow { pc });
        }
        self.frames.push(return_address);
        Ok(())
    }

    pub fn pop(&mut self, pc: u16) -> Result<u16, Chip8Error> {
        self.frames.pop().ok_or(Chip8Error::StackUnderflow { pc })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Return addresses, oldest first.
    pub fn as_slice(&self) -> &[u16] {
        &self.frames
    }
}
