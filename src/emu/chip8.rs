use rand::{SeedableRng, rngs::StdRng};

use super::{
    CallStack, Chip8Error, Chip8Result, DisplayBuffer, ExecState, Instruction, Keypad, Memory,
    Opcode, ROM_START_ADDRESS,
};
use crate::u4;

/// CHIP-8 virtual machine state
pub struct Chip8 {
    /// 4KB memory, font at 0x050 and program at 0x200
    pub(crate) memory: Memory,
    /// Display buffer: 64x32 monochrome pixels
    pub(crate) display: DisplayBuffer,

    /// Program counter: address of the next instruction to execute
    pub(crate) pc: u16,
    /// Index register: used for memory operations
    pub(crate) i: u16,
    /// General-purpose registers V0-VF (VF is used as a flag register)
    pub(crate) v: [u8; 16],
    /// Call stack for subroutine returns
    pub(crate) stack: CallStack,

    /// Delay timer: decrements at 60Hz until it reaches 0
    pub(crate) delay_timer: u8,
    /// Sound timer: decrements at 60Hz, beeps while non-zero
    pub(crate) sound_timer: u8,

    /// Tracks which key is waiting to be released for the FX0A instruction
    pub(crate) wait_release_key: Option<u8>,
    pub(crate) keypad: Keypad,

    /// Source for the CXNN instruction
    pub(crate) rng: StdRng,
    pub(crate) state: ExecState,
}

impl Chip8 {
    /// A machine with no program loaded, seeded from the OS.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// A machine whose random numbers are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Chip8 {
            memory: Memory::new(),
            display: DisplayBuffer::new(),
            pc: ROM_START_ADDRESS as u16,
            i: 0,
            v: [0; 16],
            stack: CallStack::new(),
            delay_timer: 0,
            sound_timer: 0,
            wait_release_key: None,
            keypad: Keypad::new(),
            rng,
            state: ExecState::Ready,
        }
    }

    /// Loads a ROM into freshly initialized memory and starts running it.
    ///
    /// Any previous program state is discarded. On error the machine is left
    /// exactly as it was.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        let mut memory = Memory::new();
        memory.load_rom(rom)?;

        self.memory = memory;
        self.display = DisplayBuffer::new();
        self.pc = ROM_START_ADDRESS as u16;
        self.i = 0;
        self.v = [0; 16];
        self.stack = CallStack::new();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.wait_release_key = None;
        self.state = ExecState::Running;

        Ok(())
    }

    /// Executes a single CPU cycle (fetch, decode, execute).
    ///
    /// A cycle either applies completely or not at all: on error the program
    /// counter still points at the failing instruction and the machine halts.
    pub fn cpu_cycle(&mut self) -> Result<Chip8Result, Chip8Error> {
        if self.state != ExecState::Running {
            return Err(Chip8Error::NotRunning {
                state: self.state,
                pc: self.pc,
            });
        }

        let pc = self.pc;
        self.step(pc).inspect_err(|_| {
            self.pc = pc;
            self.state = ExecState::Halted;
        })
    }

    fn step(&mut self, pc: u16) -> Result<Chip8Result, Chip8Error> {
        let instruction = self.fetch()?;
        let opcode = Opcode::decode(instruction).ok_or(Chip8Error::UnknownOpcode {
            opcode: instruction.raw(),
            pc,
        })?;

        self.pc = self.pc.wrapping_add(2);
        self.execute(opcode, pc)
    }

    /// Fetches the next 16-bit instruction from memory.
    fn fetch(&self) -> Result<Instruction, Chip8Error> {
        self.memory.fetch_word(self.pc).map(Instruction)
    }

    /// Requests a halt; takes effect before the next instruction.
    pub fn stop(&mut self) {
        self.state = ExecState::Halted;
    }

    /// Updates the delay and sound timers. Should be called at 60Hz.
    pub fn timers_cycle(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Returns true if the sound timer is greater than zero, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.sound_timer > 0
    }

    /// Set the state of a key on the keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.keypad.set_key(key, pressed);
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    pub fn get_display_pixel(&self, y: usize, x: usize) -> bool {
        self.display.pixel(x, y)
    }

    pub fn display(&self) -> &DisplayBuffer {
        &self.display
    }

    /// Checks and clears the display's redraw flag.
    pub fn take_redraw(&mut self) -> bool {
        self.display.take_dirty()
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn v(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn stack(&self) -> &[u16] {
        self.stack.as_slice()
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
