use std::fmt;

use super::Instruction;
use crate::u4;

/// CHIP-8 instruction opcodes.
///
/// The fields (x, y, n, nn, nnn) correspond to the operands encoded in the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// 1nnn - Jump to location nnn.
    Jump { nnn: u16 },
    /// Bnnn - Jump to location nnn + V0.
    JumpWithOffset { nnn: u16 },

    /// 2nnn - Call subroutine at nnn.
    Call { nnn: u16 },
    /// 00EE - Return from a subroutine.
    Return,

    /// 3xnn - Skip next instruction if Vx == nn.
    SkipRegEqualImm { x: u4, nn: u8 },
    /// 4xnn - Skip next instruction if Vx != nn.
    SkipRegNotEqualImm { x: u4, nn: u8 },
    /// 5xy0 - Skip next instruction if Vx == Vy.
    SkipRegEqualReg { x: u4, y: u4 },
    /// 9xy0 - Skip next instruction if Vx != Vy.
    SkipRegNotEqualReg { x: u4, y: u4 },

    /// 6xnn - Set Vx = nn.
    SetRegImm { x: u4, nn: u8 },
    /// 7xnn - Set Vx = Vx + nn, VF untouched.
    AddRegImm { x: u4, nn: u8 },
    /// Annn - Set I = nnn.
    SetIndexImm { nnn: u16 },
    /// Fx1E - Set I = I + Vx.
    AddIndexReg { x: u4 },

    /// 8xyN - ALU operations
    Alu { x: u4, y: u4, op: OpcodeAlu },
    /// Cxnn - Set Vx = random byte AND nn.
    Random { x: u4, nn: u8 },

    /// 00E0 - Clear the display.
    ClearDisplay,
    /// Dxyn - Display sprite.
    Draw { x: u4, y: u4, n: u4 },

    /// Ex9E - Skip next instruction if key with the value of Vx is pressed.
    SkipIfPressed { x: u4 },
    /// ExA1 - Skip next instruction if key with the value of Vx is not pressed.
    SkipIfNotPressed { x: u4 },
    /// Fx0A - Wait for a key press and release, store the value of the key in Vx.
    WaitForKey { x: u4 },

    /// Fx07 - Set Vx = delay timer value.
    ReadDelayTimer { x: u4 },
    /// Fx15 - Set delay timer = Vx.
    SetDelayTimer { x: u4 },
    /// Fx18 - Set sound timer = Vx.
    SetSoundTimer { x: u4 },

    /// Fx29 - Set I = location of sprite for digit Vx.
    FontChar { x: u4 },
    /// Fx33 - Store BCD representation of Vx in memory locations I, I+1, and I+2.
    Bcd { x: u4 },

    /// Fx55 - Store registers V0 through Vx in memory starting at location I.
    StoreRegs { x: u4 },
    /// Fx65 - Read registers V0 through Vx from memory starting at location I.
    LoadRegs { x: u4 },
}

/// ALU operations for the 8xyN instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeAlu {
    /// 8xy0 - Vx = Vy
    Set,
    /// 8xy1 - Vx = Vx OR Vy
    Or,
    /// 8xy2 - Vx = Vx AND Vy
    And,
    /// 8xy3 - Vx = Vx XOR Vy
    Xor,
    /// 8xy4 - Vx = Vx + Vy
    Add,
    /// 8xy5 - Vx = Vx - Vy
    Sub,
    /// 8xy6 - Vx = Vy SHR 1
    ShiftRight,
    /// 8xy7 - Vx = Vy - Vx
    SubReverse,
    /// 8xyE - Vx = Vy SHL 1
    ShiftLeft,
}

impl Opcode {
    /// Decode an instruction word into an `Opcode` with its typed operands.
    ///
    /// Returns `None` for words with no assigned meaning, including unknown
    /// sub-operations of otherwise known families.
    pub fn decode(instruction: Instruction) -> Option<Self> {
        let x = instruction.x();
        let y = instruction.y();
        let n = instruction.n();
        let nn = instruction.nn();
        let nnn = instruction.nnn();

        let opcode = match instruction.nibbles() {
            (0x0, 0x0, 0xE, 0x0) => Opcode::ClearDisplay,
            (0x0, 0x0, 0xE, 0xE) => Opcode::Return,
            (0x1, _, _, _) => Opcode::Jump { nnn },
            (0x2, _, _, _) => Opcode::Call { nnn },
            (0x3, _, _, _) => Opcode::SkipRegEqualImm { x, nn },
            (0x4, _, _, _) => Opcode::SkipRegNotEqualImm { x, nn },
            (0x5, _, _, 0x0) => Opcode::SkipRegEqualReg { x, y },
            (0x6, _, _, _) => Opcode::SetRegImm { x, nn },
            (0x7, _, _, _) => Opcode::AddRegImm { x, nn },
            (0x8, _, _, alu) => Opcode::Alu {
                x,
                y,
                op: OpcodeAlu::decode(alu)?,
            },
            (0x9, _, _, 0x0) => Opcode::SkipRegNotEqualReg { x, y },
            (0xA, _, _, _) => Opcode::SetIndexImm { nnn },
            (0xB, _, _, _) => Opcode::JumpWithOffset { nnn },
            (0xC, _, _, _) => Opcode::Random { x, nn },
            (0xD, _, _, _) => Opcode::Draw { x, y, n },
            (0xE, _, 0x9, 0xE) => Opcode::SkipIfPressed { x },
            (0xE, _, 0xA, 0x1) => Opcode::SkipIfNotPressed { x },
            (0xF, _, 0x0, 0x7) => Opcode::ReadDelayTimer { x },
            (0xF, _, 0x0, 0xA) => Opcode::WaitForKey { x },
            (0xF, _, 0x1, 0x5) => Opcode::SetDelayTimer { x },
            (0xF, _, 0x1, 0x8) => Opcode::SetSoundTimer { x },
            (0xF, _, 0x1, 0xE) => Opcode::AddIndexReg { x },
            (0xF, _, 0x2, 0x9) => Opcode::FontChar { x },
            (0xF, _, 0x3, 0x3) => Opcode::Bcd { x },
            (0xF, _, 0x5, 0x5) => Opcode::StoreRegs { x },
            (0xF, _, 0x6, 0x5) => Opcode::LoadRegs { x },

            _ => return None,
        };

        Some(opcode)
    }

    /// True if executing this opcode may assign the program counter itself,
    /// beyond the implicit advance past the instruction.
    pub fn writes_pc(&self) -> bool {
        matches!(
            self,
            Opcode::Jump { .. }
                | Opcode::JumpWithOffset { .. }
                | Opcode::Call { .. }
                | Opcode::Return
                | Opcode::SkipRegEqualImm { .. }
                | Opcode::SkipRegNotEqualImm { .. }
                | Opcode::SkipRegEqualReg { .. }
                | Opcode::SkipRegNotEqualReg { .. }
                | Opcode::SkipIfPressed { .. }
                | Opcode::SkipIfNotPressed { .. }
                | Opcode::WaitForKey { .. }
        )
    }

    /// True if executing this opcode changes the display buffer.
    pub fn touches_display(&self) -> bool {
        matches!(self, Opcode::ClearDisplay | Opcode::Draw { .. })
    }
}

impl OpcodeAlu {
    fn decode(selector: u8) -> Option<Self> {
        let op = match selector {
            0x0 => OpcodeAlu::Set,
            0x1 => OpcodeAlu::Or,
            0x2 => OpcodeAlu::And,
            0x3 => OpcodeAlu::Xor,
            0x4 => OpcodeAlu::Add,
            0x5 => OpcodeAlu::Sub,
            0x6 => OpcodeAlu::ShiftRight,
            0x7 => OpcodeAlu::SubReverse,
            0xE => OpcodeAlu::ShiftLeft,
            _ => return None,
        };
        Some(op)
    }

    fn mnemonic(self) -> &'static str {
        match self {
            OpcodeAlu::Set => "LD",
            OpcodeAlu::Or => "OR",
            OpcodeAlu::And => "AND",
            OpcodeAlu::Xor => "XOR",
            OpcodeAlu::Add => "ADD",
            OpcodeAlu::Sub => "SUB",
            OpcodeAlu::ShiftRight => "SHR",
            OpcodeAlu::SubReverse => "SUBN",
            OpcodeAlu::ShiftLeft => "SHL",
        }
    }
}

/// Conventional assembler mnemonics.
impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Opcode::ClearDisplay => write!(f, "CLS"),
            Opcode::Return => write!(f, "RET"),
            Opcode::Jump { nnn } => write!(f, "JP {nnn:#05X}"),
            Opcode::JumpWithOffset { nnn } => write!(f, "JP V0, {nnn:#05X}"),
            Opcode::Call { nnn } => write!(f, "CALL {nnn:#05X}"),
            Opcode::SkipRegEqualImm { x, nn } => write!(f, "SE V{x}, {nn:#04X}"),
            Opcode::SkipRegNotEqualImm { x, nn } => write!(f, "SNE V{x}, {nn:#04X}"),
            Opcode::SkipRegEqualReg { x, y } => write!(f, "SE V{x}, V{y}"),
            Opcode::SkipRegNotEqualReg { x, y } => write!(f, "SNE V{x}, V{y}"),
            Opcode::SetRegImm { x, nn } => write!(f, "LD V{x}, {nn:#04X}"),
            Opcode::AddRegImm { x, nn } => write!(f, "ADD V{x}, {nn:#04X}"),
            Opcode::SetIndexImm { nnn } => write!(f, "LD I, {nnn:#05X}"),
            Opcode::AddIndexReg { x } => write!(f, "ADD I, V{x}"),
            Opcode::Alu { x, y, op } => write!(f, "{} V{x}, V{y}", op.mnemonic()),
            Opcode::Random { x, nn } => write!(f, "RND V{x}, {nn:#04X}"),
            Opcode::Draw { x, y, n } => write!(f, "DRW V{x}, V{y}, {n}"),
            Opcode::SkipIfPressed { x } => write!(f, "SKP V{x}"),
            Opcode::SkipIfNotPressed { x } => write!(f, "SKNP V{x}"),
            Opcode::WaitForKey { x } => write!(f, "LD V{x}, K"),
            Opcode::ReadDelayTimer { x } => write!(f, "LD V{x}, DT"),
            Opcode::SetDelayTimer { x } => write!(f, "LD DT, V{x}"),
            Opcode::SetSoundTimer { x } => write!(f, "LD ST, V{x}"),
            Opcode::FontChar { x } => write!(f, "LD F, V{x}"),
            Opcode::Bcd { x } => write!(f, "LD B, V{x}"),
            Opcode::StoreRegs { x } => write!(f, "LD [I], V{x}"),
            Opcode::LoadRegs { x } => write!(f, "LD V{x}, [I]"),
        }
    }
}
