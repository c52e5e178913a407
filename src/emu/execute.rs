use rand::Rng;

use super::{Chip8, Chip8Error, Chip8Result, DisplayBuffer, Opcode, OpcodeAlu, glyph_address};
use crate::u4;

impl Chip8 {
    /// Applies `opcode`, fetched from address `at`. The program counter has
    /// already been advanced past it.
    ///
    /// Everything that can fail is checked before any state is written.
    pub(crate) fn execute(&mut self, opcode: Opcode, at: u16) -> Result<Chip8Result, Chip8Error> {
        match opcode {
            Opcode::ClearDisplay => {
                self.display.clear();
            }
            Opcode::Jump { nnn } => {
                self.pc = nnn;
            }
            Opcode::JumpWithOffset { nnn } => {
                self.pc = nnn.wrapping_add(self.v[0].into());
            }
            Opcode::Call { nnn } => {
                self.stack.push(self.pc, at)?;
                self.pc = nnn;
            }
            Opcode::Return => {
                self.pc = self.stack.pop(at)?;
            }
            Opcode::SkipRegEqualImm { x, nn } => {
                self.skip_if(self.v[x] == nn);
            }
            Opcode::SkipRegNotEqualImm { x, nn } => {
                self.skip_if(self.v[x] != nn);
            }
            Opcode::SkipRegEqualReg { x, y } => {
                self.skip_if(self.v[x] == self.v[y]);
            }
            Opcode::SkipRegNotEqualReg { x, y } => {
                self.skip_if(self.v[x] != self.v[y]);
            }
            Opcode::SetRegImm { x, nn } => {
                self.v[x] = nn;
            }
            Opcode::AddRegImm { x, nn } => {
                self.v[x] = self.v[x].wrapping_add(nn);
            }
            Opcode::Alu { x, y, op } => {
                self.execute_alu(x, y, op);
            }
            Opcode::Random { x, nn } => {
                let rand_byte: u8 = self.rng.random();
                self.v[x] = rand_byte & nn;
            }
            Opcode::SetIndexImm { nnn } => {
                self.i = nnn;
            }
            Opcode::AddIndexReg { x } => {
                self.i = self.i.wrapping_add(self.v[x].into());
            }
            Opcode::Draw { x, y, n } => {
                self.execute_draw(x, y, n, at)?;
            }
            Opcode::SkipIfPressed { x } => {
                self.skip_if(self.keypad.is_pressed(self.v[x]));
            }
            Opcode::SkipIfNotPressed { x } => {
                self.skip_if(!self.keypad.is_pressed(self.v[x]));
            }
            Opcode::WaitForKey { x } => {
                return Ok(self.execute_wait_for_key(x));
            }
            Opcode::ReadDelayTimer { x } => {
                self.v[x] = self.delay_timer;
            }
            Opcode::SetDelayTimer { x } => {
                self.delay_timer = self.v[x];
            }
            Opcode::SetSoundTimer { x } => {
                self.sound_timer = self.v[x];
            }
            Opcode::FontChar { x } => {
                self.i = glyph_address(self.v[x]);
            }
            Opcode::Bcd { x } => {
                let value = self.v[x];
                let digits = self.memory.slice_mut(self.i as usize, 3, at)?;
                digits.copy_from_slice(&[value / 100, (value / 10) % 10, value % 10]);
            }
            Opcode::StoreRegs { x } => {
                let count = usize::from(x) + 1;
                let dst = self.memory.slice_mut(self.i as usize, count, at)?;
                dst.copy_from_slice(&self.v[..count]);
                self.i = self.i.wrapping_add(count as u16);
            }
            Opcode::LoadRegs { x } => {
                let count = usize::from(x) + 1;
                let src = self.memory.slice(self.i as usize, count, at)?;
                self.v[..count].copy_from_slice(src);
                self.i = self.i.wrapping_add(count as u16);
            }
        };

        if opcode.touches_display() {
            return Ok(Chip8Result::WaitForNextFrame);
        }
        Ok(Chip8Result::Continue)
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    fn execute_alu(&mut self, x: u4, y: u4, op: OpcodeAlu) {
        match op {
            OpcodeAlu::Set => self.v[x] = self.v[y],
            OpcodeAlu::Or => {
                self.v[x] |= self.v[y];
                self.v[0xF] = 0;
            }
            OpcodeAlu::And => {
                self.v[x] &= self.v[y];
                self.v[0xF] = 0;
            }
            OpcodeAlu::Xor => {
                self.v[x] ^= self.v[y];
                self.v[0xF] = 0;
            }
            OpcodeAlu::Add => {
                let (res, overflow) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = res;
                self.v[0xF] = overflow as u8;
            }
            OpcodeAlu::Sub => {
                let (res, borrow) = self.v[x].overflowing_sub(self.v[y]);
                self.v[x] = res;
                self.v[0xF] = !borrow as u8; // Notice that borrow is inverted
            }
            OpcodeAlu::SubReverse => {
                let (res, borrow) = self.v[y].overflowing_sub(self.v[x]);
                self.v[x] = res;
                self.v[0xF] = !borrow as u8;
            }
            OpcodeAlu::ShiftRight => {
                let lsb = self.v[y] & 1;
                self.v[x] = self.v[y] >> 1;
                self.v[0xF] = lsb;
            }
            OpcodeAlu::ShiftLeft => {
                let msb = (self.v[y] >> 7) & 1;
                self.v[x] = self.v[y] << 1;
                self.v[0xF] = msb;
            }
        }
    }

    /// VF is cleared before the origin registers are read, so drawing with
    /// X or Y = F starts from coordinate 0.
    fn execute_draw(&mut self, x: u4, y: u4, n: u4, at: u16) -> Result<(), Chip8Error> {
        let origin = |reg: u4| if reg == u4::MAX { 0 } else { self.v[reg] };
        let x_pos = origin(x);
        let y_pos = origin(y);

        // Rows clipped at the bottom edge are never read.
        let rows = DisplayBuffer::visible_rows(y_pos, usize::from(n));
        let sprite = self.memory.slice(self.i as usize, rows, at)?;

        let any_erased = self.display.draw_sprite(x_pos, y_pos, sprite);
        self.v[0xF] = any_erased as u8;

        Ok(())
    }

    fn execute_wait_for_key(&mut self, x: u4) -> Chip8Result {
        if let Some(key) = self.wait_release_key
            && !self.keypad.is_pressed(key)
        {
            // The key we were waiting for has been released
            self.v[x] = key;
            self.wait_release_key = None;
            return Chip8Result::Continue;
        }

        if self.wait_release_key.is_none() {
            // Not waiting for a key release yet, check all keys
            self.wait_release_key = self.keypad.first_pressed();
        }

        // Repeat this instruction until a key is released
        self.pc = self.pc.wrapping_sub(2);
        Chip8Result::WaitForNextFrame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emu::{ExecState, MEMORY_SIZE};

    fn running(rom: &[u8]) -> Chip8 {
        let mut chip8 = Chip8::with_seed(0x5EED);
        chip8.load(rom).unwrap();
        chip8
    }

    fn run(chip8: &mut Chip8, cycles: usize) {
        for _ in 0..cycles {
            chip8.cpu_cycle().unwrap();
        }
    }

    #[test]
    fn op_00e0() {
        let mut chip8 = running(&[0x00, 0xE0]);
        chip8.display.draw_sprite(0, 0, &[0xFF; 8]);
        assert_eq!(chip8.cpu_cycle(), Ok(Chip8Result::WaitForNextFrame));
        assert_eq!(chip8.display().lit_count(), 0);
        assert_eq!(chip8.pc(), 0x202);
    }

    #[test]
    fn only_display_opcodes_end_the_frame() {
        // LD V0, 1; CLS; DRW V0, V0, 0; ADD V0, 1
        let mut chip8 = running(&[0x60, 0x01, 0x00, 0xE0, 0xD0, 0x00, 0x70, 0x01]);
        assert_eq!(chip8.cpu_cycle(), Ok(Chip8Result::Continue));
        assert_eq!(chip8.cpu_cycle(), Ok(Chip8Result::WaitForNextFrame));
        assert_eq!(chip8.cpu_cycle(), Ok(Chip8Result::WaitForNextFrame));
        assert_eq!(chip8.cpu_cycle(), Ok(Chip8Result::Continue));
    }

    #[test]
    fn op_1nnn() {
        let mut chip8 = running(&[0x1A, 0x5E]);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc(), 0x0A5E);
    }

    #[test]
    fn op_2nnn_and_00ee() {
        // 0x200: CALL 0x206; 0x202: LD V1, 2; 0x204: JP 0x204; 0x206: LD V0, 1; RET
        let mut chip8 = running(&[0x22, 0x06, 0x61, 0x02, 0x12, 0x04, 0x60, 0x01, 0x00, 0xEE]);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc(), 0x206);
        assert_eq!(chip8.stack(), &[0x202]);
        run(&mut chip8, 2);
        assert_eq!(chip8.pc(), 0x202);
        assert!(chip8.stack().is_empty());
        run(&mut chip8, 1);
        assert_eq!(chip8.v()[0..2], [1, 2]);
    }

    #[test]
    fn op_00ee_underflow() {
        let mut chip8 = running(&[0x00, 0xEE]);
        assert_eq!(
            chip8.cpu_cycle(),
            Err(Chip8Error::StackUnderflow { pc: 0x200 })
        );
        assert_eq!(chip8.pc(), 0x200);
        assert_eq!(chip8.state(), ExecState::Halted);
    }

    #[test]
    fn op_2nnn_overflow() {
        // Calls itself forever.
        let mut chip8 = running(&[0x22, 0x00]);
        run(&mut chip8, 16);
        assert_eq!(
            chip8.cpu_cycle(),
            Err(Chip8Error::StackOverflow { pc: 0x200 })
        );
        assert_eq!(chip8.stack().len(), 16);
    }

    #[test]
    fn op_3xnn_4xnn() {
        let mut chip8 = running(&[0x30, 0x00, 0x00, 0x00, 0x40, 0x00, 0x41, 0x00]);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc(), 0x204);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc(), 0x206);
        chip8.v[1] = 3;
        run(&mut chip8, 1);
        assert_eq!(chip8.pc(), 0x20A);
    }

    #[test]
    fn op_5xy0_9xy0() {
        let mut chip8 = running(&[0x50, 0x10, 0x00, 0x00, 0x90, 0x10]);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc(), 0x204);
        chip8.v[1] = 9;
        run(&mut chip8, 1);
        assert_eq!(chip8.pc(), 0x208);
    }

    #[test]
    fn op_6xnn() {
        let mut chip8 = running(&[0x6C, 0xAB]);
        run(&mut chip8, 1);
        assert_eq!(chip8.v()[0xC], 0xAB);
    }

    #[test]
    fn op_7xnn_wraps_without_flag() {
        let mut chip8 = running(&[0x73, 0x0A]);
        chip8.v[3] = 250;
        chip8.v[0xF] = 0x42;
        run(&mut chip8, 1);
        assert_eq!(chip8.v()[3], 4);
        assert_eq!(chip8.v()[0xF], 0x42);
    }

    #[test]
    fn op_8xy_logic_resets_flag() {
        let mut chip8 = running(&[0x80, 0x11, 0x82, 0x32, 0x84, 0x53]);
        chip8.v = [0xF0, 0x0F, 0xFC, 0x3F, 0xAA, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
        run(&mut chip8, 3);
        assert_eq!(chip8.v()[0], 0xFF);
        assert_eq!(chip8.v()[2], 0x3C);
        assert_eq!(chip8.v()[4], 0x55);
        assert_eq!(chip8.v()[0xF], 0);
    }

    #[test]
    fn op_8xy4_carry() {
        let mut chip8 = running(&[0x80, 0x14, 0x80, 0x14]);
        chip8.v[0] = 200;
        chip8.v[1] = 100;
        run(&mut chip8, 1);
        assert_eq!(chip8.v()[0], 44);
        assert_eq!(chip8.v()[0xF], 1);
        run(&mut chip8, 1);
        assert_eq!(chip8.v()[0], 144);
        assert_eq!(chip8.v()[0xF], 0);
    }

    #[test]
    fn op_8xy5_8xy7_borrow() {
        let mut chip8 = running(&[0x80, 0x15, 0x82, 0x37]);
        chip8.v[0] = 10;
        chip8.v[1] = 3;
        chip8.v[2] = 10;
        chip8.v[3] = 3;
        run(&mut chip8, 1);
        assert_eq!(chip8.v()[0], 7);
        assert_eq!(chip8.v()[0xF], 1);
        run(&mut chip8, 1);
        assert_eq!(chip8.v()[2], 3u8.wrapping_sub(10));
        assert_eq!(chip8.v()[0xF], 0);
    }

    #[test]
    fn op_8xy6_8xye_shift_vy() {
        let mut chip8 = running(&[0x80, 0x16, 0x82, 0x1E]);
        chip8.v[1] = 0b1000_0011;
        run(&mut chip8, 1);
        assert_eq!(chip8.v()[0], 0b0100_0001);
        assert_eq!(chip8.v()[0xF], 1);
        run(&mut chip8, 1);
        assert_eq!(chip8.v()[2], 0b0000_0110);
        assert_eq!(chip8.v()[0xF], 1);
    }

    #[test]
    fn flag_register_as_destination_holds_flag() {
        let mut chip8 = running(&[0x8F, 0x14]);
        chip8.v[0xF] = 0xFF;
        chip8.v[1] = 1;
        run(&mut chip8, 1);
        assert_eq!(chip8.v()[0xF], 1);
    }

    #[test]
    fn op_annn_bnnn() {
        let mut chip8 = running(&[0xA1, 0x23, 0xB3, 0x00]);
        chip8.v[0] = 0x10;
        run(&mut chip8, 1);
        assert_eq!(chip8.index(), 0x123);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc(), 0x310);
    }

    #[test]
    fn op_cxnn_is_masked_and_seeded() {
        let rom = [0xC0, 0x0F, 0xC1, 0xFF];
        let mut a = running(&rom);
        let mut b = running(&rom);
        run(&mut a, 2);
        run(&mut b, 2);
        assert_eq!(a.v()[0] & 0xF0, 0);
        assert_eq!(a.v()[0..2], b.v()[0..2]);
    }

    #[test]
    fn op_dxyn_collision() {
        // LD I, 0x208; DRW V0, V0, 1; DRW V0, V0, 1; padding; sprite 0xFF
        let mut chip8 = running(&[0xA2, 0x08, 0xD0, 0x01, 0xD0, 0x01, 0x00, 0x00, 0xFF]);
        chip8.v[0] = 0;
        run(&mut chip8, 2);
        assert_eq!(chip8.v()[0xF], 0);
        assert_eq!(chip8.display().lit_count(), 8);
        run(&mut chip8, 1);
        assert_eq!(chip8.v()[0xF], 1);
        assert_eq!(chip8.display().lit_count(), 0);
    }

    #[test]
    fn op_dxyn_clears_flag_before_reading_origin() {
        let mut chip8 = running(&[0xDF, 0x01, 0xD0, 0xF1]);
        chip8.i = 0x050;
        chip8.v[0] = 20;
        chip8.v[0xF] = 5;
        run(&mut chip8, 1);
        // Glyph "0" top row is 0xF0, drawn from x = 0 rather than the old VF.
        let row: Vec<usize> = (0..64).filter(|&x| chip8.get_display_pixel(20, x)).collect();
        assert_eq!(row, vec![0, 1, 2, 3]);
        assert_eq!(chip8.v()[0xF], 0);

        chip8.v[0xF] = 7;
        run(&mut chip8, 1);
        // Y = F also reads as 0.
        let row: Vec<usize> = (0..64).filter(|&x| chip8.get_display_pixel(0, x)).collect();
        assert_eq!(row, vec![20, 21, 22, 23]);
        assert_eq!(chip8.v()[0xF], 0);
    }

    #[test]
    fn op_dxyn_out_of_bounds_sprite_is_atomic() {
        let mut chip8 = running(&[0xD0, 0x02]);
        chip8.i = (MEMORY_SIZE - 1) as u16;
        chip8.v[0xF] = 9;
        assert_eq!(
            chip8.cpu_cycle(),
            Err(Chip8Error::OutOfBoundsAccess {
                address: MEMORY_SIZE,
                pc: 0x200
            })
        );
        assert_eq!(chip8.display().lit_count(), 0);
        assert_eq!(chip8.v()[0xF], 9);
        assert_eq!(chip8.pc(), 0x200);
    }

    #[test]
    fn op_dxyn_skips_rows_below_screen() {
        // Only the first row is visible, so the unreadable second row is ignored.
        let mut chip8 = running(&[0xD0, 0x12]);
        chip8.v[1] = 31;
        chip8.i = (MEMORY_SIZE - 1) as u16;
        assert_eq!(chip8.cpu_cycle(), Ok(Chip8Result::WaitForNextFrame));
    }

    #[test]
    fn op_ex9e_exa1() {
        let mut chip8 = running(&[0xE0, 0x9E, 0x00, 0x00, 0xE0, 0xA1, 0xE0, 0xA1]);
        chip8.v[0] = 0x7;
        chip8.set_key(u4::new(0x7), true);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc(), 0x204);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc(), 0x206);
        chip8.set_key(u4::new(0x7), false);
        run(&mut chip8, 1);
        assert_eq!(chip8.pc(), 0x20A);
    }

    #[test]
    fn op_fx0a_waits_for_release() {
        let mut chip8 = running(&[0xF3, 0x0A]);
        assert_eq!(chip8.cpu_cycle(), Ok(Chip8Result::WaitForNextFrame));
        assert_eq!(chip8.pc(), 0x200);

        chip8.set_key(u4::new(0xB), true);
        assert_eq!(chip8.cpu_cycle(), Ok(Chip8Result::WaitForNextFrame));
        assert_eq!(chip8.pc(), 0x200);

        chip8.set_key(u4::new(0xB), false);
        assert_eq!(chip8.cpu_cycle(), Ok(Chip8Result::Continue));
        assert_eq!(chip8.v()[3], 0xB);
        assert_eq!(chip8.pc(), 0x202);
    }

    #[test]
    fn op_fx07_fx15_fx18() {
        let mut chip8 = running(&[0xF0, 0x15, 0xF0, 0x18, 0xF1, 0x07]);
        chip8.v[0] = 30;
        run(&mut chip8, 2);
        assert_eq!(chip8.delay_timer(), 30);
        assert_eq!(chip8.sound_timer(), 30);
        chip8.timers_cycle();
        run(&mut chip8, 1);
        assert_eq!(chip8.v()[1], 29);
    }

    #[test]
    fn op_fx1e_fx29() {
        let mut chip8 = running(&[0xF0, 0x1E, 0xF1, 0x29]);
        chip8.i = 0x100;
        chip8.v[0] = 0x20;
        chip8.v[1] = 0x1A;
        run(&mut chip8, 1);
        assert_eq!(chip8.index(), 0x120);
        run(&mut chip8, 1);
        assert_eq!(chip8.index(), 0x050 + 0xA * 5);
    }

    #[test]
    fn op_fx33() {
        let mut chip8 = running(&[0xF0, 0x33]);
        chip8.v[0] = 254;
        chip8.i = 0x300;
        run(&mut chip8, 1);
        assert_eq!(chip8.memory().slice(0x300, 3, 0).unwrap(), &[2, 5, 4]);
        assert_eq!(chip8.index(), 0x300);
    }

    #[test]
    fn op_fx33_near_end_is_atomic() {
        let mut chip8 = running(&[0xF0, 0x33]);
        chip8.v[0] = 123;
        chip8.i = (MEMORY_SIZE - 2) as u16;
        assert!(chip8.cpu_cycle().is_err());
        assert_eq!(chip8.memory().as_slice()[MEMORY_SIZE - 2..], [0, 0]);
    }

    #[test]
    fn op_fx55_fx65() {
        let mut chip8 = running(&[0xF2, 0x55, 0xA3, 0x00, 0xF2, 0x65]);
        chip8.v[0..3].copy_from_slice(&[7, 8, 9]);
        chip8.i = 0x300;
        run(&mut chip8, 1);
        assert_eq!(chip8.memory().slice(0x300, 3, 0).unwrap(), &[7, 8, 9]);
        assert_eq!(chip8.index(), 0x303);

        chip8.v = [0; 16];
        run(&mut chip8, 2);
        assert_eq!(chip8.v()[0..4], [7, 8, 9, 0]);
        assert_eq!(chip8.index(), 0x303);
    }
}
