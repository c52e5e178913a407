use std::time::Duration;

use log::{debug, trace, warn};

use super::{Chip8, Chip8Error, Chip8Result, DisplayBuffer, ExecState};
use crate::u4;

/// Clock rates used by [`Chip8Runner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerConfig {
    /// Instructions executed per second.
    pub cpu_hz: f32,
    /// Timer decrements (and presented frames) per second.
    pub timer_hz: f32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            cpu_hz: 700.0,
            timer_hz: 60.0,
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<(), Chip8Error> {
        for (name, hz) in [("cpu", self.cpu_hz), ("timer", self.timer_hz)] {
            if !hz.is_finite() || hz <= 0.0 {
                return Err(Chip8Error::InvalidClock { name, hz });
            }
        }
        self.frame_time().map(|_| ())
    }

    /// Wall-clock length of one timer tick.
    pub fn frame_time(&self) -> Result<Duration, Chip8Error> {
        Duration::try_from_secs_f32(self.timer_time_step()).map_err(|_| Chip8Error::InvalidClock {
            name: "timer",
            hz: self.timer_hz,
        })
    }

    fn cpu_time_step(&self) -> f32 {
        1.0 / self.cpu_hz
    }

    fn timer_time_step(&self) -> f32 {
        1.0 / self.timer_hz
    }

    /// CPU cycles that fit in one timer tick, at least one.
    pub fn cycles_per_frame(&self) -> u32 {
        ((self.cpu_hz / self.timer_hz).round() as u32).max(1)
    }
}

/// High-level emulator runner that manages timing internally.
pub struct Chip8Runner {
    chip8: Chip8,
    config: RunnerConfig,
    cpu_dt_accumulator: f32,
    timer_dt_accumulator: f32,
}

impl Chip8Runner {
    pub fn new(chip8: Chip8, config: RunnerConfig) -> Result<Self, Chip8Error> {
        config.validate()?;
        debug!(
            "runner: cpu {} Hz, timers {} Hz, {} cycles per frame",
            config.cpu_hz,
            config.timer_hz,
            config.cycles_per_frame()
        );

        Ok(Self {
            chip8,
            config,
            cpu_dt_accumulator: 0.0,
            timer_dt_accumulator: 0.0,
        })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Update emulator by delta time, handles both CPU and timer cycles.
    ///
    /// Runs as many CPU cycles and timer updates as needed based on the elapsed time `dt`.
    /// Returns early if a frame has to be rendered before the next CPU cycle.
    pub fn update(&mut self, dt: f32) -> Result<Chip8Result, Chip8Error> {
        self.cpu_dt_accumulator += dt;
        self.timer_dt_accumulator += dt;

        let timer_step = self.config.timer_time_step();
        while self.timer_dt_accumulator >= timer_step {
            self.timer_dt_accumulator -= timer_step;
            self.chip8.timers_cycle();
        }

        let cpu_step = self.config.cpu_time_step();
        let mut executed = 0u32;
        while self.cpu_dt_accumulator >= cpu_step {
            self.cpu_dt_accumulator -= cpu_step;
            executed += 1;

            match self.cycle()? {
                Chip8Result::WaitForNextFrame => {
                    // If we need to wait for the next frame we stop executing cycles.
                    // We clear the accumulator to avoid "catching up" in the next frame.
                    self.cpu_dt_accumulator = 0.0;
                    trace!("update: {executed} cycles, frame ready");
                    return Ok(Chip8Result::WaitForNextFrame);
                }
                Chip8Result::Continue => {}
            }
        }

        trace!("update: {executed} cycles");
        Ok(Chip8Result::Continue)
    }

    /// Runs one fixed frame: up to `cycles_per_frame` instructions, stopping
    /// early when the display needs presenting, then one timer tick.
    pub fn run_frame(&mut self) -> Result<Chip8Result, Chip8Error> {
        let mut result = Chip8Result::Continue;
        let mut executed = 0u32;

        for _ in 0..self.config.cycles_per_frame() {
            executed += 1;
            result = self.cycle()?;
            if result == Chip8Result::WaitForNextFrame {
                break;
            }
        }

        self.chip8.timers_cycle();
        trace!("frame: {executed} cycles, pc {:#06X}", self.chip8.pc());
        Ok(result)
    }

    fn cycle(&mut self) -> Result<Chip8Result, Chip8Error> {
        self.chip8.cpu_cycle().inspect_err(|err| {
            if !matches!(err, Chip8Error::NotRunning { .. }) {
                warn!("halted: {err}");
            }
        })
    }

    /// Stops the interpreter before its next instruction.
    pub fn stop(&mut self) {
        debug!("stop requested at {:#06X}", self.chip8.pc());
        self.chip8.stop();
    }

    pub fn is_halted(&self) -> bool {
        self.chip8.state() == ExecState::Halted
    }

    /// Returns true if the sound timer is active, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.chip8.should_beep()
    }

    /// Set the state of a key on the keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.chip8.set_key(key, pressed)
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    pub fn get_display_pixel(&self, y: usize, x: usize) -> bool {
        self.chip8.get_display_pixel(y, x)
    }

    pub fn display(&self) -> &DisplayBuffer {
        self.chip8.display()
    }

    pub fn chip8_ref(&self) -> &Chip8 {
        &self.chip8
    }

    pub fn chip8_mut(&mut self) -> &mut Chip8 {
        &mut self.chip8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(rom: &[u8], config: RunnerConfig) -> Chip8Runner {
        let mut chip8 = Chip8::with_seed(1);
        chip8.load(rom).unwrap();
        Chip8Runner::new(chip8, config).unwrap()
    }

    #[test]
    fn rejects_bad_clocks() {
        let config = RunnerConfig {
            cpu_hz: 0.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(Chip8Error::InvalidClock {
                name: "cpu",
                hz: 0.0
            })
        );

        let config = RunnerConfig {
            timer_hz: f32::NAN,
            ..Default::default()
        };
        assert!(Chip8Runner::new(Chip8::with_seed(0), config).is_err());
    }

    #[test]
    fn rejects_timer_rate_without_representable_frame() {
        let config = RunnerConfig {
            timer_hz: 1e-20,
            ..Default::default()
        };
        assert_eq!(
            config.frame_time(),
            Err(Chip8Error::InvalidClock {
                name: "timer",
                hz: 1e-20
            })
        );
        assert!(Chip8Runner::new(Chip8::with_seed(0), config).is_err());
        assert_eq!(
            RunnerConfig::default().frame_time(),
            Ok(Duration::from_secs_f32(1.0 / 60.0))
        );
    }

    #[test]
    fn cycles_per_frame_rounds() {
        assert_eq!(RunnerConfig::default().cycles_per_frame(), 12);
        let slow = RunnerConfig {
            cpu_hz: 10.0,
            timer_hz: 60.0,
        };
        assert_eq!(slow.cycles_per_frame(), 1);
    }

    #[test]
    fn run_frame_executes_a_batch_and_ticks_timers() {
        // LD V0, 60; LD DT, V0; then ADD V1, 1 forever.
        let rom = [0x60, 0x3C, 0xF0, 0x15, 0x71, 0x01, 0x12, 0x04];
        let mut runner = runner(&rom, RunnerConfig::default());
        assert_eq!(runner.run_frame(), Ok(Chip8Result::Continue));
        assert_eq!(runner.chip8_ref().delay_timer(), 59);
        // 12 cycles: two setup instructions, then five ADD/JP pairs.
        assert_eq!(runner.chip8_ref().v()[1], 5);
    }

    #[test]
    fn run_frame_stops_at_draw() {
        let rom = [0x60, 0x00, 0xD0, 0x01, 0x12, 0x00];
        let mut runner = runner(&rom, RunnerConfig::default());
        assert_eq!(runner.run_frame(), Ok(Chip8Result::WaitForNextFrame));
        assert_eq!(runner.chip8_ref().pc(), 0x204);
    }

    #[test]
    fn update_accumulates_time() {
        let rom = [0x71, 0x01, 0x12, 0x00];
        let config = RunnerConfig {
            cpu_hz: 100.0,
            timer_hz: 10.0,
        };
        let mut runner = runner(&rom, config);
        runner.update(0.005).unwrap();
        assert_eq!(runner.chip8_ref().v()[1], 0);
        // 0.025s total: two whole cycles.
        runner.update(0.02).unwrap();
        assert_eq!(runner.chip8_ref().v()[1], 1);
        assert_eq!(runner.chip8_ref().pc(), 0x200);
    }

    #[test]
    fn errors_stop_the_runner() {
        let mut runner = runner(&[0x00, 0xEE], RunnerConfig::default());
        assert_eq!(
            runner.run_frame(),
            Err(Chip8Error::StackUnderflow { pc: 0x200 })
        );
        assert!(runner.is_halted());
        assert!(matches!(
            runner.run_frame(),
            Err(Chip8Error::NotRunning { .. })
        ));
    }

    #[test]
    fn stop_request_is_honoured() {
        let mut runner = runner(&[0x12, 0x00], RunnerConfig::default());
        runner.run_frame().unwrap();
        runner.stop();
        assert!(runner.is_halted());
        assert!(runner.update(1.0).is_err());
    }
}
