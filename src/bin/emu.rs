use std::{
    path::PathBuf,
    thread,
    time::Instant,
};

use anyhow::Context;
use clap::Parser;
use clap_num::maybe_hex;
use log::{LevelFilter, info};

use chip8_interp::emu::{Chip8, Chip8Runner, MAX_ROM_SIZE, RunnerConfig};

/// Headless CHIP-8 interpreter.
///
/// Runs a ROM frame by frame and prints the final screen as text.
/// Set RUST_LOG=debug or RUST_LOG=trace for execution logs.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Path to the CHIP-8 ROM file
    rom_path: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = 700.0)]
    cpu_hz: f32,

    /// Timer and frame rate
    #[arg(long, default_value_t = 60.0)]
    timer_hz: f32,

    /// Number of frames to run, 0 runs until the program halts
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Seed for the random number instruction (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = maybe_hex::<u64>)]
    seed: Option<u64>,

    /// Pace frames against the wall clock instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Don't print the screen on exit
    #[arg(long)]
    no_display: bool,
}

fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .env()
        .init()
        .context("Failed to initialize logger")?;

    let args = Args::parse();

    let rom = std::fs::read(&args.rom_path).context("Failed to read ROM file")?;
    info!(
        "loaded {} ({} of {MAX_ROM_SIZE} bytes)",
        args.rom_path.display(),
        rom.len()
    );

    let mut chip8 = match args.seed {
        Some(seed) => Chip8::with_seed(seed),
        None => Chip8::new(),
    };
    chip8
        .load(&rom)
        .context("Failed to load ROM into CHIP-8 memory")?;

    let config = RunnerConfig {
        cpu_hz: args.cpu_hz,
        timer_hz: args.timer_hz,
    };
    let mut runner = Chip8Runner::new(chip8, config).context("Invalid clock configuration")?;

    let result = run(&mut runner, &args);

    if !args.no_display {
        print!("{}", runner.display());
    }

    result.context("Chip8 Execution error")
}

fn run(runner: &mut Chip8Runner, args: &Args) -> anyhow::Result<()> {
    let frame_time = runner
        .config()
        .frame_time()
        .context("Invalid timer rate")?;
    let mut frame = 0u64;

    while args.frames == 0 || frame < args.frames {
        let started = Instant::now();
        runner.run_frame()?;
        frame += 1;

        if args.realtime
            && let Some(remaining) = frame_time.checked_sub(started.elapsed())
        {
            thread::sleep(remaining);
        }
    }

    info!("stopped after {frame} frames at {:#06X}", runner.chip8_ref().pc());
    runner.stop();
    Ok(())
}
