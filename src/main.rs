#[macro_use]
extern crate bitflags;

use crate::gb::cartridge::Cartridge;
use crate::gb::joypad::JoypadInput;
use crate::gb::ppu::palette::Shade;
use crate::gb::{FRAME_DURATION, GameBoy, SCREEN_HEIGHT, SCREEN_WIDTH};
use clap::Parser;
use minifb::{Key, Scale, Window, WindowOptions};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

mod gb;

/// Shades are expanded to colors only at this boundary;
/// the core framebuffer stays 2-bit.
const PALETTE: [u32; 4] = [0x00FF_FFFF, 0x00AB_ABAB, 0x0055_5555, 0x0000_0000];

#[derive(Parser)]
#[command(version, about = "Game Boy (DMG) emulator")]
struct Args {
    /// Path of the ROM to load
    rom: PathBuf,

    /// Disable audio synthesis
    #[arg(long)]
    mute: bool,

    /// Integer window upscale factor (1, 2, 4 or 8)
    #[arg(long, default_value_t = 4)]
    scale: u8,

    /// Disable the frame limiter for debugging purposes
    #[arg(long)]
    no_fps_limit: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    println!("Loading cartridge {}...", args.rom.display());
    let mut cartridge = match Cartridge::from_path(&args.rom) {
        Ok(cartridge) => cartridge,
        Err(e) => {
            eprintln!("Unable to load cartridge: {e}");
            return ExitCode::FAILURE;
        }
    };
    println!("  -> {cartridge}");

    let save_path = args.rom.with_extension("sav");
    cartridge.load_save(&save_path);

    let mut emulator = GameBoy::new(cartridge);
    emulator.bus.apu.set_synthesis(!args.mute);

    if let Err(e) = run(&mut emulator, &args) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    emulator.bus.cartridge.write_save(&save_path);
    ExitCode::SUCCESS
}

/// Drives the emulator frame by frame until the window is closed.
fn run(emulator: &mut GameBoy, args: &Args) -> Result<(), Box<dyn Error>> {
    let options = WindowOptions {
        scale: match args.scale {
            1 => Scale::X1,
            2 => Scale::X2,
            8 => Scale::X8,
            _ => Scale::X4,
        },
        ..WindowOptions::default()
    };
    let mut window = Window::new("dotmatrix", SCREEN_WIDTH, SCREEN_HEIGHT, options)?;
    let mut limiter = FrameLimiter::new();
    let mut buffer = vec![0u32; SCREEN_WIDTH * SCREEN_HEIGHT];

    while window.is_open() && !window.is_key_down(Key::Escape) {
        emulator.handle_input(read_input(&window));
        emulator.step_frame();

        // There is no audio backend; keep the queue drained
        let queued = emulator.bus.apu.queued_samples();
        emulator.bus.apu.pull_samples(queued);

        blit(emulator.frame().pixels(), &mut buffer);
        window.update_with_buffer(&buffer, SCREEN_WIDTH, SCREEN_HEIGHT)?;

        if !args.no_fps_limit {
            limiter.wait();
        }
    }
    Ok(())
}

/// Expands the 2-bit shades to host colors.
fn blit(pixels: &[Shade], buffer: &mut [u32]) {
    for (target, shade) in buffer.iter_mut().zip(pixels) {
        *target = PALETTE[u8::from(*shade) as usize];
    }
}

/// Maps the host keyboard to the eight buttons.
fn read_input(window: &Window) -> JoypadInput {
    JoypadInput {
        a: window.is_key_down(Key::X),
        b: window.is_key_down(Key::Z),
        select: window.is_key_down(Key::Backspace),
        start: window.is_key_down(Key::Enter),
        right: window.is_key_down(Key::Right),
        left: window.is_key_down(Key::Left),
        up: window.is_key_down(Key::Up),
        down: window.is_key_down(Key::Down),
    }
}

/// Keeps the emulation at the native ~59.73 Hz frame rate.
struct FrameLimiter {
    frame_duration: Duration,
    last_frame: Instant,
}

impl FrameLimiter {
    fn new() -> Self {
        Self {
            frame_duration: Duration::from_secs_f64(FRAME_DURATION),
            last_frame: Instant::now(),
        }
    }

    /// Blocks until the allotted frame time has passed.
    fn wait(&mut self) {
        let elapsed = self.last_frame.elapsed();
        if elapsed < self.frame_duration {
            spin_sleep::sleep(self.frame_duration - elapsed);
        }
        self.last_frame = Instant::now();
    }
}
