use crate::gb::bus::MemoryBus;
use crate::gb::cartridge::Cartridge;
use crate::gb::cpu::Cpu;
use crate::gb::joypad::JoypadInput;
use crate::gb::ppu::buffer::FrameBuffer;
use thiserror::Error;

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod constants;
pub mod cpu;
pub mod interrupt;
pub mod joypad;
pub mod ppu;
pub mod timer;
pub mod utils;

#[cfg(test)]
mod tests;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

/// The last scanline; LY 144..=153 form the vertical blanking period.
pub const VBLANK_SCANLINE_MAX: u8 = 153;

pub const CPU_CLOCK_SPEED: u32 = 4_194_304;

/// One frame is 154 scanlines of 456 T-cycles each.
pub const CYCLES_PER_FRAME: u32 = 70_224;

/// The native frame duration in seconds (~59.73 Hz).
pub const FRAME_DURATION: f64 = CYCLES_PER_FRAME as f64 / CPU_CLOCK_SPEED as f64;

/// This trait defines a common interface for everything
/// that is attached to the memory bus.
pub trait BusDevice {
    fn write(&mut self, address: u16, value: u8);
    fn read(&mut self, address: u16) -> u8;

    /// Reads a little-endian word starting at `address`.
    #[inline]
    fn read_word(&mut self, address: u16) -> u16 {
        u16::from(self.read(address)) | (u16::from(self.read(address.wrapping_add(1))) << 8)
    }

    /// Writes a little-endian word starting at `address`.
    #[inline]
    fn write_word(&mut self, address: u16, value: u16) {
        self.write(address, value as u8);
        self.write(address.wrapping_add(1), (value >> 8) as u8);
    }
}

#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("unable to read ROM image: {0}")]
    Rom(#[from] std::io::Error),
    #[error("ROM image is too small to contain a cartridge header")]
    HeaderTooSmall,
    #[error("unsupported cartridge type: {0:#04x}")]
    UnsupportedCartType(u8),
    #[error("unsupported ROM size code: {0:#04x}")]
    UnsupportedRomSize(u8),
    #[error("unsupported RAM size code: {0:#04x}")]
    UnsupportedRamSize(u8),
}

pub type EmulatorResult<T> = Result<T, EmulatorError>;

/// Ties all processing units together and drives them
/// with a fetch-execute-advance loop.
pub struct GameBoy {
    pub cpu: Cpu,
    pub bus: MemoryBus,
}

impl GameBoy {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            cpu: Cpu::power_on(),
            bus: MemoryBus::with_cartridge(cartridge),
        }
    }

    /// Executes a single instruction, advances all other units by the
    /// elapsed cycles and dispatches pending interrupts afterwards.
    /// Returns the total number of elapsed T-cycles.
    pub fn step(&mut self) -> u32 {
        let cycles = self.cpu.step(&mut self.bus);
        self.bus.step(cycles);
        // The interrupt poll has to happen after the other units were
        // stepped, so an interrupt raised during those cycles is visible
        // to the next fetch.
        let dispatch = interrupt::handle(&mut self.cpu, &mut self.bus);
        if dispatch > 0 {
            self.bus.step(dispatch);
        }
        u32::from(cycles) + u32::from(dispatch)
    }

    /// Emulates one full frame worth of cycles.
    pub fn step_frame(&mut self) {
        let mut cycles = 0;
        while cycles < CYCLES_PER_FRAME {
            cycles += self.step();
        }
    }

    /// Returns the current screen contents.
    #[inline]
    pub fn frame(&self) -> &FrameBuffer {
        self.bus.ppu.frame()
    }

    /// Latches a new joypad state.
    #[inline]
    pub fn handle_input(&mut self, input: JoypadInput) {
        self.bus.handle_joypad_event(input);
    }

    /// Resets all units to their power-on state. The cartridge
    /// (including its RAM contents) survives the reset.
    pub fn reset(&mut self) {
        let cartridge = self.bus.cartridge.clone();
        self.cpu = Cpu::power_on();
        self.bus = MemoryBus::with_cartridge(cartridge);
    }
}
