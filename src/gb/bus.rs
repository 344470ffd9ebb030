use crate::gb::apu::Apu;
use crate::gb::cartridge::Cartridge;
use crate::gb::constants::*;
use crate::gb::interrupt::InterruptFlags;
use crate::gb::joypad::{Joypad, JoypadInput};
use crate::gb::ppu::Ppu;
use crate::gb::timer::Timer;
use crate::gb::BusDevice;

/// Defines the global memory bus; all processing units are owned by it
/// and all memory access is dispatched through it.
pub struct MemoryBus {
    pub cartridge: Cartridge,
    pub ppu: Ppu,
    pub apu: Apu,
    pub joypad: Joypad,
    pub timer: Timer,
    pub interrupt_enable: InterruptFlags,
    pub interrupt_flag: InterruptFlags,
    wram: Box<[u8; WRAM_SIZE]>,
    hram: [u8; HRAM_SIZE],
}

impl MemoryBus {
    pub fn with_cartridge(cartridge: Cartridge) -> Self {
        Self {
            cartridge,
            ppu: Ppu::default(),
            apu: Apu::default(),
            joypad: Joypad::default(),
            timer: Timer::default(),
            interrupt_enable: InterruptFlags::empty(),
            interrupt_flag: InterruptFlags::empty(),
            wram: Box::new([0; WRAM_SIZE]),
            hram: [0; HRAM_SIZE],
        }
    }

    /// Advances the PPU, timer and APU by the given number of T-cycles.
    pub fn step(&mut self, cycles: u16) {
        self.ppu.step(cycles, &mut self.interrupt_flag);
        self.timer.step(cycles, &mut self.interrupt_flag);
        self.apu.step(cycles);
    }

    /// Indicates whether an enabled interrupt is requested.
    #[inline]
    pub fn has_pending_interrupt(&self) -> bool {
        let enabled = self.interrupt_enable.bits() & 0b0001_1111;
        let requested = self.interrupt_flag.bits() & 0b0001_1111;
        enabled & requested != 0
    }

    /// Latches a new joypad state, possibly requesting an interrupt.
    #[inline]
    pub fn handle_joypad_event(&mut self, input: JoypadInput) {
        self.joypad.set_state(input, &mut self.interrupt_flag);
    }

    /// Performs an OAM DMA transfer; the passed value selects the upper
    /// byte of the source address, 0xA0 bytes are copied into OAM.
    fn dma_transfer(&mut self, value: u8) {
        self.ppu.r.dma = value;
        let source = u16::from(value) << 8;
        for offset in 0..OAM_SIZE as u16 {
            let byte = self.read(source + offset);
            self.ppu.write(OAM_BEGIN + offset, byte);
        }
    }

    /// Handles all writes to the IO registers (0xFF00 - 0xFF7F).
    fn write_io(&mut self, address: u16, value: u8) {
        match address {
            JOYPAD => self.joypad.write(value),
            SERIAL_TRANSFER_DATA => {} // serial link is not emulated
            SERIAL_TRANSFER_CTRL => {}
            TIMER_DIVIDER..=TIMER_CTRL => self.timer.write(address, value),
            INTERRUPT_FLAG => self.interrupt_flag = InterruptFlags::from_bits_truncate(value),
            AUDIO_REGISTERS_BEGIN..=AUDIO_REGISTERS_END => self.apu.write(address, value),
            PPU_DMA => self.dma_transfer(value),
            PPU_REGISTERS_BEGIN..=PPU_REGISTERS_END => self.ppu.write(address, value),
            // Writes to undocumented or CGB-only registers are dropped
            _ => {}
        }
    }

    /// Handles all reads from the IO registers (0xFF00 - 0xFF7F).
    fn read_io(&mut self, address: u16) -> u8 {
        match address {
            JOYPAD => self.joypad.read(),
            SERIAL_TRANSFER_DATA => 0x00,
            SERIAL_TRANSFER_CTRL => 0b0111_1110,
            TIMER_DIVIDER..=TIMER_CTRL => self.timer.read(address),
            // The undocumented upper bits read as 1
            INTERRUPT_FLAG => self.interrupt_flag.bits() | 0b1110_0000,
            AUDIO_REGISTERS_BEGIN..=AUDIO_REGISTERS_END => self.apu.read(address),
            PPU_REGISTERS_BEGIN..=PPU_REGISTERS_END => self.ppu.read(address),
            _ => UNDEFINED_READ,
        }
    }
}

impl BusDevice for MemoryBus {
    fn write(&mut self, address: u16, value: u8) {
        match address {
            ROM_LOW_BANK_BEGIN..=ROM_HIGH_BANK_END => self.cartridge.write(address, value),
            VRAM_BEGIN..=VRAM_END => self.ppu.write(address, value),
            CRAM_BANK_BEGIN..=CRAM_BANK_END => self.cartridge.write(address, value),
            WRAM_BEGIN..=WRAM_END => self.wram[(address - WRAM_BEGIN) as usize] = value,
            // Echo RAM mirrors the working RAM in both directions
            ECHO_RAM_BEGIN..=ECHO_RAM_END => {
                self.wram[(address - ECHO_RAM_BEGIN) as usize] = value
            }
            OAM_BEGIN..=OAM_END => self.ppu.write(address, value),
            UNUSED_BEGIN..=UNUSED_END => {}
            IO_BEGIN..=IO_END => self.write_io(address, value),
            HRAM_BEGIN..=HRAM_END => self.hram[(address - HRAM_BEGIN) as usize] = value,
            INTERRUPT_ENABLE => {
                self.interrupt_enable = InterruptFlags::from_bits_truncate(value)
            }
        }
    }

    fn read(&mut self, address: u16) -> u8 {
        match address {
            ROM_LOW_BANK_BEGIN..=ROM_HIGH_BANK_END => self.cartridge.read(address),
            VRAM_BEGIN..=VRAM_END => self.ppu.read(address),
            CRAM_BANK_BEGIN..=CRAM_BANK_END => self.cartridge.read(address),
            WRAM_BEGIN..=WRAM_END => self.wram[(address - WRAM_BEGIN) as usize],
            ECHO_RAM_BEGIN..=ECHO_RAM_END => self.wram[(address - ECHO_RAM_BEGIN) as usize],
            OAM_BEGIN..=OAM_END => self.ppu.read(address),
            UNUSED_BEGIN..=UNUSED_END => UNDEFINED_READ,
            IO_BEGIN..=IO_END => self.read_io(address),
            HRAM_BEGIN..=HRAM_END => self.hram[(address - HRAM_BEGIN) as usize],
            INTERRUPT_ENABLE => self.interrupt_enable.bits(),
        }
    }
}
