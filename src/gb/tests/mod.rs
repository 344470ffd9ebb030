mod frame;

use crate::gb::cartridge::Cartridge;
use crate::gb::cartridge::tests::make_rom;
use crate::gb::cpu::{Cpu, ImeState};
use crate::gb::interrupt::InterruptFlags;
use crate::gb::utils::{bit_at, half_carry_add_u8, half_carry_sub_u8, set_bit};
use crate::gb::{BusDevice, GameBoy};
use std::sync::Arc;

/// A flat 64 KiB memory standing in for the real bus in CPU tests.
pub struct MockBus {
    data: Vec<u8>,
}

impl MockBus {
    pub fn new(program: Vec<u8>) -> Self {
        let mut data = vec![0u8; 0x10000];
        data[..program.len()].copy_from_slice(&program);
        Self { data }
    }
}

impl BusDevice for MockBus {
    fn write(&mut self, address: u16, value: u8) {
        self.data[address as usize] = value;
    }

    fn read(&mut self, address: u16) -> u8 {
        self.data[address as usize]
    }
}

/// Builds an emulator around a ROM-only cartridge with the given
/// program mapped at the entry point 0x0100.
pub fn make_emulator(program: &[u8]) -> GameBoy {
    let mut rom = make_rom(0x00, 0x00, 0x00);
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
    let cartridge = Cartridge::try_from(Arc::from(rom.into_boxed_slice())).unwrap();
    GameBoy::new(cartridge)
}

#[test]
fn test_bit_at() {
    let x = 0b1111_0000u8;
    assert!(!bit_at(x, 3));
    assert!(bit_at(x, 4));
}

#[test]
fn test_set_bit() {
    let x = 0b1111_0000u8;
    assert_eq!(set_bit(x, 0, true), 0b1111_0001);
    assert_eq!(set_bit(x, 1, true), 0b1111_0010);
    assert_eq!(set_bit(x, 0, false), 0b1111_0000);
    assert_eq!(set_bit(x, 7, false), 0b0111_0000);
}

#[test]
fn test_half_carry_helpers() {
    assert!(half_carry_add_u8(62, 34));
    assert!(!half_carry_add_u8(34, 34));
    assert!(half_carry_sub_u8(0x10, 0x01));
    assert!(!half_carry_sub_u8(0x11, 0x01));
}

#[test]
fn test_interrupt_flags_mask() {
    assert_eq!(InterruptFlags::all().bits(), 0b0001_1111);
    assert_eq!(InterruptFlags::from_bits_truncate(0xFF).bits(), 0b0001_1111);
}

#[test]
fn test_power_on_state() {
    let cpu = Cpu::power_on();
    assert_eq!(cpu.r.get_af(), 0x01B0);
    assert_eq!(cpu.r.get_bc(), 0x0013);
    assert_eq!(cpu.r.get_de(), 0x00D8);
    assert_eq!(cpu.r.get_hl(), 0x014D);
    assert_eq!(cpu.sp, 0xFFFE);
    assert_eq!(cpu.pc, 0x0100);
    assert_eq!(cpu.ime, ImeState::Disabled);
}

#[test]
fn test_word_access_roundtrip() {
    let mut emulator = make_emulator(&[0x00]);
    for value in [0x0000u16, 0x1234, 0xABCD, 0xFFFF] {
        emulator.bus.write_word(0xC000, value);
        assert_eq!(emulator.bus.read_word(0xC000), value);
    }
}

/// NOP; JP 0x0150; at 0x0150: LD A, 0x42; RET.
/// Four instructions later A holds 0x42 and PC returned into the
/// address popped off the stack.
#[test]
fn test_jump_and_return() {
    let mut rom = make_rom(0x00, 0x00, 0x00);
    rom[0x0100..0x0104].copy_from_slice(&[0x00, 0xC3, 0x50, 0x01]);
    rom[0x0150..0x0153].copy_from_slice(&[0x3E, 0x42, 0xC9]);
    let cartridge = Cartridge::try_from(Arc::from(rom.into_boxed_slice())).unwrap();
    let mut emulator = GameBoy::new(cartridge);

    // Seed a return address for the final RET
    emulator.cpu.sp = 0xFFFC;
    emulator.bus.write_word(0xFFFC, 0xABCD);

    for _ in 0..4 {
        emulator.step();
    }
    assert_eq!(emulator.cpu.r.a, 0x42);
    assert_eq!(emulator.cpu.pc, 0xABCD);
    assert_eq!(emulator.cpu.sp, 0xFFFE);
}

/// HALT with IME enabled: the CPU idles at 4 cycles per step until the
/// requested interrupt is serviced at vector 0x0040.
#[test]
fn test_halt_and_interrupt_dispatch() {
    let mut emulator = make_emulator(&[0x76]); // HALT
    emulator.cpu.ime = ImeState::Enabled;
    emulator.bus.interrupt_enable = InterruptFlags::VBLANK;
    // Keep the PPU from raising its own V-Blank in this test
    emulator.bus.ppu.write(0xFF40, 0x11);

    emulator.step();
    assert!(emulator.cpu.is_halted);
    let halted_pc = emulator.cpu.pc;
    assert_eq!(halted_pc, 0x0101);

    for _ in 0..25 {
        let cycles = emulator.cpu.step(&mut emulator.bus);
        assert_eq!(cycles, 4, "a halted CPU reports 4 cycles per step");
    }

    emulator.bus.interrupt_flag.insert(InterruptFlags::VBLANK);
    emulator.step();
    assert!(!emulator.cpu.is_halted);
    assert_eq!(emulator.cpu.pc, 0x0040);
    assert_eq!(emulator.cpu.ime, ImeState::Disabled);
    assert!(!emulator.bus.interrupt_flag.contains(InterruptFlags::VBLANK));
    // The pushed return address is the halted instruction + 1
    assert_eq!(emulator.bus.read_word(emulator.cpu.sp), halted_pc);
}

/// HALT with IME disabled resumes without dispatching.
#[test]
fn test_halt_without_dispatch() {
    let mut emulator = make_emulator(&[0x76, 0x00]);
    emulator.bus.interrupt_enable = InterruptFlags::TIMER;
    emulator.bus.ppu.write(0xFF40, 0x11);

    emulator.step();
    assert!(emulator.cpu.is_halted);

    emulator.bus.interrupt_flag.insert(InterruptFlags::TIMER);
    emulator.step();
    assert!(!emulator.cpu.is_halted);
    assert_eq!(emulator.cpu.pc, 0x0101, "execution resumes in place");
    assert!(
        emulator.bus.interrupt_flag.contains(InterruptFlags::TIMER),
        "the request stays pending"
    );
}

#[test]
fn test_if_register_read_back() {
    let mut emulator = make_emulator(&[0x00]);
    emulator.bus.interrupt_flag = InterruptFlags::TIMER;
    assert_eq!(emulator.bus.read(0xFF0F), 0b1110_0100);

    emulator.bus.write(0xFF0F, 0xFF);
    assert_eq!(emulator.bus.interrupt_flag.bits(), 0b0001_1111);

    emulator.bus.write(0xFFFF, 0xFF);
    assert_eq!(emulator.bus.read(0xFFFF), 0b0001_1111);
}

#[test]
fn test_echo_ram_mirrors_wram() {
    let mut emulator = make_emulator(&[0x00]);
    emulator.bus.write(0xC123, 0x42);
    assert_eq!(emulator.bus.read(0xE123), 0x42);

    emulator.bus.write(0xE124, 0x99);
    assert_eq!(emulator.bus.read(0xC124), 0x99);
}

#[test]
fn test_unusable_region_reads_ff() {
    let mut emulator = make_emulator(&[0x00]);
    emulator.bus.write(0xFEA0, 0x42);
    assert_eq!(emulator.bus.read(0xFEA0), 0xFF);
    assert_eq!(emulator.bus.read(0xFEFF), 0xFF);
}

#[test]
fn test_oam_dma_transfer() {
    let mut emulator = make_emulator(&[0x00]);
    for offset in 0..0xA0u16 {
        emulator.bus.write(0xC000 + offset, offset as u8);
    }
    emulator.bus.write(0xFF46, 0xC0);

    for offset in 0..0xA0u16 {
        assert_eq!(emulator.bus.read(0xFE00 + offset), offset as u8);
    }
    assert_eq!(emulator.bus.read(0xFF46), 0xC0);
}

/// EI delays the interrupt enable by one instruction, so a pending
/// interrupt is serviced only after the instruction following EI.
#[test]
fn test_ei_delay() {
    // EI; NOP; NOP
    let mut emulator = make_emulator(&[0xFB, 0x00, 0x00]);
    emulator.bus.interrupt_enable = InterruptFlags::VBLANK;
    emulator.bus.interrupt_flag.insert(InterruptFlags::VBLANK);
    emulator.bus.ppu.write(0xFF40, 0x11);

    emulator.step(); // EI
    assert_eq!(emulator.cpu.pc, 0x0101, "not serviced right after EI");

    emulator.step(); // NOP, afterwards the dispatch fires
    assert_eq!(emulator.cpu.pc, 0x0040);
}

/// STOP consumes its padding byte and waits for a button press.
#[test]
fn test_stop_waits_for_joypad() {
    let mut emulator = make_emulator(&[0x10, 0x00, 0x00]);
    emulator.bus.ppu.write(0xFF40, 0x11);
    emulator.step();
    assert!(emulator.cpu.is_stopped);
    assert_eq!(emulator.cpu.pc, 0x0102);

    emulator.step();
    assert!(emulator.cpu.is_stopped);

    emulator.bus.interrupt_flag.insert(InterruptFlags::JOYPAD);
    emulator.step();
    assert!(!emulator.cpu.is_stopped);
}

#[test]
fn test_reset_preserves_cartridge() {
    let mut emulator = make_emulator(&[0x3E, 0x42]); // LD A, 0x42
    emulator.step();
    assert_eq!(emulator.cpu.r.a, 0x42);

    emulator.reset();
    assert_eq!(emulator.cpu.r.a, 0x01);
    assert_eq!(emulator.cpu.pc, 0x0100);
    // The cartridge still maps the same program
    assert_eq!(emulator.bus.read(0x0100), 0x3E);
}
