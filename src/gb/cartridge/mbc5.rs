use crate::gb::cartridge::mapper::{Mapper, SaveError};
use crate::gb::cartridge::{CartConfig, RAM_BANK_SIZE, ROM_BANK_SIZE, rom_bank_mask};
use crate::gb::constants::*;
use std::sync::Arc;

/// Writing 0x0A enables reading and writing to external RAM,
/// writing 0x00 disables it.
const RAM_ENABLE_BEGIN: u16 = 0x0000;
const RAM_ENABLE_END: u16 = 0x1FFF;

/// The 8 least significant bits of the ROM bank number go here.
/// Unlike the other controllers, writing 0 really selects bank 0.
const ROM_BANK_LOW_BITS_BEGIN: u16 = 0x2000;
const ROM_BANK_LOW_BITS_END: u16 = 0x2FFF;

/// The 9th bit of the ROM bank number goes here.
const ROM_BANK_HIGH_BIT_BEGIN: u16 = 0x3000;
const ROM_BANK_HIGH_BIT_END: u16 = 0x3FFF;

/// Writing a value in the range 0x00 - 0x0F maps the corresponding
/// external RAM bank into the 0xA000 - 0xBFFF window.
const RAM_BANK_NUMBER_BEGIN: u16 = 0x4000;
const RAM_BANK_NUMBER_END: u16 = 0x5FFF;

/// MBC5 is the 5th generation controller, it can map up to
/// 8 MiB of ROM (512 banks) with a 9-bit bank number.
#[derive(Clone)]
pub struct Mbc5 {
    config: CartConfig,
    rom: Arc<[u8]>,
    ram: Vec<u8>,
    rom_bank: u16,
    ram_bank: u8,
    ram_enabled: bool,
}

impl Mbc5 {
    pub fn new(config: CartConfig, rom: Arc<[u8]>) -> Self {
        Self {
            ram: vec![0; config.ram_size],
            rom_bank: 1,
            ram_bank: 0,
            ram_enabled: false,
            rom,
            config,
        }
    }
}

impl Mapper for Mbc5 {
    fn read(&mut self, address: u16) -> u8 {
        match address {
            ROM_LOW_BANK_BEGIN..=ROM_LOW_BANK_END => self.rom[address as usize % self.rom.len()],
            ROM_HIGH_BANK_BEGIN..=ROM_HIGH_BANK_END => {
                let offset =
                    self.rom_bank as usize * ROM_BANK_SIZE + (address - ROM_HIGH_BANK_BEGIN) as usize;
                self.rom[offset % self.rom.len()]
            }
            CRAM_BANK_BEGIN..=CRAM_BANK_END => {
                if !self.ram_enabled || self.ram.is_empty() {
                    return UNDEFINED_READ;
                }
                let offset =
                    self.ram_bank as usize * RAM_BANK_SIZE + (address - CRAM_BANK_BEGIN) as usize;
                self.ram[offset % self.ram.len()]
            }
            _ => UNDEFINED_READ,
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            RAM_ENABLE_BEGIN..=RAM_ENABLE_END => {
                self.ram_enabled = value & 0b1111 == 0b1010;
            }
            ROM_BANK_LOW_BITS_BEGIN..=ROM_BANK_LOW_BITS_END => {
                self.rom_bank = (self.rom_bank & 0x0100) | u16::from(value);
                self.rom_bank &= rom_bank_mask(self.config.rom_banks);
            }
            ROM_BANK_HIGH_BIT_BEGIN..=ROM_BANK_HIGH_BIT_END => {
                self.rom_bank = (self.rom_bank & 0x00FF) | (u16::from(value & 0b1) << 8);
                self.rom_bank &= rom_bank_mask(self.config.rom_banks);
            }
            RAM_BANK_NUMBER_BEGIN..=RAM_BANK_NUMBER_END => {
                self.ram_bank = value & 0b0000_1111;
            }
            CRAM_BANK_BEGIN..=CRAM_BANK_END => {
                if self.ram_enabled && !self.ram.is_empty() {
                    let offset = self.ram_bank as usize * RAM_BANK_SIZE
                        + (address - CRAM_BANK_BEGIN) as usize;
                    let len = self.ram.len();
                    self.ram[offset % len] = value;
                }
            }
            _ => {}
        }
    }

    fn load_ram(&mut self, ram: Vec<u8>) -> bool {
        if ram.len() != self.ram.len() {
            return false;
        }
        self.ram = ram;
        true
    }

    fn save_ram(&self) -> Result<Vec<u8>, SaveError> {
        if !self.config.cart_type.has_battery() {
            return Err(SaveError::NoBattery);
        }
        if self.ram.is_empty() {
            return Err(SaveError::NoRam);
        }
        Ok(self.ram.clone())
    }
}
