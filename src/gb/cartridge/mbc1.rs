use crate::gb::cartridge::mapper::{Mapper, SaveError};
use crate::gb::cartridge::{CartConfig, RAM_BANK_SIZE, ROM_BANK_SIZE, rom_bank_mask};
use crate::gb::constants::*;
use std::sync::Arc;

/// Writing any value with 0x0A in the lower 4 bits to this area enables
/// the attached RAM, any other value disables it.
const RAM_ENABLE_BEGIN: u16 = 0x0000;
const RAM_ENABLE_END: u16 = 0x1FFF;

/// This 5-bit register selects the ROM bank for the 0x4000 - 0x7FFF
/// window. Writing 0x00 behaves as if 0x01 was written.
const ROM_BANK_NUMBER_BEGIN: u16 = 0x2000;
const ROM_BANK_NUMBER_END: u16 = 0x3FFF;

/// This 2-bit register selects a RAM bank (32 KiB RAM carts), or the
/// upper two bits of the ROM bank number (1 MiB ROM or larger carts),
/// depending on the banking mode.
const UPPER_BANK_BITS_BEGIN: u16 = 0x4000;
const UPPER_BANK_BITS_END: u16 = 0x5FFF;

/// This 1-bit register selects between the two banking modes which
/// control how the secondary 2-bit register above is interpreted.
const BANKING_MODE_BEGIN: u16 = 0x6000;
const BANKING_MODE_END: u16 = 0x7FFF;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum BankingMode {
    Simple,
    Advanced,
}

/// In its default configuration MBC1 supports up to 512 KiB ROM with up
/// to 32 KiB of banked RAM. Larger carts wire the secondary 2-bit
/// register as an extension of the ROM bank number instead, which allows
/// up to 2 MiB ROM with a fixed 8 KiB of RAM.
#[derive(Clone)]
pub struct Mbc1 {
    config: CartConfig,
    rom: Arc<[u8]>,
    ram: Vec<u8>,
    low_bank_offset: usize,  // selected ROM offset for 0x0000 - 0x3FFF
    high_bank_offset: usize, // selected ROM offset for 0x4000 - 0x7FFF
    ram_bank_offset: usize,  // selected RAM offset for 0xA000 - 0xBFFF
    ram_enabled: bool,
    bank_lo: u8, // lower 5 bits of the ROM bank number
    bank_hi: u8, // RAM bank number or upper 2 bits of the ROM bank number
    mode: BankingMode,
}

impl Mbc1 {
    pub fn new(config: CartConfig, rom: Arc<[u8]>) -> Self {
        Self {
            ram: vec![0; config.ram_size],
            low_bank_offset: 0,
            high_bank_offset: ROM_BANK_SIZE,
            ram_bank_offset: 0,
            ram_enabled: false,
            bank_lo: 0b0000_0001,
            bank_hi: 0b0000_0000,
            mode: BankingMode::Simple,
            rom,
            config,
        }
    }

    /// Updates the ROM bank offsets from the banking registers.
    /// The upper 2 bits only participate on carts with more than
    /// 32 banks, smaller carts mask the 5-bit register instead.
    fn update_rom_offsets(&mut self) {
        if self.config.rom_banks < 32 {
            self.low_bank_offset = 0;
            let bank = self.bank_lo & rom_bank_mask(self.config.rom_banks) as u8;
            self.high_bank_offset = ROM_BANK_SIZE * bank as usize;
            return;
        }

        let low_bank = match self.mode {
            BankingMode::Simple => 0,
            BankingMode::Advanced => (self.bank_hi << 5) as usize,
        };
        self.low_bank_offset = ROM_BANK_SIZE * low_bank;

        let high_bank = (self.bank_hi << 5) as usize | self.bank_lo as usize;
        self.high_bank_offset = ROM_BANK_SIZE * high_bank;
    }

    /// Updates the RAM bank offset. RAM banking needs the advanced mode
    /// and is only available on carts with 4 banks.
    fn update_ram_offset(&mut self) {
        self.ram_bank_offset =
            match self.ram.len() == RAM_BANK_SIZE * 4 && self.mode == BankingMode::Advanced {
                true => RAM_BANK_SIZE * self.bank_hi as usize,
                false => 0,
            };
    }
}

impl Mapper for Mbc1 {
    fn read(&mut self, address: u16) -> u8 {
        match address {
            ROM_LOW_BANK_BEGIN..=ROM_LOW_BANK_END => {
                let offset = self.low_bank_offset + (address - ROM_LOW_BANK_BEGIN) as usize;
                self.rom[offset % self.rom.len()]
            }
            ROM_HIGH_BANK_BEGIN..=ROM_HIGH_BANK_END => {
                let offset = self.high_bank_offset + (address - ROM_HIGH_BANK_BEGIN) as usize;
                self.rom[offset % self.rom.len()]
            }
            CRAM_BANK_BEGIN..=CRAM_BANK_END => {
                if !self.ram_enabled || self.ram.is_empty() {
                    return UNDEFINED_READ;
                }
                let offset = self.ram_bank_offset + (address - CRAM_BANK_BEGIN) as usize;
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
            ROM_BANK_NUMBER_BEGIN..=ROM_BANK_NUMBER_END => {
                self.bank_lo = match value & 0b0001_1111 {
                    0 => 1,
                    n => n,
                };
                self.update_rom_offsets();
            }
            UPPER_BANK_BITS_BEGIN..=UPPER_BANK_BITS_END => {
                self.bank_hi = value & 0b11;
                self.update_rom_offsets();
                self.update_ram_offset();
            }
            BANKING_MODE_BEGIN..=BANKING_MODE_END => {
                self.mode = match value & 0b1 {
                    0b0 => BankingMode::Simple,
                    _ => BankingMode::Advanced,
                };
                self.update_rom_offsets();
                self.update_ram_offset();
            }
            CRAM_BANK_BEGIN..=CRAM_BANK_END => {
                if self.ram_enabled && !self.ram.is_empty() {
                    let offset = self.ram_bank_offset + (address - CRAM_BANK_BEGIN) as usize;
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
