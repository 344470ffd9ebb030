use crate::gb::cartridge::mapper::{Mapper, SaveError};
use crate::gb::cartridge::CartConfig;
use crate::gb::constants::*;
use std::sync::Arc;

/// Small games of not more than 32 KiB ROM do not require a controller
/// chip for banking, the ROM is mapped directly to 0x0000 - 0x7FFF.
/// Optionally up to 8 KiB of RAM can be attached at 0xA000 - 0xBFFF.
#[derive(Clone)]
pub struct NoMbc {
    config: CartConfig,
    rom: Arc<[u8]>,
    ram: Vec<u8>,
}

impl NoMbc {
    pub fn new(config: CartConfig, rom: Arc<[u8]>) -> Self {
        Self {
            ram: vec![0; config.ram_size],
            rom,
            config,
        }
    }
}

impl Mapper for NoMbc {
    fn read(&mut self, address: u16) -> u8 {
        match address {
            ROM_LOW_BANK_BEGIN..=ROM_HIGH_BANK_END => self
                .rom
                .get(address as usize)
                .copied()
                .unwrap_or(UNDEFINED_READ),
            CRAM_BANK_BEGIN..=CRAM_BANK_END => {
                let offset = (address - CRAM_BANK_BEGIN) as usize;
                match offset < self.ram.len() {
                    true => self.ram[offset],
                    false => UNDEFINED_READ,
                }
            }
            _ => UNDEFINED_READ,
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        if let CRAM_BANK_BEGIN..=CRAM_BANK_END = address {
            let offset = (address - CRAM_BANK_BEGIN) as usize;
            if offset < self.ram.len() {
                self.ram[offset] = value;
            }
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
