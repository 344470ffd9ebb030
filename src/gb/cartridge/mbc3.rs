use crate::gb::cartridge::mapper::{Mapper, SaveError};
use crate::gb::cartridge::{CartConfig, RAM_BANK_SIZE, ROM_BANK_SIZE, rom_bank_mask};
use crate::gb::constants::*;
use std::sync::Arc;

/// A value of 0x0A enables reading and writing to external RAM and the
/// RTC registers, any other value disables both.
const RAM_RTC_ENABLE_BEGIN: u16 = 0x0000;
const RAM_RTC_ENABLE_END: u16 = 0x1FFF;

/// The whole 7 bits of the ROM bank number are written directly to this
/// address. Writing 0x00 selects bank 0x01 instead.
const ROM_BANK_NUMBER_BEGIN: u16 = 0x2000;
const ROM_BANK_NUMBER_END: u16 = 0x3FFF;

/// Controls what is mapped into memory at 0xA000 - 0xBFFF.
/// 0x00 - 0x03: RAM bank. 0x08 - 0x0C: RTC register.
const RAM_BANK_NUMBER_BEGIN: u16 = 0x4000;
const RAM_BANK_NUMBER_END: u16 = 0x5FFF;

/// Writing 0x00 and then 0x01 to this register latches the current time
/// into the RTC registers until the procedure is repeated.
const LATCH_CLOCK_BEGIN: u16 = 0x6000;
const LATCH_CLOCK_END: u16 = 0x7FFF;

/// The real time clock register file,
/// see https://gbdev.io/pandocs/MBC3.html#clock-counter-registers
#[derive(Clone, Copy, Default)]
struct RtcRegisters {
    seconds: u8,
    minutes: u8,
    hours: u8,
    day_low: u8,
    day_high: u8,
}

/// The currently selected mapping for the 0xA000 - 0xBFFF window.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum RamSelection {
    Bank(u8),
    Seconds,
    Minutes,
    Hours,
    DayLow,
    DayHigh,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
enum RtcLatch {
    #[default]
    Undefined,
    Pending,
    Latched,
}

/// MBC3 supports up to 2 MiB ROM (128 banks) and 32 KiB RAM (4 banks)
/// and carries a battery buffered real time clock.
#[derive(Clone)]
pub struct Mbc3 {
    config: CartConfig,
    rom: Arc<[u8]>,
    ram: Vec<u8>,
    rtc: RtcRegisters,
    rom_bank: u8,
    ram_selection: RamSelection,
    rtc_latch: RtcLatch,
    ram_rtc_enabled: bool,
}

impl Mbc3 {
    pub fn new(config: CartConfig, rom: Arc<[u8]>) -> Self {
        Self {
            ram: vec![0; config.ram_size],
            rtc: RtcRegisters::default(),
            rom_bank: 1,
            ram_selection: RamSelection::Bank(0),
            rtc_latch: RtcLatch::default(),
            ram_rtc_enabled: false,
            rom,
            config,
        }
    }
}

impl Mapper for Mbc3 {
    fn read(&mut self, address: u16) -> u8 {
        match address {
            ROM_LOW_BANK_BEGIN..=ROM_LOW_BANK_END => self.rom[address as usize % self.rom.len()],
            ROM_HIGH_BANK_BEGIN..=ROM_HIGH_BANK_END => {
                let offset =
                    self.rom_bank as usize * ROM_BANK_SIZE + (address - ROM_HIGH_BANK_BEGIN) as usize;
                self.rom[offset % self.rom.len()]
            }
            CRAM_BANK_BEGIN..=CRAM_BANK_END => {
                if !self.ram_rtc_enabled {
                    return UNDEFINED_READ;
                }
                match self.ram_selection {
                    RamSelection::Bank(bank) => {
                        if self.ram.is_empty() {
                            return UNDEFINED_READ;
                        }
                        let offset =
                            bank as usize * RAM_BANK_SIZE + (address - CRAM_BANK_BEGIN) as usize;
                        self.ram[offset % self.ram.len()]
                    }
                    RamSelection::Seconds => self.rtc.seconds,
                    RamSelection::Minutes => self.rtc.minutes,
                    RamSelection::Hours => self.rtc.hours,
                    RamSelection::DayLow => self.rtc.day_low,
                    RamSelection::DayHigh => self.rtc.day_high,
                }
            }
            _ => UNDEFINED_READ,
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            RAM_RTC_ENABLE_BEGIN..=RAM_RTC_ENABLE_END => {
                self.ram_rtc_enabled = value & 0b1111 == 0b1010;
            }
            ROM_BANK_NUMBER_BEGIN..=ROM_BANK_NUMBER_END => {
                self.rom_bank = match value & 0b0111_1111 {
                    0 => 1,
                    n => n,
                };
                self.rom_bank &= rom_bank_mask(self.config.rom_banks) as u8;
            }
            RAM_BANK_NUMBER_BEGIN..=RAM_BANK_NUMBER_END => {
                self.ram_selection = match value {
                    0x00..=0x03 => RamSelection::Bank(value),
                    0x08 => RamSelection::Seconds,
                    0x09 => RamSelection::Minutes,
                    0x0A => RamSelection::Hours,
                    0x0B => RamSelection::DayLow,
                    0x0C => RamSelection::DayHigh,
                    _ => return,
                };
            }
            LATCH_CLOCK_BEGIN..=LATCH_CLOCK_END => {
                self.rtc_latch = match value {
                    0x00 => RtcLatch::Pending,
                    0x01 if self.rtc_latch == RtcLatch::Pending => RtcLatch::Latched,
                    _ => RtcLatch::Undefined,
                };
            }
            CRAM_BANK_BEGIN..=CRAM_BANK_END => {
                if !self.ram_rtc_enabled {
                    return;
                }
                match self.ram_selection {
                    RamSelection::Bank(bank) if !self.ram.is_empty() => {
                        let offset =
                            bank as usize * RAM_BANK_SIZE + (address - CRAM_BANK_BEGIN) as usize;
                        let len = self.ram.len();
                        self.ram[offset % len] = value;
                    }
                    RamSelection::Seconds => self.rtc.seconds = value,
                    RamSelection::Minutes => self.rtc.minutes = value,
                    RamSelection::Hours => self.rtc.hours = value,
                    RamSelection::DayLow => self.rtc.day_low = value,
                    RamSelection::DayHigh => self.rtc.day_high = value,
                    _ => {}
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gb::cartridge::CartType;

    fn make_mapper(rom_code: u8, ram_code: u8) -> Mbc3 {
        let config = CartConfig::new(CartType::Mbc3 { battery: true }, rom_code, ram_code).unwrap();
        let rom = (0..config.rom_banks)
            .flat_map(|i| vec![i as u8; ROM_BANK_SIZE])
            .collect::<Arc<[u8]>>();
        Mbc3::new(config, rom)
    }

    #[test]
    fn test_ram_enable_latch() {
        let mut mapper = make_mapper(0x03, 0x02);
        let address = CRAM_BANK_BEGIN + 0x10;

        mapper.write(address, 0x42);
        assert_eq!(mapper.read(address), 0xFF, "RAM should be disabled");

        mapper.write(RAM_RTC_ENABLE_BEGIN, 0x0A);
        assert_eq!(mapper.read(address), 0x00);

        mapper.write(address, 0x42);
        assert_eq!(mapper.read(address), 0x42, "RAM should be enabled");

        mapper.write(RAM_RTC_ENABLE_BEGIN, 0xFF);
        assert_eq!(mapper.read(address), 0xFF, "RAM should be disabled again");
    }

    #[test]
    fn test_rom_bank_seven_bits() {
        let mut mapper = make_mapper(0x06, 0x02);

        mapper.write(ROM_BANK_NUMBER_BEGIN, 0x00);
        assert_eq!(mapper.rom_bank, 0x01, "bank 0 should be treated as bank 1");

        mapper.write(ROM_BANK_NUMBER_BEGIN, 0x55);
        assert_eq!(mapper.rom_bank, 0x55);
        assert_eq!(mapper.read(ROM_HIGH_BANK_BEGIN), 0x55);

        mapper.write(ROM_BANK_NUMBER_BEGIN, 0xFF);
        assert_eq!(mapper.rom_bank, 0x7F, "only the first 7 bits are used");
    }

    #[test]
    fn test_rtc_register_window() {
        let mut mapper = make_mapper(0x00, 0x02);
        mapper.write(RAM_RTC_ENABLE_BEGIN, 0x0A);

        mapper.write(RAM_BANK_NUMBER_BEGIN, 0x08);
        mapper.write(CRAM_BANK_BEGIN, 42);
        assert_eq!(mapper.read(CRAM_BANK_BEGIN), 42, "seconds register");

        mapper.write(RAM_BANK_NUMBER_BEGIN, 0x0C);
        mapper.write(CRAM_BANK_BEGIN, 0x01);
        assert_eq!(mapper.read(CRAM_BANK_BEGIN), 0x01, "day high register");

        // RAM contents are untouched by RTC access
        mapper.write(RAM_BANK_NUMBER_BEGIN, 0x00);
        assert_eq!(mapper.read(CRAM_BANK_BEGIN), 0x00);
    }

    #[test]
    fn test_rtc_latch_protocol() {
        let mut mapper = make_mapper(0x00, 0x02);

        mapper.write(LATCH_CLOCK_BEGIN, 0x00);
        assert_eq!(mapper.rtc_latch, RtcLatch::Pending);

        mapper.write(LATCH_CLOCK_BEGIN, 0x01);
        assert_eq!(mapper.rtc_latch, RtcLatch::Latched);

        // 0x01 without a preceding 0x00 does not latch
        mapper.write(LATCH_CLOCK_BEGIN, 0x01);
        assert_eq!(mapper.rtc_latch, RtcLatch::Undefined);
    }
}
