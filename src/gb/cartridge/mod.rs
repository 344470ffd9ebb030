use crate::gb::cartridge::mapper::Mapper;
use crate::gb::{BusDevice, EmulatorError, EmulatorResult};
use std::path::Path;
use std::sync::Arc;
use std::{fmt, fs, io};

pub mod mapper;
mod mbc1;
mod mbc3;
mod mbc5;
mod nombc;

/// This area of memory contains the cartridge title.
const CARTRIDGE_TITLE_BEGIN: u16 = 0x0134;
const CARTRIDGE_TITLE_END: u16 = 0x0143;

/// This address contains the cartridge type and what kind of hardware
/// is present, see https://gbdev.io/pandocs/The_Cartridge_Header.html
const CARTRIDGE_TYPE: u16 = 0x0147;

/// This byte indicates how much ROM is present on the cartridge.
/// The ROM size is given by 32 KiB * (1 << value).
const CARTRIDGE_ROM_SIZE: u16 = 0x0148;

/// This byte indicates how much RAM is present on the cartridge.
const CARTRIDGE_RAM_SIZE: u16 = 0x0149;

/// These bytes contain a 16-bit (big-endian) checksum computed as the sum
/// of all cartridge ROM bytes except the two checksum bytes themselves.
const CARTRIDGE_GLOBAL_CHECKSUM1: u16 = 0x014E;
const CARTRIDGE_GLOBAL_CHECKSUM2: u16 = 0x014F;

/// A cartridge header occupies 0x0100 - 0x014F.
const CARTRIDGE_HEADER_END: usize = 0x0150;

pub const ROM_BANK_SIZE: usize = 0x4000;
pub const RAM_BANK_SIZE: usize = 0x2000;

/// The memory bank controller family of the cartridge,
/// derived from the type byte at 0x0147.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum CartType {
    RomOnly { battery: bool },
    Mbc1 { battery: bool },
    Mbc3 { battery: bool },
    Mbc5 { battery: bool },
}

impl CartType {
    #[inline]
    pub const fn has_battery(&self) -> bool {
        match self {
            CartType::RomOnly { battery }
            | CartType::Mbc1 { battery }
            | CartType::Mbc3 { battery }
            | CartType::Mbc5 { battery } => *battery,
        }
    }
}

impl TryFrom<u8> for CartType {
    type Error = EmulatorError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let cart_type = match value {
            0x00 | 0x08 => CartType::RomOnly { battery: false },
            0x09 => CartType::RomOnly { battery: true },
            0x01 | 0x02 => CartType::Mbc1 { battery: false },
            0x03 => CartType::Mbc1 { battery: true },
            0x11 | 0x12 => CartType::Mbc3 { battery: false },
            0x0F | 0x10 | 0x13 => CartType::Mbc3 { battery: true },
            0x19 | 0x1A | 0x1C | 0x1D => CartType::Mbc5 { battery: false },
            0x1B | 0x1E => CartType::Mbc5 { battery: true },
            _ => return Err(EmulatorError::UnsupportedCartType(value)),
        };
        Ok(cart_type)
    }
}

impl fmt::Display for CartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CartType::RomOnly { .. } => "ROM only",
            CartType::Mbc1 { .. } => "MBC1",
            CartType::Mbc3 { .. } => "MBC3",
            CartType::Mbc5 { .. } => "MBC5",
        };
        match self.has_battery() {
            true => write!(f, "{name} + battery"),
            false => write!(f, "{name}"),
        }
    }
}

/// Contains the decoded size configuration of the cartridge.
#[derive(Copy, Clone, Debug)]
pub struct CartConfig {
    pub cart_type: CartType,
    pub rom_banks: u16,
    pub ram_size: usize,
}

impl CartConfig {
    pub fn new(cart_type: CartType, rom_code: u8, ram_code: u8) -> EmulatorResult<Self> {
        // This can be expressed as 2^(code + 1) banks of 16 KiB
        let rom_banks = match rom_code {
            0x00..=0x08 => 2u16 << rom_code,
            _ => return Err(EmulatorError::UnsupportedRomSize(rom_code)),
        };

        let ram_size = match ram_code {
            0x00 => 0,
            0x01 => 0x800, // 2 KiB, smaller than one bank
            0x02 => RAM_BANK_SIZE,
            0x03 => RAM_BANK_SIZE * 4,
            0x04 => RAM_BANK_SIZE * 16,
            0x05 => RAM_BANK_SIZE * 8,
            _ => return Err(EmulatorError::UnsupportedRamSize(ram_code)),
        };

        Ok(Self {
            cart_type,
            rom_banks,
            ram_size,
        })
    }
}

/// Contains the parsed cartridge header information.
#[derive(Clone)]
pub struct CartHeader {
    pub title: String,
    pub config: CartConfig,
}

impl TryFrom<&[u8]> for CartHeader {
    type Error = EmulatorError;

    fn try_from(buf: &[u8]) -> Result<Self, Self::Error> {
        if buf.len() < CARTRIDGE_HEADER_END {
            return Err(EmulatorError::HeaderTooSmall);
        }
        let cart_type = CartType::try_from(buf[CARTRIDGE_TYPE as usize])?;
        let config = CartConfig::new(
            cart_type,
            buf[CARTRIDGE_ROM_SIZE as usize],
            buf[CARTRIDGE_RAM_SIZE as usize],
        )?;
        Ok(Self {
            title: parse_title(buf),
            config,
        })
    }
}

impl fmt::Display for CartHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.config.cart_type)
    }
}

/// Returns the cartridge title from the cartridge header.
fn parse_title(buf: &[u8]) -> String {
    let title = buf[CARTRIDGE_TITLE_BEGIN as usize..=CARTRIDGE_TITLE_END as usize]
        .iter()
        .take_while(|&&b| b != 0)
        .filter_map(|&b| b.is_ascii_graphic().then_some(char::from(b)))
        .collect::<String>();
    match title.is_empty() {
        true => "Unnamed".to_string(),
        false => title,
    }
}

/// Holds all relevant cartridge data and dispatches reads and writes
/// to the memory bank controller.
#[derive(Clone)]
pub struct Cartridge {
    pub header: CartHeader,
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    pub fn from_path(path: &Path) -> EmulatorResult<Self> {
        let rom = fs::read(path)?;
        Cartridge::try_from(Arc::from(rom.into_boxed_slice()))
    }

    /// Loads a battery backed RAM snapshot from the given path.
    /// A missing or corrupt save file is treated as absent.
    pub fn load_save(&mut self, path: &Path) {
        if !self.header.config.cart_type.has_battery() {
            return;
        }
        let ram = match fs::read(path) {
            Ok(ram) => ram,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => {
                eprintln!("WARNING: unable to read save file: {e}");
                return;
            }
        };
        if !self.mapper.load_ram(ram) {
            eprintln!(
                "WARNING: save file {} does not match the cartridge RAM size, ignoring it",
                path.display()
            );
        }
    }

    /// Persists the battery backed RAM to the given path.
    pub fn write_save(&self, path: &Path) {
        match self.mapper.save_ram() {
            Ok(ram) => {
                if let Err(e) = fs::write(path, ram) {
                    eprintln!("WARNING: unable to write save file: {e}");
                }
            }
            Err(mapper::SaveError::NoBattery | mapper::SaveError::NoRam) => {}
        }
    }
}

impl TryFrom<Arc<[u8]>> for Cartridge {
    type Error = EmulatorError;

    fn try_from(rom: Arc<[u8]>) -> Result<Self, Self::Error> {
        let header = CartHeader::try_from(rom.as_ref())?;
        if let Err(msg) = verify_checksum(rom.as_ref()) {
            eprintln!("WARNING: {msg}");
        }
        let mapper = mapper::new(header.config, rom);
        Ok(Self { header, mapper })
    }
}

impl fmt::Display for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)
    }
}

impl BusDevice for Cartridge {
    #[inline]
    fn write(&mut self, address: u16, value: u8) {
        self.mapper.write(address, value);
    }

    #[inline]
    fn read(&mut self, address: u16) -> u8 {
        self.mapper.read(address)
    }
}

/// Validates the global checksum of the given buffer containing the
/// whole cartridge.
fn verify_checksum(buf: &[u8]) -> Result<(), String> {
    if buf.len() <= CARTRIDGE_GLOBAL_CHECKSUM2 as usize {
        return Err("cartridge is too small to contain a checksum".to_string());
    }
    let byte1 = buf[CARTRIDGE_GLOBAL_CHECKSUM1 as usize];
    let byte2 = buf[CARTRIDGE_GLOBAL_CHECKSUM2 as usize];
    let checksum = u16::from(byte1) << 8 | u16::from(byte2);
    let calculated = calculate_global_checksum(buf);

    match checksum == calculated {
        true => Ok(()),
        false => Err(format!(
            "Global checksum mismatch! Expected: {calculated:#06x} Got: {checksum:#06x}"
        )),
    }
}

/// Calculates the global checksum by adding all cartridge bytes except
/// the two checksum bytes.
fn calculate_global_checksum(buf: &[u8]) -> u16 {
    buf.iter()
        .enumerate()
        .fold(0u16, |sum, (address, &byte)| match address as u16 {
            CARTRIDGE_GLOBAL_CHECKSUM1 | CARTRIDGE_GLOBAL_CHECKSUM2 => sum,
            _ => sum.wrapping_add(u16::from(byte)),
        })
}

/// Masks a requested ROM bank number to the number of banks
/// present in the cartridge.
#[inline]
pub(crate) const fn rom_bank_mask(rom_banks: u16) -> u16 {
    let bits = u16::BITS - rom_banks.leading_zeros();
    ((1u32 << bits) - 1) as u16
}
