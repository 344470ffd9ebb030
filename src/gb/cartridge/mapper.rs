use crate::gb::cartridge::mbc1::Mbc1;
use crate::gb::cartridge::mbc3::Mbc3;
use crate::gb::cartridge::mbc5::Mbc5;
use crate::gb::cartridge::nombc::NoMbc;
use crate::gb::cartridge::{CartConfig, CartType};
use dyn_clone::DynClone;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SaveError {
    #[error("cartridge has no battery backed RAM")]
    NoBattery,
    #[error("cartridge has no RAM attached")]
    NoRam,
}

/// This trait defines the interface of a memory bank controller.
/// It maps the CPU visible ROM and RAM windows onto the raw
/// cartridge contents.
pub trait Mapper: DynClone + Send {
    /// Reads a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Writes a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Replaces the cartridge RAM with the given snapshot.
    /// Returns false if the snapshot does not match the RAM size.
    fn load_ram(&mut self, ram: Vec<u8>) -> bool;

    /// Creates a snapshot of the RAM if the cartridge is battery backed.
    fn save_ram(&self) -> Result<Vec<u8>, SaveError>;
}

dyn_clone::clone_trait_object!(Mapper);

/// Creates a new `Mapper` for the given ROM and `CartConfig`.
pub fn new(config: CartConfig, rom: Arc<[u8]>) -> Box<dyn Mapper> {
    match config.cart_type {
        CartType::RomOnly { .. } => Box::new(NoMbc::new(config, rom)),
        CartType::Mbc1 { .. } => Box::new(Mbc1::new(config, rom)),
        CartType::Mbc3 { .. } => Box::new(Mbc3::new(config, rom)),
        CartType::Mbc5 { .. } => Box::new(Mbc5::new(config, rom)),
    }
}
