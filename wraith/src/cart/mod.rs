//! The cartridge: a ROM image, optional external RAM and the bank controller that decides which
//! parts of them are visible on the bus.

use std::borrow::Cow;

use tracing::{debug, info, warn};

use crate::error::CartridgeError;
use crate::mem::Device;

mod header;
mod mbc1;
mod mbc3;
mod mbc5;

pub use header::CartridgeHeader;
pub use mbc1::*;
pub use mbc3::*;
pub use mbc5::*;

pub const ROM_BANK_SIZE: usize = 0x4000;
pub const RAM_BANK_SIZE: usize = 0x2000;

/// Decodes writes to the ROM region into bank selections. The controller never sees the bus; the
/// cartridge asks it which banks are active and does the address arithmetic itself.
#[derive(Debug, Clone)]
pub enum BankController {
    /// There is no controller. Bank 1 is always mapped at 0x4000 and RAM, if any, is always
    /// enabled. Unknown cartridge types fall back to this.
    None,
    /// See the [Pan Docs](https://gbdev.io/pandocs/MBC1.html).
    Mbc1(Mbc1),
    /// See the [Pan Docs](https://gbdev.io/pandocs/MBC3.html).
    Mbc3(Mbc3),
    /// See the [Pan Docs](https://gbdev.io/pandocs/MBC5.html).
    Mbc5(Mbc5),
}

impl BankController {
    /// Picks the controller for a cartridge type code.
    pub fn from_type(code: u8) -> Self {
        match code {
            0x00 => {
                debug!("Cartridge has no bank controller");
                Self::None
            }
            0x01..=0x03 => Self::Mbc1(Mbc1::new()),
            0x0F | 0x10 => Self::Mbc3(Mbc3::new(true)),
            0x11..=0x13 => Self::Mbc3(Mbc3::new(false)),
            0x19..=0x1E => Self::Mbc5(Mbc5::new()),
            n => {
                warn!("Cartridge type 0x{n:0>2X} is not supported, falling back to no controller");
                Self::None
            }
        }
    }

    /// Whether carts using this type code carry external RAM.
    fn type_has_ram(code: u8) -> bool {
        matches!(code, 0x02 | 0x03 | 0x10 | 0x12 | 0x13 | 0x1A | 0x1B | 0x1D | 0x1E)
    }

    pub fn decode_write(&mut self, addr: u16, value: u8) {
        match self {
            Self::None => {}
            Self::Mbc1(mbc) => mbc.decode_write(addr, value),
            Self::Mbc3(mbc) => mbc.decode_write(addr, value),
            Self::Mbc5(mbc) => mbc.decode_write(addr, value),
        }
    }

    /// The bank mapped into 0x4000-0x7FFF, before wrapping to the ROM size.
    pub fn rom_bank(&self) -> usize {
        match self {
            Self::None => 1,
            Self::Mbc1(mbc) => mbc.rom_bank(),
            Self::Mbc3(mbc) => mbc.rom_bank(),
            Self::Mbc5(mbc) => mbc.rom_bank(),
        }
    }

    /// The bank mapped into 0xA000-0xBFFF, before wrapping to the RAM size.
    pub fn ram_bank(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Mbc1(mbc) => mbc.ram_bank(),
            Self::Mbc3(mbc) => mbc.ram_bank(),
            Self::Mbc5(mbc) => mbc.ram_bank(),
        }
    }

    pub fn ram_enabled(&self) -> bool {
        match self {
            Self::None | Self::Mbc5(_) => true,
            Self::Mbc1(mbc) => mbc.ram_enabled(),
            Self::Mbc3(mbc) => mbc.ram_enabled(),
        }
    }

    fn read_rtc(&self) -> Option<u8> {
        match self {
            Self::Mbc3(mbc) => mbc.read_rtc(),
            _ => None,
        }
    }

    fn write_rtc(&mut self, value: u8) -> bool {
        match self {
            Self::Mbc3(mbc) => mbc.write_rtc(value),
            _ => false,
        }
    }
}

/// The bus device that answers for 0x0000-0x7FFF and 0xA000-0xBFFF.
#[derive(Debug, Clone)]
pub struct Cartridge {
    header: CartridgeHeader,
    rom: Vec<u8>,
    ram: Vec<u8>,
    controller: BankController,
}

impl Cartridge {
    pub fn new<'a, C: Into<Cow<'a, [u8]>>>(cart: C) -> Result<Self, CartridgeError> {
        let rom = cart.into().into_owned();
        let header = CartridgeHeader::extract_from_rom(&rom)?;
        let computed = CartridgeHeader::compute_checksum(&rom);
        if computed != header.header_checksum {
            warn!(
                "Header checksum mismatch: header says 0x{:0>2X}, computed 0x{computed:0>2X}",
                header.header_checksum
            );
        }
        let controller = BankController::from_type(header.cartridge_type);
        let needs_ram = matches!(controller, BankController::None)
            || BankController::type_has_ram(header.cartridge_type);
        let ram_banks = match header.ram_banks() {
            0 if needs_ram => 1,
            n => n,
        };
        let cart = Self {
            ram: vec![0; ram_banks * RAM_BANK_SIZE],
            rom,
            controller,
            header,
        };
        info!(
            "Loaded \"{}\": type 0x{:0>2X}, {} ROM banks, {} RAM banks, CGB {}",
            cart.header.title,
            cart.header.cartridge_type,
            cart.rom_banks(),
            ram_banks,
            if cart.header.supports_cgb() { "yes" } else { "no" }
        );
        Ok(cart)
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn controller(&self) -> &BankController {
        &self.controller
    }

    /// Replaces the controller, e.g. to inject a clock into an RTC cart.
    pub fn set_controller(&mut self, controller: BankController) {
        self.controller = controller;
    }

    /// The number of 16 KiB banks actually present in the image.
    pub fn rom_banks(&self) -> usize {
        self.rom.len().div_ceil(ROM_BANK_SIZE).max(1)
    }

    fn ram_banks(&self) -> usize {
        self.ram.len() / RAM_BANK_SIZE
    }

    /// Translates an address in the switchable ROM window into an offset into the image.
    fn rom_offset(&self, addr: u16) -> usize {
        let bank = self.controller.rom_bank() % self.rom_banks();
        bank * ROM_BANK_SIZE + (addr as usize - 0x4000)
    }

    /// Translates an address in the RAM window into an offset into external RAM. `None` when RAM
    /// is disabled or absent.
    fn ram_offset(&self, addr: u16) -> Option<usize> {
        if !self.controller.ram_enabled() || self.ram.is_empty() {
            return None;
        }
        let bank = self.controller.ram_bank() % self.ram_banks();
        Some(bank * RAM_BANK_SIZE + (addr as usize - 0xA000))
    }
}

impl Device for Cartridge {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x3FFF => self.rom.get(addr as usize).copied().unwrap_or(0xFF),
            0x4000..=0x7FFF => self
                .rom
                .get(self.rom_offset(addr))
                .copied()
                .unwrap_or(0xFF),
            0xA000..=0xBFFF => match self.controller.read_rtc() {
                Some(val) => val,
                None => self.ram_offset(addr).map_or(0xFF, |i| self.ram[i]),
            },
            _ => unreachable!("The cartridge does not own 0x{addr:0>4X}"),
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x7FFF => self.controller.decode_write(addr, value),
            0xA000..=0xBFFF => {
                if self.controller.write_rtc(value) {
                    return;
                }
                if let Some(i) = self.ram_offset(addr) {
                    self.ram[i] = value;
                }
            }
            _ => unreachable!("The cartridge does not own 0x{addr:0>4X}"),
        }
    }

    fn owns(&self, addr: u16) -> bool {
        matches!(addr, 0x0000..=0x7FFF | 0xA000..=0xBFFF)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use time::OffsetDateTime;

    use super::*;

    /// Builds an image where every byte of a ROM bank holds that bank's number.
    fn image(cart_type: u8, rom_size: u8, ram_size: u8) -> Vec<u8> {
        let banks = 2usize << rom_size;
        let mut rom: Vec<u8> = (0..banks)
            .flat_map(|bank| std::iter::repeat(bank as u8).take(ROM_BANK_SIZE))
            .collect();
        rom[0x147] = cart_type;
        rom[0x148] = rom_size;
        rom[0x149] = ram_size;
        rom[0x14D] = CartridgeHeader::compute_checksum(&rom);
        rom
    }

    #[test_log::test]
    fn no_controller_maps_bank_one() {
        let mut cart = Cartridge::new(image(0x00, 0x00, 0x00)).unwrap();
        assert_eq!(cart.read(0x0000), 0);
        assert_eq!(cart.read(0x4000), 1);
        cart.write(0x2000, 0x05);
        assert_eq!(cart.read(0x7FFF), 1);
        // RAM is always on
        cart.write(0xA123, 0x42);
        assert_eq!(cart.read(0xA123), 0x42);
    }

    #[test]
    fn unknown_types_fall_back() {
        let cart = Cartridge::new(image(0xFC, 0x00, 0x00)).unwrap();
        assert!(matches!(cart.controller(), BankController::None));
    }

    #[test]
    fn mbc1_switches_banks() {
        let mut cart = Cartridge::new(image(0x03, 0x03, 0x03)).unwrap();
        assert_eq!(cart.read(0x4000), 1);
        cart.write(0x2000, 0x07);
        assert_eq!(cart.read(0x4000), 7);
        cart.write(0x2000, 0x00);
        assert_eq!(cart.read(0x4000), 1);
        // Banks past the end of the image wrap
        cart.write(0x2000, 0x13);
        assert_eq!(cart.read(0x4000), 0x03);
    }

    #[test]
    fn mbc1_ram_gate_and_banks() {
        let mut cart = Cartridge::new(image(0x03, 0x03, 0x03)).unwrap();
        cart.write(0xA000, 0x11);
        assert_eq!(cart.read(0xA000), 0xFF);
        cart.write(0x0000, 0x0A);
        cart.write(0xA000, 0x11);
        cart.write(0x6000, 0x01);
        cart.write(0x4000, 0x02);
        cart.write(0xA000, 0x22);
        assert_eq!(cart.read(0xA000), 0x22);
        cart.write(0x4000, 0x00);
        assert_eq!(cart.read(0xA000), 0x11);
        cart.write(0x0000, 0x00);
        assert_eq!(cart.read(0xA000), 0xFF);
    }

    #[test]
    fn mbc3_maps_rtc_into_ram_window() {
        fn fixed() -> OffsetDateTime {
            datetime!(2000-01-01 08:15:30 UTC)
        }
        let mut cart = Cartridge::new(image(0x10, 0x02, 0x03)).unwrap();
        cart.set_controller(BankController::Mbc3(Mbc3::with_clock(true, fixed)));
        cart.write(0xA000, 0x99);
        cart.write(0x4000, 0x0A);
        assert_eq!(cart.read(0xA000), 8);
        cart.write(0x4000, 0x09);
        assert_eq!(cart.read(0xBFFF), 15);
        cart.write(0x4000, 0x00);
        assert_eq!(cart.read(0xA000), 0x99);
        cart.write(0x2000, 0x05);
        assert_eq!(cart.read(0x4000), 5);
    }

    #[test]
    fn mbc5_reaches_high_banks() {
        let mut cart = Cartridge::new(image(0x19, 0x08, 0x00)).unwrap();
        assert_eq!(cart.rom_banks(), 512);
        cart.write(0x2000, 0x02);
        cart.write(0x3000, 0x01);
        // Bank 0x102 holds its number truncated to a byte
        assert_eq!(cart.read(0x4000), 0x02);
        assert_eq!(cart.controller().rom_bank(), 0x102);
        cart.write(0x2000, 0x00);
        cart.write(0x3000, 0x00);
        assert_eq!(cart.read(0x4000), 0x00);
    }

    #[test]
    fn rtc_cart_without_ram_size_gets_one_bank() {
        let cart = Cartridge::new(image(0x10, 0x00, 0x00)).unwrap();
        assert_eq!(cart.ram_banks(), 1);
        let cart = Cartridge::new(image(0x11, 0x00, 0x00)).unwrap();
        assert_eq!(cart.ram_banks(), 0);
    }
}
