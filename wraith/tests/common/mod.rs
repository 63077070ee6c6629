#![allow(dead_code)]

use wraith::cart::CartridgeHeader;

/// Where test programs are placed. The entry point at 0x100 jumps here, past the header.
pub const PROGRAM_START: u16 = 0x0150;

/// Builds a cartridge image around a test program. Every switchable ROM bank is filled with its
/// own bank number so banking is easy to observe.
pub struct RomBuilder {
    rom: Vec<u8>,
}

impl RomBuilder {
    pub fn new(program: &[u8]) -> Self {
        let mut rom = vec![0; 0x8000];
        // NOP; JP $0150
        rom[0x100..0x104].copy_from_slice(&[0x00, 0xC3, 0x50, 0x01]);
        rom[0x134..0x134 + 11].copy_from_slice(b"WRAITH TEST");
        let start = PROGRAM_START as usize;
        rom[start..start + program.len()].copy_from_slice(program);
        Self { rom }
    }

    pub fn color(mut self) -> Self {
        self.rom[0x143] = 0xC0;
        self
    }

    pub fn cartridge_type(mut self, code: u8, rom_size: u8, ram_size: u8) -> Self {
        let banks = 2usize << rom_size;
        self.rom.resize(banks * 0x4000, 0);
        for bank in 1..banks {
            self.rom[bank * 0x4000..(bank + 1) * 0x4000].fill(bank as u8);
        }
        self.rom[0x147] = code;
        self.rom[0x148] = rom_size;
        self.rom[0x149] = ram_size;
        self
    }

    /// Places code at an interrupt vector or any other fixed address in bank 0.
    pub fn at(mut self, addr: u16, code: &[u8]) -> Self {
        let start = addr as usize;
        self.rom[start..start + code.len()].copy_from_slice(code);
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.rom[0x14D] = CartridgeHeader::compute_checksum(&self.rom);
        self.rom
    }
}
