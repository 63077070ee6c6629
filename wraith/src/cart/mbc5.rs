use tracing::trace;

/// The fifth bank controller. The ROM bank number is nine bits wide and split across two
/// registers. There is no RAM gate.
#[derive(Debug, Default, Hash, Clone, PartialEq, Eq)]
pub struct Mbc5 {
    bank: u16,
    ram_bank: u8,
}

impl Mbc5 {
    pub fn new() -> Self {
        Self {
            bank: 1,
            ram_bank: 0,
        }
    }

    pub fn decode_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x2000..=0x2FFF => self.bank = (self.bank & 0x100) | value as u16,
            0x3000..=0x3FFF => self.bank = (self.bank & 0xFF) | ((value as u16 & 1) << 8),
            0x4000..=0x5FFF => self.ram_bank = value & 0x0F,
            _ => return,
        }
        trace!("MBC5 banks: ROM 0x{:0>3X}, RAM {}", self.bank, self.ram_bank);
    }

    /// Unlike the older controllers, bank 0 can be mapped into the switchable region.
    pub fn rom_bank(&self) -> usize {
        self.bank as usize
    }

    pub fn ram_bank(&self) -> usize {
        self.ram_bank as usize
    }
}
