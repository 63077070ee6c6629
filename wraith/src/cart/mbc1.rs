use tracing::trace;

/// The first bank controller.
///
/// The bank register is a full byte. Writing one of the values `0x00`, `0x20`, `0x40` or `0x60`
/// selects the bank after it instead, since those banks would alias bank 0 on real hardware.
#[derive(Debug, Hash, Clone, PartialEq, Eq)]
pub struct Mbc1 {
    bank: u8,
    /// The secondary two-bit register at 0x4000-0x5FFF.
    upper: u8,
    banking_mode: BankingMode,
    /// Initially `false`. Any write to 0x0000 through 0x1FFF updates this.
    ram_enabled: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BankingMode {
    /// The secondary register extends the ROM bank number.
    #[default]
    Simple,
    /// The secondary register selects the RAM bank.
    Advanced,
}

impl Mbc1 {
    pub fn new() -> Self {
        Self {
            bank: 1,
            upper: 0,
            banking_mode: BankingMode::Simple,
            ram_enabled: false,
        }
    }

    pub fn decode_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram_enabled = value & 0x0F == 0x0A,
            0x2000..=0x3FFF => {
                self.bank = value;
                if matches!(self.bank, 0x00 | 0x20 | 0x40 | 0x60) {
                    self.bank += 1;
                }
                trace!("MBC1 ROM bank register set to 0x{:0>2X}", self.bank);
            }
            0x4000..=0x5FFF => self.upper = value & 0b11,
            0x6000..=0x7FFF => {
                self.banking_mode = if value & 1 == 0 {
                    BankingMode::Simple
                } else {
                    BankingMode::Advanced
                };
            }
            _ => {}
        }
    }

    pub fn rom_bank(&self) -> usize {
        match self.banking_mode {
            BankingMode::Simple => self.bank as usize | (self.upper as usize) << 5,
            BankingMode::Advanced => self.bank as usize,
        }
    }

    pub fn ram_bank(&self) -> usize {
        match self.banking_mode {
            BankingMode::Simple => 0,
            BankingMode::Advanced => self.upper as usize,
        }
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }
}

impl Default for Mbc1 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_banks_skip_ahead() {
        let mut mbc = Mbc1::new();
        assert_eq!(mbc.rom_bank(), 1);
        for (written, selected) in [(0x00, 0x01), (0x20, 0x21), (0x40, 0x41), (0x60, 0x61)] {
            mbc.decode_write(0x2000, written);
            assert_eq!(mbc.rom_bank(), selected);
        }
        mbc.decode_write(0x3FFF, 0x05);
        assert_eq!(mbc.rom_bank(), 0x05);
    }

    #[test]
    fn secondary_register_depends_on_mode() {
        let mut mbc = Mbc1::new();
        mbc.decode_write(0x2000, 0x03);
        mbc.decode_write(0x4000, 0x02);
        assert_eq!(mbc.rom_bank(), 0x43);
        assert_eq!(mbc.ram_bank(), 0);
        mbc.decode_write(0x6000, 0x01);
        assert_eq!(mbc.rom_bank(), 0x03);
        assert_eq!(mbc.ram_bank(), 2);
    }

    #[test]
    fn ram_gate() {
        let mut mbc = Mbc1::new();
        assert!(!mbc.ram_enabled());
        mbc.decode_write(0x0000, 0x0A);
        assert!(mbc.ram_enabled());
        mbc.decode_write(0x1FFF, 0x00);
        assert!(!mbc.ram_enabled());
    }
}
