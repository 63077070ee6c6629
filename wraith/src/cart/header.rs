use crate::error::CartridgeError;

/// The cartridge header. Per the Pan Docs, the header of the ROM occupies the region between
/// `0x100` and `0x14F`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeHeader {
    /// The memory region between `0x134` and `0x143`, up to the first NUL byte. Newer carts reuse
    /// the last few bytes for a manufacturer code and the CGB flag, so this can pick up junk.
    pub title: String,
    /// The byte at `0x143`. `0x80` marks a cart that also runs on the monochrome model; `0xC0` a
    /// cart that only runs on the color model.
    pub cgb_flag: u8,
    /// The byte at `0x147`. Selects the bank controller.
    pub cartridge_type: u8,
    /// The byte at `0x148`. The ROM holds `2 << rom_size` banks of 16 KiB.
    pub rom_size: u8,
    /// The byte at `0x149`.
    pub ram_size: u8,
    /// The byte at `0x14D`. On start, the header is checksummed. The check spans `0x134` through
    /// `0x14C`:
    /// ```text
    /// let mut checksum = 0u8;
    /// for b in rom[0x134..0x14D] {
    ///     checksum = checksum - b - 1;
    /// }
    /// ```
    pub header_checksum: u8,
}

impl CartridgeHeader {
    pub const START_ADDR: usize = 0x100;
    pub const END_ADDR: usize = 0x14F;

    pub fn extract_from_rom(rom: &[u8]) -> Result<Self, CartridgeError> {
        if rom.len() <= Self::END_ADDR {
            return Err(CartridgeError::TooShort { len: rom.len() });
        }
        let title = rom[0x134..=0x143]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect();
        Ok(Self {
            title,
            cgb_flag: rom[0x143],
            cartridge_type: rom[0x147],
            rom_size: rom[0x148],
            ram_size: rom[0x149],
            header_checksum: rom[0x14D],
        })
    }

    /// Whether the cart advertises color support.
    pub fn supports_cgb(&self) -> bool {
        matches!(self.cgb_flag, 0x80 | 0xC0)
    }

    /// The number of 16 KiB ROM banks the header claims.
    pub fn rom_banks(&self) -> usize {
        match self.rom_size {
            n @ 0x00..=0x08 => 2 << n,
            0x52 => 72,
            0x53 => 80,
            0x54 => 96,
            _ => 2,
        }
    }

    /// The number of 8 KiB RAM banks the header claims.
    pub fn ram_banks(&self) -> usize {
        match self.ram_size {
            0x02 => 1,
            0x03 => 4,
            0x04 => 16,
            0x05 => 8,
            _ => 0,
        }
    }

    /// Recomputes the header checksum over the given image.
    pub fn compute_checksum(rom: &[u8]) -> u8 {
        rom[0x134..=0x14C]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> Vec<u8> {
        let mut rom = vec![0; 0x8000];
        rom[0x134..0x134 + 5].copy_from_slice(b"WRATH");
        rom[0x143] = 0x80;
        rom[0x147] = 0x13;
        rom[0x148] = 0x05;
        rom[0x149] = 0x03;
        rom[0x14D] = CartridgeHeader::compute_checksum(&rom);
        rom
    }

    #[test]
    fn header_fields() {
        let rom = image();
        let header = CartridgeHeader::extract_from_rom(&rom).unwrap();
        assert_eq!(header.title, "WRATH");
        assert!(header.supports_cgb());
        assert_eq!(header.cartridge_type, 0x13);
        assert_eq!(header.rom_banks(), 64);
        assert_eq!(header.ram_banks(), 4);
        assert_eq!(header.header_checksum, CartridgeHeader::compute_checksum(&rom));
    }

    #[test]
    fn short_images_are_rejected() {
        assert_eq!(
            CartridgeHeader::extract_from_rom(&[0; 0x100]),
            Err(CartridgeError::TooShort { len: 0x100 })
        );
    }
}
