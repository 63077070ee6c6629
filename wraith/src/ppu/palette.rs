use crate::cpu::check_bit_const;
use crate::ppu::Pixel;

/// The intensity of each of the four DMG shades, lightest first.
const SHADES: [u8; 4] = [0x1F, 0x15, 0x0A, 0x00];

/// One of BGP, OBP0 or OBP1. Each pair of bits maps a color index onto one of the four shades,
/// with color 0 in the lowest pair.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct MonoPalette(pub u8);

impl MonoPalette {
    pub fn shade(self, color: u8) -> Pixel {
        let level = SHADES[((self.0 >> (2 * (color & 0b11))) & 0b11) as usize];
        Pixel {
            r: level,
            g: level,
            b: level,
        }
    }
}

/// The eight color palettes for either the background or objects, plus the index register the
/// CPU uses to reach into them (BCPS/OCPS). Bits 0-5 of the index pick one of the 64 bytes; bit 7
/// makes every write through the data register advance the index.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Default)]
pub struct ColorPalettes {
    index: u8,
    data: [Palette; 8],
}

impl ColorPalettes {
    /// The state the boot ROM leaves the background palettes in.
    pub fn white() -> Self {
        Self {
            index: 0,
            data: [Palette {
                colors: [PaletteColor([0xFF, 0x7F]); 4],
            }; 8],
        }
    }

    fn indices(&self) -> (usize, u8) {
        let index = self.index & 0b0011_1111;
        (((index & 0b0011_1000) >> 3) as usize, index & 0b111)
    }

    pub fn read_index(&self) -> u8 {
        // Bit 6 is unused
        self.index | 0b0100_0000
    }

    pub fn write_index(&mut self, value: u8) {
        self.index = value & 0b1011_1111;
    }

    pub fn read_data(&self) -> u8 {
        let (a, b) = self.indices();
        self.data[a].byte(b)
    }

    pub fn write_data(&mut self, value: u8) {
        let (a, b) = self.indices();
        self.data[a].set_byte(b, value);
        if check_bit_const::<7>(self.index) {
            // Only the low six bits count, the auto-increment flag survives the wrap
            self.index = (self.index & 0x80) | (self.index.wrapping_add(1) & 0b0011_1111);
        }
    }

    pub fn get(&self, palette: u8, color: u8) -> Pixel {
        self.data[(palette & 0b111) as usize].get_color(color).into()
    }
}

/// All of the data for one of the 8 palettes that can be held in memory.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct Palette {
    colors: [PaletteColor; 4],
}

impl Palette {
    pub fn get_color(&self, index: u8) -> PaletteColor {
        self.colors[(index & 0b11) as usize]
    }

    fn byte(&self, index: u8) -> u8 {
        self.colors[(index & 0b110) as usize >> 1].0[(index & 0b1) as usize]
    }

    fn set_byte(&mut self, index: u8, value: u8) {
        self.colors[(index & 0b110) as usize >> 1].0[(index & 0b1) as usize] = value;
    }
}

/// The colors inside a palette are a bit odd. Each color takes up two bytes and represents each
/// color with 5 bits (in little-endian). The top bit is not used.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct PaletteColor(pub [u8; 2]);

impl PaletteColor {
    pub fn r(&self) -> u8 {
        self.0[0] & 0b0001_1111
    }

    pub fn g(&self) -> u8 {
        ((self.0[0] & 0b1110_0000) >> 5) | ((self.0[1] & 0b0000_0011) << 3)
    }

    pub fn b(&self) -> u8 {
        (self.0[1] & 0b0111_1100) >> 2
    }
}

impl From<PaletteColor> for Pixel {
    fn from(value: PaletteColor) -> Self {
        Pixel {
            r: value.r(),
            g: value.g(),
            b: value.b(),
        }
    }
}
