//! Turning VRAM into pixels.
//!
//! Background and window are resolved a scanline at a time as each line leaves the drawing mode.
//! Objects are composited over the whole frame once it is complete, using the per-pixel background
//! info recorded while the lines were drawn to decide priority.

use crate::cpu::{check_bit, check_bit_const};
use crate::ppu::{Pixel, Ppu, SCREEN_HEIGHT, SCREEN_WIDTH};

/// What object compositing needs to know about a background or window pixel.
#[derive(Debug, Default, Hash, Clone, Copy, PartialEq, Eq)]
pub struct BgPixel {
    /// The 2-bit color index before the palette was applied. Color 0 never hides an object.
    pub color: u8,
    /// The tile's BG-over-OBJ attribute bit. Always clear on the monochrome model.
    pub priority: bool,
}

/// The attribute byte that sits next to every tile index in VRAM bank 1 on the color model.
#[derive(Debug, Default, Hash, Clone, Copy, PartialEq, Eq)]
struct TileAttrs(u8);

impl TileAttrs {
    fn palette(self) -> u8 {
        self.0 & 0b111
    }

    fn bank(self) -> usize {
        check_bit_const::<3>(self.0) as usize
    }

    fn x_flip(self) -> bool {
        check_bit_const::<5>(self.0)
    }

    fn y_flip(self) -> bool {
        check_bit_const::<6>(self.0)
    }

    fn priority(self) -> bool {
        check_bit_const::<7>(self.0)
    }
}

/// One entry of the object attribute table.
#[derive(Debug, Hash, Clone, Copy)]
pub struct OamObject {
    y: u8,
    x: u8,
    tile_index: u8,
    attrs: u8,
}

impl OamObject {
    fn new([y, x, tile_index, attrs]: [u8; 4]) -> Self {
        Self {
            y,
            x,
            tile_index,
            attrs,
        }
    }

    fn top(&self) -> i16 {
        self.y as i16 - 16
    }

    fn left(&self) -> i16 {
        self.x as i16 - 8
    }

    fn behind_bg(&self) -> bool {
        check_bit_const::<7>(self.attrs)
    }

    fn y_flip(&self) -> bool {
        check_bit_const::<6>(self.attrs)
    }

    fn x_flip(&self) -> bool {
        check_bit_const::<5>(self.attrs)
    }

    /// Picks OBP1 over OBP0 on the monochrome model.
    fn mono_palette(&self) -> bool {
        check_bit_const::<4>(self.attrs)
    }

    fn bank(&self) -> usize {
        check_bit_const::<3>(self.attrs) as usize
    }

    fn color_palette(&self) -> u8 {
        self.attrs & 0b111
    }
}

/// Used to generate pixel color indications, which have a color depth of 2. The leftmost pixel of
/// the row is stored in bit 7 and comes out first.
pub fn zip_bits(hi: u8, lo: u8) -> impl Iterator<Item = u8> {
    (0..8)
        .rev()
        .map(move |i| (check_bit(i, hi), check_bit(i, lo)))
        .map(|(hi, lo)| (hi as u8) << 1 | lo as u8)
}

/// The color index of a single pixel of a tile row.
fn tile_pixel(hi: u8, lo: u8, col: u8) -> u8 {
    let bit = 7 - (col & 0b111);
    (check_bit(bit, hi) as u8) << 1 | check_bit(bit, lo) as u8
}

impl Ppu {
    fn bg_enabled(&self) -> bool {
        check_bit_const::<0>(self.lcdc)
    }

    fn objects_enabled(&self) -> bool {
        check_bit_const::<1>(self.lcdc)
    }

    fn tall_objects(&self) -> bool {
        check_bit_const::<2>(self.lcdc)
    }

    fn bg_map(&self) -> u16 {
        if check_bit_const::<3>(self.lcdc) {
            0x9C00
        } else {
            0x9800
        }
    }

    fn window_enabled(&self) -> bool {
        check_bit_const::<5>(self.lcdc)
    }

    fn window_map(&self) -> u16 {
        if check_bit_const::<6>(self.lcdc) {
            0x9C00
        } else {
            0x9800
        }
    }

    fn vram_byte(&self, bank: usize, addr: u16) -> u8 {
        self.vram[bank][(addr - 0x8000) as usize]
    }

    /// The address of the first byte of a background or window tile. With LCDC bit 4 set, indices
    /// count up from 0x8000. Otherwise they are signed and centred on 0x9000.
    fn bg_tile_addr(&self, index: u8) -> u16 {
        if check_bit_const::<4>(self.lcdc) {
            0x8000 + 16 * index as u16
        } else {
            0x9000u16.wrapping_add_signed(16 * (index as i8) as i16)
        }
    }

    /// Resolves the pixel at `(x, y)` of the 256x256 plane described by the map at `map`.
    fn map_pixel(&self, map: u16, x: u8, y: u8) -> (Pixel, BgPixel) {
        let offset = map + 32 * (y as u16 / 8) + x as u16 / 8;
        let index = self.vram_byte(0, offset);
        let attrs = if self.color {
            TileAttrs(self.vram_byte(1, offset))
        } else {
            TileAttrs::default()
        };
        let row = if attrs.y_flip() { 7 - y % 8 } else { y % 8 };
        let col = if attrs.x_flip() { 7 - x % 8 } else { x % 8 };
        let addr = self.bg_tile_addr(index) + 2 * row as u16;
        let lo = self.vram_byte(attrs.bank(), addr);
        let hi = self.vram_byte(attrs.bank(), addr + 1);
        let color = tile_pixel(hi, lo, col);
        let pixel = if self.color {
            self.bg_palettes.get(attrs.palette(), color)
        } else {
            self.bgp.shade(color)
        };
        let info = BgPixel {
            color,
            priority: attrs.priority(),
        };
        (pixel, info)
    }

    /// Resolves background and window for the current scanline.
    pub(super) fn render_scanline(&mut self) {
        let y = self.ly;
        if y as usize >= SCREEN_HEIGHT {
            return;
        }
        // On the monochrome model, clearing LCDC bit 0 blanks both background and window. The color
        // model keeps drawing them and only drops their priority over objects.
        let blank = !self.color && !self.bg_enabled();
        let window = self.window_enabled() && y >= self.wy;
        for x in 0..SCREEN_WIDTH as u8 {
            let (pixel, info) = if blank {
                (self.bgp.shade(0), BgPixel::default())
            } else if window && x as u16 + 7 >= self.wx as u16 {
                let wx = (x as u16 + 7 - self.wx as u16) as u8;
                self.map_pixel(self.window_map(), wx, y - self.wy)
            } else {
                self.map_pixel(
                    self.bg_map(),
                    x.wrapping_add(self.scx),
                    y.wrapping_add(self.scy),
                )
            };
            self.screen.lines[y as usize][x as usize] = pixel;
            self.bg_info[y as usize][x as usize] = info;
        }
    }

    /// Draws the objects over the finished frame. Where objects overlap, the one listed first in
    /// OAM wins, even if the background then hides it.
    pub(super) fn composite_objects(&mut self) {
        if !self.objects_enabled() {
            return;
        }
        let height: i16 = if self.tall_objects() { 16 } else { 8 };
        let mut drawn = vec![[false; SCREEN_WIDTH]; SCREEN_HEIGHT];
        let oam = self.oam;
        for chunk in oam.chunks_exact(4) {
            let obj = OamObject::new([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let tile = if height == 16 {
                obj.tile_index & 0xFE
            } else {
                obj.tile_index
            };
            let bank = if self.color { obj.bank() } else { 0 };
            for row in 0..height {
                let y = obj.top() + row;
                if !(0..SCREEN_HEIGHT as i16).contains(&y) {
                    continue;
                }
                let tile_row = if obj.y_flip() { height - 1 - row } else { row };
                let addr = 0x8000 + 16 * tile as u16 + 2 * tile_row as u16;
                let lo = self.vram_byte(bank, addr);
                let hi = self.vram_byte(bank, addr + 1);
                for (col, color) in zip_bits(hi, lo).enumerate() {
                    let col = col as i16;
                    let x = obj.left() + if obj.x_flip() { 7 - col } else { col };
                    if !(0..SCREEN_WIDTH as i16).contains(&x) || color == 0 {
                        continue;
                    }
                    let (x, y) = (x as usize, y as usize);
                    if drawn[y][x] {
                        continue;
                    }
                    drawn[y][x] = true;
                    if self.hidden_by_bg(&obj, self.bg_info[y][x]) {
                        continue;
                    }
                    self.screen.lines[y][x] = if self.color {
                        self.obj_palettes.get(obj.color_palette(), color)
                    } else if obj.mono_palette() {
                        self.obp1.shade(color)
                    } else {
                        self.obp0.shade(color)
                    };
                }
            }
        }
    }

    fn hidden_by_bg(&self, obj: &OamObject, bg: BgPixel) -> bool {
        if bg.color == 0 {
            return false;
        }
        // LCDC bit 0 is a master switch for background priority on the color model
        if self.color && !self.bg_enabled() {
            return false;
        }
        obj.behind_bg() || bg.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_zipper() {
        let out = zip_bits(0, 0).collect::<Vec<_>>();
        assert_eq!(vec![0; 8], out);
        let out = zip_bits(0xFF, 0xFF).collect::<Vec<_>>();
        assert_eq!(vec![0b11; 8], out);
        let out = zip_bits(0b1000_0001, 0b1100_0000).collect::<Vec<_>>();
        assert_eq!(vec![3, 1, 0, 0, 0, 0, 0, 2], out);
    }

    #[test]
    fn single_pixels_match_the_zipper() {
        let (hi, lo) = (0x3C, 0x7E);
        let zipped = zip_bits(hi, lo).collect::<Vec<_>>();
        let single = (0..8).map(|col| tile_pixel(hi, lo, col)).collect::<Vec<_>>();
        assert_eq!(zipped, single);
    }

    #[test]
    fn object_offsets() {
        let obj = OamObject::new([16, 8, 0, 0b1011_0101]);
        assert_eq!((obj.top(), obj.left()), (0, 0));
        assert!(obj.behind_bg() && obj.x_flip() && obj.mono_palette());
        assert!(!obj.y_flip());
        assert_eq!(obj.color_palette(), 5);
        let obj = OamObject::new([0, 0, 0, 0]);
        assert_eq!((obj.top(), obj.left()), (-16, -8));
    }
}
