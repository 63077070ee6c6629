//! The Pixel Processing Unit.
//!
//! Video timing is a four-state machine driven by the cycles the CPU reports after each step. A
//! visible scanline spends 80 cycles scanning OAM, 172 drawing and 204 in HBlank, 456 in total.
//! After line 143 the engine sits in VBlank for ten more lines of 456 cycles, for a frame of
//! 70224 cycles. Under double speed every duration doubles since the CPU runs twice as many cycles
//! in the same time. Leftover cycles always carry into the next mode.

use tracing::{debug, warn};

use crate::cpu::check_bit_const;
use crate::interrupt::{Interrupt, InterruptRequester};
use crate::mem::Device;
use crate::Model;

pub mod dma;
pub mod palette;
mod render;

pub use dma::Dma;
pub use palette::{ColorPalettes, MonoPalette};
pub use render::{zip_bits, BgPixel};

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;
/// The number of CPU cycles in one frame at normal speed.
pub const FRAME_CYCLES: u32 = 70_224;
/// LY ranges over 0 through this value, inclusive.
const LAST_LINE: u8 = 153;

/// ADDR FF40
const LCDC: u16 = 0xFF40;
/// ADDR FF41
const STAT: u16 = 0xFF41;
/// ADDR FF42
const SCY: u16 = 0xFF42;
/// ADDR FF43
const SCX: u16 = 0xFF43;
/// ADDR FF44
const LY: u16 = 0xFF44;
/// ADDR FF45
const LYC: u16 = 0xFF45;
/// ADDR FF46
const DMA: u16 = 0xFF46;
/// ADDR FF47
const BGP: u16 = 0xFF47;
/// ADDR FF48
const OBP0: u16 = 0xFF48;
/// ADDR FF49
const OBP1: u16 = 0xFF49;
/// ADDR FF4A
const WY: u16 = 0xFF4A;
/// ADDR FF4B
const WX: u16 = 0xFF4B;
/// ADDR FF4F
const VBK: u16 = 0xFF4F;
/// ADDR FF68
const BCPS: u16 = 0xFF68;
/// ADDR FF69
const BCPD: u16 = 0xFF69;
/// ADDR FF6A
const OCPS: u16 = 0xFF6A;
/// ADDR FF6B
const OCPD: u16 = 0xFF6B;

/// The STAT enable bits for each of the four status interrupt sources.
const STAT_HBLANK: u8 = 0b0000_1000;
const STAT_VBLANK: u8 = 0b0001_0000;
const STAT_OAM: u8 = 0b0010_0000;
const STAT_LYC: u8 = 0b0100_0000;

#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, derive_more::IsVariant, derive_more::Display,
)]
pub enum PpuMode {
    /// Also refered to as "Mode 2" in the pandocs.
    #[default]
    OamScan,
    /// Also refered to as "Mode 3" in the pandocs.
    Drawing,
    /// Also refered to as "Mode 0" in the pandocs.
    HBlank,
    /// Also refered to as "Mode 1" in the pandocs.
    VBlank,
}

impl PpuMode {
    /// How long the engine stays in this mode at normal speed. For VBlank, this is per line.
    pub const fn duration(self) -> u32 {
        match self {
            PpuMode::OamScan => 80,
            PpuMode::Drawing => 172,
            PpuMode::HBlank => 204,
            PpuMode::VBlank => 456,
        }
    }

    /// The mode number as reported in the low two bits of STAT.
    pub const fn stat_bits(self) -> u8 {
        match self {
            PpuMode::HBlank => 0,
            PpuMode::VBlank => 1,
            PpuMode::OamScan => 2,
            PpuMode::Drawing => 3,
        }
    }
}

/// The final pixel that is available to the end consumer. Each channel holds 5 bits.
#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const WHITE: Self = Self {
        r: 0x1F,
        g: 0x1F,
        b: 0x1F,
    };
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    /// Scales the 5-bit channels up to 8 bits.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r << 3, self.g << 3, self.b << 3, 0xFF]
    }
}

/// A complete screen's worth of pixels. The length of `lines` will always be 144.
#[derive(Debug, Hash, Clone, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<[Pixel; SCREEN_WIDTH]>,
}

impl Frame {
    fn new() -> Self {
        Self {
            lines: vec![[Pixel::WHITE; SCREEN_WIDTH]; SCREEN_HEIGHT],
        }
    }

    /// Builds a frame by asking for the pixel at each `(x, y)`.
    pub fn from_fn(mut f: impl FnMut(usize, usize) -> Pixel) -> Self {
        Self {
            lines: (0..SCREEN_HEIGHT)
                .map(|y| std::array::from_fn(|x| f(x, y)))
                .collect(),
        }
    }

    pub fn lines(&self) -> &[[Pixel; SCREEN_WIDTH]] {
        &self.lines
    }

    pub fn pixel(&self, x: usize, y: usize) -> Pixel {
        self.lines[y][x]
    }

    /// Row-major RGBA bytes, as image encoders want them.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.lines
            .iter()
            .flatten()
            .flat_map(|pixel| pixel.to_rgba())
            .collect()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

/// The video engine. Owns VRAM (two banks on the color model), OAM, every LCD register, the color
/// palettes and the DMA engines.
#[derive(Debug, Clone)]
pub struct Ppu {
    color: bool,
    interrupts: InterruptRequester,
    mode: PpuMode,
    /// Cycles spent in the current mode so far.
    dots: u32,
    frame_ready: bool,
    screen: Frame,
    /// What the background looked like under each pixel of `screen`, for object priority.
    bg_info: Vec<[BgPixel; SCREEN_WIDTH]>,
    vram: Box<[[u8; 0x2000]; 2]>,
    vram_bank: usize,
    oam: [u8; 0xA0],
    /// ADDR FF40
    lcdc: u8,
    /// Bits 3-6 of STAT. The rest of the register is computed on read.
    stat_enable: u8,
    /// ADDR FF42
    scy: u8,
    /// ADDR FF43
    scx: u8,
    /// ADDR FF44
    ly: u8,
    /// ADDR FF45
    lyc: u8,
    bgp: MonoPalette,
    obp0: MonoPalette,
    obp1: MonoPalette,
    /// ADDR FF4A
    wy: u8,
    /// ADDR FF4B
    wx: u8,
    bg_palettes: ColorPalettes,
    obj_palettes: ColorPalettes,
    pub dma: Dma,
}

impl Ppu {
    pub fn new(model: Model, interrupts: InterruptRequester) -> Self {
        Self {
            color: model == Model::Cgb,
            interrupts,
            mode: PpuMode::OamScan,
            dots: 0,
            frame_ready: false,
            screen: Frame::new(),
            bg_info: vec![[BgPixel::default(); SCREEN_WIDTH]; SCREEN_HEIGHT],
            vram: Box::new([[0; 0x2000]; 2]),
            vram_bank: 0,
            oam: [0; 0xA0],
            lcdc: 0x91,
            stat_enable: 0,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            bgp: MonoPalette(0xFC),
            obp0: MonoPalette(0xFF),
            obp1: MonoPalette(0xFF),
            wy: 0,
            wx: 0,
            bg_palettes: ColorPalettes::white(),
            obj_palettes: ColorPalettes::default(),
            dma: Dma::new(),
        }
    }

    pub fn mode(&self) -> PpuMode {
        self.mode
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }

    pub fn lcd_enabled(&self) -> bool {
        check_bit_const::<7>(self.lcdc)
    }

    /// Whether a frame has been completed since the last call to `take_frame`.
    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    /// Returns the completed frame and clears the ready flag. `None` if the engine has not
    /// finished a frame since the last call.
    pub fn take_frame(&mut self) -> Option<&Frame> {
        std::mem::take(&mut self.frame_ready).then_some(&self.screen)
    }

    /// The screen as it currently stands, possibly half drawn.
    pub fn screen(&self) -> &Frame {
        &self.screen
    }

    /// Stores a byte on behalf of a DMA transfer. DMA only ever targets OAM or VRAM.
    pub fn dma_store(&mut self, dest: u16, byte: u8) {
        match dest {
            0x8000..=0x9FFF => self.vram[self.vram_bank][(dest - 0x8000) as usize] = byte,
            0xFE00..=0xFE9F => self.oam[(dest - 0xFE00) as usize] = byte,
            _ => unreachable!("DMA does not target 0x{dest:0>4X}"),
        }
    }

    /// Runs the video engine for the given number of CPU cycles.
    pub fn advance(&mut self, cycles: u32, double_speed: bool) {
        self.dma.advance(cycles, double_speed);
        if !self.lcd_enabled() {
            return;
        }
        let scale = if double_speed { 2 } else { 1 };
        self.dots += cycles;
        while self.dots >= self.mode.duration() * scale {
            self.dots -= self.mode.duration() * scale;
            self.next_mode();
        }
    }

    fn next_mode(&mut self) {
        match self.mode {
            PpuMode::OamScan => self.mode = PpuMode::Drawing,
            PpuMode::Drawing => {
                self.render_scanline();
                self.mode = PpuMode::HBlank;
                self.stat_source(STAT_HBLANK);
                self.dma.hblank_burst();
            }
            PpuMode::HBlank => {
                self.set_ly(self.ly + 1);
                if self.ly as usize == SCREEN_HEIGHT {
                    self.composite_objects();
                    self.mode = PpuMode::VBlank;
                    self.frame_ready = true;
                    debug!("Frame complete");
                    self.interrupts.request(Interrupt::VBlank);
                    self.stat_source(STAT_VBLANK);
                } else {
                    self.mode = PpuMode::OamScan;
                    self.stat_source(STAT_OAM);
                }
            }
            PpuMode::VBlank if self.ly == LAST_LINE => {
                self.set_ly(0);
                self.mode = PpuMode::OamScan;
                self.stat_source(STAT_OAM);
            }
            PpuMode::VBlank => self.set_ly(self.ly + 1),
        }
    }

    fn set_ly(&mut self, ly: u8) {
        self.ly = ly;
        if self.ly == self.lyc {
            self.stat_source(STAT_LYC);
        }
    }

    /// Moving LYC onto the current line is a coincidence edge just like LY moving onto LYC.
    fn write_lyc(&mut self, value: u8) {
        let was_equal = self.ly == self.lyc;
        self.lyc = value;
        if !was_equal && self.ly == self.lyc {
            self.stat_source(STAT_LYC);
        }
    }

    /// Raises the status interrupt if the given source is enabled in STAT. Sources are only
    /// checked on the transition into the matching condition, so each edge requests once.
    fn stat_source(&self, source: u8) {
        if self.lcd_enabled() && self.stat_enable & source != 0 {
            self.interrupts.request(Interrupt::Status);
        }
    }

    fn write_lcdc(&mut self, value: u8) {
        let was_on = self.lcd_enabled();
        self.lcdc = value;
        match (was_on, self.lcd_enabled()) {
            (true, false) => {
                debug!("LCD off");
                self.ly = 0;
                self.dots = 0;
                self.mode = PpuMode::HBlank;
            }
            (false, true) => {
                debug!("LCD on");
                self.dots = 0;
                self.mode = PpuMode::OamScan;
                self.set_ly(0);
            }
            _ => {}
        }
    }

    fn read_stat(&self) -> u8 {
        0x80 | self.stat_enable | ((self.ly == self.lyc) as u8) << 2 | self.mode.stat_bits()
    }
}

impl Device for Ppu {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x8000..=0x9FFF => self.vram[self.vram_bank][(addr - 0x8000) as usize],
            0xFE00..=0xFE9F => self.oam[(addr - 0xFE00) as usize],
            0xFEA0..=0xFEFF => 0,
            LCDC => self.lcdc,
            STAT => self.read_stat(),
            SCY => self.scy,
            SCX => self.scx,
            LY => self.ly,
            LYC => self.lyc,
            DMA => self.dma.read_oam_register(),
            BGP => self.bgp.0,
            OBP0 => self.obp0.0,
            OBP1 => self.obp1.0,
            WY => self.wy,
            WX => self.wx,
            VBK => 0xFE | self.vram_bank as u8,
            0xFF51..=0xFF55 => self.dma.read_vram_register(addr),
            BCPS => self.bg_palettes.read_index(),
            BCPD => self.bg_palettes.read_data(),
            OCPS => self.obj_palettes.read_index(),
            OCPD => self.obj_palettes.read_data(),
            _ => unreachable!("The PPU does not own 0x{addr:0>4X}"),
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x8000..=0x9FFF => self.vram[self.vram_bank][(addr - 0x8000) as usize] = value,
            0xFE00..=0xFE9F => self.oam[(addr - 0xFE00) as usize] = value,
            0xFEA0..=0xFEFF => {}
            LCDC => self.write_lcdc(value),
            STAT => self.stat_enable = value & 0b0111_1000,
            SCY => self.scy = value,
            SCX => self.scx = value,
            LY => warn!("Ignoring write of 0x{value:0>2X} to read-only LY"),
            LYC => self.write_lyc(value),
            DMA => self.dma.start_oam(value),
            BGP => self.bgp = MonoPalette(value),
            OBP0 => self.obp0 = MonoPalette(value),
            OBP1 => self.obp1 = MonoPalette(value),
            WY => self.wy = value,
            WX => self.wx = value,
            VBK => self.vram_bank = (value & 0x01) as usize,
            0xFF51..=0xFF55 => self.dma.write_vram_register(addr, value),
            BCPS => self.bg_palettes.write_index(value),
            BCPD => self.bg_palettes.write_data(value),
            OCPS => self.obj_palettes.write_index(value),
            OCPD => self.obj_palettes.write_data(value),
            _ => unreachable!("The PPU does not own 0x{addr:0>4X}"),
        }
    }

    /// The color-only registers are left to the I/O block on the monochrome model, where they are
    /// plain storage.
    fn owns(&self, addr: u16) -> bool {
        match addr {
            0x8000..=0x9FFF | 0xFE00..=0xFEFF | LCDC..=WX => true,
            VBK | 0xFF51..=0xFF55 | BCPS..=OCPD => self.color,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupt::{InterruptController, IE_ADDR, IF_ADDR};

    fn ppu(model: Model) -> (Ppu, InterruptController) {
        let mut ic = InterruptController::new();
        ic.write(IE_ADDR, 0x1F);
        (Ppu::new(model, ic.requester()), ic)
    }

    fn clear(ic: &mut InterruptController) {
        ic.write(IF_ADDR, 0);
    }

    #[test]
    fn test_scan_line_timing() {
        let (mut ppu, _) = ppu(Model::Dmg);
        ppu.advance(79, false);
        assert_eq!(ppu.mode(), PpuMode::OamScan);
        ppu.advance(1, false);
        assert_eq!(ppu.mode(), PpuMode::Drawing);
        ppu.advance(172, false);
        assert_eq!(ppu.mode(), PpuMode::HBlank);
        assert_eq!(ppu.ly(), 0);
        ppu.advance(203, false);
        assert_eq!(ppu.mode(), PpuMode::HBlank);
        ppu.advance(1, false);
        assert_eq!(ppu.mode(), PpuMode::OamScan);
        assert_eq!(ppu.ly(), 1);
    }

    #[test]
    fn test_frame_render_timing() {
        let (mut ppu, ic) = ppu(Model::Dmg);
        ppu.advance(456 * 144 - 1, false);
        assert_eq!(ppu.ly(), 143);
        assert!(!ppu.frame_ready());
        ppu.advance(1, false);
        assert_eq!(ppu.mode(), PpuMode::VBlank);
        assert_eq!(ppu.ly(), 144);
        assert!(ppu.frame_ready());
        assert_eq!(ic.pending(), Interrupt::VBlank.mask());
        ppu.advance(456 * 9, false);
        assert_eq!(ppu.ly(), 153);
        ppu.advance(455, false);
        assert_eq!(ppu.mode(), PpuMode::VBlank);
        ppu.advance(1, false);
        assert_eq!(ppu.mode(), PpuMode::OamScan);
        assert_eq!(ppu.ly(), 0);
        assert!(ppu.take_frame().is_some());
        assert!(ppu.take_frame().is_none());
    }

    #[test]
    fn leftover_cycles_carry_over() {
        let (mut ppu, _) = ppu(Model::Dmg);
        // One big step covering three and a bit scanlines
        ppu.advance(3 * 456 + 90, false);
        assert_eq!(ppu.ly(), 3);
        assert_eq!(ppu.mode(), PpuMode::Drawing);
        ppu.advance(161, false);
        assert_eq!(ppu.mode(), PpuMode::Drawing);
        ppu.advance(1, false);
        assert_eq!(ppu.mode(), PpuMode::HBlank);
    }

    #[test]
    fn double_speed_doubles_durations() {
        let (mut ppu, _) = ppu(Model::Cgb);
        ppu.advance(159, true);
        assert_eq!(ppu.mode(), PpuMode::OamScan);
        ppu.advance(1, true);
        assert_eq!(ppu.mode(), PpuMode::Drawing);
        let (mut ppu, _) = self::ppu(Model::Cgb);
        ppu.advance(2 * FRAME_CYCLES, true);
        assert!(ppu.frame_ready());
        assert_eq!((ppu.ly(), ppu.mode()), (0, PpuMode::OamScan));
    }

    #[test]
    fn stat_sources_fire_once_per_edge() {
        let (mut ppu, mut ic) = ppu(Model::Dmg);
        ppu.write(STAT, STAT_HBLANK);
        ppu.advance(80 + 172, false);
        assert_eq!(ic.pending(), Interrupt::Status.mask());
        clear(&mut ic);
        // Sitting in HBlank does not request again
        ppu.advance(200, false);
        assert_eq!(ic.pending(), 0);
        ppu.advance(4 + 80 + 172, false);
        assert_eq!(ic.pending(), Interrupt::Status.mask());
    }

    #[test]
    fn coincidence() {
        let (mut ppu, mut ic) = ppu(Model::Dmg);
        ppu.write(LYC, 2);
        ppu.write(STAT, STAT_LYC);
        assert_eq!(ppu.read(STAT), 0x80 | STAT_LYC | 2);
        ppu.advance(456, false);
        assert_eq!(ic.pending(), 0);
        ppu.advance(456, false);
        assert_eq!(ic.pending(), Interrupt::Status.mask());
        assert_eq!(ppu.read(STAT), 0x80 | STAT_LYC | 0b100 | 2);
        clear(&mut ic);
        ppu.advance(456, false);
        assert_eq!(ic.pending(), 0);
        assert_eq!(ppu.read(STAT) & 0b100, 0);
    }

    #[test]
    fn lyc_write_onto_the_current_line() {
        let (mut ppu, ic) = ppu(Model::Dmg);
        ppu.write(LYC, 5);
        ppu.write(STAT, STAT_LYC);
        ppu.advance(456, false);
        assert_eq!(ppu.ly(), 1);
        assert_eq!(ic.pending(), 0);
        ppu.write(LYC, 1);
        assert_eq!(ppu.read(STAT) & 0b100, 0b100);
        assert_eq!(ic.pending(), Interrupt::Status.mask());
    }

    #[test]
    fn lcd_off_freezes_timing() {
        let (mut ppu, ic) = ppu(Model::Dmg);
        ppu.write(STAT, STAT_OAM | STAT_HBLANK);
        ppu.advance(1000, false);
        ppu.write(LCDC, 0x11);
        assert_eq!(ppu.ly(), 0);
        assert_eq!(ppu.read(STAT) & 0b11, 0);
        ppu.advance(FRAME_CYCLES * 2, false);
        assert_eq!(ppu.ly(), 0);
        assert!(!ppu.frame_ready());
        // Only the requests from before the LCD was switched off
        let pending = ic.pending();
        ppu.write(LCDC, 0x91);
        assert_eq!(ppu.mode(), PpuMode::OamScan);
        assert_eq!(ic.pending(), pending);
    }

    #[test]
    fn read_only_and_unused_regions() {
        let (mut ppu, _) = ppu(Model::Dmg);
        ppu.write(LY, 0x42);
        assert_eq!(ppu.read(LY), 0);
        ppu.write(0xFEA5, 0x42);
        assert_eq!(ppu.read(0xFEA5), 0);
        assert_eq!(ppu.read(LCDC), 0x91);
        assert_eq!(ppu.read(BGP), 0xFC);
        assert!(!ppu.owns(VBK));
        assert!(!ppu.owns(BCPD));
        assert!(ppu.owns(0xFE00));
    }

    #[test]
    fn vram_banks() {
        let (mut ppu, _) = ppu(Model::Cgb);
        ppu.write(0x8000, 0x11);
        ppu.write(VBK, 0x01);
        assert_eq!(ppu.read(VBK), 0xFF);
        assert_eq!(ppu.read(0x8000), 0x00);
        ppu.write(0x8000, 0x22);
        ppu.write(VBK, 0x00);
        assert_eq!(ppu.read(0x8000), 0x11);
    }

    /// Every tile is the same: the top row uses color 3 and every other row color 0.
    fn striped_tiles(ppu: &mut Ppu) {
        ppu.write(0x8000, 0xFF);
        ppu.write(0x8001, 0xFF);
    }

    #[test]
    fn basic_rendering_test() {
        let (mut ppu, _) = ppu(Model::Dmg);
        striped_tiles(&mut ppu);
        ppu.advance(FRAME_CYCLES, false);
        let frame = ppu.take_frame().unwrap();
        let white = [Pixel::WHITE; SCREEN_WIDTH];
        let black = [Pixel::BLACK; SCREEN_WIDTH];
        for (i, line) in frame.lines().iter().enumerate() {
            let check = if i % 8 == 0 { &black } else { &white };
            assert_eq!(check, line, "Line {i} was a mismatch!!")
        }
    }

    #[test]
    fn scrolling_wraps() {
        let (mut ppu, _) = ppu(Model::Dmg);
        striped_tiles(&mut ppu);
        ppu.write(SCY, 0xFD);
        ppu.advance(FRAME_CYCLES, false);
        let frame = ppu.take_frame().unwrap();
        // Line 0 shows plane line 253, so plane line 256 (= 0) lands on screen line 3
        assert_eq!(frame.pixel(0, 2), Pixel::WHITE);
        assert_eq!(frame.pixel(0, 3), Pixel::BLACK);
    }

    #[test]
    fn window_overlays_background() {
        let (mut ppu, _) = ppu(Model::Dmg);
        // Tile 1 is solid color 3 and the window map at 0x9C00 points at it everywhere
        for i in 0..16 {
            ppu.write(0x8010 + i, 0xFF);
        }
        for i in 0..0x400 {
            ppu.write(0x9C00 + i, 0x01);
        }
        ppu.write(WY, 10);
        ppu.write(WX, 7 + 100);
        ppu.write(LCDC, 0x91 | 0b0110_0000);
        ppu.advance(FRAME_CYCLES, false);
        let frame = ppu.take_frame().unwrap();
        assert_eq!(frame.pixel(100, 9), Pixel::WHITE);
        assert_eq!(frame.pixel(99, 10), Pixel::WHITE);
        assert_eq!(frame.pixel(100, 10), Pixel::BLACK);
        assert_eq!(frame.pixel(159, 143), Pixel::BLACK);
    }

    fn place_object(ppu: &mut Ppu, slot: u16, y: u8, x: u8, tile: u8, attrs: u8) {
        let base = 0xFE00 + 4 * slot;
        ppu.write(base, y);
        ppu.write(base + 1, x);
        ppu.write(base + 2, tile);
        ppu.write(base + 3, attrs);
    }

    #[test]
    fn objects_and_priority() {
        let (mut ppu, _) = ppu(Model::Dmg);
        // Object tile 2 is solid color 1. OBP0 maps it to black, OBP1 to the lightest grey.
        for i in 0..16 {
            ppu.write(0x8020 + i, if i % 2 == 0 { 0xFF } else { 0x00 });
        }
        striped_tiles(&mut ppu);
        ppu.write(OBP0, 0b0000_1100);
        ppu.write(OBP1, 0b0000_0100);
        ppu.write(LCDC, 0x93);
        // In front, at the top left of the screen
        place_object(&mut ppu, 0, 16, 8, 2, 0x00);
        // Overlaps the first, so it loses
        place_object(&mut ppu, 1, 20, 12, 2, 0x10);
        // Behind the background, on the striped rows
        place_object(&mut ppu, 2, 16 + 32, 8 + 32, 2, 0x90);
        ppu.advance(FRAME_CYCLES, false);
        let frame = ppu.take_frame().unwrap();
        let light = MonoPalette(0b0000_0100).shade(1);
        assert_eq!(frame.pixel(0, 0), Pixel::BLACK);
        assert_eq!(frame.pixel(7, 7), Pixel::BLACK);
        assert_eq!(frame.pixel(5, 5), Pixel::BLACK);
        assert_eq!(frame.pixel(10, 10), light);
        assert_eq!(frame.pixel(8, 4), light);
        // Row 32 is an opaque background row, so the object is hidden there only
        assert_eq!(frame.pixel(32, 32), Pixel::BLACK);
        assert_eq!(frame.pixel(32, 33), light);
        let (mut ppu, _) = self::ppu(Model::Dmg);
        ppu.write(LCDC, 0x91);
        place_object(&mut ppu, 0, 16, 8, 2, 0x00);
        ppu.advance(FRAME_CYCLES, false);
        assert_eq!(ppu.take_frame().unwrap().pixel(0, 0), Pixel::WHITE);
    }

    #[test]
    fn color_attributes() {
        let (mut ppu, _) = ppu(Model::Cgb);
        // Tile 0 in bank 1 at 0x8000 has a single color 1 pixel in its top right corner
        ppu.write(VBK, 1);
        ppu.write(0x8000, 0x01);
        // Every map entry uses palette 2, tile bank 1 and is flipped horizontally
        for i in 0..0x400 {
            ppu.write(0x9800 + i, 0b0010_1010);
        }
        ppu.write(VBK, 0);
        ppu.write(BCPS, 0x80 | (2 * 8 + 2));
        ppu.write(BCPD, 0x1F);
        ppu.write(BCPD, 0x00);
        ppu.write(LCDC, 0x91);
        ppu.advance(FRAME_CYCLES, false);
        let frame = ppu.take_frame().unwrap();
        let red = Pixel { r: 0x1F, g: 0, b: 0 };
        assert_eq!(frame.pixel(0, 0), red);
        // Color 0 of every palette starts out white
        assert_eq!(frame.pixel(7, 0), Pixel::WHITE);
        assert_eq!(frame.pixel(0, 1), Pixel::WHITE);
    }

    #[test]
    fn oam_dma_lands_in_oam() {
        let (mut ppu, _) = ppu(Model::Dmg);
        ppu.write(DMA, 0xC0);
        ppu.advance(8, false);
        while let Some((src, dest)) = ppu.dma.next_copy() {
            ppu.dma_store(dest, src as u8);
        }
        assert_eq!(ppu.read(0xFE01), 0x01);
        assert_eq!(ppu.read(DMA), 0xC0);
    }

    #[test]
    fn hblank_dma_waits_for_hblank() {
        let (mut ppu, _) = ppu(Model::Cgb);
        ppu.write(0xFF51, 0xC0);
        ppu.write(0xFF52, 0x00);
        ppu.write(0xFF53, 0x00);
        ppu.write(0xFF54, 0x00);
        ppu.write(0xFF55, 0x80);
        ppu.advance(80, false);
        assert!(ppu.dma.next_copy().is_none());
        ppu.advance(172, false);
        assert_eq!(ppu.dma.next_copy(), Some((0xC000, 0x8000)));
    }
}
