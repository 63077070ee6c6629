//! The two ways of moving memory around without the CPU.
//!
//! Neither transfer touches the bus itself. Both only keep track of how many bytes they have earned
//! as time passes; the bus drains them through [`Dma::next_copy`] after each step, performs the
//! read on the transfer's behalf and hands the byte back to the video engine to store. Progress is
//! kept byte by byte so a transfer can span any number of steps.

use tracing::{debug, warn};

use crate::cpu::check_bit_const;

/// The OAM transfer always moves the whole sprite table.
pub const OAM_DMA_LEN: u16 = 0xA0;
/// CPU cycles per byte of an OAM transfer.
const OAM_DMA_CYCLES: u32 = 4;
/// CPU cycles per byte of a general-purpose VRAM transfer at normal speed.
const GDMA_CYCLES: u32 = 2;
/// An HBlank transfer moves this many bytes every time the video engine enters HBlank.
pub const HDMA_BURST: u16 = 0x10;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
struct OamTransfer {
    source: u16,
    progress: u16,
    earned: u16,
    cycles: u32,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum VramMode {
    /// Runs to completion as fast as the bus allows.
    General,
    /// Copies a 16-byte block each time the video engine enters HBlank.
    HBlank,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
struct VramTransfer {
    source: u16,
    dest: u16,
    length: u16,
    progress: u16,
    earned: u16,
    cycles: u32,
    mode: VramMode,
}

impl VramTransfer {
    fn remaining(&self) -> u16 {
        self.length - self.progress
    }
}

/// The DMA engines and their parameter registers (0xFF46 and, on the color model, 0xFF51-0xFF55).
#[derive(Debug, Clone, Hash, PartialEq, Eq, Default)]
pub struct Dma {
    /// The last value written to 0xFF46.
    oam_register: u8,
    oam: Option<OamTransfer>,
    /// HDMA1-HDMA4, as written.
    source_hi: u8,
    source_lo: u8,
    dest_hi: u8,
    dest_lo: u8,
    vram: Option<VramTransfer>,
}

impl Dma {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn oam_active(&self) -> bool {
        self.oam.is_some()
    }

    pub fn vram_active(&self) -> bool {
        self.vram.is_some()
    }

    pub fn read_oam_register(&self) -> u8 {
        self.oam_register
    }

    /// Starts an OAM transfer from `value << 8`. Refused while one is already running.
    pub fn start_oam(&mut self, value: u8) {
        if self.oam.is_some() {
            warn!("OAM DMA already in progress, ignoring write of 0x{value:0>2X}");
            return;
        }
        self.oam_register = value;
        let source = (value as u16) << 8;
        debug!("Starting OAM DMA from 0x{source:0>4X}");
        self.oam = Some(OamTransfer {
            source,
            progress: 0,
            earned: 0,
            cycles: 0,
        });
    }

    /// Reads one of HDMA1-HDMA5. Only HDMA5 is readable; it holds the number of blocks left minus
    /// one while a transfer runs and 0xFF once it is done.
    pub fn read_vram_register(&self, addr: u16) -> u8 {
        match (addr, &self.vram) {
            (0xFF55, Some(transfer)) => ((transfer.remaining().div_ceil(HDMA_BURST) - 1) as u8) & 0x7F,
            _ => 0xFF,
        }
    }

    pub fn write_vram_register(&mut self, addr: u16, value: u8) {
        if let Some(transfer) = self.vram {
            if addr == 0xFF55
                && transfer.mode == VramMode::HBlank
                && !check_bit_const::<7>(value)
            {
                debug!(
                    "Cancelling HBlank DMA with {} bytes left",
                    transfer.remaining()
                );
                self.vram = None;
            } else {
                warn!("VRAM DMA in progress, ignoring write of 0x{value:0>2X} to 0x{addr:0>4X}");
            }
            return;
        }
        match addr {
            0xFF51 => self.source_hi = value,
            0xFF52 => self.source_lo = value,
            0xFF53 => self.dest_hi = value,
            0xFF54 => self.dest_lo = value,
            0xFF55 => self.start_vram(value),
            _ => unreachable!("0x{addr:0>4X} is not a VRAM DMA register"),
        }
    }

    fn start_vram(&mut self, value: u8) {
        let source = u16::from_be_bytes([self.source_hi, self.source_lo & 0xF0]);
        let dest = 0x8000 | u16::from_be_bytes([self.dest_hi & 0x1F, self.dest_lo & 0xF0]);
        let length = HDMA_BURST * ((value & 0x7F) as u16 + 1);
        let mode = if check_bit_const::<7>(value) {
            VramMode::HBlank
        } else {
            VramMode::General
        };
        debug!("Starting {mode:?} DMA of {length} bytes from 0x{source:0>4X} to 0x{dest:0>4X}");
        self.vram = Some(VramTransfer {
            source,
            dest,
            length,
            progress: 0,
            earned: 0,
            cycles: 0,
            mode,
        });
    }

    /// Credits the running transfers with the bytes they have earned over the given cycles.
    pub fn advance(&mut self, cycles: u32, double_speed: bool) {
        if let Some(oam) = self.oam.as_mut() {
            oam.cycles += cycles;
            let earned = (oam.cycles / OAM_DMA_CYCLES) as u16;
            oam.cycles %= OAM_DMA_CYCLES;
            oam.earned = (oam.earned + earned).min(OAM_DMA_LEN - oam.progress);
        }
        if let Some(vram) = self.vram.as_mut().filter(|t| t.mode == VramMode::General) {
            let per_byte = if double_speed {
                GDMA_CYCLES * 2
            } else {
                GDMA_CYCLES
            };
            vram.cycles += cycles;
            let earned = (vram.cycles / per_byte).min(u16::MAX as u32) as u16;
            vram.cycles %= per_byte;
            vram.earned = vram.earned.saturating_add(earned).min(vram.remaining());
        }
    }

    /// Called when the video engine enters HBlank.
    pub fn hblank_burst(&mut self) {
        if let Some(vram) = self.vram.as_mut().filter(|t| t.mode == VramMode::HBlank) {
            vram.earned = (vram.earned + HDMA_BURST).min(vram.remaining());
        }
    }

    /// Pops the next `(source, dest)` pair that a transfer is owed, if any.
    pub fn next_copy(&mut self) -> Option<(u16, u16)> {
        if let Some(oam) = self.oam.as_mut().filter(|t| t.earned > 0) {
            let copy = (oam.source + oam.progress, 0xFE00 + oam.progress);
            oam.progress += 1;
            oam.earned -= 1;
            if oam.progress == OAM_DMA_LEN {
                debug!("OAM DMA complete");
                self.oam = None;
            }
            return Some(copy);
        }
        let vram = self.vram.as_mut().filter(|t| t.earned > 0)?;
        let copy = (
            vram.source.wrapping_add(vram.progress),
            0x8000 | (vram.dest.wrapping_add(vram.progress) & 0x1FFF),
        );
        vram.progress += 1;
        vram.earned -= 1;
        if vram.progress == vram.length {
            debug!("VRAM DMA complete");
            self.vram = None;
        }
        Some(copy)
    }
}
