use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::cpu::Cpu;
use crate::mem::{Bus, Device};

/// Address of the interrupt flag (IF) register.
pub const IF_ADDR: u16 = 0xFF0F;
/// Address of the interrupt enable (IE) register.
pub const IE_ADDR: u16 = 0xFFFF;

/// The number of cycles the CPU spends jumping into an interrupt handler.
pub const DISPATCH_CYCLES: u32 = 20;

/// The five interrupt sources, in dispatch priority order. The discriminant is the handler's
/// vector address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[repr(u16)]
pub enum Interrupt {
    VBlank = 0x40,
    #[display("LCD")]
    Status = 0x48,
    Timer = 0x50,
    Serial = 0x58,
    Joypad = 0x60,
}

impl Interrupt {
    /// Every source, highest priority first.
    pub const ALL: [Interrupt; 5] = [
        Self::VBlank,
        Self::Status,
        Self::Timer,
        Self::Serial,
        Self::Joypad,
    ];

    /// The bit this source occupies in both IE and IF.
    pub const fn mask(self) -> u8 {
        match self {
            Self::VBlank => 0b0000_0001,
            Self::Status => 0b0000_0010,
            Self::Timer => 0b0000_0100,
            Self::Serial => 0b0000_1000,
            Self::Joypad => 0b0001_0000,
        }
    }

    pub const fn vector(self) -> u16 {
        self as u16
    }
}

/// The state shared between the controller and every component that can raise an interrupt.
/// Input threads hold a reference to this too, so every field is atomic. No compound
/// read-modify-write spans more than one field.
#[derive(Debug, Default)]
struct InterruptLines {
    /// IF. Only the lower five bits are meaningful.
    pending: AtomicU8,
    /// IE.
    enabled: AtomicU8,
    /// Set when an unmasked source is requested. Consumed by the driving loop to pull the CPU out
    /// of HALT/STOP.
    wake: AtomicBool,
}

/// A cheap, cloneable handle that can only raise interrupts. The timer, the PPU, the serial port
/// and the joypad each hold one.
#[derive(Debug, Clone)]
pub struct InterruptRequester {
    lines: Arc<InterruptLines>,
}

impl InterruptRequester {
    /// Latches the source's pending bit. Masking only gates dispatch, never latching. If the source
    /// is currently enabled, the CPU is also signaled to leave HALT.
    pub fn request(&self, source: Interrupt) {
        let mask = source.mask();
        self.lines.pending.fetch_or(mask, Ordering::AcqRel);
        if self.lines.enabled.load(Ordering::Acquire) & mask != 0 {
            self.lines.wake.store(true, Ordering::Release);
        }
    }
}

/// Owns IE (0xFFFF) and IF (0xFF0F) and decides which handler, if any, the CPU jumps to.
#[derive(Debug, Clone, Default)]
pub struct InterruptController {
    lines: Arc<InterruptLines>,
}

impl InterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle that shares this controller's registers.
    pub fn requester(&self) -> InterruptRequester {
        InterruptRequester {
            lines: Arc::clone(&self.lines),
        }
    }

    pub fn request(&self, source: Interrupt) {
        self.requester().request(source)
    }

    /// The raw IF bits.
    pub fn pending(&self) -> u8 {
        self.lines.pending.load(Ordering::Acquire) & 0x1F
    }

    /// The raw IE bits.
    pub fn enabled(&self) -> u8 {
        self.lines.enabled.load(Ordering::Acquire)
    }

    /// Sources that are both pending and enabled.
    pub fn active(&self) -> u8 {
        self.pending() & self.enabled() & 0x1F
    }

    /// Consumes the wake signal raised by `request`.
    pub fn take_wake(&self) -> bool {
        self.lines.wake.swap(false, Ordering::AcqRel)
    }

    fn acknowledge(&self, source: Interrupt) {
        self.lines.pending.fetch_and(!source.mask(), Ordering::AcqRel);
    }

    /// Called once per iteration of the driving loop. When the CPU's master enable is set, the
    /// highest priority source that is both pending and enabled is acknowledged and dispatched.
    /// Only one source is dispatched per call.
    pub fn poll(&self, cpu: &mut Cpu, bus: &mut dyn Bus) -> Option<Interrupt> {
        if !cpu.ime {
            return None;
        }
        let active = self.active();
        let source = Interrupt::ALL
            .into_iter()
            .find(|source| active & source.mask() != 0)?;
        self.acknowledge(source);
        debug!("Dispatching {source} interrupt from 0x{:0>4X}", cpu.pc);
        cpu.dispatch(bus, source.vector());
        Some(source)
    }
}

impl Device for InterruptController {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            // The top three bits of IF are unused and read back as set.
            IF_ADDR => 0xE0 | self.pending(),
            IE_ADDR => self.enabled(),
            _ => unreachable!("The interrupt controller does not own 0x{addr:0>4X}"),
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            IF_ADDR => self.lines.pending.store(value & 0x1F, Ordering::Release),
            IE_ADDR => self.lines.enabled.store(value, Ordering::Release),
            _ => unreachable!("The interrupt controller does not own 0x{addr:0>4X}"),
        }
    }

    fn owns(&self, addr: u16) -> bool {
        matches!(addr, IF_ADDR | IE_ADDR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::FlatMemory;

    #[test]
    fn latching_ignores_mask() {
        let ic = InterruptController::new();
        ic.request(Interrupt::Timer);
        assert_eq!(ic.pending(), Interrupt::Timer.mask());
        assert_eq!(ic.active(), 0);
        assert!(!ic.take_wake());
    }

    #[test]
    fn unmasked_request_wakes() {
        let mut ic = InterruptController::new();
        ic.write(IE_ADDR, Interrupt::Joypad.mask());
        ic.requester().request(Interrupt::Joypad);
        assert!(ic.take_wake());
        assert!(!ic.take_wake());
    }

    #[test]
    fn flag_register_reads_unused_bits_high() {
        let mut ic = InterruptController::new();
        ic.write(IF_ADDR, 0xFF);
        assert_eq!(ic.read(IF_ADDR), 0xFF);
        ic.write(IF_ADDR, 0x00);
        assert_eq!(ic.read(IF_ADDR), 0xE0);
    }

    #[test]
    fn vblank_wins_over_timer() {
        let mut ic = InterruptController::new();
        let mut mem = FlatMemory::new();
        let mut cpu = Cpu::default();
        cpu.pc = 0x1234;
        cpu.sp = 0xD000;
        cpu.ime = true;
        ic.write(IE_ADDR, 0x1F);
        ic.request(Interrupt::Timer);
        ic.request(Interrupt::VBlank);
        assert_eq!(ic.poll(&mut cpu, &mut mem), Some(Interrupt::VBlank));
        assert_eq!(ic.pending(), Interrupt::Timer.mask());
        assert_eq!(cpu.pc, 0x40);
        assert!(!cpu.ime);
        assert_eq!(cpu.sp, 0xCFFE);
        assert_eq!(mem.read(0xCFFF), 0x12);
        assert_eq!(mem.read(0xCFFE), 0x34);
        // The master enable is now clear, so the timer stays pending
        assert_eq!(ic.poll(&mut cpu, &mut mem), None);
        assert_eq!(ic.pending(), Interrupt::Timer.mask());
    }

    #[test]
    fn no_dispatch_without_master_enable() {
        let mut ic = InterruptController::new();
        let mut mem = FlatMemory::new();
        let mut cpu = Cpu::default();
        ic.write(IE_ADDR, 0x1F);
        ic.request(Interrupt::Serial);
        ic.request(Interrupt::Joypad);
        assert_eq!(ic.poll(&mut cpu, &mut mem), None);
        assert_eq!(ic.pending(), 0b1_1000);
    }
}
