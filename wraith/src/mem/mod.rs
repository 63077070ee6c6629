//! The memory bus and the simple devices that hang off of it.
//!
//! The bus itself holds no memory. Every access is probed against the attached devices in
//! registration order and handed to the first one that claims the address. Overlapping claims are
//! legal and resolved by that order; the I/O port block, for example, claims all of
//! 0xFF00-0xFF7F but is registered after the timer, interrupt, video and work RAM devices that own
//! specific registers within that range.

use std::cell::Cell;

use tracing::{error, trace};

use crate::cart::Cartridge;
use crate::error::EmulationError;
use crate::interrupt::InterruptController;
use crate::joypad::JoypadHandle;
use crate::ppu::Ppu;
use crate::timer::Timer;
use crate::Model;

mod hram;
mod io;
mod wram;

pub use hram::HighRam;
pub use io::IoPorts;
pub use wram::WorkRam;

/// The CPU's view of memory. Everything the instruction handlers do goes through this trait, which
/// lets the CPU be driven against a plain RAM image in tests.
pub trait Bus {
    fn read(&self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, value: u8);

    /// Reads a little-endian word.
    fn read_word(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    /// Writes a little-endian word, low byte first.
    fn write_word(&mut self, addr: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write(addr, lo);
        self.write(addr.wrapping_add(1), hi);
    }
}

/// Anything that can be attached to the bus.
pub trait Device {
    fn read(&self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, value: u8);

    /// Whether or not this device answers for the given address.
    fn owns(&self, addr: u16) -> bool;
}

/// Finds the first device, in order, that claims the address.
pub fn route<'a>(devices: &[&'a dyn Device], addr: u16) -> Option<&'a dyn Device> {
    devices.iter().copied().find(|dev| dev.owns(addr))
}

/// Mutable counterpart to [`route`].
pub fn route_mut<'a, 'b>(
    devices: &'b mut [&'a mut dyn Device],
    addr: u16,
) -> Option<&'b mut &'a mut dyn Device> {
    devices.iter_mut().find(|dev| dev.owns(addr))
}

/// The fully populated bus of the handheld.
pub struct MemoryBus {
    pub cart: Cartridge,
    pub ppu: Ppu,
    pub wram: WorkRam,
    pub timer: Timer,
    pub interrupts: InterruptController,
    pub hram: HighRam,
    pub io: IoPorts,
    /// The first access that no device claimed. Handlers can not return errors, so the fault is
    /// parked here until the driving loop collects it.
    fault: Cell<Option<EmulationError>>,
}

impl MemoryBus {
    pub fn new(
        cart: Cartridge,
        model: Model,
        interrupts: &InterruptController,
        joypad: &JoypadHandle,
    ) -> Self {
        Self {
            cart,
            ppu: Ppu::new(model, interrupts.requester()),
            wram: WorkRam::new(model),
            timer: Timer::new(interrupts.requester()),
            interrupts: interrupts.clone(),
            hram: HighRam::new(),
            io: IoPorts::new(model, joypad.clone(), interrupts.requester()),
            fault: Cell::new(None),
        }
    }

    /// The attached devices in registration order.
    fn devices(&self) -> [&dyn Device; 7] {
        [
            &self.cart,
            &self.ppu,
            &self.wram,
            &self.timer,
            &self.interrupts,
            &self.hram,
            &self.io,
        ]
    }

    fn devices_mut(&mut self) -> [&mut dyn Device; 7] {
        [
            &mut self.cart,
            &mut self.ppu,
            &mut self.wram,
            &mut self.timer,
            &mut self.interrupts,
            &mut self.hram,
            &mut self.io,
        ]
    }

    fn latch_fault(&self, addr: u16, write: bool) {
        error!("No device owns address 0x{addr:0>4X} (write: {write})");
        if self.fault.get().is_none() {
            self.fault
                .set(Some(EmulationError::UnmappedAddress { addr, write }));
        }
    }

    /// Returns and clears the first unmapped access since the last call.
    pub fn take_fault(&mut self) -> Option<EmulationError> {
        self.fault.take()
    }

    /// Moves every clocked device forward by the given number of CPU cycles, then lets any DMA
    /// transfer copy the bytes it has earned.
    pub fn advance(&mut self, cycles: u32) {
        let double_speed = self.io.double_speed();
        self.timer.advance(cycles);
        self.ppu.advance(cycles, double_speed);
        while let Some((src, dest)) = self.ppu.dma.next_copy() {
            let byte = self.read(src);
            trace!("DMA 0x{src:0>4X} -> 0x{dest:0>4X} = 0x{byte:0>2X}");
            self.ppu.dma_store(dest, byte);
        }
    }
}

impl Bus for MemoryBus {
    fn read(&self, addr: u16) -> u8 {
        match route(&self.devices(), addr) {
            Some(dev) => dev.read(addr),
            None => {
                self.latch_fault(addr, false);
                0xFF
            }
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        let owned = {
            let mut devices = self.devices_mut();
            match route_mut(&mut devices, addr) {
                Some(dev) => {
                    dev.write(addr, value);
                    true
                }
                None => false,
            }
        };
        if !owned {
            self.latch_fault(addr, true);
        }
    }
}

/// A bus with nothing but 64 KiB of flat RAM behind it. Used to run the CPU in isolation.
#[derive(Clone)]
pub struct FlatMemory {
    data: Box<[u8; 0x1_0000]>,
}

impl FlatMemory {
    pub fn new() -> Self {
        Self {
            data: Box::new([0; 0x1_0000]),
        }
    }

    /// Copies the given bytes into memory starting at `addr`.
    pub fn load(&mut self, addr: u16, bytes: &[u8]) {
        let start = addr as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl Default for FlatMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for FlatMemory {
    fn read(&self, addr: u16) -> u8 {
        self.data[addr as usize]
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.data[addr as usize] = value;
    }
}
