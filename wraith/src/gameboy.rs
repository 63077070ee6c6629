use std::borrow::Cow;

use tracing::{debug, info};

use crate::cart::Cartridge;
use crate::cpu::{disassemble, Cpu, CpuState};
use crate::error::{CartridgeError, EmulationError};
use crate::interrupt::{Interrupt, InterruptController, DISPATCH_CYCLES};
use crate::joypad::{Buttons, JoypadHandle};
use crate::mem::MemoryBus;
use crate::ppu::{Frame, FRAME_CYCLES};
use crate::Model;

/// What the core needs from whoever is running it: somewhere to show finished frames and a source
/// of button state.
pub trait Host {
    fn present(&mut self, frame: &Frame);

    fn poll_buttons(&mut self) -> Buttons;
}

/// This is the core emulation primitive. It contains the entire state machine of the emulated
/// handheld and is agnostic to how it is rendered (if at all). Notably, the `Gameboy` does not
/// provide a `run` or analogous method. It must be stepped forward, a single instruction or a
/// whole frame at a time.
///
/// This allows managing tick rate, processing IO, and more to be done externally.
pub struct Gameboy {
    model: Model,
    cpu: Cpu,
    bus: MemoryBus,
    interrupts: InterruptController,
    joypad: JoypadHandle,
}

impl Gameboy {
    /// Takes data that represents the data stored on a game cartridge and uses it to construct the
    /// handheld, picking the model from the cartridge header.
    pub fn new<'a, C: Into<Cow<'a, [u8]>>>(cart: C) -> Result<Self, CartridgeError> {
        Self::with_model(cart, Model::Auto)
    }

    pub fn with_model<'a, C: Into<Cow<'a, [u8]>>>(
        cart: C,
        model: Model,
    ) -> Result<Self, CartridgeError> {
        let cart = Cartridge::new(cart)?;
        let model = model.resolve(cart.header().supports_cgb());
        info!("Running as {model}");
        let interrupts = InterruptController::new();
        let joypad = JoypadHandle::new(&interrupts);
        let bus = MemoryBus::new(cart, model, &interrupts, &joypad);
        Ok(Self {
            model,
            cpu: Cpu::power_on(model),
            bus,
            interrupts,
            joypad,
        })
    }

    /// The model being emulated. Never `Auto`.
    pub fn model(&self) -> Model {
        self.model
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn bus(&self) -> &MemoryBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut MemoryBus {
        &mut self.bus
    }

    /// A handle for pressing buttons, possibly from another thread.
    pub fn joypad(&self) -> JoypadHandle {
        self.joypad.clone()
    }

    /// Drains everything the game has sent over the serial port.
    pub fn take_serial_output(&mut self) -> Vec<u8> {
        self.bus.io.take_serial_output()
    }

    /// Renders the instruction at `addr`. Nothing is executed and no state changes.
    pub fn disassemble(&self, addr: u16) -> String {
        disassemble(&self.bus, addr)
    }

    /// Runs one iteration of the driving loop: wake the CPU if something is waiting for it, then
    /// either jump into an interrupt handler or run one instruction, and move the rest of the
    /// hardware forward by the same number of cycles. Returns the cycles consumed.
    ///
    /// Interrupts are polled before the instruction rather than after it. That way a CPU woken
    /// from HALT with IME set goes straight to the handler, and an EI still covers exactly one
    /// more instruction before the first dispatch.
    pub fn step(&mut self) -> Result<u32, EmulationError> {
        let wake = self.interrupts.take_wake();
        match self.cpu.state {
            CpuState::Halted if wake || self.interrupts.active() != 0 => self.cpu.resume(),
            // Only the joypad brings the CPU out of STOP, and it does so whether or not it is
            // enabled in IE.
            CpuState::Stopped if self.interrupts.pending() & Interrupt::Joypad.mask() != 0 => {
                debug!("Joypad input ended STOP");
                self.cpu.resume()
            }
            _ => {}
        }
        let cycles = match self.interrupts.poll(&mut self.cpu, &mut self.bus) {
            Some(_) => DISPATCH_CYCLES,
            None => {
                let cycles = self.cpu.step(&mut self.bus)?;
                if self.cpu.is_stopped() && self.bus.io.switch_speed() {
                    self.cpu.resume();
                }
                cycles
            }
        };
        self.bus.advance(cycles);
        match self.bus.take_fault() {
            Some(err) => Err(err),
            None => Ok(cycles),
        }
    }

    /// Polls the host for input once, then steps until the video engine finishes a frame and
    /// hands it to the host. If the LCD is off no frame ever completes, so after a frame's worth
    /// of cycles whatever is on screen is presented instead. Returns the cycles consumed.
    pub fn run_frame(&mut self, host: &mut impl Host) -> Result<u32, EmulationError> {
        self.joypad.set(host.poll_buttons());
        let budget = if self.bus.io.double_speed() {
            2 * FRAME_CYCLES
        } else {
            FRAME_CYCLES
        };
        let mut elapsed = 0;
        loop {
            elapsed += self.step()?;
            if let Some(frame) = self.bus.ppu.take_frame() {
                host.present(frame);
                return Ok(elapsed);
            }
            if elapsed >= budget {
                host.present(self.bus.ppu.screen());
                return Ok(elapsed);
            }
        }
    }
}
