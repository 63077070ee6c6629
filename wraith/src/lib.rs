//! Wraith is the core crate of the project. It holds all of the logic for emulating the handheld
//! (and its color successor) with a game cartridge inserted. Nothing in here knows how the screen
//! is shown or where button presses come from; a front end supplies both through [`Host`].
//!
//! The pieces line up with the hardware: a CPU that executes one instruction per step, a memory bus
//! that routes every access to the device that owns it, and the clocked devices (the timer and the
//! video engine) that the bus moves forward by however many cycles each step took. Interrupt
//! requests from the devices are collected by a shared controller that the driving loop polls
//! after every step.

use serde::{Deserialize, Serialize};

pub mod cart;
pub mod cpu;
pub mod error;
mod gameboy;
pub mod instruction;
pub mod interrupt;
pub mod joypad;
pub mod mem;
pub mod ppu;
pub mod timer;

pub use cart::Cartridge;
pub use error::{CartridgeError, EmulationError};
pub use gameboy::{Gameboy, Host};
pub use joypad::{Button, Buttons, JoypadHandle};
pub use ppu::{Frame, Pixel};

/// Which hardware to emulate.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    /// Picks the color model if the cartridge header advertises support for it.
    #[default]
    #[display("auto")]
    Auto,
    /// The monochrome handheld.
    #[display("dmg")]
    Dmg,
    /// The color model.
    #[display("cgb")]
    Cgb,
}

impl Model {
    /// Settles `Auto` against a cartridge's CGB flag.
    pub fn resolve(self, supports_cgb: bool) -> Self {
        match self {
            Model::Auto if supports_cgb => Model::Cgb,
            Model::Auto => Model::Dmg,
            model => model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_follows_the_cartridge() {
        assert_eq!(Model::Auto.resolve(true), Model::Cgb);
        assert_eq!(Model::Auto.resolve(false), Model::Dmg);
        assert_eq!(Model::Dmg.resolve(true), Model::Dmg);
        assert_eq!(Model::Cgb.resolve(false), Model::Cgb);
    }
}
