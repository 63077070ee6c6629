use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::interrupt::{Interrupt, InterruptController, InterruptRequester};

/// One of the eight buttons on the handheld.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, Serialize, Deserialize,
)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Self::Right,
        Self::Left,
        Self::Up,
        Self::Down,
        Self::A,
        Self::B,
        Self::Select,
        Self::Start,
    ];

    /// Directions occupy the low nibble and the action buttons the high nibble, each in the order
    /// the hardware reports them.
    const fn bit(self) -> u8 {
        match self {
            Self::Right => 0x01,
            Self::Left => 0x02,
            Self::Up => 0x04,
            Self::Down => 0x08,
            Self::A => 0x10,
            Self::B => 0x20,
            Self::Select => 0x40,
            Self::Start => 0x80,
        }
    }
}

/// The set of buttons currently held down. A set bit means pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Buttons(u8);

impl Buttons {
    pub const NONE: Buttons = Buttons(0);

    pub fn contains(self, button: Button) -> bool {
        self.0 & button.bit() != 0
    }

    pub fn insert(&mut self, button: Button) {
        self.0 |= button.bit();
    }

    pub fn remove(&mut self, button: Button) {
        self.0 &= !button.bit();
    }

    /// The low nibble of the joypad register when the direction row is selected, active-low.
    pub fn directions(self) -> u8 {
        !self.0 & 0x0F
    }

    /// The low nibble of the joypad register when the action row is selected, active-low.
    pub fn actions(self) -> u8 {
        !(self.0 >> 4) & 0x0F
    }
}

impl FromIterator<Button> for Buttons {
    fn from_iter<T: IntoIterator<Item = Button>>(iter: T) -> Self {
        let mut digest = Buttons::NONE;
        iter.into_iter().for_each(|b| digest.insert(b));
        digest
    }
}

/// A handle onto the button state. Handles can be cloned and sent to an input thread; every
/// update is a single atomic store plus, for newly pressed buttons, a joypad interrupt request.
#[derive(Debug, Clone)]
pub struct JoypadHandle {
    state: Arc<AtomicU8>,
    interrupts: InterruptRequester,
}

impl JoypadHandle {
    pub fn new(interrupts: &InterruptController) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(0)),
            interrupts: interrupts.requester(),
        }
    }

    pub fn buttons(&self) -> Buttons {
        Buttons(self.state.load(Ordering::Acquire))
    }

    /// Replaces the whole button state.
    pub fn set(&self, buttons: Buttons) {
        let prev = self.state.swap(buttons.0, Ordering::AcqRel);
        if buttons.0 & !prev != 0 {
            self.interrupts.request(Interrupt::Joypad);
        }
    }

    pub fn press(&self, button: Button) {
        let prev = self.state.fetch_or(button.bit(), Ordering::AcqRel);
        if prev & button.bit() == 0 {
            self.interrupts.request(Interrupt::Joypad);
        }
    }

    pub fn release(&self, button: Button) {
        self.state.fetch_and(!button.bit(), Ordering::AcqRel);
    }
}
