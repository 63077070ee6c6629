use std::fmt::Display;

use crate::interrupt::{Interrupt, InterruptRequester};
use crate::mem::Device;

/// ADDR FF04
const DIV: u16 = 0xFF04;
/// ADDR FF05
const TIMA: u16 = 0xFF05;
/// ADDR FF06
const TMA: u16 = 0xFF06;
/// ADDR FF07
const TAC: u16 = 0xFF07;

/// The divider value left behind by the boot ROM.
pub const DIVIDER_AT_BOOT: u16 = 0xABCC;

/// The divider, the timer counter and everything that controls them.
///
/// The divider is a free-running 16-bit counter that ticks every cycle; only its top byte is
/// visible at DIV. TIMA does not count on its own. It watches one bit of the divider, picked by
/// the rate selector, and increments whenever that bit (gated by the start flag) falls from 1 to
/// 0. Modeling it as an edge detector rather than as a separate counter is what makes the two
/// documented glitches fall out naturally: resetting the divider while the watched bit is high
/// and changing TAC so that the gated signal drops both produce a spurious increment.
#[derive(Debug, Clone)]
pub struct Timer {
    divider: u16,
    /// ADDR FF05
    counter: u8,
    /// ADDR FF06
    /// When the counter overflows, it is reloaded from this register.
    modulo: u8,
    rate: TimerRate,
    started: bool,
    interrupts: InterruptRequester,
}

impl Display for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Timer {{")?;
        writeln!(f, "  DIV: 0x{:0>4X}", self.divider)?;
        writeln!(f, "  TIMA: 0x{:0>2X}", self.counter)?;
        writeln!(f, "  TMA: 0x{:0>2X}", self.modulo)?;
        writeln!(f, "  TAC: {} ({})", self.rate, if self.started { "on" } else { "off" })?;
        write!(f, "}}")
    }
}

/// The four counter rates selectable via the low two bits of TAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TimerRate {
    /// One counter increment every 1024 cycles.
    #[display("4096 Hz")]
    Slowest,
    /// One counter increment every 16 cycles.
    #[display("262144 Hz")]
    Fastest,
    /// One counter increment every 64 cycles.
    #[display("65536 Hz")]
    Fast,
    /// One counter increment every 256 cycles.
    #[display("16384 Hz")]
    Slow,
}

impl TimerRate {
    fn from_byte(byte: u8) -> Self {
        match byte & 0b11 {
            0b00 => Self::Slowest,
            0b01 => Self::Fastest,
            0b10 => Self::Fast,
            _ => Self::Slow,
        }
    }

    const fn as_bits(self) -> u8 {
        match self {
            Self::Slowest => 0b00,
            Self::Fastest => 0b01,
            Self::Fast => 0b10,
            Self::Slow => 0b11,
        }
    }

    /// The number of cycles between counter increments.
    pub const fn period(self) -> u16 {
        match self {
            Self::Slowest => 1024,
            Self::Fastest => 16,
            Self::Fast => 64,
            Self::Slow => 256,
        }
    }

    /// The divider bit whose falling edge clocks the counter.
    const fn watched_bit(self) -> u16 {
        self.period() >> 1
    }
}

impl Timer {
    pub fn new(interrupts: InterruptRequester) -> Self {
        Self {
            divider: DIVIDER_AT_BOOT,
            counter: 0,
            modulo: 0,
            rate: TimerRate::Slowest,
            started: false,
            interrupts,
        }
    }

    /// The full 16-bit divider.
    pub fn divider(&self) -> u16 {
        self.divider
    }

    /// The value of the edge detector's input.
    fn signal(&self) -> bool {
        self.started && self.divider & self.rate.watched_bit() != 0
    }

    /// Moves the timer forward by the given number of cycles, one cycle at a time.
    pub fn advance(&mut self, cycles: u32) {
        for _ in 0..cycles {
            let before = self.signal();
            self.divider = self.divider.wrapping_add(1);
            if before && !self.signal() {
                self.increment();
            }
        }
    }

    /// Bumps TIMA. An overflow reloads from TMA and requests the timer interrupt in the same step.
    fn increment(&mut self) {
        match self.counter.checked_add(1) {
            Some(val) => self.counter = val,
            None => {
                self.counter = self.modulo;
                self.interrupts.request(Interrupt::Timer);
            }
        }
    }
}

impl Device for Timer {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            DIV => (self.divider >> 8) as u8,
            TIMA => self.counter,
            TMA => self.modulo,
            TAC => 0xF8 | ((self.started as u8) << 2) | self.rate.as_bits(),
            _ => unreachable!("The timer does not own 0x{addr:0>4X}"),
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            DIV => {
                let before = self.signal();
                self.divider = 0;
                if before {
                    self.increment();
                }
            }
            TIMA => self.counter = value,
            TMA => self.modulo = value,
            TAC => {
                let before = self.signal();
                self.rate = TimerRate::from_byte(value);
                self.started = value & 0b100 != 0;
                if before && !self.signal() {
                    self.increment();
                }
            }
            _ => unreachable!("The timer does not own 0x{addr:0>4X}"),
        }
    }

    fn owns(&self, addr: u16) -> bool {
        (DIV..=TAC).contains(&addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupt::InterruptController;

    fn timer() -> (Timer, InterruptController) {
        let ic = InterruptController::new();
        let mut timer = Timer::new(ic.requester());
        timer.write(DIV, 0);
        (timer, ic)
    }

    #[test]
    fn divider_register() {
        let (mut timer, _) = timer();
        assert_eq!(timer.read(DIV), 0);
        timer.advance(255);
        assert_eq!(timer.read(DIV), 0);
        timer.advance(1);
        assert_eq!(timer.read(DIV), 1);
        timer.advance(256 * 254);
        assert_eq!(timer.read(DIV), 255);
        timer.advance(256);
        assert_eq!(timer.read(DIV), 0);
        timer.advance(300);
        timer.write(DIV, 0x42);
        assert_eq!(timer.divider(), 0);
    }

    #[test]
    fn counter_rates() {
        for (tac, period) in [(0b100, 1024), (0b101, 16), (0b110, 64), (0b111, 256)] {
            let (mut timer, _) = timer();
            timer.write(TAC, tac);
            timer.advance(period - 1);
            assert_eq!(timer.read(TIMA), 0, "TAC = {tac:0>3b}");
            timer.advance(1);
            assert_eq!(timer.read(TIMA), 1, "TAC = {tac:0>3b}");
            timer.advance(period * 10);
            assert_eq!(timer.read(TIMA), 11, "TAC = {tac:0>3b}");
        }
    }

    #[test]
    fn stopped_timer_does_not_count() {
        let (mut timer, _) = timer();
        timer.write(TAC, 0b001);
        timer.advance(1000);
        assert_eq!(timer.read(TIMA), 0);
        assert_eq!(timer.read(TAC), 0xF9);
    }

    #[test]
    fn overflow_reloads_and_interrupts() {
        let (mut timer, ic) = timer();
        timer.write(TMA, 0xF0);
        timer.write(TIMA, 0xFF);
        timer.write(TAC, 0b101);
        timer.advance(15);
        assert_eq!(ic.pending(), 0);
        timer.advance(1);
        assert_eq!(timer.read(TIMA), 0xF0);
        assert_eq!(ic.pending(), Interrupt::Timer.mask());
    }

    #[test]
    fn divider_reset_glitch() {
        let (mut timer, _) = timer();
        timer.write(TAC, 0b101);
        // Bit 3 of the divider is now high
        timer.advance(8);
        assert_eq!(timer.read(TIMA), 0);
        timer.write(DIV, 0);
        assert_eq!(timer.read(TIMA), 1);
        // With the bit low, a reset is harmless
        timer.advance(4);
        timer.write(DIV, 0);
        assert_eq!(timer.read(TIMA), 1);
    }

    #[test]
    fn stopping_with_signal_high_increments() {
        let (mut timer, _) = timer();
        timer.write(TAC, 0b101);
        timer.advance(8);
        timer.write(TAC, 0b001);
        assert_eq!(timer.read(TIMA), 1);
        // Switching to a rate whose bit is also high does not glitch
        let (mut timer, _) = self::timer();
        timer.write(TAC, 0b101);
        timer.advance(0b11_1000);
        timer.write(TAC, 0b110);
        assert_eq!(timer.read(TIMA), 3);
    }
}
