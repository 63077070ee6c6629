use time::OffsetDateTime;
use tracing::trace;

/// The wall clock the RTC samples from.
pub type Clock = fn() -> OffsetDateTime;

/// Local time when the offset can be determined, UTC otherwise.
pub fn system_clock() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// The five RTC registers in the order they are selected: seconds, minutes, hours, the low eight
/// bits of the day counter and a byte holding the ninth bit of the day counter in bit 0.
#[derive(Debug, Default, Hash, Clone, Copy, PartialEq, Eq)]
pub struct RtcRegisters(pub [u8; 5]);

impl RtcRegisters {
    pub fn sample(time: OffsetDateTime) -> Self {
        let local_seconds = time.unix_timestamp() + time.offset().whole_seconds() as i64;
        let days = local_seconds.div_euclid(86_400);
        Self([
            time.second(),
            time.minute(),
            time.hour(),
            (days & 0xFF) as u8,
            ((days >> 8) & 0x01) as u8,
        ])
    }
}

/// The third bank controller, with a real-time clock.
///
/// The clock is never read directly. Writing 0 and then 1 to 0x6000-0x7FFF latches it: the 0
/// samples the wall clock into a holding buffer, the 1 publishes that buffer to the registers the
/// game can read. Selecting 0x08-0x0C through 0x4000-0x5FFF maps one of those registers into the
/// RAM window in place of a RAM bank.
#[derive(Debug, Clone)]
pub struct Mbc3 {
    bank: u8,
    ram_bank: u8,
    /// The RTC register currently mapped into the RAM window, if any.
    rtc_select: Option<u8>,
    ram_enabled: bool,
    has_rtc: bool,
    regs: RtcRegisters,
    latched: RtcRegisters,
    latch_pending: bool,
    clock: Clock,
}

impl Mbc3 {
    pub fn new(has_rtc: bool) -> Self {
        Self::with_clock(has_rtc, system_clock)
    }

    pub fn with_clock(has_rtc: bool, clock: Clock) -> Self {
        let regs = if has_rtc {
            RtcRegisters::sample(clock())
        } else {
            RtcRegisters::default()
        };
        Self {
            bank: 1,
            ram_bank: 0,
            rtc_select: None,
            ram_enabled: true,
            has_rtc,
            regs,
            latched: regs,
            latch_pending: false,
            clock,
        }
    }

    pub fn decode_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram_enabled = value & 0x0F == 0x0A,
            0x2000..=0x3FFF => {
                self.bank = match value & 0x7F {
                    0 => 1,
                    n => n,
                };
                trace!("MBC3 ROM bank set to 0x{:0>2X}", self.bank);
            }
            0x4000..=0x5FFF => match value {
                0x00..=0x07 => {
                    self.ram_bank = value;
                    self.rtc_select = None;
                }
                0x08..=0x0C if self.has_rtc => self.rtc_select = Some(value - 0x08),
                _ => {}
            },
            0x6000..=0x7FFF => match value {
                0 => {
                    self.latched = RtcRegisters::sample((self.clock)());
                    self.latch_pending = true;
                }
                1 if self.latch_pending => {
                    self.regs = self.latched;
                    self.latch_pending = false;
                }
                _ => self.latch_pending = false,
            },
            _ => {}
        }
    }

    pub fn rom_bank(&self) -> usize {
        self.bank as usize
    }

    pub fn ram_bank(&self) -> usize {
        self.ram_bank as usize
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    /// The RTC register mapped into the RAM window, if one is.
    pub fn read_rtc(&self) -> Option<u8> {
        self.rtc_select.map(|i| self.regs.0[i as usize])
    }

    /// Games set the clock by writing the mapped register. Returns `false` if no register is
    /// mapped, in which case the write belongs to RAM.
    pub fn write_rtc(&mut self, value: u8) -> bool {
        match self.rtc_select {
            Some(i) => {
                self.regs.0[i as usize] = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn noon() -> OffsetDateTime {
        datetime!(1970-01-02 12:34:56 UTC)
    }

    fn later() -> OffsetDateTime {
        datetime!(1971-01-02 23:59:01 UTC)
    }

    #[test]
    fn rom_bank_zero_maps_to_one() {
        let mut mbc = Mbc3::with_clock(true, noon);
        mbc.decode_write(0x2000, 0x00);
        assert_eq!(mbc.rom_bank(), 1);
        mbc.decode_write(0x2000, 0xFF);
        assert_eq!(mbc.rom_bank(), 0x7F);
    }

    #[test]
    fn registers_are_sampled_at_power_on() {
        let mut mbc = Mbc3::with_clock(true, noon);
        let read = |mbc: &mut Mbc3, reg: u8| {
            mbc.decode_write(0x4000, reg);
            mbc.read_rtc()
        };
        assert_eq!(read(&mut mbc, 0x08), Some(56));
        assert_eq!(read(&mut mbc, 0x09), Some(34));
        assert_eq!(read(&mut mbc, 0x0A), Some(12));
        assert_eq!(read(&mut mbc, 0x0B), Some(1));
        assert_eq!(read(&mut mbc, 0x0C), Some(0));
        assert_eq!(read(&mut mbc, 0x01), None);
        assert_eq!(mbc.ram_bank(), 1);
    }

    #[test]
    fn latch_sequence() {
        let mut mbc = Mbc3::with_clock(true, noon);
        mbc.clock = later;
        mbc.decode_write(0x4000, 0x0A);
        // A lone 1 does nothing
        mbc.decode_write(0x6000, 0x01);
        assert_eq!(mbc.read_rtc(), Some(12));
        // Neither does a 0 on its own
        mbc.decode_write(0x6000, 0x00);
        assert_eq!(mbc.read_rtc(), Some(12));
        mbc.decode_write(0x6000, 0x01);
        assert_eq!(mbc.read_rtc(), Some(23));
        // 366 days after the epoch needs the ninth bit of the day counter
        mbc.decode_write(0x4000, 0x0B);
        assert_eq!(mbc.read_rtc(), Some(110));
        mbc.decode_write(0x4000, 0x0C);
        assert_eq!(mbc.read_rtc(), Some(1));
    }

    #[test]
    fn rtc_registers_are_writable() {
        let mut mbc = Mbc3::with_clock(true, noon);
        assert!(!mbc.write_rtc(5));
        mbc.decode_write(0x4000, 0x08);
        assert!(mbc.write_rtc(5));
        assert_eq!(mbc.read_rtc(), Some(5));
    }

    #[test]
    fn carts_without_a_clock_ignore_rtc_selects() {
        let mut mbc = Mbc3::with_clock(false, noon);
        mbc.decode_write(0x4000, 0x08);
        assert_eq!(mbc.read_rtc(), None);
    }
}
