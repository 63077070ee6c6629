use tracing::debug;

use crate::cpu::check_bit_const;
use crate::interrupt::{Interrupt, InterruptRequester};
use crate::joypad::JoypadHandle;
use crate::mem::Device;
use crate::Model;

/// ADDR FF00
const JOYP: u16 = 0xFF00;
/// ADDR FF01
const SB: u16 = 0xFF01;
/// ADDR FF02
const SC: u16 = 0xFF02;
/// ADDR FF4D
const KEY1: u16 = 0xFF4D;

/// The catch-all block of I/O registers at 0xFF00-0xFF7F. Registers owned by more specific devices
/// (timer, interrupt flags, video, work RAM bank) are claimed by those devices first; what remains
/// lands here. That includes the joypad, the serial port, the speed switch and the sound registers,
/// which are stored but otherwise inert.
#[derive(Debug, Clone)]
pub struct IoPorts {
    joypad: JoypadHandle,
    interrupts: InterruptRequester,
    /// Only the color model has a speed switch. Elsewhere KEY1 reads open and ignores writes.
    color: bool,
    /// Bits 4 and 5 of the joypad register. A cleared bit selects that row of buttons.
    joypad_select: u8,
    /// ADDR FF01
    serial_data: u8,
    /// ADDR FF02
    serial_control: u8,
    /// Every byte pushed out over the serial port, in order.
    serial_out: Vec<u8>,
    /// Bit 0 of KEY1. Set by the game before it executes STOP to request a speed switch.
    speed_switch_armed: bool,
    /// Bit 7 of KEY1.
    double_speed: bool,
    /// Backing storage for the registers that are only stored, never interpreted.
    raw: [u8; 0x80],
}

impl IoPorts {
    pub fn new(model: Model, joypad: JoypadHandle, interrupts: InterruptRequester) -> Self {
        Self {
            joypad,
            interrupts,
            color: model == Model::Cgb,
            joypad_select: 0x30,
            serial_data: 0,
            serial_control: 0,
            serial_out: Vec::new(),
            speed_switch_armed: false,
            double_speed: false,
            raw: [0; 0x80],
        }
    }

    pub fn double_speed(&self) -> bool {
        self.double_speed
    }

    pub fn speed_switch_armed(&self) -> bool {
        self.speed_switch_armed
    }

    /// Performs an armed speed switch. Returns `false` (and does nothing) if the game did not arm
    /// one beforehand.
    pub fn switch_speed(&mut self) -> bool {
        if !self.speed_switch_armed {
            return false;
        }
        self.speed_switch_armed = false;
        self.double_speed = !self.double_speed;
        debug!("Switched to {} speed", if self.double_speed { "double" } else { "normal" });
        true
    }

    /// Everything sent over the serial port so far.
    pub fn serial_output(&self) -> &[u8] {
        &self.serial_out
    }

    /// Drains the serial output buffer.
    pub fn take_serial_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.serial_out)
    }

    fn read_joypad(&self) -> u8 {
        let buttons = self.joypad.buttons();
        let mut low = 0x0F;
        if !check_bit_const::<4>(self.joypad_select) {
            low &= buttons.directions();
        }
        if !check_bit_const::<5>(self.joypad_select) {
            low &= buttons.actions();
        }
        0xC0 | self.joypad_select | low
    }

    /// There is no link partner, so a transfer clocked by this side completes at once and the
    /// other end is read as disconnected.
    fn start_serial_transfer(&mut self) {
        self.serial_out.push(self.serial_data);
        self.serial_data = 0xFF;
        self.serial_control &= 0x7F;
        self.interrupts.request(Interrupt::Serial);
    }
}

impl Device for IoPorts {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            JOYP => self.read_joypad(),
            SB => self.serial_data,
            SC => 0x7E | self.serial_control,
            KEY1 if !self.color => 0xFF,
            KEY1 => {
                0x7E | ((self.double_speed as u8) << 7) | self.speed_switch_armed as u8
            }
            _ => self.raw[(addr - 0xFF00) as usize],
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            JOYP => self.joypad_select = value & 0x30,
            SB => self.serial_data = value,
            SC => {
                self.serial_control = value & 0x81;
                if self.serial_control == 0x81 {
                    self.start_serial_transfer();
                }
            }
            KEY1 if !self.color => {}
            KEY1 => self.speed_switch_armed = check_bit_const::<0>(value),
            _ => self.raw[(addr - 0xFF00) as usize] = value,
        }
    }

    fn owns(&self, addr: u16) -> bool {
        (0xFF00..=0xFF7F).contains(&addr)
    }
}
