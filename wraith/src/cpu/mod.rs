use tracing::{error, trace};

use crate::error::EmulationError;
use crate::instruction::{Descriptor, OpEntry, Operand, EXTENDED_OP_TABLE, OP_TABLE};
use crate::mem::Bus;
use crate::Model;

pub mod alu;


/// The number of cycles a halted or stopped CPU burns per step while it waits.
pub const IDLE_CYCLES: u32 = 4;

/// The register file and control state of the CPU.
#[derive(Debug, Default, Hash, Clone, PartialEq, Eq, derive_more::Display)]
#[display(
    "CPU {{ A=0x{:0>2X} F={} B=0x{:0>2X} C=0x{:0>2X} D=0x{:0>2X} E=0x{:0>2X} H=0x{:0>2X} L=0x{:0>2X} SP=0x{:0>4X} PC=0x{:0>4X} IME={} State={} }}",
    a,
    f,
    b,
    c,
    d,
    e,
    h,
    l,
    sp,
    pc,
    ime,
    state
)]
pub struct Cpu {
    pub a: u8,
    pub f: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    /// The SP register
    pub sp: u16,
    /// The PC register
    pub pc: u16,
    /// The master interrupt enable.
    pub ime: bool,
    /// EI and DI do not take effect right away. They park the new IME value here and it is applied
    /// once the instruction after them finishes.
    pub ime_change: Option<bool>,
    /// Set when HALT trips the halt bug. The next opcode fetch does not advance PC, so that byte is
    /// read twice.
    pub halt_bug: bool,
    pub state: CpuState,
}

#[derive(Debug, Default, Hash, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum CpuState {
    #[default]
    Running,
    /// Entered by HALT. Left when an enabled interrupt becomes pending.
    Halted,
    /// Entered by STOP. Left by a speed switch or by a joypad interrupt.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, derive_more::Display)]
#[display("Flags(Z={} N={} H={} C={})", *z as u8, *n as u8, *h as u8, *c as u8)]
pub struct Flags {
    /// The zero flag
    pub z: bool,
    /// The substraction flag
    pub n: bool,
    /// The half-carry flag
    pub h: bool,
    /// The full carry flag
    pub c: bool,
}

impl From<u8> for Flags {
    fn from(value: u8) -> Self {
        Self {
            z: check_bit_const::<7>(value),
            n: check_bit_const::<6>(value),
            h: check_bit_const::<5>(value),
            c: check_bit_const::<4>(value),
        }
    }
}

impl Flags {
    pub fn set_for_byte_shift_op(&mut self, z: bool, c: bool) {
        self.z = z;
        self.n = false;
        self.h = false;
        self.c = c;
    }

    pub fn set_for_logic(&mut self, digest: u8) {
        self.set_for_byte_shift_op(digest == 0, false);
    }

    /// The flags as they appear in the low byte of AF. The low nibble is always clear.
    pub fn as_byte(&self) -> u8 {
        bool_to_mask::<7>(self.z)
            | bool_to_mask::<6>(self.n)
            | bool_to_mask::<5>(self.h)
            | bool_to_mask::<4>(self.c)
    }
}

const fn bit_select<const B: u8>() -> u8 {
    const {
        match B {
            n @ 0..=7 => 0x1 << n,
            _ => panic!("You must select between the 0th and 7th bit!"),
        }
    }
}

const fn bool_to_mask<const B: u8>(val: bool) -> u8 {
    (val as u8) << B
}

pub(crate) const fn check_bit(bit: u8, src: u8) -> bool {
    let bit = 0x1 << bit;
    (src & bit) == bit
}

pub const fn check_bit_const<const B: u8>(src: u8) -> bool {
    (src & bit_select::<B>()) == bit_select::<B>()
}

/// Index of the `(HL)` pseudo-register in the 3-bit register encoding.
pub const HL_POINTER: u8 = 6;

impl Cpu {
    /// The register state the boot ROM leaves behind for the given model.
    pub fn power_on(model: Model) -> Self {
        let mut cpu = Self {
            pc: 0x0100,
            sp: 0xFFFE,
            ..Default::default()
        };
        match model {
            Model::Dmg => {
                cpu.set_af(0x01B0);
                cpu.set_bc(0x0013);
                cpu.set_de(0x00D8);
                cpu.set_hl(0x014D);
            }
            Model::Cgb | Model::Auto => {
                cpu.set_af(0x1180);
                cpu.set_bc(0x0000);
                cpu.set_de(0xFF56);
                cpu.set_hl(0x000D);
            }
        }
        cpu
    }

    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.a, self.f.as_byte()])
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    /// The low nibble of F does not exist in hardware, so it is dropped here.
    pub fn set_af(&mut self, val: u16) {
        let [a, f] = val.to_be_bytes();
        self.a = a;
        self.f = f.into();
    }

    pub fn set_bc(&mut self, val: u16) {
        [self.b, self.c] = val.to_be_bytes();
    }

    pub fn set_de(&mut self, val: u16) {
        [self.d, self.e] = val.to_be_bytes();
    }

    pub fn set_hl(&mut self, val: u16) {
        [self.h, self.l] = val.to_be_bytes();
    }

    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    pub fn is_stopped(&self) -> bool {
        self.state == CpuState::Stopped
    }

    /// Leaves HALT or STOP.
    pub fn resume(&mut self) {
        self.state = CpuState::Running;
    }

    /// Reads one of the eight 8-bit operands addressed by the 3-bit register encoding used
    /// throughout the instruction set: B, C, D, E, H, L, (HL), A.
    pub fn read_r8(&self, bus: &dyn Bus, index: u8) -> u8 {
        match index & 0b111 {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            HL_POINTER => bus.read(self.hl()),
            _ => self.a,
        }
    }

    pub fn write_r8(&mut self, bus: &mut dyn Bus, index: u8, val: u8) {
        match index & 0b111 {
            0 => self.b = val,
            1 => self.c = val,
            2 => self.d = val,
            3 => self.e = val,
            4 => self.h = val,
            5 => self.l = val,
            HL_POINTER => bus.write(self.hl(), val),
            _ => self.a = val,
        }
    }

    /// Reads a register pair by its 2-bit encoding: BC, DE, HL, SP.
    pub fn read_r16(&self, index: u8) -> u16 {
        match index & 0b11 {
            0 => self.bc(),
            1 => self.de(),
            2 => self.hl(),
            _ => self.sp,
        }
    }

    pub fn write_r16(&mut self, index: u8, val: u16) {
        match index & 0b11 {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => self.set_hl(val),
            _ => self.sp = val,
        }
    }

    /// Like `read_r16`, but for PUSH and POP, where the fourth pair is AF instead of SP.
    pub fn read_stack_r16(&self, index: u8) -> u16 {
        match index & 0b11 {
            3 => self.af(),
            i => self.read_r16(i),
        }
    }

    pub fn write_stack_r16(&mut self, index: u8, val: u16) {
        match index & 0b11 {
            3 => self.set_af(val),
            i => self.write_r16(i, val),
        }
    }

    /// Evaluates a branch condition by its 2-bit encoding: NZ, Z, NC, C.
    pub fn condition(&self, index: u8) -> bool {
        match index & 0b11 {
            0 => !self.f.z,
            1 => self.f.z,
            2 => !self.f.c,
            _ => self.f.c,
        }
    }

    /// The stack grows down. The high byte lands at SP-1 and the low byte at SP-2.
    pub fn push(&mut self, bus: &mut dyn Bus, val: u16) {
        let [hi, lo] = val.to_be_bytes();
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, hi);
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, lo);
    }

    pub fn pop(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = bus.read(self.sp);
        self.sp = self.sp.wrapping_add(1);
        let hi = bus.read(self.sp);
        self.sp = self.sp.wrapping_add(1);
        u16::from_be_bytes([hi, lo])
    }

    /// Reads the byte at PC and moves PC past it.
    fn fetch(&mut self, bus: &dyn Bus) -> u8 {
        let byte = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    /// Fetches an opcode. This is the one fetch the halt bug affects.
    fn fetch_opcode(&mut self, bus: &dyn Bus) -> u8 {
        if self.halt_bug {
            self.halt_bug = false;
            return bus.read(self.pc);
        }
        self.fetch(bus)
    }

    fn fetch_operand(&mut self, bus: &dyn Bus, len: u8) -> Operand {
        (0..len).map(|_| self.fetch(bus)).collect()
    }

    /// Executes one instruction (or idles for one step while halted or stopped) and returns the
    /// number of cycles it took.
    pub fn step(&mut self, bus: &mut dyn Bus) -> Result<u32, EmulationError> {
        if self.state != CpuState::Running {
            return Ok(IDLE_CYCLES);
        }
        let pc = self.pc;
        let opcode = self.fetch_opcode(bus);
        // Taken before the instruction runs so that an EI or DI schedules for the *next* step.
        let ime_change = self.ime_change.take();
        let desc = match OP_TABLE[opcode as usize] {
            OpEntry::Normal(desc) => desc,
            OpEntry::ExtendedPrefix => {
                let opcode = self.fetch(bus);
                match EXTENDED_OP_TABLE[opcode as usize] {
                    OpEntry::Normal(desc) => desc,
                    _ => {
                        let err = EmulationError::UnimplementedOpcode {
                            pc,
                            opcode,
                            extended: true,
                        };
                        error!("{err}");
                        return Err(err);
                    }
                }
            }
            OpEntry::Unimplemented => {
                let err = EmulationError::UnimplementedOpcode {
                    pc,
                    opcode,
                    extended: false,
                };
                error!("{err}");
                return Err(err);
            }
            OpEntry::Illegal => {
                let err = EmulationError::IllegalOpcode { pc, opcode };
                error!("{err}");
                return Err(err);
            }
        };
        let cycles = self.execute(pc, desc, bus);
        if let Some(ime) = ime_change {
            self.ime = ime;
        }
        Ok(cycles)
    }

    fn execute(&mut self, pc: u16, desc: Descriptor, bus: &mut dyn Bus) -> u32 {
        let operand = self.fetch_operand(bus, desc.operand_len);
        trace!("0x{pc:0>4X}: {}", desc.render(&operand));
        let extra = (desc.handler)(self, bus, &operand);
        desc.cycles as u32 + extra as u32
    }

    /// Jumps into an interrupt handler: IME is cleared, PC is pushed and replaced by the vector.
    /// Dispatching always pulls the CPU out of HALT.
    ///
    /// If the halt bug is still pending (an EI directly before a HALT that found an interrupt
    /// waiting), the handler returns to the HALT rather than past it.
    pub fn dispatch(&mut self, bus: &mut dyn Bus, vector: u16) {
        self.state = CpuState::Running;
        self.ime = false;
        let ret = if std::mem::take(&mut self.halt_bug) {
            self.pc.wrapping_sub(1)
        } else {
            self.pc
        };
        self.push(bus, ret);
        self.pc = vector;
    }
}

/// Renders the instruction at `addr` without executing it.
pub fn disassemble(bus: &dyn Bus, addr: u16) -> String {
    let opcode = bus.read(addr);
    let (desc, operand_start) = match OP_TABLE[opcode as usize] {
        OpEntry::Normal(desc) => (desc, addr.wrapping_add(1)),
        OpEntry::ExtendedPrefix => {
            let ext = bus.read(addr.wrapping_add(1));
            match EXTENDED_OP_TABLE[ext as usize] {
                OpEntry::Normal(desc) => (desc, addr.wrapping_add(2)),
                _ => return format!("??? (0xCB 0x{ext:0>2X})"),
            }
        }
        OpEntry::Unimplemented => return format!("??? (0x{opcode:0>2X})"),
        OpEntry::Illegal => return format!("ILLEGAL (0x{opcode:0>2X})"),
    };
    let operand: Operand = (0..desc.operand_len as u16)
        .map(|i| bus.read(operand_start.wrapping_add(i)))
        .collect();
    desc.render(&operand)
}
