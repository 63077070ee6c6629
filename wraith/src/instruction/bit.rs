use super::*;
use crate::cpu::check_bit;

/// BIT b, r. Z is set when the bit is clear. Carry is untouched.
pub fn bit<const B: u8, const R: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    let val = cpu.read_r8(bus, R);
    cpu.f.z = !check_bit(B, val);
    cpu.f.n = false;
    cpu.f.h = true;
    0
}

/// RES b, r.
pub fn res<const B: u8, const R: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    let val = cpu.read_r8(bus, R) & !(1 << B);
    cpu.write_r8(bus, R, val);
    0
}

/// SET b, r.
pub fn set<const B: u8, const R: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    let val = cpu.read_r8(bus, R) | (1 << B);
    cpu.write_r8(bus, R, val);
    0
}
