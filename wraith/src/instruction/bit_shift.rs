use super::*;
use crate::cpu::alu::ShiftOp;

/// The accumulator rotates of the main table behave like their extended counterparts, except
/// that Z is always cleared.
fn rotate_a(cpu: &mut Cpu, op: ShiftOp) {
    cpu.a = op.apply(cpu.a, &mut cpu.f);
    cpu.f.z = false;
}

/// Opcode: 0x07
pub fn rlca(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    rotate_a(cpu, ShiftOp::RotateLeftCircular);
    0
}

/// Opcode: 0x0F
pub fn rrca(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    rotate_a(cpu, ShiftOp::RotateRightCircular);
    0
}

/// Opcode: 0x17
pub fn rla(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    rotate_a(cpu, ShiftOp::RotateLeft);
    0
}

/// Opcode: 0x1F
pub fn rra(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    rotate_a(cpu, ShiftOp::RotateRight);
    0
}

/// RLC/RRC/RL/RR/SLA/SRA/SWAP/SRL r. Extended opcodes 0x00 through 0x3F.
pub fn cb_shift<const OP: u8, const R: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    let val = cpu.read_r8(bus, R);
    let val = ShiftOp::from_index(OP).apply(val, &mut cpu.f);
    cpu.write_r8(bus, R, val);
    0
}
