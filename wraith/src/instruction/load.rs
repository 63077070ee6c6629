use super::*;
use crate::cpu::alu::offset_sp;

/// LD r, r'. Opcodes 0x40 through 0x7F, except 0x76.
pub fn ld_r_r<const D: u8, const S: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    let val = cpu.read_r8(bus, S);
    cpu.write_r8(bus, D, val);
    0
}

/// LD r, n8. Opcodes 0x_6 and 0x_E.
pub fn ld_r_n8<const R: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, op: &Operand) -> u8 {
    cpu.write_r8(bus, R, op.byte());
    0
}

/// LD rr, n16. Opcodes 0x_1.
pub fn ld_rr_n16<const P: u8>(cpu: &mut Cpu, _: &mut dyn Bus, op: &Operand) -> u8 {
    cpu.write_r16(P, op.word());
    0
}

/// The address used by the four `(rr)` forms of `LD A`: BC, DE, HL with post-increment and HL
/// with post-decrement.
fn indirect_addr(cpu: &mut Cpu, index: u8) -> u16 {
    match index {
        0 => cpu.bc(),
        1 => cpu.de(),
        2 => {
            let hl = cpu.hl();
            cpu.set_hl(hl.wrapping_add(1));
            hl
        }
        _ => {
            let hl = cpu.hl();
            cpu.set_hl(hl.wrapping_sub(1));
            hl
        }
    }
}

/// LD (rr), A. Opcodes 0x02, 0x12, 0x22 and 0x32.
pub fn st_a_ind<const I: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    let addr = indirect_addr(cpu, I);
    bus.write(addr, cpu.a);
    0
}

/// LD A, (rr). Opcodes 0x0A, 0x1A, 0x2A and 0x3A.
pub fn ld_a_ind<const I: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    let addr = indirect_addr(cpu, I);
    cpu.a = bus.read(addr);
    0
}

/// Opcode: 0x08
/// Store SP & $FF at address n16 and SP >> 8 at address n16 + 1.
pub fn st_sp_n16(cpu: &mut Cpu, bus: &mut dyn Bus, op: &Operand) -> u8 {
    bus.write_word(op.word(), cpu.sp);
    0
}

/// Opcode: 0xE0
pub fn ldh_n8_a(cpu: &mut Cpu, bus: &mut dyn Bus, op: &Operand) -> u8 {
    bus.write(0xFF00 | op.byte() as u16, cpu.a);
    0
}

/// Opcode: 0xF0
pub fn ldh_a_n8(cpu: &mut Cpu, bus: &mut dyn Bus, op: &Operand) -> u8 {
    cpu.a = bus.read(0xFF00 | op.byte() as u16);
    0
}

/// Opcode: 0xE2
pub fn ldh_c_a(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    bus.write(0xFF00 | cpu.c as u16, cpu.a);
    0
}

/// Opcode: 0xF2
pub fn ldh_a_c(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.a = bus.read(0xFF00 | cpu.c as u16);
    0
}

/// Opcode: 0xEA
pub fn st_a_n16(cpu: &mut Cpu, bus: &mut dyn Bus, op: &Operand) -> u8 {
    bus.write(op.word(), cpu.a);
    0
}

/// Opcode: 0xFA
pub fn ld_a_n16(cpu: &mut Cpu, bus: &mut dyn Bus, op: &Operand) -> u8 {
    cpu.a = bus.read(op.word());
    0
}

/// Opcode: 0xF8
/// Add the signed value e8 to SP and store the result in HL.
pub fn ld_hl_sp_e8(cpu: &mut Cpu, _: &mut dyn Bus, op: &Operand) -> u8 {
    let val = offset_sp(cpu.sp, op.offset(), &mut cpu.f);
    cpu.set_hl(val);
    0
}

/// Opcode: 0xF9
pub fn ld_sp_hl(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.sp = cpu.hl();
    0
}

/// PUSH rr. Opcodes 0x_5 in the last block. Pair 3 is AF.
pub fn push<const P: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    let val = cpu.read_stack_r16(P);
    cpu.push(bus, val);
    0
}

/// POP rr. Opcodes 0x_1 in the last block. Popping into AF drops the low nibble of F.
pub fn pop<const P: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    let val = cpu.pop(bus);
    cpu.write_stack_r16(P, val);
    0
}
