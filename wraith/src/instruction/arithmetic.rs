use super::*;
use crate::cpu::alu;

/// The eight accumulator operations, indexed the way opcodes 0x80 through 0xBF encode them.
fn accumulate(cpu: &mut Cpu, op: u8, val: u8) {
    let a = cpu.a;
    let carry = cpu.f.c;
    let flags = &mut cpu.f;
    cpu.a = match op & 0b111 {
        0 => alu::add_bytes(a, val, false, flags),
        1 => alu::add_bytes(a, val, carry, flags),
        2 => alu::sub_bytes(a, val, false, flags),
        3 => alu::sub_bytes(a, val, carry, flags),
        4 => alu::and_bytes(a, val, flags),
        5 => alu::xor_bytes(a, val, flags),
        6 => alu::or_bytes(a, val, flags),
        // CP only keeps the flags
        _ => {
            alu::sub_bytes(a, val, false, flags);
            a
        }
    };
}

/// ADD/ADC/SUB/SBC/AND/XOR/OR/CP A, r. Opcodes 0x80 through 0xBF.
pub fn alu_r<const OP: u8, const R: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    let val = cpu.read_r8(bus, R);
    accumulate(cpu, OP, val);
    0
}

/// The immediate forms of the accumulator operations. Opcodes 0x_6 and 0x_E in the last block.
pub fn alu_n8<const OP: u8>(cpu: &mut Cpu, _: &mut dyn Bus, op: &Operand) -> u8 {
    accumulate(cpu, OP, op.byte());
    0
}

pub fn inc_r<const R: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    let val = cpu.read_r8(bus, R);
    let val = alu::inc_byte(val, &mut cpu.f);
    cpu.write_r8(bus, R, val);
    0
}

pub fn dec_r<const R: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    let val = cpu.read_r8(bus, R);
    let val = alu::dec_byte(val, &mut cpu.f);
    cpu.write_r8(bus, R, val);
    0
}

/// 16-bit increments touch no flags.
pub fn inc_rr<const P: u8>(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.write_r16(P, cpu.read_r16(P).wrapping_add(1));
    0
}

pub fn dec_rr<const P: u8>(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.write_r16(P, cpu.read_r16(P).wrapping_sub(1));
    0
}

/// ADD HL, rr. Opcodes 0x09, 0x19, 0x29 and 0x39.
pub fn add_hl_rr<const P: u8>(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    let val = alu::add_words(cpu.hl(), cpu.read_r16(P), &mut cpu.f);
    cpu.set_hl(val);
    0
}

/// Opcode: 0xE8
pub fn add_sp_e8(cpu: &mut Cpu, _: &mut dyn Bus, op: &Operand) -> u8 {
    cpu.sp = alu::offset_sp(cpu.sp, op.offset(), &mut cpu.f);
    0
}

/// Opcode: 0x27
pub fn daa(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.a = alu::decimal_adjust(cpu.a, &mut cpu.f);
    0
}

/// Opcode: 0x2F
pub fn cpl(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.a = !cpu.a;
    cpu.f.n = true;
    cpu.f.h = true;
    0
}

/// Opcode: 0x37
pub fn scf(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.f.n = false;
    cpu.f.h = false;
    cpu.f.c = true;
    0
}

/// Opcode: 0x3F
pub fn ccf(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.f.n = false;
    cpu.f.h = false;
    cpu.f.c = !cpu.f.c;
    0
}
