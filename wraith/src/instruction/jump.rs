use super::*;

/// Extra cycles a taken JR cc or JP cc spends.
const TAKEN_JUMP: u8 = 4;
/// Extra cycles a taken CALL cc or RET cc spends.
const TAKEN_CALL: u8 = 12;

/// Opcode: 0x18
pub fn jr(cpu: &mut Cpu, _: &mut dyn Bus, op: &Operand) -> u8 {
    cpu.pc = cpu.pc.wrapping_add_signed(op.offset() as i16);
    0
}

/// JR cc, e8. Opcodes 0x20, 0x28, 0x30 and 0x38.
pub fn jr_cc<const CC: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, op: &Operand) -> u8 {
    if !cpu.condition(CC) {
        return 0;
    }
    jr(cpu, bus, op);
    TAKEN_JUMP
}

/// Opcode: 0xC3
pub fn jp(cpu: &mut Cpu, _: &mut dyn Bus, op: &Operand) -> u8 {
    cpu.pc = op.word();
    0
}

/// JP cc, n16. Opcodes 0xC2, 0xCA, 0xD2 and 0xDA.
pub fn jp_cc<const CC: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, op: &Operand) -> u8 {
    if !cpu.condition(CC) {
        return 0;
    }
    jp(cpu, bus, op);
    TAKEN_JUMP
}

/// Opcode: 0xE9
pub fn jp_hl(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.pc = cpu.hl();
    0
}

/// Opcode: 0xCD
pub fn call(cpu: &mut Cpu, bus: &mut dyn Bus, op: &Operand) -> u8 {
    cpu.push(bus, cpu.pc);
    cpu.pc = op.word();
    0
}

/// CALL cc, n16. Opcodes 0xC4, 0xCC, 0xD4 and 0xDC.
pub fn call_cc<const CC: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, op: &Operand) -> u8 {
    if !cpu.condition(CC) {
        return 0;
    }
    call(cpu, bus, op);
    TAKEN_CALL
}

/// Opcode: 0xC9
pub fn ret(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.pc = cpu.pop(bus);
    0
}

/// RET cc. Opcodes 0xC0, 0xC8, 0xD0 and 0xD8.
pub fn ret_cc<const CC: u8>(cpu: &mut Cpu, bus: &mut dyn Bus, op: &Operand) -> u8 {
    if !cpu.condition(CC) {
        return 0;
    }
    ret(cpu, bus, op);
    TAKEN_CALL
}

/// RST. Opcodes 0x_7 and 0x_F in the last block.
pub fn rst<const ADDR: u16>(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.push(bus, cpu.pc);
    cpu.pc = ADDR;
    0
}
