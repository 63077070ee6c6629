use super::*;

/// Opcode: 0xFB
/// The master enable is set once the *next* instruction has run.
pub fn ei(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.ime_change = Some(true);
    0
}

/// Opcode: 0xF3
pub fn di(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.ime_change = Some(false);
    0
}

/// Opcode: 0xD9
/// Unlike EI, RETI turns the master enable on immediately.
pub fn reti(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.pc = cpu.pop(bus);
    cpu.ime = true;
    cpu.ime_change = None;
    0
}
