use super::*;
use crate::cpu::CpuState;
use crate::interrupt::{IE_ADDR, IF_ADDR};

/// Opcode: 0x00
pub fn nop(_: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    0
}

/// Opcode: 0x76
/// With the master enable clear and an interrupt already waiting, the CPU does not halt at all.
/// Instead it trips the halt bug: the next opcode is fetched without advancing PC.
pub fn halt(cpu: &mut Cpu, bus: &mut dyn Bus, _: &Operand) -> u8 {
    let waiting = bus.read(IE_ADDR) & bus.read(IF_ADDR) & 0x1F != 0;
    if !cpu.ime && waiting {
        cpu.halt_bug = true;
    } else {
        cpu.state = CpuState::Halted;
    }
    0
}

/// Opcode: 0x10
/// The operand byte is ignored. What happens next (a speed switch or a wait for the joypad) is up
/// to the driving loop.
pub fn stop(cpu: &mut Cpu, _: &mut dyn Bus, _: &Operand) -> u8 {
    cpu.state = CpuState::Stopped;
    0
}
