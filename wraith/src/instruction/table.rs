use array_concat::concat_arrays;

use super::arithmetic::*;
use super::bit::*;
use super::bit_shift::*;
use super::control::*;
use super::interrupt::*;
use super::jump::*;
use super::load::*;
use super::{Descriptor, OpEntry};

type OpArray<const N: usize> = [OpEntry; N];

/// The 3-bit register encoding.
macro_rules! r8 {
    (B) => {
        0
    };
    (C) => {
        1
    };
    (D) => {
        2
    };
    (E) => {
        3
    };
    (H) => {
        4
    };
    (L) => {
        5
    };
    (HL) => {
        6
    };
    (A) => {
        7
    };
}

macro_rules! r8_name {
    (HL) => {
        "(HL)"
    };
    ($r: ident) => {
        stringify!($r)
    };
}

/// Picks the cost of the `(HL)` form or of the plain register form.
macro_rules! pick {
    (HL, $mem: literal, $reg: literal) => {
        $mem
    };
    ($r: ident, $mem: literal, $reg: literal) => {
        $reg
    };
}

macro_rules! op {
    ($template: expr, $len: literal, $cycles: expr, $handler: expr) => {
        OpEntry::Normal(Descriptor {
            template: $template,
            operand_len: $len,
            cycles: $cycles,
            handler: $handler,
        })
    };
}

macro_rules! ld {
    (HL, HL) => {
        op!("HALT", 0, 4, halt)
    };
    (HL, $src: ident) => {
        op!(
            concat!("LD (HL), ", r8_name!($src)),
            0,
            8,
            ld_r_r::<{ r8!(HL) }, { r8!($src) }>
        )
    };
    ($dest: ident, $src: ident) => {
        op!(
            concat!("LD ", r8_name!($dest), ", ", r8_name!($src)),
            0,
            pick!($src, 8, 4),
            ld_r_r::<{ r8!($dest) }, { r8!($src) }>
        )
    };
}

macro_rules! inc {
    ($r: ident) => {
        op!(
            concat!("INC ", r8_name!($r)),
            0,
            pick!($r, 12, 4),
            inc_r::<{ r8!($r) }>
        )
    };
}

macro_rules! dec {
    ($r: ident) => {
        op!(
            concat!("DEC ", r8_name!($r)),
            0,
            pick!($r, 12, 4),
            dec_r::<{ r8!($r) }>
        )
    };
}

macro_rules! ld_n8 {
    ($r: ident) => {
        op!(
            concat!("LD ", r8_name!($r), ", {n8}"),
            1,
            pick!($r, 12, 8),
            ld_r_n8::<{ r8!($r) }>
        )
    };
}

/// Expands one 8-entry row of a register grid. The register order matches the opcode encoding.
macro_rules! row {
    ($entry: ident $(, $arg: tt)*) => {
        [
            $entry!($($arg,)* B),
            $entry!($($arg,)* C),
            $entry!($($arg,)* D),
            $entry!($($arg,)* E),
            $entry!($($arg,)* H),
            $entry!($($arg,)* L),
            $entry!($($arg,)* HL),
            $entry!($($arg,)* A),
        ]
    };
}

macro_rules! alu {
    ($name: literal, $op: literal, $r: ident) => {
        op!(
            concat!($name, r8_name!($r)),
            0,
            pick!($r, 8, 4),
            alu_r::<$op, { r8!($r) }>
        )
    };
}

macro_rules! shift {
    ($name: literal, $op: literal, $r: ident) => {
        op!(
            concat!($name, " ", r8_name!($r)),
            0,
            pick!($r, 16, 8),
            cb_shift::<$op, { r8!($r) }>
        )
    };
}

macro_rules! bit_test {
    ($b: literal, $r: ident) => {
        op!(
            concat!("BIT ", $b, ", ", r8_name!($r)),
            0,
            pick!($r, 12, 8),
            bit::<$b, { r8!($r) }>
        )
    };
}

macro_rules! bit_reset {
    ($b: literal, $r: ident) => {
        op!(
            concat!("RES ", $b, ", ", r8_name!($r)),
            0,
            pick!($r, 16, 8),
            res::<$b, { r8!($r) }>
        )
    };
}

macro_rules! bit_set {
    ($b: literal, $r: ident) => {
        op!(
            concat!("SET ", $b, ", ", r8_name!($r)),
            0,
            pick!($r, 16, 8),
            set::<$b, { r8!($r) }>
        )
    };
}

/// Eight rows of one register grid, concatenated into a 64-entry block.
macro_rules! block {
    ($($row: expr),* $(,)?) => {{
        const BLOCK: OpArray<0x40> = concat_arrays!($({
            const ROW: OpArray<8> = $row;
            ROW
        }),*);
        BLOCK
    }};
}

/// Opcodes 0x00 through 0x3F.
const MISC_BLOCK: OpArray<0x40> = [
    op!("NOP", 0, 4, nop),
    op!("LD BC, {n16}", 2, 12, ld_rr_n16::<0>),
    op!("LD (BC), A", 0, 8, st_a_ind::<0>),
    op!("INC BC", 0, 8, inc_rr::<0>),
    inc!(B),
    dec!(B),
    ld_n8!(B),
    op!("RLCA", 0, 4, rlca),
    op!("LD ({n16}), SP", 2, 20, st_sp_n16),
    op!("ADD HL, BC", 0, 8, add_hl_rr::<0>),
    op!("LD A, (BC)", 0, 8, ld_a_ind::<0>),
    op!("DEC BC", 0, 8, dec_rr::<0>),
    inc!(C),
    dec!(C),
    ld_n8!(C),
    op!("RRCA", 0, 4, rrca),
    // 0x10
    op!("STOP {n8}", 1, 4, stop),
    op!("LD DE, {n16}", 2, 12, ld_rr_n16::<1>),
    op!("LD (DE), A", 0, 8, st_a_ind::<1>),
    op!("INC DE", 0, 8, inc_rr::<1>),
    inc!(D),
    dec!(D),
    ld_n8!(D),
    op!("RLA", 0, 4, rla),
    op!("JR {e8}", 1, 12, jr),
    op!("ADD HL, DE", 0, 8, add_hl_rr::<1>),
    op!("LD A, (DE)", 0, 8, ld_a_ind::<1>),
    op!("DEC DE", 0, 8, dec_rr::<1>),
    inc!(E),
    dec!(E),
    ld_n8!(E),
    op!("RRA", 0, 4, rra),
    // 0x20
    op!("JR NZ, {e8}", 1, 8, jr_cc::<0>),
    op!("LD HL, {n16}", 2, 12, ld_rr_n16::<2>),
    op!("LD (HL+), A", 0, 8, st_a_ind::<2>),
    op!("INC HL", 0, 8, inc_rr::<2>),
    inc!(H),
    dec!(H),
    ld_n8!(H),
    op!("DAA", 0, 4, daa),
    op!("JR Z, {e8}", 1, 8, jr_cc::<1>),
    op!("ADD HL, HL", 0, 8, add_hl_rr::<2>),
    op!("LD A, (HL+)", 0, 8, ld_a_ind::<2>),
    op!("DEC HL", 0, 8, dec_rr::<2>),
    inc!(L),
    dec!(L),
    ld_n8!(L),
    op!("CPL", 0, 4, cpl),
    // 0x30
    op!("JR NC, {e8}", 1, 8, jr_cc::<2>),
    op!("LD SP, {n16}", 2, 12, ld_rr_n16::<3>),
    op!("LD (HL-), A", 0, 8, st_a_ind::<3>),
    op!("INC SP", 0, 8, inc_rr::<3>),
    inc!(HL),
    dec!(HL),
    ld_n8!(HL),
    op!("SCF", 0, 4, scf),
    op!("JR C, {e8}", 1, 8, jr_cc::<3>),
    op!("ADD HL, SP", 0, 8, add_hl_rr::<3>),
    op!("LD A, (HL-)", 0, 8, ld_a_ind::<3>),
    op!("DEC SP", 0, 8, dec_rr::<3>),
    inc!(A),
    dec!(A),
    ld_n8!(A),
    op!("CCF", 0, 4, ccf),
];

/// Opcodes 0xC0 through 0xFF.
const CONTROL_BLOCK: OpArray<0x40> = [
    op!("RET NZ", 0, 8, ret_cc::<0>),
    op!("POP BC", 0, 12, pop::<0>),
    op!("JP NZ, {n16}", 2, 12, jp_cc::<0>),
    op!("JP {n16}", 2, 16, jp),
    op!("CALL NZ, {n16}", 2, 12, call_cc::<0>),
    op!("PUSH BC", 0, 16, push::<0>),
    op!("ADD A, {n8}", 1, 8, alu_n8::<0>),
    op!("RST $00", 0, 16, rst::<0x00>),
    op!("RET Z", 0, 8, ret_cc::<1>),
    op!("RET", 0, 16, ret),
    op!("JP Z, {n16}", 2, 12, jp_cc::<1>),
    OpEntry::ExtendedPrefix,
    op!("CALL Z, {n16}", 2, 12, call_cc::<1>),
    op!("CALL {n16}", 2, 24, call),
    op!("ADC A, {n8}", 1, 8, alu_n8::<1>),
    op!("RST $08", 0, 16, rst::<0x08>),
    // 0xD0
    op!("RET NC", 0, 8, ret_cc::<2>),
    op!("POP DE", 0, 12, pop::<1>),
    op!("JP NC, {n16}", 2, 12, jp_cc::<2>),
    OpEntry::Illegal,
    op!("CALL NC, {n16}", 2, 12, call_cc::<2>),
    op!("PUSH DE", 0, 16, push::<1>),
    op!("SUB {n8}", 1, 8, alu_n8::<2>),
    op!("RST $10", 0, 16, rst::<0x10>),
    op!("RET C", 0, 8, ret_cc::<3>),
    op!("RETI", 0, 16, reti),
    op!("JP C, {n16}", 2, 12, jp_cc::<3>),
    OpEntry::Illegal,
    op!("CALL C, {n16}", 2, 12, call_cc::<3>),
    OpEntry::Illegal,
    op!("SBC A, {n8}", 1, 8, alu_n8::<3>),
    op!("RST $18", 0, 16, rst::<0x18>),
    // 0xE0
    op!("LDH ({n8}), A", 1, 12, ldh_n8_a),
    op!("POP HL", 0, 12, pop::<2>),
    op!("LDH (C), A", 0, 8, ldh_c_a),
    OpEntry::Illegal,
    OpEntry::Illegal,
    op!("PUSH HL", 0, 16, push::<2>),
    op!("AND {n8}", 1, 8, alu_n8::<4>),
    op!("RST $20", 0, 16, rst::<0x20>),
    op!("ADD SP, {e8}", 1, 16, add_sp_e8),
    op!("JP HL", 0, 4, jp_hl),
    op!("LD ({n16}), A", 2, 16, st_a_n16),
    OpEntry::Illegal,
    OpEntry::Illegal,
    OpEntry::Illegal,
    op!("XOR {n8}", 1, 8, alu_n8::<5>),
    op!("RST $28", 0, 16, rst::<0x28>),
    // 0xF0
    op!("LDH A, ({n8})", 1, 12, ldh_a_n8),
    op!("POP AF", 0, 12, pop::<3>),
    op!("LDH A, (C)", 0, 8, ldh_a_c),
    op!("DI", 0, 4, di),
    OpEntry::Illegal,
    op!("PUSH AF", 0, 16, push::<3>),
    op!("OR {n8}", 1, 8, alu_n8::<6>),
    op!("RST $30", 0, 16, rst::<0x30>),
    op!("LD HL, SP{e8}", 1, 12, ld_hl_sp_e8),
    op!("LD SP, HL", 0, 8, ld_sp_hl),
    op!("LD A, ({n16})", 2, 16, ld_a_n16),
    op!("EI", 0, 4, ei),
    OpEntry::Illegal,
    OpEntry::Illegal,
    op!("CP {n8}", 1, 8, alu_n8::<7>),
    op!("RST $38", 0, 16, rst::<0x38>),
];

/// Opcodes 0x40 through 0x7F.
const LOAD_BLOCK: OpArray<0x40> = block!(
    row!(ld, B),
    row!(ld, C),
    row!(ld, D),
    row!(ld, E),
    row!(ld, H),
    row!(ld, L),
    row!(ld, HL),
    row!(ld, A),
);

/// Opcodes 0x80 through 0xBF.
const ALU_BLOCK: OpArray<0x40> = block!(
    row!(alu, "ADD A, ", 0),
    row!(alu, "ADC A, ", 1),
    row!(alu, "SUB ", 2),
    row!(alu, "SBC A, ", 3),
    row!(alu, "AND ", 4),
    row!(alu, "XOR ", 5),
    row!(alu, "OR ", 6),
    row!(alu, "CP ", 7),
);

/// Every opcode, indexed by its first byte.
pub static OP_TABLE: OpArray<0x100> =
    concat_arrays!(MISC_BLOCK, LOAD_BLOCK, ALU_BLOCK, CONTROL_BLOCK);

const SHIFT_BLOCK: OpArray<0x40> = block!(
    row!(shift, "RLC", 0),
    row!(shift, "RRC", 1),
    row!(shift, "RL", 2),
    row!(shift, "RR", 3),
    row!(shift, "SLA", 4),
    row!(shift, "SRA", 5),
    row!(shift, "SWAP", 6),
    row!(shift, "SRL", 7),
);

const BIT_BLOCK: OpArray<0x40> = block!(
    row!(bit_test, 0),
    row!(bit_test, 1),
    row!(bit_test, 2),
    row!(bit_test, 3),
    row!(bit_test, 4),
    row!(bit_test, 5),
    row!(bit_test, 6),
    row!(bit_test, 7),
);

const RES_BLOCK: OpArray<0x40> = block!(
    row!(bit_reset, 0),
    row!(bit_reset, 1),
    row!(bit_reset, 2),
    row!(bit_reset, 3),
    row!(bit_reset, 4),
    row!(bit_reset, 5),
    row!(bit_reset, 6),
    row!(bit_reset, 7),
);

const SET_BLOCK: OpArray<0x40> = block!(
    row!(bit_set, 0),
    row!(bit_set, 1),
    row!(bit_set, 2),
    row!(bit_set, 3),
    row!(bit_set, 4),
    row!(bit_set, 5),
    row!(bit_set, 6),
    row!(bit_set, 7),
);

/// Every opcode that follows the 0xCB prefix.
pub static EXTENDED_OP_TABLE: OpArray<0x100> =
    concat_arrays!(SHIFT_BLOCK, BIT_BLOCK, RES_BLOCK, SET_BLOCK);
