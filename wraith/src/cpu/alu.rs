//! The arithmetic logic unit. Every function here takes the operands and the flags register and
//! recomputes exactly the flags the matching instruction family affects.

use crate::cpu::{check_bit_const, Flags};

/// ADD and ADC.
pub fn add_bytes(a: u8, b: u8, carry_in: bool, flags: &mut Flags) -> u8 {
    let carry_in = carry_in as u8;
    let (partial, first) = a.overflowing_add(b);
    let (digest, second) = partial.overflowing_add(carry_in);
    flags.z = digest == 0;
    flags.n = false;
    flags.h = (a & 0x0F) + (b & 0x0F) + carry_in > 0x0F;
    flags.c = first || second;
    digest
}

/// SUB, SBC and CP. The caller discards the result for CP.
pub fn sub_bytes(a: u8, b: u8, carry_in: bool, flags: &mut Flags) -> u8 {
    let carry_in = carry_in as u8;
    let digest = a.wrapping_sub(b).wrapping_sub(carry_in);
    flags.z = digest == 0;
    flags.n = true;
    flags.h = (a & 0x0F) < (b & 0x0F) + carry_in;
    flags.c = (a as u16) < b as u16 + carry_in as u16;
    digest
}

pub fn and_bytes(a: u8, b: u8, flags: &mut Flags) -> u8 {
    let digest = a & b;
    *flags = Flags {
        z: digest == 0,
        n: false,
        h: true,
        c: false,
    };
    digest
}

pub fn or_bytes(a: u8, b: u8, flags: &mut Flags) -> u8 {
    let digest = a | b;
    flags.set_for_logic(digest);
    digest
}

pub fn xor_bytes(a: u8, b: u8, flags: &mut Flags) -> u8 {
    let digest = a ^ b;
    flags.set_for_logic(digest);
    digest
}

/// INC on an 8-bit target. The carry flag is left alone.
pub fn inc_byte(val: u8, flags: &mut Flags) -> u8 {
    let digest = val.wrapping_add(1);
    flags.z = digest == 0;
    flags.n = false;
    flags.h = val & 0x0F == 0x0F;
    digest
}

/// DEC on an 8-bit target. The carry flag is left alone.
pub fn dec_byte(val: u8, flags: &mut Flags) -> u8 {
    let digest = val.wrapping_sub(1);
    flags.z = digest == 0;
    flags.n = true;
    flags.h = val & 0x0F == 0;
    digest
}

/// ADD HL, rr. Half-carry comes out of bit 11, carry out of bit 15. Zero is untouched.
pub fn add_words(a: u16, b: u16, flags: &mut Flags) -> u16 {
    let (digest, carry) = a.overflowing_add(b);
    flags.n = false;
    flags.h = (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF;
    flags.c = carry;
    digest
}

/// ADD SP, e8 and LD HL, SP+e8. The flags come from an unsigned add of the offset's byte onto the
/// low byte of SP.
pub fn offset_sp(sp: u16, offset: i8, flags: &mut Flags) -> u16 {
    let unsigned = offset as u8 as u16;
    *flags = Flags {
        z: false,
        n: false,
        h: (sp & 0x0F) + (unsigned & 0x0F) > 0x0F,
        c: (sp & 0xFF) + unsigned > 0xFF,
    };
    sp.wrapping_add_signed(offset as i16)
}

/// DAA. Uses N to decide whether the last operation was an addition or a subtraction and corrects
/// A back into packed BCD.
pub fn decimal_adjust(a: u8, flags: &mut Flags) -> u8 {
    let mut correction = 0u8;
    let mut carry = false;
    if flags.h || (!flags.n && (a & 0x0F) > 0x09) {
        correction |= 0x06;
    }
    if flags.c || (!flags.n && a > 0x99) {
        correction |= 0x60;
        carry = true;
    }
    let digest = if flags.n {
        a.wrapping_sub(correction)
    } else {
        a.wrapping_add(correction)
    };
    flags.z = digest == 0;
    flags.h = false;
    flags.c = carry;
    digest
}

/// The eight rotate/shift/swap operations of the extended table, in opcode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[repr(u8)]
pub enum ShiftOp {
    #[display("RLC")]
    RotateLeftCircular = 0,
    #[display("RRC")]
    RotateRightCircular = 1,
    #[display("RL")]
    RotateLeft = 2,
    #[display("RR")]
    RotateRight = 3,
    #[display("SLA")]
    ShiftLeftArithmetic = 4,
    #[display("SRA")]
    ShiftRightArithmetic = 5,
    #[display("SWAP")]
    Swap = 6,
    #[display("SRL")]
    ShiftRightLogical = 7,
}

impl ShiftOp {
    pub const fn from_index(index: u8) -> Self {
        match index & 0b111 {
            0 => Self::RotateLeftCircular,
            1 => Self::RotateRightCircular,
            2 => Self::RotateLeft,
            3 => Self::RotateRight,
            4 => Self::ShiftLeftArithmetic,
            5 => Self::ShiftRightArithmetic,
            6 => Self::Swap,
            _ => Self::ShiftRightLogical,
        }
    }

    /// Applies the operation, setting Z from the result, clearing N and H and setting C from the
    /// bit shifted out (SWAP clears C).
    pub fn apply(self, val: u8, flags: &mut Flags) -> u8 {
        let (digest, carry) = match self {
            Self::RotateLeftCircular => (val.rotate_left(1), check_bit_const::<7>(val)),
            Self::RotateRightCircular => (val.rotate_right(1), check_bit_const::<0>(val)),
            Self::RotateLeft => ((val << 1) | flags.c as u8, check_bit_const::<7>(val)),
            Self::RotateRight => ((val >> 1) | ((flags.c as u8) << 7), check_bit_const::<0>(val)),
            Self::ShiftLeftArithmetic => (val << 1, check_bit_const::<7>(val)),
            Self::ShiftRightArithmetic => ((val >> 1) | (val & 0x80), check_bit_const::<0>(val)),
            Self::Swap => (val.rotate_left(4), false),
            Self::ShiftRightLogical => (val >> 1, check_bit_const::<0>(val)),
        };
        flags.set_for_byte_shift_op(digest == 0, carry);
        digest
    }
}
