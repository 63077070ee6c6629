//! Instruction descriptors and the handlers that implement them.
//!
//! Decoding is table driven. Every opcode indexes one [`OpEntry`] in [`OP_TABLE`]; the 0xCB prefix
//! redirects into [`EXTENDED_OP_TABLE`] with the byte that follows it. A [`Descriptor`] carries all
//! the CPU needs to run an instruction: how many immediate bytes follow the opcode, the base cost
//! and a plain function pointer to the handler. Handlers return the extra cycles spent when a
//! conditional branch is taken, and 0 otherwise.

use std::fmt::Write;

use crate::cpu::Cpu;
use crate::mem::Bus;

pub mod arithmetic;
pub mod bit;
pub mod bit_shift;
pub mod control;
pub mod interrupt;
pub mod jump;
pub mod load;
mod table;

pub use table::EXTENDED_OP_TABLE;
pub use table::OP_TABLE;

pub type Handler = fn(&mut Cpu, &mut dyn Bus, &Operand) -> u8;

/// The immediate bytes that followed an opcode, in the order they were fetched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Operand(heapless::Vec<u8, 2>);

impl Operand {
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// The single immediate byte.
    pub fn byte(&self) -> u8 {
        self.0.first().copied().unwrap_or_default()
    }

    /// Two immediate bytes form a little-endian word.
    pub fn word(&self) -> u16 {
        let lo = self.0.first().copied().unwrap_or_default();
        let hi = self.0.get(1).copied().unwrap_or_default();
        u16::from_le_bytes([lo, hi])
    }

    /// The single immediate byte, sign extended. Used by relative jumps and SP offsets.
    pub fn offset(&self) -> i8 {
        self.byte() as i8
    }
}

impl FromIterator<u8> for Operand {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        Self(iter.into_iter().take(2).collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    /// The mnemonic. `{n8}`, `{n16}` and `{e8}` are replaced by the immediate when rendered.
    pub template: &'static str,
    pub operand_len: u8,
    /// The cost when no branch is taken.
    pub cycles: u8,
    pub handler: Handler,
}

impl Descriptor {
    /// Fills the template in with the operand.
    pub fn render(&self, operand: &Operand) -> String {
        let mut digest = String::with_capacity(self.template.len() + 4);
        let mut rest = self.template;
        while let Some(start) = rest.find('{') {
            digest.push_str(&rest[..start]);
            rest = &rest[start..];
            let Some(end) = rest.find('}') else {
                break;
            };
            // Writing into a `String` can not fail
            let _ = match &rest[..=end] {
                "{n8}" => write!(digest, "${:0>2X}", operand.byte()),
                "{n16}" => write!(digest, "${:0>4X}", operand.word()),
                "{e8}" => write!(digest, "{:+}", operand.offset()),
                other => write!(digest, "{other}"),
            };
            rest = &rest[end + 1..];
        }
        digest.push_str(rest);
        digest
    }
}

#[derive(Debug, Clone, Copy)]
pub enum OpEntry {
    Normal(Descriptor),
    /// A hole in the table. Reaching one is fatal.
    Unimplemented,
    /// An opcode the hardware never assigned. The real CPU locks up on these.
    Illegal,
    /// 0xCB. The next byte selects an entry in the extended table.
    ExtendedPrefix,
}

impl OpEntry {
    pub fn descriptor(&self) -> Option<&Descriptor> {
        match self {
            Self::Normal(desc) => Some(desc),
            _ => None,
        }
    }
}
