use crate::mem::Device;
use crate::Model;

/// ADDR FF70
const SVBK: u16 = 0xFF70;

const BANK_SIZE: usize = 0x1000;

/// The handheld's working RAM. 0xC000-0xCFFF is always bank 0. 0xD000-0xDFFF is bank 1 on the
/// monochrome model and any of banks 1-7 on the color model, selected via SVBK. 0xE000-0xFDFF echoes
/// 0xC000-0xDDFF.
#[derive(Debug, Clone)]
pub struct WorkRam {
    banks: Box<[[u8; BANK_SIZE]; 8]>,
    /// The bank mapped at 0xD000. Never zero.
    bank: u8,
    /// Only the color model has SVBK.
    banked: bool,
}

impl WorkRam {
    pub fn new(model: Model) -> Self {
        Self {
            banks: Box::new([[0; BANK_SIZE]; 8]),
            bank: 1,
            banked: model == Model::Cgb,
        }
    }

    pub fn bank(&self) -> u8 {
        self.bank
    }

    fn locate(&self, addr: u16) -> (usize, usize) {
        // Echo RAM sits 0x2000 above the real thing
        let addr = if addr >= 0xE000 { addr - 0x2000 } else { addr };
        match addr {
            0xC000..=0xCFFF => (0, (addr - 0xC000) as usize),
            _ => (self.bank as usize, (addr - 0xD000) as usize),
        }
    }
}

impl Device for WorkRam {
    fn read(&self, addr: u16) -> u8 {
        if addr == SVBK {
            return 0xF8 | self.bank;
        }
        let (bank, offset) = self.locate(addr);
        self.banks[bank][offset]
    }

    fn write(&mut self, addr: u16, value: u8) {
        if addr == SVBK {
            self.bank = (value & 0b111).max(1);
            return;
        }
        let (bank, offset) = self.locate(addr);
        self.banks[bank][offset] = value;
    }

    fn owns(&self, addr: u16) -> bool {
        match addr {
            0xC000..=0xFDFF => true,
            SVBK => self.banked,
            _ => false,
        }
    }
}
