use crate::mem::Device;

/// The 127 bytes of scratch RAM at 0xFF80-0xFFFE. 0xFFFF is the interrupt enable register and is
/// owned by the interrupt controller.
#[derive(Debug, Clone)]
pub struct HighRam {
    data: [u8; 0x7F],
}

impl HighRam {
    pub fn new() -> Self {
        Self { data: [0; 0x7F] }
    }
}

impl Default for HighRam {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for HighRam {
    fn read(&self, addr: u16) -> u8 {
        self.data[(addr - 0xFF80) as usize]
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.data[(addr - 0xFF80) as usize] = value;
    }

    fn owns(&self, addr: u16) -> bool {
        (0xFF80..=0xFFFE).contains(&addr)
    }
}
