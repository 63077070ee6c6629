/// Conditions that stop emulation. None of these are recoverable: each one means the core was
/// asked to do something the hardware it models cannot do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum EmulationError {
    /// No device on the bus claims the address.
    #[display("No device owns address 0x{addr:0>4X} (write: {write})")]
    UnmappedAddress { addr: u16, write: bool },
    /// The opcode table has a hole where this opcode should be.
    #[display("Op code '{}0x{opcode:0>2X}' @ 0x{pc:0>4X} is not implemented", if *extended { "0xCB " } else { "" })]
    UnimplementedOpcode { pc: u16, opcode: u8, extended: bool },
    /// The opcode is not assigned on real hardware. The CPU locks up when it sees one.
    #[display("Op code '0x{opcode:0>2X}' @ 0x{pc:0>4X} does not correspond to any valid operation")]
    IllegalOpcode { pc: u16, opcode: u8 },
}

/// Problems with a cartridge image found while loading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum CartridgeError {
    #[display("Cartridge image is {len} bytes, too short to hold a header")]
    TooShort { len: usize },
}
