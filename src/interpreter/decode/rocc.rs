//! RoCC instruction word layout.

use super::opcode::Opcode;
use crate::interpreter::traits::DecodeError;

/// Major opcodes custom-0 through custom-3.
pub const CUSTOM_OPCODES: [u8; 4] = [0x0B, 0x2B, 0x5B, 0x7B];

/// A RoCC instruction split into fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoccInstruction {
    /// Major opcode (one of [`CUSTOM_OPCODES`]).
    pub major: u8,
    /// Destination field.
    pub rd: u8,
    /// `xs2` flag.
    pub xs2: bool,
    /// `xs1` flag.
    pub xs1: bool,
    /// `xd` flag.
    pub xd: bool,
    /// First source field.
    pub rs1: u8,
    /// Second source field.
    pub rs2: u8,
    /// Function code.
    pub funct: u8,
}

impl RoccInstruction {
    /// Build a custom-0 instruction with all flags clear.
    pub fn new(op: Opcode, rd: u8, rs1: u8, rs2: u8) -> Self {
        Self {
            major: CUSTOM_OPCODES[0],
            rd: rd & 0x1F,
            xs2: false,
            xs1: false,
            xd: false,
            rs1: rs1 & 0x1F,
            rs2: rs2 & 0x1F,
            funct: op.funct() & 0x7F,
        }
    }

    /// Set the `xd`, `xs1` and `xs2` flags.
    pub fn with_flags(mut self, xd: bool, xs1: bool, xs2: bool) -> Self {
        self.xd = xd;
        self.xs1 = xs1;
        self.xs2 = xs2;
        self
    }

    /// Split a 32-bit word.
    pub fn decode(word: u32) -> Result<Self, DecodeError> {
        let major = (word & 0x7F) as u8;
        if !CUSTOM_OPCODES.contains(&major) {
            return Err(DecodeError::NotCustom {
                opcode: major,
                word,
            });
        }

        Ok(Self {
            major,
            rd: ((word >> 7) & 0x1F) as u8,
            xs2: (word >> 12) & 1 != 0,
            xs1: (word >> 13) & 1 != 0,
            xd: (word >> 14) & 1 != 0,
            rs1: ((word >> 15) & 0x1F) as u8,
            rs2: ((word >> 20) & 0x1F) as u8,
            funct: ((word >> 25) & 0x7F) as u8,
        })
    }

    /// Pack back into a 32-bit word.
    pub fn encode(&self) -> u32 {
        u32::from(self.major & 0x7F)
            | u32::from(self.rd & 0x1F) << 7
            | u32::from(self.xs2) << 12
            | u32::from(self.xs1) << 13
            | u32::from(self.xd) << 14
            | u32::from(self.rs1 & 0x1F) << 15
            | u32::from(self.rs2 & 0x1F) << 20
            | u32::from(self.funct & 0x7F) << 25
    }

    /// The FIONA operation.
    pub fn op(&self) -> Opcode {
        Opcode::from_funct(self.funct)
    }

    /// Which custom opcode space (0-3) the instruction came from.
    pub fn custom_index(&self) -> usize {
        CUSTOM_OPCODES
            .iter()
            .position(|m| *m == self.major)
            .unwrap_or(0)
    }
}
