//! Instruction decoding for FIONA custom instructions.
//!
//! FIONA rides on the RISC-V RoCC interface. A RoCC word carries a 7-bit
//! function code, three 5-bit register fields and three flags saying which
//! fields name host scalar registers:
//!
//! | Bits | Field | Meaning |
//! |------|-------|---------|
//! | 31:25 | funct7 | FIONA operation |
//! | 24:20 | rs2 | vector source / mode / function selector |
//! | 19:15 | rs1 | vector source |
//! | 14 | xd | host writes back `rd` |
//! | 13 | xs1 | `xs1` carries a host register value |
//! | 12 | xs2 | `xs2` carries a host register value |
//! | 11:7 | rd | vector destination / config selector |
//! | 6:0 | opcode | custom-0..custom-3 |
//!
//! The host resolves `xs1`/`xs2` values; this module only splits fields and
//! maps `funct7` to an [`Opcode`].
//!
//! # Example
//!
//! ```
//! use fiona_emu::interpreter::decode::{Opcode, RoccInstruction};
//!
//! // DUMP_STAT: custom-0, funct 15, all fields zero
//! let insn = RoccInstruction::decode(0x1E00_000B).unwrap();
//! assert_eq!(insn.op(), Opcode::Dump);
//! ```

mod opcode;
mod rocc;

pub use opcode::{funct, ActivationKind, ConfigSelector, Opcode, ReductionMode};
pub use rocc::{RoccInstruction, CUSTOM_OPCODES};
