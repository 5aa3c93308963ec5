//! Core traits and error types for the interpreter.
//!
//! The engine touches the outside world through two seams:
//!
//! - `Memory`: the host's load/store path, passed in per instruction
//! - `NumericBackend` (see [`crate::backend`]): the DOTP/MVM kernels, owned
//!   by the engine
//!
//! Both are traits so tests can drive the engine against `HostMemory` and
//! the in-process `IdealNumerical` backend, and a host simulator can plug in
//! its own MMU.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors reported by a memory collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Nothing is mapped at this address.
    #[error("address 0x{address:016X} not mapped")]
    Unmapped {
        /// Faulting address.
        address: u64,
    },

    /// The host refused the access (permissions, alignment, device error).
    #[error("access fault at 0x{address:016X}")]
    AccessFault {
        /// Faulting address.
        address: u64,
    },
}

/// Errors that can occur while decoding a raw RoCC word.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Major opcode is not one of custom-0..custom-3.
    #[error("not a custom instruction: major opcode 0x{opcode:02X} in word 0x{word:08X}")]
    NotCustom {
        /// Major opcode bits [6:0].
        opcode: u8,
        /// The full instruction word.
        word: u32,
    },
}

/// Instruction-level faults raised by the execution engine.
///
/// Everything except `Memory` and `Backend` is an illegal-instruction
/// condition from the host's point of view.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecuteError {
    /// CONFIG tried to set a vector length above 32.
    #[error("vector length {requested} exceeds 32 lanes")]
    VectorLengthOutOfRange {
        /// Requested length.
        requested: u64,
    },

    /// CONFIG selector (the `rd` field) is not recognized.
    #[error("unknown config selector {selector}")]
    UnknownConfigSelector {
        /// Selector value.
        selector: u8,
    },

    /// CONFIG mask write named a register outside v0-v31.
    #[error("mask target v{register} does not exist")]
    MaskTargetOutOfRange {
        /// Requested register number.
        register: u64,
    },

    /// MINMAX mode (the `rs2` field) is neither max (0) nor min (1).
    #[error("unknown reduction mode {mode}")]
    UnknownReductionMode {
        /// Mode value.
        mode: u8,
    },

    /// Per-lane ACTIVATION requested a function other than ReLU.
    #[error("activation function {function} not supported per lane")]
    UnsupportedActivation {
        /// Function code (the `rs2` field).
        function: u8,
    },

    /// SHUFFLE index lane points outside the source register.
    #[error("shuffle index {index} in lane {lane} out of range")]
    ShuffleIndexOutOfRange {
        /// Lane holding the bad index.
        lane: usize,
        /// The index value.
        index: i16,
    },

    /// DIV.VS with a zero scalar divisor on an active lane.
    #[error("vector-scalar division by zero")]
    DivideByZero,

    /// Unrecognized function code (strict mode only).
    #[error("unknown opcode funct={funct}")]
    UnknownOpcode {
        /// The function code.
        funct: u8,
    },

    /// Raw instruction word is not a RoCC instruction.
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    /// Memory collaborator failed.
    #[error("memory: {0}")]
    Memory(#[from] MemoryError),

    /// Numeric backend failed.
    #[error("backend: {0}")]
    Backend(#[from] BackendError),
}

impl ExecuteError {
    /// Whether the host should raise an illegal-instruction trap.
    pub fn is_illegal_instruction(&self) -> bool {
        !matches!(self, Self::Memory(_) | Self::Backend(_))
    }
}

/// Host memory as seen by the coprocessor.
///
/// All vector memory traffic is 16-bit signed at host virtual addresses.
/// Alignment and translation are the implementor's business.
pub trait Memory {
    /// Load one element.
    fn load_i16(&mut self, address: u64) -> Result<i16, MemoryError>;

    /// Store one element.
    fn store_i16(&mut self, address: u64, value: i16) -> Result<(), MemoryError>;
}

impl<M: Memory + ?Sized> Memory for &mut M {
    fn load_i16(&mut self, address: u64) -> Result<i16, MemoryError> {
        (**self).load_i16(address)
    }

    fn store_i16(&mut self, address: u64, value: i16) -> Result<(), MemoryError> {
        (**self).store_i16(address, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_instruction_classification() {
        assert!(ExecuteError::VectorLengthOutOfRange { requested: 33 }.is_illegal_instruction());
        assert!(ExecuteError::UnknownReductionMode { mode: 2 }.is_illegal_instruction());
        assert!(ExecuteError::UnsupportedActivation { function: 1 }.is_illegal_instruction());
        assert!(ExecuteError::DivideByZero.is_illegal_instruction());

        let mem = ExecuteError::from(MemoryError::Unmapped { address: 0x10 });
        assert!(!mem.is_illegal_instruction());

        let backend = ExecuteError::from(BackendError::Uninitialized);
        assert!(!backend.is_illegal_instruction());

        let decode = ExecuteError::from(DecodeError::NotCustom { opcode: 0x33, word: 0x33 });
        assert!(decode.is_illegal_instruction());
    }

    #[test]
    fn test_error_display() {
        let e = ExecuteError::VectorLengthOutOfRange { requested: 33 };
        assert!(e.to_string().contains("33"));

        let e = ExecuteError::from(MemoryError::AccessFault { address: 0xDEAD });
        assert!(e.to_string().contains("000000000000DEAD"));

        let e = DecodeError::NotCustom { opcode: 0x33, word: 0x0020_81B3 };
        assert!(e.to_string().contains("0x33"));
    }
}
