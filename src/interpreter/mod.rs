//! FIONA coprocessor interpreter.
//!
//! Executes the FIONA vector/matrix instruction set as a RoCC accelerator:
//! the host core forwards each custom-opcode instruction together with its
//! two source register values, and receives one 64-bit result back.
//!
//! # Architecture
//!
//! - [`decode`]: RoCC instruction words and the FIONA opcode table
//! - [`state`]: Vector registers, lane masks, matrix register, vector length and stride
//! - [`execute`]: Stateless execution units (vector ALU, activation, memory, kernels)
//! - [`core`]: The [`Coprocessor`] dispatcher and its instruction counter
//! - [`traits`]: The `Memory` seam and the error types
//!
//! # Example
//!
//! ```
//! use fiona_emu::device::HostMemory;
//! use fiona_emu::interpreter::{Coprocessor, Opcode, RoccInstruction};
//!
//! let mut cop = Coprocessor::reference().unwrap();
//! let mut mem = HostMemory::new();
//! mem.write_slice(0x100, &[-3, 7, 2, -9]);
//!
//! cop.dispatch(&RoccInstruction::new(Opcode::Config, 0, 0, 0), 4, 0, &mut mem).unwrap();
//! cop.dispatch(&RoccInstruction::new(Opcode::Load, 1, 0, 0), 0x100, 0, &mut mem).unwrap();
//!
//! // MINMAX with mode 1 (min) in the rs2 field
//! let min = cop.dispatch(&RoccInstruction::new(Opcode::MinMax, 0, 1, 1), 0, 0, &mut mem).unwrap();
//! assert_eq!(min as i64, -9);
//! ```

pub mod traits;
pub mod decode;
pub mod state;
pub mod execute;
pub mod core;

// Re-export key types for convenience
pub use traits::{DecodeError, ExecuteError, Memory, MemoryError};

// Decoder types
pub use decode::{Opcode, RoccInstruction};

// State types
pub use state::{ExecutionContext, MaskRegisterFile, MatrixRegister, VectorRegisterFile};

// Execute types
pub use execute::{ActivationUnit, KernelUnit, MemoryUnit, ShufflePolicy, VectorAlu};

// Core types
pub use self::core::{Coprocessor, EngineOptions, InstructionCounter};
