//! The coprocessor execution engine.
//!
//! A [`Coprocessor`] owns one [`ExecutionContext`](crate::interpreter::state::ExecutionContext),
//! a numeric backend and an [`InstructionCounter`]. The host hands it one
//! RoCC instruction at a time, together with its two source register values
//! and a [`Memory`](crate::interpreter::traits::Memory) to load and store
//! through.
//!
//! # Execution Model
//!
//! Each dispatch:
//!
//! 1. Counts the opcode under its display name
//! 2. Masks `rs1`/`rs2` with their lane masks
//! 3. Runs the opcode over the first `vector_length` lanes into scratch
//! 4. Commits the result to `rd`, zeroing the tail
//!
//! A faulting instruction commits nothing.
//!
//! # Example
//!
//! ```
//! use fiona_emu::device::HostMemory;
//! use fiona_emu::interpreter::core::Coprocessor;
//! use fiona_emu::interpreter::decode::{Opcode, RoccInstruction};
//!
//! let mut cop = Coprocessor::reference().unwrap();
//! let mut mem = HostMemory::new();
//! mem.write_slice(0x1000, &[1, 2, 3, 4]);
//!
//! // vlen = 4, v1 <- [0x1000], v2 = v1 + v1
//! cop.dispatch(&RoccInstruction::new(Opcode::Config, 0, 0, 0), 4, 0, &mut mem).unwrap();
//! cop.dispatch(&RoccInstruction::new(Opcode::Load, 1, 0, 0), 0x1000, 0, &mut mem).unwrap();
//! cop.dispatch(&RoccInstruction::new(Opcode::AddV, 2, 1, 1), 0, 0, &mut mem).unwrap();
//!
//! assert_eq!(&cop.context().vector.read(2)[..5], &[2, 4, 6, 8, 0]);
//! ```

mod coprocessor;
pub mod counter;

pub use coprocessor::{Coprocessor, EngineOptions};
pub use counter::InstructionCounter;
