//! Execution units for FIONA operations.
//!
//! Each unit handles one category of instructions and is stateless; the
//! coprocessor hands it the operands and commits what it returns.
//!
//! | Unit | Operations |
//! |------|------------|
//! | [`VectorAlu`] | add.v, sub.v, add/sub/mul/div.vs, vshfl, vmax/vmin, per-lane activation |
//! | [`ActivationUnit`] | ReLU, fixed-point tanh and sigmoid |
//! | [`MemoryUnit`] | vld, vst, matrix load |
//! | [`KernelUnit`] | dotp, mvm via the numeric backend |
//!
//! # Example
//!
//! ```
//! use fiona_emu::interpreter::execute::{ScalarOp, VectorAlu};
//! use fiona_emu::interpreter::state::MASK_ALL;
//!
//! let src = [4i16; 32];
//! let out = VectorAlu::scalar(ScalarOp::Mul, &src, MASK_ALL, 3, 2).unwrap();
//! assert_eq!(&out[..3], &[12, 12, 0]);
//! ```

mod activation;
mod kernel;
mod memory;
mod vector;

pub use activation::{ActivationUnit, SIGMOID_TABLE};
pub use kernel::{KernelUnit, DOTP_KERNEL, MVM_KERNEL};
pub use memory::MemoryUnit;
pub use vector::{ScalarOp, ShufflePolicy, VectorAlu};
