//! Processor state for the FIONA coprocessor.
//!
//! | Storage | Count | Shape | Purpose |
//! |---------|-------|-------|---------|
//! | Vector | 32 | 32 × i16 | SIMD operands and results |
//! | Mask | 32 | u32 | Lane enables, keyed by register number |
//! | Matrix | 1 | 32 × 32 × i16 | MVM operand |
//! | Config | - | vector length, stride | Active lanes, memory step |
//!
//! # Example
//!
//! ```
//! use fiona_emu::interpreter::state::ExecutionContext;
//!
//! let mut ctx = ExecutionContext::new();
//! ctx.vector.write_lane(1, 0, 42);  // v1[0] = 42
//! ctx.set_vector_length(4).unwrap();
//! assert!(ctx.set_vector_length(33).is_err());
//! ```

mod registers;
mod context;

pub use registers::{
    lane_enabled, Lanes, MaskRegisterFile, MatrixRegister, VectorRegisterFile, MASK_ALL,
    MATRIX_DIM, NUM_LANES, NUM_VECTOR_REGS,
};
pub use context::{ExecutionContext, DEFAULT_STRIDE, LANE_BYTES};
