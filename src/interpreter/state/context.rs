//! Execution context for a FIONA coprocessor instance.
//!
//! The `ExecutionContext` owns every piece of architectural state the
//! engine mutates: vector registers, lane masks, the matrix register and the
//! vector-length / stride configuration. One context per coprocessor; two
//! coprocessors never share one.

use super::registers::{MaskRegisterFile, MatrixRegister, VectorRegisterFile, NUM_LANES};
use crate::interpreter::traits::ExecuteError;

/// Default element stride for vector load/store.
pub const DEFAULT_STRIDE: u64 = 1;

/// Size in bytes of one lane in memory.
pub const LANE_BYTES: u64 = 2;

/// Complete coprocessor state.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    /// Vector register file (v0-v31).
    pub vector: VectorRegisterFile,

    /// Lane masks, one per vector register.
    pub masks: MaskRegisterFile,

    /// Matrix operand for MVM.
    pub matrix: MatrixRegister,

    /// Number of active lanes.
    vector_length: usize,

    /// Element stride for sequential memory access.
    stride: u64,
}

impl ExecutionContext {
    /// Create a context in its reset state.
    ///
    /// Registers and matrix are zero, masks are all-enabled, vector length
    /// is 32 and stride is 1.
    pub fn new() -> Self {
        Self {
            vector: VectorRegisterFile::new(),
            masks: MaskRegisterFile::new(),
            matrix: MatrixRegister::new(),
            vector_length: NUM_LANES,
            stride: DEFAULT_STRIDE,
        }
    }

    /// Number of active lanes.
    #[inline]
    pub fn vector_length(&self) -> usize {
        self.vector_length
    }

    /// Set the number of active lanes.
    ///
    /// Lengths above 32 are rejected and the previous length is kept.
    pub fn set_vector_length(&mut self, len: u64) -> Result<(), ExecuteError> {
        if len > NUM_LANES as u64 {
            return Err(ExecuteError::VectorLengthOutOfRange { requested: len });
        }
        self.vector_length = len as usize;
        Ok(())
    }

    /// Element stride used by load, store and matrix load.
    #[inline]
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Set the element stride.
    pub fn set_stride(&mut self, stride: u64) {
        self.stride = stride;
    }

    /// Byte distance between consecutive elements in memory.
    #[inline]
    pub fn element_step(&self) -> u64 {
        self.stride.wrapping_mul(LANE_BYTES)
    }

    /// Address of the `index`-th element of a strided run starting at `base`.
    #[inline]
    pub fn element_address(&self, base: u64, index: usize) -> u64 {
        base.wrapping_add(self.element_step().wrapping_mul(index as u64))
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
