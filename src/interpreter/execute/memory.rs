//! Memory unit execution.
//!
//! Moves 16-bit lanes between host memory and coprocessor state.
//!
//! # Addressing
//!
//! Every access is strided: element `k` of a run starting at `base` lives at
//! `base + k * stride * 2`. The stride comes from the execution context and
//! defaults to 1 (packed i16 array).
//!
//! | Operation | Elements | Destination |
//! |-----------|----------|-------------|
//! | vld | `vlen` | vector register, tail zeroed |
//! | vst | `vlen` | memory |
//! | cfg matrix | `vlen × vlen`, row-major | matrix register |
//!
//! Loads and stores ignore lane masks.

use crate::interpreter::state::{ExecutionContext, Lanes, NUM_LANES};
use crate::interpreter::traits::{ExecuteError, Memory};

/// Memory unit for load/store operations.
pub struct MemoryUnit;

impl MemoryUnit {
    /// Read `vlen` strided lanes starting at `base`.
    ///
    /// Lanes past the vector length are zero. Nothing is returned on a
    /// fault, so a failed load leaves the destination untouched.
    pub fn load_vector<M: Memory + ?Sized>(
        ctx: &ExecutionContext,
        mem: &mut M,
        base: u64,
    ) -> Result<Lanes, ExecuteError> {
        let mut out = [0i16; NUM_LANES];
        for (i, slot) in out.iter_mut().enumerate().take(ctx.vector_length()) {
            let addr = ctx.element_address(base, i);
            *slot = mem.load_i16(addr)?;
            log::trace!("vld lane {} <- [{:#x}] = {}", i, addr, *slot);
        }
        Ok(out)
    }

    /// Write the first `vlen` lanes of `value` to strided addresses.
    ///
    /// Stores are issued in lane order; a fault stops at the failing lane.
    pub fn store_vector<M: Memory + ?Sized>(
        ctx: &ExecutionContext,
        mem: &mut M,
        base: u64,
        value: &Lanes,
    ) -> Result<(), ExecuteError> {
        for (i, lane) in value.iter().enumerate().take(ctx.vector_length()) {
            let addr = ctx.element_address(base, i);
            log::trace!("vst lane {} -> [{:#x}] = {}", i, addr, lane);
            mem.store_i16(addr, *lane)?;
        }
        Ok(())
    }

    /// Load a `vlen × vlen` row-major matrix into the matrix register.
    ///
    /// Element `(i, j)` is the `i * vlen + j`-th strided element from `base`.
    /// The register is only replaced once every element has been read.
    pub fn load_matrix<M: Memory + ?Sized>(
        ctx: &mut ExecutionContext,
        mem: &mut M,
        base: u64,
    ) -> Result<(), ExecuteError> {
        let vlen = ctx.vector_length();
        let mut matrix = ctx.matrix.clone();

        for row in 0..vlen {
            for col in 0..vlen {
                let addr = ctx.element_address(base, row * vlen + col);
                matrix.write(row, col, mem.load_i16(addr)?);
            }
        }

        log::debug!("matrix loaded: {}x{} from {:#x}", vlen, vlen, base);
        ctx.matrix = matrix;
        Ok(())
    }
}
