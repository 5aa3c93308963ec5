//! Backend kernel marshalling for DOTP and MVM.
//!
//! Operands are copied into zero-padded 32-element (or 32×32) buffers, the
//! named kernel is invoked and the wide results are narrowed to lane width
//! by truncation.

use crate::backend::{KernelBuffer, KernelCall, NumericBackend, Shape};
use crate::interpreter::state::{Lanes, MatrixRegister, MATRIX_DIM, NUM_LANES};
use crate::interpreter::traits::ExecuteError;

/// Kernel name for the dot product.
pub const DOTP_KERNEL: &str = "dotp";

/// Kernel name for the matrix-vector product.
pub const MVM_KERNEL: &str = "mvm";

/// Marshals kernel operands to a [`NumericBackend`].
pub struct KernelUnit;

impl KernelUnit {
    /// Dot product of the first `len` lanes of two masked operands.
    pub fn dotp<B: NumericBackend + ?Sized>(
        backend: &mut B,
        module: &str,
        lhs: &Lanes,
        rhs: &Lanes,
        len: usize,
    ) -> Result<i16, ExecuteError> {
        let len = len.min(NUM_LANES);
        let a = KernelBuffer::vector(&lhs[..len], NUM_LANES);
        let b = KernelBuffer::vector(&rhs[..len], NUM_LANES);

        let call = KernelCall::new(module, DOTP_KERNEL, Shape::new(1, 1), &a, &b);
        let out = backend.invoke(&call)?;

        let acc = out.get(0);
        log::trace!("dotp over {} lanes = {}", len, acc);
        Ok(acc as i16)
    }

    /// `out[i] = Σ_j matrix[i][j] * vec[j]` over the leading `len × len` block.
    ///
    /// Lanes at or past `len` are zero in the result.
    pub fn mvm<B: NumericBackend + ?Sized>(
        backend: &mut B,
        module: &str,
        vec: &Lanes,
        matrix: &MatrixRegister,
        len: usize,
    ) -> Result<Lanes, ExecuteError> {
        let len = len.min(MATRIX_DIM);
        let v = KernelBuffer::vector(&vec[..len], NUM_LANES);

        let mut m = KernelBuffer::zeroed(Shape::new(MATRIX_DIM, MATRIX_DIM));
        for row in 0..len {
            for col in 0..len {
                m.set(row, col, matrix.read(row, col));
            }
        }
        m.set_active(Shape::new(len, len));

        let call = KernelCall::new(module, MVM_KERNEL, Shape::column(MATRIX_DIM), &v, &m);
        let out = backend.invoke(&call)?;

        let mut result = [0i16; NUM_LANES];
        for (i, slot) in result.iter_mut().enumerate().take(len) {
            *slot = out.get(i) as i16;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, IdealNumerical, IDEAL_NUMERICAL};

    fn backend() -> IdealNumerical {
        let mut b = IdealNumerical::new();
        b.initialize().unwrap();
        b
    }

    fn lanes(values: &[i16]) -> Lanes {
        let mut out = [0i16; NUM_LANES];
        out[..values.len()].copy_from_slice(values);
        out
    }

    #[test]
    fn test_dotp() {
        let mut b = backend();
        let a = lanes(&[1, 2, 3, 4]);
        let c = lanes(&[5, 6, 7, 8]);

        let r = KernelUnit::dotp(&mut b, IDEAL_NUMERICAL, &a, &c, 4).unwrap();
        assert_eq!(r, 70);
        assert_eq!(b.calls(), 1);
    }

    #[test]
    fn test_dotp_ignores_lanes_past_length() {
        let mut b = backend();
        let a = [3i16; NUM_LANES];
        let r = KernelUnit::dotp(&mut b, IDEAL_NUMERICAL, &a, &a, 2).unwrap();
        assert_eq!(r, 18);
    }

    #[test]
    fn test_dotp_truncates() {
        let mut b = backend();
        // 2 * 200 * 100 = 40000, wraps to -25536
        let a = lanes(&[200, 200]);
        let c = lanes(&[100, 100]);
        let r = KernelUnit::dotp(&mut b, IDEAL_NUMERICAL, &a, &c, 2).unwrap();
        assert_eq!(r, 40000u16 as i16);
    }

    #[test]
    fn test_mvm() {
        let mut b = backend();
        let mut m = MatrixRegister::new();
        // [[1, 2], [3, 4]]
        m.write(0, 0, 1);
        m.write(0, 1, 2);
        m.write(1, 0, 3);
        m.write(1, 1, 4);
        // Outside the 2x2 block
        m.write(0, 2, 100);

        let v = lanes(&[10, 1, 50]);
        let out = KernelUnit::mvm(&mut b, IDEAL_NUMERICAL, &v, &m, 2).unwrap();
        assert_eq!(&out[..3], &[12, 34, 0]);
    }

    #[test]
    fn test_unknown_module() {
        let mut b = backend();
        let a = lanes(&[1]);
        let err = KernelUnit::dotp(&mut b, "analog", &a, &a, 1).unwrap_err();
        assert_eq!(
            err,
            ExecuteError::Backend(BackendError::UnknownModule("analog".into()))
        );
    }
}
