//! Vector ALU execution unit.
//!
//! Lane-wise arithmetic on 32 × i16 registers. Every function takes already
//! masked operands where the instruction masks them, computes into a fresh
//! lane array and leaves committing (and tail zeroing) to the caller.
//!
//! # Operations
//!
//! - **Arithmetic**: add.v, sub.v, add/sub/mul/div.vs
//! - **Permute**: vshfl
//! - **Reduce**: vmax, vmin
//! - **Activation**: per-lane ReLU

use serde::{Deserialize, Serialize};

use super::activation::ActivationUnit;
use crate::interpreter::decode::ReductionMode;
use crate::interpreter::state::{lane_enabled, Lanes, NUM_LANES};
use crate::interpreter::traits::ExecuteError;

/// Vector-scalar arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// What SHUFFLE does with an index lane outside 0..32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShufflePolicy {
    /// Raise an illegal instruction.
    #[default]
    Fault,
    /// Use the low five bits of the index.
    Wrap,
}

/// Vector ALU execution unit.
pub struct VectorAlu;

impl VectorAlu {
    /// `a[i] + b[i]` over the first `len` lanes, wrapping.
    pub fn add(a: &Lanes, b: &Lanes, len: usize) -> Lanes {
        Self::lanewise(len, |i| a[i].wrapping_add(b[i]))
    }

    /// `a[i] - b[i]` over the first `len` lanes, wrapping.
    pub fn sub(a: &Lanes, b: &Lanes, len: usize) -> Lanes {
        Self::lanewise(len, |i| a[i].wrapping_sub(b[i]))
    }

    /// Vector-scalar arithmetic.
    ///
    /// Lanes disabled in `mask` produce 0. The lane is sign-extended, the
    /// scalar is taken as a signed 64-bit value and the result truncated
    /// back to 16 bits.
    pub fn scalar(
        op: ScalarOp,
        src: &Lanes,
        mask: u32,
        scalar: i64,
        len: usize,
    ) -> Result<Lanes, ExecuteError> {
        let mut out = [0i16; NUM_LANES];
        for (i, slot) in out.iter_mut().enumerate().take(len.min(NUM_LANES)) {
            if !lane_enabled(mask, i) {
                continue;
            }
            let lane = i64::from(src[i]);
            let value = match op {
                ScalarOp::Add => lane.wrapping_add(scalar),
                ScalarOp::Sub => lane.wrapping_sub(scalar),
                ScalarOp::Mul => lane.wrapping_mul(scalar),
                ScalarOp::Div => lane.checked_div(scalar).ok_or(ExecuteError::DivideByZero)?,
            };
            *slot = value as i16;
        }
        Ok(out)
    }

    /// Gather: `out[i] = src[indices[i]]`.
    pub fn shuffle(
        src: &Lanes,
        indices: &Lanes,
        len: usize,
        policy: ShufflePolicy,
    ) -> Result<Lanes, ExecuteError> {
        let mut out = [0i16; NUM_LANES];
        for (i, slot) in out.iter_mut().enumerate().take(len.min(NUM_LANES)) {
            let index = indices[i];
            let lane = match policy {
                ShufflePolicy::Fault => {
                    if !(0..NUM_LANES as i16).contains(&index) {
                        return Err(ExecuteError::ShuffleIndexOutOfRange { lane: i, index });
                    }
                    index as usize
                }
                ShufflePolicy::Wrap => (index as usize) & (NUM_LANES - 1),
            };
            *slot = src[lane];
        }
        Ok(out)
    }

    /// Max or min over the enabled lanes of `src`.
    ///
    /// The accumulator starts at `seed` (the unmasked lane 0 of the source
    /// register), so a disabled lane 0 still seeds the reduction.
    pub fn reduce(mode: ReductionMode, src: &Lanes, mask: u32, seed: i16, len: usize) -> i16 {
        src.iter()
            .take(len.min(NUM_LANES))
            .enumerate()
            .filter(|(i, _)| lane_enabled(mask, *i))
            .fold(seed, |acc, (_, v)| match mode {
                ReductionMode::Max => acc.max(*v),
                ReductionMode::Min => acc.min(*v),
            })
    }

    /// Per-lane activation on the raw source register.
    pub fn activation(function: u8, src: &Lanes, len: usize) -> Result<Lanes, ExecuteError> {
        let mut out = [0i16; NUM_LANES];
        for (slot, lane) in out.iter_mut().zip(src.iter()).take(len.min(NUM_LANES)) {
            *slot = ActivationUnit::lane(function, *lane)?;
        }
        Ok(out)
    }

    fn lanewise(len: usize, f: impl Fn(usize) -> i16) -> Lanes {
        let mut out = [0i16; NUM_LANES];
        for (i, slot) in out.iter_mut().enumerate().take(len.min(NUM_LANES)) {
            *slot = f(i);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::state::MASK_ALL;

    fn lanes(values: &[i16]) -> Lanes {
        let mut out = [0i16; NUM_LANES];
        out[..values.len()].copy_from_slice(values);
        out
    }

    #[test]
    fn test_add_sub() {
        let a = lanes(&[1, 2, 3, 4]);
        let b = lanes(&[10, 20, 30, 40]);

        assert_eq!(&VectorAlu::add(&a, &b, 4)[..4], &[11, 22, 33, 44]);
        assert_eq!(&VectorAlu::sub(&a, &b, 4)[..4], &[-9, -18, -27, -36]);
    }

    #[test]
    fn test_add_wraps() {
        let a = lanes(&[i16::MAX]);
        let b = lanes(&[1]);
        assert_eq!(VectorAlu::add(&a, &b, 1)[0], i16::MIN);
    }

    #[test]
    fn test_length_limits_lanes() {
        let a = [5i16; NUM_LANES];
        let out = VectorAlu::add(&a, &a, 3);
        assert_eq!(&out[..3], &[10, 10, 10]);
        assert!(out[3..].iter().all(|v| *v == 0));
    }

    #[test]
    fn test_scalar_ops() {
        let src = lanes(&[6, -6, 9, 100]);

        let out = VectorAlu::scalar(ScalarOp::Add, &src, MASK_ALL, 2, 4).unwrap();
        assert_eq!(&out[..4], &[8, -4, 11, 102]);

        let out = VectorAlu::scalar(ScalarOp::Sub, &src, MASK_ALL, 2, 4).unwrap();
        assert_eq!(&out[..4], &[4, -8, 7, 98]);

        let out = VectorAlu::scalar(ScalarOp::Mul, &src, MASK_ALL, -3, 4).unwrap();
        assert_eq!(&out[..4], &[-18, 18, -27, -300]);

        let out = VectorAlu::scalar(ScalarOp::Div, &src, MASK_ALL, 4, 4).unwrap();
        assert_eq!(&out[..4], &[1, -1, 2, 25]);
    }

    #[test]
    fn test_scalar_negative_scalar_operand() {
        // Host passes a 64-bit register; -1 arrives as all ones.
        let src = lanes(&[10]);
        let out = VectorAlu::scalar(ScalarOp::Add, &src, MASK_ALL, u64::MAX as i64, 1).unwrap();
        assert_eq!(out[0], 9);
    }

    #[test]
    fn test_scalar_respects_mask() {
        let src = lanes(&[1, 1, 1, 1]);
        let out = VectorAlu::scalar(ScalarOp::Add, &src, 0b0101, 5, 4).unwrap();
        assert_eq!(&out[..4], &[6, 0, 6, 0]);
    }

    #[test]
    fn test_divide_by_zero() {
        let src = lanes(&[1, 2]);
        assert_eq!(
            VectorAlu::scalar(ScalarOp::Div, &src, MASK_ALL, 0, 2),
            Err(ExecuteError::DivideByZero)
        );
        // No active lane, no division
        assert!(VectorAlu::scalar(ScalarOp::Div, &src, 0, 0, 2).is_ok());
    }

    #[test]
    fn test_shuffle() {
        let mut src = [0i16; NUM_LANES];
        for (i, v) in src.iter_mut().enumerate() {
            *v = 100 + i as i16;
        }
        let idx = lanes(&[3, 0, 31, 3]);

        let out = VectorAlu::shuffle(&src, &idx, 4, ShufflePolicy::Fault).unwrap();
        assert_eq!(&out[..4], &[103, 100, 131, 103]);
    }

    #[test]
    fn test_shuffle_out_of_range() {
        let src = [1i16; NUM_LANES];
        let idx = lanes(&[0, 32]);

        assert_eq!(
            VectorAlu::shuffle(&src, &idx, 2, ShufflePolicy::Fault),
            Err(ExecuteError::ShuffleIndexOutOfRange { lane: 1, index: 32 })
        );

        let idx = lanes(&[-1]);
        assert!(VectorAlu::shuffle(&src, &idx, 1, ShufflePolicy::Fault).is_err());
    }

    #[test]
    fn test_shuffle_wrap() {
        let mut src = [0i16; NUM_LANES];
        src[1] = 11;
        src[31] = 77;
        let idx = lanes(&[33, -1]);

        let out = VectorAlu::shuffle(&src, &idx, 2, ShufflePolicy::Wrap).unwrap();
        assert_eq!(&out[..2], &[11, 77]);
    }

    #[test]
    fn test_reduce() {
        let src = lanes(&[-3, 7, 2, -9]);
        assert_eq!(VectorAlu::reduce(ReductionMode::Max, &src, MASK_ALL, -3, 4), 7);
        assert_eq!(VectorAlu::reduce(ReductionMode::Min, &src, MASK_ALL, -3, 4), -9);
    }

    #[test]
    fn test_reduce_skips_masked_lanes() {
        let src = lanes(&[-3, 7, 2, -9]);
        // Lanes 1 and 3 disabled
        assert_eq!(VectorAlu::reduce(ReductionMode::Max, &src, 0b0101, -3, 4), 2);
        assert_eq!(VectorAlu::reduce(ReductionMode::Min, &src, 0b0101, -3, 4), -3);
    }

    #[test]
    fn test_reduce_seed_is_unmasked() {
        // Lane 0 disabled but still seeds the accumulator
        let src = lanes(&[0, 1, 2, 3]);
        assert_eq!(VectorAlu::reduce(ReductionMode::Max, &src, 0b1110, 50, 4), 50);
    }

    #[test]
    fn test_activation_relu() {
        let src = lanes(&[-5, 0, 5, i16::MIN]);
        let out = VectorAlu::activation(0, &src, 4).unwrap();
        assert_eq!(&out[..4], &[0, 0, 5, 0]);
    }

    #[test]
    fn test_activation_table_functions_rejected() {
        let src = lanes(&[1]);
        assert_eq!(
            VectorAlu::activation(2, &src, 1),
            Err(ExecuteError::UnsupportedActivation { function: 2 })
        );
    }

    #[test]
    fn test_shuffle_policy_serde() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: ShufflePolicy,
        }
        let w: Wrapper = toml::from_str("policy = \"wrap\"").unwrap();
        assert_eq!(w.policy, ShufflePolicy::Wrap);
        assert_eq!(ShufflePolicy::default(), ShufflePolicy::Fault);
    }
}
