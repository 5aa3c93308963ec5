//! In-process reference backend.
//!
//! Implements the `ideal_numerical` module: exact integer dot product and
//! matrix-vector product with wide accumulators, no noise and no saturation.

use super::{BackendError, KernelBuffer, KernelCall, KernelOutput, NumericBackend, Shape};

/// Module name served by [`IdealNumerical`].
pub const IDEAL_NUMERICAL: &str = "ideal_numerical";

/// Exact reference kernels.
#[derive(Debug, Default)]
pub struct IdealNumerical {
    initialized: bool,
    calls: u64,
}

impl IdealNumerical {
    /// Create an uninitialized backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `initialize` has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of kernels executed.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    fn dotp(call: &KernelCall<'_>) -> Result<KernelOutput, BackendError> {
        let n = call.lhs.shape().rows;
        expect_shape(call, "lhs", Shape::column(n), call.lhs.shape())?;
        expect_shape(call, "rhs", Shape::column(n), call.rhs.shape())?;
        expect_shape(call, "output", Shape::new(1, 1), call.output)?;

        let acc = call
            .lhs
            .data()
            .iter()
            .zip(call.rhs.data())
            .fold(0i64, |acc, (a, b)| acc + i64::from(*a) * i64::from(*b));

        Ok(KernelOutput::new(vec![acc], call.output))
    }

    fn mvm(call: &KernelCall<'_>) -> Result<KernelOutput, BackendError> {
        let n = call.lhs.shape().rows;
        expect_shape(call, "lhs", Shape::column(n), call.lhs.shape())?;
        expect_shape(call, "rhs", Shape::new(n, n), call.rhs.shape())?;
        expect_shape(call, "output", Shape::column(n), call.output)?;

        let out = (0..n)
            .map(|row| matrix_row_dot(call.rhs, row, call.lhs))
            .collect();

        Ok(KernelOutput::new(out, call.output))
    }
}

/// `sum_j mat[row][j] * vec[j]`.
fn matrix_row_dot(mat: &KernelBuffer, row: usize, vec: &KernelBuffer) -> i64 {
    (0..vec.shape().rows)
        .map(|j| i64::from(mat.get(row, j)) * i64::from(vec.get(j, 0)))
        .sum()
}

fn expect_shape(
    call: &KernelCall<'_>,
    operand: &'static str,
    expected: Shape,
    found: Shape,
) -> Result<(), BackendError> {
    if expected == found {
        Ok(())
    } else {
        Err(BackendError::ShapeMismatch {
            function: call.function.to_string(),
            operand,
            expected,
            found,
        })
    }
}

impl NumericBackend for IdealNumerical {
    fn name(&self) -> &str {
        IDEAL_NUMERICAL
    }

    fn initialize(&mut self) -> Result<(), BackendError> {
        if self.initialized {
            log::debug!("Backend {} already initialized", IDEAL_NUMERICAL);
            return Ok(());
        }
        self.initialized = true;
        log::info!("Backend {} initialized", IDEAL_NUMERICAL);
        Ok(())
    }

    fn invoke(&mut self, call: &KernelCall<'_>) -> Result<KernelOutput, BackendError> {
        if !self.initialized {
            return Err(BackendError::Uninitialized);
        }
        if call.module != IDEAL_NUMERICAL {
            return Err(BackendError::UnknownModule(call.module.to_string()));
        }

        log::trace!(
            "{}.{}(lhs={}, rhs={}) -> {}",
            call.module,
            call.function,
            call.lhs.shape(),
            call.rhs.shape(),
            call.output
        );

        let out = match call.function {
            "dotp" => Self::dotp(call)?,
            "mvm" => Self::mvm(call)?,
            other => {
                return Err(BackendError::UnknownFunction {
                    module: call.module.to_string(),
                    function: other.to_string(),
                })
            }
        };
        self.calls += 1;
        Ok(out)
    }
}
