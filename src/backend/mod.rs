//! Numeric backend collaborator for DOTP and MVM.
//!
//! The engine never computes dot products or matrix-vector products itself.
//! It marshals operands into fixed-capacity, zero-padded [`KernelBuffer`]s,
//! names a module and function, and hands a [`KernelCall`] to a
//! [`NumericBackend`]. The backend allocates the [`KernelOutput`] and gives
//! ownership of it to the caller; nothing is borrowed back.
//!
//! # Lifecycle
//!
//! A backend must be initialized exactly once before the first call.
//! `Coprocessor::new` runs [`NumericBackend::initialize`] and refuses to
//! construct an engine whose backend failed to come up, so an uninitialized
//! backend is never reachable from `dispatch`.
//!
//! # Example
//!
//! ```
//! use fiona_emu::backend::{IdealNumerical, KernelBuffer, KernelCall, NumericBackend, Shape};
//!
//! let mut backend = IdealNumerical::new();
//! backend.initialize().unwrap();
//!
//! let a = KernelBuffer::vector(&[1, 2, 3], 32);
//! let b = KernelBuffer::vector(&[4, 5, 6], 32);
//! let call = KernelCall::new("ideal_numerical", "dotp", Shape::new(1, 1), &a, &b);
//! let out = backend.invoke(&call).unwrap();
//! assert_eq!(out.get(0), 32);
//! ```

mod ideal;

pub use ideal::{IdealNumerical, IDEAL_NUMERICAL};

use std::fmt;

use thiserror::Error;

/// Rows × columns of a kernel operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Row count.
    pub rows: usize,
    /// Column count.
    pub cols: usize,
}

impl Shape {
    /// Create a shape.
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Column vector of `rows` elements.
    pub const fn column(rows: usize) -> Self {
        Self { rows, cols: 1 }
    }

    /// Number of elements.
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Whether the shape holds no elements.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Owned, zero-padded, row-major operand buffer.
///
/// `shape` is the padded capacity the backend sees; `active` is the logical
/// extent that actually carries data. Everything outside `active` is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelBuffer {
    data: Vec<i16>,
    shape: Shape,
    active: Shape,
}

impl KernelBuffer {
    /// Create an all-zero buffer with no active region.
    pub fn zeroed(shape: Shape) -> Self {
        Self {
            data: vec![0; shape.len()],
            shape,
            active: Shape::new(0, 0),
        }
    }

    /// Column vector of `capacity` elements holding `values` at the front.
    ///
    /// Values past `capacity` are dropped.
    pub fn vector(values: &[i16], capacity: usize) -> Self {
        let mut buf = Self::zeroed(Shape::column(capacity));
        let len = values.len().min(capacity);
        buf.data[..len].copy_from_slice(&values[..len]);
        buf.active = Shape::column(len);
        buf
    }

    /// Padded capacity.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Logical extent.
    pub fn active(&self) -> Shape {
        self.active
    }

    /// Mark the logical extent. Clamped to the capacity.
    pub fn set_active(&mut self, active: Shape) {
        self.active = Shape::new(
            active.rows.min(self.shape.rows),
            active.cols.min(self.shape.cols),
        );
    }

    /// Raw row-major elements, padding included.
    pub fn data(&self) -> &[i16] {
        &self.data
    }

    /// Element at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> i16 {
        self.data[row * self.shape.cols + col]
    }

    /// Set element `(row, col)`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: i16) {
        let cols = self.shape.cols;
        self.data[row * cols + col] = value;
    }
}

/// Result buffer allocated by the backend and owned by the caller.
///
/// Elements are wide accumulators; narrowing to lane width is the engine's
/// decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelOutput {
    data: Vec<i64>,
    shape: Shape,
}

impl KernelOutput {
    /// Wrap backend-produced accumulators.
    pub fn new(data: Vec<i64>, shape: Shape) -> Self {
        debug_assert_eq!(data.len(), shape.len());
        Self { data, shape }
    }

    /// Output shape.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Accumulator `index` in row-major order, 0 past the end.
    pub fn get(&self, index: usize) -> i64 {
        self.data.get(index).copied().unwrap_or(0)
    }

    /// All accumulators.
    pub fn data(&self) -> &[i64] {
        &self.data
    }

    /// Take the accumulators.
    pub fn into_vec(self) -> Vec<i64> {
        self.data
    }
}

/// A named kernel invocation.
#[derive(Debug, Clone, Copy)]
pub struct KernelCall<'a> {
    /// Backend module name.
    pub module: &'a str,
    /// Function within the module.
    pub function: &'a str,
    /// Expected output shape.
    pub output: Shape,
    /// First operand.
    pub lhs: &'a KernelBuffer,
    /// Second operand.
    pub rhs: &'a KernelBuffer,
}

impl<'a> KernelCall<'a> {
    /// Build a call.
    pub fn new(
        module: &'a str,
        function: &'a str,
        output: Shape,
        lhs: &'a KernelBuffer,
        rhs: &'a KernelBuffer,
    ) -> Self {
        Self {
            module,
            function,
            output,
            lhs,
            rhs,
        }
    }
}

/// Errors reported by a numeric backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// `invoke` was called before `initialize`.
    #[error("backend not initialized")]
    Uninitialized,

    /// Bringing the backend up failed.
    #[error("backend initialization failed: {0}")]
    InitFailed(String),

    /// No such module.
    #[error("unknown backend module '{0}'")]
    UnknownModule(String),

    /// No such function in the module.
    #[error("unknown function '{function}' in module '{module}'")]
    UnknownFunction {
        /// Module that was asked.
        module: String,
        /// Missing function.
        function: String,
    },

    /// Operand or output shape does not fit the function.
    #[error("{function}: {operand} shape {found} does not match {expected}")]
    ShapeMismatch {
        /// Function being called.
        function: String,
        /// Which operand ("lhs", "rhs", "output").
        operand: &'static str,
        /// Shape the function needs.
        expected: Shape,
        /// Shape it was given.
        found: Shape,
    },
}

/// A provider of named numeric kernels.
pub trait NumericBackend {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Bring the backend up. Calling it again after success is a no-op.
    fn initialize(&mut self) -> Result<(), BackendError>;

    /// Run one kernel and return its freshly allocated output.
    fn invoke(&mut self, call: &KernelCall<'_>) -> Result<KernelOutput, BackendError>;
}

impl<B: NumericBackend + ?Sized> NumericBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn initialize(&mut self) -> Result<(), BackendError> {
        (**self).initialize()
    }

    fn invoke(&mut self, call: &KernelCall<'_>) -> Result<KernelOutput, BackendError> {
        (**self).invoke(call)
    }
}
