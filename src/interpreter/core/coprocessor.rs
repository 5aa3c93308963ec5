//! The FIONA coprocessor: dispatch loop over one execution context.

use super::counter::InstructionCounter;
use crate::backend::{BackendError, IdealNumerical, NumericBackend, IDEAL_NUMERICAL};
use crate::interpreter::decode::{ConfigSelector, Opcode, ReductionMode, RoccInstruction};
use crate::interpreter::execute::{KernelUnit, MemoryUnit, ScalarOp, ShufflePolicy, VectorAlu};
use crate::interpreter::state::{ExecutionContext, Lanes, NUM_VECTOR_REGS};
use crate::interpreter::traits::{ExecuteError, Memory};

/// Behaviour switches resolved from [`crate::config::Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Backend module named in DOTP/MVM kernel calls.
    pub backend_module: String,
    /// Fault on unrecognized function codes instead of ignoring them.
    pub strict_opcodes: bool,
    /// Handling of out-of-range SHUFFLE indices.
    pub shuffle_policy: ShufflePolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            backend_module: IDEAL_NUMERICAL.to_string(),
            strict_opcodes: false,
            shuffle_policy: ShufflePolicy::Fault,
        }
    }
}

/// One FIONA coprocessor instance.
///
/// Owns its registers, counters and numeric backend. Memory is lent per
/// instruction. Instances are independent; simulate several cores by
/// creating several coprocessors.
pub struct Coprocessor<B: NumericBackend = IdealNumerical> {
    ctx: ExecutionContext,
    backend: B,
    options: EngineOptions,
    counter: InstructionCounter,
}

impl Coprocessor<IdealNumerical> {
    /// Coprocessor backed by the in-process reference kernels.
    pub fn reference() -> Result<Self, BackendError> {
        Self::new(IdealNumerical::new())
    }
}

impl<B: NumericBackend> Coprocessor<B> {
    /// Create a coprocessor with default options.
    ///
    /// Initializes the backend; construction fails if it does.
    pub fn new(backend: B) -> Result<Self, BackendError> {
        Self::with_options(backend, EngineOptions::default())
    }

    /// Create a coprocessor with explicit options.
    pub fn with_options(mut backend: B, options: EngineOptions) -> Result<Self, BackendError> {
        backend.initialize()?;
        log::debug!(
            "Coprocessor created: backend={} module={} strict={} shuffle={:?}",
            backend.name(),
            options.backend_module,
            options.strict_opcodes,
            options.shuffle_policy
        );
        Ok(Self {
            ctx: ExecutionContext::new(),
            backend,
            options,
            counter: InstructionCounter::new(),
        })
    }

    /// Architectural state.
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Mutable architectural state, for test setup and host pokes.
    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.ctx
    }

    /// Per-opcode invocation counts.
    pub fn counter(&self) -> &InstructionCounter {
        &self.counter
    }

    /// Active options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The numeric backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Decode a raw RoCC word and dispatch it.
    pub fn execute_word<M: Memory + ?Sized>(
        &mut self,
        word: u32,
        xs1: u64,
        xs2: u64,
        mem: &mut M,
    ) -> Result<u64, ExecuteError> {
        let insn = RoccInstruction::decode(word)?;
        self.dispatch(&insn, xs1, xs2, mem)
    }

    /// Execute one instruction.
    ///
    /// `xs1`/`xs2` are the host's source register values. Returns the value
    /// for the host's `rd` (non-zero only for MINMAX and DOTP). On error the
    /// register file is unchanged, except that the instruction was counted.
    pub fn dispatch<M: Memory + ?Sized>(
        &mut self,
        insn: &RoccInstruction,
        xs1: u64,
        xs2: u64,
        mem: &mut M,
    ) -> Result<u64, ExecuteError> {
        let op = insn.op();
        self.counter.increment(op.mnemonic());

        log::debug!(
            "dispatch {} funct={} rd={} rs1={} rs2={} xs1={:#x} xs2={:#x}",
            op.mnemonic(),
            insn.funct,
            insn.rd,
            insn.rs1,
            insn.rs2,
            xs1,
            xs2
        );

        self.execute_op(op, insn, xs1, xs2, mem).map_err(|e| {
            log::warn!("{} faulted: {}", op.mnemonic(), e);
            e
        })
    }

    fn execute_op<M: Memory + ?Sized>(
        &mut self,
        op: Opcode,
        insn: &RoccInstruction,
        xs1: u64,
        xs2: u64,
        mem: &mut M,
    ) -> Result<u64, ExecuteError> {
        let (rd, rs1, rs2) = (insn.rd, insn.rs1, insn.rs2);
        let vlen = self.ctx.vector_length();
        let op1 = self.ctx.masks.apply(&self.ctx.vector, rs1);
        let op2 = self.ctx.masks.apply(&self.ctx.vector, rs2);

        match op {
            Opcode::AddV => self.commit(rd, &VectorAlu::add(&op1, &op2, vlen)),
            Opcode::SubV => self.commit(rd, &VectorAlu::sub(&op1, &op2, vlen)),

            Opcode::AddVs => self.vector_scalar(ScalarOp::Add, rd, rs2, &op2, xs1)?,
            Opcode::SubVs => self.vector_scalar(ScalarOp::Sub, rd, rs2, &op2, xs1)?,
            Opcode::MulVs => self.vector_scalar(ScalarOp::Mul, rd, rs2, &op2, xs1)?,
            Opcode::DivVs => self.vector_scalar(ScalarOp::Div, rd, rs2, &op2, xs1)?,

            Opcode::Activation => {
                let out = VectorAlu::activation(rs2, &self.ctx.vector.read(rs1), vlen)?;
                self.commit(rd, &out);
            }

            Opcode::Load => {
                let out = MemoryUnit::load_vector(&self.ctx, mem, xs1)?;
                self.commit(rd, &out);
            }

            Opcode::Store => {
                let value = self.ctx.vector.read(rs2);
                MemoryUnit::store_vector(&self.ctx, mem, xs1, &value)?;
            }

            Opcode::Shuffle => {
                let out = VectorAlu::shuffle(
                    &self.ctx.vector.read(rs1),
                    &self.ctx.vector.read(rs2),
                    vlen,
                    self.options.shuffle_policy,
                )?;
                self.commit(rd, &out);
            }

            Opcode::MinMax => {
                let mode = ReductionMode::from_code(rs2)
                    .ok_or(ExecuteError::UnknownReductionMode { mode: rs2 })?;
                let value = VectorAlu::reduce(
                    mode,
                    &self.ctx.vector.read(rs1),
                    self.ctx.masks.read(rs1),
                    self.ctx.vector.read_lane(rs1, 0),
                    vlen,
                );
                return Ok(widen(value));
            }

            Opcode::Config => self.configure(rd, xs1, xs2, mem)?,

            Opcode::Dotp => {
                let value = KernelUnit::dotp(
                    &mut self.backend,
                    &self.options.backend_module,
                    &op1,
                    &op2,
                    vlen,
                )?;
                return Ok(widen(value));
            }

            Opcode::Mvm => {
                let out = KernelUnit::mvm(
                    &mut self.backend,
                    &self.options.backend_module,
                    &op1,
                    &self.ctx.matrix,
                    vlen,
                )?;
                self.commit(rd, &out);
            }

            Opcode::Dump => self.dump(),

            Opcode::Unknown(funct) => {
                if self.options.strict_opcodes {
                    return Err(ExecuteError::UnknownOpcode { funct });
                }
                log::warn!("unimplemented opcode funct={}", funct);
            }
        }

        Ok(0)
    }

    fn vector_scalar(
        &mut self,
        op: ScalarOp,
        rd: u8,
        rs2: u8,
        src: &Lanes,
        xs1: u64,
    ) -> Result<(), ExecuteError> {
        let mask = self.ctx.masks.read(rs2);
        let out = VectorAlu::scalar(op, src, mask, xs1 as i64, self.ctx.vector_length())?;
        self.commit(rd, &out);
        Ok(())
    }

    /// CONFIG: the `rd` field selects what is configured.
    fn configure<M: Memory + ?Sized>(
        &mut self,
        selector: u8,
        xs1: u64,
        xs2: u64,
        mem: &mut M,
    ) -> Result<(), ExecuteError> {
        let selector = ConfigSelector::from_code(selector)
            .ok_or(ExecuteError::UnknownConfigSelector { selector })?;

        match selector {
            ConfigSelector::VectorLength => {
                self.ctx.set_vector_length(xs1)?;
                log::debug!("vector length = {}", xs1);
            }
            ConfigSelector::Mask => {
                if xs2 >= NUM_VECTOR_REGS as u64 {
                    return Err(ExecuteError::MaskTargetOutOfRange { register: xs2 });
                }
                self.ctx.masks.write(xs2 as u8, xs1 as u32);
                log::debug!("mask v{} = {:#010x}", xs2, xs1 as u32);
            }
            ConfigSelector::Matrix => MemoryUnit::load_matrix(&mut self.ctx, mem, xs1)?,
            ConfigSelector::Stride => {
                self.ctx.set_stride(xs1);
                log::debug!("stride = {}", xs1);
            }
        }
        Ok(())
    }

    /// Write `value` into `rd`, zeroing lanes past the vector length.
    fn commit(&mut self, rd: u8, value: &Lanes) {
        let vlen = self.ctx.vector_length();
        self.ctx.vector.write_active(rd, value, vlen);
        log::trace!("v{} <- {:?}", rd, &value[..vlen]);
    }

    /// The DUMP report: a `DUMP` header and one `name->count` line per opcode.
    pub fn dump_report(&self) -> String {
        format!("DUMP\n{}", self.counter)
    }

    /// Print the DUMP report to stdout.
    pub fn dump(&self) {
        let report = self.dump_report();
        for line in report.lines() {
            log::debug!("{}", line);
        }
        print!("{}", report);
    }
}

/// Sign-extend a lane result into a host register value.
#[inline]
fn widen(value: i16) -> u64 {
    i64::from(value) as u64
}
