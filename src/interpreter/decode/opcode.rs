//! FIONA function codes and their sub-selectors.

/// Raw `funct7` values.
pub mod funct {
    pub const ADD_V: u8 = 1;
    pub const SUB_V: u8 = 2;
    pub const ADD_VS: u8 = 3;
    pub const SUB_VS: u8 = 4;
    pub const MUL_VS: u8 = 5;
    pub const DIV_VS: u8 = 6;
    pub const ACTIVATION: u8 = 7;
    pub const VLD: u8 = 8;
    pub const VST: u8 = 9;
    pub const VSHFL: u8 = 10;
    pub const MINMAX: u8 = 11;
    pub const CONFIG: u8 = 12;
    pub const DOTP: u8 = 13;
    pub const MVM: u8 = 14;
    pub const DUMP: u8 = 15;
}

/// A FIONA operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Vector + vector.
    AddV,
    /// Vector - vector.
    SubV,
    /// Vector + scalar.
    AddVs,
    /// Vector - scalar.
    SubVs,
    /// Vector * scalar.
    MulVs,
    /// Vector / scalar.
    DivVs,
    /// Per-lane activation.
    Activation,
    /// Strided vector load.
    Load,
    /// Strided vector store.
    Store,
    /// Lane gather.
    Shuffle,
    /// Max/min reduction to a scalar.
    MinMax,
    /// Configuration write.
    Config,
    /// Dot product through the numeric backend.
    Dotp,
    /// Matrix-vector multiply through the numeric backend.
    Mvm,
    /// Print instruction counters.
    Dump,
    /// Anything else. Reported and ignored.
    Unknown(u8),
}

impl Opcode {
    /// Map a `funct7` value.
    pub fn from_funct(code: u8) -> Self {
        match code {
            funct::ADD_V => Self::AddV,
            funct::SUB_V => Self::SubV,
            funct::ADD_VS => Self::AddVs,
            funct::SUB_VS => Self::SubVs,
            funct::MUL_VS => Self::MulVs,
            funct::DIV_VS => Self::DivVs,
            funct::ACTIVATION => Self::Activation,
            funct::VLD => Self::Load,
            funct::VST => Self::Store,
            funct::VSHFL => Self::Shuffle,
            funct::MINMAX => Self::MinMax,
            funct::CONFIG => Self::Config,
            funct::DOTP => Self::Dotp,
            funct::MVM => Self::Mvm,
            funct::DUMP => Self::Dump,
            other => Self::Unknown(other),
        }
    }

    /// The `funct7` value.
    pub fn funct(self) -> u8 {
        match self {
            Self::AddV => funct::ADD_V,
            Self::SubV => funct::SUB_V,
            Self::AddVs => funct::ADD_VS,
            Self::SubVs => funct::SUB_VS,
            Self::MulVs => funct::MUL_VS,
            Self::DivVs => funct::DIV_VS,
            Self::Activation => funct::ACTIVATION,
            Self::Load => funct::VLD,
            Self::Store => funct::VST,
            Self::Shuffle => funct::VSHFL,
            Self::MinMax => funct::MINMAX,
            Self::Config => funct::CONFIG,
            Self::Dotp => funct::DOTP,
            Self::Mvm => funct::MVM,
            Self::Dump => funct::DUMP,
            Self::Unknown(code) => code,
        }
    }

    /// Display name used as the instruction counter key.
    ///
    /// Vector-vector and vector-scalar forms share a name.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::AddV | Self::AddVs => "add",
            Self::SubV | Self::SubVs => "sub",
            Self::MulVs => "mul",
            Self::DivVs => "div",
            Self::Activation => "activation",
            Self::Load => "ld",
            Self::Store => "st",
            Self::Shuffle => "shfl",
            Self::MinMax => "minmax",
            Self::Config => "cfg",
            Self::Dotp => "dotp",
            Self::Mvm => "mvm",
            Self::Dump => "dump",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Whether the operation writes the `rd` vector register.
    pub fn writes_vector(self) -> bool {
        matches!(
            self,
            Self::AddV
                | Self::SubV
                | Self::AddVs
                | Self::SubVs
                | Self::MulVs
                | Self::DivVs
                | Self::Activation
                | Self::Load
                | Self::Shuffle
                | Self::Mvm
        )
    }
}

/// Per-lane activation function, selected by the `rs2` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationKind {
    /// max(0, x).
    Relu,
    /// Table-based tanh, Q-format output shifted by 8.
    Tanh,
    /// Table-based sigmoid, Q-format output shifted by 10.
    Sigmoid,
}

impl ActivationKind {
    /// Decode an activation function code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Relu),
            1 => Some(Self::Tanh),
            2 => Some(Self::Sigmoid),
            _ => None,
        }
    }

    /// The function code.
    pub fn code(self) -> u8 {
        match self {
            Self::Relu => 0,
            Self::Tanh => 1,
            Self::Sigmoid => 2,
        }
    }
}

/// MINMAX reduction direction, selected by the `rs2` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionMode {
    /// Largest active lane.
    Max,
    /// Smallest active lane.
    Min,
}

impl ReductionMode {
    /// Decode a reduction mode.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Max),
            1 => Some(Self::Min),
            _ => None,
        }
    }
}

/// CONFIG target, selected by the `rd` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSelector {
    /// Active vector length.
    VectorLength,
    /// Lane mask of one register.
    Mask,
    /// Matrix register load from memory.
    Matrix,
    /// Memory element stride.
    Stride,
}

impl ConfigSelector {
    /// Decode a config selector.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::VectorLength),
            1 => Some(Self::Mask),
            2 => Some(Self::Matrix),
            3 => Some(Self::Stride),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funct_mapping_is_bijective_on_known_codes() {
        for code in 1..=15u8 {
            let op = Opcode::from_funct(code);
            assert!(!matches!(op, Opcode::Unknown(_)), "funct {} unmapped", code);
            assert_eq!(op.funct(), code);
        }
    }

    #[test]
    fn test_unknown_funct() {
        assert_eq!(Opcode::from_funct(0), Opcode::Unknown(0));
        assert_eq!(Opcode::from_funct(16), Opcode::Unknown(16));
        assert_eq!(Opcode::Unknown(99).funct(), 99);
        assert_eq!(Opcode::Unknown(99).mnemonic(), "unknown");
    }

    #[test]
    fn test_shared_mnemonics() {
        assert_eq!(Opcode::AddV.mnemonic(), Opcode::AddVs.mnemonic());
        assert_eq!(Opcode::SubV.mnemonic(), Opcode::SubVs.mnemonic());
        assert_eq!(Opcode::Load.mnemonic(), "ld");
        assert_eq!(Opcode::Config.mnemonic(), "cfg");
    }

    #[test]
    fn test_writes_vector() {
        assert!(Opcode::Mvm.writes_vector());
        assert!(Opcode::Load.writes_vector());
        assert!(!Opcode::Store.writes_vector());
        assert!(!Opcode::MinMax.writes_vector());
        assert!(!Opcode::Dotp.writes_vector());
    }

    #[test]
    fn test_selectors() {
        assert_eq!(ActivationKind::from_code(0), Some(ActivationKind::Relu));
        assert_eq!(ActivationKind::from_code(2), Some(ActivationKind::Sigmoid));
        assert_eq!(ActivationKind::from_code(3), None);
        assert_eq!(ActivationKind::Tanh.code(), 1);

        assert_eq!(ReductionMode::from_code(1), Some(ReductionMode::Min));
        assert_eq!(ReductionMode::from_code(2), None);

        assert_eq!(ConfigSelector::from_code(3), Some(ConfigSelector::Stride));
        assert_eq!(ConfigSelector::from_code(4), None);
    }
}
