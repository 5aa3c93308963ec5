//! Activation unit.
//!
//! Fixed-point sigmoid and tanh through a single lookup table, plus ReLU.
//!
//! # Table
//!
//! 256 entries of `sigmoid(i / 24)` in unsigned 0.16 format: entry 0 is
//! 32768 (0.5), entry 255 is 65535. Both functions are symmetric, so only
//! the magnitude of the input indexes the table, and tanh reuses it through
//! `tanh(x) = 2 * sigmoid(2x) - 1`.
//!
//! # Output format
//!
//! | Function | Index shift | Fraction bits | Final shift | Range |
//! |----------|-------------|---------------|-------------|-------|
//! | Sigmoid | 9 | 9 | 10 | 1 ..= 32767 (Q15, 16384 = 0.5) |
//! | Tanh | 8 | 8 | 8 | -32767 ..= 32767 (Q15) |
//!
//! The rounding sequence is bit-exact with the reference kernels used by
//! the inference code, so `sigmoid(x) + sigmoid(-x) == 32768` and
//! `tanh(-x) == -tanh(x)` hold exactly.

use crate::interpreter::decode::ActivationKind;
use crate::interpreter::traits::ExecuteError;

/// `sigmoid(i / 24)` in unsigned 0.16 fixed point.
pub const SIGMOID_TABLE: [u16; 256] = [
    32768, 33451, 34133, 34813, 35493, 36169, 36843, 37513, 38180, 38841,
    39498, 40149, 40794, 41432, 42064, 42688, 43304, 43912, 44511, 45102,
    45683, 46255, 46817, 47369, 47911, 48443, 48964, 49475, 49975, 50464,
    50942, 51409, 51865, 52311, 52745, 53169, 53581, 53983, 54374, 54755,
    55125, 55485, 55834, 56174, 56503, 56823, 57133, 57433, 57724, 58007,
    58280, 58544, 58800, 59048, 59288, 59519, 59743, 59959, 60168, 60370,
    60565, 60753, 60935, 61110, 61279, 61441, 61599, 61750, 61896, 62036,
    62172, 62302, 62428, 62549, 62666, 62778, 62886, 62990, 63090, 63186,
    63279, 63368, 63454, 63536, 63615, 63691, 63765, 63835, 63903, 63968,
    64030, 64090, 64148, 64204, 64257, 64308, 64357, 64405, 64450, 64494,
    64536, 64576, 64614, 64652, 64687, 64721, 64754, 64786, 64816, 64845,
    64873, 64900, 64926, 64950, 64974, 64997, 65019, 65039, 65060, 65079,
    65097, 65115, 65132, 65149, 65164, 65179, 65194, 65208, 65221, 65234,
    65246, 65258, 65269, 65280, 65291, 65301, 65310, 65319, 65328, 65337,
    65345, 65352, 65360, 65367, 65374, 65381, 65387, 65393, 65399, 65404,
    65410, 65415, 65420, 65425, 65429, 65433, 65438, 65442, 65445, 65449,
    65453, 65456, 65459, 65462, 65465, 65468, 65471, 65474, 65476, 65479,
    65481, 65483, 65485, 65488, 65489, 65491, 65493, 65495, 65497, 65498,
    65500, 65501, 65503, 65504, 65505, 65507, 65508, 65509, 65510, 65511,
    65512, 65513, 65514, 65515, 65516, 65517, 65517, 65518, 65519, 65520,
    65520, 65521, 65522, 65522, 65523, 65523, 65524, 65524, 65525, 65525,
    65526, 65526, 65526, 65527, 65527, 65528, 65528, 65528, 65529, 65529,
    65529, 65529, 65530, 65530, 65530, 65530, 65531, 65531, 65531, 65531,
    65531, 65532, 65532, 65532, 65532, 65532, 65532, 65533, 65533, 65533,
    65533, 65533, 65533, 65533, 65533, 65534, 65534, 65534, 65534, 65534,
    65534, 65534, 65534, 65534, 65534, 65535,
];

/// Saturated interpolation result for sigmoid, before folding.
const SIGMOID_CEILING: u32 = 0x7FFF << 10;

/// Saturated interpolation result for tanh, before folding.
const TANH_CEILING: u32 = 0xFFFF << 8;

/// Activation unit.
pub struct ActivationUnit;

impl ActivationUnit {
    /// Apply `kind` to `input`.
    ///
    /// The input is pre-scaled by `3 << left_shift` before the table lookup,
    /// which is how callers pick the input's fixed-point position.
    pub fn activate(kind: ActivationKind, input: i16, left_shift: u16) -> i16 {
        let (shift, frac_mask, ceiling) = match kind {
            ActivationKind::Relu => return Self::relu(input),
            ActivationKind::Sigmoid => (9u32, 0x1FFu32, SIGMOID_CEILING),
            ActivationKind::Tanh => (8u32, 0x0FFu32, TANH_CEILING),
        };

        let multiplier = 3i32.wrapping_shl(u32::from(left_shift));
        let scaled = i32::from(input).wrapping_mul(multiplier);
        let magnitude = scaled.unsigned_abs();

        let index = magnitude >> shift;
        let interpolated = if index >= 255 {
            ceiling
        } else {
            let lo = u32::from(SIGMOID_TABLE[index as usize]);
            let hi = u32::from(SIGMOID_TABLE[index as usize + 1]);
            (lo << shift).wrapping_add((magnitude & frac_mask).wrapping_mul(hi - lo))
        };

        // Fold the negative half back onto the table with round-to-nearest.
        let folded = match kind {
            ActivationKind::Sigmoid => {
                let r = if scaled >= 0 {
                    interpolated.wrapping_add(1 << 9)
                } else {
                    (1u32 << 25)
                        .wrapping_sub(interpolated)
                        .wrapping_add((1 << 9) - 1)
                };
                r >> 10
            }
            _ => {
                let r = if scaled >= 0 {
                    interpolated.wrapping_sub(1 << 23).wrapping_add(1 << 7)
                } else {
                    (1u32 << 23)
                        .wrapping_sub(interpolated)
                        .wrapping_add((1 << 7) - 1)
                };
                r >> 8
            }
        };

        folded as i16
    }

    /// max(0, x).
    #[inline]
    pub fn relu(input: i16) -> i16 {
        input.max(0)
    }

    /// Activation as executed by the per-lane ACTIVATION instruction.
    ///
    /// Only ReLU is wired up per lane. Tanh, sigmoid and unknown function
    /// codes are illegal instructions.
    pub fn lane(function: u8, input: i16) -> Result<i16, ExecuteError> {
        match ActivationKind::from_code(function) {
            Some(ActivationKind::Relu) => Ok(Self::relu(input)),
            _ => Err(ExecuteError::UnsupportedActivation { function }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ActivationKind::{Relu, Sigmoid, Tanh};

    #[test]
    fn test_table_shape() {
        assert_eq!(SIGMOID_TABLE[0], 32768);
        assert_eq!(SIGMOID_TABLE[255], 65535);
        assert!(SIGMOID_TABLE.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_relu() {
        assert_eq!(ActivationUnit::activate(Relu, -5, 0), 0);
        assert_eq!(ActivationUnit::activate(Relu, 0, 0), 0);
        assert_eq!(ActivationUnit::activate(Relu, 1234, 7), 1234);
        assert_eq!(ActivationUnit::activate(Relu, i16::MIN, 0), 0);
    }

    #[test]
    fn test_sigmoid_midpoint() {
        for shift in 0..8 {
            assert_eq!(ActivationUnit::activate(Sigmoid, 0, shift), 16384);
        }
    }

    #[test]
    fn test_tanh_zero() {
        for shift in 0..8 {
            assert_eq!(ActivationUnit::activate(Tanh, 0, shift), 0);
        }
    }

    #[test]
    fn test_known_values() {
        assert_eq!(ActivationUnit::activate(Sigmoid, 1, 0), 16386);
        assert_eq!(ActivationUnit::activate(Sigmoid, -1, 0), 16382);
        assert_eq!(ActivationUnit::activate(Sigmoid, 100, 0), 16584);
        assert_eq!(ActivationUnit::activate(Sigmoid, 256, 1), 17407);
        assert_eq!(ActivationUnit::activate(Sigmoid, 1000, 2), 23803);

        assert_eq!(ActivationUnit::activate(Tanh, 1, 0), 8);
        assert_eq!(ActivationUnit::activate(Tanh, 100, 0), 800);
        assert_eq!(ActivationUnit::activate(Tanh, -256, 1), -4075);
        assert_eq!(ActivationUnit::activate(Tanh, 1000, 2), 24628);
    }

    #[test]
    fn test_saturation() {
        assert_eq!(ActivationUnit::activate(Sigmoid, i16::MAX, 2), 32767);
        assert_eq!(ActivationUnit::activate(Sigmoid, -i16::MAX, 2), 1);
        assert_eq!(ActivationUnit::activate(Tanh, i16::MAX, 2), 32767);
        assert_eq!(ActivationUnit::activate(Tanh, -i16::MAX, 2), -32767);
    }

    #[test]
    fn test_sigmoid_symmetry() {
        for shift in 0..4 {
            for x in -3000i16..=3000 {
                let sum = i32::from(ActivationUnit::activate(Sigmoid, x, shift))
                    + i32::from(ActivationUnit::activate(Sigmoid, -x, shift));
                assert_eq!(sum, 32768, "x={} shift={}", x, shift);
            }
        }
    }

    #[test]
    fn test_tanh_odd_symmetry() {
        for shift in 0..4 {
            for x in -3000i16..=3000 {
                let pos = ActivationUnit::activate(Tanh, x, shift);
                let neg = ActivationUnit::activate(Tanh, -x, shift);
                assert_eq!(pos, -neg, "x={} shift={}", x, shift);
            }
        }
    }

    #[test]
    fn test_monotonic() {
        for kind in [Sigmoid, Tanh] {
            for shift in 0..4 {
                let mut prev = i16::MIN;
                for x in -i16::MAX..=i16::MAX {
                    let y = ActivationUnit::activate(kind, x, shift);
                    assert!(y >= prev, "{:?} x={} shift={}: {} < {}", kind, x, shift, y, prev);
                    prev = y;
                }
            }
        }
    }

    #[test]
    fn test_lane_activation() {
        assert_eq!(ActivationUnit::lane(0, -3), Ok(0));
        assert_eq!(ActivationUnit::lane(0, 9), Ok(9));
        assert_eq!(
            ActivationUnit::lane(1, 9),
            Err(ExecuteError::UnsupportedActivation { function: 1 })
        );
        assert_eq!(
            ActivationUnit::lane(2, 9),
            Err(ExecuteError::UnsupportedActivation { function: 2 })
        );
        assert!(ActivationUnit::lane(7, 9).is_err());
    }
}
