//! Register file implementations for the FIONA coprocessor.
//!
//! FIONA has three pieces of architectural storage:
//!
//! - **Vector**: 32 registers × 32 lanes × 16-bit signed (v0-v31)
//! - **Mask**: one 32-bit lane-enable mask per vector register
//! - **Matrix**: a single 32 × 32 × 16-bit signed operand for MVM
//!
//! Masks are addressed by the *source* register number and read whenever
//! that register is used as an operand. They reset to all lanes enabled.

use std::fmt;

/// Number of vector registers.
pub const NUM_VECTOR_REGS: usize = 32;

/// Lanes per vector register. Also the maximum vector length.
pub const NUM_LANES: usize = 32;

/// Rows and columns of the matrix register.
pub const MATRIX_DIM: usize = 32;

/// Mask value with every lane enabled.
pub const MASK_ALL: u32 = 0xFFFF_FFFF;

/// One vector register worth of lanes.
pub type Lanes = [i16; NUM_LANES];

/// Vector register file.
///
/// 32 × 32-lane registers of `i16`.
#[derive(Clone)]
pub struct VectorRegisterFile {
    regs: [Lanes; NUM_VECTOR_REGS],
}

impl Default for VectorRegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorRegisterFile {
    /// Create a new zeroed register file.
    pub const fn new() -> Self {
        Self {
            regs: [[0; NUM_LANES]; NUM_VECTOR_REGS],
        }
    }

    /// Read a whole register (0-31).
    #[inline]
    pub fn read(&self, reg: u8) -> Lanes {
        self.regs[(reg & 0x1F) as usize]
    }

    /// Write a whole register (0-31).
    #[inline]
    pub fn write(&mut self, reg: u8, value: Lanes) {
        self.regs[(reg & 0x1F) as usize] = value;
    }

    /// Read a single lane (0-31).
    #[inline]
    pub fn read_lane(&self, reg: u8, lane: usize) -> i16 {
        self.regs[(reg & 0x1F) as usize][lane & 0x1F]
    }

    /// Write a single lane (0-31).
    #[inline]
    pub fn write_lane(&mut self, reg: u8, lane: usize, value: i16) {
        self.regs[(reg & 0x1F) as usize][lane & 0x1F] = value;
    }

    /// Write the first `len` lanes of a register and zero the rest.
    ///
    /// Every vector-writing instruction goes through here, so no stale lane
    /// survives a write shorter than a full register.
    pub fn write_active(&mut self, reg: u8, value: &Lanes, len: usize) {
        let len = len.min(NUM_LANES);
        let dst = &mut self.regs[(reg & 0x1F) as usize];
        dst[..len].copy_from_slice(&value[..len]);
        dst[len..].fill(0);
    }
}

impl fmt::Debug for VectorRegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let non_zero: Vec<_> = self
            .regs
            .iter()
            .enumerate()
            .filter(|(_, v)| v.iter().any(|x| *x != 0))
            .collect();

        if non_zero.is_empty() {
            write!(f, "VectorRegisterFile {{ all zero }}")
        } else {
            writeln!(f, "VectorRegisterFile {{")?;
            for (reg, val) in non_zero {
                write!(f, "  v{}: [", reg)?;
                for (i, lane) in val.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", lane)?;
                }
                writeln!(f, "]")?;
            }
            write!(f, "}}")
        }
    }
}

/// Per-register lane masks.
#[derive(Clone)]
pub struct MaskRegisterFile {
    masks: [u32; NUM_VECTOR_REGS],
}

impl Default for MaskRegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskRegisterFile {
    /// Create a mask file with every lane of every register enabled.
    pub const fn new() -> Self {
        Self {
            masks: [MASK_ALL; NUM_VECTOR_REGS],
        }
    }

    /// Read the mask associated with register `reg`.
    #[inline]
    pub fn read(&self, reg: u8) -> u32 {
        self.masks[(reg & 0x1F) as usize]
    }

    /// Replace the mask associated with register `reg`.
    #[inline]
    pub fn write(&mut self, reg: u8, mask: u32) {
        self.masks[(reg & 0x1F) as usize] = mask;
    }

    /// Check whether `lane` is enabled for register `reg`.
    #[inline]
    pub fn lane_enabled(&self, reg: u8, lane: usize) -> bool {
        lane_enabled(self.read(reg), lane)
    }

    /// Read register `reg` from `vregs` with disabled lanes forced to zero.
    pub fn apply(&self, vregs: &VectorRegisterFile, reg: u8) -> Lanes {
        let mask = self.read(reg);
        let mut lanes = vregs.read(reg);
        for (i, lane) in lanes.iter_mut().enumerate() {
            if !lane_enabled(mask, i) {
                *lane = 0;
            }
        }
        lanes
    }
}

impl fmt::Debug for MaskRegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only show masks that differ from the reset value
        let custom: Vec<_> = self
            .masks
            .iter()
            .enumerate()
            .filter(|(_, m)| **m != MASK_ALL)
            .collect();

        if custom.is_empty() {
            write!(f, "MaskRegisterFile {{ all enabled }}")
        } else {
            write!(f, "MaskRegisterFile {{ ")?;
            for (i, (reg, mask)) in custom.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "v{}: 0x{:08X}", reg, mask)?;
            }
            write!(f, " }}")
        }
    }
}

/// Test bit `lane` of a 32-bit mask.
#[inline]
pub fn lane_enabled(mask: u32, lane: usize) -> bool {
    lane < NUM_LANES && mask & (1 << lane) != 0
}

/// The global matrix register.
#[derive(Clone)]
pub struct MatrixRegister {
    cells: [[i16; MATRIX_DIM]; MATRIX_DIM],
}

impl Default for MatrixRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixRegister {
    /// Create a zeroed matrix.
    pub const fn new() -> Self {
        Self {
            cells: [[0; MATRIX_DIM]; MATRIX_DIM],
        }
    }

    /// Read cell `(row, col)`.
    #[inline]
    pub fn read(&self, row: usize, col: usize) -> i16 {
        self.cells[row & 0x1F][col & 0x1F]
    }

    /// Write cell `(row, col)`.
    #[inline]
    pub fn write(&mut self, row: usize, col: usize, value: i16) {
        self.cells[row & 0x1F][col & 0x1F] = value;
    }

    /// Borrow a full row.
    pub fn row(&self, row: usize) -> &[i16; MATRIX_DIM] {
        &self.cells[row & 0x1F]
    }
}

impl fmt::Debug for MatrixRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let non_zero = self.cells.iter().flatten().filter(|v| **v != 0).count();
        write!(f, "MatrixRegister {{ {} non-zero cells }}", non_zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Vector Register Tests ==========

    #[test]
    fn test_vector_read_write() {
        let mut regs = VectorRegisterFile::new();

        let mut data = [0i16; NUM_LANES];
        for (i, lane) in data.iter_mut().enumerate() {
            *lane = i as i16 - 16;
        }
        regs.write(3, data);
        assert_eq!(regs.read(3), data);
        assert_eq!(regs.read(4), [0; NUM_LANES]);
    }

    #[test]
    fn test_vector_lane_access() {
        let mut regs = VectorRegisterFile::new();

        regs.write_lane(5, 31, -1234);
        assert_eq!(regs.read_lane(5, 31), -1234);
        assert_eq!(regs.read_lane(5, 0), 0); // Other lanes unaffected
    }

    #[test]
    fn test_vector_register_wrapping() {
        let mut regs = VectorRegisterFile::new();

        // Register index wraps at 32
        regs.write_lane(32, 0, 7);
        assert_eq!(regs.read_lane(0, 0), 7);
    }

    #[test]
    fn test_write_active_zeroes_tail() {
        let mut regs = VectorRegisterFile::new();
        regs.write(1, [9; NUM_LANES]);

        regs.write_active(1, &[5; NUM_LANES], 4);
        let lanes = regs.read(1);
        assert_eq!(&lanes[..4], &[5, 5, 5, 5]);
        assert!(lanes[4..].iter().all(|v| *v == 0));
    }

    #[test]
    fn test_write_active_zero_length() {
        let mut regs = VectorRegisterFile::new();
        regs.write(2, [9; NUM_LANES]);

        regs.write_active(2, &[5; NUM_LANES], 0);
        assert_eq!(regs.read(2), [0; NUM_LANES]);
    }

    #[test]
    fn test_vector_debug_format() {
        let mut regs = VectorRegisterFile::new();
        assert!(format!("{:?}", regs).contains("all zero"));

        regs.write_lane(7, 0, 42);
        let debug = format!("{:?}", regs);
        assert!(debug.contains("v7"));
        assert!(debug.contains("42"));
    }

    // ========== Mask Tests ==========

    #[test]
    fn test_masks_default_all_enabled() {
        let masks = MaskRegisterFile::new();
        for reg in 0..NUM_VECTOR_REGS as u8 {
            assert_eq!(masks.read(reg), MASK_ALL);
        }
    }

    #[test]
    fn test_masks_independent_per_register() {
        let mut masks = MaskRegisterFile::new();
        masks.write(4, 0x0000_000F);

        assert_eq!(masks.read(4), 0x0000_000F);
        assert_eq!(masks.read(5), MASK_ALL);
        assert!(masks.lane_enabled(4, 3));
        assert!(!masks.lane_enabled(4, 4));
    }

    #[test]
    fn test_mask_apply() {
        let mut vregs = VectorRegisterFile::new();
        vregs.write(2, [3; NUM_LANES]);

        let mut masks = MaskRegisterFile::new();
        masks.write(2, 0b1010);

        let lanes = masks.apply(&vregs, 2);
        assert_eq!(&lanes[..4], &[0, 3, 0, 3]);
        assert!(lanes[4..].iter().all(|v| *v == 0));
        // Stored value untouched
        assert_eq!(vregs.read(2), [3; NUM_LANES]);
    }

    #[test]
    fn test_lane_enabled_bounds() {
        assert!(lane_enabled(MASK_ALL, 31));
        assert!(!lane_enabled(MASK_ALL, 32));
        assert!(!lane_enabled(0, 0));
    }

    // ========== Matrix Tests ==========

    #[test]
    fn test_matrix_read_write() {
        let mut mat = MatrixRegister::new();

        mat.write(2, 3, -7);
        assert_eq!(mat.read(2, 3), -7);
        assert_eq!(mat.read(3, 2), 0);
        assert_eq!(mat.row(2)[3], -7);
    }
}
