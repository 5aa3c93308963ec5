//! Simulated host memory seen by the coprocessor.
//!
//! A sparse byte-addressed store covering the full 64-bit address space.
//! Vector loads and stores move little-endian 16-bit lanes.
//!
//! By default every address is backed and unwritten memory reads as zero.
//! Named regions can be registered for debugging; with
//! [`HostMemory::set_strict`] enabled, lane accesses outside every region
//! fault with [`MemoryError::Unmapped`].
//!
//! # Usage
//!
//! ```
//! use fiona_emu::device::HostMemory;
//!
//! let mut mem = HostMemory::new();
//! mem.allocate_region("input", 0x1000_0000, 4096).unwrap();
//!
//! mem.write_slice(0x1000_0000, &[1i16, -2, 3, -4]);
//! assert_eq!(mem.read_slice(0x1000_0000, 4), vec![1, -2, 3, -4]);
//! ```

use std::collections::BTreeMap;

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

use crate::interpreter::traits::{Memory, MemoryError};

/// A named memory region for debugging and tracking.
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    /// Human-readable name (e.g., "input", "weights")
    pub name: String,
    /// Base address in host address space
    pub base_address: u64,
    /// Size in bytes
    pub size: usize,
    /// Bytes written through this region
    pub bytes_written: usize,
    /// Bytes read through this region
    pub bytes_read: usize,
}

impl MemoryRegion {
    /// Create a new memory region.
    pub fn new(name: impl Into<String>, base_address: u64, size: usize) -> Self {
        Self {
            name: name.into(),
            base_address,
            size,
            bytes_written: 0,
            bytes_read: 0,
        }
    }

    /// Check if an address falls within this region.
    #[inline]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.base_address && addr - self.base_address < self.size as u64
    }

    /// Check if an address range overlaps this region.
    #[inline]
    pub fn overlaps(&self, addr: u64, len: usize) -> bool {
        let end = addr.saturating_add(len as u64);
        let region_end = self.base_address.saturating_add(self.size as u64);
        addr < region_end && end > self.base_address
    }
}

/// Error type for region bookkeeping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostMemoryError {
    /// Region overlaps one already registered.
    #[error("region at 0x{new_base:016x} overlaps with '{existing_name}'")]
    RegionOverlap {
        /// Base of the rejected region.
        new_base: u64,
        /// Name of the region it collides with.
        existing_name: String,
    },
}

/// Simulated host memory.
///
/// Uses sparse storage (BTreeMap) to handle the 64-bit address space
/// without allocating it. Memory is allocated in 4KB pages on first write.
pub struct HostMemory {
    /// Sparse storage: page_address -> page_data
    pages: BTreeMap<u64, Box<[u8; Self::PAGE_SIZE]>>,

    /// Named regions for debugging and strict mapping
    regions: Vec<MemoryRegion>,

    /// Fault lane accesses outside every region
    strict: bool,

    total_bytes_written: u64,
    total_bytes_read: u64,
}

impl HostMemory {
    /// Page size for sparse storage.
    pub const PAGE_SIZE: usize = 4096;

    /// Page address mask (lower 12 bits are offset)
    const PAGE_MASK: u64 = !(Self::PAGE_SIZE as u64 - 1);

    /// Create a new empty host memory.
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
            regions: Vec::new(),
            strict: false,
            total_bytes_written: 0,
            total_bytes_read: 0,
        }
    }

    /// Register a named region.
    ///
    /// Pages are still allocated on demand; the region only names the range
    /// and collects statistics.
    pub fn allocate_region(
        &mut self,
        name: impl Into<String>,
        base_address: u64,
        size: usize,
    ) -> Result<(), HostMemoryError> {
        if let Some(existing) = self.regions.iter().find(|r| r.overlaps(base_address, size)) {
            return Err(HostMemoryError::RegionOverlap {
                new_base: base_address,
                existing_name: existing.name.clone(),
            });
        }

        self.regions.push(MemoryRegion::new(name, base_address, size));
        Ok(())
    }

    /// Get a region by name.
    pub fn region(&self, name: &str) -> Option<&MemoryRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Get all regions.
    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    /// Require lane accesses to fall inside a registered region.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Whether `len` bytes at `addr` are accessible under the current mode.
    fn check_mapped(&self, addr: u64, len: usize) -> Result<(), MemoryError> {
        if !self.strict {
            return Ok(());
        }
        let last = addr.saturating_add(len as u64 - 1);
        let mapped = self.regions.iter().any(|r| r.contains(addr) && r.contains(last));
        if mapped {
            Ok(())
        } else {
            Err(MemoryError::Unmapped { address: addr })
        }
    }

    fn get_or_create_page(&mut self, addr: u64) -> &mut [u8; Self::PAGE_SIZE] {
        let page_addr = addr & Self::PAGE_MASK;
        self.pages
            .entry(page_addr)
            .or_insert_with(|| Box::new([0u8; Self::PAGE_SIZE]))
    }

    fn get_page(&self, addr: u64) -> Option<&[u8; Self::PAGE_SIZE]> {
        let page_addr = addr & Self::PAGE_MASK;
        self.pages.get(&page_addr).map(|b| b.as_ref())
    }

    /// Write a byte slice to memory.
    pub fn write_bytes(&mut self, addr: u64, data: &[u8]) {
        let mut current_addr = addr;
        let mut remaining = data;

        while !remaining.is_empty() {
            let page = self.get_or_create_page(current_addr);
            let offset = (current_addr & !Self::PAGE_MASK) as usize;
            let to_write = remaining.len().min(Self::PAGE_SIZE - offset);

            page[offset..offset + to_write].copy_from_slice(&remaining[..to_write]);

            current_addr = current_addr.wrapping_add(to_write as u64);
            remaining = &remaining[to_write..];
        }

        self.total_bytes_written += data.len() as u64;
        self.track(addr, data.len(), |r, n| r.bytes_written += n);
    }

    /// Read bytes from memory into a buffer.
    pub fn read_bytes(&mut self, addr: u64, buf: &mut [u8]) {
        let mut current_addr = addr;
        let mut filled = 0;

        while filled < buf.len() {
            let page_offset = (current_addr & !Self::PAGE_MASK) as usize;
            let to_read = (buf.len() - filled).min(Self::PAGE_SIZE - page_offset);
            let dst = &mut buf[filled..filled + to_read];

            match self.get_page(current_addr) {
                Some(page) => dst.copy_from_slice(&page[page_offset..page_offset + to_read]),
                // Unallocated pages read as zero
                None => dst.fill(0),
            }

            current_addr = current_addr.wrapping_add(to_read as u64);
            filled += to_read;
        }

        self.total_bytes_read += buf.len() as u64;
        self.track(addr, buf.len(), |r, n| r.bytes_read += n);
    }

    fn track(&mut self, addr: u64, len: usize, update: impl Fn(&mut MemoryRegion, usize)) {
        if let Some(region) = self.regions.iter_mut().find(|r| r.overlaps(addr, len)) {
            update(region, len);
        }
    }

    /// Write one little-endian 16-bit value.
    #[inline]
    pub fn write_i16(&mut self, addr: u64, value: i16) {
        let mut buf = [0u8; 2];
        LittleEndian::write_i16(&mut buf, value);
        self.write_bytes(addr, &buf);
    }

    /// Read one little-endian 16-bit value.
    #[inline]
    pub fn read_i16(&mut self, addr: u64) -> i16 {
        let mut buf = [0u8; 2];
        self.read_bytes(addr, &mut buf);
        LittleEndian::read_i16(&buf)
    }

    /// Write packed 16-bit values starting at `addr`.
    pub fn write_slice(&mut self, addr: u64, data: &[i16]) {
        let mut bytes = vec![0u8; data.len() * 2];
        LittleEndian::write_i16_into(data, &mut bytes);
        self.write_bytes(addr, &bytes);
    }

    /// Read `count` packed 16-bit values starting at `addr`.
    pub fn read_slice(&mut self, addr: u64, count: usize) -> Vec<i16> {
        let mut bytes = vec![0u8; count * 2];
        self.read_bytes(addr, &mut bytes);
        let mut out = vec![0i16; count];
        LittleEndian::read_i16_into(&bytes, &mut out);
        out
    }

    /// Get total bytes written.
    pub fn total_bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    /// Get total bytes read.
    pub fn total_bytes_read(&self) -> u64 {
        self.total_bytes_read
    }

    /// Get number of allocated pages.
    pub fn allocated_pages(&self) -> usize {
        self.pages.len()
    }

    /// Clear all memory, regions and statistics.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.regions.clear();
        self.total_bytes_written = 0;
        self.total_bytes_read = 0;
    }
}

impl Memory for HostMemory {
    fn load_i16(&mut self, address: u64) -> Result<i16, MemoryError> {
        self.check_mapped(address, 2)?;
        Ok(self.read_i16(address))
    }

    fn store_i16(&mut self, address: u64, value: i16) -> Result<(), MemoryError> {
        self.check_mapped(address, 2)?;
        self.write_i16(address, value);
        Ok(())
    }
}

impl Default for HostMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HostMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostMemory")
            .field("allocated_pages", &self.pages.len())
            .field("regions", &self.regions.len())
            .field("strict", &self.strict)
            .field("total_bytes_written", &self.total_bytes_written)
            .field("total_bytes_read", &self.total_bytes_read)
            .finish()
    }
}
