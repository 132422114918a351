//! Sparse functional memory.
//!
//! The address space is split into fixed-size pages that are allocated on
//! first write. Reads from pages that were never written return zero, so a
//! program image only costs the pages it actually touches.

use std::collections::HashMap;

use super::{validate_access_width, validate_range, Memory};
use crate::{Address, MemoryFault};

/// Number of address bits covered by one page.
pub const PAGE_BITS: u32 = 12;
/// Size of one page in bytes.
pub const PAGE_SIZE: usize = 1 << PAGE_BITS;

const PAGE_OFFSET_MASK: Address = (PAGE_SIZE as Address) - 1;

type Page = Box<[u8; PAGE_SIZE]>;

/// Sparse little-endian memory bounded by an address width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncMemory {
    addr_bits: u32,
    start_pc: Address,
    pages: HashMap<Address, Page>,
}

impl Default for FuncMemory {
    fn default() -> Self {
        Self::new(32)
    }
}

impl FuncMemory {
    /// Creates an empty memory covering `2^addr_bits` bytes (clamped to `1..=64`).
    #[must_use]
    pub fn new(addr_bits: u32) -> Self {
        Self {
            addr_bits: addr_bits.clamp(1, 64),
            start_pc: 0,
            pages: HashMap::new(),
        }
    }

    /// Sets the entry point, builder style.
    #[must_use]
    pub const fn with_start_pc(mut self, start_pc: Address) -> Self {
        self.start_pc = start_pc;
        self
    }

    /// Sets the entry point.
    pub const fn set_start_pc(&mut self, start_pc: Address) {
        self.start_pc = start_pc;
    }

    /// Width of the address space in bits.
    #[must_use]
    pub const fn addr_bits(&self) -> u32 {
        self.addr_bits
    }

    /// Number of pages currently backed by storage.
    #[must_use]
    pub fn allocated_pages(&self) -> usize {
        self.pages.len()
    }

    /// Copies `bytes` into memory starting at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryFault::OutOfRange`] when the range leaves the address
    /// space; nothing is written in that case.
    pub fn write_bytes(&mut self, addr: Address, bytes: &[u8]) -> Result<(), MemoryFault> {
        validate_range(addr, bytes.len(), self.addr_bits)?;
        for (offset, byte) in (0_u64..).zip(bytes) {
            self.write_byte(addr + offset, *byte);
        }
        Ok(())
    }

    /// Reads `len` bytes starting at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryFault::OutOfRange`] when the range leaves the address
    /// space.
    pub fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryFault> {
        validate_range(addr, len, self.addr_bits)?;
        Ok((0_u64..len as u64)
            .map(|offset| self.read_byte(addr + offset))
            .collect())
    }

    /// Stores 32-bit instruction words back to back starting at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryFault::OutOfRange`] when the words do not fit.
    pub fn write_words(&mut self, addr: Address, words: &[u32]) -> Result<(), MemoryFault> {
        let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
        self.write_bytes(addr, &bytes)
    }

    fn read_byte(&self, addr: Address) -> u8 {
        self.pages
            .get(&(addr >> PAGE_BITS))
            .map_or(0, |page| page[page_offset(addr)])
    }

    fn write_byte(&mut self, addr: Address, value: u8) {
        let page = self
            .pages
            .entry(addr >> PAGE_BITS)
            .or_insert_with(|| Box::new([0; PAGE_SIZE]));
        page[page_offset(addr)] = value;
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn page_offset(addr: Address) -> usize {
    (addr & PAGE_OFFSET_MASK) as usize
}

impl Memory for FuncMemory {
    fn start_pc(&self) -> Address {
        self.start_pc
    }

    fn read(&self, addr: Address, size: usize) -> Result<u64, MemoryFault> {
        validate_access_width(size)?;
        validate_range(addr, size, self.addr_bits)?;
        let mut value = 0_u64;
        for offset in (0..size as u64).rev() {
            value = (value << 8) | u64::from(self.read_byte(addr + offset));
        }
        Ok(value)
    }

    fn write(&mut self, addr: Address, size: usize, value: u64) -> Result<(), MemoryFault> {
        validate_access_width(size)?;
        let bytes = value.to_le_bytes();
        self.write_bytes(addr, &bytes[..size])
    }
}
