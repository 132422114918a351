//! Program image loaders.
//!
//! ELF executables are loaded segment by segment with the `object` crate
//! once their byte order, machine and class match the simulated variant;
//! raw images are copied verbatim to a base address that doubles as the
//! entry point.

use std::path::Path;

use object::{Architecture, Object, ObjectSegment};
use thiserror::Error;
use tracing::debug;

use crate::memory::FuncMemory;
use crate::{Address, IsaKind, MemoryFault};

/// Failure to build a memory image from a program file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file is not a well-formed ELF object.
    #[error("malformed ELF image: {0}")]
    Parse(#[from] object::read::Error),
    /// A segment does not fit the address space.
    #[error("segment does not fit: {0}")]
    Memory(#[from] MemoryFault),
    /// The file could not be read.
    #[error("cannot read program image: {0}")]
    Io(#[from] std::io::Error),
    /// The object is big-endian; simulated memory is little-endian.
    #[error("big-endian images are not supported")]
    BigEndian,
    /// The object targets another instruction set.
    #[error("{found:?} image cannot run on {isa}")]
    WrongArchitecture {
        /// Variant the image was loaded for.
        isa: IsaKind,
        /// Machine recorded in the ELF header.
        found: Architecture,
    },
    /// A 64-bit object on a variant with narrower registers.
    #[error("64-bit image cannot run on {isa}")]
    WrongClass {
        /// Variant the image was loaded for.
        isa: IsaKind,
    },
}

fn check_target(file: &object::File<'_>, isa: IsaKind) -> Result<(), LoadError> {
    if !file.is_little_endian() {
        return Err(LoadError::BigEndian);
    }
    let found = file.architecture();
    let family_matches = if isa.is_riscv() {
        matches!(found, Architecture::Riscv32 | Architecture::Riscv64)
    } else {
        matches!(found, Architecture::Mips | Architecture::Mips64)
    };
    if !family_matches {
        return Err(LoadError::WrongArchitecture { isa, found });
    }
    if file.is_64() && isa.xlen() < 64 {
        return Err(LoadError::WrongClass { isa });
    }
    Ok(())
}

/// Builds memory from the loadable segments of an ELF executable for `isa`.
///
/// The entry point becomes the memory's start PC. 32-bit objects get a
/// 32-bit address space, 64-bit objects a 64-bit one.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] for malformed objects,
/// [`LoadError::BigEndian`], [`LoadError::WrongArchitecture`] or
/// [`LoadError::WrongClass`] for objects built for another target, and
/// [`LoadError::Memory`] when a segment leaves the address space.
pub fn load_elf(bytes: &[u8], isa: IsaKind) -> Result<FuncMemory, LoadError> {
    let file = object::File::parse(bytes)?;
    check_target(&file, isa)?;
    let addr_bits = if file.is_64() { 64 } else { 32 };
    let mut memory = FuncMemory::new(addr_bits).with_start_pc(file.entry());

    for segment in file.segments() {
        let data = segment.data()?;
        debug!(
            addr = segment.address(),
            len = data.len(),
            "loading segment"
        );
        memory.write_bytes(segment.address(), data)?;
    }
    Ok(memory)
}

/// Reads and loads an ELF executable for `isa` from `path`.
///
/// # Errors
///
/// Returns [`LoadError::Io`] when the file cannot be read, otherwise the
/// errors of [`load_elf`].
pub fn load_elf_file(path: impl AsRef<Path>, isa: IsaKind) -> Result<FuncMemory, LoadError> {
    let bytes = std::fs::read(path)?;
    load_elf(&bytes, isa)
}

/// Copies a raw image to `base` in an `addr_bits`-wide address space and
/// starts execution there.
///
/// # Errors
///
/// Returns [`LoadError::Memory`] when the image does not fit.
pub fn load_flat(bytes: &[u8], base: Address, addr_bits: u32) -> Result<FuncMemory, LoadError> {
    let mut memory = FuncMemory::new(addr_bits).with_start_pc(base);
    memory.write_bytes(base, bytes)?;
    Ok(memory)
}
