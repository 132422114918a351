//! Access legality policy shared by memory implementations.

use crate::{Address, MemoryFault};

/// Access widths, in bytes, that instructions may request.
pub const SUPPORTED_ACCESS_WIDTHS: [usize; 4] = [1, 2, 4, 8];

/// Validates that `size` is a supported access width.
///
/// # Errors
///
/// Returns [`MemoryFault::UnsupportedWidth`] for any width outside
/// [`SUPPORTED_ACCESS_WIDTHS`].
pub const fn validate_access_width(size: usize) -> Result<(), MemoryFault> {
    match size {
        1 | 2 | 4 | 8 => Ok(()),
        _ => Err(MemoryFault::UnsupportedWidth { size }),
    }
}

/// Validates that `size` bytes starting at `addr` fit in an address space of
/// `addr_bits` bits. Accesses never wrap around the top of the space.
///
/// # Errors
///
/// Returns [`MemoryFault::OutOfRange`] when the last byte lies outside the
/// address space.
pub const fn validate_range(addr: Address, size: usize, addr_bits: u32) -> Result<(), MemoryFault> {
    let fault = MemoryFault::OutOfRange { addr, size };
    if size == 0 {
        return Ok(());
    }
    let Some(last) = addr.checked_add(size as u64 - 1) else {
        return Err(fault);
    };
    if addr_bits < 64 && (last >> addr_bits) != 0 {
        return Err(fault);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_access_width, validate_range, SUPPORTED_ACCESS_WIDTHS};
    use crate::MemoryFault;

    #[test]
    fn supported_widths_are_accepted() {
        for size in SUPPORTED_ACCESS_WIDTHS {
            assert_eq!(validate_access_width(size), Ok(()));
        }
        assert_eq!(
            validate_access_width(3),
            Err(MemoryFault::UnsupportedWidth { size: 3 })
        );
        assert_eq!(
            validate_access_width(16),
            Err(MemoryFault::UnsupportedWidth { size: 16 })
        );
    }

    #[test]
    fn range_check_rejects_accesses_crossing_the_top() {
        assert_eq!(validate_range(0xFFFF_FFFC, 4, 32), Ok(()));
        assert_eq!(
            validate_range(0xFFFF_FFFD, 4, 32),
            Err(MemoryFault::OutOfRange {
                addr: 0xFFFF_FFFD,
                size: 4
            })
        );
        assert_eq!(validate_range(u64::MAX - 7, 8, 64), Ok(()));
        assert!(validate_range(u64::MAX, 2, 64).is_err());
    }
}
