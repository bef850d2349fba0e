//! Bump-style stack region
//!
//! The stack region is a fixed byte array with a single high-water mark. There is
//! no per-allocation metadata: callers must free exactly the sizes they allocated,
//! in reverse order. A mismatched free silently moves the mark to a wrong place;
//! nothing detects it.
//!
//! ```text
//! STACK_ADDRESS_START                          capacity
//! |<------------ in use ----------->|<---- free ---->|
//!                                   ^ mark
//! ```

use super::Address;
use crate::kernel::constants::STACK_ADDRESS_START;
use crate::kernel::errors::{KernelError, KernelResult};

/// The stack region and its high-water mark
#[derive(Debug, Clone)]
pub struct StackRegion {
    data: Box<[u8]>,
    mark: usize,
}

impl StackRegion {
    pub fn new(capacity: usize) -> Self {
        StackRegion {
            data: vec![0; capacity].into_boxed_slice(),
            mark: 0,
        }
    }

    /// Reset the mark to zero
    pub fn init(&mut self) {
        self.mark = 0;
    }

    /// Reserve `size` bytes at the current mark
    pub fn alloc(&mut self, size: usize) -> KernelResult<Address> {
        if size == 0 {
            return Err(KernelError::ZeroSizeAllocation);
        }

        let available = self.available();
        if size > available {
            return Err(KernelError::StackOverflow {
                requested: size,
                available,
            });
        }

        let addr = STACK_ADDRESS_START + self.mark as u64;
        self.mark += size;
        Ok(addr)
    }

    /// Release `size` bytes from the top; over-release clamps the mark to zero
    pub fn free(&mut self, size: usize) {
        if size >= self.mark {
            self.mark = 0;
        } else {
            self.mark -= size;
        }
    }

    /// Bytes currently in use
    pub fn mark(&self) -> usize {
        self.mark
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn available(&self) -> usize {
        self.capacity() - self.mark
    }

    /// Write bytes below the mark
    pub fn write_bytes(&mut self, addr: Address, bytes: &[u8]) -> KernelResult<()> {
        let offset = self.checked_offset(addr, bytes.len())?;
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Read bytes below the mark
    pub fn read_bytes(&self, addr: Address, len: usize) -> KernelResult<&[u8]> {
        let offset = self.checked_offset(addr, len)?;
        Ok(&self.data[offset..offset + len])
    }

    fn checked_offset(&self, addr: Address, len: usize) -> KernelResult<usize> {
        let out_of_bounds = KernelError::OutOfBounds { address: addr, len };
        let offset = addr
            .checked_sub(STACK_ADDRESS_START)
            .ok_or_else(|| out_of_bounds.clone())? as usize;
        match offset.checked_add(len) {
            Some(end) if end <= self.mark => Ok(offset),
            _ => Err(out_of_bounds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_contiguous() {
        let mut stack = StackRegion::new(64);
        let a = stack.alloc(10).unwrap();
        let b = stack.alloc(6).unwrap();
        assert_eq!(a, STACK_ADDRESS_START);
        assert_eq!(b, STACK_ADDRESS_START + 10);
        assert_eq!(stack.mark(), 16);
    }

    #[test]
    fn over_release_clamps_to_zero() {
        let mut stack = StackRegion::new(64);
        stack.alloc(8).unwrap();
        stack.free(100);
        assert_eq!(stack.mark(), 0);
    }

    #[test]
    fn exact_fill_is_allowed() {
        let mut stack = StackRegion::new(32);
        assert!(stack.alloc(32).is_ok());
        assert_eq!(stack.available(), 0);
        assert!(matches!(
            stack.alloc(1),
            Err(KernelError::StackOverflow { requested: 1, available: 0 })
        ));
    }

    #[test]
    fn bytes_above_the_mark_are_unreachable() {
        let mut stack = StackRegion::new(32);
        let addr = stack.alloc(4).unwrap();
        stack.write_bytes(addr, &[1, 2, 3, 4]).unwrap();
        assert_eq!(stack.read_bytes(addr, 4).unwrap(), &[1, 2, 3, 4]);
        assert!(stack.write_bytes(addr + 2, &[0; 4]).is_err());
        stack.free(4);
        assert!(stack.read_bytes(addr, 1).is_err());
    }
}
