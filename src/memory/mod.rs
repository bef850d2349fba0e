//! Memory manager for the kernel core
//!
//! This module owns the two fixed-size backing regions:
//! - [`stack`]: a bump-allocated region with a single high-water mark
//! - [`heap`]: a best-fit, splitting, coalescing segment allocator
//!
//! # Address Space
//!
//! Both regions hand out plain [`Address`] values in disjoint ranges:
//! ```text
//! STACK_ADDRESS_START (0x00001000) .. + stack capacity
//! HEAP_ADDRESS_START  (0x10000000) .. + heap capacity
//! ```
//!
//! The memory manager has no knowledge of processes. Process stack blocks are
//! ordinary heap allocations whose release is the process table's job.

pub mod heap;
pub mod stack;

use crate::config::KernelConfig;
use crate::kernel::errors::KernelResult;
use heap::Heap;
use stack::StackRegion;

/// Memory address type (64-bit)
pub type Address = u64;

/// Owner of the stack region and the heap region
#[derive(Debug, Clone)]
pub struct MemoryManager {
    stack: StackRegion,
    heap: Heap,
}

impl MemoryManager {
    pub fn new(config: &KernelConfig) -> Self {
        MemoryManager {
            stack: StackRegion::new(config.stack_bytes),
            heap: Heap::new(config.heap_bytes),
        }
    }

    /// Reset the stack mark and reinstall one free heap segment
    pub fn init(&mut self) {
        self.stack.init();
        self.heap.init();
    }

    pub fn stack_alloc(&mut self, size: usize) -> KernelResult<Address> {
        self.stack.alloc(size)
    }

    /// Release `size` bytes from the top of the stack region
    ///
    /// Sizes must mirror earlier allocations in reverse order; this is not checked.
    pub fn stack_free(&mut self, size: usize) {
        self.stack.free(size)
    }

    pub fn heap_alloc(&mut self, size: usize) -> KernelResult<Address> {
        self.heap.alloc(size)
    }

    pub fn heap_free(&mut self, ptr: Option<Address>) -> KernelResult<()> {
        self.heap.free(ptr)
    }

    pub fn stack(&self) -> &StackRegion {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut StackRegion {
        &mut self.stack
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }
}
