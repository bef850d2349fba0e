//! Kernel configuration
//!
//! Region sizes are fixed for the lifetime of a [`Kernel`](crate::kernel::Kernel);
//! changing them means building a new kernel.

use crate::kernel::constants::{
    DEFAULT_CONSOLE_LINES, DEFAULT_HEAP_BYTES, DEFAULT_STACK_BYTES, HEAP_ALIGN, MIN_SPLIT_PAYLOAD,
    PROC_STACK_SIZE, SEGMENT_HEADER_SIZE,
};
use crate::kernel::errors::{KernelError, KernelResult};

/// Sizes of the fixed regions and buffers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelConfig {
    /// Capacity of the stack region in bytes
    pub stack_bytes: usize,
    /// Capacity of the heap region in bytes, headers included
    pub heap_bytes: usize,
    /// Size of the stack block every process owns
    pub proc_stack_size: usize,
    /// Console lines kept before the oldest are dropped
    pub console_lines: usize,
}

impl KernelConfig {
    pub fn with_stack_bytes(mut self, bytes: usize) -> Self {
        self.stack_bytes = bytes;
        self
    }

    pub fn with_heap_bytes(mut self, bytes: usize) -> Self {
        self.heap_bytes = bytes;
        self
    }

    pub fn with_proc_stack_size(mut self, bytes: usize) -> Self {
        self.proc_stack_size = bytes;
        self
    }

    pub fn with_console_lines(mut self, lines: usize) -> Self {
        self.console_lines = lines;
        self
    }

    /// Reject sizes the allocators cannot work with
    pub fn validate(&self) -> KernelResult<()> {
        let invalid = |message: String| Err(KernelError::InvalidConfig { message });

        if self.stack_bytes == 0 {
            return invalid("stack region must not be empty".to_string());
        }
        if self.heap_bytes < SEGMENT_HEADER_SIZE + MIN_SPLIT_PAYLOAD {
            return invalid(format!(
                "heap region of {} bytes cannot hold a single segment (minimum {})",
                self.heap_bytes,
                SEGMENT_HEADER_SIZE + MIN_SPLIT_PAYLOAD
            ));
        }
        if self.heap_bytes % HEAP_ALIGN != 0 {
            return invalid(format!(
                "heap size {} is not a multiple of {}",
                self.heap_bytes, HEAP_ALIGN
            ));
        }
        if self.proc_stack_size == 0 {
            return invalid("process stack size must not be zero".to_string());
        }
        if self.console_lines == 0 {
            return invalid("console must keep at least one line".to_string());
        }
        Ok(())
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            stack_bytes: DEFAULT_STACK_BYTES,
            heap_bytes: DEFAULT_HEAP_BYTES,
            proc_stack_size: PROC_STACK_SIZE,
            console_lines: DEFAULT_CONSOLE_LINES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(KernelConfig::default().validate().is_ok());
    }

    #[test]
    fn default_heap_fits_a_full_process_table() {
        let config = KernelConfig::default();
        let per_process = config.proc_stack_size + SEGMENT_HEADER_SIZE;
        assert!(config.heap_bytes >= crate::kernel::constants::MAX_PROCS * per_process);
    }

    #[test]
    fn tiny_or_unaligned_heaps_are_rejected() {
        assert!(KernelConfig::default().with_heap_bytes(8).validate().is_err());
        assert!(KernelConfig::default().with_heap_bytes(1022).validate().is_err());
        assert!(KernelConfig::default().with_stack_bytes(0).validate().is_err());
    }
}
