// Constants for the kernel core

/// Starting address of the heap region
/// Heap addresses start at 0x10000000 to clearly distinguish them from stack addresses
pub const HEAP_ADDRESS_START: u64 = 0x1000_0000;

/// Starting address of the stack region
pub const STACK_ADDRESS_START: u64 = 0x0000_1000;

/// Bytes occupied by a heap segment header (32-bit length, free flag and link)
pub const SEGMENT_HEADER_SIZE: usize = 12;

/// Smallest payload a split-off segment may carry
pub const MIN_SPLIT_PAYLOAD: usize = 4;

/// Heap requests are rounded up to this boundary
pub const HEAP_ALIGN: usize = 4;

/// Initial stack pointers are rounded down to this boundary
pub const STACK_POINTER_ALIGN: u64 = 16;

/// Number of slots in the process table
pub const MAX_PROCS: usize = 16;

/// Default size of the stack block each process owns
pub const PROC_STACK_SIZE: usize = 4096;

/// Mailbox buffer size; one byte is reserved, so a message holds at most 31 bytes
pub const MAILBOX_CAPACITY: usize = 32;

/// Default size of the stack region
pub const DEFAULT_STACK_BYTES: usize = 4096;

/// Default size of the heap region, large enough for a full table of process stacks
pub const DEFAULT_HEAP_BYTES: usize = 128 * 1024;

/// Default number of console lines kept before the oldest are dropped
pub const DEFAULT_CONSOLE_LINES: usize = 500;

pub const VERSION: &str = "kacchiOS v0.1.0";
