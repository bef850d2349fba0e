//! Error types for the kernel core
//!
//! This module defines [`KernelError`], returned by every fallible operation of the
//! memory manager, the process table and the scheduler.
//!
//! Failures never leave partial state behind: an operation that returns an error
//! has not changed anything. Two conditions are deliberately *not* errors:
//! terminating an already terminated process and freeing an absent pointer.
//! The scheduler finding nothing to run is not an error either; see
//! [`RunOutcome::Idle`](crate::kernel::scheduler::RunOutcome::Idle).

use crate::kernel::process::Pid;
use crate::memory::Address;
use std::fmt;

/// Broad failure classes shared by all subsystems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    ResourceExhausted,
    InvalidState,
    NotFound,
}

/// Errors reported by the kernel core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Allocation of zero bytes
    ZeroSizeAllocation,

    /// Freed address is not the payload of an in-use heap segment
    InvalidFree { address: Address },

    /// Read or write outside a live allocation
    OutOfBounds { address: Address, len: usize },

    /// No entry routine registered under this name
    UnknownEntry { name: String },

    /// Configuration rejected before any subsystem was built
    InvalidConfig { message: String },

    /// Stack region would overflow
    StackOverflow { requested: usize, available: usize },

    /// No free heap segment is large enough
    HeapExhausted { requested: usize },

    /// Every process slot is in use
    ProcessTableFull { capacity: usize },

    /// Operation on a terminated process
    ProcessTerminated { pid: Pid },

    /// Attempt to reach TERMINATED through the generic state transition
    TerminateViaSetState { pid: Pid },

    /// Identifier outside the process table
    InvalidPid { pid: Pid },

    /// Receive with nothing in the mailbox
    NoPendingMessage { pid: Pid },
}

pub type KernelResult<T> = Result<T, KernelError>;

impl KernelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KernelError::ZeroSizeAllocation
            | KernelError::InvalidFree { .. }
            | KernelError::OutOfBounds { .. }
            | KernelError::UnknownEntry { .. }
            | KernelError::InvalidConfig { .. } => ErrorKind::InvalidArgument,
            KernelError::StackOverflow { .. }
            | KernelError::HeapExhausted { .. }
            | KernelError::ProcessTableFull { .. } => ErrorKind::ResourceExhausted,
            KernelError::ProcessTerminated { .. } | KernelError::TerminateViaSetState { .. } => {
                ErrorKind::InvalidState
            }
            KernelError::InvalidPid { .. } | KernelError::NoPendingMessage { .. } => {
                ErrorKind::NotFound
            }
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::ZeroSizeAllocation => write!(f, "Allocation size must be non-zero"),
            KernelError::InvalidFree { address } => {
                write!(f, "Invalid free: 0x{:08x} is not an allocated block", address)
            }
            KernelError::OutOfBounds { address, len } => {
                write!(
                    f,
                    "Access of {} byte{} at 0x{:08x} is outside any live allocation",
                    len,
                    if *len == 1 { "" } else { "s" },
                    address
                )
            }
            KernelError::UnknownEntry { name } => {
                write!(f, "No entry routine registered as '{}'", name)
            }
            KernelError::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
            KernelError::StackOverflow {
                requested,
                available,
            } => {
                write!(
                    f,
                    "Stack overflow: requested {} bytes, {} available",
                    requested, available
                )
            }
            KernelError::HeapExhausted { requested } => {
                write!(f, "Heap exhausted: no free segment holds {} bytes", requested)
            }
            KernelError::ProcessTableFull { capacity } => {
                write!(f, "Process table full ({} slots in use)", capacity)
            }
            KernelError::ProcessTerminated { pid } => {
                write!(f, "Process {} is terminated", pid)
            }
            KernelError::TerminateViaSetState { pid } => {
                write!(
                    f,
                    "Process {} can only be terminated through terminate()",
                    pid
                )
            }
            KernelError::InvalidPid { pid } => write!(f, "Invalid process id {}", pid),
            KernelError::NoPendingMessage { pid } => {
                write!(f, "No message pending for process {}", pid)
            }
        }
    }
}

impl std::error::Error for KernelError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(KernelError::ZeroSizeAllocation.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            KernelError::ProcessTableFull { capacity: 16 }.kind(),
            ErrorKind::ResourceExhausted
        );
        assert_eq!(
            KernelError::TerminateViaSetState { pid: 3 }.kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(KernelError::NoPendingMessage { pid: 1 }.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn display_mentions_the_address() {
        let err = KernelError::InvalidFree {
            address: 0x1000_000c,
        };
        assert_eq!(
            err.to_string(),
            "Invalid free: 0x1000000c is not an allocated block"
        );
    }
}
