// Integration tests for process lifecycle and mailboxes

use kacchi::config::KernelConfig;
use kacchi::kernel::constants::MAX_PROCS;
use kacchi::kernel::errors::{ErrorKind, KernelError};
use kacchi::kernel::process::{Mailbox, ProcessState};
use kacchi::kernel::Kernel;

fn kernel() -> Kernel {
    kernel_with(KernelConfig::default())
}

fn kernel_with(config: KernelConfig) -> Kernel {
    let mut kernel = Kernel::new(config).unwrap();
    kernel.register_entry("noop", |_: &mut Kernel| {});
    kernel
}

#[test]
fn test_create_gives_a_new_process_with_a_stack_block() {
    let mut kernel = kernel();
    let pid = kernel.spawn("noop").unwrap();
    assert_eq!(pid, 0);
    assert_eq!(kernel.get_state(pid), ProcessState::New);

    let record = kernel.processes().get_record(pid).unwrap();
    let base = record.stack_base().unwrap();
    assert_eq!(record.stack_size(), 4096);
    assert!(record.entry().is_some());
    assert!(!record.mailbox().is_pending());
    assert_eq!(kernel.memory().heap().block_size(base), Some(4096));

    let sp = record.initial_stack_pointer().unwrap();
    assert_eq!(sp % 16, 0);
    assert!(sp > base && sp <= base + 4096);
}

#[test]
fn test_lowest_free_slot_is_used() {
    let mut kernel = kernel();
    let pids: Vec<_> = (0..3).map(|_| kernel.spawn("noop").unwrap()).collect();
    assert_eq!(pids, vec![0, 1, 2]);

    kernel.terminate(1).unwrap();
    assert_eq!(kernel.spawn("noop").unwrap(), 1);
}

#[test]
fn test_table_exhaustion_changes_nothing() {
    let mut kernel = kernel();
    for expected in 0..MAX_PROCS {
        assert_eq!(kernel.spawn("noop").unwrap(), expected);
    }
    let used = kernel.memory().heap().used_bytes();

    let err = kernel.spawn("noop").unwrap_err();
    assert_eq!(err, KernelError::ProcessTableFull { capacity: MAX_PROCS });
    assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
    assert_eq!(kernel.processes().live_count(), MAX_PROCS);
    assert_eq!(kernel.memory().heap().used_bytes(), used);
}

#[test]
fn test_stack_allocation_failure_propagates() {
    // Room for exactly one process stack
    let mut kernel = kernel_with(KernelConfig::default().with_heap_bytes(8192));
    let first = kernel.spawn("noop").unwrap();

    let err = kernel.spawn("noop").unwrap_err();
    assert!(matches!(err, KernelError::HeapExhausted { .. }));
    assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
    assert_eq!(kernel.processes().live_count(), 1);
    assert_eq!(kernel.get_state(1), ProcessState::Terminated);

    kernel.terminate(first).unwrap();
    assert!(kernel.spawn("noop").is_ok());
}

#[test]
fn test_terminate_releases_the_stack_and_is_idempotent() {
    let mut kernel = kernel();
    let pid = kernel.spawn("noop").unwrap();
    let base = kernel.processes().get_record(pid).unwrap().stack_base().unwrap();

    kernel.terminate(pid).unwrap();
    assert_eq!(kernel.get_state(pid), ProcessState::Terminated);
    assert!(!kernel.is_alive(pid));
    assert!(kernel.processes().get_record(pid).is_none());
    assert!(!kernel.memory().heap().is_allocated(base));
    assert_eq!(kernel.memory().heap().segment_count(), 1);

    assert!(kernel.terminate(pid).is_ok());
    assert_eq!(kernel.memory().heap().segment_count(), 1);
}

#[test]
fn test_set_state_cannot_terminate() {
    let mut kernel = kernel();
    let pid = kernel.spawn("noop").unwrap();
    kernel.set_state(pid, ProcessState::Ready).unwrap();

    let err = kernel.set_state(pid, ProcessState::Terminated).unwrap_err();
    assert_eq!(err, KernelError::TerminateViaSetState { pid });
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(kernel.get_state(pid), ProcessState::Ready);
}

#[test]
fn test_terminated_slots_reject_state_changes() {
    let mut kernel = kernel();
    let err = kernel.set_state(3, ProcessState::Ready).unwrap_err();
    assert_eq!(err, KernelError::ProcessTerminated { pid: 3 });
    assert_eq!(kernel.get_state(3), ProcessState::Terminated);
}

#[test]
fn test_invalid_identifiers() {
    let mut kernel = kernel();
    assert_eq!(kernel.get_state(MAX_PROCS), ProcessState::Terminated);
    assert!(!kernel.is_alive(usize::MAX));
    assert_eq!(
        kernel.set_state(MAX_PROCS, ProcessState::Ready),
        Err(KernelError::InvalidPid { pid: MAX_PROCS })
    );
    assert_eq!(
        kernel.terminate(MAX_PROCS),
        Err(KernelError::InvalidPid { pid: MAX_PROCS })
    );
    assert!(kernel.send(MAX_PROCS, b"x").is_err());
    assert!(kernel.recv(MAX_PROCS).is_err());
}

#[test]
fn test_unknown_entry_is_rejected() {
    let mut kernel = kernel();
    let err = kernel.spawn("missing").unwrap_err();
    assert_eq!(
        err,
        KernelError::UnknownEntry {
            name: "missing".to_string()
        }
    );
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(kernel.processes().live_count(), 0);
    assert_eq!(kernel.memory().heap().used_bytes(), 0);
}

#[test]
fn test_message_is_received_once() {
    let mut kernel = kernel();
    let pid = kernel.spawn("noop").unwrap();

    kernel.send(pid, b"hi").unwrap();
    assert!(kernel.processes().get_record(pid).unwrap().mailbox().is_pending());
    assert_eq!(kernel.recv(pid).unwrap(), b"hi");

    let err = kernel.recv(pid).unwrap_err();
    assert_eq!(err, KernelError::NoPendingMessage { pid });
}

#[test]
fn test_later_message_overwrites_unread_one() {
    let mut kernel = kernel();
    let pid = kernel.spawn("noop").unwrap();
    kernel.send(pid, b"a").unwrap();
    kernel.send(pid, b"b").unwrap();
    assert_eq!(kernel.recv(pid).unwrap(), b"b");
}

#[test]
fn test_long_messages_are_truncated() {
    let mut kernel = kernel();
    let pid = kernel.spawn("noop").unwrap();
    let long = [b'z'; 40];
    kernel.send(pid, &long).unwrap();
    assert_eq!(kernel.recv(pid).unwrap().len(), Mailbox::MAX_MESSAGE);

    kernel.send(pid, b"hello").unwrap();
    let mut out = [0u8; 3];
    let len = kernel.recv_into(pid, &mut out).unwrap();
    assert_eq!(&out[..len], b"hel");
}

#[test]
fn test_send_to_terminated_process_fails() {
    let mut kernel = kernel();
    let pid = kernel.spawn("noop").unwrap();
    kernel.terminate(pid).unwrap();
    let err = kernel.send(pid, b"late").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_mailbox_does_not_survive_slot_reuse() {
    let mut kernel = kernel();
    let pid = kernel.spawn("noop").unwrap();
    kernel.send(pid, b"stale").unwrap();
    kernel.terminate(pid).unwrap();

    assert_eq!(kernel.spawn("noop").unwrap(), pid);
    assert!(kernel.recv(pid).is_err());
}

#[test]
fn test_empty_message_counts_as_pending() {
    let mut kernel = kernel();
    let pid = kernel.spawn("noop").unwrap();
    kernel.send(pid, b"").unwrap();
    assert_eq!(kernel.recv(pid).unwrap(), b"");
}
