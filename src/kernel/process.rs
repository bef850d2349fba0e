//! Process table and per-process mailboxes
//!
//! The table is a fixed array of [`MAX_PROCS`] control blocks; a slot's index is
//! the process identifier. A slot is free exactly when its state is
//! [`ProcessState::Terminated`], and a terminated slot carries no stack block, no
//! entry routine and no pending message, so it can be reused immediately.
//!
//! Once a process is terminated its identifier may be handed to the next
//! [`ProcessTable::create`] call. Every creation also stamps the slot with a
//! fresh generation, so code inside the kernel that holds an identifier across a
//! call it does not control can tell whether the slot still holds the same process.
//!
//! # Stack ownership
//!
//! Each live process owns one heap block of `proc_stack_size` bytes. It is
//! allocated by [`ProcessTable::create`] and released only by
//! [`ProcessTable::terminate`]; [`ProcessTable::set_state`] refuses to reach
//! `Terminated` so that release always goes through one path.

use super::constants::{MAILBOX_CAPACITY, MAX_PROCS, STACK_POINTER_ALIGN};
use super::errors::{KernelError, KernelResult};
use super::Kernel;
use crate::memory::{Address, MemoryManager};
use log::debug;
use std::fmt;
use std::rc::Rc;

/// Process identifier (index into the table)
pub type Pid = usize;

/// Lifecycle state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Terminated, // Free slot
    New,
    Ready,
    Running,
    Blocked,  // Reserved, nothing transitions here yet
    Sleeping, // Reserved, nothing transitions here yet
}

impl ProcessState {
    pub fn name(self) -> &'static str {
        match self {
            ProcessState::Terminated => "TERMINATED",
            ProcessState::New => "NEW",
            ProcessState::Ready => "READY",
            ProcessState::Running => "RUNNING",
            ProcessState::Blocked => "BLOCKED",
            ProcessState::Sleeping => "SLEEPING",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A routine a process runs when dispatched
///
/// The routine receives the kernel it runs on instead of reaching for global
/// state. It runs to completion; the scheduler terminates the process as soon as
/// it returns.
pub trait EntryRoutine {
    fn run(&self, kernel: &mut Kernel);
}

impl<F> EntryRoutine for F
where
    F: Fn(&mut Kernel),
{
    fn run(&self, kernel: &mut Kernel) {
        self(kernel)
    }
}

/// Shared handle to an entry routine; the table never owns the routine itself
pub type Entry = Rc<dyn EntryRoutine>;

/// Single-slot message holder; a new send overwrites an unread message
#[derive(Debug, Clone)]
pub struct Mailbox {
    buf: [u8; MAILBOX_CAPACITY],
    len: usize,
    pending: bool,
}

impl Mailbox {
    /// Longest message a mailbox stores
    pub const MAX_MESSAGE: usize = MAILBOX_CAPACITY - 1;

    fn new() -> Self {
        Mailbox {
            buf: [0; MAILBOX_CAPACITY],
            len: 0,
            pending: false,
        }
    }

    fn store(&mut self, message: &[u8]) {
        let len = message.len().min(Self::MAX_MESSAGE);
        self.buf[..len].copy_from_slice(&message[..len]);
        self.len = len;
        self.pending = true;
    }

    fn take(&mut self) -> Option<&[u8]> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        Some(&self.buf[..self.len])
    }

    fn clear(&mut self) {
        self.len = 0;
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// The unread message, if any, without consuming it
    pub fn peek(&self) -> Option<&[u8]> {
        self.pending.then(|| &self.buf[..self.len])
    }
}

/// Process control block
#[derive(Clone)]
pub struct ProcessControlBlock {
    pid: Pid,
    state: ProcessState,
    entry: Option<Entry>,
    stack_base: Option<Address>,
    stack_size: usize,
    // Placeholder for a future context switch; the run-to-completion scheduler never reads it
    initial_stack_pointer: Option<Address>,
    mailbox: Mailbox,
    age: u32,
    generation: u64,
}

impl ProcessControlBlock {
    fn empty(pid: Pid) -> Self {
        ProcessControlBlock {
            pid,
            state: ProcessState::Terminated,
            entry: None,
            stack_base: None,
            stack_size: 0,
            initial_stack_pointer: None,
            mailbox: Mailbox::new(),
            age: 0,
            generation: 0,
        }
    }

    fn reset(&mut self) {
        self.state = ProcessState::Terminated;
        self.entry = None;
        self.stack_base = None;
        self.stack_size = 0;
        self.initial_stack_pointer = None;
        self.mailbox.clear();
        self.age = 0;
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn entry(&self) -> Option<&Entry> {
        self.entry.as_ref()
    }

    pub fn stack_base(&self) -> Option<Address> {
        self.stack_base
    }

    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    pub fn initial_stack_pointer(&self) -> Option<Address> {
        self.initial_stack_pointer
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn age(&self) -> u32 {
        self.age
    }
}

impl fmt::Debug for ProcessControlBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessControlBlock")
            .field("pid", &self.pid)
            .field("state", &self.state)
            .field("entry", &self.entry.is_some())
            .field("stack_base", &self.stack_base)
            .field("stack_size", &self.stack_size)
            .field("initial_stack_pointer", &self.initial_stack_pointer)
            .field("mailbox", &self.mailbox)
            .field("age", &self.age)
            .field("generation", &self.generation)
            .finish()
    }
}

/// The fixed process table
#[derive(Debug, Clone)]
pub struct ProcessTable {
    slots: [ProcessControlBlock; MAX_PROCS],
    proc_stack_size: usize,
    generations: u64,
}

impl ProcessTable {
    pub fn new(proc_stack_size: usize) -> Self {
        ProcessTable {
            slots: std::array::from_fn(ProcessControlBlock::empty),
            proc_stack_size,
            generations: 0,
        }
    }

    /// Reset every slot to a cleared, terminated record
    ///
    /// Stack blocks are not released; pair this with a memory re-init.
    pub fn init(&mut self) {
        for slot in &mut self.slots {
            slot.reset();
        }
    }

    /// Create a process in the lowest free slot and give it a stack block
    pub fn create(&mut self, memory: &mut MemoryManager, entry: Entry) -> KernelResult<Pid> {
        let pid = self
            .slots
            .iter()
            .position(|slot| slot.state == ProcessState::Terminated)
            .ok_or(KernelError::ProcessTableFull {
                capacity: MAX_PROCS,
            })?;

        let base = memory.heap_alloc(self.proc_stack_size)?;
        let top = base + self.proc_stack_size as u64;
        self.generations += 1;

        let slot = &mut self.slots[pid];
        slot.entry = Some(entry);
        slot.stack_base = Some(base);
        slot.stack_size = self.proc_stack_size;
        slot.initial_stack_pointer = Some(top & !(STACK_POINTER_ALIGN - 1));
        slot.mailbox.clear();
        slot.age = 0;
        slot.generation = self.generations;
        slot.state = ProcessState::New;

        debug!("process {} created, stack at {:#010x}", pid, base);
        Ok(pid)
    }

    /// Move a live process to any state except `Terminated`
    pub fn set_state(&mut self, pid: Pid, new_state: ProcessState) -> KernelResult<()> {
        let slot = self.live_slot_mut(pid)?;
        if new_state == ProcessState::Terminated {
            return Err(KernelError::TerminateViaSetState { pid });
        }
        slot.state = new_state;
        Ok(())
    }

    /// Release the stack block and reset the slot; terminating twice is a no-op
    pub fn terminate(&mut self, memory: &mut MemoryManager, pid: Pid) -> KernelResult<()> {
        let slot = self
            .slots
            .get_mut(pid)
            .ok_or(KernelError::InvalidPid { pid })?;
        if slot.state == ProcessState::Terminated {
            return Ok(());
        }

        memory.heap_free(slot.stack_base)?;
        slot.reset();

        debug!("process {} terminated", pid);
        Ok(())
    }

    /// The record of a live process; terminated slots are not readable
    pub fn get_record(&self, pid: Pid) -> Option<&ProcessControlBlock> {
        self.slots
            .get(pid)
            .filter(|slot| slot.state != ProcessState::Terminated)
    }

    /// State of a slot; invalid identifiers read as `Terminated`
    pub fn get_state(&self, pid: Pid) -> ProcessState {
        self.slots
            .get(pid)
            .map_or(ProcessState::Terminated, |slot| slot.state)
    }

    pub fn is_alive(&self, pid: Pid) -> bool {
        self.get_state(pid) != ProcessState::Terminated
    }

    /// Store a message in a live process's mailbox, truncated to 31 bytes
    pub fn send(&mut self, dst: Pid, message: &[u8]) -> KernelResult<()> {
        let slot = self.live_slot_mut(dst)?;
        slot.mailbox.store(message);
        Ok(())
    }

    /// Consume the pending message
    pub fn recv(&mut self, pid: Pid) -> KernelResult<Vec<u8>> {
        let slot = self
            .slots
            .get_mut(pid)
            .ok_or(KernelError::InvalidPid { pid })?;
        slot.mailbox
            .take()
            .map(<[u8]>::to_vec)
            .ok_or(KernelError::NoPendingMessage { pid })
    }

    /// Consume the pending message into `out`, truncating to its length
    pub fn recv_into(&mut self, pid: Pid, out: &mut [u8]) -> KernelResult<usize> {
        let message = self.recv(pid)?;
        let len = message.len().min(out.len());
        out[..len].copy_from_slice(&message[..len]);
        Ok(len)
    }

    /// Records of every live process, in identifier order
    pub fn records(&self) -> impl Iterator<Item = &ProcessControlBlock> {
        self.slots
            .iter()
            .filter(|slot| slot.state != ProcessState::Terminated)
    }

    pub fn live_count(&self) -> usize {
        self.records().count()
    }

    /// Whether `addr` is the stack block of some live process
    pub fn owns_stack(&self, addr: Address) -> bool {
        self.records().any(|slot| slot.stack_base == Some(addr))
    }

    pub fn capacity(&self) -> usize {
        MAX_PROCS
    }

    pub fn proc_stack_size(&self) -> usize {
        self.proc_stack_size
    }

    /// Creation stamp of a live process; distinct for every `create`
    pub(crate) fn generation(&self, pid: Pid) -> Option<u64> {
        self.get_record(pid).map(|slot| slot.generation)
    }

    pub(crate) fn entry(&self, pid: Pid) -> Option<Entry> {
        self.get_record(pid).and_then(|slot| slot.entry.clone())
    }

    fn live_slot_mut(&mut self, pid: Pid) -> KernelResult<&mut ProcessControlBlock> {
        let slot = self
            .slots
            .get_mut(pid)
            .ok_or(KernelError::InvalidPid { pid })?;
        if slot.state == ProcessState::Terminated {
            return Err(KernelError::ProcessTerminated { pid });
        }
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_truncates_to_capacity_minus_one() {
        let mut mailbox = Mailbox::new();
        mailbox.store(&[b'x'; 64]);
        assert_eq!(mailbox.peek().map(<[u8]>::len), Some(MAILBOX_CAPACITY - 1));
    }

    #[test]
    fn mailbox_is_consumed_once() {
        let mut mailbox = Mailbox::new();
        mailbox.store(b"ping");
        assert_eq!(mailbox.take(), Some(&b"ping"[..]));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn empty_message_is_still_pending() {
        let mut mailbox = Mailbox::new();
        mailbox.store(b"");
        assert!(mailbox.is_pending());
        assert_eq!(mailbox.take(), Some(&b""[..]));
    }

    #[test]
    fn reused_slot_gets_a_new_generation() {
        let config = crate::config::KernelConfig::default();
        let mut memory = MemoryManager::new(&config);
        let mut table = ProcessTable::new(config.proc_stack_size);

        let first = table.create(&mut memory, Rc::new(|_: &mut Kernel| {})).unwrap();
        let stamp = table.generation(first);
        table.terminate(&mut memory, first).unwrap();
        assert_eq!(table.generation(first), None);

        let second = table.create(&mut memory, Rc::new(|_: &mut Kernel| {})).unwrap();
        assert_eq!(second, first);
        assert!(table.generation(second).is_some());
        assert_ne!(table.generation(second), stamp);
    }

    #[test]
    fn state_names() {
        assert_eq!(ProcessState::Ready.to_string(), "READY");
        assert_eq!(ProcessState::Terminated.name(), "TERMINATED");
    }
}
