//! The kernel context
//!
//! This module ties the three subsystems together:
//! - [`process`]: process table, lifecycle and mailboxes
//! - [`scheduler`]: round-robin, run-to-completion dispatch
//! - [`errors`]: the [`KernelError`](errors::KernelError) taxonomy
//! - [`constants`]: table sizes, region bases and default capacities
//!
//! # Execution Model
//!
//! A [`Kernel`] is a single-threaded value: one execution context touches the
//! heap, the stack mark and the process table at a time, so nothing is locked.
//! Several kernels can coexist, which is how the tests isolate themselves.
//!
//! ```text
//! shell / tests ──create──▶ ProcessTable ──heap_alloc──▶ MemoryManager
//!               ──ready───▶ ProcessTable
//!               ──run─────▶ Scheduler ──entry()──▶ terminate ──heap_free──▶ MemoryManager
//! ```

pub mod constants;
pub mod errors;
pub mod process;
pub mod scheduler;

use crate::config::KernelConfig;
use crate::memory::{Address, MemoryManager};
use crate::snapshot::{Console, ProcessInfo, Snapshot};
use errors::{KernelError, KernelResult};
use process::{Entry, EntryRoutine, Pid, ProcessState, ProcessTable};
use rustc_hash::FxHashMap;
use scheduler::Scheduler;
use std::rc::Rc;

/// Memory manager, process table, scheduler and console of one kernel instance
pub struct Kernel {
    config: KernelConfig,
    memory: MemoryManager,
    processes: ProcessTable,
    scheduler: Scheduler,
    console: Console,

    /// Named entry routines available to [`Kernel::spawn`]
    entries: FxHashMap<String, Entry>,
}

impl Kernel {
    /// Build and initialize a kernel
    pub fn new(config: KernelConfig) -> KernelResult<Self> {
        config.validate()?;
        Ok(Kernel {
            memory: MemoryManager::new(&config),
            processes: ProcessTable::new(config.proc_stack_size),
            scheduler: Scheduler::new(),
            console: Console::new(config.console_lines),
            entries: FxHashMap::default(),
            config,
        })
    }

    /// Re-initialize memory, the process table and the scheduler
    ///
    /// Console output and registered entry routines survive.
    pub fn init(&mut self) {
        self.memory.init();
        self.processes.init();
        self.scheduler.init();
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryManager {
        &mut self.memory
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.processes
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    // Memory

    pub fn stack_alloc(&mut self, size: usize) -> KernelResult<Address> {
        self.memory.stack_alloc(size)
    }

    pub fn stack_free(&mut self, size: usize) {
        self.memory.stack_free(size)
    }

    pub fn heap_alloc(&mut self, size: usize) -> KernelResult<Address> {
        self.memory.heap_alloc(size)
    }

    pub fn heap_free(&mut self, ptr: Option<Address>) -> KernelResult<()> {
        self.memory.heap_free(ptr)
    }

    // Processes

    pub fn create(&mut self, entry: Entry) -> KernelResult<Pid> {
        self.processes.create(&mut self.memory, entry)
    }

    pub fn set_state(&mut self, pid: Pid, state: ProcessState) -> KernelResult<()> {
        self.processes.set_state(pid, state)
    }

    pub fn terminate(&mut self, pid: Pid) -> KernelResult<()> {
        self.processes.terminate(&mut self.memory, pid)
    }

    pub fn get_state(&self, pid: Pid) -> ProcessState {
        self.processes.get_state(pid)
    }

    pub fn is_alive(&self, pid: Pid) -> bool {
        self.processes.is_alive(pid)
    }

    pub fn send(&mut self, dst: Pid, message: &[u8]) -> KernelResult<()> {
        self.processes.send(dst, message)
    }

    pub fn recv(&mut self, pid: Pid) -> KernelResult<Vec<u8>> {
        self.processes.recv(pid)
    }

    pub fn recv_into(&mut self, pid: Pid, out: &mut [u8]) -> KernelResult<usize> {
        self.processes.recv_into(pid, out)
    }

    /// Register a routine under `name`, replacing any earlier one
    pub fn register_entry<R>(&mut self, name: &str, routine: R)
    where
        R: EntryRoutine + 'static,
    {
        self.entries.insert(name.to_string(), Rc::new(routine));
    }

    /// Registered routine names, sorted
    pub fn entry_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Create a process running the routine registered as `name`
    pub fn spawn(&mut self, name: &str) -> KernelResult<Pid> {
        let entry = self
            .entries
            .get(name)
            .cloned()
            .ok_or_else(|| KernelError::UnknownEntry {
                name: name.to_string(),
            })?;
        self.create(entry)
    }

    /// Capture the memory and process state for display
    pub fn snapshot(&self) -> Snapshot {
        let stack = self.memory.stack();
        let heap = self.memory.heap();
        Snapshot {
            stack_used: stack.mark(),
            stack_capacity: stack.capacity(),
            heap_capacity: heap.capacity(),
            heap_free: heap.free_bytes(),
            heap_used: heap.used_bytes(),
            largest_free: heap.largest_free(),
            segments: heap.segments().collect(),
            processes: self
                .processes
                .records()
                .map(|pcb| ProcessInfo {
                    pid: pcb.pid(),
                    state: pcb.state(),
                    stack_base: pcb.stack_base(),
                    stack_size: pcb.stack_size(),
                    has_message: pcb.mailbox().is_pending(),
                })
                .collect(),
            last_dispatched: self.scheduler.last_dispatched(),
        }
    }
}
