//! Round-robin, run-to-completion scheduler
//!
//! The scheduler owns no process state; it looks at the process table and
//! remembers the last identifier it dispatched, plus the one whose routine is
//! executing right now. Each cycle of [`Kernel::run`]:
//!
//! 1. scans the table circularly, starting just after the last dispatched slot,
//!    and picks the first `Ready` process;
//! 2. marks it `Running` and calls its entry routine;
//! 3. terminates it when the routine returns, unless the routine already
//!    terminated it and the slot now holds a newer process.
//!
//! The loop ends as soon as a scan finds nothing ready. Nothing inside this core
//! can make a process ready later (there is no timer and no interrupt), so
//! waiting would never end.

use super::constants::MAX_PROCS;
use super::errors::KernelResult;
use super::process::{Pid, ProcessState, ProcessTable};
use super::Kernel;
use log::debug;

/// Dispatch bookkeeping
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    // Where the next scan starts; kept after a run ends
    last_dispatched: Option<Pid>,
    // Set only while an entry routine executes
    current: Option<Pid>,
    dispatch_count: u64,
}

/// Why a run loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No process was ready; the normal end of a run
    Idle,
}

/// Summary of one [`Kernel::run`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Identifiers in dispatch order
    pub dispatched: Vec<Pid>,
    pub outcome: RunOutcome,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the last dispatched process
    pub fn init(&mut self) {
        self.last_dispatched = None;
        self.current = None;
    }

    pub fn last_dispatched(&self) -> Option<Pid> {
        self.last_dispatched
    }

    /// Total dispatches since the kernel was built
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count
    }

    /// First `Ready` slot after the last dispatched one, wrapping once around the table
    pub fn select_next(&self, table: &ProcessTable) -> Option<Pid> {
        let start = self.last_dispatched.map_or(0, |last| (last + 1) % MAX_PROCS);
        (0..MAX_PROCS)
            .map(|i| (start + i) % MAX_PROCS)
            .find(|&pid| table.get_state(pid) == ProcessState::Ready)
    }

    fn record_dispatch(&mut self, pid: Pid) {
        self.last_dispatched = Some(pid);
        self.dispatch_count += 1;
    }
}

impl Kernel {
    /// Reset the scheduler so the next scan starts at slot 0
    pub fn scheduler_init(&mut self) {
        self.scheduler.init();
    }

    /// Dispatch every ready process until none is left
    pub fn run(&mut self) -> KernelResult<RunReport> {
        self.console
            .write_line("[Scheduler] Starting Round-Robin scheduling");

        let mut dispatched = Vec::new();
        while let Some(pid) = self.scheduler.select_next(&self.processes) {
            self.processes.set_state(pid, ProcessState::Running)?;
            self.scheduler.record_dispatch(pid);
            debug!("dispatching process {}", pid);
            self.console
                .write_line(&format!("[Scheduler] Running process {}", pid));

            let generation = self.processes.generation(pid);
            let outer = self.scheduler.current.replace(pid);
            if let Some(entry) = self.processes.entry(pid) {
                entry.run(self);
            }
            self.scheduler.current = outer;

            if self.processes.generation(pid) == generation {
                self.processes.terminate(&mut self.memory, pid)?;
            }
            self.console
                .write_line(&format!("[Scheduler] Process {} terminated", pid));
            dispatched.push(pid);
        }

        self.console
            .write_line("[Scheduler] No READY process. CPU idle.");
        Ok(RunReport {
            dispatched,
            outcome: RunOutcome::Idle,
        })
    }

    /// Put the running process back to `Ready` if it is still alive
    ///
    /// This has no lasting effect: the process is terminated as soon as its
    /// routine returns. Outside a routine there is no current process and
    /// nothing changes.
    pub fn yield_current(&mut self) -> bool {
        match self.scheduler.current {
            Some(pid) if self.processes.is_alive(pid) => self
                .processes
                .set_state(pid, ProcessState::Ready)
                .is_ok(),
            _ => false,
        }
    }

    /// The process whose entry routine is executing, if any
    pub fn current(&self) -> Option<Pid> {
        self.scheduler.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use crate::memory::MemoryManager;
    use std::rc::Rc;

    fn table_with_ready(pids_ready: &[bool]) -> (ProcessTable, MemoryManager) {
        let config = KernelConfig::default();
        let mut memory = MemoryManager::new(&config);
        let mut table = ProcessTable::new(config.proc_stack_size);
        for &ready in pids_ready {
            let pid = table.create(&mut memory, Rc::new(|_: &mut Kernel| {})).unwrap();
            if ready {
                table.set_state(pid, ProcessState::Ready).unwrap();
            }
        }
        (table, memory)
    }

    #[test]
    fn selection_starts_after_the_last_dispatch() {
        let (table, _memory) = table_with_ready(&[true, false, true, true]);
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.select_next(&table), Some(0));
        scheduler.record_dispatch(0);
        assert_eq!(scheduler.select_next(&table), Some(2));
        scheduler.record_dispatch(3);
        assert_eq!(scheduler.select_next(&table), Some(0));
    }

    #[test]
    fn nothing_ready_selects_nothing() {
        let (table, _memory) = table_with_ready(&[false, false]);
        assert_eq!(Scheduler::new().select_next(&table), None);
    }

    #[test]
    fn init_forgets_the_last_dispatch() {
        let mut scheduler = Scheduler::new();
        scheduler.record_dispatch(5);
        scheduler.init();
        assert_eq!(scheduler.last_dispatched(), None);
        assert_eq!(scheduler.dispatch_count(), 1);
    }
}
