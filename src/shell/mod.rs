//! Command shell
//!
//! The shell is a thin driver over the kernel API: every command maps to one
//! or two kernel calls and narrates the result on the kernel console with a
//! `✓`/`✗` prefix. Kernel errors never abort the shell.
//!
//! Heap blocks handed out by `alloc` are remembered so that `free` without an
//! address releases the most recent one.

pub mod command;
pub mod selftest;

use crate::kernel::constants::VERSION;
use crate::kernel::errors::ErrorKind;
use crate::kernel::process::ProcessState;
use crate::kernel::Kernel;
use crate::memory::Address;
use command::Command;
use log::info;

/// Text printed before echoed input
pub const PROMPT: &str = "kacchiOS> ";

/// Whether the driver should keep reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

#[derive(Debug, Default)]
pub struct Shell {
    allocations: Vec<Address>,
}

/// Boot banner
pub fn banner(kernel: &mut Kernel) {
    let console = kernel.console_mut();
    console.write_line("════════════════════════════════════");
    console.write_line(&format!("   {}", VERSION));
    console.write_line("   Memory, Process and Scheduler Monitor");
    console.write_line("════════════════════════════════════");
}

/// Closing hint printed after the boot self-test
pub fn ready_hint(kernel: &mut Kernel) {
    let console = kernel.console_mut();
    console.write_line("");
    console.write_line("[READY] Type 'test' for full verification");
    console.write_line("Type 'help' for commands");
}

impl Shell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Heap blocks allocated by `alloc` and not yet freed, oldest first
    pub fn allocations(&self) -> &[Address] {
        &self.allocations
    }

    /// Echo `line`, run it and narrate the result
    pub fn execute(&mut self, kernel: &mut Kernel, line: &str) -> Outcome {
        kernel
            .console_mut()
            .write_line(&format!("{}{}", PROMPT, line.trim_end()));

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(command::ParseError::Empty) => return Outcome::Continue,
            Err(e) => {
                kernel.console_mut().write_line(&format!("✗ {}", e));
                if matches!(e, command::ParseError::UnknownCommand(_)) {
                    kernel
                        .console_mut()
                        .write_line("Type 'help' for available commands");
                }
                return Outcome::Continue;
            }
        };

        info!("shell: {:?}", command);
        self.dispatch(kernel, command)
    }

    fn dispatch(&mut self, kernel: &mut Kernel, command: Command) -> Outcome {
        match command {
            Command::Help => help(kernel),
            Command::FullTest => {
                selftest::full(kernel);
            }
            Command::MemoryTest => {
                selftest::memory(kernel);
            }
            Command::ProcessTest => {
                selftest::process(kernel);
            }
            Command::SchedulerTest => {
                selftest::scheduler(kernel);
            }
            Command::Version => kernel.console_mut().write_line(VERSION),
            Command::Clear => kernel.console_mut().clear(),
            Command::Alloc(size) => self.alloc(kernel, size),
            Command::Free(addr) => self.free(kernel, addr),
            Command::StackAlloc(size) => {
                let line = match kernel.stack_alloc(size) {
                    Ok(addr) => format!("✓ Stack: {} bytes at {:#010x}", size, addr),
                    Err(e) => format!("✗ Stack allocation failed: {}", e),
                };
                kernel.console_mut().write_line(&line);
            }
            Command::StackFree(size) => {
                kernel.stack_free(size);
                let mark = kernel.memory().stack().mark();
                kernel
                    .console_mut()
                    .write_line(&format!("✓ Stack: released {} bytes, mark at {}", size, mark));
            }
            Command::MemInfo => meminfo(kernel),
            Command::Ps => ps(kernel),
            Command::Create(name) => create(kernel, &name),
            Command::Ready(pid) => {
                let line = match kernel.set_state(pid, ProcessState::Ready) {
                    Ok(()) => format!("✓ PID {} is READY", pid),
                    Err(e) => format!("✗ {}", e),
                };
                kernel.console_mut().write_line(&line);
            }
            Command::Kill(pid) => {
                let line = if !kernel.is_alive(pid) {
                    format!("✗ No live process with PID {}", pid)
                } else {
                    match kernel.terminate(pid) {
                        Ok(()) => format!("✓ Process {} terminated", pid),
                        Err(e) => format!("✗ {}", e),
                    }
                };
                kernel.console_mut().write_line(&line);
            }
            Command::Run => {
                kernel.console_mut().write_line("Starting scheduler...");
                let line = match kernel.run() {
                    Ok(report) => format!(
                        "✓ Scheduler completed ({} dispatched)",
                        report.dispatched.len()
                    ),
                    Err(e) => format!("✗ Scheduler stopped: {}", e),
                };
                kernel.console_mut().write_line(&line);
            }
            Command::Send(pid, message) => {
                let line = match kernel.send(pid, message.as_bytes()) {
                    Ok(()) => format!("✓ Message sent to PID {}", pid),
                    Err(e) => format!("✗ Send failed: {}", e),
                };
                kernel.console_mut().write_line(&line);
            }
            Command::Recv(pid) => {
                let line = match kernel.recv(pid) {
                    Ok(message) => format!(
                        "✓ Message from PID {}: {}",
                        pid,
                        String::from_utf8_lossy(&message)
                    ),
                    Err(e) => format!("✗ {}", e),
                };
                kernel.console_mut().write_line(&line);
            }
            Command::Entries => {
                let names = kernel.entry_names().join(", ");
                kernel
                    .console_mut()
                    .write_line(&format!("Entry routines: {}", names));
            }
            Command::Quit => {
                kernel.console_mut().write_line("Halting.");
                return Outcome::Quit;
            }
        }
        Outcome::Continue
    }

    fn alloc(&mut self, kernel: &mut Kernel, size: usize) {
        let line = match kernel.heap_alloc(size) {
            Ok(addr) => {
                self.allocations.push(addr);
                format!("✓ Allocated {} bytes at {:#010x}", size, addr)
            }
            Err(e) => format!("✗ Allocation failed: {}", e),
        };
        kernel.console_mut().write_line(&line);
    }

    fn free(&mut self, kernel: &mut Kernel, addr: Option<Address>) {
        let Some(addr) = addr.or_else(|| self.allocations.last().copied()) else {
            kernel.console_mut().write_line("✗ Nothing to free");
            return;
        };

        if kernel.processes().owns_stack(addr) {
            kernel.console_mut().write_line(&format!(
                "✗ {:#010x} is a process stack; use 'kill' instead",
                addr
            ));
            return;
        }

        let line = match kernel.heap_free(Some(addr)) {
            Ok(()) => {
                self.allocations.retain(|&a| a != addr);
                format!("✓ Freed {:#010x}", addr)
            }
            Err(e) => format!("✗ {}", e),
        };
        kernel.console_mut().write_line(&line);
    }
}

fn help(kernel: &mut Kernel) {
    const LINES: &[&str] = &[
        "Tests:",
        "  test              - Run the complete system test",
        "  memory            - Test the memory manager",
        "  process           - Test the process table",
        "  sched             - Test the scheduler",
        "Memory:",
        "  alloc [size]      - Allocate heap bytes (default 512)",
        "  free [addr]       - Free a heap block (default: last alloc)",
        "  salloc <size>     - Allocate from the stack region",
        "  sfree <size>      - Release from the stack region",
        "  meminfo           - Show stack and heap layout",
        "Processes:",
        "  create [entry]    - Create a READY process (default hello)",
        "  ready <pid>       - Mark a process READY",
        "  kill <pid>        - Terminate a process",
        "  ps                - List live processes",
        "  run               - Run the scheduler until idle",
        "  send <pid> <msg>  - Send a message",
        "  recv <pid>        - Receive a message",
        "  entries           - List entry routines",
        "Other:",
        "  version, clear, help, quit",
    ];
    for line in LINES {
        kernel.console_mut().write_line(line);
    }
}

fn meminfo(kernel: &mut Kernel) {
    let snapshot = kernel.snapshot();
    let mut lines = vec![
        format!(
            "Stack: {} / {} bytes used",
            snapshot.stack_used, snapshot.stack_capacity
        ),
        format!(
            "Heap:  {} used, {} free, largest free {} ({} bytes total)",
            snapshot.heap_used, snapshot.heap_free, snapshot.largest_free, snapshot.heap_capacity
        ),
        format!(
            "Segments: {} ({} free)",
            snapshot.segments.len(),
            snapshot.free_segments()
        ),
    ];
    lines.extend(snapshot.segments.iter().map(|seg| {
        format!(
            "  {:#010x}  {:>8} bytes  {}",
            seg.address,
            seg.length,
            if seg.is_free { "free" } else { "used" }
        )
    }));
    for line in lines {
        kernel.console_mut().write_line(&line);
    }
}

fn ps(kernel: &mut Kernel) {
    let snapshot = kernel.snapshot();
    let capacity = kernel.processes().capacity();
    let mut lines = vec!["Process List:".to_string()];
    lines.extend(snapshot.processes.iter().map(|p| {
        format!(
            "  PID {:>2}: {:<10}{}",
            p.pid,
            p.state.name(),
            if p.has_message { " [mail]" } else { "" }
        )
    }));
    lines.push(format!(
        "Total: {}/{} processes",
        snapshot.processes.len(),
        capacity
    ));
    for line in lines {
        kernel.console_mut().write_line(&line);
    }
}

fn create(kernel: &mut Kernel, name: &str) {
    let created = kernel
        .spawn(name)
        .and_then(|pid| kernel.set_state(pid, ProcessState::Ready).map(|()| pid));

    match created {
        Ok(pid) => kernel
            .console_mut()
            .write_line(&format!("✓ Process created: PID {} ({})", pid, name)),
        Err(e) => {
            kernel
                .console_mut()
                .write_line(&format!("✗ Process creation failed: {}", e));
            if e.kind() == ErrorKind::ResourceExhausted {
                kernel
                    .console_mut()
                    .write_line("  Try 'run' or 'kill <pid>' to free a slot and its stack");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;

    #[test]
    fn free_without_address_releases_the_latest_block() {
        let mut kernel = Kernel::new(KernelConfig::default()).unwrap();
        let mut shell = Shell::new();
        shell.execute(&mut kernel, "alloc 64");
        shell.execute(&mut kernel, "alloc 32");
        assert_eq!(shell.allocations().len(), 2);
        let first = shell.allocations()[0];
        shell.execute(&mut kernel, "free");
        assert_eq!(shell.allocations(), &[first]);
        assert!(kernel.memory().heap().is_allocated(first));
    }

    #[test]
    fn empty_line_only_echoes() {
        let mut kernel = Kernel::new(KernelConfig::default()).unwrap();
        let mut shell = Shell::new();
        assert_eq!(shell.execute(&mut kernel, ""), Outcome::Continue);
        assert_eq!(kernel.console().line_count(), 1);
    }
}
