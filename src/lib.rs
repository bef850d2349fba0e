//! # Introduction
//!
//! kacchi is the core of a teaching kernel, hosted as an ordinary process: a
//! two-region memory manager, a fixed process table with one-slot mailboxes and
//! a round-robin, run-to-completion scheduler. A small command shell drives the
//! kernel and a terminal monitor built with [ratatui](https://docs.rs/ratatui)
//! shows its state live.
//!
//! ## Layers
//!
//! ```text
//! Shell / Monitor → Kernel → { Scheduler, ProcessTable } → MemoryManager
//! ```
//!
//! 1. [`memory`]: the bump-allocated stack region and the best-fit,
//!    splitting, coalescing heap.
//! 2. [`kernel`]: the [`kernel::Kernel`] context, process lifecycle, mailboxes
//!    and the scheduler loop.
//! 3. [`snapshot`]: the [`snapshot::Console`] output sink and point-in-time
//!    [`snapshot::Snapshot`] views used by the shell and the UI.
//! 4. [`shell`]: command parsing, narrated self-tests and demo entry routines.
//! 5. [`ui`]: ratatui-based monitor; not part of the stable library API.
//!
//! [`config`] and [`logging`] carry region sizes and the `log` backend.
//!
//! ## Example
//!
//! ```
//! use kacchi::config::KernelConfig;
//! use kacchi::kernel::process::ProcessState;
//! use kacchi::kernel::Kernel;
//!
//! let mut kernel = Kernel::new(KernelConfig::default()).unwrap();
//! kernel.register_entry("hello", |k: &mut Kernel| {
//!     k.console_mut().write_line("hello");
//! });
//! let pid = kernel.spawn("hello").unwrap();
//! kernel.set_state(pid, ProcessState::Ready).unwrap();
//!
//! let report = kernel.run().unwrap();
//! assert_eq!(report.dispatched, vec![pid]);
//! assert!(!kernel.is_alive(pid));
//! ```

pub mod config;
pub mod kernel;
pub mod logging;
pub mod memory;
pub mod shell;
pub mod snapshot;
pub mod ui;
