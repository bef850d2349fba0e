//! Terminal monitor built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: application state, keyboard event loop, pane focus, the command line
//! - **[`panes`]**: stateless render functions for each visible pane (console, log,
//!   processes, heap, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a [`Kernel`] and a
//! [`Shell`] and call [`App::run`] to start the event loop.
//!
//! [`Kernel`]: crate::kernel::Kernel
//! [`Shell`]: crate::shell::Shell
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
