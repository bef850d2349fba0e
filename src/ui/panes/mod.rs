//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`console`]: kernel console, holding shell echo, narration and scheduler trace
//! - [`logs`]: records drained from the log backend
//! - [`input`]: the command line with its cursor
//! - [`processes`]: live process table
//! - [`heap`]: heap segment list and the stack usage gauge
//! - [`status`]: status bar with keybindings and counters
//!
//! Each pane exports a `render_*` function that draws from borrowed state and,
//! for scrollable panes, clamps the caller's scroll offset in place.

pub mod console;
pub mod heap;
pub mod input;
pub mod logs;
pub mod processes;
pub mod status;

pub use console::render_console_pane;
pub use heap::{render_heap_pane, render_stack_gauge};
pub use input::render_input_line;
pub use logs::render_log_pane;
pub use processes::render_process_pane;
pub use status::{render_status_bar, StatusRenderData};

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders},
};

fn border_style(is_focused: bool) -> Style {
    if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    }
}

fn pane_block(title: String, is_focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_focused))
}

/// Clamp `scroll_offset` so the last page stays full; returns the visible row count
fn clamp_scroll(total_items: usize, area: Rect, scroll_offset: &mut usize) -> usize {
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Borders
    if total_items > visible_height {
        *scroll_offset = (*scroll_offset).min(total_items - visible_height);
    } else {
        *scroll_offset = 0;
    }
    visible_height
}
