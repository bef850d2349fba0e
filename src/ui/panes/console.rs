//! Kernel console pane rendering

use super::{clamp_scroll, pane_block};
use crate::shell::PROMPT;
use crate::snapshot::Console;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{List, ListItem, Padding, Paragraph},
    Frame,
};

fn line_style(line: &str) -> Style {
    let trimmed = line.trim_start();
    if line.starts_with(PROMPT) {
        Style::default()
            .fg(DEFAULT_THEME.secondary)
            .add_modifier(Modifier::BOLD)
    } else if trimmed.starts_with('✓') {
        Style::default().fg(DEFAULT_THEME.success)
    } else if trimmed.starts_with('✗') {
        Style::default().fg(DEFAULT_THEME.error)
    } else if trimmed.starts_with("[Scheduler]") {
        Style::default().fg(DEFAULT_THEME.primary)
    } else if trimmed.starts_with("[P]") {
        Style::default().fg(DEFAULT_THEME.running)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    }
}

/// Render the console pane
pub fn render_console_pane(
    frame: &mut Frame,
    area: Rect,
    console: &Console,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(" Console ".to_string(), is_focused);
    let lines = console.get_output();

    if lines.is_empty() {
        let paragraph = Paragraph::new("(no output)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_height = clamp_scroll(lines.len(), area, scroll_offset);
    let items: Vec<ListItem> = lines
        .iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|line| ListItem::new(line.as_str()).style(line_style(line)))
        .collect();

    let list = List::new(items).block(block.padding(Padding::new(1, 0, 0, 0)));
    frame.render_widget(list, area);
}
