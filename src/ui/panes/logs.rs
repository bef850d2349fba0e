//! Log record pane rendering

use super::{clamp_scroll, pane_block};
use crate::logging::level_label;
use crate::ui::theme::DEFAULT_THEME;
use log::Level;
use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{List, ListItem, Paragraph},
    Frame,
};
use std::collections::VecDeque;

/// Render the log pane
pub fn render_log_pane(
    frame: &mut Frame,
    area: Rect,
    records: &VecDeque<String>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(format!(" Log ({}) ", records.len()), is_focused);

    if records.is_empty() {
        let paragraph = Paragraph::new("(raise verbosity with -v)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_height = clamp_scroll(records.len(), area, scroll_offset);
    let items: Vec<ListItem> = records
        .iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|record| {
            let color = match level_label(record) {
                Some(Level::Error) => DEFAULT_THEME.error,
                Some(Level::Warn) => DEFAULT_THEME.warning,
                Some(Level::Info) => DEFAULT_THEME.fg,
                _ => DEFAULT_THEME.comment,
            };
            ListItem::new(record.as_str()).style(Style::default().fg(color))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
