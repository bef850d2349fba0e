//! Process table pane rendering

use super::{clamp_scroll, pane_block};
use crate::kernel::process::{Pid, ProcessState};
use crate::snapshot::ProcessInfo;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

fn state_style(state: ProcessState) -> Style {
    let color = match state {
        ProcessState::New => DEFAULT_THEME.comment,
        ProcessState::Ready => DEFAULT_THEME.success,
        ProcessState::Running => DEFAULT_THEME.running,
        ProcessState::Blocked | ProcessState::Sleeping => DEFAULT_THEME.warning,
        ProcessState::Terminated => DEFAULT_THEME.error,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Render the process pane
pub fn render_process_pane(
    frame: &mut Frame,
    area: Rect,
    processes: &[ProcessInfo],
    capacity: usize,
    last_dispatched: Option<Pid>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(
        format!(" Processes {}/{} ", processes.len(), capacity),
        is_focused,
    );

    if processes.is_empty() {
        let paragraph = Paragraph::new("(no live processes)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_height = clamp_scroll(processes.len(), area, scroll_offset);
    let items: Vec<ListItem> = processes
        .iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|p| {
            let marker = if last_dispatched == Some(p.pid) { "▶" } else { " " };
            let stack = p
                .stack_base
                .map(|base| format!("{:#010x}+{}", base, p.stack_size))
                .unwrap_or_default();
            let mut spans = vec![
                Span::styled(
                    format!("{} PID {:>2} ", marker, p.pid),
                    Style::default().fg(DEFAULT_THEME.fg),
                ),
                Span::styled(format!("{:<10}", p.state.name()), state_style(p.state)),
                Span::styled(stack, Style::default().fg(DEFAULT_THEME.comment)),
            ];
            if p.has_message {
                spans.push(Span::styled(
                    " ✉",
                    Style::default().fg(DEFAULT_THEME.secondary),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
