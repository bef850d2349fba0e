//! Command line rendering

use super::pane_block;
use crate::shell::PROMPT;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the input line and place the terminal cursor after the typed text
pub fn render_input_line(frame: &mut Frame, area: Rect, input: &str) {
    let line = Line::from(vec![
        Span::styled(
            PROMPT,
            Style::default()
                .fg(DEFAULT_THEME.secondary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(input, Style::default().fg(DEFAULT_THEME.fg)),
    ]);
    let paragraph = Paragraph::new(line).block(pane_block(" Command ".to_string(), true));
    frame.render_widget(paragraph, area);

    let typed = (PROMPT.chars().count() + input.chars().count()) as u16;
    let max_x = area.x + area.width.saturating_sub(2);
    frame.set_cursor_position(Position::new((area.x + 1 + typed).min(max_x), area.y + 1));
}
