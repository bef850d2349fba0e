//! Heap pane rendering with the segment list and stack gauge
//!
//! Segments are listed in address order. In-use blocks show a short hex preview
//! of their first bytes and, when they back a process stack, the owning PID.

use super::{clamp_scroll, pane_block};
use crate::memory::heap::{Heap, SegmentInfo};
use crate::snapshot::Snapshot;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, List, ListItem},
    Frame,
};

const PREVIEW_BYTES: usize = 8;

fn hex_preview(heap: &Heap, segment: &SegmentInfo) -> String {
    let len = segment.length.min(PREVIEW_BYTES);
    match heap.read_bytes(segment.address, len) {
        Ok(bytes) => bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" "),
        Err(_) => String::new(),
    }
}

fn segment_line<'a>(snapshot: &Snapshot, heap: &Heap, segment: &SegmentInfo) -> Line<'a> {
    let (tag, color) = if segment.is_free {
        ("free", DEFAULT_THEME.free_block)
    } else {
        ("used", DEFAULT_THEME.used_block)
    };

    let mut spans = vec![
        Span::styled(
            format!("{:#010x} ", segment.address),
            Style::default().fg(DEFAULT_THEME.primary),
        ),
        Span::styled(
            format!("{:>7} B ", segment.length),
            Style::default().fg(DEFAULT_THEME.fg),
        ),
        Span::styled(
            format!("{} ", tag),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ];

    if !segment.is_free {
        let owner = snapshot
            .processes
            .iter()
            .find(|p| p.stack_base == Some(segment.address));
        if let Some(process) = owner {
            spans.push(Span::styled(
                format!("stack of PID {} ", process.pid),
                Style::default().fg(DEFAULT_THEME.running),
            ));
        }
        spans.push(Span::styled(
            hex_preview(heap, segment),
            Style::default().fg(DEFAULT_THEME.comment),
        ));
    }

    Line::from(spans)
}

/// Render the heap pane
pub fn render_heap_pane(
    frame: &mut Frame,
    area: Rect,
    snapshot: &Snapshot,
    heap: &Heap,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let title = format!(
        " Heap {}/{} B used, largest free {} ",
        snapshot.heap_used, snapshot.heap_capacity, snapshot.largest_free
    );
    let block = pane_block(title, is_focused);

    let visible_height = clamp_scroll(snapshot.segments.len(), area, scroll_offset);
    let items: Vec<ListItem> = snapshot
        .segments
        .iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|segment| ListItem::new(segment_line(snapshot, heap, segment)))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Render the stack region gauge
pub fn render_stack_gauge(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let ratio = snapshot.stack_ratio().clamp(0.0, 1.0);
    let color = if ratio > 0.9 {
        DEFAULT_THEME.error
    } else if ratio > 0.6 {
        DEFAULT_THEME.warning
    } else {
        DEFAULT_THEME.success
    };

    let gauge = Gauge::default()
        .block(pane_block(" Stack Region ".to_string(), false))
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio(ratio)
        .label(format!(
            "{} / {} bytes",
            snapshot.stack_used, snapshot.stack_capacity
        ));
    frame.render_widget(gauge, area);
}
