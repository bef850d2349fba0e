//! Main TUI application state and logic

use crate::kernel::Kernel;
use crate::logging;
use crate::shell::{Outcome, Shell};
use crate::ui::panes::{self, StatusRenderData};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

/// Log records kept by the log pane
const LOG_PANE_LINES: usize = 500;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Console,
    Log,
    Processes,
    Heap,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: console -> processes -> heap -> log)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Console => FocusedPane::Processes,
            FocusedPane::Processes => FocusedPane::Heap,
            FocusedPane::Heap => FocusedPane::Log,
            FocusedPane::Log => FocusedPane::Console,
        }
    }

    /// Move focus to the previous pane (counter-clockwise)
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Console => FocusedPane::Log,
            FocusedPane::Processes => FocusedPane::Console,
            FocusedPane::Heap => FocusedPane::Processes,
            FocusedPane::Log => FocusedPane::Heap,
        }
    }
}

/// The main application state
pub struct App {
    pub kernel: Kernel,
    pub shell: Shell,

    /// Text typed on the command line
    pub input: String,

    /// Previously executed lines, oldest first
    pub history: Vec<String>,
    history_cursor: Option<usize>,

    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub console_scroll: usize,
    pub log_scroll: usize,
    pub process_scroll: usize,
    pub heap_scroll: usize,

    /// Records drained from the log backend
    pub log_lines: VecDeque<String>,

    pub should_quit: bool,
    pub status_message: String,
    last_failed: bool,
}

impl App {
    pub fn new(kernel: Kernel, shell: Shell) -> Self {
        App {
            kernel,
            shell,
            input: String::new(),
            history: Vec::new(),
            history_cursor: None,
            focused_pane: FocusedPane::Console,
            console_scroll: usize::MAX, // Start at the bottom
            log_scroll: usize::MAX,
            process_scroll: 0,
            heap_scroll: 0,
            log_lines: VecDeque::new(),
            should_quit: false,
            status_message: String::from("Ready!"),
            last_failed: false,
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.collect_logs();
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn collect_logs(&mut self) {
        let drained = logging::drain();
        if drained.is_empty() {
            return;
        }
        for line in drained {
            if self.log_lines.len() == LOG_PANE_LINES {
                self.log_lines.pop_front();
            }
            self.log_lines.push_back(line);
        }
        self.log_scroll = usize::MAX;
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();
        let snapshot = self.kernel.snapshot();

        // Panes above, status bar below
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        // Left column: Console | Log | Command
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(8),
                Constraint::Length(3),
            ])
            .split(columns[0]);

        // Right column: Processes | Heap | Stack gauge
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(columns[1]);

        panes::render_console_pane(
            frame,
            left_rows[0],
            self.kernel.console(),
            self.focused_pane == FocusedPane::Console,
            &mut self.console_scroll,
        );

        panes::render_log_pane(
            frame,
            left_rows[1],
            &self.log_lines,
            self.focused_pane == FocusedPane::Log,
            &mut self.log_scroll,
        );

        panes::render_input_line(frame, left_rows[2], &self.input);

        panes::render_process_pane(
            frame,
            right_rows[0],
            &snapshot.processes,
            self.kernel.processes().capacity(),
            snapshot.last_dispatched,
            self.focused_pane == FocusedPane::Processes,
            &mut self.process_scroll,
        );

        panes::render_heap_pane(
            frame,
            right_rows[1],
            &snapshot,
            self.kernel.memory().heap(),
            self.focused_pane == FocusedPane::Heap,
            &mut self.heap_scroll,
        );

        panes::render_stack_gauge(frame, right_rows[2], &snapshot);

        panes::render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                message: &self.status_message,
                live_processes: snapshot.processes.len(),
                capacity: self.kernel.processes().capacity(),
                dispatch_count: self.kernel.scheduler().dispatch_count(),
                last_failed: self.last_failed,
            },
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.history_cursor = None;
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            // On the console, arrows walk the command history and paging scrolls
            KeyCode::Up if self.focused_pane == FocusedPane::Console => {
                if !self.history.is_empty() {
                    self.recall_older();
                }
            }
            KeyCode::Down if self.focused_pane == FocusedPane::Console => {
                self.recall_newer();
            }
            KeyCode::Up => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_add(1);
            }
            KeyCode::PageUp => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_sub(10);
            }
            KeyCode::PageDown => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_add(10);
            }
            _ => {}
        }
    }

    fn focused_scroll(&mut self) -> &mut usize {
        match self.focused_pane {
            FocusedPane::Console => &mut self.console_scroll,
            FocusedPane::Log => &mut self.log_scroll,
            FocusedPane::Processes => &mut self.process_scroll,
            FocusedPane::Heap => &mut self.heap_scroll,
        }
    }

    fn recall_older(&mut self) {
        let index = match self.history_cursor {
            Some(0) => 0,
            Some(i) => i - 1,
            None => self.history.len() - 1,
        };
        self.history_cursor = Some(index);
        self.input = self.history[index].clone();
    }

    fn recall_newer(&mut self) {
        match self.history_cursor {
            Some(i) if i + 1 < self.history.len() => {
                self.history_cursor = Some(i + 1);
                self.input = self.history[i + 1].clone();
            }
            Some(_) => {
                self.history_cursor = None;
                self.input.clear();
            }
            None => {}
        }
    }

    /// Execute the typed line on the shell
    fn submit(&mut self) {
        let line = std::mem::take(&mut self.input);
        self.history_cursor = None;
        if !line.trim().is_empty() {
            self.history.push(line.clone());
        }

        let before = self.kernel.console().line_count();
        let outcome = self.shell.execute(&mut self.kernel, &line);
        if outcome == Outcome::Quit {
            self.should_quit = true;
        }

        // The first narrated line after the echo tells whether the command worked
        let reply = self
            .kernel
            .console()
            .lines()
            .skip(before + 1)
            .find(|l| l.starts_with('✓') || l.starts_with('✗'))
            .map(str::to_string);
        self.last_failed = reply.as_deref().is_some_and(|l| l.starts_with('✗'));
        self.status_message = reply.unwrap_or_else(|| format!("Ran '{}'", line.trim()));
        self.console_scroll = usize::MAX;
    }
}
