// Console output and point-in-time views of kernel state

use crate::kernel::process::{Pid, ProcessState};
use crate::memory::heap::SegmentInfo;
use crate::memory::Address;
use std::collections::VecDeque;
use std::fmt;

/// Byte-output sink for diagnostic tracing and shell narration
///
/// Keeps at most `max_lines` complete lines; the oldest are dropped first.
#[derive(Debug, Clone)]
pub struct Console {
    lines: VecDeque<String>,
    partial: String,
    max_lines: usize,
}

impl Console {
    pub fn new(max_lines: usize) -> Self {
        Console {
            lines: VecDeque::new(),
            partial: String::new(),
            max_lines: max_lines.max(1),
        }
    }

    /// Print without newline
    pub fn write_str(&mut self, text: &str) {
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            self.partial.push_str(first);
        }
        for part in parts {
            let line = std::mem::replace(&mut self.partial, part.to_string());
            self.push_line(line);
        }
    }

    pub fn write_line(&mut self, text: &str) {
        self.write_str(text);
        self.write_str("\n");
    }

    fn push_line(&mut self, line: String) {
        if self.lines.len() == self.max_lines {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// All lines, including an unterminated last line
    pub fn get_output(&self) -> Vec<String> {
        let mut output: Vec<String> = self.lines.iter().cloned().collect();
        if !self.partial.is_empty() {
            output.push(self.partial.clone());
        }
        output
    }

    /// Completed lines only
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.partial.clear();
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(crate::kernel::constants::DEFAULT_CONSOLE_LINES)
    }
}

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Console::write_str(self, s);
        Ok(())
    }
}

/// One live process as seen by a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub state: ProcessState,
    pub stack_base: Option<Address>,
    pub stack_size: usize,
    pub has_message: bool,
}

/// Memory and process state at one instant
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub stack_used: usize,
    pub stack_capacity: usize,
    pub heap_capacity: usize,
    pub heap_free: usize,
    pub heap_used: usize,
    pub largest_free: usize,
    pub segments: Vec<SegmentInfo>, // Address order
    pub processes: Vec<ProcessInfo>, // Live processes only
    pub last_dispatched: Option<Pid>,
}

impl Snapshot {
    /// Fraction of the stack region in use, for gauges
    pub fn stack_ratio(&self) -> f64 {
        if self.stack_capacity == 0 {
            0.0
        } else {
            self.stack_used as f64 / self.stack_capacity as f64
        }
    }

    pub fn free_segments(&self) -> usize {
        self.segments.iter().filter(|s| s.is_free).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    #[test]
    fn partial_lines_join_until_newline() {
        let mut console = Console::new(10);
        console.write_str("Running ");
        console.write_str("process 3\nnext");
        assert_eq!(console.lines().collect::<Vec<_>>(), vec!["Running process 3"]);
        assert_eq!(console.get_output(), vec!["Running process 3", "next"]);
    }

    #[test]
    fn oldest_lines_are_dropped() {
        let mut console = Console::new(2);
        for i in 0..4 {
            writeln!(console, "line {}", i).unwrap();
        }
        assert_eq!(console.lines().collect::<Vec<_>>(), vec!["line 2", "line 3"]);
    }
}
