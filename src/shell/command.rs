//! Shell command parser
//!
//! Turns one input line into a [`Command`]. Numbers are decimal unless they
//! carry a `0x` prefix, so addresses printed by the shell can be pasted back.

use crate::kernel::process::Pid;
use crate::memory::Address;
use std::fmt;

/// Heap request used by `alloc` without an argument
pub const DEFAULT_ALLOC_SIZE: usize = 512;

/// Entry routine used by `create` without an argument
pub const DEFAULT_ENTRY: &str = "hello";

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    FullTest,
    MemoryTest,
    ProcessTest,
    SchedulerTest,
    Version,
    Clear,
    Alloc(usize),
    Free(Option<Address>),
    StackAlloc(usize),
    StackFree(usize),
    MemInfo,
    Ps,
    Create(String),
    Ready(Pid),
    Kill(Pid),
    Run,
    Send(Pid, String),
    Recv(Pid),
    Entries,
    Quit,
}

/// Reasons a line is not a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    UnknownCommand(String),
    MissingArgument {
        command: &'static str,
        usage: &'static str,
    },
    InvalidNumber(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "Empty command"),
            ParseError::UnknownCommand(name) => write!(f, "Unknown command '{}'", name),
            ParseError::MissingArgument { command, usage } => {
                write!(f, "Missing argument for '{}'. Usage: {}", command, usage)
            }
            ParseError::InvalidNumber(text) => write!(f, "'{}' is not a number", text),
        }
    }
}

impl std::error::Error for ParseError {}

impl Command {
    pub fn parse(line: &str) -> Result<Command, ParseError> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name {
            "" => return Err(ParseError::Empty),
            "help" => Command::Help,
            "test" => Command::FullTest,
            "memory" => Command::MemoryTest,
            "process" => Command::ProcessTest,
            "sched" => Command::SchedulerTest,
            "version" => Command::Version,
            "clear" => Command::Clear,
            "alloc" => Command::Alloc(optional(rest)?.unwrap_or(DEFAULT_ALLOC_SIZE as u64) as usize),
            "free" => Command::Free(optional(rest)?),
            "salloc" => Command::StackAlloc(required(rest, "salloc", "salloc <size>")? as usize),
            "sfree" => Command::StackFree(required(rest, "sfree", "sfree <size>")? as usize),
            "meminfo" => Command::MemInfo,
            "ps" => Command::Ps,
            "create" => Command::Create(if rest.is_empty() {
                DEFAULT_ENTRY.to_string()
            } else {
                rest.to_string()
            }),
            "ready" => Command::Ready(required(rest, "ready", "ready <pid>")? as Pid),
            "kill" => Command::Kill(required(rest, "kill", "kill <pid>")? as Pid),
            "run" => Command::Run,
            "send" => {
                let usage = "send <pid> <message>";
                let (pid, message) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(ParseError::MissingArgument {
                        command: "send",
                        usage,
                    })?;
                Command::Send(parse_number(pid)? as Pid, message.trim_start().to_string())
            }
            "recv" => Command::Recv(required(rest, "recv", "recv <pid>")? as Pid),
            "entries" => Command::Entries,
            "quit" | "exit" => Command::Quit,
            other => return Err(ParseError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

fn parse_number(text: &str) -> Result<u64, ParseError> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| ParseError::InvalidNumber(text.to_string()))
}

fn optional(rest: &str) -> Result<Option<u64>, ParseError> {
    match rest.split_whitespace().next() {
        Some(word) => parse_number(word).map(Some),
        None => Ok(None),
    }
}

fn required(rest: &str, command: &'static str, usage: &'static str) -> Result<u64, ParseError> {
    optional(rest)?.ok_or(ParseError::MissingArgument { command, usage })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_defaults_to_512() {
        assert_eq!(Command::parse("alloc"), Ok(Command::Alloc(512)));
        assert_eq!(Command::parse("alloc 100"), Ok(Command::Alloc(100)));
    }

    #[test]
    fn hex_addresses_are_accepted() {
        assert_eq!(
            Command::parse("free 0x1000000c"),
            Ok(Command::Free(Some(0x1000_000c)))
        );
        assert_eq!(Command::parse("free"), Ok(Command::Free(None)));
    }

    #[test]
    fn send_keeps_inner_spaces() {
        assert_eq!(
            Command::parse("send 3   hello  there"),
            Ok(Command::Send(3, "hello  there".to_string()))
        );
        assert!(matches!(
            Command::parse("send 3"),
            Err(ParseError::MissingArgument { command: "send", .. })
        ));
    }

    #[test]
    fn bad_input_is_reported() {
        assert_eq!(Command::parse("   "), Err(ParseError::Empty));
        assert_eq!(
            Command::parse("reboot"),
            Err(ParseError::UnknownCommand("reboot".to_string()))
        );
        assert_eq!(
            Command::parse("kill abc"),
            Err(ParseError::InvalidNumber("abc".to_string()))
        );
        assert!(matches!(
            Command::parse("kill"),
            Err(ParseError::MissingArgument { command: "kill", .. })
        ));
    }

    #[test]
    fn create_takes_an_entry_name() {
        assert_eq!(Command::parse("create"), Ok(Command::Create("hello".to_string())));
        assert_eq!(Command::parse("create mem"), Ok(Command::Create("mem".to_string())));
    }
}
