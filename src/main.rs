// kacchiOS monitor: interactive shell and live view of the kernel core

use std::fs;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use kacchi::config::KernelConfig;
use kacchi::kernel::constants::{DEFAULT_HEAP_BYTES, DEFAULT_STACK_BYTES, PROC_STACK_SIZE};
use kacchi::kernel::Kernel;
use kacchi::logging::{self, LogSink};
use kacchi::shell::{self, selftest, Outcome, Shell};
use kacchi::ui::App;

/// kacchiOS kernel core monitor
#[derive(Parser)]
#[command(name = "kacchi")]
#[command(version)]
#[command(about = "Memory, process and scheduler monitor for the kacchiOS core", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Capacity of the stack region in bytes
    #[arg(long, default_value_t = DEFAULT_STACK_BYTES)]
    stack_bytes: usize,

    /// Capacity of the heap region in bytes
    #[arg(long, default_value_t = DEFAULT_HEAP_BYTES)]
    heap_bytes: usize,

    /// Stack block size given to every process
    #[arg(long, default_value_t = PROC_STACK_SIZE)]
    proc_stack_size: usize,

    /// Run shell commands from a file and print the console instead of starting the UI
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Skip the startup memory self-test
    #[arg(long)]
    skip_selftest: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let sink = if cli.script.is_some() {
        LogSink::Stderr
    } else {
        LogSink::Buffer
    };
    logging::init(cli.verbose, sink)?;

    let config = KernelConfig::default()
        .with_stack_bytes(cli.stack_bytes)
        .with_heap_bytes(cli.heap_bytes)
        .with_proc_stack_size(cli.proc_stack_size);

    let mut kernel = match Kernel::new(config) {
        Ok(kernel) => kernel,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    selftest::register_demo_entries(&mut kernel);

    shell::banner(&mut kernel);
    if !cli.skip_selftest {
        selftest::boot(&mut kernel);
    }
    shell::ready_hint(&mut kernel);

    let mut shell = Shell::new();

    if let Some(path) = cli.script {
        let script = fs::read_to_string(&path)?;
        for line in script.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if shell.execute(&mut kernel, line) == Outcome::Quit {
                break;
            }
        }
        for line in kernel.console().get_output() {
            println!("{}", line);
        }
        return Ok(());
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(kernel, shell);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
