//! Narrated self-tests and the demo entry routines they run
//!
//! Every check writes one line to the kernel console and the suites return
//! whether all of their checks passed.

use crate::kernel::process::ProcessState;
use crate::kernel::Kernel;

const RULE: &str = "─────────────────────────────────────";

fn mark(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}

fn step(kernel: &mut Kernel, label: &str, ok: bool) -> bool {
    kernel
        .console_mut()
        .write_line(&format!("{} {}", label, mark(ok)));
    ok
}

fn verdict(kernel: &mut Kernel, subsystem: &str, ok: bool) -> bool {
    let text = if ok { "OK" } else { "FAILED" };
    kernel
        .console_mut()
        .write_line(&format!("{} {}: {}", mark(ok), subsystem, text));
    ok
}

/// Register `hello`, `count`, `mem` and `inbox`
pub fn register_demo_entries(kernel: &mut Kernel) {
    kernel.register_entry("hello", |k: &mut Kernel| {
        k.console_mut().write_line("    [P] Hello from process!");
    });

    kernel.register_entry("count", |k: &mut Kernel| {
        k.console_mut().write_line("    [P] Counting: 1 2 3");
    });

    kernel.register_entry("mem", |k: &mut Kernel| {
        k.console_mut().write_line("    [P] Testing heap allocation");
        match k.heap_alloc(256) {
            Ok(addr) => {
                k.console_mut().write_line("    [P] Success!");
                // Freshly returned payload, cannot be rejected
                let _ = k.heap_free(Some(addr));
            }
            Err(e) => k
                .console_mut()
                .write_line(&format!("    [P] Allocation failed: {}", e)),
        }
    });

    kernel.register_entry("inbox", |k: &mut Kernel| {
        let Some(pid) = k.current() else {
            return;
        };
        let line = match k.recv(pid) {
            Ok(message) => format!(
                "    [P] Mailbox: {}",
                String::from_utf8_lossy(&message)
            ),
            Err(_) => "    [P] Mailbox empty".to_string(),
        };
        k.console_mut().write_line(&line);
    });
}

/// Stack then heap, ending with a 1024-byte request that needs coalescing
pub fn memory(kernel: &mut Kernel) -> bool {
    kernel.console_mut().write_line("");
    kernel.console_mut().write_line("[MEMORY TEST]");
    kernel.console_mut().write_line(RULE);

    let mut ok = true;
    let s1 = kernel.stack_alloc(256);
    ok &= step(kernel, "1. Stack: allocating 256B...", s1.is_ok());
    if s1.is_ok() {
        kernel.stack_free(256);
    }
    let released = kernel.memory().stack().mark() == 0;
    ok &= step(kernel, "2. Stack: deallocating...", released);

    let h1 = kernel.heap_alloc(512).ok();
    ok &= step(kernel, "3. Heap: allocating 512B...", h1.is_some());
    let h2 = kernel.heap_alloc(512).ok();
    ok &= step(kernel, "4. Heap: allocating 512B...", h2.is_some());
    let h3 = kernel.heap_alloc(512).ok();
    ok &= step(kernel, "5. Heap: allocating 512B...", h3.is_some());

    let freed = [h1, h2, h3]
        .into_iter()
        .map(|block| kernel.heap_free(block).is_ok())
        .fold(true, |all, ok| all && ok);
    ok &= step(kernel, "6. Heap: freeing all...", freed);

    match kernel.heap_alloc(1024) {
        Ok(big) => {
            let released = kernel.heap_free(Some(big)).is_ok();
            ok &= step(kernel, "7. Coalescing: allocating 1024B... (coalescing works!)", released);
        }
        Err(_) => ok &= step(kernel, "7. Coalescing: allocating 1024B...", false),
    }

    verdict(kernel, "MEMORY", ok)
}

/// Create two processes, ready them, terminate one and check the other survives
pub fn process(kernel: &mut Kernel) -> bool {
    kernel.console_mut().write_line("");
    kernel.console_mut().write_line("[PROCESS TEST]");
    kernel.console_mut().write_line(RULE);

    let mut ok = true;
    let p1 = kernel.spawn("hello");
    ok &= step(kernel, "1. Creating first process...", p1.is_ok());
    let p2 = kernel.spawn("count");
    ok &= step(kernel, "2. Creating second process...", p2.is_ok());

    let (p1, p2) = match (p1, p2) {
        (Ok(p1), Ok(p2)) => (p1, p2),
        (p1, p2) => {
            // Release whichever one did get a slot
            for pid in [p1, p2].into_iter().flatten() {
                let _ = kernel.terminate(pid);
            }
            return verdict(kernel, "PROCESS", false);
        }
    };

    let ready = kernel.set_state(p1, ProcessState::Ready).is_ok();
    ok &= step(kernel, &format!("3. Setting PID {} to READY...", p1), ready);
    let ready = kernel.set_state(p2, ProcessState::Ready).is_ok();
    ok &= step(kernel, &format!("4. Setting PID {} to READY...", p2), ready);

    kernel.console_mut().write_line("5. Checking states...");
    for pid in [p1, p2] {
        let state = kernel.get_state(pid);
        ok &= step(
            kernel,
            &format!("   - PID {}: {}", pid, state),
            state == ProcessState::Ready,
        );
    }

    let killed = kernel.terminate(p1).is_ok();
    ok &= step(kernel, &format!("6. Terminating PID {}...", p1), killed);
    let gone = kernel.get_state(p1) == ProcessState::Terminated;
    ok &= step(kernel, "7. Verifying terminated...", gone);
    let alive = kernel.is_alive(p2);
    ok &= step(kernel, &format!("8. PID {} still alive...", p2), alive);

    ok &= kernel.terminate(p2).is_ok();
    verdict(kernel, "PROCESS", ok)
}

/// Run three ready processes through the scheduler
pub fn scheduler(kernel: &mut Kernel) -> bool {
    kernel.console_mut().write_line("");
    kernel.console_mut().write_line("[SCHEDULER TEST]");
    kernel.console_mut().write_line(RULE);

    kernel.scheduler_init();
    step(kernel, "1. Initializing scheduler...", true);

    kernel.console_mut().write_line("2. Creating test processes...");
    let mut pids = Vec::new();
    for name in ["hello", "count", "mem"] {
        match kernel.spawn(name) {
            Ok(pid) => pids.push(pid),
            Err(e) => {
                kernel
                    .console_mut()
                    .write_line(&format!("   {} could not be created: {}", name, e));
            }
        }
    }
    let created = pids.len() == 3;
    let listed = pids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let mut ok = step(kernel, &format!("   PID {} created", listed), created);

    let readied = pids
        .iter()
        .all(|&pid| kernel.set_state(pid, ProcessState::Ready).is_ok());
    ok &= step(kernel, "3. Setting all to READY...", readied);

    kernel.console_mut().write_line("4. Running scheduler...");
    kernel.console_mut().write_line("");
    match kernel.run() {
        Ok(report) => {
            ok &= report.dispatched == pids;
            ok &= pids.iter().all(|&pid| !kernel.is_alive(pid));
        }
        Err(e) => {
            kernel
                .console_mut()
                .write_line(&format!("   Scheduler stopped: {}", e));
            ok = false;
        }
    }

    kernel.console_mut().write_line("");
    verdict(kernel, "SCHEDULER", ok)
}

/// All three suites between banners
pub fn full(kernel: &mut Kernel) -> bool {
    let console = kernel.console_mut();
    console.write_line("");
    console.write_line("╔═════════════════════════════════════╗");
    console.write_line("║   kacchiOS COMPLETE SYSTEM TEST     ║");
    console.write_line("║   Memory + Process + Scheduler      ║");
    console.write_line("╚═════════════════════════════════════╝");

    let memory_ok = memory(kernel);
    let process_ok = process(kernel);
    let scheduler_ok = scheduler(kernel);
    let ok = memory_ok && process_ok && scheduler_ok;

    let console = kernel.console_mut();
    console.write_line("");
    console.write_line("╔═════════════════════════════════════╗");
    if ok {
        console.write_line("║   ALL SUBSYSTEMS VERIFIED           ║");
    } else {
        console.write_line("║   SOME SUBSYSTEMS FAILED            ║");
    }
    console.write_line("╚═════════════════════════════════════╝");
    ok
}

/// Quick memory check run once at startup
pub fn boot(kernel: &mut Kernel) -> bool {
    kernel.console_mut().write_line("");
    kernel
        .console_mut()
        .write_line("=== kacchiOS Memory Self-Test ===");

    kernel
        .console_mut()
        .write_line("Phase 1: testing stack allocator...");
    let stack_ok = match kernel.stack_alloc(100) {
        Ok(_) => {
            kernel
                .console_mut()
                .write_line("  -> 100 bytes allocated on stack.");
            kernel.stack_free(100);
            kernel
                .console_mut()
                .write_line("  -> 100 bytes released from stack. OK.");
            true
        }
        Err(_) => {
            kernel
                .console_mut()
                .write_line("  -> Stack allocation failed unexpectedly.");
            false
        }
    };

    kernel
        .console_mut()
        .write_line("Phase 2: heap fragmentation / merge test...");
    let blocks = [
        kernel.heap_alloc(512).ok(),
        kernel.heap_alloc(512).ok(),
        kernel.heap_alloc(512).ok(),
    ];
    if blocks.iter().any(Option::is_none) {
        for block in blocks {
            let _ = kernel.heap_free(block);
        }
        kernel
            .console_mut()
            .write_line("  -> Unable to allocate 3 x 512-byte heap blocks.");
        return false;
    }
    kernel
        .console_mut()
        .write_line("  -> Successfully allocated three 512-byte heap blocks.");
    kernel
        .console_mut()
        .write_line("  -> Freeing all three blocks to trigger coalescing...");
    for block in blocks {
        let _ = kernel.heap_free(block);
    }

    kernel
        .console_mut()
        .write_line("Phase 3: checking for a merged region...");
    let heap_ok = match kernel.heap_alloc(1024) {
        Ok(big) => {
            let _ = kernel.heap_free(Some(big));
            kernel
                .console_mut()
                .write_line("  -> SUCCESS: 1024-byte allocation succeeded after merge.");
            true
        }
        Err(_) => {
            kernel.console_mut().write_line(
                "  -> FAILURE: Heap still fragmented; 1024-byte block not available.",
            );
            false
        }
    };

    kernel
        .console_mut()
        .write_line("=== Memory Self-Test Complete ===");
    stack_ok && heap_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use crate::kernel::constants::SEGMENT_HEADER_SIZE;

    fn kernel() -> Kernel {
        let mut kernel = Kernel::new(KernelConfig::default()).unwrap();
        register_demo_entries(&mut kernel);
        kernel
    }

    #[test]
    fn every_suite_passes_on_a_fresh_kernel() {
        let mut kernel = kernel();
        assert!(boot(&mut kernel));
        assert!(full(&mut kernel));
        assert_eq!(kernel.processes().live_count(), 0);
        assert_eq!(kernel.memory().heap().used_bytes(), 0);
        assert_eq!(kernel.memory().stack().mark(), 0);
    }

    #[test]
    fn suites_report_failure_on_a_tiny_heap() {
        let config = KernelConfig::default().with_heap_bytes(1024);
        let mut kernel = Kernel::new(config).unwrap();
        register_demo_entries(&mut kernel);
        assert!(!memory(&mut kernel));
        assert!(!process(&mut kernel));
        assert!(kernel
            .console()
            .lines()
            .any(|line| line == "✗ MEMORY: FAILED"));
    }

    #[test]
    fn memory_suite_checks_the_stack_mark_and_frees_every_block() {
        let mut kernel = kernel();
        kernel.stack_alloc(64).unwrap();
        assert!(!memory(&mut kernel));
        assert!(kernel
            .console()
            .lines()
            .any(|line| line == "2. Stack: deallocating... ✗"));
        assert_eq!(kernel.memory().heap().used_bytes(), 0);
    }

    #[test]
    fn memory_suite_releases_blocks_even_when_one_is_missing() {
        // Room for two 512-byte blocks but not a third
        let config = KernelConfig::default().with_heap_bytes(2 * (512 + SEGMENT_HEADER_SIZE) + 100);
        let mut kernel = Kernel::new(config).unwrap();
        assert!(!memory(&mut kernel));
        assert_eq!(kernel.memory().heap().used_bytes(), 0);
        assert_eq!(kernel.memory().heap().segment_count(), 1);
    }

    #[test]
    fn inbox_prints_its_message() {
        let mut kernel = kernel();
        let pid = kernel.spawn("inbox").unwrap();
        kernel.send(pid, b"ping").unwrap();
        kernel.set_state(pid, ProcessState::Ready).unwrap();
        kernel.run().unwrap();
        assert!(kernel
            .console()
            .lines()
            .any(|line| line == "    [P] Mailbox: ping"));
    }
}
