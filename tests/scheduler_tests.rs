// Integration tests for the round-robin scheduler loop

use kacchi::config::KernelConfig;
use kacchi::kernel::process::{Pid, ProcessState};
use kacchi::kernel::scheduler::RunOutcome;
use kacchi::kernel::Kernel;
use std::cell::RefCell;
use std::rc::Rc;

fn kernel() -> Kernel {
    let mut kernel = Kernel::new(KernelConfig::default()).unwrap();
    kernel.register_entry("noop", |_: &mut Kernel| {});
    kernel
}

fn spawn_ready(kernel: &mut Kernel, name: &str) -> Pid {
    let pid = kernel.spawn(name).unwrap();
    kernel.set_state(pid, ProcessState::Ready).unwrap();
    pid
}

#[test]
fn test_three_ready_processes_run_once_each() {
    let mut kernel = kernel();
    let order = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&order);
    kernel.register_entry("record", move |k: &mut Kernel| {
        let pid = k.current().unwrap();
        assert_eq!(k.get_state(pid), ProcessState::Running);
        seen.borrow_mut().push(pid);
    });

    let pids: Vec<_> = (0..3).map(|_| spawn_ready(&mut kernel, "record")).collect();
    let report = kernel.run().unwrap();

    assert_eq!(report.outcome, RunOutcome::Idle);
    assert_eq!(report.dispatched, pids);
    assert_eq!(*order.borrow(), pids);
    assert!(pids.iter().all(|&pid| !kernel.is_alive(pid)));
    assert_eq!(kernel.memory().heap().used_bytes(), 0);
    assert_eq!(kernel.scheduler().dispatch_count(), 3);
}

#[test]
fn test_trace_lines() {
    let mut kernel = kernel();
    spawn_ready(&mut kernel, "noop");
    kernel.run().unwrap();

    let lines: Vec<_> = kernel.console().lines().collect();
    assert_eq!(
        lines,
        vec![
            "[Scheduler] Starting Round-Robin scheduling",
            "[Scheduler] Running process 0",
            "[Scheduler] Process 0 terminated",
            "[Scheduler] No READY process. CPU idle.",
        ]
    );
}

#[test]
fn test_run_with_nothing_ready_returns_idle() {
    let mut kernel = kernel();
    let waiting = kernel.spawn("noop").unwrap();

    let report = kernel.run().unwrap();
    assert!(report.dispatched.is_empty());
    assert_eq!(report.outcome, RunOutcome::Idle);
    assert_eq!(kernel.get_state(waiting), ProcessState::New);
}

#[test]
fn test_scan_resumes_after_the_last_dispatched_slot() {
    let mut kernel = kernel();
    let pids: Vec<_> = (0..4).map(|_| kernel.spawn("noop").unwrap()).collect();

    kernel.set_state(pids[1], ProcessState::Ready).unwrap();
    assert_eq!(kernel.run().unwrap().dispatched, vec![1]);
    assert_eq!(kernel.scheduler().last_dispatched(), Some(1));
    assert_eq!(kernel.current(), None);

    kernel.set_state(pids[0], ProcessState::Ready).unwrap();
    kernel.set_state(pids[3], ProcessState::Ready).unwrap();
    assert_eq!(kernel.run().unwrap().dispatched, vec![3, 0]);
}

#[test]
fn test_scheduler_init_restarts_the_scan_at_zero() {
    let mut kernel = kernel();
    let pids: Vec<_> = (0..3).map(|_| kernel.spawn("noop").unwrap()).collect();
    kernel.set_state(pids[1], ProcessState::Ready).unwrap();
    kernel.run().unwrap();

    kernel.set_state(pids[0], ProcessState::Ready).unwrap();
    kernel.set_state(pids[2], ProcessState::Ready).unwrap();
    kernel.scheduler_init();
    assert_eq!(kernel.run().unwrap().dispatched, vec![0, 2]);
}

#[test]
fn test_process_readied_during_a_run_is_dispatched_in_the_same_run() {
    let mut kernel = kernel();
    kernel.register_entry("parent", |k: &mut Kernel| {
        let child = k.spawn("noop").unwrap();
        k.set_state(child, ProcessState::Ready).unwrap();
    });

    spawn_ready(&mut kernel, "parent");
    let report = kernel.run().unwrap();
    assert_eq!(report.dispatched, vec![0, 1]);
    assert_eq!(kernel.processes().live_count(), 0);
}

#[test]
fn test_yield_and_self_termination_still_end_in_terminated() {
    let mut kernel = kernel();
    kernel.register_entry("yielder", |k: &mut Kernel| {
        assert!(k.yield_current());
    });
    kernel.register_entry("quitter", |k: &mut Kernel| {
        let me = k.current().unwrap();
        k.terminate(me).unwrap();
    });

    let a = spawn_ready(&mut kernel, "yielder");
    let b = spawn_ready(&mut kernel, "quitter");
    let report = kernel.run().unwrap();

    assert_eq!(report.dispatched, vec![a, b]);
    assert!(!kernel.is_alive(a));
    assert!(!kernel.is_alive(b));
    assert_eq!(kernel.memory().heap().segment_count(), 1);
}

#[test]
fn test_entry_can_read_its_mailbox() {
    let mut kernel = kernel();
    let got = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&got);
    kernel.register_entry("reader", move |k: &mut Kernel| {
        let me = k.current().unwrap();
        *slot.borrow_mut() = k.recv(me).ok();
    });

    let pid = spawn_ready(&mut kernel, "reader");
    kernel.send(pid, b"wake").unwrap();
    kernel.run().unwrap();
    assert_eq!(got.borrow().as_deref(), Some(&b"wake"[..]));
}

#[test]
fn test_process_created_after_self_termination_still_runs() {
    let mut kernel = kernel();
    let ran = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&ran);
    kernel.register_entry("child", move |_: &mut Kernel| {
        *flag.borrow_mut() = true;
    });
    kernel.register_entry("parent", |k: &mut Kernel| {
        let me = k.current().unwrap();
        k.terminate(me).unwrap();
        // The freed slot is the lowest one, so the child reuses it
        let child = k.spawn("child").unwrap();
        assert_eq!(child, me);
        k.set_state(child, ProcessState::Ready).unwrap();
    });

    let parent = spawn_ready(&mut kernel, "parent");
    let report = kernel.run().unwrap();

    assert!(*ran.borrow());
    assert_eq!(report.dispatched, vec![parent, parent]);
    assert_eq!(kernel.processes().live_count(), 0);
    assert_eq!(kernel.memory().heap().used_bytes(), 0);
}

#[test]
fn test_yield_outside_a_run_touches_nothing() {
    let mut kernel = kernel();
    let first = spawn_ready(&mut kernel, "noop");
    kernel.run().unwrap();

    let reused = kernel.spawn("noop").unwrap();
    assert_eq!(reused, first);
    assert_eq!(kernel.current(), None);
    assert!(!kernel.yield_current());
    assert_eq!(kernel.get_state(reused), ProcessState::New);
}
