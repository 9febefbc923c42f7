//! # Example: basic_one_shot
//!
//! Minimal example of a single task driven to completion by hand.
//!
//! Demonstrates how to:
//! - Create a task with [`Task::new`].
//! - Drive it with [`Task::step`] and read what it passes to [`suspend`].
//! - Observe the terminal state after the body returns.
//!
//! ## Flow
//! ```text
//! main ──step(0)──►  body: suspend(1) ─► parks
//! main ──step(20)─►  body: a = 20, suspend(2) ─► parks
//! main ──step(5)──►  body: b = 5, returns ─► Terminated(Normal)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_one_shot
//! ```

use taskfiber::{Step, Task, TaskKind, suspend};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== basic_one_shot example ===\n");

    // 1. Define the task; nothing runs yet
    let task: Task<u32> = Task::new(TaskKind::Call, || {
        println!("[task] started");
        let a: u32 = suspend(1)?;
        let b: u32 = suspend(2)?;
        println!("[task] a={a} b={b} total={}", a + b);
        Ok(())
    });
    println!("[main] created {task:?} state={:?}", task.state());

    // 2. Drive it: the start value is unused, later values go to the parked suspend
    for value in [0, 20, 5] {
        match task.step(value)? {
            Step::Suspended(out) => println!("[main] resumed with {value}, task yielded {out}"),
            Step::Finished => println!("[main] resumed with {value}, task finished"),
        }
    }

    // 3. A dead task rejects further resumes
    println!("[main] final state={:?}", task.state());
    if let Err(e) = task.resume(0) {
        println!("[main] resume after finish: {e}");
    }
    Ok(())
}
