//! # Example: task_cancel
//!
//! Demonstrates how to terminate a parked task and run its cleanup.
//!
//! Shows how to:
//! - Keep a task alive across several resumes.
//! - Terminate it with [`Task::terminate`].
//! - Catch [`TaskError::Terminated`] in the body for cleanup, then propagate it.
//!
//! ## Flow
//! ```text
//! main
//!   ├─► resume ×3 (worker ticks and parks each time)
//!   └─► terminate()
//!         ├─► parked suspend fails with Terminated
//!         ├─► worker runs cleanup
//!         └─► Terminated(Killed); terminate returns Ok
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example task_cancel
//! ```

use taskfiber::{Task, TaskError, TaskKind, suspend};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== task_cancel example ===\n");

    let worker: Task<()> = Task::new("worker", || {
        println!("[worker] started, will run until terminated");

        let mut counter = 0u32;
        loop {
            counter += 1;
            println!("[worker] tick #{counter}");
            match suspend(()) {
                Ok(()) => {}
                Err(TaskError::Terminated) => {
                    println!("[worker] terminated after {counter} ticks, cleaning up");
                    return Err(TaskError::Terminated);
                }
                Err(e) => return Err(e),
            }
        }
    });

    for _ in 0..3 {
        worker.resume(())?;
    }
    println!("\n[main] worker running: {}", worker.running());

    println!("[main] terminating worker...");
    worker.terminate()?;
    println!("[main] worker state: {:?}", worker.state());
    assert!(!worker.running(), "worker should be dead after terminate");

    // Terminating again is a no-op.
    worker.terminate()?;
    Ok(())
}
