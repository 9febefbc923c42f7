use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::*;
use crate::context::{self, ActorRef, Binding, BoundTask, MailboxRef};
use crate::error::{ConsistencyViolation, TaskError};
use crate::events::{Bus, EventKind};
use crate::fiber::FiberId;

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        if Instant::now() > deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(2));
    }
    true
}

#[test]
fn resume_values_flow_into_suspend() {
    let total = Arc::new(AtomicI32::new(0));
    let out = total.clone();
    let task: Task<i32> = Task::new(TaskKind::Call, move || {
        let a = suspend(1)?;
        let b = suspend(2)?;
        out.store(a + b, Ordering::SeqCst);
        Ok(())
    });

    assert!(task.running());
    assert_eq!(task.state(), TaskState::Created);

    assert_eq!(task.step(10), Ok(Step::Suspended(1)));
    assert_eq!(task.state(), TaskState::Suspended);
    assert_eq!(task.step(20), Ok(Step::Suspended(2)));
    assert!(task.running());
    assert_eq!(task.step(5), Ok(Step::Finished));

    assert_eq!(total.load(Ordering::SeqCst), 25);
    assert!(!task.running());
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Normal));
    assert_eq!(task.resume(1), Err(TaskError::DeadTask));
}

#[test]
fn terminate_kills_a_parked_task() {
    let task: Task<Option<i32>> = Task::new(TaskKind::Timer, || {
        suspend::<Option<i32>>(None)?;
        Ok(())
    });

    task.resume(Some(10)).unwrap();
    assert_eq!(task.state(), TaskState::Suspended);

    assert_eq!(task.terminate(), Ok(()));
    assert!(!task.running());
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Killed));
    assert_eq!(task.resume(Some(1)), Err(TaskError::DeadTask));
}

#[test]
fn terminate_on_finished_task_is_noop() {
    let task: Task<()> = Task::new(TaskKind::Call, || Ok(()));
    task.resume(()).unwrap();

    assert_eq!(task.terminate(), Ok(()));
    assert_eq!(task.terminate(), Ok(()));
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Normal));
}

#[test]
fn terminate_before_start_skips_body() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let task: Task<()> = Task::new(TaskKind::Call, move || {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });

    assert_eq!(task.terminate(), Ok(()));
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Killed));
}

#[test]
fn cleanup_runs_before_terminate_returns() {
    let cleaned = Arc::new(AtomicBool::new(false));
    let flag = cleaned.clone();
    let task: Task<()> = Task::new(TaskKind::Call, move || match suspend(()) {
        Err(e) if e.is_terminated() => {
            flag.store(true, Ordering::SeqCst);
            Err(e)
        }
        other => other,
    });

    task.resume(()).unwrap();
    assert!(!cleaned.load(Ordering::SeqCst));

    task.terminate().unwrap();
    assert!(cleaned.load(Ordering::SeqCst));
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Killed));
}

#[test]
fn cleanup_failure_surfaces_from_terminate() {
    let task: Task<()> = Task::new(TaskKind::Call, || match suspend(()) {
        Err(TaskError::Terminated) => Err(TaskError::fail("cleanup failed")),
        other => other,
    });

    task.resume(()).unwrap();
    assert_eq!(
        task.terminate(),
        Err(TaskError::Fail {
            error: "cleanup failed".into()
        })
    );
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Faulted));
}

#[test]
fn body_error_propagates_from_resume() {
    let task: Task<()> = Task::new(TaskKind::Call, || Err(TaskError::fail("boom")));

    assert_eq!(
        task.resume(()),
        Err(TaskError::Fail {
            error: "boom".into()
        })
    );
    assert!(!task.running());
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Faulted));
    assert_eq!(task.resume(()), Err(TaskError::DeadTask));
    assert_eq!(task.terminate(), Ok(()));
}

#[test]
fn body_panic_is_reraised_in_resumer() {
    let task: Task<()> = Task::new(TaskKind::Call, || panic!("body exploded"));

    let payload = panic::catch_unwind(AssertUnwindSafe(|| task.resume(()))).unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"body exploded"));
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Faulted));
    assert_eq!(task.resume(()), Err(TaskError::DeadTask));
}

#[test]
fn context_is_captured_at_creation() {
    let seen: Arc<Mutex<Option<(String, u32)>>> = Arc::new(Mutex::new(None));
    let out = seen.clone();

    let task: Task<()> = {
        let _guard = context::enter(
            Some(ActorRef::new(String::from("greeter"))),
            Some(MailboxRef::new(42u32)),
        );
        Task::new(TaskKind::Call, move || {
            let actor = context::current_actor().ok_or_else(|| TaskError::fail("no actor"))?;
            let mailbox =
                context::current_mailbox().ok_or_else(|| TaskError::fail("no mailbox"))?;
            *out.lock() = Some((
                actor.downcast_ref::<String>().cloned().unwrap_or_default(),
                mailbox.downcast_ref::<u32>().copied().unwrap_or_default(),
            ));
            Ok(())
        })
    };
    assert!(context::current_actor().is_none());

    // Driven from a thread that never had any context.
    thread::spawn(move || task.resume(()))
        .join()
        .unwrap()
        .unwrap();

    assert_eq!(*seen.lock(), Some((String::from("greeter"), 42)));
}

#[test]
fn current_returns_the_running_task() {
    let slot: Arc<Mutex<Option<Task<u8>>>> = Arc::new(Mutex::new(None));
    let out = slot.clone();
    let task: Task<u8> = Task::new(TaskKind::Call, move || {
        *out.lock() = Some(Task::<u8>::current()?);
        Ok(())
    });

    task.resume(0).unwrap();
    let me = slot.lock().take().unwrap();
    assert!(me.ptr_eq(&task));
    assert_eq!(me.kind(), &TaskKind::Call);
    assert_eq!(me.id(), task.id());
}

#[test]
fn outside_a_task_there_is_no_scope() {
    assert_eq!(Task::<u8>::current().unwrap_err(), TaskError::NotInTaskScope);
    assert_eq!(suspend(1u8), Err(TaskError::NotInTaskScope));
    assert!(is_consistent());
}

#[test]
fn suspend_with_wrong_value_type_fails() {
    let task: Task<u8> = Task::new(TaskKind::Call, || {
        suspend(String::from("nope"))?;
        Ok(())
    });

    match task.resume(0) {
        Err(TaskError::ValueMismatch { expected }) => assert!(expected.contains("String")),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn task_cannot_resume_or_terminate_itself() {
    let task: Task<u8> = Task::new(TaskKind::Call, || {
        let me = Task::<u8>::current()?;
        assert_eq!(me.terminate(), Err(TaskError::AlreadyRunning));
        me.resume(1)
    });

    assert_eq!(task.resume(0), Err(TaskError::AlreadyRunning));
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Faulted));
}

#[test]
fn concurrent_resume_is_rejected() {
    let (release_tx, release_rx) = crossbeam::channel::bounded::<()>(1);
    let task: Task<()> = Task::new(TaskKind::Call, move || {
        release_rx.recv().map_err(TaskError::fail)?;
        Ok(())
    });

    let driver = {
        let task = task.clone();
        thread::spawn(move || task.resume(()))
    };
    assert!(wait_until(|| task.state() == TaskState::Running));
    assert_eq!(task.resume(()), Err(TaskError::AlreadyRunning));

    release_tx.send(()).unwrap();
    assert_eq!(driver.join().unwrap(), Ok(()));
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Normal));
}

#[test]
fn nested_tasks_keep_their_own_binding() {
    let outer: Task<u8> = Task::new(TaskKind::Call, || {
        let outer_id = Task::<u8>::current()?.id();
        let inner: Task<u8> = Task::new(TaskKind::Timer, move || {
            let me = Task::<u8>::current()?;
            if me.id() == outer_id || !is_consistent() {
                return Err(TaskError::fail("inner saw the outer binding"));
            }
            suspend(7u8)?;
            Ok(())
        });

        if inner.step(0)? != Step::Suspended(7) || !is_consistent() {
            return Err(TaskError::fail("outer binding lost after resume"));
        }
        inner.terminate()?;
        if inner.state() != TaskState::Terminated(TaskExit::Killed) {
            return Err(TaskError::fail("inner not killed"));
        }
        Ok(())
    });

    assert_eq!(outer.resume(0), Ok(()));
}

fn stale_binding(fiber: FiberId) -> Binding {
    let handle: Weak<dyn Any + Send + Sync> = Weak::<()>::new();
    Binding {
        task: Some(BoundTask { fiber, handle }),
        actor: None,
        mailbox: None,
    }
}

fn violation_on_resume(task: &Task<()>) -> ConsistencyViolation {
    let payload = panic::catch_unwind(AssertUnwindSafe(|| task.resume(()))).unwrap_err();
    payload
        .downcast_ref::<ConsistencyViolation>()
        .cloned()
        .unwrap()
}

#[test]
fn mismatched_binding_is_fatal_before_suspending() {
    let stale = FiberId::next();
    let task: Task<()> = Task::new(TaskKind::Call, move || {
        context::install(stale_binding(stale));
        if is_consistent() {
            return Err(TaskError::fail("stale binding passed the check"));
        }
        suspend(())?;
        Ok(())
    });

    let violation = violation_on_resume(&task);
    assert_eq!(
        violation,
        ConsistencyViolation {
            bound: Some(stale),
            running: Some(task.fiber_id()),
        }
    );
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Faulted));
}

#[test]
fn mismatched_binding_is_fatal_at_fiber_start() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let task: Task<()> = Task::new(TaskKind::Call, move || {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });

    let stale = FiberId::next();
    context::rebind_on_resume(task.fiber_id(), stale_binding(stale));

    let violation = violation_on_resume(&task);
    assert_eq!(violation.bound, Some(stale));
    assert_eq!(violation.running, Some(task.fiber_id()));
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Faulted));
}

#[test]
fn binding_changed_while_parked_is_fatal_on_resume() {
    let reached = Arc::new(AtomicBool::new(false));
    let flag = reached.clone();
    let task: Task<()> = Task::new(TaskKind::Call, move || {
        suspend(())?;
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });

    task.resume(()).unwrap();
    let stale = FiberId::next();
    context::rebind_on_resume(task.fiber_id(), stale_binding(stale));

    let violation = violation_on_resume(&task);
    assert_eq!(
        violation,
        ConsistencyViolation {
            bound: Some(stale),
            running: Some(task.fiber_id()),
        }
    );
    assert!(!reached.load(Ordering::SeqCst));
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Faulted));
}

#[test]
fn terminal_cause_is_recorded_before_fiber_thread_exits() {
    struct SlowDrop;
    impl Drop for SlowDrop {
        fn drop(&mut self) {
            thread::sleep(Duration::from_millis(50));
        }
    }

    // The mailbox's last handle lives in the fiber thread's binding, so the
    // fiber thread is still winding down after the body returned.
    let task: Task<()> = {
        let _guard = context::enter(None, Some(MailboxRef::new(SlowDrop)));
        Task::new(TaskKind::Call, || Ok(()))
    };

    let driver = {
        let task = task.clone();
        thread::spawn(move || task.resume(()))
    };
    let mut seen = vec![task.state()];
    while !driver.is_finished() {
        let state = task.state();
        if seen.last() != Some(&state) {
            seen.push(state);
        }
        thread::yield_now();
    }

    assert_eq!(driver.join().unwrap(), Ok(()));
    assert!(
        !seen.contains(&TaskState::Terminated(TaskExit::Faulted)),
        "{seen:?}"
    );
    assert_eq!(task.state(), TaskState::Terminated(TaskExit::Normal));
}

#[test]
fn lifecycle_events_are_published() {
    let bus = Bus::new(32);
    let mut rx = bus.subscribe();
    let task: Task<i32> = TaskBuilder::new("call").with_bus(bus).build(|| {
        suspend(1i32)?;
        Ok(())
    });

    task.resume(0).unwrap();
    task.resume(0).unwrap();

    let mut kinds = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        assert_eq!(ev.task, Some(task.id().as_u64()));
        assert_eq!(ev.kind_label.as_deref(), Some("call"));
        kinds.push(ev.kind);
    }
    assert_eq!(
        kinds,
        vec![
            EventKind::TaskCreated,
            EventKind::TaskStarting,
            EventKind::TaskSuspended,
            EventKind::TaskResumed,
            EventKind::TaskStopped,
        ]
    );
}

#[test]
fn failure_event_carries_reason() {
    let bus = Bus::new(8);
    let mut rx = bus.subscribe();
    let task: Task<()> = TaskBuilder::new(TaskKind::Call)
        .with_bus(bus)
        .build(|| Err(TaskError::fail("boom")));

    let _ = task.resume(());

    let last = std::iter::from_fn(|| rx.try_recv().ok()).last().unwrap();
    assert_eq!(last.kind, EventKind::TaskFailed);
    assert_eq!(last.reason.as_deref(), Some("task failed: boom"));
}

#[test]
fn dropping_a_parked_task_unwinds_its_body() {
    struct Guard(Arc<AtomicBool>);
    impl Drop for Guard {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    let dropped = Arc::new(AtomicBool::new(false));
    let flag = dropped.clone();
    let task: Task<()> = Task::new(TaskKind::Call, move || {
        let _guard = Guard(flag);
        suspend(())?;
        Ok(())
    });

    task.resume(()).unwrap();
    drop(task);
    assert!(wait_until(|| dropped.load(Ordering::SeqCst)));
}

#[test]
fn debug_shows_kind_and_liveness() {
    let task: Task<()> = Task::new(TaskKind::Timer, || Ok(()));
    let text = format!("{task:?}");
    assert!(text.contains("kind: Timer"), "{text}");
    assert!(text.contains("running: true"), "{text}");

    task.resume(()).unwrap();
    assert!(format!("{task:?}").contains("running: false"));
}

// Inspection works for any value type, including ones that are not `Send`.
fn snapshot<V>(task: &Task<V>) -> (TaskState, bool, FiberId) {
    (task.state(), task.running(), task.fiber_id())
}

#[test]
fn inspection_needs_no_value_bounds() {
    let task: Task<u8> = Task::new(TaskKind::Call, || Ok(()));
    let (state, running, fiber) = snapshot(&task);
    assert_eq!(state, TaskState::Created);
    assert!(running);
    assert_eq!(fiber, task.fiber_id());

    task.resume(0).unwrap();
    assert_eq!(snapshot(&task).0, TaskState::Terminated(TaskExit::Normal));
}
