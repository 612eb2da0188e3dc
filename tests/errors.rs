use frame_reactor::{FrameData, FrameScheduler, SchedulerError, Task, TaskState};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn failing_leaf(frames: u32) -> Task<FrameData, u32> {
    Task::new(move |cx| async move {
        for _ in 0..frames {
            cx.next_frame().await;
        }
        anyhow::bail!("leaf exploded")
    })
}

fn forwarding_middle(frames: u32) -> Task<FrameData, u32> {
    Task::new(move |cx| async move {
        let value = cx.call(failing_leaf(frames)).await?;
        Ok(value + 1)
    })
}

#[test]
fn test_root_failure_is_reported_by_tick() {
    let mut scheduler: FrameScheduler = FrameScheduler::new();
    let handle = scheduler
        .push(Task::new(|cx| async move {
            cx.next_frame().await;
            anyhow::bail!("root exploded")
        }))
        .unwrap();

    scheduler.tick(FrameData::default()).unwrap();
    let error = scheduler.tick(FrameData::default()).unwrap_err();

    assert_eq!(error.frame, 2);
    assert_eq!(error.failures.len(), 1);
    assert_eq!(error.failures[0].task, handle.id());
    assert_eq!(error.failures[0].error.to_string(), "root exploded");
    assert_eq!(handle.state(), TaskState::Failed);
    assert!(scheduler.is_idle(), "failed root tasks are released");
}

#[test]
fn test_nested_error_reaches_first_unhandled_ancestor() {
    let mut scheduler: FrameScheduler = FrameScheduler::new();
    let handle = scheduler
        .push(Task::new(|cx| async move {
            cx.call(forwarding_middle(1)).await?;
            Ok(())
        }))
        .unwrap();

    scheduler.tick(FrameData::default()).unwrap();
    let error = scheduler.tick(FrameData::default()).unwrap_err();

    let messages: Vec<String> = error.errors().map(ToString::to_string).collect();
    assert_eq!(messages, vec!["leaf exploded"]);
    assert_eq!(handle.state(), TaskState::Failed);
}

#[test]
fn test_caught_error_is_observed_once() {
    let mut scheduler: FrameScheduler = FrameScheduler::new();
    let caught = Rc::new(RefCell::new(Vec::new()));
    let c = caught.clone();

    let handle = scheduler
        .push(Task::new(move |cx| async move {
            match cx.call(forwarding_middle(1)).await {
                Ok(value) => c.borrow_mut().push(format!("unexpected value {value}")),
                Err(error) => c.borrow_mut().push(error.to_string()),
            }
            Ok(())
        }))
        .unwrap();

    scheduler.tick(FrameData::default()).unwrap();
    scheduler
        .tick(FrameData::default())
        .expect("a handled error must not surface at the tick");

    assert_eq!(*caught.borrow(), vec!["leaf exploded".to_string()]);
    assert_eq!(handle.state(), TaskState::Completed);

    // The scheduler keeps working afterwards.
    let ran = Rc::new(Cell::new(false));
    let r = ran.clone();
    scheduler
        .push(Task::new(move |cx| async move {
            cx.next_frame().await;
            r.set(true);
            Ok(())
        }))
        .unwrap();

    for _ in 0..3 {
        scheduler.tick(FrameData::default()).unwrap();
    }
    assert!(ran.get());
    assert_eq!(caught.borrow().len(), 1);
}

#[test]
fn test_synchronous_child_failure() {
    let mut scheduler: FrameScheduler = FrameScheduler::new();
    let caught = Rc::new(RefCell::new(None));
    let c = caught.clone();

    scheduler
        .push(Task::new(move |cx| async move {
            if let Err(error) = cx.call(failing_leaf(0)).await {
                *c.borrow_mut() = Some(error.to_string());
            }
            Ok(())
        }))
        .unwrap();

    scheduler.tick(FrameData::default()).unwrap();

    assert_eq!(caught.borrow().as_deref(), Some("leaf exploded"));
    assert!(scheduler.is_idle());
}

#[test]
fn test_failure_does_not_stop_the_tick() {
    let mut scheduler: FrameScheduler = FrameScheduler::new();
    let progress = Rc::new(Cell::new(0));

    scheduler
        .push(Task::new(|_cx| async move { anyhow::bail!("first fails") }))
        .unwrap();

    let p = progress.clone();
    let survivor = scheduler
        .push(Task::new(move |cx| async move {
            p.set(1);
            cx.next_frame().await;
            p.set(2);
            Ok(())
        }))
        .unwrap();

    scheduler
        .push(Task::new(|_cx| async move { anyhow::bail!("third fails") }))
        .unwrap();

    let error = scheduler.tick(FrameData::default()).unwrap_err();
    let messages: Vec<String> = error.errors().map(ToString::to_string).collect();
    assert_eq!(messages, vec!["first fails", "third fails"]);
    assert_eq!(progress.get(), 1, "tasks after a failure still bootstrap");

    scheduler.tick(FrameData::default()).unwrap();
    assert_eq!(progress.get(), 2);
    assert!(survivor.is_finished());
}

#[test]
fn test_spawn_after_scheduler_dropped() {
    let mut scheduler: FrameScheduler = FrameScheduler::new();
    let stored = Rc::new(RefCell::new(None));
    let s = stored.clone();

    scheduler
        .push(Task::new(move |cx| async move {
            *s.borrow_mut() = Some(cx);
            Ok(())
        }))
        .unwrap();
    scheduler.tick(FrameData::default()).unwrap();
    drop(scheduler);

    let cx = stored.borrow_mut().take().unwrap();
    let result = cx.spawn(Task::new(|_cx| async { Ok(()) }));

    assert_eq!(result.map(|_| ()), Err(SchedulerError::SchedulerGone));
    assert_eq!(cx.frame(), 0);
}
