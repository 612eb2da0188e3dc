use frame_reactor::{DEFAULT_MAX_SYNC_DEPTH, FrameData, FrameScheduler, SchedulerBuilder, Task};
use std::cell::Cell;
use std::rc::Rc;

fn square(x: u32) -> Task<FrameData, u32> {
    Task::new(move |_cx| async move { Ok(x * x) })
}

#[test]
fn test_builder_creation() {
    let scheduler: FrameScheduler = SchedulerBuilder::new().build();
    assert!(scheduler.is_idle());
    assert_eq!(scheduler.frame(), 0);
}

#[test]
fn test_builder_default_matches_new() {
    let mut built: FrameScheduler<u8> = SchedulerBuilder::default().capacity(1).build();
    let mut plain: FrameScheduler<u8> = FrameScheduler::default();

    for scheduler in [&mut built, &mut plain] {
        let seen = Rc::new(Cell::new(0));
        let s = seen.clone();
        scheduler
            .push(Task::new(move |cx| async move {
                s.set(cx.next_frame().await);
                Ok(())
            }))
            .unwrap();

        scheduler.tick(1).unwrap();
        scheduler.tick(2).unwrap();
        assert_eq!(seen.get(), 2);
    }
}

#[test]
fn test_small_capacity_grows() {
    let mut scheduler: FrameScheduler = FrameScheduler::builder().capacity(0).build();
    let handles: Vec<_> = (0..100)
        .map(|_| {
            scheduler
                .push(Task::new(|cx| async move {
                    cx.next_frame().await;
                    Ok(())
                }))
                .unwrap()
        })
        .collect();

    assert_eq!(scheduler.pending_bootstraps(), 100);
    scheduler.tick(FrameData::default()).unwrap();
    scheduler.tick(FrameData::default()).unwrap();

    assert!(handles.iter().all(|handle| handle.is_finished()));
}

#[test]
fn test_zero_sync_depth_defers_every_child() {
    let mut scheduler: FrameScheduler = FrameScheduler::builder().max_sync_depth(0).build();
    let out = Rc::new(Cell::new(0));
    let o = out.clone();

    let handle = scheduler
        .push(Task::new(move |cx| async move {
            o.set(cx.call(square(6)).await?);
            Ok(())
        }))
        .unwrap();

    scheduler.tick(FrameData::default()).unwrap();
    assert!(!handle.is_finished(), "child must not run inline");
    assert_eq!(scheduler.pending_bootstraps(), 1);

    scheduler.tick(FrameData::default()).unwrap();
    assert!(handle.is_finished());
    assert_eq!(out.get(), 36);
}

#[test]
fn test_default_depth_runs_children_inline() {
    assert!(DEFAULT_MAX_SYNC_DEPTH > 0);

    let mut scheduler: FrameScheduler = FrameScheduler::new();
    let handle = scheduler
        .push(Task::new(|cx| async move {
            cx.call(square(6)).await?;
            Ok(())
        }))
        .unwrap();

    scheduler.tick(FrameData::default()).unwrap();
    assert!(handle.is_finished());
}
