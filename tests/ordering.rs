use frame_reactor::{FrameData, FrameScheduler, Task};
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

proptest! {
    #[test]
    fn prop_tasks_finish_in_push_order_within_a_frame(waits in prop::collection::vec(0u32..5, 1..20)) {
        let mut scheduler: FrameScheduler = FrameScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (index, &wait) in waits.iter().enumerate() {
            let l = log.clone();
            scheduler
                .push(Task::new(move |cx| async move {
                    for _ in 0..wait {
                        cx.next_frame().await;
                    }
                    l.borrow_mut().push((cx.frame(), index));
                    Ok(())
                }))
                .unwrap();
        }

        for _ in 0..6 {
            scheduler.tick(FrameData::default()).unwrap();
        }

        let log = log.borrow().clone();
        let mut sorted = log.clone();
        sorted.sort();

        prop_assert_eq!(&log, &sorted);
        prop_assert_eq!(log.len(), waits.len());
        for (frame, index) in log {
            prop_assert_eq!(frame, u64::from(waits[index]) + 1);
        }
        prop_assert!(scheduler.is_idle());
    }

    #[test]
    fn prop_child_chain_costs_one_tick_per_suspension(waits in prop::collection::vec(0u32..4, 1..8)) {
        let mut scheduler: FrameScheduler = FrameScheduler::new();
        let total: u32 = waits.iter().sum();

        let handle = scheduler
            .push(Task::new(move |cx| async move {
                for wait in waits {
                    cx.call(Task::<FrameData, ()>::new(move |cx| async move {
                        for _ in 0..wait {
                            cx.next_frame().await;
                        }
                        Ok(())
                    }))
                    .await?;
                }
                Ok(())
            }))
            .unwrap();

        let mut ticks = 0u32;
        while !handle.is_finished() {
            scheduler.tick(FrameData::default()).unwrap();
            ticks += 1;
            prop_assert!(ticks <= total + 1);
        }

        prop_assert_eq!(ticks, total + 1);
    }
}
