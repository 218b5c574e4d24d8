//! End-to-end scheduling behavior through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{try_join_all, FutureExt};
use tokio::time::sleep;

use taskq_scheduler::{
    after, state, RunContext, Scheduler, SchedulerOptions, Settlement, SettlementKind, TaskOptions,
};

fn scheduler(limit: usize) -> Scheduler {
    Scheduler::new(SchedulerOptions::with_limit(limit)).unwrap()
}

#[tokio::test(start_paused = true)]
async fn k_plus_first_task_waits_for_a_settlement() {
    let k = 3;
    let scheduler = scheduler(k);
    let starts = Arc::new(Mutex::new(Vec::new()));
    let begin = tokio::time::Instant::now();

    let handles: Vec<_> = (0..k + 1)
        .map(|_| {
            let starts = starts.clone();
            scheduler.schedule(move |ctx: RunContext| async move {
                starts.lock().unwrap().push((ctx.index, begin.elapsed()));
                sleep(Duration::from_millis(20)).await;
                Ok::<_, String>(())
            })
        })
        .collect();

    try_join_all(handles).await.unwrap();

    let starts = starts.lock().unwrap().clone();
    for (index, at) in &starts[..k] {
        assert!(*index < k as u64);
        assert_eq!(*at, Duration::ZERO);
    }
    let (last_index, last_at) = starts[k];
    assert_eq!(last_index, k as u64);
    assert!(last_at >= Duration::from_millis(20));
}

#[tokio::test(start_paused = true)]
async fn immediate_task_starts_before_waiting_ones() {
    let scheduler = scheduler(1);
    let log = Arc::new(Mutex::new(Vec::new()));

    let record = |name: &'static str, options: TaskOptions| {
        let log = log.clone();
        scheduler.schedule_with(
            move |_ctx| async move {
                log.lock().unwrap().push(name);
                sleep(Duration::from_millis(5)).await;
                Ok::<_, String>(())
            },
            options,
        )
    };

    let running = record("running", TaskOptions::new());
    let waiting = record("waiting", TaskOptions::new().priority(10));
    let urgent = record("urgent", TaskOptions::new().immediate());

    try_join_all([running, waiting, urgent]).await.unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["running", "urgent", "waiting"]);
}

#[tokio::test(start_paused = true)]
async fn immediate_tasks_do_not_count_against_the_limit() {
    let scheduler = scheduler(1);
    let concurrent = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let concurrent = concurrent.clone();
            let peak = peak.clone();
            scheduler.schedule_with(
                move |ctx: RunContext| async move {
                    assert_eq!(ctx.worker_nr, None);
                    let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(10)).await;
                    concurrent.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, String>(())
                },
                TaskOptions::new().immediate(),
            )
        })
        .collect();

    try_join_all(handles).await.unwrap();
    assert_eq!(peak.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn one_failure_never_skips_another_task() {
    let scheduler = scheduler(2);

    let handles: Vec<_> = (0..10u32)
        .map(|i| {
            scheduler.schedule(move |_ctx| async move {
                sleep(Duration::from_millis(u64::from(i % 3))).await;
                if i % 2 == 0 { Err(format!("task {i} failed")) } else { Ok(i) }
            })
        })
        .collect();

    let mut ok = Vec::new();
    let mut failed = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(v) => ok.push(v),
            Err(e) => failed.push(e),
        }
    }

    assert_eq!(ok, vec![1, 3, 5, 7, 9]);
    assert_eq!(failed.len(), 5);
    assert_eq!(failed[0], "task 0 failed");

    let stats = scheduler.stats();
    assert_eq!(stats.fulfilled, 5);
    assert_eq!(stats.rejected, 5);
}

#[tokio::test(start_paused = true)]
async fn counters_stay_consistent_while_running() {
    let limit = 2;
    let scheduler = scheduler(limit);
    let settled = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for i in 0..12u64 {
        let immediate = i % 4 == 0;
        let settled = settled.clone();
        let observer = scheduler.clone();
        let options = if immediate { TaskOptions::new().immediate() } else { TaskOptions::new() };
        handles.push(scheduler.schedule_with(
            move |ctx: RunContext| async move {
                // Snapshots can only lag behind, never run ahead.
                assert!(ctx.fulfilled + ctx.rejected <= settled.load(Ordering::SeqCst) as u64);

                let stats = observer.stats();
                assert!(stats.busy_workers() <= limit);
                assert_eq!(stats.pending, stats.busy_workers() + stats.running_immediate);

                sleep(Duration::from_millis(3 + i % 5)).await;
                if !immediate {
                    settled.fetch_add(1, Ordering::SeqCst);
                }
                Ok::<_, String>(())
            },
            options,
        ));
    }

    try_join_all(handles).await.unwrap();
    let stats = scheduler.stats();
    assert_eq!(stats.settled(), 9);
    assert_eq!(stats.settled(), settled.load(Ordering::SeqCst) as u64);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.running_immediate, 0);
}

#[tokio::test(start_paused = true)]
async fn settlement_observer_on_a_scheduled_task() {
    let scheduler = scheduler(1);
    let handle = scheduler
        .schedule(|_ctx| async {
            sleep(Duration::from_millis(10)).await;
            Ok::<_, String>(5)
        })
        .shared();

    assert_eq!(state(&handle).await, Settlement::Pending);
    assert_eq!(handle.clone().await, Ok(5));
    assert_eq!(state(&handle).await, Settlement::Fulfilled(5));
}

#[tokio::test(start_paused = true)]
async fn settlement_observer_reports_a_panicked_task() {
    let scheduler = scheduler(1);
    let handle = scheduler
        .schedule(|_ctx| async {
            if true {
                panic!("task blew up");
            }
            Ok::<u32, String>(1)
        })
        .shared();

    sleep(Duration::from_millis(1)).await;
    assert_eq!(state(&handle).await, Settlement::Panicked);
    assert!(state(&handle).await.is_rejected());

    let stats = scheduler.stats();
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.pending, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn limit_holds_under_contention_on_many_threads() {
    let limit = 3;
    let seeders = 20u64;
    let children_per_seeder = 50u64;
    let scheduler = scheduler(limit);
    let concurrent = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let children = Arc::new(Mutex::new(Vec::new()));

    let track = {
        let concurrent = concurrent.clone();
        let peak = peak.clone();
        let observer = scheduler.clone();
        move |ctx: &RunContext| {
            let worker = ctx.worker_nr.expect("queued task without a worker slot");
            assert!(worker < limit, "worker {worker} outside the limit");
            let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            assert!(observer.stats().busy_workers() <= limit);
        }
    };

    let seeding: Vec<_> = (0..seeders)
        .map(|seeder| {
            let inner = scheduler.clone();
            let children = children.clone();
            let concurrent = concurrent.clone();
            let track = track.clone();
            scheduler.schedule_with(
                move |ctx: RunContext| async move {
                    track(&ctx);
                    for child in 0..children_per_seeder {
                        let concurrent = concurrent.clone();
                        let track = track.clone();
                        let handle = inner.schedule_with(
                            move |ctx: RunContext| async move {
                                track(&ctx);
                                tokio::task::yield_now().await;
                                concurrent.fetch_sub(1, Ordering::SeqCst);
                                Ok::<_, String>(child)
                            },
                            TaskOptions::new().priority(((seeder + child) % 5) as i64 - 2),
                        );
                        children.lock().unwrap().push(handle);
                    }
                    concurrent.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, String>(0)
                },
                TaskOptions::new().priority((seeder % 3) as i64),
            )
        })
        .collect();

    try_join_all(seeding).await.unwrap();
    let children: Vec<_> = std::mem::take(&mut *children.lock().unwrap());
    assert_eq!(children.len() as u64, seeders * children_per_seeder);
    try_join_all(children).await.unwrap();

    assert!(peak.load(Ordering::SeqCst) <= limit);
    let stats = scheduler.stats();
    assert_eq!(stats.settled(), seeders + seeders * children_per_seeder);
    assert_eq!(stats.rejected, 0);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.busy_workers(), 0);
}

#[tokio::test]
async fn after_wraps_a_task_handle() {
    let scheduler = scheduler(1);
    let seen = Arc::new(Mutex::new(None));
    let hook_seen = seen.clone();

    let result = after(
        scheduler.schedule(|_ctx| async { Err::<(), _>("rejected".to_string()) }),
        move |kind| async move {
            *hook_seen.lock().unwrap() = Some(kind);
            Ok(())
        },
    )
    .await;

    assert_eq!(result, Err("rejected".to_string()));
    assert_eq!(*seen.lock().unwrap(), Some(SettlementKind::Rejected));
}

#[test]
fn scheduler_on_an_explicit_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let scheduler =
        Scheduler::with_handle(SchedulerOptions::with_limit(2), runtime.handle().clone()).unwrap();
    let handles: Vec<_> = (0..6u32)
        .map(|i| scheduler.schedule(move |_ctx| async move { Ok::<_, String>(i * i) }))
        .collect();

    let results = runtime.block_on(try_join_all(handles)).unwrap();
    assert_eq!(results, vec![0, 1, 4, 9, 16, 25]);
}
