use delayed_worker::prelude::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

fn bump(counter: &Arc<AtomicUsize>) -> impl FnOnce() + Send + 'static {
    let counter = counter.clone();
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_shorter_delay_runs_first_and_never_early() {
    init_logging();
    let executor = DelayedExecutor::new().unwrap();
    let (tx, rx) = mpsc::channel();
    let start = Instant::now();

    for (label, delay_ms) in [("long", 60u64), ("short", 20u64)] {
        let tx = tx.clone();
        executor
            .schedule(
                move || tx.send((label, start.elapsed())).unwrap(),
                Duration::from_millis(delay_ms),
            )
            .unwrap();
    }

    let (first, first_at) = rx.recv_timeout(WAIT).unwrap();
    let (second, second_at) = rx.recv_timeout(WAIT).unwrap();

    assert_eq!(first, "short");
    assert_eq!(second, "long");
    assert!(first_at >= Duration::from_millis(20));
    assert!(second_at >= Duration::from_millis(60));
    assert!(first_at <= second_at);
}

#[test]
fn test_zero_delay_runs_before_later_positive_delay() {
    init_logging();
    let executor = DelayedExecutor::new().unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = mpsc::channel();

    {
        let order = order.clone();
        executor
            .schedule(move || order.lock().push("immediate"), Duration::ZERO)
            .unwrap();
    }
    {
        let order = order.clone();
        executor
            .schedule(
                move || {
                    order.lock().push("delayed");
                    tx.send(()).unwrap();
                },
                Duration::from_millis(5),
            )
            .unwrap();
    }

    rx.recv_timeout(WAIT).unwrap();
    assert_eq!(*order.lock(), vec!["immediate", "delayed"]);
}

#[test]
fn test_cancel_all_runs_only_cancellation_callbacks() {
    init_logging();
    let executor = DelayedExecutor::new().unwrap();
    let actions = counter();
    let cancellations = counter();
    let hour = Duration::from_secs(3600);

    // 5 tasks with cancellation callbacks, 3 without
    for _ in 0..5 {
        executor
            .schedule_with_cancel(bump(&actions), bump(&cancellations), hour)
            .unwrap();
    }
    for _ in 0..3 {
        executor.schedule(bump(&actions), hour).unwrap();
    }
    assert_eq!(executor.pending(), 8);

    let removed = executor.cancel_all();

    assert_eq!(removed, 8);
    assert_eq!(cancellations.load(Ordering::SeqCst), 5);
    assert_eq!(actions.load(Ordering::SeqCst), 0);
    assert!(executor.is_idle());
}

#[test]
fn test_cancel_all_waits_for_slow_callbacks() {
    init_logging();
    let executor = DelayedExecutor::new().unwrap();
    let finished = Arc::new(AtomicBool::new(false));

    {
        let finished = finished.clone();
        executor
            .schedule_with_cancel(
                || {},
                move || {
                    thread::sleep(Duration::from_millis(50));
                    finished.store(true, Ordering::SeqCst);
                },
                Duration::from_secs(3600),
            )
            .unwrap();
    }

    executor.cancel_all();
    assert!(finished.load(Ordering::SeqCst));
}

#[test]
fn test_cancel_all_on_empty_queue() {
    let executor = DelayedExecutor::new().unwrap();
    assert_eq!(executor.cancel_all(), 0);
}

#[test]
fn test_task_runs_exactly_once() {
    init_logging();
    let executor = DelayedExecutor::new().unwrap();
    let runs = counter();

    executor
        .schedule(bump(&runs), Duration::from_millis(10))
        .unwrap();

    thread::sleep(Duration::from_millis(150));
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    thread::sleep(Duration::from_millis(50));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_earlier_task_preempts_pending_wait() {
    init_logging();
    let executor = DelayedExecutor::new().unwrap();
    let (tx, rx) = mpsc::channel();
    let start = Instant::now();

    {
        let tx = tx.clone();
        executor
            .schedule(move || tx.send("late").unwrap(), Duration::from_millis(500))
            .unwrap();
    }
    // give the worker time to start waiting on the 500ms deadline
    thread::sleep(Duration::from_millis(20));
    executor
        .schedule(move || tx.send("early").unwrap(), Duration::from_millis(10))
        .unwrap();

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "early");
    assert!(start.elapsed() < Duration::from_millis(400));
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "late");
    assert!(start.elapsed() >= Duration::from_millis(500));
}

#[test]
fn test_documented_scenario() {
    init_logging();
    let executor = DelayedExecutor::new().unwrap();
    let count = counter();
    let order = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = mpsc::channel();

    for (label, delay_ms, pause_ms) in [("A", 50u64, 5u64), ("B", 10u64, 0u64)] {
        let count = count.clone();
        let order = order.clone();
        let tx = tx.clone();
        executor
            .schedule(
                move || {
                    count.fetch_add(1, Ordering::SeqCst);
                    order.lock().push(label);
                    tx.send(()).unwrap();
                },
                Duration::from_millis(delay_ms),
            )
            .unwrap();
        thread::sleep(Duration::from_millis(pause_ms));
    }

    rx.recv_timeout(WAIT).unwrap();
    rx.recv_timeout(WAIT).unwrap();

    assert_eq!(*order.lock(), vec!["B", "A"]);
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_drop_discards_pending_tasks() {
    init_logging();
    let actions = counter();
    let cancellations = counter();

    let executor = DelayedExecutor::new().unwrap();
    for _ in 0..10 {
        executor
            .schedule_with_cancel(
                bump(&actions),
                bump(&cancellations),
                Duration::from_secs(3600),
            )
            .unwrap();
    }

    let start = Instant::now();
    drop(executor);

    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(actions.load(Ordering::SeqCst), 0);
    assert_eq!(cancellations.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cancel_pending_policy_runs_callbacks_at_shutdown() {
    init_logging();
    let actions = counter();
    let cancellations = counter();

    let config = Config::builder()
        .shutdown_policy(ShutdownPolicy::CancelPending)
        .build()
        .unwrap();
    let mut executor = DelayedExecutor::with_config(config).unwrap();

    for _ in 0..4 {
        executor
            .schedule_with_cancel(
                bump(&actions),
                bump(&cancellations),
                Duration::from_secs(3600),
            )
            .unwrap();
    }
    executor
        .schedule(bump(&actions), Duration::from_secs(3600))
        .unwrap();

    executor.shutdown().unwrap();

    assert_eq!(actions.load(Ordering::SeqCst), 0);
    assert_eq!(cancellations.load(Ordering::SeqCst), 4);
}

#[test]
fn test_action_can_schedule_follow_up() {
    init_logging();
    let executor = Arc::new(DelayedExecutor::new().unwrap());
    let (tx, rx) = mpsc::channel();

    {
        let inner = Arc::downgrade(&executor);
        let tx = tx.clone();
        executor
            .schedule(
                move || {
                    tx.send("first").unwrap();
                    if let Some(executor) = inner.upgrade() {
                        executor
                            .schedule(move || tx.send("second").unwrap(), Duration::from_millis(5))
                            .unwrap();
                    }
                },
                Duration::from_millis(5),
            )
            .unwrap();
    }

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "first");
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "second");
}

#[test]
fn test_cancel_all_does_not_touch_running_task() {
    init_logging();
    let executor = DelayedExecutor::new().unwrap();
    let (started_tx, started_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel();
    let cancellations = counter();

    executor
        .schedule_with_cancel(
            move || {
                started_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(50));
                done_tx.send(()).unwrap();
            },
            bump(&cancellations),
            Duration::ZERO,
        )
        .unwrap();

    started_rx.recv_timeout(WAIT).unwrap();
    assert_eq!(executor.cancel_all(), 0);

    done_rx.recv_timeout(WAIT).unwrap();
    assert_eq!(cancellations.load(Ordering::SeqCst), 0);
}

#[test]
fn test_concurrent_producers() {
    init_logging();
    let executor = Arc::new(DelayedExecutor::new().unwrap());
    let runs = counter();

    let producers: Vec<_> = (0..8)
        .map(|i| {
            let executor = executor.clone();
            let runs = runs.clone();
            thread::spawn(move || {
                for j in 0..50u64 {
                    executor
                        .schedule(bump(&runs), Duration::from_millis((i + j) % 7))
                        .unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let deadline = Instant::now() + WAIT;
    while runs.load(Ordering::SeqCst) < 400 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(runs.load(Ordering::SeqCst), 400);
    assert!(executor.is_idle());
}

#[test]
fn test_log_and_continue_keeps_worker_alive() {
    init_logging();
    let config = Config::builder()
        .panic_strategy(PanicStrategy::LogAndContinue)
        .build()
        .unwrap();
    let executor = DelayedExecutor::with_config(config).unwrap();
    let (tx, rx) = mpsc::channel();

    executor
        .schedule(|| panic!("tuner hardware fault"), Duration::ZERO)
        .unwrap();
    executor
        .schedule(move || tx.send(()).unwrap(), Duration::from_millis(5))
        .unwrap();

    rx.recv_timeout(WAIT).unwrap();
    assert_eq!(executor.panic_count(), 1);
}

#[test]
fn test_propagated_panic_is_reported_at_shutdown() {
    init_logging();
    let mut executor = DelayedExecutor::new().unwrap();
    let (tx, rx) = mpsc::channel();

    executor
        .schedule(
            move || {
                tx.send(()).unwrap();
                panic!("no safety net");
            },
            Duration::ZERO,
        )
        .unwrap();

    rx.recv_timeout(WAIT).unwrap();
    let err = executor.shutdown().unwrap_err();

    assert!(matches!(err, Error::WorkerPanic(ref msg) if msg == "no safety net"));
    assert_eq!(executor.panic_count(), 1);
}

#[test]
fn test_dead_worker_rejects_new_tasks() {
    init_logging();
    let config = Config::builder()
        .shutdown_policy(ShutdownPolicy::CancelPending)
        .build()
        .unwrap();
    let mut executor = DelayedExecutor::with_config(config).unwrap();
    let actions = counter();
    let cancellations = counter();
    let (tx, rx) = mpsc::channel();

    executor
        .schedule(
            move || {
                tx.send(()).unwrap();
                panic!("tuner hardware fault");
            },
            Duration::ZERO,
        )
        .unwrap();
    rx.recv_timeout(WAIT).unwrap();

    // tasks accepted while the worker is still unwinding settle at shutdown
    let give_up = Instant::now() + WAIT;
    let rejected = loop {
        match executor.schedule_with_cancel(bump(&actions), bump(&cancellations), Duration::ZERO)
        {
            Ok(_) => assert!(Instant::now() < give_up, "worker death never observed"),
            Err(e) => break e,
        }
        thread::sleep(Duration::from_millis(1));
    };
    assert!(matches!(rejected, Error::WorkerPanic(_)));

    let accepted = executor.pending();
    assert!(matches!(executor.shutdown(), Err(Error::WorkerPanic(_))));

    assert_eq!(actions.load(Ordering::SeqCst), 0);
    assert_eq!(cancellations.load(Ordering::SeqCst), accepted);
}

#[test]
fn test_cancel_callback_can_schedule_replacement() {
    init_logging();
    let executor = Arc::new(DelayedExecutor::new().unwrap());
    let (tx, rx) = mpsc::channel();

    {
        let inner = Arc::downgrade(&executor);
        executor
            .schedule_with_cancel(
                || {},
                move || {
                    if let Some(executor) = inner.upgrade() {
                        executor
                            .schedule(move || tx.send("retry").unwrap(), Duration::from_millis(5))
                            .unwrap();
                    }
                },
                Duration::from_secs(3600),
            )
            .unwrap();
    }

    assert_eq!(executor.cancel_all(), 1);
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), "retry");
    assert!(executor.is_idle());
}

#[test]
fn test_schedule_at_past_deadline_runs_promptly() {
    init_logging();
    let executor = DelayedExecutor::new().unwrap();
    let (tx, rx) = mpsc::channel();
    let past = Instant::now() - Duration::from_millis(1);

    executor.schedule_at(move || tx.send(()).unwrap(), past).unwrap();

    rx.recv_timeout(WAIT).unwrap();
}

#[cfg(feature = "telemetry")]
#[test]
fn test_metrics_track_task_outcomes() {
    init_logging();
    let mut executor = DelayedExecutor::new().unwrap();
    let (tx, rx) = mpsc::channel();

    executor
        .schedule(move || tx.send(()).unwrap(), Duration::ZERO)
        .unwrap();
    rx.recv_timeout(WAIT).unwrap();

    executor
        .schedule_with_cancel(|| {}, || {}, Duration::from_secs(3600))
        .unwrap();
    executor.cancel_all();
    executor.schedule(|| {}, Duration::from_secs(3600)).unwrap();
    executor.shutdown().unwrap();

    let snapshot = executor.metrics();
    assert_eq!(snapshot.tasks_scheduled, 3);
    assert_eq!(snapshot.tasks_executed, 1);
    assert_eq!(snapshot.tasks_canceled, 1);
    assert_eq!(snapshot.tasks_discarded, 1);
    assert_eq!(snapshot.outstanding(), 0);
}
