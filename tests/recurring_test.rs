//! Recurring jobs: rotation, cancellation and interaction with resizing

use rust_job_pool::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn counting_job(counter: &Arc<AtomicU64>, pause: Duration) -> Job<()> {
    let counter = Arc::clone(counter);
    Job::new(move || {
        thread::sleep(pause);
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn test_recurring_job_runs_until_cancelled() {
    init_logging();
    let pool = ThreadPool::new(num_cpus::get()).expect("Failed to create pool");
    let counter = Arc::new(AtomicU64::new(0));

    let id = pool
        .submit_recurring(counting_job(&counter, Duration::from_millis(100)))
        .expect("Failed to submit recurring job");
    assert!(pool.is_rotating(id));

    thread::sleep(Duration::from_secs(1));
    let before_cancel = counter.load(Ordering::SeqCst);
    assert!(before_cancel > 0, "recurring job never ran");

    assert!(pool.cancel(id));
    assert!(!pool.is_rotating(id));
    let at_cancel = counter.load(Ordering::SeqCst);

    thread::sleep(Duration::from_secs(1));
    let after = counter.load(Ordering::SeqCst);

    // At most the run that was in flight when cancel was called
    assert!(
        after <= at_cancel + 1,
        "job kept running after cancel: {} -> {}",
        at_cancel,
        after
    );
    assert_eq!(pool.stats().rotations_cancelled, 1);
}

#[test]
fn test_recurring_count_keeps_growing() {
    let pool = ThreadPool::new(2).expect("Failed to create pool");
    let counter = Arc::new(AtomicU64::new(0));

    let id = pool
        .submit_recurring(counting_job(&counter, Duration::from_millis(5)))
        .unwrap();

    thread::sleep(Duration::from_millis(100));
    let first = counter.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(100));
    let second = counter.load(Ordering::SeqCst);

    assert!(second > first, "count stalled at {}", first);
    pool.cancel(id);
}

#[test]
fn test_cancel_then_resize_leaves_no_rotation() {
    let pool = ThreadPool::new(2).expect("Failed to create pool");
    let counter = Arc::new(AtomicU64::new(0));

    let id = pool
        .submit_recurring(counting_job(&counter, Duration::from_millis(1)))
        .unwrap();
    assert!(pool.cancel(id));

    pool.resize(0).unwrap();
    pool.resize(2).unwrap();

    thread::sleep(Duration::from_millis(50));
    let settled = counter.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(100));

    assert_eq!(counter.load(Ordering::SeqCst), settled);
    assert!(!pool.contains(id));
    assert!(!pool.is_rotating(id));
    // Already removed: a second cancel is a no-op
    assert!(!pool.cancel(id));
}

#[test]
fn test_cancel_while_queued_skips_execution() {
    let pool = ThreadPool::new(0).expect("Failed to create pool");
    let ran = Arc::new(AtomicBool::new(false));

    let ran_clone = Arc::clone(&ran);
    let id = pool
        .execute_recurring(move || ran_clone.store(true, Ordering::SeqCst))
        .unwrap();
    assert!(pool.contains(id));
    assert!(pool.cancel(id));

    pool.resize(1).unwrap();
    let barrier = pool.execute(|| ()).unwrap();
    barrier.wait();

    assert!(!ran.load(Ordering::SeqCst));
    assert!(!pool.contains(id));
}

#[test]
fn test_recurring_interleaves_with_one_shot_jobs() {
    let pool = ThreadPool::new(1).expect("Failed to create pool");
    let counter = Arc::new(AtomicU64::new(0));

    let id = pool
        .submit_recurring(counting_job(&counter, Duration::from_millis(1)))
        .unwrap();

    // A single worker shares its time fairly between the rotation and new work
    let results: Vec<_> = (0..20).map(|i| pool.execute(move || i).unwrap()).collect();
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.get().unwrap(), i);
    }

    assert!(counter.load(Ordering::SeqCst) > 0);
    assert!(pool.cancel(id));
}

#[test]
fn test_multiple_recurring_jobs_cancel_independently() {
    let pool = ThreadPool::new(3).expect("Failed to create pool");
    let kept = Arc::new(AtomicU64::new(0));
    let removed = Arc::new(AtomicU64::new(0));

    let kept_id = pool
        .submit_recurring(counting_job(&kept, Duration::from_millis(2)))
        .unwrap();
    let removed_id = pool
        .submit_recurring(counting_job(&removed, Duration::from_millis(2)))
        .unwrap();
    assert_ne!(kept_id, removed_id);

    thread::sleep(Duration::from_millis(50));
    pool.cancel(removed_id);
    thread::sleep(Duration::from_millis(20));

    let removed_at = removed.load(Ordering::SeqCst);
    let kept_at = kept.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(100));

    assert_eq!(removed.load(Ordering::SeqCst), removed_at);
    assert!(kept.load(Ordering::SeqCst) > kept_at);
    assert!(pool.is_rotating(kept_id));
    pool.cancel(kept_id);
}

#[test]
fn test_panicking_recurring_job_stays_in_rotation() {
    init_logging();
    let pool = ThreadPool::new(1).expect("Failed to create pool");
    let runs = Arc::new(AtomicU64::new(0));

    let runs_clone = Arc::clone(&runs);
    let id = pool
        .execute_recurring(move || {
            let run = runs_clone.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(1));
            if run % 2 == 0 {
                panic!("flaky recurring job");
            }
        })
        .unwrap();

    thread::sleep(Duration::from_millis(100));
    assert!(runs.load(Ordering::SeqCst) > 2);
    assert!(pool.is_rotating(id));
    assert!(pool.stats().jobs_panicked > 0);
    assert!(pool.cancel(id));
}

#[test]
fn test_recurring_job_takes_its_turn_in_queue_order() {
    let pool = ThreadPool::new(0).expect("Failed to create pool");
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let logged = |name: &'static str| {
        let log = Arc::clone(&log);
        move || log.lock().push(name)
    };

    let first = pool.execute(logged("first")).unwrap();
    let id = pool.execute_recurring(logged("recurring")).unwrap();
    let second = pool.execute(logged("second")).unwrap();
    let third = pool.execute(logged("third")).unwrap();

    pool.resize(1).unwrap();
    for result in [&first, &second, &third] {
        result.wait();
    }
    assert!(pool.cancel(id));
    pool.resize(0).unwrap();

    let log = log.lock();
    // After its first run the recurring job is requeued behind "third"
    assert_eq!(&log[..4], &["first", "recurring", "second", "third"]);
    assert!(log[4..].iter().all(|name| *name == "recurring"));
}
