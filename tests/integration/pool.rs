//! Thread pool end-to-end scenarios and clock ownership.

use logrelay::logging::{Clock, TimeUnits};
use logrelay::pool::ThreadPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[test]
fn test_hundred_tasks_popped_in_submission_order() {
    // One worker makes pop order directly observable as execution order.
    let pool = ThreadPool::with_size(1);
    let observed = Arc::new(Mutex::new(Vec::new()));

    for i in 0..100 {
        let observed = Arc::clone(&observed);
        pool.submit(move || observed.lock().unwrap().push(i));
    }
    pool.wait_for_completion();

    let observed = observed.lock().unwrap();
    assert_eq!(*observed, (0..100).collect::<Vec<i32>>());
}

#[test]
fn test_resize_mid_flight_loses_nothing() {
    let mut pool = ThreadPool::with_size(4);
    let completed = Arc::new(AtomicUsize::new(0));

    for _ in 0..50 {
        let completed = Arc::clone(&completed);
        pool.submit(move || {
            std::thread::sleep(Duration::from_micros(100));
            completed.fetch_add(1, Ordering::SeqCst);
        });
    }

    pool.reset(2);
    pool.wait_for_completion();

    assert_eq!(completed.load(Ordering::SeqCst), 50);
    assert_eq!(pool.worker_count(), 2);
    assert_eq!(pool.outstanding_count(), 0);
}

#[test]
fn test_accounting_under_pause() {
    let pool = ThreadPool::with_size(3);
    pool.pause();

    for _ in 0..8 {
        pool.submit(|| std::thread::sleep(Duration::from_micros(50)));
    }

    assert_eq!(pool.queued_count(), 8);
    assert_eq!(pool.outstanding_count(), 8);
    assert_eq!(pool.running_count(), 0);

    pool.resume();
    pool.wait_for_completion();
    assert_eq!(pool.outstanding_count(), 0);
    assert_eq!(pool.queued_count(), 0);
}

#[test]
fn test_futures_resolve_out_of_submission_order() {
    let pool = ThreadPool::with_size(2);

    let slow = pool.submit(|| {
        std::thread::sleep(Duration::from_millis(30));
        "slow"
    });
    let fast = pool.submit(|| "fast");

    // Waiting on the later submission first must not deadlock on the
    // earlier one.
    assert_eq!(fast.wait().downcast::<&str>(), Some("fast"));
    assert_eq!(slow.wait().downcast::<&str>(), Some("slow"));
}

#[test]
fn test_many_producers_all_complete() {
    let pool = Arc::new(ThreadPool::with_size(4));
    let completed = Arc::new(AtomicUsize::new(0));

    let mut producers = Vec::new();
    for _ in 0..8 {
        let pool = Arc::clone(&pool);
        let completed = Arc::clone(&completed);
        producers.push(std::thread::spawn(move || {
            for _ in 0..25 {
                let completed = Arc::clone(&completed);
                pool.submit(move || {
                    completed.fetch_add(1, Ordering::SeqCst);
                });
            }
        }));
    }
    for producer in producers {
        producer.join().unwrap();
    }
    pool.wait_for_completion();
    assert_eq!(completed.load(Ordering::SeqCst), 8 * 25);
}

#[test]
fn test_clock_timer_is_thread_owned() {
    let clock = Arc::new(Clock::new());
    clock.start();

    // Another thread can neither stop the timer nor read the elapsed time.
    let foreign = Arc::clone(&clock);
    std::thread::spawn(move || {
        foreign.stop();
        assert_eq!(foreign.elapsed(TimeUnits::Microseconds), -1.0);
    })
    .join()
    .unwrap();
    assert!(clock.is_running());

    // While running, even the owner reads the sentinel.
    assert_eq!(clock.elapsed(TimeUnits::Seconds), -1.0);

    std::thread::sleep(Duration::from_millis(2));
    clock.stop();
    assert!(clock.elapsed(TimeUnits::Nanoseconds) > 0.0);
}
