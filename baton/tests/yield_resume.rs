use baton::{Coroutines, Error, Thread};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn wait_until_suspended<P>(co: &Coroutines<P>, target: &Thread<P>) {
    while !co.is_suspended(target) {
        thread::yield_now();
    }
}

#[test]
fn test_counter_advances_only_after_resume() {
    let co = Coroutines::new();
    let counter = Arc::new(AtomicUsize::new(0));

    let script = co.create((), {
        let co = co.clone();
        let counter = counter.clone();
        move |me| {
            counter.store(1, Ordering::SeqCst);
            co.yield_now(&me);
            counter.store(2, Ordering::SeqCst);
            0
        }
    });

    wait_until_suspended(&co, &script);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(!script.is_finished());

    co.resume(&script).unwrap();
    assert_eq!(script.join().unwrap(), 0);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_round_trip_and_resume_after_finish() {
    let co = Coroutines::new();
    let flag = Arc::new(AtomicUsize::new(0));

    let script = co.create_and_start(
        (),
        {
            let co = co.clone();
            let flag = flag.clone();
            move |me| {
                flag.store(1, Ordering::SeqCst);
                co.yield_now(&me);
                flag.store(2, Ordering::SeqCst);
                42
            }
        },
        None,
    );

    wait_until_suspended(&co, &script);
    assert_eq!(flag.load(Ordering::SeqCst), 1);
    assert_eq!(co.suspended_count(), 1);

    co.resume(&script).unwrap();
    assert_eq!(script.join().unwrap(), 42);
    assert_eq!(flag.load(Ordering::SeqCst), 2);
    assert_eq!(co.suspended_count(), 0);

    // Resuming a finished thread changes nothing and does not block.
    assert!(matches!(co.resume(&script), Err(Error::Finished(id)) if id == script.id()));
    assert_eq!(flag.load(Ordering::SeqCst), 2);
}

#[test]
fn test_resume_before_yield_is_latched() {
    let co = Coroutines::new();
    let started = Arc::new(AtomicBool::new(false));
    let go = Arc::new(AtomicBool::new(false));

    let script = co.create((), {
        let co = co.clone();
        let started = started.clone();
        let go = go.clone();
        move |me| {
            started.store(true, Ordering::SeqCst);

            while !go.load(Ordering::SeqCst) {
                thread::yield_now();
            }

            // The resume arrived first: this yield must not park forever.
            co.yield_now(&me);
            7
        }
    });

    while !started.load(Ordering::SeqCst) {
        thread::yield_now();
    }

    co.resume(&script).unwrap();
    assert!(!co.is_suspended(&script));

    go.store(true, Ordering::SeqCst);
    assert_eq!(script.join().unwrap(), 7);
}

#[test]
fn test_threads_run_in_resume_order() {
    let co = Coroutines::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    let scripts: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|name| {
            let co = co.clone();
            let order = order.clone();

            co.clone().create(name, move |me| {
                co.yield_now(&me);
                order.lock().unwrap().push(*me.payload());
                0
            })
        })
        .collect();

    for script in &scripts {
        wait_until_suspended(&co, script);
    }

    co.resume(&scripts[2]).unwrap();
    co.resume(&scripts[0]).unwrap();
    co.resume(&scripts[1]).unwrap();

    for script in &scripts {
        script.join().unwrap();
    }

    assert_eq!(*order.lock().unwrap(), vec!["c", "a", "b"]);
}

#[test]
fn test_resume_rejects_foreign_threads() {
    let co = Coroutines::new();
    let other = Coroutines::new();

    let script = other.create((), |_| 0);

    assert!(matches!(co.resume(&script), Err(Error::ForeignThread(id)) if id == script.id()));
    assert_eq!(script.join().unwrap(), 0);
}

#[test]
fn test_driving_loop_advances_each_script_once_per_frame() {
    const SCRIPTS: usize = 4;
    const FRAMES: usize = 10;

    let co = Coroutines::new();
    let progress: Arc<Vec<AtomicUsize>> =
        Arc::new((0..SCRIPTS).map(|_| AtomicUsize::new(0)).collect());

    let scripts: Vec<_> = (0..SCRIPTS)
        .map(|i| {
            let co = co.clone();
            let progress = progress.clone();

            co.clone().create(i, move |me| {
                for frame in 1..=FRAMES {
                    progress[*me.payload()].store(frame, Ordering::SeqCst);
                    co.yield_now(&me);
                }
                0
            })
        })
        .collect();

    for frame in 1..=FRAMES {
        for (i, script) in scripts.iter().enumerate() {
            wait_until_suspended(&co, script);
            assert_eq!(progress[i].load(Ordering::SeqCst), frame);
        }

        for script in &scripts {
            co.resume(script).unwrap();
        }
    }

    for script in &scripts {
        assert_eq!(script.join().unwrap(), 0);
    }
}

fn resume_twice_then_sched(pause: Option<Duration>) -> Vec<&'static str> {
    let co = Coroutines::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let script = co.create((), {
        let co = co.clone();
        let log = log.clone();
        move |me| {
            co.yield_now(&me);
            log.lock().unwrap().push("frame 1");
            co.yield_now(&me);
            log.lock().unwrap().push("frame 2");
            0
        }
    });

    let driver = co.create((), {
        let co = co.clone();
        let script = script.clone();
        move |me| {
            co.resume(&script).unwrap();
            if let Some(pause) = pause {
                thread::sleep(pause);
            }
            co.resume(&script).unwrap();

            co.sched(&me);
            co.sched(&me);
            0
        }
    });

    assert_eq!(driver.join().unwrap(), 0);
    let frames = log.lock().unwrap().clone();

    wait_until_suspended(&co, &script);
    co.resume(&script).unwrap();
    script.join().unwrap();

    frames
}

#[test]
fn test_second_resume_before_running_is_a_no_op() {
    assert_eq!(resume_twice_then_sched(None), vec!["frame 1"]);
}

#[test]
fn test_second_resume_after_a_pause_is_a_no_op() {
    assert_eq!(
        resume_twice_then_sched(Some(Duration::from_millis(100))),
        vec!["frame 1"]
    );
}
