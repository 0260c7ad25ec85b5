use baton::{Coroutines, Thread, ThreadId};
use std::sync::{Arc, Mutex};

#[test]
fn test_current_is_none_before_any_thread_ran() {
    let co: Coroutines<()> = Coroutines::new();
    assert!(co.current().is_none());
}

#[test]
fn test_current_matches_spawned_identity() {
    const THREADS: usize = 6;

    let co = Coroutines::new();
    let seen: Arc<Mutex<Vec<(ThreadId, Option<ThreadId>, bool)>>> =
        Arc::new(Mutex::new(Vec::new()));

    let scripts: Vec<Thread<usize>> = (0..THREADS)
        .map(|i| {
            let co = co.clone();
            let seen = seen.clone();

            co.clone().create(i, move |me| {
                for _ in 0..3 {
                    let current = co.current().map(|t| t.id());
                    seen.lock().unwrap().push((me.id(), current, co.is_current(&me)));
                    co.sched(&me);
                }
                0
            })
        })
        .collect();

    for script in &scripts {
        script.join().unwrap();
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), THREADS * 3);

    for &(me, current, is_current) in seen.iter() {
        assert_eq!(Some(me), current);
        assert!(is_current);
        assert!(scripts.iter().any(|t| t.id() == me));
    }
}

#[test]
fn test_current_inside_body_equals_returned_handle() {
    let co = Coroutines::new();
    let inside = Arc::new(Mutex::new(None));

    let script = co.create("sprite", {
        let co = co.clone();
        let inside = inside.clone();
        move |me| {
            *inside.lock().unwrap() = co.current();
            assert_eq!(*me.payload(), "sprite");
            0
        }
    });

    script.join().unwrap();

    assert_eq!(inside.lock().unwrap().as_ref(), Some(&script));
}

#[test]
fn test_current_keeps_last_holder_after_finish() {
    let co = Coroutines::new();

    let script = co.create((), |_| 3);
    assert_eq!(script.join().unwrap(), 3);

    assert_eq!(co.current(), Some(script.clone()));
    assert!(co.is_current(&script));
}

#[test]
fn test_identity_is_not_payload_equality() {
    let co = Coroutines::new();

    let a = co.create(1, |_| 0);
    let b = co.create(1, |_| 0);

    assert_ne!(a, b);
    assert_ne!(a.id(), b.id());
    assert_eq!(a.payload(), b.payload());
    assert_eq!(a, a.clone());

    a.join().unwrap();
    b.join().unwrap();
}
