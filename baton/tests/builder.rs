use baton::{Coroutines, CoroutinesBuilder};
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn test_default_thread_names() {
    let co = Coroutines::new();
    let name = Arc::new(Mutex::new(None));

    let script = co.create((), {
        let name = name.clone();
        move |_| {
            *name.lock().unwrap() = thread::current().name().map(str::to_owned);
            0
        }
    });

    script.join().unwrap();

    assert_eq!(
        *name.lock().unwrap(),
        Some(format!("baton-{}", script.id().as_u64()))
    );
}

#[test]
fn test_custom_name_and_stack_size() {
    let co: Coroutines<&str> = CoroutinesBuilder::new()
        .name("sprite")
        .stack_size(512 * 1024)
        .build();

    let name = Arc::new(Mutex::new(None));

    let script = co.create("cat", {
        let name = name.clone();
        move |_| {
            // Deep enough to need more than a minimal stack.
            let buffer = [0u8; 64 * 1024];
            *name.lock().unwrap() = thread::current().name().map(str::to_owned);
            buffer.iter().map(|&b| b as i32).sum()
        }
    });

    assert_eq!(script.join().unwrap(), 0);
    assert_eq!(
        *name.lock().unwrap(),
        Some(format!("sprite-{}", script.id().as_u64()))
    );
}

#[test]
fn test_payload_reaches_the_body() {
    let co: Coroutines<u32> = CoroutinesBuilder::new().name("stage").build();

    let script = co.create(9, |me| *me.payload() as i32);
    assert_eq!(script.join().unwrap(), 9);
}

#[test]
#[should_panic(expected = "stack_size must be > 0")]
fn test_zero_stack_size_panics() {
    let _ = CoroutinesBuilder::new().stack_size(0);
}

#[test]
fn test_predecessor_hint_does_not_change_order() {
    let co = Coroutines::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let parent = co.create("parent", {
        let co = co.clone();
        let log = log.clone();
        move |me| {
            let child = co.create_and_start(
                "child",
                {
                    let log = log.clone();
                    move |_| {
                        log.lock().unwrap().push("child");
                        0
                    }
                },
                Some(&me),
            );

            // The child needs the run lock, which the parent still holds.
            log.lock().unwrap().push("parent");
            co.sched(&me);

            assert!(child.is_finished());
            log.lock().unwrap().push("parent again");
            0
        }
    });

    parent.join().unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["parent", "child", "parent again"]
    );
}
