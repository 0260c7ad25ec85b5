//! The smallest yield/resume round trip, driven from outside any logical
//! thread.
//!
//! Run with `cargo run --example counter`.

use baton::Coroutines;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

fn main() -> baton::Result<()> {
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

    while !co.is_suspended(&script) {
        thread::yield_now();
    }
    println!("parked, counter = {}", counter.load(Ordering::SeqCst));

    co.resume(&script)?;
    let status = script.join()?;
    println!("finished with {status}, counter = {}", counter.load(Ordering::SeqCst));

    // A finished script cannot be woken again.
    if let Err(err) = co.resume(&script) {
        println!("{err}");
    }

    Ok(())
}
