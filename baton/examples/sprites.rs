//! A frame-driven stage: every sprite runs its own script, written as
//! straight-line code, and the stage wakes the scripts once per frame.
//!
//! Run with `cargo run --example sprites`.

use baton::{Coroutines, Thread};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const FRAMES: usize = 8;

type Stage = Coroutines<&'static str>;
type Script = Thread<&'static str>;
type Positions = Arc<Mutex<BTreeMap<&'static str, (i32, i32)>>>;

/// Parks the calling script for `frames` frames.
fn wait(co: &Stage, me: &Script, frames: usize) {
    for _ in 0..frames {
        co.yield_now(me);
    }
}

fn spawn_sprite<F>(co: &Stage, positions: &Positions, name: &'static str, script: F) -> Script
where
    F: FnOnce(&Stage, &Script, &Positions) + Send + 'static,
{
    positions.lock().unwrap().insert(name, (0, 0));

    let co_script = co.clone();
    let positions = positions.clone();

    co.create(name, move |me| {
        script(&co_script, &me, &positions);
        0
    })
}

fn main() {
    let co: Stage = Coroutines::new();
    let positions: Positions = Arc::new(Mutex::new(BTreeMap::new()));

    let walker = spawn_sprite(&co, &positions, "walker", |co, me, positions| {
        for _ in 0..5 {
            positions.lock().unwrap().entry(*me.payload()).and_modify(|p| p.0 += 1);
            wait(co, me, 1);
        }
    });

    let jumper = spawn_sprite(&co, &positions, "jumper", |co, me, positions| {
        wait(co, me, 2);
        positions.lock().unwrap().entry(*me.payload()).and_modify(|p| p.1 += 3);
        wait(co, me, 2);
        positions.lock().unwrap().entry(*me.payload()).and_modify(|p| p.1 -= 3);
    });

    let scripts = vec![walker, jumper];

    let stage = co.create("stage", {
        let co = co.clone();
        let positions = positions.clone();
        move |me| {
            for frame in 1..=FRAMES {
                for script in &scripts {
                    if !script.is_finished() {
                        let _ = co.resume(script);
                    }
                }

                // Every resumed script runs up to its next wait, then the stage continues.
                co.sched(&me);

                println!("frame {frame}: {:?}", positions.lock().unwrap());
            }
            0
        }
    });

    if let Err(err) = stage.join() {
        eprintln!("stage stopped: {err}");
    }
}
