//! # Pipeline Demo
//!
//! Two-stage pipeline, run twice:
//! - **eager**: stage 1 builds the whole list, then stage 2 walks it
//! - **lazy**: stage 2 walks a `LazyVec` while stage 1 is still filling it
//!
//! Both stages take `STEP` per item, so the lazy run should finish in roughly
//! half the time.
//!
//! Run with: `RUST_LOG=debug cargo run -p trickle_core --features demo --bin pipeline_demo`

use std::error::Error;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use trickle_core::{LazyVec, LazyVecConfig, SequenceError};

const ITEMS: usize = 10;
const STEP: Duration = Duration::from_millis(100);

fn produce_eager() -> Vec<String> {
    (0..ITEMS)
        .map(|i| {
            thread::sleep(STEP);
            format!("Item {i}")
        })
        .collect()
}

fn consume(item: &str) {
    tracing::info!(item, "consumed");
    thread::sleep(STEP);
}

fn run_eager() -> Duration {
    let start = Instant::now();
    for item in produce_eager() {
        consume(&item);
    }
    start.elapsed()
}

fn run_lazy() -> Result<Duration, Box<dyn Error>> {
    let start = Instant::now();
    let config = LazyVecConfig::default()
        .with_label("stage1")
        .with_progress_interval(5);

    let (seq, handle) = LazyVec::<String>::spawn_producer(config, |producer| {
        for i in 0..ITEMS {
            thread::sleep(STEP);
            producer.push(format!("Item {i}"))?;
        }
        Ok::<_, SequenceError>(())
    });

    for item in seq.iter() {
        consume(&item?);
    }

    handle
        .join()
        .map_err(|_| "producer thread panicked")??;
    Ok(start.elapsed())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    println!("=== TRICKLE Pipeline Demo ===");
    println!("{ITEMS} items, {STEP:?} to produce and {STEP:?} to consume each");

    let eager = run_eager();
    println!("eager: {eager:?}");

    let lazy = run_lazy()?;
    println!("lazy:  {lazy:?}");

    println!(
        "speedup: {:.2}x",
        eager.as_secs_f64() / lazy.as_secs_f64().max(f64::EPSILON)
    );
    Ok(())
}
