use std::{
    thread,
    time::{Duration, Instant},
};

use clap::Parser;
use log::info;
use settle::task::Builder;

/// Race a slow producer against a reader deadline.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// How long the producer works before writing its result, in milliseconds.
    #[arg(short, long, default_value_t = 1000)]
    work_ms: u64,

    /// Reader deadline in milliseconds.
    #[arg(short, long, default_value_t = 10)]
    timeout_ms: u64,

    /// Number of concurrent readers.
    #[arg(short, long, default_value_t = 3)]
    readers: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let work = Duration::from_millis(args.work_ms);
    let start = Instant::now();

    let future = Builder::new()
        .name("producer".into())
        .timeout(Duration::from_millis(args.timeout_ms))
        .spawn(move || {
            thread::sleep(work);
            info!("producer done after {:?}", start.elapsed());
            args.work_ms
        })?;

    let readers: Vec<_> = (0..args.readers)
        .map(|i| {
            let future = future.clone();
            thread::spawn(move || {
                let (value, found) = future.read();
                println!(
                    "reader {i}: value={value} found={found} after {:?}",
                    start.elapsed()
                );
            })
        })
        .collect();

    for r in readers {
        r.join()
            .map_err(|_| anyhow::anyhow!("reader panicked"))?;
    }

    // Give a late producer the chance to attempt its write.
    thread::sleep(work.saturating_sub(start.elapsed()) + Duration::from_millis(50));
    println!("final: {:?} -> {:?}", future.state(), future.read());

    Ok(())
}
