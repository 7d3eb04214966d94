// Process wiring: parse flags, start the sampler, then hand the foreground
// to the TUI, the CSV stream, or both HTTP workers as configured.

mod collect;
mod config;
mod display;
mod error;
mod metrics;
mod output;
mod sampler;
mod store;
mod ui;

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::info;

use crate::collect::CollectorSet;
use crate::config::Config;
use crate::error::TelemetryError;
use crate::metrics::Sample;
use crate::output::csv::CsvWriter;
use crate::store::MetricStore;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::parse();
    if let Err(err) = config.validate() {
        eprintln!("bandtop: {err}");
        process::exit(err.exit_code());
    }

    if let Err(err) = run(config) {
        eprintln!("bandtop: {err}");
        process::exit(err.exit_code());
    }
}

fn run(config: Config) -> Result<(), TelemetryError> {
    let store = Arc::new(MetricStore::new(config.buffer_size));
    let shutdown = Arc::new(AtomicBool::new(false));
    let fatal: Arc<OnceLock<String>> = Arc::new(OnceLock::new());

    let mut collectors = CollectorSet::new(collect::for_platform(), config.interval_s());
    let mut csv = config.csv.then(CsvWriter::stdout);
    let callback_store = store.clone();
    let callback_shutdown = shutdown.clone();
    let callback = Box::new(move |sample: Sample| {
        let batch = collectors.run_tick(&sample);
        callback_store.ingest(&batch);
        if let Some(writer) = csv.as_mut() {
            if let Err(err) = writer.write_tick(sample.timestamp, &batch) {
                // Downstream pipe closed; wind down without an error exit.
                info!("csv output closed ({err}), stopping");
                callback_shutdown.store(true, Ordering::Release);
            }
        }
    });

    let sampler = sampler::spawn(&config, shutdown.clone(), fatal.clone(), callback)?;
    info!(
        "sampling every {}ms into {}-deep rings",
        config.refresh_ms, config.buffer_size
    );

    if config.csv {
        wait_for_shutdown(&shutdown);
    } else {
        // HTTP workers are detached; any in-flight response is dropped at
        // shutdown.
        if let Some(port) = config.http_port {
            let _ = output::http::spawn_json(store.clone(), &config.http_host, port, shutdown.clone());
        }
        if let Some(port) = config.prometheus_port {
            let _ = output::http::spawn_prometheus(store.clone(), port, shutdown.clone());
        }
        ui::run(&config, store, shutdown.clone())?;
    }

    shutdown.store(true, Ordering::Release);
    sampler.join();

    match fatal.get() {
        Some(message) => Err(TelemetryError::SourceFatal(message.clone())),
        None => Ok(()),
    }
}

/// Foreground loop for headless modes: the sampler drives everything, the
/// main thread just waits for the flag.
fn wait_for_shutdown(shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::Acquire) {
        thread::sleep(Duration::from_millis(200));
    }
}
