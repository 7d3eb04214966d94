// Platform samplers. One dedicated thread produces a Sample per period and
// hands it to the callback under no lock; the callback runs the collector
// set and must finish well inside one period.

pub mod polling;
#[cfg(target_os = "macos")]
pub mod powermetrics;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, OnceLock};
use std::thread;

use crate::config::Config;
use crate::error::TelemetryError;
use crate::metrics::Sample;

pub type SampleCallback = Box<dyn FnMut(Sample) + Send>;

pub struct SamplerHandle {
    thread: thread::JoinHandle<()>,
}

impl SamplerHandle {
    pub fn new(thread: thread::JoinHandle<()>) -> Self {
        SamplerHandle { thread }
    }

    /// Wait for the sampler to observe shutdown and exit. Blocks for at
    /// most about one sampling period.
    pub fn join(self) {
        if self.thread.join().is_err() {
            log::error!("sampler thread panicked");
        }
    }
}

/// Start the sampler for this platform. A fatal source error is published
/// through `fatal` and the shutdown flag before the thread exits.
pub fn spawn(
    config: &Config,
    shutdown: Arc<AtomicBool>,
    fatal: Arc<OnceLock<String>>,
    callback: SampleCallback,
) -> Result<SamplerHandle, TelemetryError> {
    #[cfg(target_os = "macos")]
    {
        powermetrics::spawn(config.refresh_ms, shutdown, fatal, callback)
    }
    #[cfg(not(target_os = "macos"))]
    {
        let _ = &fatal;
        Ok(polling::spawn(config.refresh_ms, shutdown, callback))
    }
}
