// Polling sampler: tick on an absolute deadline so the cadence does not
// drift with collector runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::{SampleCallback, SamplerHandle};
use crate::metrics::{unix_now, PlatformContext, Sample};

pub fn spawn(
    refresh_ms: u64,
    shutdown: Arc<AtomicBool>,
    mut callback: SampleCallback,
) -> SamplerHandle {
    let period = Duration::from_millis(refresh_ms);
    let thread = thread::Builder::new()
        .name("sampler".into())
        .spawn(move || {
            let mut deadline = Instant::now();
            while !shutdown.load(Ordering::Acquire) {
                let timestamp = unix_now();
                callback(Sample {
                    timestamp,
                    raw: PlatformContext::Polling { timestamp },
                });
                deadline += period;
                let now = Instant::now();
                if deadline > now {
                    thread::sleep(deadline - now);
                } else {
                    // Collectors overran the period; realign instead of
                    // firing a burst of catch-up ticks.
                    deadline = now;
                }
            }
        })
        .expect("spawn sampler thread");
    SamplerHandle::new(thread)
}
