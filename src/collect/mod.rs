// Collector registry: one collector per (domain, platform), selected by an
// explicit startup-time factory. A failing collector only loses its own
// keys for that tick.

pub mod ane;
pub mod cpu;
pub mod disk;
pub mod gpu;
pub mod memory;
pub mod net;
pub mod power;

use std::collections::HashMap;

use log::{debug, warn};

use crate::metrics::{MetricBatch, Sample};

/// Converts one raw sample into standardized readings for a single domain.
pub trait Collector: Send {
    fn domain(&self) -> &'static str;

    fn collect(&mut self, sample: &Sample, rates: &mut RateReader)
        -> anyhow::Result<MetricBatch>;
}

/// Turns monotonically increasing counters into per-second rates.
pub struct RateReader {
    interval_s: f64,
    last: HashMap<String, f64>,
}

impl RateReader {
    pub fn new(interval_s: f64) -> Self {
        RateReader {
            interval_s,
            last: HashMap::new(),
        }
    }

    /// Rate for `key` given the latest cumulative `sample`. The first
    /// observation of a key and counter resets both yield 0.
    pub fn next(&mut self, key: &str, sample: f64) -> f64 {
        let rate = match self.last.get(key) {
            None => 0.0,
            Some(prev) if sample < *prev => 0.0,
            Some(prev) => (sample - prev) / self.interval_s,
        };
        self.last.insert(key.to_string(), sample);
        rate
    }
}

/// The ordered collector set for this platform plus shared rate state.
pub struct CollectorSet {
    collectors: Vec<Box<dyn Collector>>,
    rates: RateReader,
    /// Consecutive failures per domain, to promote repeated misses to WARN.
    failures: HashMap<&'static str, u32>,
}

/// Failures per domain tolerated at DEBUG before escalating.
const FAILURE_WARN_THRESHOLD: u32 = 3;

impl CollectorSet {
    pub fn new(collectors: Vec<Box<dyn Collector>>, interval_s: f64) -> Self {
        CollectorSet {
            collectors,
            rates: RateReader::new(interval_s),
            failures: HashMap::new(),
        }
    }

    /// Run every collector against one sample. Per-collector errors drop
    /// that domain's keys for the tick; the rest proceed.
    pub fn run_tick(&mut self, sample: &Sample) -> MetricBatch {
        let mut batch = MetricBatch::new();
        for collector in &mut self.collectors {
            let domain = collector.domain();
            match collector.collect(sample, &mut self.rates) {
                Ok(readings) => {
                    self.failures.remove(domain);
                    batch.extend(readings);
                }
                Err(err) => {
                    let count = self.failures.entry(domain).or_insert(0);
                    *count += 1;
                    if *count >= FAILURE_WARN_THRESHOLD {
                        warn!("{domain} collector failed {count} times in a row: {err}");
                    } else {
                        debug!("{domain} collector skipped this tick: {err}");
                    }
                }
            }
        }
        batch
    }
}

/// Ordered collectors for the platform the process runs on. Order fixes the
/// vertical layout: cpu, gpu, accel, memory, swap, power, disk, network.
#[cfg(target_os = "macos")]
pub fn for_platform() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(cpu::PowerMetricsCpuCollector::new()),
        Box::new(gpu::PowerMetricsGpuCollector::new()),
        Box::new(ane::AneCollector::detected()),
        Box::new(memory::MemoryCollector::new()),
        Box::new(memory::SwapCollector::new()),
        Box::new(power::PowerCollector::new()),
        Box::new(disk::PowerMetricsDiskCollector::new()),
        Box::new(net::PowerMetricsNetCollector::new()),
    ]
}

#[cfg(not(target_os = "macos"))]
pub fn for_platform() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(cpu::SysinfoCpuCollector::new()),
        Box::new(memory::MemoryCollector::new()),
        Box::new(memory::SwapCollector::new()),
        Box::new(disk::ProcDiskCollector::new()),
        Box::new(net::SysinfoNetCollector::new()),
    ]
}
