// Memory and swap gauges via sysinfo on every platform.

use sysinfo::System;

use super::{Collector, RateReader};
use crate::metrics::{MetricBatch, Sample};

pub struct MemoryCollector {
    system: System,
}

impl MemoryCollector {
    pub fn new() -> Self {
        MemoryCollector {
            system: System::new(),
        }
    }
}

impl Collector for MemoryCollector {
    fn domain(&self) -> &'static str {
        "memory"
    }

    fn collect(
        &mut self,
        _sample: &Sample,
        _rates: &mut RateReader,
    ) -> anyhow::Result<MetricBatch> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            anyhow::bail!("total memory reported as zero");
        }
        let used = self.system.used_memory();
        let mut batch: MetricBatch = vec![
            (
                "memory.system.total.used.percent".into(),
                used as f64 / total as f64 * 100.0,
            ),
            ("memory.system.total.used.bytes".into(), used as f64),
        ];
        // Extended breakdown; absent counters are simply not emitted.
        let available = self.system.available_memory();
        if available > 0 {
            batch.push(("memory.system.available.bytes".into(), available as f64));
        }
        let free = self.system.free_memory();
        if free > 0 {
            batch.push(("memory.system.free.bytes".into(), free as f64));
        }
        Ok(batch)
    }
}

pub struct SwapCollector {
    system: System,
}

impl SwapCollector {
    pub fn new() -> Self {
        SwapCollector {
            system: System::new(),
        }
    }
}

impl Collector for SwapCollector {
    fn domain(&self) -> &'static str {
        "swap"
    }

    fn collect(
        &mut self,
        _sample: &Sample,
        _rates: &mut RateReader,
    ) -> anyhow::Result<MetricBatch> {
        self.system.refresh_memory();
        // Absolute bytes, not a rate.
        Ok(vec![(
            "swap.system.used.bytes".into(),
            self.system.used_swap() as f64,
        )])
    }
}
