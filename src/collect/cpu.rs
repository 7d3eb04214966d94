// CPU utilization collectors. The powermetrics path walks the document's
// cluster tree; the polling path reads per-core percentages from sysinfo.

use sysinfo::System;

use super::{Collector, RateReader};
use crate::metrics::powerdoc::ProcessorSection;
use crate::metrics::{sanitize_segment, MetricBatch, PlatformContext, Sample};

/// Cluster-aware collector over the powermetrics document.
pub struct PowerMetricsCpuCollector;

impl PowerMetricsCpuCollector {
    pub fn new() -> Self {
        PowerMetricsCpuCollector
    }
}

impl Collector for PowerMetricsCpuCollector {
    fn domain(&self) -> &'static str {
        "cpu"
    }

    fn collect(
        &mut self,
        sample: &Sample,
        _rates: &mut RateReader,
    ) -> anyhow::Result<MetricBatch> {
        match &sample.raw {
            PlatformContext::PowerMetrics(doc) => Ok(collect_clusters(&doc.processor)),
            PlatformContext::Polling { .. } => {
                anyhow::bail!("powermetrics document missing from sample")
            }
        }
    }
}

/// Emit per-cluster totals and per-core utilizations, then the core count.
/// The cluster total is the mean of its member cores.
pub fn collect_clusters(processor: &ProcessorSection) -> MetricBatch {
    let mut batch = MetricBatch::new();
    let mut core_count = 0usize;
    for (idx, cluster) in processor.clusters.iter().enumerate() {
        let name = sanitize_segment(&cluster.name);
        let utils: Vec<f64> = cluster
            .cpus
            .iter()
            .map(|core| core.utilization_percent())
            .collect();
        let total = if utils.is_empty() {
            0.0
        } else {
            utils.iter().sum::<f64>() / utils.len() as f64
        };
        batch.push((
            format!("cpu.{name}.{idx}.total.utilization.percent"),
            total,
        ));
        for (core, util) in cluster.cpus.iter().zip(&utils) {
            batch.push((
                format!("cpu.{name}.{idx}.core.{}.utilization.percent", core.cpu),
                *util,
            ));
        }
        core_count += cluster.cpus.len();
    }
    batch.push(("cpu.total.count".into(), core_count as f64));
    batch
}

/// Polling collector over sysinfo. Usage is measured between consecutive
/// refreshes, so the first tick reports zeros.
pub struct SysinfoCpuCollector {
    system: System,
}

impl SysinfoCpuCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_specifics(sysinfo::CpuRefreshKind::everything());
        SysinfoCpuCollector { system }
    }
}

impl Collector for SysinfoCpuCollector {
    fn domain(&self) -> &'static str {
        "cpu"
    }

    fn collect(
        &mut self,
        _sample: &Sample,
        _rates: &mut RateReader,
    ) -> anyhow::Result<MetricBatch> {
        self.system
            .refresh_cpu_specifics(sysinfo::CpuRefreshKind::everything());
        let cpus = self.system.cpus();
        if cpus.is_empty() {
            anyhow::bail!("no cpus reported");
        }
        let mut batch = MetricBatch::new();
        let mean = cpus.iter().map(|c| c.cpu_usage() as f64).sum::<f64>() / cpus.len() as f64;
        batch.push((
            "cpu.cpu.0.total.utilization.percent".into(),
            mean.clamp(0.0, 100.0),
        ));
        for (i, cpu) in cpus.iter().enumerate() {
            batch.push((
                format!("cpu.cpu.0.core.{i}.utilization.percent"),
                (cpu.cpu_usage() as f64).clamp(0.0, 100.0),
            ));
        }
        batch.push(("cpu.total.count".into(), cpus.len() as f64));
        Ok(batch)
    }
}
