// GPU gauges from the powermetrics document. VRAM counters are not part of
// that source, so only the compute load and the device count are emitted;
// a zero placeholder would read as a real measurement downstream.

use super::{Collector, RateReader};
use crate::metrics::{MetricBatch, PlatformContext, Sample};

pub struct PowerMetricsGpuCollector;

impl PowerMetricsGpuCollector {
    pub fn new() -> Self {
        PowerMetricsGpuCollector
    }
}

impl Collector for PowerMetricsGpuCollector {
    fn domain(&self) -> &'static str {
        "gpu"
    }

    fn collect(
        &mut self,
        sample: &Sample,
        _rates: &mut RateReader,
    ) -> anyhow::Result<MetricBatch> {
        let doc = match &sample.raw {
            PlatformContext::PowerMetrics(doc) => doc,
            PlatformContext::Polling { .. } => {
                anyhow::bail!("powermetrics document missing from sample")
            }
        };
        let gpu = doc
            .gpu
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("document has no gpu section"))?;
        Ok(vec![
            (
                "gpu.apple.0.compute.utilization.percent".into(),
                gpu.utilization_percent(),
            ),
            ("gpu.total.count".into(), 1.0),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::powerdoc::{GpuSection, PowerMetricsDoc, ProcessorSection};

    fn doc_with_gpu(idle_ratio: f64) -> Sample {
        Sample {
            timestamp: 0.0,
            raw: PlatformContext::PowerMetrics(PowerMetricsDoc {
                processor: ProcessorSection {
                    clusters: vec![],
                    cpu_power: 0.0,
                    gpu_power: 0.0,
                    ane_power: 0.0,
                    combined_power: 0.0,
                },
                gpu: Some(GpuSection {
                    idle_ratio,
                    freq_hz: 0.0,
                }),
                network: None,
                disk: None,
            }),
        }
    }

    #[test]
    fn test_gpu_load_from_idle_ratio() {
        let mut collector = PowerMetricsGpuCollector::new();
        let mut rates = RateReader::new(1.0);
        let batch = collector.collect(&doc_with_gpu(0.25), &mut rates).unwrap();
        assert_eq!(batch[0].0, "gpu.apple.0.compute.utilization.percent");
        assert!((batch[0].1 - 75.0).abs() < 1e-9);
        assert_eq!(batch[1], ("gpu.total.count".into(), 1.0));
    }

    #[test]
    fn test_missing_gpu_section_is_an_error() {
        let mut collector = PowerMetricsGpuCollector::new();
        let mut rates = RateReader::new(1.0);
        let mut sample = doc_with_gpu(0.0);
        if let PlatformContext::PowerMetrics(doc) = &mut sample.raw {
            doc.gpu = None;
        }
        assert!(collector.collect(&sample, &mut rates).is_err());
    }
}
