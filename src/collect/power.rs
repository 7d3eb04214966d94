// Component power draw from the powermetrics processor section. Counters
// arrive in milliwatts.

use super::{Collector, RateReader};
use crate::metrics::{MetricBatch, PlatformContext, Sample};

pub struct PowerCollector;

impl PowerCollector {
    pub fn new() -> Self {
        PowerCollector
    }
}

impl Collector for PowerCollector {
    fn domain(&self) -> &'static str {
        "power"
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
        let processor = &doc.processor;
        let total = if processor.combined_power > 0.0 {
            processor.combined_power
        } else {
            processor.cpu_power + processor.gpu_power + processor.ane_power
        };
        Ok(vec![
            (
                "power.component.total.consumption.watts".into(),
                total / 1000.0,
            ),
            (
                "power.component.cpu.consumption.watts".into(),
                processor.cpu_power / 1000.0,
            ),
            (
                "power.component.gpu.consumption.watts".into(),
                processor.gpu_power / 1000.0,
            ),
            (
                "power.component.ane.consumption.watts".into(),
                processor.ane_power / 1000.0,
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::powerdoc::{PowerMetricsDoc, ProcessorSection};

    fn sample_with_power(cpu: f64, gpu: f64, ane: f64, combined: f64) -> Sample {
        Sample {
            timestamp: 0.0,
            raw: PlatformContext::PowerMetrics(PowerMetricsDoc {
                processor: ProcessorSection {
                    clusters: vec![],
                    cpu_power: cpu,
                    gpu_power: gpu,
                    ane_power: ane,
                    combined_power: combined,
                },
                gpu: None,
                network: None,
                disk: None,
            }),
        }
    }

    #[test]
    fn test_milliwatts_become_watts() {
        let mut collector = PowerCollector::new();
        let mut rates = RateReader::new(1.0);
        let batch = collector
            .collect(&sample_with_power(1250.0, 500.0, 2000.0, 3750.0), &mut rates)
            .unwrap();
        assert_eq!(
            batch[0],
            ("power.component.total.consumption.watts".into(), 3.75)
        );
        assert_eq!(
            batch[1],
            ("power.component.cpu.consumption.watts".into(), 1.25)
        );
    }

    #[test]
    fn test_total_falls_back_to_component_sum() {
        let mut collector = PowerCollector::new();
        let mut rates = RateReader::new(1.0);
        let batch = collector
            .collect(&sample_with_power(1000.0, 2000.0, 500.0, 0.0), &mut rates)
            .unwrap();
        assert_eq!(batch[0].1, 3.5);
    }
}
