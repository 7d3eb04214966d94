// Network throughput collectors: per-interface cumulative counters through
// the rate reader on the polling path, device-wide rates from powermetrics.

use sysinfo::Networks;

use super::{Collector, RateReader};
use crate::metrics::{sanitize_segment, MetricBatch, PlatformContext, Sample};

pub struct SysinfoNetCollector {
    networks: Networks,
}

impl SysinfoNetCollector {
    pub fn new() -> Self {
        SysinfoNetCollector {
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Collector for SysinfoNetCollector {
    fn domain(&self) -> &'static str {
        "network"
    }

    fn collect(
        &mut self,
        _sample: &Sample,
        rates: &mut RateReader,
    ) -> anyhow::Result<MetricBatch> {
        // Re-enumerate every tick; interfaces come and go. A recreated
        // interface resets its counters, which the rate reader clamps.
        self.networks.refresh_list();
        let mut counters: Vec<(String, f64, f64)> = self
            .networks
            .iter()
            .filter(|(name, _)| !is_loopback(name))
            .map(|(name, data)| {
                (
                    name.clone(),
                    data.total_received() as f64,
                    data.total_transmitted() as f64,
                )
            })
            .collect();
        // Enumeration order is not stable across refreshes.
        counters.sort_by(|a, b| a.0.cmp(&b.0));

        let mut total_rx = 0.0;
        let mut total_tx = 0.0;
        let mut per_interface = Vec::with_capacity(counters.len() * 2);
        for (name, rx_total, tx_total) in &counters {
            let seg = sanitize_segment(name);
            let rx = rates.next(&format!("net.{seg}.rx"), *rx_total);
            let tx = rates.next(&format!("net.{seg}.tx"), *tx_total);
            total_rx += rx;
            total_tx += tx;
            per_interface.push((format!("network.interface.{seg}.rx.bytes_per_sec"), rx));
            per_interface.push((format!("network.interface.{seg}.tx.bytes_per_sec"), tx));
        }
        let mut batch: MetricBatch = vec![
            ("network.total.rx.bytes_per_sec".into(), total_rx),
            ("network.total.tx.bytes_per_sec".into(), total_tx),
        ];
        batch.extend(per_interface);
        Ok(batch)
    }
}

fn is_loopback(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0")
}

/// Device-wide byte rates from the powermetrics document; the source
/// exposes no per-interface data.
pub struct PowerMetricsNetCollector;

impl PowerMetricsNetCollector {
    pub fn new() -> Self {
        PowerMetricsNetCollector
    }
}

impl Collector for PowerMetricsNetCollector {
    fn domain(&self) -> &'static str {
        "network"
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
        let network = doc
            .network
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("document has no network section"))?;
        Ok(vec![
            ("network.total.rx.bytes_per_sec".into(), network.ibyte_rate),
            ("network.total.tx.bytes_per_sec".into(), network.obyte_rate),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_filtered() {
        assert!(is_loopback("lo"));
        assert!(is_loopback("lo0"));
        assert!(!is_loopback("eth0"));
        assert!(!is_loopback("en0"));
    }
}
