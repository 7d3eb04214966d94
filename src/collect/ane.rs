// Apple Neural Engine utilization, approximated from instantaneous power
// draw against the chip's maximum. The maximum comes from a per-chip table
// keyed by the sysctl brand string.

use std::collections::HashMap;

use log::warn;

use super::{Collector, RateReader};
use crate::metrics::{MetricBatch, PlatformContext, Sample};

/// Fallback for chips missing from the table. Low on purpose: an
/// under-estimated maximum can only over-report utilization, which the
/// clamp catches, while the reverse would hide real load.
pub const DEFAULT_MAX_WATTS: f64 = 8.0;

lazy_static::lazy_static! {
    static ref ANE_MAX_WATTS: HashMap<&'static str, f64> = {
        let mut table = HashMap::new();

        // M1 series (2020-2022)
        table.insert("M1", 8.0);
        table.insert("M1 Pro", 8.0);
        table.insert("M1 Max", 8.0);
        table.insert("M1 Ultra", 8.0);

        // M2 series (2022-2023)
        table.insert("M2", 15.8);
        table.insert("M2 Pro", 15.8);
        table.insert("M2 Max", 15.8);
        table.insert("M2 Ultra", 15.8);

        // M3 series (2023)
        table.insert("M3", 15.8);
        table.insert("M3 Pro", 15.8);
        table.insert("M3 Max", 15.8);

        // M4 series (2024)
        table.insert("M4", 15.8);
        table.insert("M4 Pro", 15.8);
        table.insert("M4 Max", 15.8);

        table
    };
}

/// Maximum ANE draw for a chip model such as "M2 Pro".
pub fn max_watts_for_chip(chip: Option<&str>) -> (f64, bool) {
    match chip.and_then(|c| ANE_MAX_WATTS.get(c)) {
        Some(watts) => (*watts, true),
        None => (DEFAULT_MAX_WATTS, false),
    }
}

/// Watts → percent of the chip maximum, clamped to [0, 100].
pub fn utilization_percent(watts: f64, max_watts: f64) -> f64 {
    if max_watts <= 0.0 || !watts.is_finite() {
        return 0.0;
    }
    (watts / max_watts * 100.0).clamp(0.0, 100.0)
}

/// Extract the chip model from a brand string like "Apple M2 Pro".
pub fn parse_chip_model(brand_string: &str) -> Option<String> {
    let chip = brand_string.strip_prefix("Apple ")?;
    if chip.starts_with('M') && chip.len() >= 2 {
        Some(chip.to_string())
    } else {
        None
    }
}

#[cfg(target_os = "macos")]
mod chip_detection {
    use std::ffi::{c_void, CString};

    use libc::{size_t, sysctlbyname};

    /// Read a string sysctl; None if the key is absent or malformed.
    pub fn sysctl_string(name: &str) -> Option<String> {
        let c_name = CString::new(name).ok()?;
        let mut size: size_t = 0;
        let rc = unsafe {
            sysctlbyname(
                c_name.as_ptr(),
                std::ptr::null_mut(),
                &mut size,
                std::ptr::null_mut(),
                0,
            )
        };
        if rc != 0 || size == 0 {
            return None;
        }
        let mut buffer: Vec<u8> = vec![0; size];
        let rc = unsafe {
            sysctlbyname(
                c_name.as_ptr(),
                buffer.as_mut_ptr() as *mut c_void,
                &mut size,
                std::ptr::null_mut(),
                0,
            )
        };
        if rc != 0 {
            return None;
        }
        if let Some(null_pos) = buffer.iter().position(|b| *b == 0) {
            buffer.truncate(null_pos);
        }
        String::from_utf8(buffer).ok()
    }
}

#[cfg(not(target_os = "macos"))]
mod chip_detection {
    pub fn sysctl_string(_name: &str) -> Option<String> {
        None
    }
}

pub struct AneCollector {
    max_watts: f64,
}

impl AneCollector {
    /// Resolve the chip model once at startup; an unknown model logs a
    /// single warning and uses the conservative default.
    pub fn detected() -> Self {
        let chip = chip_detection::sysctl_string("machdep.cpu.brand_string")
            .as_deref()
            .and_then(parse_chip_model);
        let (max_watts, known) = max_watts_for_chip(chip.as_deref());
        if !known {
            warn!(
                "unknown chip model {:?}, assuming ANE maximum of {DEFAULT_MAX_WATTS} W",
                chip
            );
        }
        AneCollector { max_watts }
    }

    pub fn with_max_watts(max_watts: f64) -> Self {
        AneCollector { max_watts }
    }
}

impl Collector for AneCollector {
    fn domain(&self) -> &'static str {
        "accel"
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
        let watts = doc.processor.ane_power / 1000.0;
        Ok(vec![(
            "accel.ane.utilization.percent".into(),
            utilization_percent(watts, self.max_watts),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::powerdoc::{PowerMetricsDoc, ProcessorSection};

    #[test]
    fn test_two_watts_of_eight_is_twenty_five_percent() {
        assert_eq!(utilization_percent(2.0, 8.0), 25.0);
    }

    #[test]
    fn test_utilization_clamped_to_hundred() {
        assert_eq!(utilization_percent(20.0, 8.0), 100.0);
        assert_eq!(utilization_percent(-1.0, 8.0), 0.0);
    }

    #[test]
    fn test_chip_table_lookup() {
        assert_eq!(max_watts_for_chip(Some("M1 Pro")), (8.0, true));
        assert_eq!(max_watts_for_chip(Some("M2 Max")), (15.8, true));
        assert_eq!(
            max_watts_for_chip(Some("M99")),
            (DEFAULT_MAX_WATTS, false)
        );
        assert_eq!(max_watts_for_chip(None), (DEFAULT_MAX_WATTS, false));
    }

    #[test]
    fn test_parse_chip_model() {
        assert_eq!(parse_chip_model("Apple M3 Max"), Some("M3 Max".into()));
        assert_eq!(parse_chip_model("Apple M4"), Some("M4".into()));
        assert_eq!(parse_chip_model("Intel(R) Core(TM) i7"), None);
    }

    #[test]
    fn test_collector_scales_milliwatts() {
        let mut collector = AneCollector::with_max_watts(8.0);
        let mut rates = RateReader::new(1.0);
        let sample = Sample {
            timestamp: 0.0,
            raw: PlatformContext::PowerMetrics(PowerMetricsDoc {
                processor: ProcessorSection {
                    clusters: vec![],
                    cpu_power: 0.0,
                    gpu_power: 0.0,
                    ane_power: 2000.0,
                    combined_power: 0.0,
                },
                gpu: None,
                network: None,
                disk: None,
            }),
        };
        let batch = collector.collect(&sample, &mut rates).unwrap();
        assert_eq!(batch, vec![("accel.ane.utilization.percent".into(), 25.0)]);
    }
}
