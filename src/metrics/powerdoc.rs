// Typed view of one powermetrics plist document.
//
// powermetrics emits a stream of self-delimited XML plist documents on
// stdout, separated by a null byte. Each document is deserialized into this
// tree; collectors then read typed fields instead of indexing a dynamic map.
// Power counters arrive in milliwatts, rates in bytes per second.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PowerMetricsDoc {
    pub processor: ProcessorSection,
    #[serde(default)]
    pub gpu: Option<GpuSection>,
    #[serde(default)]
    pub network: Option<NetworkSection>,
    #[serde(default)]
    pub disk: Option<DiskSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorSection {
    #[serde(default)]
    pub clusters: Vec<ClusterSection>,
    /// Milliwatts.
    #[serde(default)]
    pub cpu_power: f64,
    #[serde(default)]
    pub gpu_power: f64,
    #[serde(default)]
    pub ane_power: f64,
    #[serde(default)]
    pub combined_power: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSection {
    pub name: String,
    #[serde(default)]
    pub idle_ratio: f64,
    #[serde(default)]
    pub cpus: Vec<CoreSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoreSection {
    /// System-wide core id.
    pub cpu: u32,
    #[serde(default)]
    pub idle_ratio: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GpuSection {
    #[serde(default)]
    pub idle_ratio: f64,
    #[serde(default)]
    pub freq_hz: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSection {
    /// Bytes per second, already rate-converted by the source.
    #[serde(default)]
    pub ibyte_rate: f64,
    #[serde(default)]
    pub obyte_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiskSection {
    #[serde(default)]
    pub rbytes_per_s: f64,
    #[serde(default)]
    pub wbytes_per_s: f64,
}

impl PowerMetricsDoc {
    /// Parse one null-delimited document. Leading garbage (the null byte
    /// itself, stray whitespace between documents) is tolerated.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let start = bytes
            .iter()
            .position(|b| *b == b'<')
            .ok_or_else(|| anyhow::anyhow!("no XML payload in document chunk"))?;
        let doc = plist::from_bytes(&bytes[start..])?;
        Ok(doc)
    }
}

impl CoreSection {
    /// Active percentage in [0, 100].
    pub fn utilization_percent(&self) -> f64 {
        ratio_to_percent(self.idle_ratio)
    }
}

impl GpuSection {
    pub fn utilization_percent(&self) -> f64 {
        ratio_to_percent(self.idle_ratio)
    }
}

/// Idle ratio → active percent, clamped. Some firmware revisions report
/// ratios marginally outside [0, 1].
fn ratio_to_percent(idle_ratio: f64) -> f64 {
    if !idle_ratio.is_finite() {
        return 0.0;
    }
    ((1.0 - idle_ratio.clamp(0.0, 1.0)) * 100.0).clamp(0.0, 100.0)
}
