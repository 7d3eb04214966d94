// Sample and metric-name model shared by samplers, collectors, and outputs.

pub mod powerdoc;

pub use powerdoc::PowerMetricsDoc;

/// One batch of standardized readings, in emission order. Emission order is
/// what fixes the first-seen series order in the store, so collectors must
/// emit deterministically.
pub type MetricBatch = Vec<(String, f64)>;

/// Raw platform observation attached to a sample.
#[derive(Debug, Clone)]
pub enum PlatformContext {
    /// Parsed powermetrics document (macOS subprocess path).
    PowerMetrics(PowerMetricsDoc),
    /// Marker for the polling path; collectors read live OS sources.
    Polling { timestamp: f64 },
}

/// A time-stamped raw observation produced by the sampler.
#[derive(Debug, Clone)]
pub struct Sample {
    /// UNIX seconds with sub-second resolution.
    pub timestamp: f64,
    pub raw: PlatformContext,
}

impl Sample {
    pub fn now(raw: PlatformContext) -> Self {
        Sample {
            timestamp: unix_now(),
            raw,
        }
    }
}

/// Current UNIX time in seconds at microsecond resolution.
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1e6
}

/// First segment of a standardized name, e.g. `cpu` for
/// `cpu.performance.0.core.2.utilization.percent`.
pub fn domain_of(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Lowercase a raw source label into a valid name segment: `[a-z0-9_]+`.
pub fn sanitize_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}
