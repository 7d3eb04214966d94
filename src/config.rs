// Command-line configuration and validation.

use clap::Parser;

use crate::display::modes::{CpuMode, GpuMode, MemoryMode, PowerMode, Toggle, ViewMode};
use crate::error::TelemetryError;

/// Horizon-chart system telemetry viewer for the terminal.
#[derive(Debug, Clone, Parser)]
#[command(name = "bandtop", version, about)]
pub struct Config {
    /// Sampling period in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub refresh_ms: u64,

    /// Ring capacity per metric series.
    #[arg(long, default_value_t = 500)]
    pub buffer_size: usize,

    /// Initial legend view mode.
    #[arg(long, value_enum, default_value_t = ViewMode::One)]
    pub view: ViewMode,

    /// Initial CPU display mode.
    #[arg(long, value_enum, default_value_t = CpuMode::All)]
    pub cpu: CpuMode,

    /// Initial GPU display mode.
    #[arg(long, value_enum, default_value_t = GpuMode::LoadOnly)]
    pub gpu: GpuMode,

    /// Show or hide swap.
    #[arg(long, value_enum, default_value_t = Toggle::Show)]
    pub swap: Toggle,

    /// Show or hide network rates.
    #[arg(long, value_enum, default_value_t = Toggle::Show)]
    pub network: Toggle,

    /// Show or hide disk rates.
    #[arg(long, value_enum, default_value_t = Toggle::Show)]
    pub disk: Toggle,

    /// Initial power display mode.
    #[arg(long, value_enum, default_value_t = PowerMode::Combined)]
    pub power: PowerMode,

    /// Initial memory display mode.
    #[arg(long, value_enum, default_value_t = MemoryMode::Percent)]
    pub memory: MemoryMode,

    /// Emit CSV to stdout instead of the TUI.
    #[arg(long, default_value_t = false)]
    pub csv: bool,

    /// Serve JSON metrics on this port.
    #[arg(long)]
    pub http_port: Option<u16>,

    /// Host to bind the JSON endpoint to.
    #[arg(long, default_value = "localhost")]
    pub http_host: String,

    /// Serve Prometheus text metrics on this port.
    #[arg(long)]
    pub prometheus_port: Option<u16>,
}

impl Config {
    /// Reject combinations the pipeline cannot serve.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.refresh_ms == 0 {
            return Err(TelemetryError::Config(
                "refresh_ms must be greater than zero".into(),
            ));
        }
        if self.buffer_size == 0 {
            return Err(TelemetryError::Config(
                "buffer_size must be greater than zero".into(),
            ));
        }
        if self.csv && (self.http_port.is_some() || self.prometheus_port.is_some()) {
            return Err(TelemetryError::Config(
                "csv output cannot be combined with http_port or prometheus_port".into(),
            ));
        }
        Ok(())
    }

    /// Sampling interval in seconds, the denominator for counter rates.
    pub fn interval_s(&self) -> f64 {
        self.refresh_ms as f64 / 1000.0
    }
}
