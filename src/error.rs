// Error taxonomy shared across the pipeline.

use thiserror::Error;

/// Exit code for a sampler that died underneath us.
pub const EXIT_SAMPLER_FATAL: i32 = 1;
/// Exit code for invalid configuration.
pub const EXIT_CONFIG: i32 = 2;

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Mutually exclusive flags, out-of-range values.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unsupported OS, or a required privileged tool is absent.
    #[error("platform unavailable: {0}")]
    PlatformUnavailable(String),

    /// The sampler subprocess terminated unexpectedly.
    #[error("sampler terminated: {0}")]
    SourceFatal(String),

    /// Terminal setup, teardown, or thread plumbing failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl TelemetryError {
    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            TelemetryError::Config(_) => EXIT_CONFIG,
            TelemetryError::SourceFatal(_) => EXIT_SAMPLER_FATAL,
            TelemetryError::PlatformUnavailable(_) => EXIT_SAMPLER_FATAL,
            TelemetryError::Io(_) => EXIT_SAMPLER_FATAL,
        }
    }
}
