use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to initialize telemetry: {0}")]
    Init(String),
}

pub struct TelemetryConfig {
    pub level: tracing::Level,
    pub json_output: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            json_output: false,
        }
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` overrides the
/// configured level when set.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_output {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?;
    } else {
        registry
            .with(fmt::layer().with_target(true))
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?;
    }

    Ok(())
}
