//! Logging setup shared by the AgroIoT binaries

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,agro=debug";

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable, for local runs
    Compact,
}

impl LogFormat {
    /// Read `AGRO_LOG_FORMAT` (`json` or `compact`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("AGRO_LOG_FORMAT").as_deref() {
            Some("compact") | Some("pretty") => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

/// Initialize logging for a service.
/// - format from `AGRO_LOG_FORMAT`, JSON by default
/// - RUST_LOG respected; default to "info,agro=debug"
pub fn init(service_name: &str) {
    init_with(service_name, LogFormat::from_env());
}

/// Like [`init`] with an explicit format; later calls are ignored
pub fn init_with(service_name: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
    };
    if installed.is_err() {
        return;
    }

    tracing::info!(service = %service_name, ?format, "Logging initialized");
}
