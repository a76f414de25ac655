pub mod config;
pub mod gateway;

pub use config::{ConfigError, GatewayConfig, ProviderKind};
pub use gateway::{GatewayError, OperationRequest, OperationResult, SecureAiGateway};

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
