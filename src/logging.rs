use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "faraway=info,russh=warn";

/// Install the process-wide subscriber. `RUST_LOG` wins when set, which also
/// allows turning on transport-level debugging in the ssh stack.
pub fn init_logging() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(DEFAULT_FILTER)
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
