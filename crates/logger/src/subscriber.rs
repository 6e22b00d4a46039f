use std::env::var;
use std::io::stderr;

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber at `info`, or `debug` when `verbose` is set.
pub fn init(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    initialize_tracing(level);
}

/// Install the global subscriber with `level` as the default directive.
///
/// `RUST_LOG` still overrides the directive and `RUST_LOG_FORMAT=json` switches
/// to JSON lines. Everything goes to stderr: stdout is reserved for warning lines.
fn initialize_tracing(level: LevelFilter) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_format = var("RUST_LOG_FORMAT").unwrap_or_default();

    let log_layer = match log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(stderr)
            .with_filter(env_filter)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_writer(stderr)
            .with_filter(env_filter)
            .boxed(),
    };

    // A subscriber may already be installed (tests, embedding); keep the first one.
    if tracing_subscriber::registry().with(log_layer).try_init().is_ok()
        && !matches!(log_format.as_str(), "" | "compact" | "json")
    {
        warn!("Unknown RUST_LOG_FORMAT {log_format:?}, falling back to compact output");
    }
}
