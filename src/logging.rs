use std::io;
/// Structured logging setup for the packager frontend
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Initialize structured logging with optional JSON output
pub fn init_logging(json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("modelpacker=info"));

    let registry = Registry::default().with(env_filter);

    if json_output {
        // JSON output for structured logging aggregation
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_events(FmtSpan::ACTIVE),
            )
            .init();
    } else {
        // Pretty console output; stderr keeps stdout free for the build driver
        registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
    }

    Ok(())
}
