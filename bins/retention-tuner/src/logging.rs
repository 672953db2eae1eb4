use tracing_subscriber::EnvFilter;

/// JSON lines on stdout: `{"timestamp": ..., "message": ..., <fields>}`.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_target(false)
        .with_level(false)
        .with_env_filter(env_filter)
        .with_writer(std::io::stdout)
        .init();
}
