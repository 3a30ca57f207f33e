use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize basic console logging when observability is disabled.
///
/// - **Log Level**: `LOG_LEVEL` environment variable (default: "info")
/// - **Filtering**: noisy dependencies held at warn
/// - **Format**: compact, with ANSI colors
pub fn init_basic_console_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "flightgate={log_level},flightgate_cache={log_level},tower_http=warn,hyper=warn,reqwest=warn"
        ))
    });

    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true)
        .with_filter(env_filter);

    // Another subscriber may already be installed (tests, embedding).
    if tracing_subscriber::registry()
        .with(console_layer)
        .try_init()
        .is_ok()
    {
        eprintln!("ℹ️  Observability disabled - console logging only");
    }
}
