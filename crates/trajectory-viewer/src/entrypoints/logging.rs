/// Initialize logging.
///
/// If RUST_LOG is not set, a default filter is installed: debug builds log the
/// library at debug level, release builds stay at info.
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    if std::env::var("RUST_LOG").is_err() {
        // Safety: single-threaded at startup
        unsafe {
            if cfg!(debug_assertions) {
                std::env::set_var("RUST_LOG", "info,trajectory_lib=debug,reqwest::connect=info");
            } else {
                std::env::set_var("RUST_LOG", "info");
            }
        }
    }

    // Logs go to stderr so stdout stays clean for exported GeoJSON
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::debug!("Logging initialized");
}
