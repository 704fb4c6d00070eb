// src/logging.rs

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `commit_sampler=debug`
pub const LOG_ENV: &str = "COMMIT_SAMPLER_LOG";

/// Installs the global subscriber, writing to stderr so progress bars and
/// reports on stdout stay readable. Defaults to `info`.
pub fn init(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
