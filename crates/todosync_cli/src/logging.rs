use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "TODOSYNC_LOG";

/// Installs a stderr subscriber. `TODOSYNC_LOG` wins over the verbosity flag.
pub fn init(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(filter)
        .try_init();
}
