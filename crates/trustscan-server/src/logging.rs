use tracing_subscriber::EnvFilter;

/// Console logging, controllable via `RUST_LOG`; defaults to info level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
