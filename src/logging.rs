use tracing_subscriber::EnvFilter;

/// Logs go to stderr so `check --json` output stays machine-readable.
/// `RUST_LOG` wins over the defaults when set.
pub fn init(verbose: bool) {
    let default = if verbose {
        "verifact=debug,tower_http=debug,info"
    } else {
        "verifact=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}
