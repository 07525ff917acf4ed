use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a `tracing` subscriber writing to stderr, so stdout stays
/// reserved for the success summary line (§6).
///
/// Uses the `INFO` level by default, overridable with the `COSM_LOG`
/// environment variable, falling back to `RUST_LOG`, falling back to the
/// default. `verbosity` (from `-v`/`-vv`/`-vvv`) raises the default floor
/// and, above `INFO`, also prints target/file/line.
pub fn init(verbosity: Option<LevelFilter>) {
    let default_level = verbosity.unwrap_or(LevelFilter::INFO);
    let env_filter = EnvFilter::try_from_env("COSM_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| {
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy()
        });

    let verbose = env_filter.max_level_hint().is_some_and(|level| level > tracing::Level::INFO);

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .init();
}
