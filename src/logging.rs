use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a `fmt` subscriber writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (e.g. `"info"` or
/// `"rampart_sync=debug,warn"`) is used. The primitives only emit events,
/// so calling this is up to the application, and only once.
pub fn init_tracing(
    default_filter: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .compact()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
