use crate::Result;

/// Initialize tracing for the process.
///
/// Default: info everywhere, including our crates.
/// Can be overridden with `RUST_LOG`. Logs go to stderr; stdout carries chat output.
pub fn init(service_name: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,tatc=info,tatc_core=info,tatc_http=info,{service_name}=info"
        ))
    });

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .try_init();

    Ok(())
}
