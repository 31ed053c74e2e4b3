mod feed;

use std::sync::Arc;

use anyhow::Context;
use tatc_core::{
    config::{ChannelConfigs, Environment},
    messaging::{ThrottleConfig, ThrottledSink},
    pipeline::Pipeline,
    registry::Registry,
    store::FrequencyStore,
    translation::MorseTable,
};
use tatc_http::HttpProvider;
use tracing::info;

/// Seed the store and wire the registry. Runs on the blocking pool: it touches
/// SQLite and builds a blocking HTTP client.
fn build_pipeline(env: Environment) -> tatc_core::Result<Pipeline> {
    let store = Arc::new(FrequencyStore::new(env.database_file.clone()));
    let report = store.initialize(Some(&env.resources_dir))?;
    info!(
        "frequency store {}: {} scripts, {} seed files, {} rows inserted, {} already present",
        store.path().display(),
        report.scripts,
        report.files,
        report.rows_inserted,
        report.rows_skipped
    );

    let morse_table = Arc::new(MorseTable::load_or_builtin(&env.morse_code_file())?);
    let provider = Arc::new(HttpProvider::from_env()?);
    let registry = Arc::new(Registry::new(store, provider, morse_table));

    info!(
        "detection model: {} (configured {}), default engine: {}",
        env.effective_detection_model(),
        env.language_detection_model,
        env.default_translation_engine
    );
    Ok(Pipeline::new(env, registry))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tatc_core::logging::init("tatc")?;

    let env = Environment::load()?;
    let channels = ChannelConfigs::load(&env.channels_file)
        .with_context(|| format!("loading {}", env.channels_file.display()))?;
    let enabled = channels.enabled_channels();
    info!("configured channels: {}", enabled.len());

    let pipeline = tokio::task::spawn_blocking(move || build_pipeline(env))
        .await
        .context("startup task panicked")??;

    let sink = Arc::new(ThrottledSink::new(
        Arc::new(feed::LineSink::new(tokio::io::stdout())),
        ThrottleConfig::default(),
    ));
    let dispatcher = feed::Dispatcher::new(Arc::new(pipeline), Arc::new(channels), sink);

    feed::run(tokio::io::BufReader::new(tokio::io::stdin()), dispatcher).await
}
