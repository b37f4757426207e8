use anyhow::{bail, Context, Result};
use reqwest::Client;
use sapscraper::{
    collect::process_tables,
    config::Config,
    fetch::LeanxSource,
    input::read_table_names,
    llm::GeminiClient,
    structure::StructureStore,
};
use std::{fs, sync::Mutex};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// The smoke-test table, run alone before the full batch.
const SMOKE_TABLE: &str = "TCURR";
const SMOKE_OUTPUT_FILE: &str = "tcurr_structure.json";
const BATCH_OUTPUT_FILE: &str = "sap_tables_structure.json";
const LOG_FILE: &str = "app.log";

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) load config; a missing API key aborts before anything runs ───
    let config = Config::from_env()?;
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    // ─── 2) init logging to stdout + append-only run log ─────────────
    let log_path = config.output_dir.join(LOG_FILE);
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening {}", log_path.display()))?;
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(log_file)))
        .init();
    info!(model = %config.model, resume = config.resume, "startup");

    // ─── 3) wire up reference source + generator ─────────────────────
    let client = Client::new();
    let source = LeanxSource::new(client.clone());
    let generator = GeminiClient::new(client, config.api_key.clone(), config.model.clone());

    // ─── 4) smoke run: one table, distinct output file ───────────────
    info!(table = SMOKE_TABLE, "starting smoke run");
    let smoke_path = config.output_dir.join(SMOKE_OUTPUT_FILE);
    let mut smoke_store = StructureStore::open(&smoke_path, false)?;
    let smoke = process_tables(
        &source,
        &generator,
        &[SMOKE_TABLE.to_string()],
        &mut smoke_store,
    )
    .await?;
    if smoke.saved.is_empty() {
        bail!("smoke run for {} failed; not starting the full batch", SMOKE_TABLE);
    }
    info!(path = %smoke_path.display(), "smoke run complete");

    // ─── 5) read the table list ──────────────────────────────────────
    let tables = read_table_names(&config.input_path)?;
    info!(count = tables.len(), "tables to process");

    // ─── 6) full batch with progressive save ─────────────────────────
    let batch_path = config.output_dir.join(BATCH_OUTPUT_FILE);
    let mut store = StructureStore::open(&batch_path, config.resume)?;
    if !store.is_empty() {
        info!(existing = store.len(), "resuming from previous run");
    }
    let summary = process_tables(&source, &generator, &tables, &mut store).await?;

    info!(
        saved = summary.saved.len(),
        skipped = summary.skipped.len(),
        resumed = summary.resumed,
        path = %batch_path.display(),
        "run complete"
    );
    Ok(())
}
