// src/collect.rs

use anyhow::{anyhow, Result};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::fetch::TableInfoSource;
use crate::llm::{build_structure_prompt, parse_structure, Generate};
use crate::structure::{StructureStore, TableStructure};

/// Why one table was skipped. Caught at the item boundary; never aborts the
/// batch.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("table lookup failed: {0}")]
    Lookup(anyhow::Error),

    #[error("generator call failed: {0}")]
    Generator(anyhow::Error),

    #[error("malformed structure: {0}")]
    Malformed(anyhow::Error),
}

/// What happened to each input name over one run.
#[derive(Debug, Default)]
pub struct CollectSummary {
    pub saved: Vec<String>,
    pub skipped: Vec<String>,
    /// Tables already present in the store when the run started.
    pub resumed: usize,
}

/// Run the full pipeline for a single table.
async fn collect_one<S, G>(source: &S, generator: &G, table: &str) -> Result<TableStructure, TableError>
where
    S: TableInfoSource + Sync,
    G: Generate + Sync,
{
    let info = source
        .table_info(table)
        .await
        .map_err(TableError::Lookup)?;
    if info.fields.is_empty() {
        return Err(TableError::Lookup(anyhow!(
            "reference page for {} has no fields",
            table
        )));
    }

    let prompt = build_structure_prompt(&info);
    let raw = generator
        .generate(&prompt)
        .await
        .map_err(TableError::Generator)?;

    parse_structure(&raw).map_err(TableError::Malformed)
}

/// Process `names` in input order: look up reference data, ask the generator
/// for a structure, validate it, and persist the store after every success.
/// Per-table failures are logged and skipped; a persist failure aborts the
/// run, leaving previously written state on disk.
#[instrument(skip_all, fields(tables = names.len()))]
pub async fn process_tables<S, G>(
    source: &S,
    generator: &G,
    names: &[String],
    store: &mut StructureStore,
) -> Result<CollectSummary>
where
    S: TableInfoSource + Sync,
    G: Generate + Sync,
{
    let mut summary = CollectSummary::default();

    for name in names {
        if store.contains(name) {
            debug!(table = %name, "Already collected; skipping");
            summary.resumed += 1;
            continue;
        }

        info!(table = %name, "Processing table");
        match collect_one(source, generator, name).await {
            Ok(structure) => {
                store.insert(name.clone(), structure)?;
                info!(table = %name, "Structure saved");
                summary.saved.push(name.clone());
            }
            Err(err) => {
                warn!(table = %name, error = %err, "Skipping table");
                summary.skipped.push(name.clone());
            }
        }
    }

    Ok(summary)
}
