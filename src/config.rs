use anyhow::{bail, Context, Result};
use std::{env, path::PathBuf};

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key. Required; a run never starts without it.
    pub api_key: String,
    /// CSV file listing the tables to process.
    pub input_path: PathBuf,
    /// Directory receiving the JSON outputs and the run log.
    pub output_dir: PathBuf,
    /// Model identifier passed to the generator endpoint.
    pub model: String,
    /// When set, tables already present in the output file are skipped
    /// instead of regenerated; otherwise the run starts from scratch.
    pub resume: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GOOGLE_API_KEY")
            .context("GOOGLE_API_KEY must be set before processing any table")?;
        if api_key.trim().is_empty() {
            bail!("GOOGLE_API_KEY is set but empty");
        }

        let input_path = env::var("SAP_TABLES_CSV")
            .unwrap_or_else(|_| "sap_tables.csv".to_string())
            .into();
        let output_dir = env::var("OUTPUT_DIR")
            .unwrap_or_else(|_| "output".to_string())
            .into();
        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-pro".to_string());
        let resume = env::var("RESUME")
            .map(|v| {
                let v = v.to_lowercase();
                v == "1" || v == "true" || v == "yes"
            })
            .unwrap_or(false);

        Ok(Self {
            api_key,
            input_path,
            output_dir,
            model,
            resume,
        })
    }
}
