// src/fetch/mod.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::structure::{FieldDescriptor, TableInfo};

/// SAP table reference pages, one page per table.
static TABLE_BASE_URL: &str = "https://leanx.eu/en/sap/table/";

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1").expect("CSS selector for heading should be valid"));
static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("CSS selector for table should be valid"));
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("CSS selector for rows should be valid"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td, th").expect("CSS selector for cells should be valid"));

async fn get_text_core(client: &Client, url: &Url) -> Result<String> {
    debug!("Fetching text from {}", url);
    Ok(client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .text()
        .await
        .with_context(|| format!("Reading text from {}", url))?)
}

async fn get_text_with_retry(client: &Client, url: &Url) -> Result<String> {
    let mut attempts = 0;
    loop {
        match get_text_core(client, url).await {
            Ok(t) => return Ok(t),
            Err(e) if attempts < MAX_RETRIES => {
                attempts += 1;
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempts - 1);
                warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "Retrying");
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => {
                error!(%url, error = %e, "Exhausted retries");
                return Err(e);
            }
        }
    }
}

/// Source of scraped table reference data. The collector only sees this
/// trait, so tests can feed it canned pages.
#[async_trait]
pub trait TableInfoSource {
    async fn table_info(&self, table: &str) -> Result<TableInfo>;
}

/// Production source backed by the leanx.eu SAP reference site.
pub struct LeanxSource {
    client: Client,
}

impl LeanxSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TableInfoSource for LeanxSource {
    async fn table_info(&self, table: &str) -> Result<TableInfo> {
        let base = Url::parse(TABLE_BASE_URL)?;
        let url = base
            .join(&format!("{}.html", table.to_lowercase()))
            .with_context(|| format!("building reference URL for {}", table))?;
        let html = get_text_with_retry(&self.client, &url).await?;
        Ok(scrape_table_info(&html, table))
    }
}

/// Scrape one reference page: the `<h1>` heading is the table description,
/// the first `<table>` holds one field per row (header row skipped).
/// Column layout: name, data element, _, type, length, decimals; missing
/// trailing cells become empty strings, rows with fewer than four cells are
/// ignored.
pub fn scrape_table_info(html: &str, table: &str) -> TableInfo {
    let doc = Html::parse_document(html);

    let description = doc
        .select(&HEADING_SELECTOR)
        .next()
        .map(|h| collect_text(&h))
        .unwrap_or_default();

    let mut fields = Vec::new();
    if let Some(tbl) = doc.select(&TABLE_SELECTOR).next() {
        for row in tbl.select(&ROW_SELECTOR).skip(1) {
            let cells: Vec<String> = row.select(&CELL_SELECTOR).map(|c| collect_text(&c)).collect();
            if cells.len() < 4 {
                continue;
            }
            trace!(field = %cells[0], "Parsed field row");
            fields.push(FieldDescriptor {
                name: cells[0].clone(),
                data_element: cells[1].clone(),
                ty: cells[3].clone(),
                length: cells.get(4).cloned().unwrap_or_default(),
                decimals: cells.get(5).cloned().unwrap_or_default(),
            });
        }
    }

    debug!(table = %table, fields = fields.len(), "Scraped reference page");
    TableInfo {
        table_name: table.to_string(),
        description,
        fields,
    }
}

fn collect_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
