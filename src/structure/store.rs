use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::debug;

use super::TableStructure;

/// Accumulates table structures for one run and writes them through to a
/// single JSON file after every insert, so a crash loses at most the
/// in-flight table. One writer, no readers during the run.
pub struct StructureStore {
    /// Map: table_name → structure. BTreeMap keeps the persisted JSON
    /// deterministic, so re-persisting the same store is byte-identical.
    map: BTreeMap<String, TableStructure>,
    path: PathBuf,
}

impl StructureStore {
    /// Open a store backed by `path`. With `resume` set, any existing file at
    /// `path` is loaded and its tables count as already collected; otherwise
    /// the store starts empty and the first persist replaces the file.
    pub fn open(path: impl Into<PathBuf>, resume: bool) -> Result<Self> {
        let path = path.into();
        let map = if resume && path.exists() {
            let f = fs::File::open(&path)
                .with_context(|| format!("opening existing store {}", path.display()))?;
            let map: BTreeMap<String, TableStructure> = serde_json::from_reader(f)
                .with_context(|| format!("parsing existing store {}", path.display()))?;
            debug!(path = %path.display(), tables = map.len(), "loaded existing store");
            map
        } else {
            BTreeMap::new()
        };
        Ok(Self { map, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, table: &str) -> bool {
        self.map.contains_key(table)
    }

    pub fn get(&self, table: &str) -> Option<&TableStructure> {
        self.map.get(table)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Insert one structure and immediately persist the full mapping.
    pub fn insert(&mut self, table: String, structure: TableStructure) -> Result<()> {
        self.map.insert(table, structure);
        self.persist()
    }

    /// Write the complete current mapping to disk: pretty JSON with a
    /// trailing newline, to a temp file, then rename over the destination.
    pub fn persist(&self) -> Result<()> {
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("store path {} has no file name", self.path.display()))?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let tmp_path = dir.join(format!(".{}.tmp", file_name));

        let mut tmp = fs::File::create(&tmp_path)
            .with_context(|| format!("creating {}", tmp_path.display()))?;
        serde_json::to_writer_pretty(&mut tmp, &self.map).context("serializing store")?;
        tmp.write_all(b"\n")
            .with_context(|| format!("writing {}", tmp_path.display()))?;

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "renaming {} -> {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;
        Ok(())
    }
}
