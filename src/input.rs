use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::debug;

/// Read SAP table names from `path`, one identifier per line.
///
/// Export files come with a `table_name` header and quoted, comma-terminated
/// lines; quotes, commas and whitespace are stripped, blanks and the header
/// row are dropped. Zero names after cleanup is an error.
pub fn read_table_names(path: &Path) -> Result<Vec<String>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut names = Vec::new();
    for record in rdr.records() {
        let record = record.with_context(|| format!("reading record from {}", path.display()))?;
        let Some(raw) = record.get(0) else {
            continue;
        };
        let name = raw.trim_matches(|c: char| c == '"' || c == ',' || c.is_whitespace());
        if name.is_empty() || name.eq_ignore_ascii_case("table_name") {
            continue;
        }
        names.push(name.to_string());
    }

    if names.is_empty() {
        bail!("no table names found in {}", path.display());
    }
    debug!(count = names.len(), "Loaded table names");
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_and_cleans_table_names() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("sap_tables.csv");
        fs::write(&path, "table_name\n\"TCURR\",\n\"T001\",\n\nMARA\n").unwrap();

        let names = read_table_names(&path).unwrap();
        assert_eq!(names, vec!["TCURR", "T001", "MARA"]);
    }

    #[test]
    fn preserves_input_order() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("sap_tables.csv");
        fs::write(&path, "MARA\nBKPF\nTCURR\n").unwrap();

        let names = read_table_names(&path).unwrap();
        assert_eq!(names, vec!["MARA", "BKPF", "TCURR"]);
    }

    #[test]
    fn empty_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("sap_tables.csv");
        fs::write(&path, "table_name\n\n").unwrap();

        assert!(read_table_names(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempdir().unwrap();
        assert!(read_table_names(&tmp.path().join("nope.csv")).is_err());
    }
}
