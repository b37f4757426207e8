use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::structure::TableStructure;

static FENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").unwrap());

/// Parse generator output into a validated [`TableStructure`].
///
/// Models wrap JSON in markdown fences or prose despite instructions, so the
/// text is narrowed to the outermost `{...}` before deserializing. A
/// structure with no fields, or a field with an empty name, is rejected.
pub fn parse_structure(text: &str) -> Result<TableStructure> {
    let text = text.trim();
    if text.is_empty() {
        bail!("generator returned empty output");
    }

    // strip markdown fences if present
    let text = FENCE_REGEX
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    let start = text
        .find('{')
        .context("no json object in generator output")?;
    let end = text
        .rfind('}')
        .context("no json object in generator output")?;
    if end < start {
        bail!("unbalanced json object in generator output");
    }

    let structure: TableStructure =
        serde_json::from_str(&text[start..=end]).context("deserializing table structure")?;
    validate(&structure)?;
    Ok(structure)
}

fn validate(structure: &TableStructure) -> Result<()> {
    if structure.fields.is_empty() {
        bail!("structure has no fields");
    }
    for field in &structure.fields {
        if field.name.trim().is_empty() {
            bail!("structure contains a field with an empty name");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "name": "TCURR",
        "description": "Exchange Rates",
        "fields": [
            {"name": "MANDT", "data_element": "MANDT", "type": "CLNT", "length": "3", "decimals": "0"}
        ]
    }"#;

    #[test]
    fn parse_plain_json() {
        let structure = parse_structure(VALID).unwrap();
        assert_eq!(structure.name, "TCURR");
        assert_eq!(structure.fields.len(), 1);
        assert_eq!(structure.fields[0].ty, "CLNT");
    }

    #[test]
    fn parse_fenced_json() {
        let input = format!("```json\n{}\n```", VALID);
        let structure = parse_structure(&input).unwrap();
        assert_eq!(structure.name, "TCURR");
    }

    #[test]
    fn parse_json_wrapped_in_prose() {
        let input = format!("Here is the structure you asked for:\n{}\nHope that helps!", VALID);
        let structure = parse_structure(&input).unwrap();
        assert_eq!(structure.name, "TCURR");
    }

    #[test]
    fn empty_output_fails() {
        assert!(parse_structure("").is_err());
        assert!(parse_structure("   \n ").is_err());
    }

    #[test]
    fn output_without_json_fails() {
        assert!(parse_structure("I cannot answer that.").is_err());
    }

    #[test]
    fn missing_required_attribute_fails() {
        let input = r#"{
            "name": "TCURR",
            "description": "Exchange Rates",
            "fields": [{"name": "MANDT", "data_element": "MANDT", "type": "CLNT"}]
        }"#;
        assert!(parse_structure(input).is_err());
    }

    #[test]
    fn structure_without_fields_fails() {
        let input = r#"{"name": "TCURR", "description": "Exchange Rates", "fields": []}"#;
        assert!(parse_structure(input).is_err());
    }

    #[test]
    fn field_with_empty_name_fails() {
        let input = r#"{
            "name": "TCURR",
            "description": "Exchange Rates",
            "fields": [{"name": " ", "data_element": "MANDT", "type": "CLNT", "length": "3", "decimals": "0"}]
        }"#;
        assert!(parse_structure(input).is_err());
    }
}
