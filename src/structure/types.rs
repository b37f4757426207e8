// src/structure/types.rs

use serde::{Deserialize, Serialize};

/// A single field of an SAP table, as scraped from a reference page or as
/// emitted by the generator. All attributes are kept as strings; no SAP type
/// validation happens here.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub data_element: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub length: String,
    pub decimals: String,
}

/// The canonical output shape for one table's metadata.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq)]
pub struct TableStructure {
    pub name: String,
    pub description: String,
    pub fields: Vec<FieldDescriptor>,
}

/// Reference data scraped for one table, fed into prompt construction.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq)]
pub struct TableInfo {
    pub table_name: String,
    pub description: String,
    pub fields: Vec<FieldDescriptor>,
}
