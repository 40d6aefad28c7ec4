// src/record.rs
use serde::{Deserialize, Serialize};

/// Author name as it appears in a Crossref work
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub given: String,
    #[serde(default)]
    pub family: String,
}

/// Outbound citation of a work; the cited DOI is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default)]
    pub key: String,
    #[serde(rename = "DOI", alias = "doi", default)]
    pub doi: String,
    #[serde(rename = "ISSN", alias = "issn", default)]
    pub issn: String,
}

/// Crossref metadata record
///
/// One bibliographic entry of a shard. Only the fields served by lookups are
/// decoded; everything else in the dump is skipped by the decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Member id, kept as a string as Crossref publishes it
    #[serde(default)]
    pub member: String,
    #[serde(rename = "ISSN", default)]
    pub issn: Vec<String>,
    #[serde(rename = "container-title", default)]
    pub container_title: Vec<String>,
    #[serde(default)]
    pub author: Vec<Author>,
    /// The identifier. Empty for malformed entries, which are never indexed.
    #[serde(rename = "DOI", default)]
    pub doi: String,
    #[serde(default)]
    pub subject: Vec<String>,
    #[serde(default)]
    pub reference: Vec<Reference>,
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "type", default)]
    pub work_type: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub language: String,
}

impl Record {
    /// Records without an identifier are data-quality noise, not errors
    pub fn has_identifier(&self) -> bool {
        !self.doi.is_empty()
    }
}

/// Shard payload: `{"items": [...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordList {
    #[serde(default)]
    pub items: Vec<Record>,
}
