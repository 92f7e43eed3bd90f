//! SharePoint REST response types
//!
//! Requests ask for `odata=nometadata`, so entities arrive as plain objects
//! with PascalCase properties and collections are wrapped in `value`.

use serde::Deserialize;

/// Site (web) metadata
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Web {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub server_relative_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A folder inside a document library
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Folder {
    pub name: String,
    pub server_relative_url: String,
    #[serde(default)]
    pub item_count: Option<u64>,
}

/// A file inside a folder
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct File {
    pub name: String,
    pub server_relative_url: String,
    #[serde(default)]
    pub time_last_modified: Option<String>,
}

/// OData collection envelope
#[derive(Debug, Deserialize)]
pub(crate) struct Collection<T> {
    pub value: Vec<T>,
}
