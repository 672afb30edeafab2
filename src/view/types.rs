use serde::{Deserialize, Serialize};

use crate::builder::{JoinRule, Transform};

/// One column of the submitted view: catalog metadata merged with the user's
/// selection overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_fk: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub is_unq: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_key: Option<String>,
    pub is_update_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSpec {
    pub name: String,
    pub tables: Vec<TableSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub name: String,
    pub schemas: Vec<SchemaSpec>,
}

/// The composed view definition POSTed to the backend for materialization.
/// Built fresh on each submission; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub view_name: String,
    pub sources: Vec<SourceSpec>,
    pub joins: Vec<JoinRule>,
}
