use serde::{Deserialize, Serialize};

/// Column metadata as introspected from a source database.
///
/// `is_pk`/`is_unq` are accepted as aliases because older backend builds
/// emitted the short names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    pub is_nullable: bool,
    #[serde(alias = "is_pk")]
    pub is_primary_key: bool,
    #[serde(alias = "is_unq")]
    pub is_unique: bool,
    pub is_fk: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_update_key: Option<bool>,
}

impl ColumnMeta {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, data_type: &str) -> Self {
        self.data_type = Some(data_type.to_string());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }
}

/// An introspected table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableEntry {
    pub name: String,
    #[serde(rename = "rows", skip_serializing_if = "Option::is_none")]
    pub row_count: Option<i64>,
    pub columns: Vec<ColumnMeta>,
}

impl TableEntry {
    pub fn new(name: &str, columns: Vec<ColumnMeta>) -> Self {
        Self {
            name: name.to_string(),
            row_count: None,
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// An introspected schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaEntry {
    pub name: String,
    pub tables: Vec<TableEntry>,
}

impl SchemaEntry {
    pub fn new(name: &str, tables: Vec<TableEntry>) -> Self {
        Self {
            name: name.to_string(),
            tables,
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableEntry> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// One source database as returned by the backend's introspection endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseEntry {
    pub name: String,
    pub schemas: Vec<SchemaEntry>,
}

impl DatabaseEntry {
    pub fn new(name: &str, schemas: Vec<SchemaEntry>) -> Self {
        Self {
            name: name.to_string(),
            schemas,
        }
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaEntry> {
        self.schemas.iter().find(|s| s.name == name)
    }
}
