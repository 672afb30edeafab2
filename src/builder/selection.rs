use serde::{Deserialize, Serialize};
use std::fmt;

/// Serialized `(db, schema, table, column)` lookup key.
///
/// All derived maps (transformations, pruning passes) key on this form so a
/// column's identity survives serialization unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnKey(String);

impl ColumnKey {
    pub fn new(db: &str, schema: &str, table: &str, column: &str) -> Self {
        Self(format!("{}.{}.{}.{}", db, schema, table, column))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A column included in the view under construction.
///
/// Identity (`db`/`schema`/`table`/`column`) is fixed at selection time;
/// `view_key`, `is_update_key` and `alias` are user overrides applied later
/// in the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedColumn {
    pub db: String,
    pub schema: String,
    pub table: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_key: Option<String>,
    #[serde(default)]
    pub is_update_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl SelectedColumn {
    pub fn key(&self) -> ColumnKey {
        ColumnKey::new(&self.db, &self.schema, &self.table, &self.column)
    }
}

/// Table and column selections within one `(db, schema)` scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSelection {
    #[serde(default)]
    pub selected_tables: Vec<String>,
    #[serde(default)]
    pub selected_columns: Vec<SelectedColumn>,
}

/// Flattened, display-friendly view of one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSelection {
    pub db: String,
    pub schema: String,
    pub selected_tables: Vec<String>,
    pub selected_columns: Vec<SelectedColumn>,
}

/// Payload for toggling a single column on or off.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnToggle {
    pub db: String,
    pub schema: String,
    pub table: String,
    pub column: String,
    pub is_primary_key: Option<bool>,
    pub is_update_key: Option<bool>,
}

impl ColumnToggle {
    pub fn new(db: &str, schema: &str, table: &str, column: &str) -> Self {
        Self {
            db: db.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
            column: column.to_string(),
            is_primary_key: None,
            is_update_key: None,
        }
    }

    pub fn primary_key(mut self, is_primary_key: bool) -> Self {
        self.is_primary_key = Some(is_primary_key);
        self
    }

    pub fn update_key(mut self, is_update_key: bool) -> Self {
        self.is_update_key = Some(is_update_key);
        self
    }
}

/// One entry of a bulk column replacement ("select all / none").
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPick {
    pub name: String,
    pub is_primary_key: Option<bool>,
    pub is_update_key: Option<bool>,
}

impl ColumnPick {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_primary_key: None,
            is_update_key: None,
        }
    }

    pub fn primary_key(mut self, is_primary_key: bool) -> Self {
        self.is_primary_key = Some(is_primary_key);
        self
    }

    pub fn update_key(mut self, is_update_key: bool) -> Self {
        self.is_update_key = Some(is_update_key);
        self
    }
}
