use serde::{Deserialize, Serialize};

use super::types::{DatabaseEntry, SchemaEntry, TableEntry};

/// Read-only (to the builder core) catalog of introspected source databases.
///
/// Owned by the connection collaborator and refreshed whole or page by page;
/// the assembler only ever resolves against it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    databases: Vec<DatabaseEntry>,
}

impl Catalog {
    pub fn new(databases: Vec<DatabaseEntry>) -> Self {
        Self { databases }
    }

    pub fn databases(&self) -> &[DatabaseEntry] {
        &self.databases
    }

    /// Full replacement, used when a fresh introspection result arrives.
    pub fn replace(&mut self, databases: Vec<DatabaseEntry>) {
        self.databases = databases;
    }

    pub fn database(&self, db: &str) -> Option<&DatabaseEntry> {
        self.databases.iter().find(|d| d.name == db)
    }

    pub fn schema(&self, db: &str, schema: &str) -> Option<&SchemaEntry> {
        self.database(db)?.schema(schema)
    }

    pub fn table(&self, db: &str, schema: &str, table: &str) -> Option<&TableEntry> {
        self.schema(db, schema)?.table(table)
    }

    /// Merges a freshly loaded page of tables into one schema, keyed by table
    /// name; duplicates across pages are dropped. A target db/schema that no
    /// longer exists (late response for a deselected scope) is silently
    /// ignored.
    pub fn append_tables(&mut self, db: &str, schema: &str, tables: Vec<TableEntry>) {
        let Some(target) = self
            .databases
            .iter_mut()
            .find(|d| d.name == db)
            .and_then(|d| d.schemas.iter_mut().find(|s| s.name == schema))
        else {
            return;
        };
        for table in tables {
            if !target.tables.iter().any(|t| t.name == table.name) {
                target.tables.push(table);
            }
        }
    }
}
