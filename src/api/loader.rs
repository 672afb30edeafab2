use anyhow::Result;

use crate::builder::BuilderState;
use crate::catalog::{Catalog, DatabaseEntry};

use super::client::{ApiClient, ConnectionRef};

/// Source of catalog pages, abstracted so the load coordination can be
/// exercised without a live backend.
pub trait TableSource {
    fn fetch_page(&self, page: u32, page_size: u32) -> Result<Vec<DatabaseEntry>>;
}

/// The real source: pages come from the backend introspection endpoint.
pub struct ApiTableSource<'a> {
    client: &'a ApiClient,
    connections: Vec<ConnectionRef>,
}

impl<'a> ApiTableSource<'a> {
    pub fn new(client: &'a ApiClient, connections: Vec<ConnectionRef>) -> Self {
        Self {
            client,
            connections,
        }
    }
}

impl TableSource for ApiTableSource<'_> {
    fn fetch_page(&self, page: u32, page_size: u32) -> Result<Vec<DatabaseEntry>> {
        self.client.get_databases(&self.connections, page, page_size)
    }
}

/// Fetches the next table page for one `(db, schema)` scope and merges it
/// into the catalog.
///
/// Returns `Ok(false)` without fetching when a request for the scope is
/// already in flight. A short page (fewer than `page_size` tables for the
/// scope) marks the scope exhausted. On failure the scope's page and
/// `has_more` survive so the same page can be retried.
pub fn load_more_tables(
    state: &mut BuilderState,
    catalog: &mut Catalog,
    source: &dyn TableSource,
    db: &str,
    schema: &str,
    page_size: u32,
) -> Result<bool> {
    if !state.begin_loading_tables(db, schema) {
        log::debug!("table load for {}.{} already in flight", db, schema);
        return Ok(false);
    }
    let page = state
        .table_status(db, schema)
        .map(|status| status.page)
        .unwrap_or(1);

    match source.fetch_page(page, page_size) {
        Ok(databases) => {
            let tables = databases
                .iter()
                .find(|d| d.name == db)
                .and_then(|d| d.schema(schema))
                .map(|s| s.tables.clone())
                .unwrap_or_default();
            let has_more = tables.len() as u32 >= page_size;
            log::debug!(
                "page {} for {}.{}: {} tables, has_more={}",
                page,
                db,
                schema,
                tables.len(),
                has_more
            );
            catalog.append_tables(db, schema, tables);
            state.complete_tables_page(db, schema, has_more);
            Ok(true)
        }
        Err(err) => {
            state.fail_tables_load(db, schema, err.to_string());
            Err(err)
        }
    }
}
