use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::joins::JoinRule;
use super::selection::{
    ColumnKey, ColumnPick, ColumnToggle, SelectedColumn, SourceSelection, TableSelection,
};
use super::status::{LoadState, TableLoadState};
use super::transform::Transform;

pub const DEFAULT_VIEW_NAME: &str = "MyView";

/// Normalized state of the view being built: the single source of truth for
/// which databases, schemas, tables and columns are included, how tables
/// relate via joins, and how columns are transformed.
///
/// Every operation is total: unknown references are silently ignored and
/// missing scope containers are created lazily. Each structural mutation ends
/// with a pruning pass, so the transformation registry's key set is always a
/// subset of the selected column key set and no selection outlives its
/// parent database or schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderState {
    selected_databases: Vec<String>,
    selected_schemas_by_db: IndexMap<String, Vec<String>>,
    /// db -> schema -> selection scope, in the order scopes were first used.
    selections: IndexMap<String, IndexMap<String, TableSelection>>,
    schema_status_by_db: IndexMap<String, LoadState>,
    table_status: IndexMap<String, IndexMap<String, TableLoadState>>,
    joins: Vec<JoinRule>,
    view_name: String,
    transformations: BTreeMap<ColumnKey, Transform>,
}

impl Default for BuilderState {
    fn default() -> Self {
        Self {
            selected_databases: Vec::new(),
            selected_schemas_by_db: IndexMap::new(),
            selections: IndexMap::new(),
            schema_status_by_db: IndexMap::new(),
            table_status: IndexMap::new(),
            joins: Vec::new(),
            view_name: DEFAULT_VIEW_NAME.to_string(),
            transformations: BTreeMap::new(),
        }
    }
}

impl BuilderState {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Derived reads
    // ------------------------------------------------------------------

    pub fn selected_databases(&self) -> &[String] {
        &self.selected_databases
    }

    pub fn selected_schemas(&self, db: &str) -> Option<&[String]> {
        self.selected_schemas_by_db.get(db).map(Vec::as_slice)
    }

    pub fn selected_schemas_by_db(&self) -> &IndexMap<String, Vec<String>> {
        &self.selected_schemas_by_db
    }

    pub fn selection(&self, db: &str, schema: &str) -> Option<&TableSelection> {
        self.selections.get(db)?.get(schema)
    }

    pub fn is_table_selected(&self, db: &str, schema: &str, table: &str) -> bool {
        self.selection(db, schema)
            .map(|scope| scope.selected_tables.iter().any(|t| t == table))
            .unwrap_or(false)
    }

    pub fn joins(&self) -> &[JoinRule] {
        &self.joins
    }

    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    pub fn transformation(&self, key: &ColumnKey) -> Option<&Transform> {
        self.transformations.get(key)
    }

    pub fn transformations(&self) -> &BTreeMap<ColumnKey, Transform> {
        &self.transformations
    }

    /// Flattened list of `{db, schema, selectedTables, selectedColumns}` in
    /// scope insertion order, for rendering and assembly.
    pub fn flatten_selections(&self) -> Vec<SourceSelection> {
        self.selections
            .iter()
            .flat_map(|(db, by_schema)| {
                by_schema.iter().map(|(schema, selection)| SourceSelection {
                    db: db.clone(),
                    schema: schema.clone(),
                    selected_tables: selection.selected_tables.clone(),
                    selected_columns: selection.selected_columns.clone(),
                })
            })
            .collect()
    }

    /// Keys of every currently selected column across all scopes.
    pub fn selected_column_keys(&self) -> BTreeSet<ColumnKey> {
        self.selections
            .values()
            .flat_map(|by_schema| by_schema.values())
            .flat_map(|selection| selection.selected_columns.iter().map(SelectedColumn::key))
            .collect()
    }

    // ------------------------------------------------------------------
    // Selection mutations
    // ------------------------------------------------------------------

    /// Replaces the active database set, cascading removal of schema
    /// selections, scopes, load statuses, joins and transforms for any
    /// database no longer present.
    pub fn set_selected_databases(&mut self, dbs: Vec<String>) {
        let keep: BTreeSet<String> = dbs.iter().cloned().collect();
        self.selected_databases = dbs;

        self.selected_schemas_by_db.retain(|db, _| keep.contains(db));
        self.selections.retain(|db, _| keep.contains(db));
        self.schema_status_by_db.retain(|db, _| keep.contains(db));
        self.table_status.retain(|db, _| keep.contains(db));
        self.joins
            .retain(|join| keep.contains(&join.left.db) && keep.contains(&join.right.db));
        self.prune_transformations();
    }

    /// Replaces the active schemas for one database with the analogous
    /// cascade for schemas dropped from the set.
    pub fn set_schemas_for_db(&mut self, db: &str, schemas: Vec<String>) {
        let allowed: BTreeSet<String> = schemas.iter().cloned().collect();
        self.selected_schemas_by_db.insert(db.to_string(), schemas);

        if let Some(by_schema) = self.selections.get_mut(db) {
            by_schema.retain(|schema, _| allowed.contains(schema));
        }
        if let Some(by_schema) = self.table_status.get_mut(db) {
            by_schema.retain(|schema, _| allowed.contains(schema));
        }
        self.joins.retain(|join| {
            !(join.left.db == db && !allowed.contains(&join.left.schema))
                && !(join.right.db == db && !allowed.contains(&join.right.schema))
        });
        self.prune_transformations();
    }

    /// Adds the table to its scope (created lazily) or removes it together
    /// with all of its selected columns and their transforms.
    pub fn toggle_table(&mut self, db: &str, schema: &str, table: &str) {
        let scope = self.scope_mut(db, schema);
        if let Some(idx) = scope.selected_tables.iter().position(|t| t == table) {
            scope.selected_tables.remove(idx);
            scope.selected_columns.retain(|c| c.table != table);
        } else {
            scope.selected_tables.push(table.to_string());
        }
        self.prune_transformations();
    }

    /// Adds or removes a single column. Adding defaults `is_update_key` to
    /// `is_update_key ?? is_primary_key ?? false`; removing deletes the
    /// column's transform. Toggling a column of an unselected table is a
    /// no-op.
    pub fn toggle_column(&mut self, toggle: ColumnToggle) {
        let key = ColumnKey::new(&toggle.db, &toggle.schema, &toggle.table, &toggle.column);
        let removed = {
            let scope = self.scope_mut(&toggle.db, &toggle.schema);
            let existing = scope
                .selected_columns
                .iter()
                .position(|c| c.table == toggle.table && c.column == toggle.column);
            match existing {
                Some(idx) => {
                    scope.selected_columns.remove(idx);
                    true
                }
                None => {
                    if !scope.selected_tables.iter().any(|t| t == &toggle.table) {
                        return;
                    }
                    let is_update_key = toggle
                        .is_update_key
                        .or(toggle.is_primary_key)
                        .unwrap_or(false);
                    scope.selected_columns.push(SelectedColumn {
                        db: toggle.db,
                        schema: toggle.schema,
                        table: toggle.table,
                        column: toggle.column,
                        view_key: None,
                        is_update_key,
                        alias: None,
                    });
                    false
                }
            }
        };
        if removed {
            self.transformations.remove(&key);
        }
    }

    /// Bulk replace of one table's selected columns. `view_key`,
    /// `is_update_key` and `alias` are preserved for columns that survive
    /// the replacement (merged by column name). No-op for unselected tables.
    pub fn set_table_columns(
        &mut self,
        db: &str,
        schema: &str,
        table: &str,
        columns: Vec<ColumnPick>,
    ) {
        {
            let scope = self.scope_mut(db, schema);
            if !scope.selected_tables.iter().any(|t| t == table) {
                return;
            }
            let existing: HashMap<String, SelectedColumn> = scope
                .selected_columns
                .iter()
                .filter(|c| c.table == table)
                .map(|c| (c.column.clone(), c.clone()))
                .collect();
            scope.selected_columns.retain(|c| c.table != table);

            for pick in columns {
                let prior = existing.get(&pick.name);
                let is_update_key = prior
                    .map(|c| c.is_update_key)
                    .or(pick.is_update_key)
                    .or(pick.is_primary_key)
                    .unwrap_or(false);
                scope.selected_columns.push(SelectedColumn {
                    db: db.to_string(),
                    schema: schema.to_string(),
                    table: table.to_string(),
                    column: pick.name,
                    view_key: prior.and_then(|c| c.view_key.clone()),
                    is_update_key,
                    alias: prior.and_then(|c| c.alias.clone()),
                });
            }
        }
        self.prune_transformations();
    }

    /// Points the column at another selected column for merge semantics.
    /// An empty value clears the key. No-op for unselected columns.
    pub fn set_view_key(&mut self, db: &str, schema: &str, table: &str, column: &str, view_key: &str) {
        if let Some(col) = self.selected_column_mut(db, schema, table, column) {
            col.view_key = if view_key.is_empty() {
                None
            } else {
                Some(view_key.to_string())
            };
        }
    }

    pub fn set_update_key(
        &mut self,
        db: &str,
        schema: &str,
        table: &str,
        column: &str,
        is_update_key: bool,
    ) {
        if let Some(col) = self.selected_column_mut(db, schema, table, column) {
            col.is_update_key = is_update_key;
        }
    }

    /// Output name override; an empty value clears the alias.
    pub fn set_column_alias(&mut self, db: &str, schema: &str, table: &str, column: &str, alias: &str) {
        if let Some(col) = self.selected_column_mut(db, schema, table, column) {
            col.alias = if alias.is_empty() {
                None
            } else {
                Some(alias.to_string())
            };
        }
    }

    // ------------------------------------------------------------------
    // Join registry
    // ------------------------------------------------------------------

    pub fn add_join(&mut self, rule: JoinRule) {
        self.joins.push(rule);
    }

    /// Removes the rule at `index`; out-of-range indices are ignored.
    pub fn remove_join(&mut self, index: usize) {
        if index < self.joins.len() {
            self.joins.remove(index);
        }
    }

    // ------------------------------------------------------------------
    // Transformation registry
    // ------------------------------------------------------------------

    /// Upserts (`Some`) or deletes (`None`) the transform for one column.
    /// A transform written for a column that is not currently selected is
    /// discarded by the pruning pass.
    pub fn set_transformation(
        &mut self,
        db: &str,
        schema: &str,
        table: &str,
        column: &str,
        transform: Option<Transform>,
    ) {
        let key = ColumnKey::new(db, schema, table, column);
        match transform {
            Some(transform) => {
                self.transformations.insert(key, transform);
            }
            None => {
                self.transformations.remove(&key);
            }
        }
        self.prune_transformations();
    }

    // ------------------------------------------------------------------
    // Misc
    // ------------------------------------------------------------------

    pub fn set_view_name(&mut self, name: impl Into<String>) {
        self.view_name = name.into();
    }

    /// Discards the whole session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // ------------------------------------------------------------------
    // Load status
    // ------------------------------------------------------------------

    pub fn schema_status(&self, db: &str) -> Option<&LoadState> {
        self.schema_status_by_db.get(db)
    }

    pub fn begin_loading_schemas(&mut self, db: &str) -> bool {
        self.schema_status_by_db
            .entry(db.to_string())
            .or_default()
            .begin()
    }

    pub fn complete_schemas_load(&mut self, db: &str) {
        if let Some(status) = self.schema_status_by_db.get_mut(db) {
            status.complete();
        }
    }

    pub fn fail_schemas_load(&mut self, db: &str, error: impl Into<String>) {
        if let Some(status) = self.schema_status_by_db.get_mut(db) {
            status.fail(error);
        }
    }

    pub fn table_status(&self, db: &str, schema: &str) -> Option<&TableLoadState> {
        self.table_status.get(db)?.get(schema)
    }

    pub fn begin_loading_tables(&mut self, db: &str, schema: &str) -> bool {
        self.table_status
            .entry(db.to_string())
            .or_default()
            .entry(schema.to_string())
            .or_default()
            .begin()
    }

    pub fn complete_tables_page(&mut self, db: &str, schema: &str, has_more: bool) {
        if let Some(status) = self.table_status_mut(db, schema) {
            status.complete_page(has_more);
        }
    }

    pub fn fail_tables_load(&mut self, db: &str, schema: &str, error: impl Into<String>) {
        if let Some(status) = self.table_status_mut(db, schema) {
            status.fail(error);
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn scope_mut(&mut self, db: &str, schema: &str) -> &mut TableSelection {
        self.selections
            .entry(db.to_string())
            .or_default()
            .entry(schema.to_string())
            .or_default()
    }

    fn selected_column_mut(
        &mut self,
        db: &str,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Option<&mut SelectedColumn> {
        self.selections
            .get_mut(db)?
            .get_mut(schema)?
            .selected_columns
            .iter_mut()
            .find(|c| c.table == table && c.column == column)
    }

    fn table_status_mut(&mut self, db: &str, schema: &str) -> Option<&mut TableLoadState> {
        self.table_status.get_mut(db)?.get_mut(schema)
    }

    /// Drops every transform whose column is no longer selected. Runs at the
    /// end of every structural mutation.
    fn prune_transformations(&mut self) {
        let valid = self.selected_column_keys();
        self.transformations.retain(|key, _| valid.contains(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::joins::JoinSide;

    fn select_orders(state: &mut BuilderState) {
        state.set_selected_databases(vec!["sales".into()]);
        state.set_schemas_for_db("sales", vec!["public".into()]);
        state.toggle_table("sales", "public", "orders");
        state.toggle_column(
            ColumnToggle::new("sales", "public", "orders", "id").primary_key(true),
        );
        state.toggle_column(ColumnToggle::new("sales", "public", "orders", "total"));
    }

    #[test]
    fn test_default_view_name() {
        assert_eq!(BuilderState::new().view_name(), "MyView");
    }

    #[test]
    fn test_toggle_table_lazy_scope_init() {
        let mut state = BuilderState::new();
        state.toggle_table("sales", "public", "orders");
        assert!(state.is_table_selected("sales", "public", "orders"));
    }

    #[test]
    fn test_default_update_key_from_primary_key() {
        let mut state = BuilderState::new();
        select_orders(&mut state);
        let scope = state.selection("sales", "public").unwrap();
        let id = scope.selected_columns.iter().find(|c| c.column == "id").unwrap();
        let total = scope
            .selected_columns
            .iter()
            .find(|c| c.column == "total")
            .unwrap();
        assert!(id.is_update_key);
        assert!(!total.is_update_key);
    }

    #[test]
    fn test_toggle_column_on_unselected_table_is_noop() {
        let mut state = BuilderState::new();
        state.toggle_column(ColumnToggle::new("sales", "public", "ghosts", "id"));
        assert!(state.selected_column_keys().is_empty());
    }

    #[test]
    fn test_toggle_table_off_cascades_columns_and_transforms() {
        let mut state = BuilderState::new();
        select_orders(&mut state);
        state.set_transformation(
            "sales",
            "public",
            "orders",
            "total",
            Some(Transform::field_transform("total", "", "{}")),
        );
        assert_eq!(state.transformations().len(), 1);

        state.toggle_table("sales", "public", "orders");
        let scope = state.selection("sales", "public").unwrap();
        assert!(scope.selected_tables.is_empty());
        assert!(scope.selected_columns.is_empty());
        assert!(state.transformations().is_empty());
    }

    #[test]
    fn test_toggle_column_off_removes_transform() {
        let mut state = BuilderState::new();
        select_orders(&mut state);
        state.set_transformation(
            "sales",
            "public",
            "orders",
            "total",
            Some(Transform::field_transform("total", "", "{}")),
        );
        state.toggle_column(ColumnToggle::new("sales", "public", "orders", "total"));
        assert!(state.transformations().is_empty());
    }

    #[test]
    fn test_database_removal_prunes_everything() {
        let mut state = BuilderState::new();
        select_orders(&mut state);
        state.toggle_table("sales", "public", "items");
        state.add_join(JoinRule::inner(
            JoinSide::new("sales", "public", "orders", "id"),
            JoinSide::new("sales", "public", "items", "order_id"),
        ));
        state.set_transformation(
            "sales",
            "public",
            "orders",
            "total",
            Some(Transform::field_transform("total", "", "{}")),
        );

        state.set_selected_databases(vec!["hr".into()]);
        assert!(state.selection("sales", "public").is_none());
        assert!(state.selected_schemas("sales").is_none());
        assert!(state.joins().is_empty());
        assert!(state.transformations().is_empty());
    }

    #[test]
    fn test_schema_removal_prunes_scope_and_joins() {
        let mut state = BuilderState::new();
        select_orders(&mut state);
        state.add_join(JoinRule::inner(
            JoinSide::new("sales", "public", "orders", "id"),
            JoinSide::new("sales", "public", "items", "order_id"),
        ));

        state.set_schemas_for_db("sales", vec!["audit".into()]);
        assert!(state.selection("sales", "public").is_none());
        assert!(state.joins().is_empty());
        assert!(state.transformations().is_empty());
    }

    #[test]
    fn test_set_table_columns_preserves_overrides() {
        let mut state = BuilderState::new();
        select_orders(&mut state);
        state.set_column_alias("sales", "public", "orders", "total", "order_total");
        state.set_view_key("sales", "public", "orders", "id", "customer_id");

        state.set_table_columns(
            "sales",
            "public",
            "orders",
            vec![
                ColumnPick::new("id").primary_key(true),
                ColumnPick::new("total"),
                ColumnPick::new("created_at"),
            ],
        );

        let scope = state.selection("sales", "public").unwrap();
        assert_eq!(scope.selected_columns.len(), 3);
        let id = scope.selected_columns.iter().find(|c| c.column == "id").unwrap();
        let total = scope
            .selected_columns
            .iter()
            .find(|c| c.column == "total")
            .unwrap();
        assert_eq!(id.view_key.as_deref(), Some("customer_id"));
        assert!(id.is_update_key);
        assert_eq!(total.alias.as_deref(), Some("order_total"));
    }

    #[test]
    fn test_set_table_columns_drops_deselected_and_their_transforms() {
        let mut state = BuilderState::new();
        select_orders(&mut state);
        state.set_transformation(
            "sales",
            "public",
            "orders",
            "total",
            Some(Transform::field_transform("total", "", "{}")),
        );
        state.set_table_columns(
            "sales",
            "public",
            "orders",
            vec![ColumnPick::new("id").primary_key(true)],
        );
        assert!(state.transformations().is_empty());
        assert_eq!(
            state
                .selection("sales", "public")
                .unwrap()
                .selected_columns
                .len(),
            1
        );
    }

    #[test]
    fn test_point_mutations_ignore_unknown_columns() {
        let mut state = BuilderState::new();
        select_orders(&mut state);
        state.set_column_alias("sales", "public", "orders", "missing", "x");
        state.set_update_key("sales", "public", "orders", "missing", true);
        let scope = state.selection("sales", "public").unwrap();
        assert!(scope.selected_columns.iter().all(|c| c.column != "missing"));
    }

    #[test]
    fn test_transform_for_unselected_column_is_discarded() {
        let mut state = BuilderState::new();
        select_orders(&mut state);
        state.set_transformation(
            "sales",
            "public",
            "orders",
            "not_selected",
            Some(Transform::field_transform("x", "", "{}")),
        );
        assert!(state.transformations().is_empty());
    }

    #[test]
    fn test_remove_join_out_of_range_is_noop() {
        let mut state = BuilderState::new();
        state.add_join(JoinRule::inner(
            JoinSide::new("sales", "public", "orders", "id"),
            JoinSide::new("sales", "public", "items", "order_id"),
        ));
        state.remove_join(5);
        assert_eq!(state.joins().len(), 1);
        state.remove_join(0);
        assert!(state.joins().is_empty());
    }

    #[test]
    fn test_prune_invariant_after_every_mutation() {
        let mut state = BuilderState::new();
        select_orders(&mut state);
        state.set_transformation(
            "sales",
            "public",
            "orders",
            "total",
            Some(Transform::field_transform("total", "", "{}")),
        );

        state.set_schemas_for_db("sales", vec!["public".into(), "audit".into()]);
        let keys = state.selected_column_keys();
        assert!(state.transformations().keys().all(|k| keys.contains(k)));

        state.toggle_table("sales", "public", "orders");
        let keys = state.selected_column_keys();
        assert!(state.transformations().keys().all(|k| keys.contains(k)));
    }

    #[test]
    fn test_schema_load_status_transitions() {
        let mut state = BuilderState::new();
        assert!(state.begin_loading_schemas("sales"));
        assert!(!state.begin_loading_schemas("sales"));
        state.fail_schemas_load("sales", "timeout");
        let status = state.schema_status("sales").unwrap();
        assert!(!status.loading);
        assert_eq!(status.error.as_deref(), Some("timeout"));

        assert!(state.begin_loading_schemas("sales"));
        state.complete_schemas_load("sales");
        let status = state.schema_status("sales").unwrap();
        assert!(status.loaded);
        assert!(status.error.is_none());
    }

    #[test]
    fn test_reset_returns_initial_state() {
        let mut state = BuilderState::new();
        select_orders(&mut state);
        state.set_view_name("Sales");
        state.reset();
        assert_eq!(state, BuilderState::default());
    }

    #[test]
    fn test_state_serde_round_trip() {
        let mut state = BuilderState::new();
        select_orders(&mut state);
        state.set_view_name("SalesMart");
        let text = serde_json::to_string(&state).unwrap();
        let back: BuilderState = serde_json::from_str(&text).unwrap();
        assert_eq!(state, back);
    }
}
