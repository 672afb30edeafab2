use indexmap::IndexMap;

use crate::builder::{BuilderState, SelectedColumn};
use crate::catalog::{Catalog, ColumnMeta};

use super::types::{ColumnSpec, SchemaSpec, SourceSpec, TableSpec, ViewDefinition};

/// Flattens the builder state and the catalog into the submission payload.
///
/// Pure and idempotent: no mutation, and two calls without an intervening
/// state change produce identical output. Scopes or tables the catalog can no
/// longer resolve (stale selections) are skipped, never errors.
pub fn assemble_view(state: &BuilderState, catalog: &Catalog) -> ViewDefinition {
    // Scopes sharing a database fold into one source; first-seen order is kept
    // on both levels.
    let mut schemas_by_db: IndexMap<String, Vec<SchemaSpec>> = IndexMap::new();

    for scope in state.flatten_selections() {
        let Some(schema_meta) = catalog.schema(&scope.db, &scope.schema) else {
            continue;
        };

        let mut tables = Vec::new();
        for table_name in &scope.selected_tables {
            let Some(table_meta) = schema_meta.table(table_name) else {
                continue;
            };
            let columns = table_meta
                .columns
                .iter()
                .filter_map(|col| {
                    let selected = scope
                        .selected_columns
                        .iter()
                        .find(|c| c.table == *table_name && c.column == col.name)?;
                    Some(column_spec(state, col, selected))
                })
                .collect();
            tables.push(TableSpec {
                name: table_name.clone(),
                columns,
            });
        }

        schemas_by_db
            .entry(scope.db.clone())
            .or_default()
            .push(SchemaSpec {
                name: scope.schema.clone(),
                tables,
            });
    }

    ViewDefinition {
        view_name: state.view_name().to_string(),
        sources: schemas_by_db
            .into_iter()
            .map(|(name, schemas)| SourceSpec { name, schemas })
            .collect(),
        joins: state.joins().to_vec(),
    }
}

fn column_spec(state: &BuilderState, meta: &ColumnMeta, selected: &SelectedColumn) -> ColumnSpec {
    ColumnSpec {
        name: meta.name.clone(),
        data_type: meta.data_type.clone(),
        is_nullable: meta.is_nullable,
        is_primary_key: meta.is_primary_key,
        is_fk: meta.is_fk,
        default: meta.default.clone(),
        is_unq: meta.is_unique,
        view_key: selected.view_key.clone().or_else(|| meta.view_key.clone()),
        is_update_key: selected.is_update_key,
        alias: selected.alias.clone(),
        transform: state.transformation(&selected.key()).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ColumnToggle, JoinRule, JoinSide, Transform};
    use crate::catalog::{ColumnMeta, DatabaseEntry, SchemaEntry, TableEntry};

    fn sales_catalog() -> Catalog {
        Catalog::new(vec![DatabaseEntry::new(
            "sales",
            vec![SchemaEntry::new(
                "public",
                vec![
                    TableEntry::new(
                        "orders",
                        vec![
                            ColumnMeta::new("id").with_type("bigint").primary_key(),
                            ColumnMeta::new("total").with_type("numeric").nullable(),
                        ],
                    ),
                    TableEntry::new(
                        "items",
                        vec![
                            ColumnMeta::new("order_id").with_type("bigint"),
                            ColumnMeta::new("sku").with_type("text"),
                        ],
                    ),
                ],
            )],
        )])
    }

    fn orders_state() -> BuilderState {
        let mut state = BuilderState::new();
        state.set_selected_databases(vec!["sales".into()]);
        state.set_schemas_for_db("sales", vec!["public".into()]);
        state.toggle_table("sales", "public", "orders");
        state.toggle_column(
            ColumnToggle::new("sales", "public", "orders", "id").primary_key(true),
        );
        state.toggle_column(ColumnToggle::new("sales", "public", "orders", "total"));
        state
    }

    #[test]
    fn test_assemble_single_scope() {
        let state = orders_state();
        let view = assemble_view(&state, &sales_catalog());

        assert_eq!(view.view_name, "MyView");
        assert_eq!(view.sources.len(), 1);
        assert_eq!(view.sources[0].name, "sales");
        assert_eq!(view.sources[0].schemas.len(), 1);
        let table = &view.sources[0].schemas[0].tables[0];
        assert_eq!(table.name, "orders");
        assert_eq!(table.columns.len(), 2);

        let id = table.columns.iter().find(|c| c.name == "id").unwrap();
        let total = table.columns.iter().find(|c| c.name == "total").unwrap();
        assert!(id.is_update_key);
        assert!(id.is_primary_key);
        assert!(!total.is_update_key);
        assert!(total.is_nullable);
        assert_eq!(total.data_type.as_deref(), Some("numeric"));
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let mut state = orders_state();
        state.set_transformation(
            "sales",
            "public",
            "orders",
            "total",
            Some(Transform::field_transform("total_label", "", r#"{"1":"A"}"#)),
        );
        let catalog = sales_catalog();
        let first = serde_json::to_string(&assemble_view(&state, &catalog)).unwrap();
        let second = serde_json::to_string(&assemble_view(&state, &catalog)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stale_scope_is_skipped() {
        let mut state = orders_state();
        state.toggle_table("sales", "archive", "old_orders");
        let view = assemble_view(&state, &sales_catalog());
        assert_eq!(view.sources.len(), 1);
        assert_eq!(view.sources[0].schemas.len(), 1);
        assert_eq!(view.sources[0].schemas[0].name, "public");
    }

    #[test]
    fn test_stale_table_is_skipped() {
        let mut state = orders_state();
        state.toggle_table("sales", "public", "dropped_table");
        let view = assemble_view(&state, &sales_catalog());
        let tables = &view.sources[0].schemas[0].tables;
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "orders");
    }

    #[test]
    fn test_malformed_transform_mapping_serializes_empty() {
        let mut state = orders_state();
        state.set_transformation(
            "sales",
            "public",
            "orders",
            "total",
            Some(Transform::field_transform("total_label", "", r#"{"1":"A"#)),
        );
        let view = assemble_view(&state, &sales_catalog());
        let json = serde_json::to_value(&view).unwrap();
        let total = &json["sources"][0]["schemas"][0]["tables"][0]["columns"][1];
        assert_eq!(total["name"], "total");
        assert_eq!(total["transform"]["mapping"], serde_json::json!({}));
    }

    #[test]
    fn test_alias_and_view_key_overrides() {
        let mut state = orders_state();
        state.set_column_alias("sales", "public", "orders", "total", "order_total");
        state.set_view_key("sales", "public", "orders", "total", "id");
        let view = assemble_view(&state, &sales_catalog());
        let total = view.sources[0].schemas[0].tables[0]
            .columns
            .iter()
            .find(|c| c.name == "total")
            .unwrap();
        assert_eq!(total.alias.as_deref(), Some("order_total"));
        assert_eq!(total.view_key.as_deref(), Some("id"));
    }

    #[test]
    fn test_joins_carried_in_insertion_order() {
        let mut state = orders_state();
        state.toggle_table("sales", "public", "items");
        state.toggle_column(ColumnToggle::new("sales", "public", "items", "order_id"));
        state.add_join(JoinRule::inner(
            JoinSide::new("sales", "public", "orders", "id"),
            JoinSide::new("sales", "public", "items", "order_id"),
        ));
        let view = assemble_view(&state, &sales_catalog());
        assert_eq!(view.joins.len(), 1);
        assert_eq!(view.joins[0].left.table, "orders");
    }
}
