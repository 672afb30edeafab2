use std::fmt;

use crate::builder::BuilderState;

/// Read-only advisory findings over the current selection. The registries
/// stay permissive; these exist so the UI layer can flag risky state without
/// the mutation path ever rejecting anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// More than one table selected and no join rule connecting them.
    CartesianJoinRisk { selected_tables: usize },
    /// A join endpoint references a table that is not currently selected.
    UnresolvedJoinEndpoint {
        join_index: usize,
        db: String,
        schema: String,
        table: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::CartesianJoinRisk { selected_tables } => write!(
                f,
                "{} tables selected without any join rule (cartesian-join risk)",
                selected_tables
            ),
            Warning::UnresolvedJoinEndpoint {
                join_index,
                db,
                schema,
                table,
            } => write!(
                f,
                "join #{} references unselected table {}.{}.{}",
                join_index, db, schema, table
            ),
        }
    }
}

pub fn compute_warnings(state: &BuilderState) -> Vec<Warning> {
    let mut warnings = Vec::new();

    let selected_tables: usize = state
        .flatten_selections()
        .iter()
        .map(|scope| scope.selected_tables.len())
        .sum();
    if selected_tables > 1 && state.joins().is_empty() {
        warnings.push(Warning::CartesianJoinRisk { selected_tables });
    }

    for (join_index, join) in state.joins().iter().enumerate() {
        for side in join.sides() {
            if !state.is_table_selected(&side.db, &side.schema, &side.table) {
                warnings.push(Warning::UnresolvedJoinEndpoint {
                    join_index,
                    db: side.db.clone(),
                    schema: side.schema.clone(),
                    table: side.table.clone(),
                });
            }
        }
    }

    warnings
}
