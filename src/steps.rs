use std::fmt;

use crate::builder::BuilderState;

/// The wizard's five screens, in order. Navigation is linear; whether a step
/// may be left forward is advisory only and never blocks editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Connect,
    SelectTablesColumns,
    ConfigureJoins,
    ConfigureTransforms,
    Review,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Connect,
        Step::SelectTablesColumns,
        Step::ConfigureJoins,
        Step::ConfigureTransforms,
        Step::Review,
    ];

    pub fn next(self) -> Option<Step> {
        let idx = Step::ALL.iter().position(|s| *s == self)?;
        Step::ALL.get(idx + 1).copied()
    }

    pub fn back(self) -> Option<Step> {
        let idx = Step::ALL.iter().position(|s| *s == self)?;
        idx.checked_sub(1).map(|i| Step::ALL[i])
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Connect => "Source & Schema",
            Step::SelectTablesColumns => "Tables & Columns",
            Step::ConfigureJoins => "Joins",
            Step::ConfigureTransforms => "Transforms",
            Step::Review => "Review",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Whether enough state exists to move past `step`. Review is terminal.
pub fn can_advance(step: Step, state: &BuilderState) -> bool {
    match step {
        Step::Connect => {
            !state.selected_databases().is_empty()
                && state
                    .selected_schemas_by_db()
                    .values()
                    .any(|schemas| !schemas.is_empty())
        }
        Step::SelectTablesColumns => !state.selected_column_keys().is_empty(),
        Step::ConfigureJoins => {
            let tables: usize = state
                .flatten_selections()
                .iter()
                .map(|scope| scope.selected_tables.len())
                .sum();
            tables <= 1 || !state.joins().is_empty()
        }
        Step::ConfigureTransforms => true,
        Step::Review => false,
    }
}
