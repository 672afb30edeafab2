use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::builder::BuilderState;
use crate::catalog::Catalog;

/// Reads a saved builder session. Missing fields fall back to their
/// defaults, so plans written by older versions still load.
pub fn load_plan(path: &Path) -> Result<BuilderState> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse plan file {}", path.display()))
}

pub fn save_plan(path: &Path, state: &BuilderState) -> Result<()> {
    let text = serde_json::to_string_pretty(state).context("Failed to serialize plan")?;
    fs::write(path, text)
        .with_context(|| format!("Failed to write plan file {}", path.display()))
}

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse catalog file {}", path.display()))
}

pub fn save_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    let text = serde_json::to_string_pretty(catalog).context("Failed to serialize catalog")?;
    fs::write(path, text)
        .with_context(|| format!("Failed to write catalog file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ColumnToggle;

    #[test]
    fn test_plan_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");

        let mut state = BuilderState::new();
        state.set_selected_databases(vec!["sales".into()]);
        state.set_schemas_for_db("sales", vec!["public".into()]);
        state.toggle_table("sales", "public", "orders");
        state.toggle_column(
            ColumnToggle::new("sales", "public", "orders", "id").primary_key(true),
        );
        state.set_view_name("SalesMart");

        save_plan(&path, &state).unwrap();
        let back = load_plan(&path).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn test_partial_plan_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(&path, r#"{"view_name":"Orders"}"#).unwrap();

        let state = load_plan(&path).unwrap();
        assert_eq!(state.view_name(), "Orders");
        assert!(state.selected_databases().is_empty());
    }

    #[test]
    fn test_missing_plan_is_an_error() {
        let err = load_plan(Path::new("/nonexistent/plan.json")).unwrap_err();
        assert!(err.to_string().contains("plan file"));
    }
}
