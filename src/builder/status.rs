use serde::{Deserialize, Serialize};

/// Load status of the schema list for one database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadState {
    #[serde(default)]
    pub loading: bool,
    #[serde(default)]
    pub loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoadState {
    /// Marks the load in flight. Returns `false` when one already is, so
    /// duplicate requests for the same database are never issued.
    pub fn begin(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        self.error = None;
        true
    }

    pub fn complete(&mut self) {
        self.loading = false;
        self.loaded = true;
        self.error = None;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.loading = false;
        self.error = Some(error.into());
    }
}

/// Pagination status of the table list for one `(db, schema)` scope.
///
/// Tracked independently per scope so "load more" requests against different
/// scopes never interfere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLoadState {
    #[serde(default)]
    pub loading: bool,
    #[serde(default)]
    pub loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub page: u32,
    pub has_more: bool,
}

impl Default for TableLoadState {
    fn default() -> Self {
        Self {
            loading: false,
            loaded: false,
            error: None,
            page: 1,
            has_more: true,
        }
    }
}

impl TableLoadState {
    /// Guard for the scope's next page request; `false` when one is already
    /// in flight.
    pub fn begin(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        self.error = None;
        true
    }

    /// A page arrived: advance to the next one.
    pub fn complete_page(&mut self, has_more: bool) {
        self.loading = false;
        self.loaded = true;
        self.error = None;
        self.page += 1;
        self.has_more = has_more;
    }

    /// The request failed. `page` and `has_more` stay untouched so a retry
    /// re-requests the same page.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.loading = false;
        self.error = Some(error.into());
    }
}
