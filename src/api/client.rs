use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::DatabaseEntry;
use crate::view::ViewDefinition;

pub const DEFAULT_API_URL: &str = "http://localhost:8888";

/// Reference to a saved source connection, as the introspection endpoint
/// expects it: a single `{label: connection_string}` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRef {
    pub connection_string: HashMap<String, String>,
}

impl ConnectionRef {
    pub fn new(label: &str, connection_string: &str) -> Self {
        Self {
            connection_string: HashMap::from([(
                label.to_string(),
                connection_string.to_string(),
            )]),
        }
    }
}

#[derive(Serialize)]
struct DbInfoRequest<'a> {
    connection_strings: &'a [ConnectionRef],
    page: u32,
    page_size: u32,
}

#[derive(Serialize)]
struct PageRequest {
    page: u32,
    page_size: u32,
}

/// One background ETL run as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Blocking client for the data-center backend.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent("mart-builder")
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the saved connection labels and their connection strings.
    pub fn get_connections(&self) -> Result<HashMap<String, String>> {
        let url = self.url("/api/get-connections");
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .context("Failed to fetch connections")?
            .error_for_status()
            .context("Connections request rejected")?;
        response.json().context("Failed to parse connections")
    }

    /// Fetch one page of introspected catalog entries for the given
    /// connections. Pages are sized by table count per schema.
    pub fn get_databases(
        &self,
        connections: &[ConnectionRef],
        page: u32,
        page_size: u32,
    ) -> Result<Vec<DatabaseEntry>> {
        let url = self.url("/api/get-db");
        log::debug!("POST {} (page {})", url, page);
        let response = self
            .client
            .post(&url)
            .json(&DbInfoRequest {
                connection_strings: connections,
                page,
                page_size,
            })
            .send()
            .context("Failed to fetch database info")?
            .error_for_status()
            .context("Database info request rejected")?;
        response.json().context("Failed to parse database info")
    }

    /// Submit the assembled view definition for materialization. Returns the
    /// id of the backend task created for it.
    pub fn upload_view(&self, view: &ViewDefinition) -> Result<String> {
        let url = self.url("/api/upload-schem");
        log::debug!("POST {} (view {})", url, view.view_name);
        let response = self
            .client
            .post(&url)
            .json(view)
            .send()
            .context("Failed to upload view definition")?
            .error_for_status()
            .context("View upload rejected")?;
        response.json().context("Failed to parse upload response")
    }

    /// Fetch one page of ETL task statuses.
    pub fn get_tasks(&self, page: u32, page_size: u32) -> Result<Vec<Task>> {
        let url = self.url("/api/get-tasks");
        log::debug!("POST {} (page {})", url, page);
        let response = self
            .client
            .post(&url)
            .json(&PageRequest { page, page_size })
            .send()
            .context("Failed to fetch tasks")?
            .error_for_status()
            .context("Tasks request rejected")?;
        response.json().context("Failed to parse tasks")
    }
}
