use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::DEFAULT_API_URL;

#[derive(Parser, Debug)]
#[command(name = "mart-builder")]
#[command(version, about = "Compose data-mart views from introspected source databases")]
pub struct Cli {
    /// Backend base URL
    #[arg(long, global = true, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the saved source connections
    Connections,

    /// Fetch the catalog for one or more connections and save it locally
    Catalog {
        /// Connections to introspect, either a saved label or label=connection-string
        #[arg(short, long, value_delimiter = ',', required = true)]
        connection: Vec<String>,

        /// First page to fetch
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Tables per schema per page
        #[arg(long, default_value_t = 25)]
        page_size: u32,

        /// Catalog output path
        #[arg(short, long, default_value = "catalog.json")]
        output: PathBuf,
    },

    /// List background ETL tasks
    Tasks {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 25)]
        page_size: u32,
    },

    /// Assemble a plan against a catalog and print the view definition
    Preview {
        /// Saved plan file
        plan: PathBuf,

        /// Saved catalog file
        #[arg(short, long, default_value = "catalog.json")]
        catalog: PathBuf,
    },

    /// Assemble a plan and submit the view for materialization
    Submit {
        /// Saved plan file
        plan: PathBuf,

        /// Saved catalog file
        #[arg(short, long, default_value = "catalog.json")]
        catalog: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
