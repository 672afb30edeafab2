use anyhow::{bail, Result};
use std::collections::HashMap;
use mart_builder::{
    api::{ApiClient, ConnectionRef},
    cli::{Cli, Commands},
    plan::{load_catalog, load_plan, save_catalog},
    view::{assemble_view, compute_warnings},
    Catalog,
};

fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init()?;

    let cli = Cli::parse_args();
    let client = ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Connections => {
            let connections = client.get_connections()?;
            if connections.is_empty() {
                println!("No saved connections.");
            } else {
                println!("Saved connections:\n");
                for (label, connection_string) in &connections {
                    println!("  {} = {}", label, connection_string);
                }
            }
        }

        Commands::Catalog {
            connection,
            page,
            page_size,
            output,
        } => {
            let connections = resolve_connections(&client, &connection)?;
            let databases = client.get_databases(&connections, page, page_size)?;
            let catalog = Catalog::new(databases);

            let mut schemas = 0;
            let mut tables = 0;
            for db in catalog.databases() {
                schemas += db.schemas.len();
                tables += db.schemas.iter().map(|s| s.tables.len()).sum::<usize>();
            }
            save_catalog(&output, &catalog)?;
            println!(
                "Saved {} databases, {} schemas, {} tables to {:?}",
                catalog.databases().len(),
                schemas,
                tables,
                output
            );
        }

        Commands::Tasks { page, page_size } => {
            let tasks = client.get_tasks(page, page_size)?;
            if tasks.is_empty() {
                println!("No tasks on page {}.", page);
            } else {
                for task in &tasks {
                    println!(
                        "  {}  {}  {}",
                        task.id,
                        task.status,
                        task.create_date.as_deref().unwrap_or("-")
                    );
                    if let Some(comment) = &task.comment {
                        println!("      {}", comment);
                    }
                }
            }
        }

        Commands::Preview { plan, catalog } => {
            let state = load_plan(&plan)?;
            let catalog = load_catalog(&catalog)?;
            print_warnings(&state);
            let view = assemble_view(&state, &catalog);
            println!("{}", serde_json::to_string_pretty(&view)?);
        }

        Commands::Submit { plan, catalog } => {
            let state = load_plan(&plan)?;
            let catalog = load_catalog(&catalog)?;
            print_warnings(&state);
            let view = assemble_view(&state, &catalog);
            let task_id = client.upload_view(&view)?;
            println!("Submitted view '{}' as task {}", view.view_name, task_id);
        }
    }

    Ok(())
}

/// Turns each `--connection` argument into a labelled connection string:
/// `label=conn` is used verbatim, a bare label is looked up on the backend.
fn resolve_connections(client: &ApiClient, args: &[String]) -> Result<Vec<ConnectionRef>> {
    let mut saved: Option<HashMap<String, String>> = None;
    let mut connections = Vec::with_capacity(args.len());
    for arg in args {
        if let Some((label, connection_string)) = arg.split_once('=') {
            connections.push(ConnectionRef::new(label, connection_string));
            continue;
        }
        if saved.is_none() {
            saved = Some(client.get_connections()?);
        }
        let Some(connection_string) = saved.as_ref().and_then(|m| m.get(arg)) else {
            bail!("No saved connection named '{}'", arg);
        };
        connections.push(ConnectionRef::new(arg, connection_string));
    }
    Ok(connections)
}

fn print_warnings(state: &mart_builder::BuilderState) {
    for warning in compute_warnings(state) {
        eprintln!("warning: {}", warning);
    }
}
