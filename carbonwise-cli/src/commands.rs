//! CLI subcommand handlers.

use crate::{Commands, ConfigAction};
use carbonwise_core::client::{ApiClient, DateWindow};
use carbonwise_core::config::CarbonwiseConfig;
use carbonwise_mcp::McpServer;
use carbonwise_mcp::transport::StdioTransport;
use carbonwise_tools::consumption::{consumption_by_name, experiment_consumption};
use carbonwise_tools::recommend::recommend_lowest_emission;
use carbonwise_tools::registry::ToolRegistry;
use carbonwise_tools::{ToolContext, register_builtin_tools};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Which experiment `consumption` should report on.
#[derive(Debug, PartialEq)]
enum ConsumptionTarget {
    Id(String),
    Name { project_id: String, name: String },
}

impl ConsumptionTarget {
    fn from_args(
        experiment_id: Option<String>,
        project: Option<String>,
        name: Option<String>,
    ) -> anyhow::Result<Self> {
        match (experiment_id, project, name) {
            (Some(id), None, None) => Ok(Self::Id(id)),
            (None, Some(project_id), Some(name)) => Ok(Self::Name { project_id, name }),
            _ => anyhow::bail!("Pass either --experiment-id, or both --project and --name"),
        }
    }
}

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    config: CarbonwiseConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    match command {
        Commands::Serve => serve(&config).await,
        Commands::Recommend {
            project_id,
            min_accuracy,
            window,
        } => {
            let client = ApiClient::from_config(&config.api)?;
            let recommendation =
                recommend_lowest_emission(&client, &project_id, min_accuracy, window.into()).await?;
            print_json(&recommendation)
        }
        Commands::Consumption {
            experiment_id,
            project,
            name,
            window,
        } => {
            let target = ConsumptionTarget::from_args(experiment_id, project, name)?;
            consumption(&config, target, window.into()).await
        }
        Commands::Tools => {
            for def in builtin_registry(&config).list_definitions() {
                println!("{:<40} {}", def.name, def.description);
            }
            Ok(())
        }
        Commands::Config { action } => handle_config(action, &config, workspace),
    }
}

fn builtin_registry(config: &CarbonwiseConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, ToolContext::new(config));
    registry
}

async fn serve(config: &CarbonwiseConfig) -> anyhow::Result<()> {
    let registry = builtin_registry(config);
    info!(
        tools = registry.len(),
        api = %config.api.base_url,
        "Serving Carbonwise tools over MCP stdio"
    );
    let mut server = McpServer::new(Arc::new(registry));
    let mut transport = StdioTransport::new();
    server.run(&mut transport).await?;
    Ok(())
}

async fn consumption(
    config: &CarbonwiseConfig,
    target: ConsumptionTarget,
    window: DateWindow,
) -> anyhow::Result<()> {
    let client = ApiClient::from_config(&config.api)?;
    match target {
        ConsumptionTarget::Id(id) => print_json(&experiment_consumption(&client, &id, window).await?),
        ConsumptionTarget::Name { project_id, name } => {
            print_json(&consumption_by_name(&client, &project_id, &name, window).await?)
        }
    }
}

fn handle_config(
    action: ConfigAction,
    config: &CarbonwiseConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".carbonwise");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            std::fs::write(&config_path, CarbonwiseConfig::default().to_redacted_toml()?)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            println!("{}", config.to_redacted_toml()?);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
