//! Experiment consumption tools: per-run sums aggregated into totals.

use async_trait::async_trait;
use carbonwise_core::analysis::{NameMatch, RunRecord, RunTotals, aggregate_runs, match_experiments_by_name};
use carbonwise_core::client::{ApiClient, DateWindow, ExperimentSummary};
use carbonwise_core::error::{ApiError, ToolError};
use carbonwise_core::types::{RiskLevel, ToolOutput};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::ToolContext;
use crate::registry::{Tool, json_output, parse_args};

/// Consumption of one experiment over a date window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionReport {
    pub experiment: ExperimentSummary,
    pub window: DateWindow,
    pub totals: RunTotals,
    pub runs: Vec<RunRecord>,
}

/// An experiment offered back to the caller when a name does not resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameCandidate {
    pub id: String,
    pub name: Option<String>,
}

/// Outcome of a by-name lookup: either the consumption report, or a message
/// with the experiments that matched (none or several).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ByNameOutcome {
    Found(ConsumptionReport),
    Unresolved {
        message: String,
        matches: Vec<NameCandidate>,
    },
}

/// Fetch an experiment and its run sums, and total them.
pub async fn experiment_consumption(
    client: &ApiClient,
    experiment_id: &str,
    window: DateWindow,
) -> Result<ConsumptionReport, ApiError> {
    let experiment = client.get_experiment(experiment_id).await?;
    let runs = client
        .get_experiment_run_summaries(experiment_id, &window)
        .await?;
    let totals = aggregate_runs(&runs);
    debug!(experiment_id, runs = totals.run_count, "Aggregated experiment runs");

    Ok(ConsumptionReport {
        experiment: experiment.summary(),
        window,
        totals,
        runs,
    })
}

/// Resolve `experiment_name` within a project and, when exactly one
/// experiment matches, return its consumption.
pub async fn consumption_by_name(
    client: &ApiClient,
    project_id: &str,
    experiment_name: &str,
    window: DateWindow,
) -> Result<ByNameOutcome, ApiError> {
    let experiments = client.list_experiments(project_id).await?;

    match match_experiments_by_name(&experiments, experiment_name) {
        NameMatch::NoMatch => Ok(ByNameOutcome::Unresolved {
            message: format!(
                "No experiment found for name '{experiment_name}' in project {project_id}."
            ),
            matches: Vec::new(),
        }),
        NameMatch::Ambiguous(matches) => Ok(ByNameOutcome::Unresolved {
            message: format!("Multiple experiments match '{experiment_name}'."),
            matches: matches
                .into_iter()
                .map(|exp| NameCandidate {
                    id: exp.id.clone(),
                    name: exp.name.clone(),
                })
                .collect(),
        }),
        NameMatch::Unique(exp) => experiment_consumption(client, &exp.id, window)
            .await
            .map(ByNameOutcome::Found),
    }
}

fn window_properties() -> serde_json::Value {
    json!({
        "start_date": {
            "type": ["string", "null"],
            "description": "ISO 8601 date; only runs on or after it are included"
        },
        "end_date": {
            "type": ["string", "null"],
            "description": "ISO 8601 date; only runs on or before it are included"
        }
    })
}

fn schema_with_window(mut properties: serde_json::Value, required: &[&str]) -> serde_json::Value {
    if let (Some(props), serde_json::Value::Object(window)) =
        (properties.as_object_mut(), window_properties())
    {
        props.extend(window);
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub struct ExperimentConsumptionTool {
    ctx: ToolContext,
}

impl ExperimentConsumptionTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[derive(Deserialize)]
struct ConsumptionArgs {
    experiment_id: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

#[async_trait]
impl Tool for ExperimentConsumptionTool {
    fn name(&self) -> &str {
        "get_experiment_consumption"
    }

    fn description(&self) -> &str {
        "Total emissions, energy, and duration of an experiment's runs, optionally \
         restricted to a date window."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        schema_with_window(
            json!({
                "experiment_id": { "type": "string", "description": "Experiment identifier" }
            }),
            &["experiment_id"],
        )
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let args: ConsumptionArgs = parse_args(self.name(), args)?;
        let client = self.ctx.client(self.name())?;
        let report = experiment_consumption(
            &client,
            &args.experiment_id,
            DateWindow::new(args.start_date, args.end_date),
        )
        .await
        .map_err(|e| ToolError::execution(self.name(), e))?;
        json_output(self.name(), &report)
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::Network
    }

    fn timeout(&self) -> Duration {
        self.ctx.api_timeout(2)
    }
}

pub struct ExperimentConsumptionByNameTool {
    ctx: ToolContext,
}

impl ExperimentConsumptionByNameTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[derive(Deserialize)]
struct ByNameArgs {
    project_id: String,
    experiment_name: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

#[async_trait]
impl Tool for ExperimentConsumptionByNameTool {
    fn name(&self) -> &str {
        "get_experiment_consumption_by_name"
    }

    fn description(&self) -> &str {
        "Find an experiment by name within a project and return its consumption. \
         Exact case-insensitive matches win over partial ones; ambiguous names \
         return the candidates instead."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        schema_with_window(
            json!({
                "project_id": { "type": "string", "description": "Project to search" },
                "experiment_name": { "type": "string", "description": "Full or partial experiment name" }
            }),
            &["project_id", "experiment_name"],
        )
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let args: ByNameArgs = parse_args(self.name(), args)?;
        let client = self.ctx.client(self.name())?;
        let window = DateWindow::new(args.start_date, args.end_date);
        let outcome = consumption_by_name(&client, &args.project_id, &args.experiment_name, window)
            .await
            .map_err(|e| ToolError::execution(self.name(), e))?;
        json_output(self.name(), &outcome)
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::Network
    }

    fn timeout(&self) -> Duration {
        self.ctx.api_timeout(3)
    }
}
