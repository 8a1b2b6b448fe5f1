//! Lowest-emission recommendation across a project's experiments.

use async_trait::async_trait;
use carbonwise_core::analysis::{Selection, select_lowest_consumption};
use carbonwise_core::client::{ApiClient, DateWindow};
use carbonwise_core::error::{ApiError, ToolError};
use carbonwise_core::types::{RiskLevel, ToolOutput};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::info;

use crate::ToolContext;
use crate::registry::{Tool, json_output, parse_args};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub project_id: String,
    pub window: DateWindow,
    pub recommendation: Selection,
    /// Reports fetched before the accuracy filter was applied.
    pub experiments_considered: usize,
}

/// Fetch a project's experiment sums and pick the lowest-emission one.
pub async fn recommend_lowest_emission(
    client: &ApiClient,
    project_id: &str,
    min_accuracy: Option<f64>,
    window: DateWindow,
) -> Result<Recommendation, ApiError> {
    let reports = client
        .get_project_experiment_summaries(project_id, &window)
        .await?;
    let selection = select_lowest_consumption(&reports, min_accuracy);

    info!(
        project_id,
        reports = reports.len(),
        candidates = selection.candidate_count,
        selected = selection.selected.is_some(),
        "Computed lowest-emission recommendation"
    );

    Ok(Recommendation {
        project_id: project_id.to_string(),
        window,
        recommendation: selection,
        experiments_considered: reports.len(),
    })
}

pub struct RecommendLowestEmissionTool {
    ctx: ToolContext,
}

impl RecommendLowestEmissionTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[derive(Deserialize)]
struct RecommendArgs {
    project_id: String,
    #[serde(default)]
    min_accuracy: Option<f64>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

#[async_trait]
impl Tool for RecommendLowestEmissionTool {
    fn name(&self) -> &str {
        "recommend_lowest_emission_experiment"
    }

    fn description(&self) -> &str {
        "Recommend the experiment of a project with the lowest emissions, breaking \
         ties on energy then duration. With min_accuracy, only experiments whose \
         name or description states an accuracy (e.g. 'accuracy=92.1') at or \
         above the threshold are considered."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": { "type": "string", "description": "Project to evaluate" },
                "min_accuracy": {
                    "type": ["number", "null"],
                    "description": "Minimum accuracy, as a percentage (92) or decimal (0.92)"
                },
                "start_date": { "type": ["string", "null"], "description": "ISO 8601 lower bound" },
                "end_date": { "type": ["string", "null"], "description": "ISO 8601 upper bound" }
            },
            "required": ["project_id"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let args: RecommendArgs = parse_args(self.name(), args)?;
        let client = self.ctx.client(self.name())?;
        let recommendation = recommend_lowest_emission(
            &client,
            &args.project_id,
            args.min_accuracy,
            DateWindow::new(args.start_date, args.end_date),
        )
        .await
        .map_err(|e| ToolError::execution(self.name(), e))?;
        json_output(self.name(), &recommendation)
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::Network
    }

    fn timeout(&self) -> Duration {
        self.ctx.api_timeout(1)
    }
}
