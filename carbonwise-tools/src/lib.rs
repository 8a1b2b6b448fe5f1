//! # Carbonwise Tools
//!
//! Tool implementations exposed over MCP: local tracking sessions, CodeCarbon
//! API queries, consumption lookups, and the lowest-emission recommendation.

pub mod api;
pub mod consumption;
pub mod recommend;
pub mod registry;
pub mod scenarios;
pub mod tracking;

use carbonwise_core::config::{ApiConfig, CarbonwiseConfig};
use carbonwise_core::error::ToolError;
use carbonwise_core::{ApiClient, Tracker};
use registry::{Tool, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Tracker shared between the tracking tools.
pub type SharedTracker = Arc<Mutex<Tracker>>;

/// State handed to every tool: API settings and the tracking session.
#[derive(Debug, Clone)]
pub struct ToolContext {
    api: Arc<ApiConfig>,
    tracker: SharedTracker,
    default_measure_power_secs: u64,
}

impl ToolContext {
    pub fn new(config: &CarbonwiseConfig) -> Self {
        Self::with_tracker(
            config.api.clone(),
            Arc::new(Mutex::new(Tracker::from_config(&config.tracker))),
            config.tracker.measure_power_secs,
        )
    }

    pub fn with_tracker(api: ApiConfig, tracker: SharedTracker, default_measure_power_secs: u64) -> Self {
        Self {
            api: Arc::new(api),
            tracker,
            default_measure_power_secs,
        }
    }

    pub fn tracker(&self) -> &SharedTracker {
        &self.tracker
    }

    pub fn default_measure_power_secs(&self) -> u64 {
        self.default_measure_power_secs
    }

    /// Build an authenticated client. Credentials are re-read on every call
    /// so a fresh `codecarbon login` takes effect without a restart.
    pub fn client(&self, tool: &str) -> Result<ApiClient, ToolError> {
        ApiClient::from_config(&self.api).map_err(|e| ToolError::execution(tool, e))
    }

    /// Time allowed for a tool that issues `requests` sequential API calls.
    pub fn api_timeout(&self, requests: u32) -> Duration {
        Duration::from_secs(self.api.timeout_secs.saturating_mul(u64::from(requests)) + 5)
    }
}

/// Register all built-in tools.
pub fn register_builtin_tools(registry: &mut ToolRegistry, ctx: ToolContext) {
    let tools: Vec<Arc<dyn Tool>> = vec![
        // Local tracking session
        Arc::new(tracking::StartTrackingTool::new(ctx.clone())),
        Arc::new(tracking::StopTrackingTool::new(ctx.clone())),
        Arc::new(tracking::GetStatusTool::new(ctx.clone())),
        Arc::new(tracking::GetCurrentMetricsTool::new(ctx.clone())),
        // CodeCarbon API passthrough
        Arc::new(api::CheckAuthTool::new(ctx.clone())),
        Arc::new(api::ListOrganizationsTool::new(ctx.clone())),
        Arc::new(api::ListProjectsTool::new(ctx.clone())),
        Arc::new(api::ListExperimentsTool::new(ctx.clone())),
        Arc::new(api::CreateExperimentTool::new(ctx.clone())),
        // Analysis
        Arc::new(consumption::ExperimentConsumptionTool::new(ctx.clone())),
        Arc::new(consumption::ExperimentConsumptionByNameTool::new(ctx.clone())),
        Arc::new(recommend::RecommendLowestEmissionTool::new(ctx)),
        Arc::new(scenarios::DemoPromptScenariosTool),
    ];

    for tool in tools {
        if let Err(e) = registry.register(tool) {
            tracing::warn!("Failed to register tool: {}", e);
        }
    }
}
