//! Local tracking session tools: start, stop, status, and live metrics.

use async_trait::async_trait;
use carbonwise_core::error::ToolError;
use carbonwise_core::tracker::{StartOutcome, format_timestamp};
use carbonwise_core::types::{RiskLevel, ToolOutput};
use serde::Deserialize;
use serde_json::json;

use crate::ToolContext;
use crate::registry::{Tool, json_output, parse_args};

pub struct StartTrackingTool {
    ctx: ToolContext,
}

impl StartTrackingTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[derive(Deserialize)]
struct StartArgs {
    #[serde(default)]
    measure_power_secs: Option<u64>,
}

#[async_trait]
impl Tool for StartTrackingTool {
    fn name(&self) -> &str {
        "start_tracking"
    }

    fn description(&self) -> &str {
        "Start a local energy tracking session. Returns 'already_running' without \
         touching the session if one is in progress."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "measure_power_secs": {
                    "type": "integer",
                    "minimum": 1,
                    "default": self.ctx.default_measure_power_secs(),
                    "description": "Interval in seconds between power measurements"
                }
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let args: StartArgs = parse_args(self.name(), args)?;
        let interval = args
            .measure_power_secs
            .unwrap_or_else(|| self.ctx.default_measure_power_secs());

        let outcome = self.ctx.tracker().lock().await.start(interval);
        let body = match outcome {
            StartOutcome::Started(session) => json!({
                "status": "started",
                "start_time": format_timestamp(session.started_at),
                "project_name": session.project_name,
                "measurement_interval": session.measure_power_secs,
            }),
            StartOutcome::AlreadyRunning => json!({
                "status": "already_running",
                "message": "Tracking is already in progress.",
            }),
        };
        json_output(self.name(), &body)
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::Write
    }
}

pub struct StopTrackingTool {
    ctx: ToolContext,
}

impl StopTrackingTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for StopTrackingTool {
    fn name(&self) -> &str {
        "stop_tracking"
    }

    fn description(&self) -> &str {
        "Stop the active tracking session and return its duration, energy, and emissions."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let report = self
            .ctx
            .tracker()
            .lock()
            .await
            .stop()
            .map_err(|e| ToolError::execution(self.name(), e))?;

        json_output(
            self.name(),
            &json!({
                "status": "stopped",
                "duration_seconds": report.duration_seconds,
                "energy_kwh": report.energy_kwh,
                "emissions_kg_co2": report.emissions_kg_co2,
            }),
        )
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::Write
    }
}

pub struct GetStatusTool {
    ctx: ToolContext,
}

impl GetStatusTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for GetStatusTool {
    fn name(&self) -> &str {
        "get_status"
    }

    fn description(&self) -> &str {
        "Report whether a tracking session is active."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let status = self.ctx.tracker().lock().await.status();
        json_output(self.name(), &status)
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::ReadOnly
    }
}

pub struct GetCurrentMetricsTool {
    ctx: ToolContext,
}

impl GetCurrentMetricsTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for GetCurrentMetricsTool {
    fn name(&self) -> &str {
        "get_current_metrics"
    }

    fn description(&self) -> &str {
        "Elapsed time of the running tracking session, without stopping it."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let snapshot = self
            .ctx
            .tracker()
            .lock()
            .await
            .current_metrics()
            .map_err(|e| ToolError::execution(self.name(), e))?;

        json_output(
            self.name(),
            &json!({
                "status": "tracking",
                "start_time": snapshot.start_time,
                "current_time": snapshot.current_time,
                "duration_seconds": snapshot.duration_seconds,
            }),
        )
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::ReadOnly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbonwise_core::config::CarbonwiseConfig;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn content(output: &ToolOutput) -> Value {
        serde_json::from_str(&output.content).unwrap()
    }

    fn ctx() -> ToolContext {
        ToolContext::new(&CarbonwiseConfig::default())
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let ctx = ctx();
        let start = StartTrackingTool::new(ctx.clone());
        let status = GetStatusTool::new(ctx.clone());
        let metrics = GetCurrentMetricsTool::new(ctx.clone());
        let stop = StopTrackingTool::new(ctx.clone());

        assert_eq!(
            content(&status.execute(Value::Null).await.unwrap()),
            json!({"status": "not_tracking"})
        );

        let started = content(&start.execute(json!({"measure_power_secs": 5})).await.unwrap());
        assert_eq!(started["status"], "started");
        assert_eq!(started["project_name"], "mcp-codecarbon-tracking");
        assert_eq!(started["measurement_interval"], 5);

        let tracking = content(&status.execute(json!({})).await.unwrap());
        assert_eq!(tracking["status"], "tracking");
        assert_eq!(tracking["start_time"], started["start_time"]);

        let snapshot = content(&metrics.execute(json!({})).await.unwrap());
        assert_eq!(snapshot["status"], "tracking");
        assert!(snapshot["duration_seconds"].as_f64().unwrap() >= 0.0);

        let stopped = content(&stop.execute(json!({})).await.unwrap());
        assert_eq!(stopped["status"], "stopped");
        assert!(stopped["emissions_kg_co2"].as_f64().unwrap() >= 0.0);
        assert!(stopped.get("energy_kwh").is_some());

        assert_eq!(
            content(&status.execute(json!({})).await.unwrap()),
            json!({"status": "not_tracking"})
        );
    }

    #[tokio::test]
    async fn test_start_twice_reports_already_running() {
        let ctx = ctx();
        let start = StartTrackingTool::new(ctx.clone());

        let first = content(&start.execute(json!({})).await.unwrap());
        assert_eq!(first["measurement_interval"], 15);

        let second = content(&start.execute(json!({"measure_power_secs": 1})).await.unwrap());
        assert_eq!(
            second,
            json!({"status": "already_running", "message": "Tracking is already in progress."})
        );
    }

    #[tokio::test]
    async fn test_stop_and_metrics_fail_when_idle() {
        let ctx = ctx();

        let err = StopTrackingTool::new(ctx.clone())
            .execute(json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No active tracking session."));

        let err = GetCurrentMetricsTool::new(ctx)
            .execute(json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }
}
