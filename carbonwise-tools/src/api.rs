//! CodeCarbon API passthrough tools.
//!
//! Each tool builds a fresh client from the configured credentials, forwards
//! one request, and returns the API's JSON unchanged.

use async_trait::async_trait;
use carbonwise_core::NewExperiment;
use carbonwise_core::error::ToolError;
use carbonwise_core::types::{RiskLevel, ToolOutput};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;

use crate::ToolContext;
use crate::registry::{Tool, json_output, parse_args};

pub struct CheckAuthTool {
    ctx: ToolContext,
}

impl CheckAuthTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for CheckAuthTool {
    fn name(&self) -> &str {
        "check_auth"
    }

    fn description(&self) -> &str {
        "Verify that the stored CodeCarbon credentials are accepted by the API."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let client = self.ctx.client(self.name())?;
        let body = client
            .check_auth()
            .await
            .map_err(|e| ToolError::execution(self.name(), e))?;
        json_output(self.name(), &body)
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::Network
    }

    fn timeout(&self) -> Duration {
        self.ctx.api_timeout(1)
    }
}

pub struct ListOrganizationsTool {
    ctx: ToolContext,
}

impl ListOrganizationsTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for ListOrganizationsTool {
    fn name(&self) -> &str {
        "list_organizations"
    }

    fn description(&self) -> &str {
        "List the organizations visible to the configured credentials."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let client = self.ctx.client(self.name())?;
        let organizations = client
            .list_organizations()
            .await
            .map_err(|e| ToolError::execution(self.name(), e))?;
        json_output(self.name(), &organizations)
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::Network
    }

    fn timeout(&self) -> Duration {
        self.ctx.api_timeout(1)
    }
}

pub struct ListProjectsTool {
    ctx: ToolContext,
}

impl ListProjectsTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[derive(Deserialize)]
struct ListProjectsArgs {
    organization_id: String,
}

#[async_trait]
impl Tool for ListProjectsTool {
    fn name(&self) -> &str {
        "list_projects"
    }

    fn description(&self) -> &str {
        "List the projects of an organization."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "organization_id": { "type": "string", "description": "Organization identifier" }
            },
            "required": ["organization_id"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let args: ListProjectsArgs = parse_args(self.name(), args)?;
        let client = self.ctx.client(self.name())?;
        let projects = client
            .list_projects(&args.organization_id)
            .await
            .map_err(|e| ToolError::execution(self.name(), e))?;
        json_output(self.name(), &projects)
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::Network
    }

    fn timeout(&self) -> Duration {
        self.ctx.api_timeout(1)
    }
}

pub struct ListExperimentsTool {
    ctx: ToolContext,
}

impl ListExperimentsTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[derive(Deserialize)]
struct ListExperimentsArgs {
    project_id: String,
}

#[async_trait]
impl Tool for ListExperimentsTool {
    fn name(&self) -> &str {
        "list_experiments"
    }

    fn description(&self) -> &str {
        "List the experiments of a project."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": { "type": "string", "description": "Project identifier" }
            },
            "required": ["project_id"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let args: ListExperimentsArgs = parse_args(self.name(), args)?;
        let client = self.ctx.client(self.name())?;
        let experiments = client
            .list_experiments(&args.project_id)
            .await
            .map_err(|e| ToolError::execution(self.name(), e))?;
        json_output(self.name(), &experiments)
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::Network
    }

    fn timeout(&self) -> Duration {
        self.ctx.api_timeout(1)
    }
}

pub struct CreateExperimentTool {
    ctx: ToolContext,
}

impl CreateExperimentTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for CreateExperimentTool {
    fn name(&self) -> &str {
        "create_experiment"
    }

    fn description(&self) -> &str {
        "Create an experiment in a CodeCarbon project. Put metrics such as \
         'accuracy=92.1' in the description to make it eligible for recommendations."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        let optional_text = |description: &str| {
            json!({ "type": ["string", "null"], "description": description })
        };
        json!({
            "type": "object",
            "properties": {
                "project_id": { "type": "string", "description": "Project to create the experiment in" },
                "name": { "type": "string", "description": "Display name" },
                "description": optional_text("Free text; may carry 'accuracy=92.1'"),
                "timestamp": optional_text("ISO 8601 creation time"),
                "country_name": optional_text("Country the experiment runs in, e.g. 'France'"),
                "country_iso_code": optional_text("ISO 3166-1 alpha-3 code, e.g. 'FRA'"),
                "region": optional_text("Region within the country, e.g. 'eu-west-3'"),
                "on_cloud": { "type": "boolean", "default": false },
                "cloud_provider": optional_text("e.g. 'aws', 'gcp', 'azure'"),
                "cloud_region": optional_text("e.g. 'us-east-1'")
            },
            "required": ["project_id", "name"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let payload: NewExperiment = parse_args(self.name(), args)?;
        let client = self.ctx.client(self.name())?;
        info!(project_id = %payload.project_id, name = %payload.name, "Creating experiment");
        let created = client
            .create_experiment(&payload)
            .await
            .map_err(|e| ToolError::execution(self.name(), e))?;
        json_output(self.name(), &created)
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::RemoteWrite
    }

    fn timeout(&self) -> Duration {
        self.ctx.api_timeout(1)
    }
}
