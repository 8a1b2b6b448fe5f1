//! Async client for the CodeCarbon REST API.
//!
//! Covers the read endpoints the analysis tools need (organizations,
//! projects, experiments, run summaries) plus experiment creation. Every
//! response is JSON; an empty body decodes as `null`.

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::analysis::{Report, RunRecord};
use crate::config::ApiConfig;
use crate::credentials::load_access_token;
use crate::error::{ApiError, CarbonwiseError};

/// How requests authenticate against the API.
#[derive(Clone, PartialEq, Eq)]
pub enum ApiAuth {
    /// Project token, sent as `x-api-token`.
    ApiToken(String),
    /// OAuth access token, sent as `Authorization: Bearer …`.
    AccessToken(String),
    Anonymous,
}

impl std::fmt::Debug for ApiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuth::ApiToken(_) => f.write_str("ApiToken(***)"),
            ApiAuth::AccessToken(_) => f.write_str("AccessToken(***)"),
            ApiAuth::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// An experiment as listed under a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The identifying subset of an [`Experiment`] echoed in tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub project_id: Option<String>,
}

impl Experiment {
    pub fn summary(&self) -> ExperimentSummary {
        ExperimentSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            project_id: self.project_id.clone(),
        }
    }
}

/// Optional date bounds (ISO 8601) applied to run and experiment sums.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateWindow {
    pub fn new(start_date: Option<String>, end_date: Option<String>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Query parameters for the bounds that are set and non-empty.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        [
            ("start_date", &self.start_date),
            ("end_date", &self.end_date),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .filter(|v| !v.is_empty())
                .map(|v| (key, v.clone()))
        })
        .collect()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Payload for `POST /experiments`. Unset optional fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewExperiment {
    pub project_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_iso_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub on_cloud: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_region: Option<String>,
}

/// Client for a CodeCarbon API deployment.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: ApiAuth,
}

impl ApiClient {
    /// Create a client for `base_url` (trailing slashes are ignored).
    pub fn new(base_url: &str, auth: ApiAuth, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.clone(),
            message: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    /// Build a client from configuration.
    ///
    /// A configured API token wins; otherwise the access token is read from
    /// the credentials file, so a missing `codecarbon login` surfaces here.
    pub fn from_config(config: &ApiConfig) -> Result<Self, CarbonwiseError> {
        let auth = match config.api_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => ApiAuth::ApiToken(token.to_string()),
            None => ApiAuth::AccessToken(load_access_token(&config.credentials_path)?),
        };
        Ok(Self::new(
            &config.base_url,
            auth,
            Duration::from_secs(config.timeout_secs),
        )?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");

        builder = match &self.auth {
            ApiAuth::ApiToken(token) => builder.header("x-api-token", token),
            ApiAuth::AccessToken(token) => builder.bearer_auth(token),
            ApiAuth::Anonymous => builder,
        };
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        debug!(method = %method, path = %path, "CodeCarbon API request");

        let request_failed = |e: reqwest::Error| ApiError::Request {
            method: method.to_string(),
            path: path.to_string(),
            message: e.to_string(),
        };
        let response = builder.send().await.map_err(request_failed)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(request_failed)?;

        if status.as_u16() >= 400 {
            warn!(method = %method, path = %path, status = status.as_u16(), "CodeCarbon API error");
            return Err(ApiError::Status {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let decode_failed = |e: serde_json::Error| ApiError::Decode {
            method: method.to_string(),
            path: path.to_string(),
            message: e.to_string(),
        };
        let value: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(decode_failed)?
        };
        serde_json::from_value(value).map_err(decode_failed)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn check_auth(&self) -> Result<Value, ApiError> {
        self.get("/auth/check", &[]).await
    }

    pub async fn list_organizations(&self) -> Result<Vec<Value>, ApiError> {
        self.get("/organizations", &[]).await
    }

    pub async fn list_projects(&self, organization_id: &str) -> Result<Vec<Value>, ApiError> {
        self.get(&format!("/organizations/{organization_id}/projects"), &[])
            .await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Value, ApiError> {
        self.get(&format!("/projects/{project_id}"), &[]).await
    }

    pub async fn list_experiments(&self, project_id: &str) -> Result<Vec<Experiment>, ApiError> {
        self.get(&format!("/projects/{project_id}/experiments"), &[])
            .await
    }

    pub async fn get_experiment(&self, experiment_id: &str) -> Result<Experiment, ApiError> {
        self.get(&format!("/experiments/{experiment_id}"), &[]).await
    }

    /// Per-run sums for one experiment, optionally bounded by `window`.
    pub async fn get_experiment_run_summaries(
        &self,
        experiment_id: &str,
        window: &DateWindow,
    ) -> Result<Vec<RunRecord>, ApiError> {
        self.get(
            &format!("/experiments/{experiment_id}/runs/sums"),
            &window.query(),
        )
        .await
    }

    /// Per-experiment sums for a project, optionally bounded by `window`.
    pub async fn get_project_experiment_summaries(
        &self,
        project_id: &str,
        window: &DateWindow,
    ) -> Result<Vec<Report>, ApiError> {
        self.get(
            &format!("/projects/{project_id}/experiments/sums"),
            &window.query(),
        )
        .await
    }

    pub async fn get_run(&self, run_id: &str) -> Result<Value, ApiError> {
        self.get(&format!("/runs/{run_id}"), &[]).await
    }

    /// One page of raw emission samples for a run.
    pub async fn get_run_emissions(
        &self,
        run_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Value, ApiError> {
        self.get(
            &format!("/runs/{run_id}/emissions"),
            &[("page", page.to_string()), ("size", page_size.to_string())],
        )
        .await
    }

    pub async fn create_experiment(&self, experiment: &NewExperiment) -> Result<Value, ApiError> {
        let body = serde_json::to_value(experiment).map_err(|e| ApiError::Decode {
            method: Method::POST.to_string(),
            path: "/experiments".to_string(),
            message: e.to_string(),
        })?;
        self.request(Method::POST, "/experiments", &[], Some(body))
            .await
    }
}
