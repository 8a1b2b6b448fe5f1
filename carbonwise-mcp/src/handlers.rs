//! MCP request handlers: routes JSON-RPC requests to the tool registry.

use crate::error::McpError;
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, ListToolsResult,
    MCP_PROTOCOL_VERSION, McpTool, ServerCapabilities, ServerInfo, ToolContent, ToolsCapability,
};
use carbonwise_tools::registry::ToolRegistry;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handles MCP protocol requests by delegating to the tool registry.
pub struct RequestHandler {
    tool_registry: Arc<ToolRegistry>,
    /// Compiled argument schemas, keyed by tool name.
    validators: HashMap<String, jsonschema::Validator>,
    initialized: bool,
    server_info: ServerInfo,
}

fn compile_validators(registry: &ToolRegistry) -> HashMap<String, jsonschema::Validator> {
    registry
        .list_definitions()
        .into_iter()
        .filter_map(|def| match jsonschema::validator_for(&def.parameters) {
            Ok(validator) => Some((def.name, validator)),
            Err(e) => {
                warn!(tool = %def.name, error = %e, "Tool schema does not compile; arguments will not be validated");
                None
            }
        })
        .collect()
}

impl RequestHandler {
    pub fn new(tool_registry: Arc<ToolRegistry>) -> Self {
        let validators = compile_validators(&tool_registry);
        Self {
            tool_registry,
            validators,
            initialized: false,
            server_info: ServerInfo {
                name: "carbonwise".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Handle the `initialize` request.
    pub fn handle_initialize(&mut self, params: InitializeParams) -> Result<Value, McpError> {
        info!(
            client = %params.client_info.name,
            client_version = ?params.client_info.version,
            protocol_version = %params.protocol_version,
            "MCP client connecting"
        );

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
            },
            server_info: self.server_info.clone(),
        };

        serde_json::to_value(result).map_err(|e| McpError::InternalError {
            message: format!("Failed to serialize initialize result: {}", e),
        })
    }

    pub fn handle_initialized(&self) {
        info!("MCP client initialized successfully");
    }

    /// Handle the `tools/list` request.
    pub fn handle_tools_list(&self) -> Result<Value, McpError> {
        if !self.initialized {
            return Err(McpError::NotInitialized);
        }

        let tools: Vec<McpTool> = self
            .tool_registry
            .list_definitions()
            .into_iter()
            .map(|def| McpTool {
                name: def.name,
                description: Some(def.description),
                input_schema: def.parameters,
            })
            .collect();

        debug!(count = tools.len(), "Listing tools");

        serde_json::to_value(ListToolsResult { tools }).map_err(|e| McpError::InternalError {
            message: format!("Failed to serialize tools list: {}", e),
        })
    }

    /// Check `arguments` against the tool's input schema.
    fn validate_arguments(&self, tool_name: &str, arguments: &Value) -> Result<(), McpError> {
        let Some(validator) = self.validators.get(tool_name) else {
            return Ok(());
        };
        let violations: Vec<String> = validator
            .iter_errors(arguments)
            .map(|e| e.to_string())
            .collect();
        if violations.is_empty() {
            return Ok(());
        }
        warn!(tool = %tool_name, violations = ?violations, "Rejected tool arguments");
        Err(McpError::InvalidParams {
            message: format!(
                "Invalid arguments for tool '{}': {}",
                tool_name,
                violations.join("; ")
            ),
        })
    }

    /// Handle the `tools/call` request.
    ///
    /// Unknown tools and schema violations are protocol errors; failures
    /// while the tool runs come back as `isError` content.
    pub async fn handle_tools_call(&self, params: CallToolParams) -> Result<Value, McpError> {
        if !self.initialized {
            return Err(McpError::NotInitialized);
        }

        let tool_name = &params.name;
        let arguments = match params.arguments {
            Some(Value::Null) | None => Value::Object(Default::default()),
            Some(args) => args,
        };

        info!(tool = %tool_name, "Calling tool via MCP");
        debug!(tool = %tool_name, args = %arguments, "Tool call arguments");

        if self.tool_registry.get(tool_name).is_none() {
            return Err(McpError::ToolError {
                message: format!("Tool not found: {}", tool_name),
            });
        }
        self.validate_arguments(tool_name, &arguments)?;

        let result = match self.tool_registry.execute(tool_name, arguments).await {
            Ok(output) => CallToolResult {
                content: vec![ToolContent::Text {
                    text: output.content,
                }],
                is_error: output.is_error.then_some(true),
            },
            Err(e) => {
                warn!(tool = %tool_name, error = %e, "Tool execution failed");
                CallToolResult {
                    content: vec![ToolContent::Text {
                        text: format!("Error: {}", e),
                    }],
                    is_error: Some(true),
                }
            }
        };

        serde_json::to_value(result).map_err(|e| McpError::InternalError {
            message: format!("Failed to serialize tool result: {}", e),
        })
    }

    /// Route a JSON-RPC method to the appropriate handler.
    pub async fn route(&mut self, method: &str, params: Value) -> Result<Value, McpError> {
        match method {
            "initialize" => {
                let init_params: InitializeParams =
                    serde_json::from_value(params).map_err(|e| McpError::InvalidParams {
                        message: format!("Invalid initialize params: {}", e),
                    })?;
                self.handle_initialize(init_params)
            }
            "notifications/initialized" => {
                self.handle_initialized();
                Ok(Value::Null)
            }
            "ping" => Ok(Value::Object(Default::default())),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => {
                let call_params: CallToolParams =
                    serde_json::from_value(params).map_err(|e| McpError::InvalidParams {
                        message: format!("Invalid tools/call params: {}", e),
                    })?;
                self.handle_tools_call(call_params).await
            }
            _ => Err(McpError::MethodNotFound {
                method: method.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ClientCapabilities, ClientInfo};
    use carbonwise_core::config::CarbonwiseConfig;
    use carbonwise_tools::{ToolContext, register_builtin_tools};
    use serde_json::json;

    fn create_handler() -> RequestHandler {
        let mut registry = ToolRegistry::new();
        register_builtin_tools(&mut registry, ToolContext::new(&CarbonwiseConfig::default()));
        RequestHandler::new(Arc::new(registry))
    }

    fn init_params() -> InitializeParams {
        InitializeParams {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities {},
            client_info: ClientInfo {
                name: "test-client".to_string(),
                version: Some("1.0".to_string()),
            },
        }
    }

    fn initialized_handler() -> RequestHandler {
        let mut handler = create_handler();
        handler.handle_initialize(init_params()).unwrap();
        handler
    }

    fn call(name: &str, arguments: Value) -> CallToolParams {
        CallToolParams {
            name: name.to_string(),
            arguments: Some(arguments),
        }
    }

    #[test]
    fn test_every_builtin_schema_compiles() {
        let handler = create_handler();
        assert_eq!(handler.validators.len(), handler.tool_registry.len());
    }

    #[test]
    fn test_initialize() {
        let mut handler = create_handler();
        assert!(!handler.is_initialized());

        let result = handler.handle_initialize(init_params()).unwrap();
        assert!(handler.is_initialized());
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"].get("resources").is_none());
        assert_eq!(result["serverInfo"]["name"], "carbonwise");
    }

    #[test]
    fn test_tools_list_not_initialized() {
        let handler = create_handler();
        assert!(matches!(
            handler.handle_tools_list().unwrap_err(),
            McpError::NotInitialized
        ));
    }

    #[test]
    fn test_tools_list() {
        let handler = initialized_handler();
        let result = handler.handle_tools_list().unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 13);
        assert_eq!(tools[0]["name"], "check_auth");
        for tool in tools {
            assert!(tool["inputSchema"].is_object());
            assert!(tool["description"].is_string());
        }
    }

    #[tokio::test]
    async fn test_tools_call_not_initialized() {
        let handler = create_handler();
        let result = handler.handle_tools_call(call("get_status", json!({}))).await;
        assert!(matches!(result.unwrap_err(), McpError::NotInitialized));
    }

    #[tokio::test]
    async fn test_tools_call_get_status() {
        let handler = initialized_handler();
        let result = handler
            .handle_tools_call(CallToolParams {
                name: "get_status".into(),
                arguments: None,
            })
            .await
            .unwrap();

        let content = result["content"].as_array().unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0]["type"], "text");
        let body: Value = serde_json::from_str(content[0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(body, json!({"status": "not_tracking"}));
        assert!(result.get("isError").is_none());
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let handler = initialized_handler();
        let err = handler
            .handle_tools_call(call("delete_project", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), -32000);
    }

    #[tokio::test]
    async fn test_schema_violation_is_invalid_params() {
        let handler = initialized_handler();

        let err = handler
            .handle_tools_call(call("list_projects", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), -32602);
        assert!(err.to_string().contains("organization_id"), "{err}");

        let err = handler
            .handle_tools_call(call(
                "recommend_lowest_emission_experiment",
                json!({"project_id": "p-1", "min_accuracy": "92%"}),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams { .. }));

        let err = handler
            .handle_tools_call(call("start_tracking", json!({"measure_power_secs": 0})))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn test_tool_failure_is_error_content() {
        let handler = initialized_handler();
        let result = handler
            .handle_tools_call(call("stop_tracking", json!({})))
            .await
            .unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error: "));
        assert!(text.contains("No active tracking session."));
    }

    #[tokio::test]
    async fn test_route_ping_and_unknown_method() {
        let mut handler = create_handler();
        assert_eq!(handler.route("ping", Value::Null).await.unwrap(), json!({}));

        let err = handler.route("resources/list", Value::Null).await.unwrap_err();
        assert!(matches!(err, McpError::MethodNotFound { .. }));
    }

    #[tokio::test]
    async fn test_route_bad_call_params() {
        let mut handler = initialized_handler();
        let err = handler
            .route("tools/call", json!({"arguments": {}}))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), -32602);
    }
}
