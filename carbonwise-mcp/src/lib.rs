//! # Carbonwise MCP
//!
//! Model Context Protocol server for the Carbonwise emissions tools.
//!
//! Tools are exposed over JSON-RPC 2.0, normally on stdio, so an MCP host
//! (an IDE or a desktop assistant) can launch `carbonwise serve` as a child
//! process and call them.
//!
//! ```text
//! Client <-> Transport (stdio/channel) <-> McpServer <-> RequestHandler <-> ToolRegistry
//! ```

pub mod error;
pub mod handlers;
pub mod protocol;
pub mod transport;

use carbonwise_tools::registry::ToolRegistry;
use error::McpError;
use handlers::RequestHandler;
use protocol::{IncomingMessage, JsonRpcResponse, RequestId};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use transport::Transport;

/// Reads JSON-RPC messages from a transport and answers them.
pub struct McpServer {
    handler: RequestHandler,
}

impl McpServer {
    pub fn new(tool_registry: Arc<ToolRegistry>) -> Self {
        Self {
            handler: RequestHandler::new(tool_registry),
        }
    }

    /// Serve until the transport reaches EOF or fails to read.
    pub async fn run<T: Transport>(&mut self, transport: &mut T) -> Result<(), McpError> {
        info!("MCP server starting");

        loop {
            let message = match transport.read_message().await {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    info!("Transport closed (EOF), shutting down MCP server");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Transport read error");
                    break;
                }
            };

            if message.trim().is_empty() {
                continue;
            }

            debug!(message = %message, "Received MCP message");

            let response = match self.process_message(&message).await {
                Ok(Some(response)) => response,
                Ok(None) => continue,
                Err(e) => {
                    // The id cannot be recovered from a message that failed to parse.
                    warn!(error = %e, "Rejected MCP message");
                    JsonRpcResponse::from_mcp_error(RequestId::Null, e)
                }
            };

            let response_json =
                serde_json::to_string(&response).map_err(|e| McpError::InternalError {
                    message: format!("Failed to serialize response: {}", e),
                })?;
            debug!(response = %response_json, "Sending MCP response");
            transport.write_message(&response_json).await?;
        }

        transport.close().await?;
        info!("MCP server stopped");
        Ok(())
    }

    /// Returns `Some(response)` for requests and `None` for notifications.
    async fn process_message(&mut self, raw: &str) -> Result<Option<JsonRpcResponse>, McpError> {
        let incoming: IncomingMessage =
            serde_json::from_str(raw).map_err(|e| McpError::ParseError {
                message: format!("Invalid JSON-RPC message: {}", e),
            })?;

        if incoming.jsonrpc != "2.0" {
            return Err(McpError::InvalidRequest {
                message: format!("Expected jsonrpc version 2.0, got: {}", incoming.jsonrpc),
            });
        }

        if incoming.is_notification() {
            debug!(method = %incoming.method, "Processing notification");
            if let Err(e) = self.handler.route(&incoming.method, incoming.params).await {
                warn!(method = %incoming.method, error = %e, "Notification handler error");
            }
            return Ok(None);
        }

        let id = incoming.id.unwrap_or(RequestId::Null);
        debug!(method = %incoming.method, "Processing request");
        let response = match self.handler.route(&incoming.method, incoming.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::from_mcp_error(id, e),
        };
        Ok(Some(response))
    }

    pub fn is_initialized(&self) -> bool {
        self.handler.is_initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MCP_PROTOCOL_VERSION;
    use crate::transport::ChannelTransport;
    use carbonwise_core::config::CarbonwiseConfig;
    use carbonwise_tools::{ToolContext, register_builtin_tools};
    use serde_json::{Value, json};

    fn setup_server() -> McpServer {
        let mut registry = ToolRegistry::new();
        register_builtin_tools(&mut registry, ToolContext::new(&CarbonwiseConfig::default()));
        McpServer::new(Arc::new(registry))
    }

    fn init_request(id: i64) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "initialize",
            "params": {
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "test-client", "version": "1.0"}
            }
        })
        .to_string()
    }

    fn request(id: Value, method: &str, params: Value) -> String {
        json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string()
    }

    #[tokio::test]
    async fn test_process_initialize() {
        let mut server = setup_server();
        assert!(!server.is_initialized());

        let resp = server.process_message(&init_request(1)).await.unwrap().unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "carbonwise");
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let mut server = setup_server();
        server.process_message(&init_request(1)).await.unwrap();

        let note = json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string();
        assert!(server.process_message(&note).await.unwrap().is_none());

        // Even a failing notification stays silent.
        let bogus = json!({"jsonrpc": "2.0", "method": "notifications/unknown"}).to_string();
        assert!(server.process_message(&bogus).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_response_echoes_string_id() {
        let mut server = setup_server();
        let resp = server
            .process_message(&request(json!("abc"), "ping", json!({})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resp.id, RequestId::String("abc".into()));
        assert_eq!(resp.result.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_null_id_request_gets_a_response() {
        let mut server = setup_server();
        let resp = server
            .process_message(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
            .await
            .unwrap()
            .expect("a request with a null id must be answered");
        assert_eq!(resp.id, RequestId::Null);
        assert_eq!(resp.result.clone().unwrap(), json!({}));

        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.as_object().unwrap().contains_key("id"));
        assert!(value["id"].is_null());
    }

    #[tokio::test]
    async fn test_tools_list_not_initialized() {
        let mut server = setup_server();
        let resp = server
            .process_message(&request(json!(1), "tools/list", json!({})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resp.error.unwrap().code, -32003);
    }

    #[tokio::test]
    async fn test_process_demo_scenarios_call() {
        let mut server = setup_server();
        server.process_message(&init_request(1)).await.unwrap();

        let resp = server
            .process_message(&request(
                json!(2),
                "tools/call",
                json!({"name": "demo_prompt_scenarios", "arguments": {}}),
            ))
            .await
            .unwrap()
            .unwrap();
        let text = resp.result.unwrap()["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(text.contains("Which model consumes the least"));
    }

    #[tokio::test]
    async fn test_process_unknown_method() {
        let mut server = setup_server();
        server.process_message(&init_request(1)).await.unwrap();

        let resp = server
            .process_message(&request(json!(2), "resources/list", json!({})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resp.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_process_invalid_json() {
        let mut server = setup_server();
        let err = server.process_message("not json").await.unwrap_err();
        assert_eq!(err.error_code(), -32700);
    }

    #[tokio::test]
    async fn test_process_wrong_jsonrpc_version() {
        let mut server = setup_server();
        let req = json!({"jsonrpc": "1.0", "id": 1, "method": "ping"}).to_string();
        let err = server.process_message(&req).await.unwrap_err();
        assert_eq!(err.error_code(), -32600);
    }

    #[tokio::test]
    async fn test_run_answers_garbage_with_null_id() {
        let mut server = setup_server();
        let (mut client, mut server_transport) = ChannelTransport::pair(8);
        let handle = tokio::spawn(async move { server.run(&mut server_transport).await });

        client.write_message("").await.unwrap();
        client.write_message("{oops").await.unwrap();
        let resp: JsonRpcResponse =
            serde_json::from_str(&client.read_message().await.unwrap().unwrap()).unwrap();
        assert_eq!(resp.id, RequestId::Null);
        assert_eq!(resp.error.unwrap().code, -32700);

        drop(client);
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_run_empty_transport() {
        let mut server = setup_server();
        let (client, mut server_transport) = ChannelTransport::pair(1);
        drop(client);
        assert!(server.run(&mut server_transport).await.is_ok());
    }
}
