//! Tool-facing types shared by the tool registry and the MCP server.

use serde::{Deserialize, Serialize};

/// A definition describing a tool to an MCP client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The risk level of a tool operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Pure computation or local state reads (level 0).
    ReadOnly = 0,
    /// Local state changes such as starting a tracking session (level 1).
    Write = 1,
    /// Reads from the remote API (level 2).
    Network = 2,
    /// Creates records on the remote API (level 3).
    RemoteWrite = 3,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::ReadOnly => write!(f, "read-only"),
            RiskLevel::Write => write!(f, "write"),
            RiskLevel::Network => write!(f, "network"),
            RiskLevel::RemoteWrite => write!(f, "remote-write"),
        }
    }
}

/// Output produced by a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    /// Create a simple text output.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error output.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
        }
    }

    /// Pretty-printed JSON output.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_string_pretty(value).map(Self::text)
    }
}
