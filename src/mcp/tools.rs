//! Tool definitions and transport-independent request dispatch.
//!
//! [`ToolHandler`] answers `initialize`, `ping`, `tools/list` and
//! `tools/call`. Lifecycle gating is left to the transport: the stdio server
//! enforces the initialise handshake, the HTTP transport is stateless.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::clinic::{PatientCreationRequest, PatientForwarder};
use crate::mcp::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION, SERVER_NAME,
};

/// Name of the patient creation tool.
pub const CREATE_PATIENT_TOOL: &str = "create_patient";

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolCapabilities>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(ToolCapabilities::default()),
        }
    }
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    pub is_error: bool,
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Returns the text of the first content item.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| match c {
            ToolContent::Text { text } => text.as_str(),
        })
    }
}

/// Dispatches MCP requests to the clinic tools.
#[derive(Debug, Clone)]
pub struct ToolHandler {
    forwarder: PatientForwarder,
}

impl ToolHandler {
    /// Creates a handler around a patient forwarder.
    #[must_use]
    pub const fn new(forwarder: PatientForwarder) -> Self {
        Self { forwarder }
    }

    /// Handles the initialize request.
    ///
    /// # Errors
    ///
    /// Returns an invalid params error if the parameters are missing or malformed.
    pub fn handle_initialize(req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        let params: InitializeParams = req.parse_params("initialize")?;

        info!(
            client = params.client_info.as_ref().map_or("unknown", |c| c.name.as_str()),
            requested_version = %params.protocol_version,
            "Client initialising"
        );

        let result = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the ping request.
    #[must_use]
    pub fn handle_ping(req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), json!({}))
    }

    /// Handles the tools/list request.
    #[must_use]
    pub fn handle_tools_list(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), json!({ "tools": self.tool_definitions() }))
    }

    /// Handles the tools/call request.
    ///
    /// # Errors
    ///
    /// Returns an invalid params error for malformed call parameters. Tool
    /// failures are reported inside the result, never as protocol errors.
    pub async fn handle_tools_call(
        &self,
        req: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        let params: ToolCallParams = req.parse_params("tool call")?;

        let result = self.call_tool(&params.name, &params.arguments).await;

        let result_value = serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcError::internal_error(
                req.id.clone(),
                "Internal error: failed to serialise result",
            )
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), result_value))
    }

    /// Runs a tool by name.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> ToolCallResult {
        match name {
            CREATE_PATIENT_TOOL => self.call_create_patient(arguments).await,
            _ => ToolCallResult::error(format!("Unknown tool: {name}")),
        }
    }

    /// Creates a patient in the clinic system.
    async fn call_create_patient(&self, arguments: &Value) -> ToolCallResult {
        let request =
            match PatientCreationRequest::from_arguments(arguments, self.forwarder.secret_source()) {
                Ok(request) => request,
                Err(e) => return ToolCallResult::error(e),
            };

        debug!(
            has_email = request.email.is_some(),
            has_date_of_birth = request.date_of_birth.is_some(),
            "Forwarding create_patient"
        );

        let outcome = self.forwarder.forward(&request).await;
        if outcome.is_success() {
            ToolCallResult::text(outcome.to_string())
        } else {
            ToolCallResult::error(outcome.to_string())
        }
    }

    /// Returns the list of available tools.
    ///
    /// `secretKey` is only part of the schema when callers must provide it.
    #[must_use]
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let caller_secret = self.forwarder.secret_source().requires_caller_secret();

        let mut properties = json!({
            "name": {
                "type": "string",
                "description": "The name of the patient."
            },
            "phone": {
                "type": "string",
                "description": "The phone number of the patient."
            },
            "email": {
                "type": "string",
                "description": "Optional: the email of the patient."
            },
            "dateOfBirth": {
                "type": "string",
                "description": "Optional: the date of birth of the patient."
            }
        });
        let mut required = vec!["name", "phone"];

        if caller_secret {
            properties["secretKey"] = json!({
                "type": "string",
                "description": "The secret key for authentication."
            });
            required.push("secretKey");
        }

        vec![ToolDefinition {
            name: CREATE_PATIENT_TOOL.to_string(),
            description: Some(
                "Create a new patient in the clinic system. \
                 Returns the clinic system's response text on success, \
                 or the status code and error text on failure."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": required
            }),
        }]
    }
}
