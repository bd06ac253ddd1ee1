//! MCP Server implementation
//!
//! Dispatches JSON-RPC messages to the tool and prompt handlers. The same
//! server instance backs both the stdio and streamable HTTP transports.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::Result;
use crate::mcp::prompts::PromptHandler;
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;
use crate::td::client::TdClient;
use crate::td::custom::CustomDefinitions;
use crate::td::rag::RagState;

const SERVER_NAME: &str = "teradata-mcp-server";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server for Teradata
pub struct McpServer {
    tool_handler: ToolHandler,
    prompt_handler: PromptHandler,

    /// Set once the client has sent `notifications/initialized`
    initialized: AtomicBool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(client: Arc<TdClient>, custom: CustomDefinitions) -> Self {
        let rag_state = Arc::new(RagState::new());
        let tool_handler = ToolHandler::new(client, rag_state, custom.tools);
        let prompt_handler = PromptHandler::new(custom.prompts);

        Self {
            tool_handler,
            prompt_handler,
            initialized: AtomicBool::new(false),
        }
    }

    /// Whether the client has completed the initialize handshake
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Run the server on stdio, one JSON-RPC message per line
    ///
    /// Responses go to stdout; all logging goes to stderr.
    pub async fn run_stdio(self: Arc<Self>) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(stdin).lines();

        tracing::info!("MCP server listening on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(&line).await {
                let response_str = serde_json::to_string(&response)?;
                stdout.write_all(response_str.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle an incoming JSON-RPC message
    ///
    /// Returns `None` for notifications, which expect no response.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    RequestId::Number(0),
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        // Notifications never get a response, whatever the method.
        if request.is_notification() {
            match request.method.as_str() {
                methods::INITIALIZED => self.initialized.store(true, Ordering::SeqCst),
                other => tracing::debug!(method = %other, "Ignoring notification"),
            }
            return None;
        }

        let id = request.id_or_default();

        match request.method.as_str() {
            methods::INITIALIZE => {
                tracing::debug!("Client initializing");
                Some(JsonRpcResponse::success(id, self.initialize_result()))
            }
            methods::PING => Some(JsonRpcResponse::success(id, serde_json::json!({}))),
            methods::LIST_TOOLS => {
                let result = ListToolsResult {
                    tools: self.tool_handler.list_tools(),
                };
                Some(self.to_response(id, result))
            }
            methods::CALL_TOOL => Some(JsonRpcResponse::success(
                id,
                self.handle_call_tool(&request).await,
            )),
            methods::LIST_PROMPTS => {
                let result = ListPromptsResult {
                    prompts: self.prompt_handler.list_prompts(),
                };
                Some(self.to_response(id, result))
            }
            methods::GET_PROMPT => Some(self.handle_get_prompt(&request)),
            _ => Some(JsonRpcResponse::error(
                id,
                JsonRpcError::method_not_found(&request.method),
            )),
        }
    }

    fn initialize_result(&self) -> Value {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
                prompts: Some(PromptsCapability::default()),
            },
        };
        serde_json::to_value(result).unwrap_or(Value::Null)
    }

    fn to_response(&self, id: RequestId, result: impl serde::Serialize) -> JsonRpcResponse {
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
        }
    }

    /// Handle a tools/call request
    ///
    /// Tool failures, including database errors, are reported inside the
    /// result with `isError`, never as protocol errors.
    async fn handle_call_tool(&self, request: &JsonRpcRequest) -> Value {
        let params: CallToolParams = match request.params.as_ref() {
            Some(p) => match serde_json::from_value(p.clone()) {
                Ok(params) => params,
                Err(e) => {
                    return tool_result_value(CallToolResult::error(format!(
                        "Invalid tool parameters: {}",
                        e
                    )));
                }
            },
            None => {
                return tool_result_value(CallToolResult::error("Missing tool parameters"));
            }
        };

        tracing::info!(tool = %params.name, "Calling tool");
        let result = self
            .tool_handler
            .call_tool(&params.name, params.arguments)
            .await;
        if result.is_error {
            tracing::warn!(tool = %params.name, "Tool returned an error");
        }
        tool_result_value(result)
    }

    /// Handle a prompts/get request
    fn handle_get_prompt(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id_or_default();
        let params: GetPromptParams = match request.params.as_ref() {
            Some(p) => match serde_json::from_value(p.clone()) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, JsonRpcError::invalid_params(e.to_string()));
                }
            },
            None => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("Missing prompt parameters"),
                );
            }
        };

        match self
            .prompt_handler
            .get_prompt(&params.name, params.arguments.as_object())
        {
            Ok(result) => self.to_response(id, result),
            Err(e) => JsonRpcResponse::error(id, JsonRpcError::invalid_params(e.to_string())),
        }
    }
}

fn tool_result_value(result: CallToolResult) -> Value {
    serde_json::to_value(result).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseUri;

    fn server() -> Arc<McpServer> {
        let uri = DatabaseUri::parse("teradata://u:p@host/db").unwrap();
        Arc::new(McpServer::new(
            Arc::new(TdClient::new(uri)),
            CustomDefinitions::default(),
        ))
    }

    #[tokio::test]
    async fn test_initialize_handshake() {
        let server = server();
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_VERSION);
        assert_eq!(result["serverInfo"]["name"], "teradata-mcp-server");
        assert!(result["capabilities"]["prompts"].is_object());

        assert!(!server.is_initialized());
        let none = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(none.is_none());
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_request_without_id_gets_no_response() {
        let server = server();
        let none = server
            .handle_message(
                r#"{"jsonrpc":"2.0","method":"tools/call","params":{"name":"base_databaseList"}}"#,
            )
            .await;
        assert!(none.is_none());

        let none = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"nonsense/method"}"#)
            .await;
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = server().handle_message("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_ping() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":"p1","method":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(response.id, RequestId::String("p1".to_string()));
        assert!(response.result.is_some());
    }

    #[tokio::test]
    async fn test_list_tools() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#)
            .await
            .unwrap();
        let tools = response.result.unwrap()["tools"].clone();
        assert!(tools.as_array().unwrap().len() >= 37);
    }

    #[tokio::test]
    async fn test_call_unknown_tool_is_tool_error() {
        let response = server()
            .handle_message(
                r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"bogus"}}"#,
            )
            .await
            .unwrap();
        // Tool failures surface in the result, not as protocol errors.
        assert!(response.error.is_none());
        assert_eq!(response.result.unwrap()["isError"], true);
    }

    #[tokio::test]
    async fn test_get_prompt_missing_argument() {
        let response = server()
            .handle_message(
                r#"{"jsonrpc":"2.0","id":5,"method":"prompts/get","params":{"name":"base_query"}}"#,
            )
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_list_prompts() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":6,"method":"prompts/list"}"#)
            .await
            .unwrap();
        let prompts = response.result.unwrap()["prompts"].clone();
        assert_eq!(prompts.as_array().unwrap().len(), 10);
    }
}
