//! Streamable HTTP transport
//!
//! Serves the MCP protocol over HTTP: JSON-RPC requests arrive as POST
//! bodies on the configured path, notifications are acknowledged with
//! `202 Accepted` and an empty body. A `/health` route reports liveness.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;

use crate::error::Result;
use crate::mcp::server::McpServer;

/// Build the router for the streamable HTTP transport
pub fn router(server: Arc<McpServer>, mcp_path: &str) -> Router {
    Router::new()
        .route(mcp_path, post(handle_mcp_post))
        .route("/health", get(handle_health))
        .with_state(server)
}

/// Serve the MCP protocol over HTTP until a shutdown signal arrives
pub async fn serve(server: Arc<McpServer>, addr: SocketAddr, mcp_path: &str) -> Result<()> {
    let app = router(server, mcp_path);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("MCP server listening on http://{}{}", addr, mcp_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn handle_mcp_post(State(server): State<Arc<McpServer>>, body: String) -> Response {
    match server.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        // Notification: acknowledge with no body.
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn handle_health(State(server): State<Arc<McpServer>>) -> Response {
    Json(json!({
        "status": "ok",
        "initialized": server.is_initialized(),
    }))
    .into_response()
}

/// Resolve when SIGINT or SIGTERM arrives; a second signal exits immediately
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

    tokio::select! {
        _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down"),
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
    }

    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
        tracing::warn!("Second signal received, exiting immediately");
        std::process::exit(130);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseUri;
    use crate::td::client::TdClient;
    use crate::td::custom::CustomDefinitions;
    use tower::ServiceExt;

    fn app() -> Router {
        let uri = DatabaseUri::parse("teradata://u:p@host/db").unwrap();
        let server = Arc::new(McpServer::new(
            Arc::new(TdClient::new(uri)),
            CustomDefinitions::default(),
        ));
        router(server, "/mcp/")
    }

    fn post_request(body: &str) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri("/mcp/")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_request_returns_response() {
        let response = app()
            .oneshot(post_request(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["result"]["serverInfo"]["name"], "teradata-mcp-server");
    }

    #[tokio::test]
    async fn test_notification_returns_accepted_empty() {
        let response = app()
            .oneshot(post_request(
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_health() {
        let request = axum::http::Request::builder()
            .method("GET")
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["initialized"], false);
    }
}
