//! Teradata Query Service client
//!
//! High-level client for submitting SQL through the Query Service REST
//! gateway. Keeps one lazily-created session per client and transparently
//! reconnects once when the gateway reports the session expired.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use crate::config::DatabaseUri;
use crate::error::{DatabaseError, Result, ServerError};
use crate::td::types::QueryResult;

/// Response format requested from the gateway: rows as JSON objects
const RESULT_FORMAT: &str = "OBJECT";

/// Request body for a query submission
#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<u64>,
}

/// Response body of a session creation
#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(rename = "sessionId")]
    session_id: u64,
}

/// Client for the Teradata Query Service REST gateway
pub struct TdClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// Connection parameters from `DATABASE_URI`
    uri: DatabaseUri,

    /// Gateway base URL, derived from the URI by default
    gateway_url: String,

    /// Cached gateway session, created on first use
    session: Mutex<Option<u64>>,
}

impl TdClient {
    /// Create a new client
    pub fn new(uri: DatabaseUri) -> Self {
        let gateway_url = uri.gateway_url();
        Self::with_gateway_url(uri, gateway_url)
    }

    /// Create a client against an explicit gateway base URL
    pub fn with_gateway_url(uri: DatabaseUri, gateway_url: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            uri,
            gateway_url,
            session: Mutex::new(None),
        }
    }

    /// Base URL for query submissions
    fn queries_url(&self) -> String {
        format!("{}/systems/{}/queries", self.gateway_url, self.uri.system_name())
    }

    /// Base URL for session management
    fn sessions_url(&self) -> String {
        format!("{}/systems/{}/sessions", self.gateway_url, self.uri.system_name())
    }

    /// Create a gateway session
    async fn create_session(&self) -> Result<u64> {
        let response = self
            .http_client
            .post(self.sessions_url())
            .basic_auth(&self.uri.user, Some(&self.uri.password))
            .json(&json!({"auto_commit": true}))
            .send()
            .await?;

        if response.status().is_success() {
            let session: SessionResponse = response.json().await?;
            tracing::info!("Established Teradata session {}", session.session_id);
            Ok(session.session_id)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(ServerError::Database(DatabaseError::SessionFailed {
                message: format!("({}) {}", status, text),
            }))
        }
    }

    /// Submit one statement and return its parsed result
    ///
    /// An expired session is dropped, re-created once, and the statement
    /// retried before the error is propagated.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        let mut session = self.session.lock().await;

        let session_id = match *session {
            Some(id) => id,
            None => {
                let id = self.create_session().await?;
                *session = Some(id);
                id
            }
        };

        match self.submit(sql, session_id).await {
            Err(ServerError::Database(DatabaseError::QueryFailed { status, .. }))
                if status == 401 || status == 419 =>
            {
                tracing::warn!("Teradata session {} expired, reconnecting", session_id);
                *session = None;
                let id = self.create_session().await.map_err(|e| {
                    ServerError::Database(DatabaseError::ReconnectFailed {
                        message: e.to_string(),
                    })
                })?;
                *session = Some(id);
                self.submit(sql, id).await
            }
            other => other,
        }
    }

    /// Submit one statement on a given session
    async fn submit(&self, sql: &str, session_id: u64) -> Result<QueryResult> {
        let request = QueryRequest {
            query: sql,
            format: RESULT_FORMAT,
            session: Some(session_id),
        };

        let response = self
            .http_client
            .post(self.queries_url())
            .basic_auth(&self.uri.user, Some(&self.uri.password))
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(ServerError::Database(DatabaseError::QueryFailed {
                status: status.as_u16(),
                message: text,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn client() -> TdClient {
        TdClient::new(DatabaseUri::parse("teradata://u:p@gw.example.com:1443/prod").unwrap())
    }

    /// Minimal gateway stub: answers each request with the next scripted
    /// status/body pair, across connections.
    async fn spawn_gateway(responses: Vec<(u16, &'static str)>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let script = Arc::new(Mutex::new(VecDeque::from(responses)));

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let script = script.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    while read_request(&mut socket, &mut buf).await {
                        let Some((status, body)) = script.lock().await.pop_front() else {
                            return;
                        };
                        let reason = match status {
                            200 => "OK",
                            401 => "Unauthorized",
                            419 => "Session Expired",
                            _ => "Internal Server Error",
                        };
                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\n\
                             Content-Length: {}\r\n\r\n{}",
                            status,
                            reason,
                            body.len(),
                            body
                        );
                        if socket.write_all(response.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });

        addr
    }

    /// Consume one HTTP request (headers plus content-length body)
    async fn read_request(socket: &mut TcpStream, buf: &mut Vec<u8>) -> bool {
        let mut tmp = [0u8; 1024];
        loop {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
                let body_len = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= pos + 4 + body_len {
                    buf.drain(..pos + 4 + body_len);
                    return true;
                }
            }
            match socket.read(&mut tmp).await {
                Ok(0) | Err(_) => return false,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
            }
        }
    }

    fn stub_client(addr: SocketAddr) -> TdClient {
        TdClient::with_gateway_url(
            DatabaseUri::parse("teradata://u:p@host/prod").unwrap(),
            format!("http://{}", addr),
        )
    }

    #[tokio::test]
    async fn test_expired_session_reconnects_once() {
        let addr = spawn_gateway(vec![
            (200, r#"{"sessionId": 1}"#),
            (401, "session expired"),
            (200, r#"{"sessionId": 2}"#),
            (200, r#"{"results": [{"data": [{"n": 1}], "rowCount": 1}]}"#),
        ])
        .await;
        let client = stub_client(addr);

        let result = client.execute("SELECT 1").await.unwrap();
        assert_eq!(result.rows().len(), 1);
        assert_eq!(*client.session.lock().await, Some(2));
    }

    #[tokio::test]
    async fn test_fresh_session_failure_is_not_retried() {
        let addr = spawn_gateway(vec![
            (200, r#"{"sessionId": 1}"#),
            (500, "syntax error"),
        ])
        .await;
        let client = stub_client(addr);

        let err = client.execute("SELEKT 1").await.unwrap_err();
        assert!(matches!(
            err,
            ServerError::Database(DatabaseError::QueryFailed { status: 500, .. })
        ));
        // The session is still considered good.
        assert_eq!(*client.session.lock().await, Some(1));
    }

    #[tokio::test]
    async fn test_reconnect_failure_is_reported() {
        let addr = spawn_gateway(vec![
            (200, r#"{"sessionId": 1}"#),
            (419, "session expired"),
            (500, "gateway down"),
        ])
        .await;
        let client = stub_client(addr);

        let err = client.execute("SELECT 1").await.unwrap_err();
        assert!(matches!(
            err,
            ServerError::Database(DatabaseError::ReconnectFailed { .. })
        ));
        assert!(client.session.lock().await.is_none());
    }

    #[test]
    fn test_urls_include_system_name() {
        let c = client();
        assert_eq!(
            c.queries_url(),
            "https://gw.example.com:1443/systems/prod/queries"
        );
        assert_eq!(
            c.sessions_url(),
            "https://gw.example.com:1443/systems/prod/sessions"
        );
    }

    #[test]
    fn test_query_request_omits_absent_session() {
        let request = QueryRequest {
            query: "SELECT 1",
            format: RESULT_FORMAT,
            session: None,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["format"], "OBJECT");
        assert!(body.get("session").is_none());
    }
}
