//! HTTP + WebSocket front for the frame channel.
//!
//! - `GET /`       configured HTML entry point (404 when none)
//! - `GET /health` liveness probe
//! - `GET /ws`     frame channel; one message is fully processed before the
//!                 next one from the same socket is read

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::channel::FrameHandler;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub addr: String,
    pub index_path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5050".to_string(),
            index_path: None,
        }
    }
}

#[derive(Debug)]
pub struct ApiHandle {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<Result<()>>,
}

impl ApiHandle {
    /// Stop accepting connections and wait for the server task.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.join
            .await
            .map_err(|_| anyhow!("api server task panicked"))?
    }
}

#[derive(Clone)]
struct AppState {
    handler: Arc<FrameHandler>,
    index_path: Option<Arc<PathBuf>>,
}

pub struct ApiServer {
    cfg: ApiConfig,
    handler: Arc<FrameHandler>,
}

impl ApiServer {
    pub fn new(cfg: ApiConfig, handler: Arc<FrameHandler>) -> Self {
        Self { cfg, handler }
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            handler: self.handler.clone(),
            index_path: self.cfg.index_path.clone().map(Arc::new),
        };
        Router::new()
            .route("/", get(index))
            .route("/health", get(health))
            .route("/ws", get(frame_channel))
            .with_state(state)
    }

    /// Bind and serve on a background task.
    pub async fn spawn(self) -> Result<ApiHandle> {
        let listener = tokio::net::TcpListener::bind(&self.cfg.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.cfg.addr))?;
        let addr = listener.local_addr()?;
        let app = self.router();

        let (tx, rx) = oneshot::channel::<()>();
        let join = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await
                .context("api server stopped")
        });

        Ok(ApiHandle {
            addr,
            shutdown: Some(tx),
            join,
        })
    }
}

async fn index(State(state): State<AppState>) -> Response {
    let Some(path) = state.index_path else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match tokio::fs::read_to_string(path.as_path()).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            log::warn!("cannot serve {}: {}", path.display(), err);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn frame_channel(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| frame_session(socket, state.handler))
}

async fn frame_session(mut socket: WebSocket, handler: Arc<FrameHandler>) {
    log::info!("frame channel opened");
    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(err) => {
                log::debug!("frame channel receive error: {}", err);
                break;
            }
        };
        let handler = handler.clone();
        let reply = match msg {
            Message::Text(text) => {
                tokio::task::spawn_blocking(move || handler.handle_text(&text)).await
            }
            Message::Binary(bytes) => {
                tokio::task::spawn_blocking(move || handler.handle_binary(&bytes)).await
            }
            Message::Close(_) => break,
            _ => continue,
        };
        match reply {
            Ok(Some(json)) => {
                if socket.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => log::error!("dropping frame: worker failed: {}", err),
        }
    }
    log::info!("frame channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use crate::config::ServerConfig;
    use crate::runtime::build_handler;

    async fn http_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    fn handler() -> Arc<FrameHandler> {
        let cfg = ServerConfig::load_from(None).unwrap();
        Arc::new(build_handler(&cfg, None).unwrap())
    }

    #[tokio::test]
    async fn health_and_missing_index() {
        let cfg = ApiConfig {
            addr: "127.0.0.1:0".to_string(),
            index_path: None,
        };
        let handle = ApiServer::new(cfg, handler()).spawn().await.unwrap();

        let health = http_get(handle.addr, "/health").await;
        assert!(health.starts_with("HTTP/1.1 200"));
        assert!(health.contains(r#"{"status":"ok"}"#));

        let index = http_get(handle.addr, "/").await;
        assert!(index.starts_with("HTTP/1.1 404"));

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn serves_configured_index() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("index.html");
        std::fs::write(&page, "<html>roadsight</html>").unwrap();
        let cfg = ApiConfig {
            addr: "127.0.0.1:0".to_string(),
            index_path: Some(page),
        };
        let handle = ApiServer::new(cfg, handler()).spawn().await.unwrap();

        let index = http_get(handle.addr, "/").await;
        assert!(index.starts_with("HTTP/1.1 200"));
        assert!(index.contains("<html>roadsight</html>"));

        handle.stop().await.unwrap();
    }
}
