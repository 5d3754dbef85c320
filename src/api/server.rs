//! TCP listener for the query API.
//!
//! Each accepted connection gets its own task, reads one request, writes one
//! response and is closed. A semaphore bounds how many connections are in
//! flight; further connections wait in the accept queue.

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use super::http::{HttpRequest, HttpResponse};
use super::responder::ApiResponder;
use crate::config::ServerConfig;

/// Largest request head we read before giving up on finding its end.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Bind to the configured address and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, responder: ApiResponder) -> Result<()> {
    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "API listening at http://{bind_addr}");

    serve_listener(listener, responder, config.max_connections, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        tracing::info!("shutting down API server");
    })
    .await
}

/// Accept loop over an already-bound listener, stopping when `shutdown` resolves.
pub async fn serve_listener(
    listener: TcpListener,
    responder: ApiResponder,
    max_connections: usize,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let permits = Arc::new(Semaphore::new(max_connections.max(1)));
    tokio::pin!(shutdown);

    loop {
        let permit = tokio::select! {
            _ = &mut shutdown => break,
            permit = Arc::clone(&permits).acquire_owned() => permit.context("connection semaphore closed")?,
        };

        let (stream, peer) = tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    continue;
                }
            },
        };

        let responder = responder.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, responder).await {
                tracing::debug!(%peer, error = %e, "connection error");
            }
            drop(permit);
        });
    }

    Ok(())
}

async fn handle_connection(mut stream: TcpStream, responder: ApiResponder) -> Result<()> {
    let raw = read_request(&mut stream).await?;

    let response = match HttpRequest::parse(&raw) {
        Some(request) => {
            tracing::debug!(method = %request.method, path = %request.path, "request");
            // Store and probe calls block; keep them off the reactor.
            tokio::task::spawn_blocking(move || responder.respond(&request))
                .await
                .unwrap_or_else(|e| HttpResponse::error(500, "internal_error", e.to_string()))
        }
        None => HttpResponse::error(400, "bad_request", "Malformed HTTP request."),
    };

    stream.write_all(&response.serialize()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Read until the end of the request head, EOF, or the size cap.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() >= MAX_REQUEST_BYTES || buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    buf.truncate(MAX_REQUEST_BYTES);
    Ok(buf)
}
