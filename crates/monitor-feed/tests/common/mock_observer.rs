//! Mock block observer for integration tests.
//!
//! Accepts WebSocket connections and answers each text request with the next
//! scripted reply. Once the script runs out every request gets an empty
//! block. Received requests and close frames are recorded.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// One scripted answer to a block request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Send this JSON as a text frame.
    Block(String),
    /// Send bytes that are not JSON.
    Garbage,
    /// Read the request, send nothing.
    Silent,
}

/// Observer state shared with connection handlers.
#[derive(Default)]
struct Shared {
    script: VecDeque<Reply>,
    requests: Vec<String>,
    close_frames: u32,
}

/// A mock observer server.
pub struct MockObserver {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    shared: Arc<Mutex<Shared>>,
}

impl MockObserver {
    /// Start on an available port with the given reply script.
    pub async fn start(script: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = Arc::new(Mutex::new(Shared {
            script: script.into(),
            ..Default::default()
        }));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let shared_clone = shared.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        tokio::spawn(handle_connection(stream, shared_clone.clone()));
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            shared,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Requests received so far.
    pub async fn requests(&self) -> Vec<String> {
        self.shared.lock().await.requests.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.shared.lock().await.requests.len()
    }

    pub async fn close_frames(&self) -> u32 {
        self.shared.lock().await.close_frames
    }

    /// Append replies to the script.
    pub async fn push(&self, replies: impl IntoIterator<Item = Reply>) {
        self.shared.lock().await.script.extend(replies);
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(stream: TcpStream, shared: Arc<Mutex<Shared>>) {
    let mut ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    while let Some(msg) = ws.next().await {
        let reply = match msg {
            Ok(Message::Text(text)) => {
                let mut state = shared.lock().await;
                state.requests.push(text);
                state
                    .script
                    .pop_front()
                    .unwrap_or_else(|| Reply::Block("{}".to_string()))
            }
            Ok(Message::Close(_)) => {
                shared.lock().await.close_frames += 1;
                break;
            }
            Ok(_) => continue,
            Err(_) => break,
        };

        let sent = match reply {
            Reply::Block(json) => ws.send(Message::Text(json)).await,
            Reply::Garbage => ws.send(Message::Binary(b"\x00not a block".to_vec())).await,
            Reply::Silent => Ok(()),
        };
        if sent.is_err() {
            break;
        }
    }
}

/// A block carrying an oracle vote and a supply table.
pub fn vote_block(height: u64, rates: &str, supply: &[(&str, u64)]) -> String {
    serde_json::json!({
        "chain_id": "columbus-4",
        "type": "new_block",
        "data": {
            "txs": [{
                "height": height.to_string(),
                "logs": [{
                    "events": [{
                        "type": "aggregate_vote",
                        "attributes": [
                            {"key": "voter", "value": "terravaloper1test"},
                            {"key": "exchange_rates", "value": rates}
                        ]
                    }]
                }]
            }],
            "supply": supply_json(supply)
        }
    })
    .to_string()
}

/// A block with supply but no oracle vote.
pub fn supply_block(height: u64, supply: &[(&str, u64)]) -> String {
    serde_json::json!({
        "chain_id": "columbus-4",
        "type": "new_block",
        "data": {
            "txs": [{"height": height.to_string(), "logs": []}],
            "supply": supply_json(supply)
        }
    })
    .to_string()
}

fn supply_json(supply: &[(&str, u64)]) -> serde_json::Value {
    supply
        .iter()
        .map(|(denom, amount)| serde_json::json!({"denom": denom, "amount": amount.to_string()}))
        .collect()
}
