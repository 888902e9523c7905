//! Persistent TCP transport with line-delimited JSON framing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use vanguard_core::{EntityId, Faction, MoveKind, MoveOrder, ObservedActor};

use super::wire::{self, FactionLabels, Request, Response};
use super::{Transport, TransportError};

/// Connection parameters for the engine socket.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Engine endpoint; the engine only listens locally.
    pub endpoint: String,
    /// Per-request response deadline.
    pub request_timeout: Duration,
    /// Deadline for the TCP connect itself.
    pub connect_timeout: Duration,
    /// `language` field sent with every request; controls which display
    /// names the engine reports (the catalog normalizes either way).
    pub language: String,
    pub faction_labels: FactionLabels,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:7445".to_string(),
            request_timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(2),
            language: "en".to_string(),
            faction_labels: FactionLabels::default(),
        }
    }
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// Production transport. One connection at a time, requests serialized
/// through a mutex so responses pair with the request that produced them.
pub struct TcpTransport {
    config: TransportConfig,
    connection: Mutex<Option<Connection>>,
    connected: AtomicBool,
    next_request_id: AtomicU64,
}

impl TcpTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            connection: Mutex::new(None),
            connected: AtomicBool::new(false),
            next_request_id: AtomicU64::new(1),
        }
    }

    /// Send one request and read one response line. On any I/O problem
    /// the connection is torn down so the connection worker rebuilds it;
    /// a timed-out query also drops the connection because the stream may
    /// still carry the late response and would desynchronize framing.
    async fn request(&self, command: &'static str, params: Value) -> Result<Response, TransportError> {
        let request = Request {
            api_version: wire::API_VERSION,
            request_id: self.next_request_id.fetch_add(1, Ordering::Relaxed),
            command,
            params,
            language: self.config.language.clone(),
        };
        let mut line = serde_json::to_string(&request)
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        line.push('\n');

        let mut guard = self.connection.lock().await;
        let conn = guard.as_mut().ok_or(TransportError::ConnectionLost)?;

        let result = self.exchange(conn, &line).await;
        if result.is_err() {
            *guard = None;
            self.connected.store(false, Ordering::Release);
            warn!(target: "vanguard::transport", command, "request failed, connection dropped");
        }
        result
    }

    async fn exchange(&self, conn: &mut Connection, line: &str) -> Result<Response, TransportError> {
        conn.writer.write_all(line.as_bytes()).await?;
        conn.writer.flush().await?;

        let mut response_line = String::new();
        let read = timeout(
            self.config.request_timeout,
            conn.reader.read_line(&mut response_line),
        )
        .await
        .map_err(|_| TransportError::Timeout)??;
        if read == 0 {
            return Err(TransportError::ConnectionLost);
        }

        let response: Response = serde_json::from_str(response_line.trim())
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        if let Some(error) = response.error {
            return Err(TransportError::Protocol(error));
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn ensure_connected(&self) -> Result<(), TransportError> {
        let mut guard = self.connection.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        let stream = timeout(
            self.config.connect_timeout,
            TcpStream::connect(&self.config.endpoint),
        )
        .await
        .map_err(|_| TransportError::Timeout)??;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();
        *guard = Some(Connection {
            reader: BufReader::new(read_half),
            writer: write_half,
        });
        self.connected.store(true, Ordering::Release);
        info!(target: "vanguard::transport", endpoint = %self.config.endpoint, "engine connection established");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn query_actors(&self, faction: Faction) -> Result<Vec<ObservedActor>, TransportError> {
        let label = self.config.faction_labels.label(faction).to_string();
        let response = self
            .request("query_actor", wire::query_params(&label))
            .await?;
        let records = response.data.map(|d| d.actors).unwrap_or_default();
        Ok(records
            .into_iter()
            .filter_map(|r| r.into_observed(faction))
            .collect())
    }

    async fn attack(&self, attacker: EntityId, target: EntityId) -> Result<(), TransportError> {
        self.request("attack", wire::attack_params(attacker, target))
            .await?;
        debug!(target: "vanguard::transport", %attacker, %target, "attack dispatched");
        Ok(())
    }

    async fn move_actor(&self, order: &MoveOrder) -> Result<(), TransportError> {
        // Field micro steps engage opportunistically on the way; a
        // retreat is a plain move so nothing slows the disengage.
        let attack_move = order.kind == MoveKind::Field;
        self.request(
            "move_actor",
            wire::move_params(
                order.actor,
                order.direction.as_str(),
                order.distance,
                order.assault,
                attack_move,
            ),
        )
        .await?;
        debug!(
            target: "vanguard::transport",
            actor = %order.actor,
            direction = %order.direction,
            distance = order.distance,
            "move dispatched"
        );
        Ok(())
    }
}
