//! Minecraft Server List Ping.
//!
//! Handshake (next state 1), status request, status response (JSON), then a
//! ping/pong pair to measure latency. Every packet is framed as
//! `VarInt length | VarInt packet id | body`.

use crate::core::config::DEFAULT_PORT;
use crate::core::status::{PlayerCounts, ServerStatus, StatusSource};
use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use hickory_resolver::TokioAsyncResolver;
use serde::Deserialize;
use serde_json::Value;
use std::net::IpAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::Instant;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);
// -1 tells the server we only want status.
const PROTOCOL_VERSION: i32 = -1;
const NEXT_STATE_STATUS: i32 = 1;
const PACKET_STATUS: i32 = 0x00;
const PACKET_PING: i32 = 0x01;
const MAX_PACKET_LEN: usize = 2 * 1024 * 1024;
/// Longest wait for the pong once the status arrived.
const PING_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Invalid status JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not resolve {0}")]
    Resolve(String),
}

pub fn put_varint(buf: &mut BytesMut, value: i32) {
    let mut value = value as u32;
    loop {
        if value & !0x7F == 0 {
            buf.put_u8(value as u8);
            return;
        }
        buf.put_u8((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
}

pub fn get_varint(buf: &mut impl Buf) -> Result<i32, StatusError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        if !buf.has_remaining() {
            return Err(StatusError::Protocol("truncated VarInt".to_string()));
        }
        let byte = buf.get_u8();
        value |= ((byte & 0x7F) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(StatusError::Protocol("VarInt too long".to_string()))
}

async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32, StatusError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = reader.read_u8().await?;
        value |= ((byte & 0x7F) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(StatusError::Protocol("VarInt too long".to_string()))
}

fn put_string(buf: &mut BytesMut, value: &str) {
    put_varint(buf, value.len() as i32);
    buf.put_slice(value.as_bytes());
}

fn get_string(buf: &mut Bytes) -> Result<String, StatusError> {
    let len = usize::try_from(get_varint(buf)?)
        .map_err(|_| StatusError::Protocol("negative string length".to_string()))?;
    if buf.remaining() < len {
        return Err(StatusError::Protocol(format!(
            "string needs {len} bytes, {} left",
            buf.remaining()
        )));
    }
    let raw = buf.split_to(len);
    String::from_utf8(raw.to_vec()).map_err(|e| StatusError::Protocol(e.to_string()))
}

/// Length-prefixed packet.
pub fn frame(packet_id: i32, body: &[u8]) -> BytesMut {
    let mut inner = BytesMut::with_capacity(body.len() + 5);
    put_varint(&mut inner, packet_id);
    inner.put_slice(body);

    let mut out = BytesMut::with_capacity(inner.len() + 5);
    put_varint(&mut out, inner.len() as i32);
    out.put_slice(&inner);
    out
}

pub fn handshake_packet(host: &str, port: u16) -> BytesMut {
    let mut body = BytesMut::new();
    put_varint(&mut body, PROTOCOL_VERSION);
    put_string(&mut body, host);
    body.put_u16(port);
    put_varint(&mut body, NEXT_STATE_STATUS);
    frame(0x00, &body)
}

/// Reads one packet and returns its id and body.
pub async fn read_packet<R: AsyncRead + Unpin>(reader: &mut R) -> Result<(i32, Bytes), StatusError> {
    let len = usize::try_from(read_varint(reader).await?)
        .map_err(|_| StatusError::Protocol("negative packet length".to_string()))?;
    if len == 0 || len > MAX_PACKET_LEN {
        return Err(StatusError::Protocol(format!("bad packet length {len}")));
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).await?;
    let mut data = Bytes::from(data);
    let id = get_varint(&mut data)?;
    Ok((id, data))
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    version: Option<RawVersion>,
    players: Option<RawPlayers>,
    description: Option<Value>,
    favicon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawVersion {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPlayers {
    #[serde(default)]
    online: u32,
    #[serde(default)]
    max: u32,
    #[serde(default)]
    sample: Vec<RawPlayer>,
}

#[derive(Debug, Deserialize)]
struct RawPlayer {
    name: String,
}

fn collect_text(node: &Value, out: &mut String) {
    match node {
        Value::String(s) => out.push_str(s),
        Value::Object(map) => {
            if let Some(text) = map.get("text") {
                collect_text(text, out);
            }
            if let Some(Value::Array(extra)) = map.get("extra") {
                for part in extra {
                    collect_text(part, out);
                }
            }
        }
        Value::Array(parts) => {
            for part in parts {
                collect_text(part, out);
            }
        }
        _ => {}
    }
}

/// Plain MOTD text: chat components flattened, `§` formatting codes removed.
pub fn clean_motd(description: &Value) -> String {
    let mut raw = String::new();
    collect_text(description, &mut raw);

    let mut clean = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            clean.push(c);
        }
    }
    clean
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

pub fn parse_status(json: &str, latency_ms: Option<u64>) -> Result<ServerStatus, StatusError> {
    let raw: RawStatus = serde_json::from_str(json)?;
    let players = raw.players.map_or_else(PlayerCounts::default, |p| PlayerCounts {
        online: p.online,
        max: p.max,
        sample: p
            .sample
            .into_iter()
            .map(|player| player.name)
            .filter(|name| !name.is_empty())
            .collect(),
    });

    Ok(ServerStatus {
        online: true,
        version: raw
            .version
            .and_then(|v| v.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        players,
        motd: raw.description.as_ref().map(clean_motd).unwrap_or_default(),
        latency_ms,
        favicon: raw.favicon,
        error: None,
    })
}

/// Server List Ping client with SRV resolution and a hard timeout.
pub struct SlpClient {
    resolver: Option<TokioAsyncResolver>,
    timeout: Duration,
}

impl SlpClient {
    pub fn new(timeout: Duration) -> Self {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => Some(resolver),
            Err(e) => {
                tracing::warn!("SRV lookups disabled, no system resolver: {}", e);
                None
            }
        };
        Self { resolver, timeout }
    }

    /// Follows `_minecraft._tcp.<host>` when the address is a host name on the default port.
    async fn resolve(&self, host: &str, port: u16) -> (String, u16) {
        if port != DEFAULT_PORT || host.parse::<IpAddr>().is_ok() {
            return (host.to_string(), port);
        }
        let Some(resolver) = &self.resolver else {
            return (host.to_string(), port);
        };

        match resolver.srv_lookup(format!("_minecraft._tcp.{host}")).await {
            Ok(lookup) => match lookup.iter().next() {
                Some(srv) => {
                    let target = srv.target().to_utf8();
                    let target = target.trim_end_matches('.').to_string();
                    tracing::debug!(host, %target, port = srv.port(), "Using SRV record");
                    (target, srv.port())
                }
                None => (host.to_string(), port),
            },
            Err(_) => (host.to_string(), port),
        }
    }

    pub async fn status(&self, host: &str, port: u16) -> Result<ServerStatus, StatusError> {
        let host = host.trim();
        let deadline = Instant::now() + self.timeout;
        let (mut stream, json, status_elapsed) = tokio::time::timeout_at(deadline, async {
            let (target, target_port) = self.resolve(host, port).await;
            Self::request_status(&target, target_port).await
        })
        .await
        .map_err(|_| StatusError::Timeout(self.timeout))??;

        // A server may answer the status but never the ping; the status round
        // trip then stands in for the latency.
        let ping_deadline = deadline.min(Instant::now() + PING_TIMEOUT);
        let latency = match tokio::time::timeout_at(ping_deadline, Self::ping(&mut stream)).await {
            Ok(Ok(latency)) => latency,
            Ok(Err(e)) => {
                tracing::debug!(host, "Ping after status failed: {}", e);
                status_elapsed
            }
            Err(_) => {
                tracing::debug!(host, "No pong before the deadline");
                status_elapsed
            }
        };

        parse_status(&json, Some(latency.as_millis() as u64))
    }

    /// Connects, sends handshake and status request, and returns the open
    /// stream with the status JSON and its round trip.
    async fn request_status(host: &str, port: u16) -> Result<(TcpStream, String, Duration), StatusError> {
        let addr = lookup_host((host, port))
            .await
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| StatusError::Resolve(format!("{host}:{port}")))?;
        let mut stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;

        let started = Instant::now();
        stream.write_all(&handshake_packet(host, port)).await?;
        stream.write_all(&frame(PACKET_STATUS, &[])).await?;

        let (id, mut body) = read_packet(&mut stream).await?;
        if id != PACKET_STATUS {
            return Err(StatusError::Protocol(format!("expected status response, got 0x{id:02x}")));
        }
        let json = get_string(&mut body)?;
        Ok((stream, json, started.elapsed()))
    }

    async fn ping(stream: &mut TcpStream) -> Result<Duration, StatusError> {
        let payload = chrono::Utc::now().timestamp_millis();
        let started = Instant::now();
        stream
            .write_all(&frame(PACKET_PING, &payload.to_be_bytes()))
            .await?;

        let (id, mut body) = read_packet(stream).await?;
        if id != PACKET_PING || body.remaining() < 8 || body.get_i64() != payload {
            return Err(StatusError::Protocol("bad pong".to_string()));
        }
        Ok(started.elapsed())
    }
}

#[async_trait]
impl StatusSource for SlpClient {
    async fn query(&self, address: &str, port: u16) -> ServerStatus {
        match self.status(address, port).await {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!(address, port, "Server unreachable: {}", e);
                ServerStatus::offline(e.to_string())
            }
        }
    }
}
