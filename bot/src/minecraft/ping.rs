//! Minecraft Server List Ping (1.7+ status protocol).
//!
//! Wire format, all packets framed as `VarInt length | VarInt packet id | payload`:
//! ```text
//! -> Handshake  (0x00): VarInt protocol, String host, u16 port, VarInt next_state=1
//! -> Request    (0x00): empty
//! <- Response   (0x00): String json
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::status::{Player, ServerStatus};

/// Protocol number sent in the handshake (1.19). Servers answer status
/// requests regardless of the version a client claims.
pub const DEFAULT_PROTOCOL_VERSION: i32 = 759;

/// Upper bound on a status response frame.
const MAX_RESPONSE_LENGTH: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum PingError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ping timed out")]
    Timeout,
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("malformed status json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Something that can ask a server for its status.
#[async_trait]
pub trait PingCapability: Send + Sync {
    async fn ping(&self, host: &str, port: u16, timeout: Duration)
    -> Result<ServerStatus, PingError>;
}

/// Server List Ping over a plain TCP connection.
#[derive(Debug, Clone)]
pub struct SlpPinger {
    protocol_version: i32,
}

impl Default for SlpPinger {
    fn default() -> Self {
        Self {
            protocol_version: DEFAULT_PROTOCOL_VERSION,
        }
    }
}

impl SlpPinger {
    async fn exchange(&self, host: &str, port: u16) -> Result<ServerStatus, PingError> {
        let mut stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;

        let mut out = Vec::with_capacity(64);
        write_frame(&mut out, &handshake_packet(self.protocol_version, host, port));
        write_frame(&mut out, &[0x00]);
        stream.write_all(&out).await?;
        stream.flush().await?;

        let length = read_varint(&mut stream).await?;
        let length = usize::try_from(length)
            .map_err(|_| PingError::Protocol(format!("negative frame length {length}")))?;
        if length > MAX_RESPONSE_LENGTH {
            return Err(PingError::Protocol(format!(
                "response frame too large ({length} bytes)"
            )));
        }

        let mut frame = vec![0u8; length];
        stream.read_exact(&mut frame).await?;
        let json = decode_status_frame(&frame)?;

        debug!(%host, port, bytes = json.len(), "status response received");
        parse_status_json(&json)
    }
}

#[async_trait]
impl PingCapability for SlpPinger {
    async fn ping(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<ServerStatus, PingError> {
        tokio::time::timeout(timeout, self.exchange(host, port))
            .await
            .map_err(|_| PingError::Timeout)?
    }
}

// ── Wire encoding ───────────────────────────────────────────────────

fn write_varint(buf: &mut Vec<u8>, value: i32) {
    let mut value = value as u32;
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    write_varint(buf, s.len() as i32);
    buf.extend_from_slice(s.as_bytes());
}

fn write_frame(buf: &mut Vec<u8>, packet: &[u8]) {
    write_varint(buf, packet.len() as i32);
    buf.extend_from_slice(packet);
}

fn handshake_packet(protocol_version: i32, host: &str, port: u16) -> Vec<u8> {
    let mut packet = Vec::with_capacity(host.len() + 16);
    write_varint(&mut packet, 0x00);
    write_varint(&mut packet, protocol_version);
    write_string(&mut packet, host);
    packet.extend_from_slice(&port.to_be_bytes());
    write_varint(&mut packet, 1);
    packet
}

async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32, PingError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = reader.read_u8().await?;
        value |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(PingError::Protocol("VarInt longer than 5 bytes".into()))
}

/// Decode a VarInt from the front of `buf`, returning it and the bytes consumed.
fn decode_varint(buf: &[u8]) -> Result<(i32, usize), PingError> {
    let mut value: u32 = 0;
    for (i, byte) in buf.iter().take(5).enumerate() {
        value |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value as i32, i + 1));
        }
    }
    Err(PingError::Protocol("truncated or oversized VarInt".into()))
}

fn decode_status_frame(frame: &[u8]) -> Result<String, PingError> {
    let (packet_id, used) = decode_varint(frame)?;
    if packet_id != 0x00 {
        return Err(PingError::Protocol(format!(
            "unexpected packet id {packet_id:#04x}"
        )));
    }
    let rest = &frame[used..];
    let (json_len, used) = decode_varint(rest)?;
    let json_len = usize::try_from(json_len)
        .map_err(|_| PingError::Protocol("negative string length".into()))?;
    let body = rest
        .get(used..used + json_len)
        .ok_or_else(|| PingError::Protocol("status string exceeds frame".into()))?;
    String::from_utf8(body.to_vec())
        .map_err(|_| PingError::Protocol("status string is not UTF-8".into()))
}

// ── Status JSON ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StatusJson {
    #[serde(default)]
    version: VersionJson,
    #[serde(default)]
    players: PlayersJson,
    #[serde(default)]
    description: serde_json::Value,
}

#[derive(Deserialize, Default)]
struct VersionJson {
    #[serde(default)]
    name: String,
    #[serde(default)]
    protocol: i32,
}

#[derive(Deserialize, Default)]
struct PlayersJson {
    #[serde(default)]
    max: i64,
    #[serde(default)]
    online: i64,
    #[serde(default)]
    sample: Vec<SampleJson>,
}

#[derive(Deserialize)]
struct SampleJson {
    #[serde(default)]
    name: String,
    #[serde(default)]
    id: String,
}

fn parse_status_json(json: &str) -> Result<ServerStatus, PingError> {
    let parsed: StatusJson = serde_json::from_str(json)?;

    let mut description = String::new();
    flatten_component(&parsed.description, &mut description);

    Ok(ServerStatus {
        version: parsed.version.name,
        protocol: parsed.version.protocol,
        description: strip_formatting_codes(description.trim()),
        players_online: parsed.players.online,
        players_max: parsed.players.max,
        sample: parsed
            .players
            .sample
            .into_iter()
            .map(|p| Player {
                name: p.name,
                uuid: p.id,
            })
            .collect(),
    })
}

/// Collapse a chat component (string, `{text, extra}` object or array) to plain text.
fn flatten_component(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::String(s) => out.push_str(s),
        serde_json::Value::Array(items) => {
            for item in items {
                flatten_component(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            if let Some(text) = map.get("text") {
                flatten_component(text, out);
            }
            if let Some(extra) = map.get("extra") {
                flatten_component(extra, out);
            }
        }
        _ => {}
    }
}

/// Drop legacy `§x` colour/format codes.
fn strip_formatting_codes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}
