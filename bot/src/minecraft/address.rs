use thiserror::Error;

/// Port used when an address is given without one.
pub const DEFAULT_PORT: u16 = 25565;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("server address is empty")]
    EmptyHost,
    #[error("invalid port: {0}")]
    InvalidPort(String),
    #[error("port out of range (1-65535): {0}")]
    PortOutOfRange(String),
}

/// A server location plus the name the chat wants to see it as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
    /// Free-text label. Empty means "show the address instead".
    pub display_name: String,
}

impl ServerAddress {
    /// Build an address from a `host[:port]` token and an optional label.
    pub fn parse(raw: &str, display_name: &str) -> Result<Self, AddressError> {
        let (host, port) = parse_address(raw)?;
        Ok(Self {
            host,
            port,
            display_name: display_name.trim().to_string(),
        })
    }

    /// `host` or `host:port`, omitting the port when it is the default.
    pub fn address(&self) -> String {
        format_address(&self.host, self.port)
    }

    pub fn label(&self) -> String {
        display_label(&self.display_name, &self.host, self.port)
    }
}

/// Split `host[:port]` on the last colon. IPv6 literals are not supported.
pub fn parse_address(raw: &str) -> Result<(String, u16), AddressError> {
    let raw = raw.trim();

    let Some(idx) = raw.rfind(':') else {
        if raw.is_empty() {
            return Err(AddressError::EmptyHost);
        }
        return Ok((raw.to_string(), DEFAULT_PORT));
    };

    let host = &raw[..idx];
    let port_str = &raw[idx + 1..];

    if host.is_empty() {
        return Err(AddressError::EmptyHost);
    }
    if port_str.is_empty() || !port_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AddressError::InvalidPort(port_str.to_string()));
    }

    let port = port_str
        .parse::<u32>()
        .ok()
        .and_then(|p| u16::try_from(p).ok())
        .filter(|p| *p != 0)
        .ok_or_else(|| AddressError::PortOutOfRange(port_str.to_string()))?;

    Ok((host.to_string(), port))
}

pub fn format_address(host: &str, port: u16) -> String {
    if port == DEFAULT_PORT {
        host.to_string()
    } else {
        format!("{host}:{port}")
    }
}

/// The user-facing name of a server: its label, or the formatted address.
pub fn display_label(display_name: &str, host: &str, port: u16) -> String {
    if display_name.is_empty() {
        format_address(host, port)
    } else {
        display_name.to_string()
    }
}
