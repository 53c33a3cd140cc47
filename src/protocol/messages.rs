use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::TunnelId;

/// Kind of traffic a tunnel carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TunnelType {
    Http,
    Tcp,
    Udp,
}

impl TunnelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TunnelType::Http => "HTTP",
            TunnelType::Tcp => "TCP",
            TunnelType::Udp => "UDP",
        }
    }
}

impl fmt::Display for TunnelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TunnelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HTTP" => Ok(TunnelType::Http),
            "TCP" => Ok(TunnelType::Tcp),
            "UDP" => Ok(TunnelType::Udp),
            other => Err(format!("unknown tunnel type: {}", other)),
        }
    }
}

/// Access control and header rewrite rules applied by the daemon.
///
/// Every list is forwarded verbatim and in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default, deserialize_with = "null_as_default")]
    pub basic_auth: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cidr_allow: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cidr_deny: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub request_header_add: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub request_header_remove: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub response_header_add: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub response_header_remove: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub header_key: Vec<String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `user:password` credentials from visitors
    pub fn basic_auth(mut self, credential: impl Into<String>) -> Self {
        self.basic_auth.push(credential.into());
        self
    }

    pub fn cidr_allow(mut self, cidr: impl Into<String>) -> Self {
        self.cidr_allow.push(cidr.into());
        self
    }

    pub fn cidr_deny(mut self, cidr: impl Into<String>) -> Self {
        self.cidr_deny.push(cidr.into());
        self
    }

    pub fn request_header_add(mut self, header: impl Into<String>) -> Self {
        self.request_header_add.push(header.into());
        self
    }

    pub fn request_header_remove(mut self, header: impl Into<String>) -> Self {
        self.request_header_remove.push(header.into());
        self
    }

    pub fn response_header_add(mut self, header: impl Into<String>) -> Self {
        self.response_header_add.push(header.into());
        self
    }

    pub fn response_header_remove(mut self, header: impl Into<String>) -> Self {
        self.response_header_remove.push(header.into());
        self
    }

    pub fn header_key(mut self, key: impl Into<String>) -> Self {
        self.header_key.push(key.into());
        self
    }
}

/// Tunnel as the daemon sees it: the body of `POST /api/tunnel/start` and
/// each entry of a reply's `data` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunnelRecord {
    #[serde(
        default,
        rename(serialize = "ID"),
        alias = "ID",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<TunnelId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// `None` goes on the wire as `""`
    #[serde(
        default,
        serialize_with = "tunnel_type_or_empty",
        deserialize_with = "lenient_tunnel_type"
    )]
    pub tunnel_type: Option<TunnelType>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub local_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub server_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address_tunnel: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address_tunnel_port: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address_public: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address_mdns: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inspect: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Options,
}

/// Envelope wrapping every daemon reply
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default = "Vec::new", deserialize_with = "null_as_default")]
    pub data: Vec<T>,
}

impl<T> ApiResponse<T> {
    pub fn first(&self) -> Option<&T> {
        self.data.first()
    }
}

/// The daemon leaves empty lists and strings as `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn tunnel_type_or_empty<S>(
    tunnel_type: &Option<TunnelType>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(tunnel_type.map(|t| t.as_str()).unwrap_or_default())
}

fn lenient_tunnel_type<'de, D>(deserializer: D) -> Result<Option<TunnelType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}
