//! Response interceptors run against every daemon reply before its body is read.

use reqwest::Response;
use semver::Version;
use tracing::debug;

use crate::error::{LokalError, Result};

/// Header the daemon uses to advertise its version
pub const SERVER_VERSION_HEADER: &str = "Lokal-Server-Version";

/// Oldest daemon this client can talk to
pub const SERVER_MIN_VERSION: Version = Version::new(0, 6, 0);

/// Hook invoked on each response. Returning an error fails the request that
/// produced the response.
pub trait ResponseInterceptor: Send + Sync {
    fn on_response(&self, response: &Response) -> Result<()>;
}

/// Rejects responses from daemons older than a minimum version, or that do
/// not advertise a version at all.
#[derive(Debug, Clone)]
pub struct ServerVersionCheck {
    minimum: Version,
}

impl ServerVersionCheck {
    pub fn new(minimum: Version) -> Self {
        Self { minimum }
    }

    pub fn minimum(&self) -> &Version {
        &self.minimum
    }

    pub fn check(&self, header: Option<&str>) -> Result<()> {
        let raw = header.unwrap_or_default();
        let version = parse_server_version(raw).ok_or(LokalError::UnknownServerVersion)?;

        if version < self.minimum {
            return Err(LokalError::OutdatedClient {
                server: version.to_string(),
                minimum: self.minimum.to_string(),
            });
        }

        debug!("Daemon version {} accepted", version);
        Ok(())
    }
}

impl Default for ServerVersionCheck {
    fn default() -> Self {
        Self::new(SERVER_MIN_VERSION)
    }
}

impl ResponseInterceptor for ServerVersionCheck {
    fn on_response(&self, response: &Response) -> Result<()> {
        let header = response
            .headers()
            .get(SERVER_VERSION_HEADER)
            .and_then(|v| v.to_str().ok());
        self.check(header)
    }
}

/// Parse a version string, accepting a leading `v` and missing minor/patch
/// components (`v1.2` is read as `1.2.0`).
pub fn parse_server_version(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix('v')
        .or_else(|| raw.strip_prefix('V'))
        .unwrap_or(raw);

    if raw.is_empty() {
        return None;
    }

    if let Ok(version) = Version::parse(raw) {
        return Some(version);
    }

    let split = raw.find(['-', '+']).unwrap_or(raw.len());
    let (core, suffix) = raw.split_at(split);
    let components = core.split('.').count();
    if components >= 3 {
        return None;
    }

    let padded = format!("{}{}{}", core, ".0".repeat(3 - components), suffix);
    Version::parse(&padded).ok()
}
