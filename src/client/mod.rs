//! Client session for the Lokal daemon.
//!
//! [`Lokal`] holds the connection configuration (endpoint, credentials,
//! API token) shared by every [`Tunnel`] created from it, and runs each
//! daemon reply through its [`ResponseInterceptor`] chain.

pub mod interceptor;

use parking_lot::RwLock;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::{LokalError, Result};
use crate::protocol::{ApiResponse, TunnelId, TunnelRecord};
use crate::tunnel::Tunnel;

pub use interceptor::{ResponseInterceptor, ServerVersionCheck};

/// Endpoint of a daemon running with its default settings
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:6174";

pub const USER_AGENT: &str = "Lokal Rust - github.com/lokal-so/lokal-rust";

const API_TOKEN_HEADER: &str = "X-Auth-Token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
struct SessionConfig {
    base_url: String,
    basic_auth: Option<BasicAuth>,
    token: Option<String>,
}

impl SessionConfig {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

struct SessionInner {
    http: Client,
    config: RwLock<SessionConfig>,
    interceptors: RwLock<Vec<Arc<dyn ResponseInterceptor>>>,
}

/// Connection to a Lokal daemon.
///
/// Clones share one configuration: changing the endpoint or credentials on
/// any clone applies to every later request made through any of them,
/// including those made by tunnels already created from this session.
/// Requests already sent keep the configuration they were built with.
#[derive(Clone)]
pub struct Lokal {
    inner: Arc<SessionInner>,
}

impl Lokal {
    /// Connect to the daemon at [`DEFAULT_BASE_URL`]
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;

        let interceptors: Vec<Arc<dyn ResponseInterceptor>> =
            vec![Arc::new(ServerVersionCheck::default())];

        Ok(Self {
            inner: Arc::new(SessionInner {
                http,
                config: RwLock::new(SessionConfig {
                    base_url: base_url.to_string(),
                    basic_auth: None,
                    token: None,
                }),
                interceptors: RwLock::new(interceptors),
            }),
        })
    }

    pub fn set_base_url(&self, url: &str) -> &Self {
        self.inner.config.write().base_url = url.to_string();
        self
    }

    pub fn set_basic_auth(&self, username: &str, password: &str) -> &Self {
        self.inner.config.write().basic_auth = Some(BasicAuth {
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    /// Send `token` as `X-Auth-Token` on every later request
    pub fn set_api_token(&self, token: &str) -> &Self {
        self.inner.config.write().token = Some(token.to_string());
        self
    }

    /// Run `interceptor` on every response, after the ones already installed
    pub fn add_interceptor(&self, interceptor: impl ResponseInterceptor + 'static) -> &Self {
        self.inner.interceptors.write().push(Arc::new(interceptor));
        self
    }

    pub fn base_url(&self) -> String {
        self.inner.config.read().base_url.clone()
    }

    pub fn basic_auth(&self) -> Option<BasicAuth> {
        self.inner.config.read().basic_auth.clone()
    }

    pub fn api_token(&self) -> Option<String> {
        self.inner.config.read().token.clone()
    }

    /// Start describing a new tunnel bound to this session
    pub fn new_tunnel(&self) -> Tunnel {
        Tunnel::new(self.clone())
    }

    /// Fetch the daemon's current record for a tunnel
    pub async fn tunnel_info(&self, id: &TunnelId) -> Result<ApiResponse<TunnelRecord>> {
        let path = format!("/api/tunnel/info/{}", id);
        self.request::<(), _>(Method::GET, &path, None).await
    }

    pub(crate) async fn start_tunnel(
        &self,
        record: &TunnelRecord,
    ) -> Result<ApiResponse<TunnelRecord>> {
        self.request(Method::POST, "/api/tunnel/start", Some(record))
            .await
    }

    async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // Snapshot so setters racing with this call only affect later requests
        let config = self.inner.config.read().clone();
        let url = config.url(path);

        let mut request = self.inner.http.request(method.clone(), &url);
        if let Some(auth) = &config.basic_auth {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }
        if let Some(token) = &config.token {
            request = request.header(API_TOKEN_HEADER, token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!("{} {}", method, url);
        let response = request.send().await?;
        let status = response.status();
        debug!("{} {} -> {}", method, url, status);

        let interceptors = self.inner.interceptors.read().clone();
        for interceptor in &interceptors {
            interceptor.on_response(&response)?;
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| LokalError::InvalidResponse {
            status: status.as_u16(),
            source,
        })
    }
}

impl std::fmt::Debug for Lokal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let config = self.inner.config.read();
        f.debug_struct("Lokal")
            .field("base_url", &config.base_url)
            .field("basic_auth", &config.basic_auth.as_ref().map(|a| &a.username))
            .field("token", &config.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_endpoint() {
        let lokal = Lokal::new().unwrap();
        assert_eq!(lokal.base_url(), "http://127.0.0.1:6174");
        assert!(lokal.basic_auth().is_none());
        assert!(lokal.api_token().is_none());
    }

    #[test]
    fn test_set_base_url() {
        let lokal = Lokal::new().unwrap();
        lokal.set_base_url("http://localhost:8080");
        assert_eq!(lokal.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_setters_chain_and_are_shared_by_clones() {
        let lokal = Lokal::new().unwrap();
        let other = lokal.clone();

        lokal
            .set_basic_auth("user", "pass")
            .set_api_token("mytoken")
            .set_api_token("mytoken");

        assert_eq!(
            other.basic_auth(),
            Some(BasicAuth {
                username: "user".to_string(),
                password: "pass".to_string(),
            })
        );
        assert_eq!(other.api_token().as_deref(), Some("mytoken"));
    }

    #[test]
    fn test_url_join_ignores_trailing_slash() {
        let config = SessionConfig {
            base_url: "http://localhost:6174/".to_string(),
            basic_auth: None,
            token: None,
        };
        assert_eq!(
            config.url("/api/tunnel/start"),
            "http://localhost:6174/api/tunnel/start"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let lokal = Lokal::new().unwrap();
        lokal.set_api_token("secret");
        assert!(!format!("{:?}", lokal).contains("secret"));
    }
}
