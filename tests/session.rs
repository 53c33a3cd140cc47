//! Session configuration and server version enforcement against a mock daemon.

mod common;

use std::time::Duration;

use common::{daemon_reply, envelope, mount_start, record};
use lokal::{ErrorKind, Lokal, LokalError, ResponseInterceptor, TunnelId};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn created() -> serde_json::Value {
    envelope(true, "", json!([record("t-1", "", "myapp")]))
}

// ============================================================================
// Version check
// ============================================================================

#[tokio::test]
async fn test_missing_version_header_fails_successful_call() {
    let server = MockServer::start().await;
    mount_start(&server, ResponseTemplate::new(200).set_body_json(created())).await;

    let lokal = Lokal::with_base_url(&server.uri()).unwrap();
    let mut tunnel = lokal.new_tunnel().set_lan_address("myapp");

    let err = tunnel.create().await.err().unwrap();
    assert!(matches!(err, LokalError::UnknownServerVersion));
    assert_eq!(err.kind(), ErrorKind::Version);
    assert!(tunnel.id().is_none());
}

#[tokio::test]
async fn test_unparseable_version_header() {
    let server = MockServer::start().await;
    mount_start(
        &server,
        ResponseTemplate::new(200)
            .insert_header("Lokal-Server-Version", "dev")
            .set_body_json(created()),
    )
    .await;

    let lokal = Lokal::with_base_url(&server.uri()).unwrap();
    let err = lokal
        .new_tunnel()
        .set_lan_address("myapp")
        .create()
        .await
        .err()
        .unwrap();

    assert!(matches!(err, LokalError::UnknownServerVersion));
}

#[tokio::test]
async fn test_old_server_version_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tunnel/info/t-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Lokal-Server-Version", "0.5.2")
                .set_body_json(created()),
        )
        .mount(&server)
        .await;

    let lokal = Lokal::with_base_url(&server.uri()).unwrap();
    let err = lokal.tunnel_info(&TunnelId::from("t-1")).await.unwrap_err();

    assert!(matches!(err, LokalError::OutdatedClient { .. }));
    assert!(err.to_string().contains("0.6.0"));
}

#[tokio::test]
async fn test_custom_interceptor_runs_after_version_check() {
    struct RejectAll;

    impl ResponseInterceptor for RejectAll {
        fn on_response(&self, _response: &reqwest::Response) -> lokal::Result<()> {
            Err(LokalError::Rejected("maintenance".to_string()))
        }
    }

    let server = MockServer::start().await;
    mount_start(&server, daemon_reply(created())).await;

    let lokal = Lokal::with_base_url(&server.uri()).unwrap();
    lokal.add_interceptor(RejectAll);

    let err = lokal
        .new_tunnel()
        .set_lan_address("myapp")
        .create()
        .await
        .err()
        .unwrap();
    assert!(matches!(err, LokalError::Rejected(_)));
}

// ============================================================================
// Request headers
// ============================================================================

#[tokio::test]
async fn test_user_agent_and_credentials_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tunnel/start"))
        .and(header("User-Agent", lokal::client::USER_AGENT))
        .and(header("X-Auth-Token", "mytoken"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(daemon_reply(created()))
        .expect(1)
        .mount(&server)
        .await;

    let lokal = Lokal::with_base_url(&server.uri()).unwrap();
    lokal.set_basic_auth("user", "pass").set_api_token("mytoken");

    lokal
        .new_tunnel()
        .set_lan_address("myapp")
        .create()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_setters_apply_to_existing_tunnels() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/tunnel/start"))
        .respond_with(daemon_reply(created()))
        .expect(0)
        .mount(&first)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tunnel/start"))
        .and(header("X-Auth-Token", "later"))
        .respond_with(daemon_reply(created()))
        .expect(1)
        .mount(&second)
        .await;

    let lokal = Lokal::with_base_url(&first.uri()).unwrap();
    let mut tunnel = lokal.new_tunnel().set_lan_address("myapp");

    lokal.set_base_url(&second.uri()).set_api_token("later");
    tunnel.create().await.unwrap();

    assert_eq!(tunnel.session().base_url(), second.uri());
}

#[tokio::test]
async fn test_token_change_only_affects_later_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tunnel/info/t-1"))
        .and(header("X-Auth-Token", "one"))
        .respond_with(daemon_reply(created()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tunnel/info/t-1"))
        .and(header("X-Auth-Token", "two"))
        .respond_with(daemon_reply(created()))
        .expect(1)
        .mount(&server)
        .await;

    let lokal = Lokal::with_base_url(&server.uri()).unwrap();
    let id = TunnelId::from("t-1");

    lokal.set_api_token("one");
    lokal.tunnel_info(&id).await.unwrap();
    lokal.set_api_token("two");
    lokal.tunnel_info(&id).await.unwrap();
}

#[tokio::test]
async fn test_token_change_during_pending_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tunnel/info/t-1"))
        .and(header("X-Auth-Token", "before"))
        .respond_with(daemon_reply(created()).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;

    let lokal = Lokal::with_base_url(&server.uri()).unwrap();
    lokal.set_api_token("before");

    let pending = {
        let lokal = lokal.clone();
        tokio::spawn(async move { lokal.tunnel_info(&TunnelId::from("t-1")).await })
    };

    // Let the request reach the daemon before switching tokens
    for _ in 0..50 {
        if !server.received_requests().await.unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    lokal.set_api_token("after").set_base_url("http://127.0.0.1:9");

    let response = pending.await.unwrap().unwrap();
    assert!(response.success);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let token = requests[0].headers.get("X-Auth-Token").unwrap();
    assert_eq!(token.to_str().unwrap(), "before");
}

#[tokio::test]
async fn test_tunnel_info_returns_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tunnel/info/t-9"))
        .respond_with(daemon_reply(envelope(
            true,
            "",
            json!([record("t-9", "x.lokal-so.site", "x")]),
        )))
        .mount(&server)
        .await;

    let lokal = Lokal::with_base_url(&server.uri()).unwrap();
    let response = lokal.tunnel_info(&TunnelId::from("t-9")).await.unwrap();

    assert!(response.success);
    let record = response.first().unwrap();
    assert_eq!(record.id, Some(TunnelId::from("t-9")));
    assert_eq!(record.address_public, "x.lokal-so.site");
}
