//! Mock Lokal daemon built on wiremock.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SERVER_VERSION: &str = "0.6.3";

pub fn envelope(success: bool, message: &str, data: Value) -> Value {
    json!({
        "success": success,
        "message": message,
        "data": data,
    })
}

pub fn record(id: &str, public: &str, mdns: &str) -> Value {
    json!({
        "id": id,
        "name": "",
        "tunnel_type": "HTTP",
        "local_address": "localhost:3000",
        "address_public": public,
        "address_mdns": mdns,
        "inspect": false,
        "options": {},
    })
}

/// Reply the way a current daemon does
pub fn daemon_reply(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Lokal-Server-Version", SERVER_VERSION)
        .set_body_json(body)
}

pub async fn mount_start(server: &MockServer, reply: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/tunnel/start"))
        .respond_with(reply)
        .mount(server)
        .await;
}

pub async fn mount_info(server: &MockServer, id: &str, reply: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/tunnel/info/{}", id)))
        .respond_with(reply)
        .expect(times)
        .mount(server)
        .await;
}
