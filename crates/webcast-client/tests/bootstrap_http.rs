#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use webcast_client::bootstrap::TokenBootstrapper;
use webcast_client::config::BootstrapSection;
use webcast_client::signer::StaticSigner;

const LIVE_ID: &str = "261378947940";
const ROOM_ID: &str = "7392091211001140287";

fn section(server: &MockServer) -> BootstrapSection {
    BootstrapSection {
        live_url: format!("{}/", server.uri()),
        host_url: format!("{}/host/", server.uri()),
        push_url: "wss://push.invalid/webcast/im/push/v2/".into(),
        ..BootstrapSection::default()
    }
}

fn bootstrapper(server: &MockServer, signature: &str) -> TokenBootstrapper {
    TokenBootstrapper::new(
        LIVE_ID,
        section(server),
        Arc::new(StaticSigner::new(signature)),
        Duration::from_secs(1),
    )
    .unwrap()
}

async fn mount_cookie(server: &MockServer, times: u64) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "ttwid=tw-123; Path=/"))
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_room_page(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{LIVE_ID}")))
        .and(header_regex("cookie", "^ttwid=tw-123&msToken=.+; __ac_nonce="))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn resolves_cookie_from_live_root() {
    let server = MockServer::start().await;
    mount_cookie(&server, 1).await;

    let b = bootstrapper(&server, "sig");
    assert_eq!(b.cookie().await.unwrap(), "tw-123");
    // Cached: the second read does not hit the server again.
    assert_eq!(b.cookie().await.unwrap(), "tw-123");
}

#[tokio::test]
async fn missing_cookie_is_pattern_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = bootstrapper(&server, "sig").cookie().await.unwrap_err();
    assert_eq!(err.kind().as_str(), "PATTERN_NOT_FOUND");
}

#[tokio::test]
async fn resolves_room_id_from_room_page() {
    let server = MockServer::start().await;
    mount_cookie(&server, 1).await;
    mount_room_page(
        &server,
        &format!(r#"<script>self.__pace_f.push([1,"{{\"roomId\":\"{ROOM_ID}\"}}"])</script>"#),
    )
    .await;

    let b = bootstrapper(&server, "sig");
    assert_eq!(b.room_id().await.unwrap(), ROOM_ID);
}

#[tokio::test]
async fn room_page_without_id_is_pattern_not_found() {
    let server = MockServer::start().await;
    mount_cookie(&server, 1).await;
    mount_room_page(&server, "<html><body>offline</body></html>").await;

    let err = bootstrapper(&server, "sig").room_id().await.unwrap_err();
    assert_eq!(err.kind().as_str(), "PATTERN_NOT_FOUND");
}

#[tokio::test]
async fn unreachable_host_is_network_failure() {
    let server = MockServer::start().await;
    let mut cfg = section(&server);
    cfg.live_url = "http://127.0.0.1:9/".into();
    let b = TokenBootstrapper::new(
        LIVE_ID,
        cfg,
        Arc::new(StaticSigner::new("sig")),
        Duration::from_secs(1),
    )
    .unwrap();

    let err = b.cookie().await.unwrap_err();
    assert_eq!(err.kind().as_str(), "NETWORK_FAILURE");
}

#[tokio::test]
async fn connect_target_carries_signature_and_room() {
    let server = MockServer::start().await;
    mount_cookie(&server, 1).await;
    mount_room_page(&server, &format!(r#"{{"roomId":"{ROOM_ID}"}}"#)).await;

    let b = bootstrapper(&server, "push-signature");
    let first = b.connect_target().await.unwrap();
    let second = b.connect_target().await.unwrap();

    assert_eq!(first.room_id, ROOM_ID);
    assert_eq!(first.cookie, "tw-123");
    let pairs: Vec<(String, String)> = first.url.query_pairs().into_owned().collect();
    let get = |k: &str| pairs.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
    assert_eq!(get("room_id"), Some(ROOM_ID));
    assert_eq!(get("signature"), Some("push-signature"));
    assert_eq!(pairs.last().map(|(k, _)| k.as_str()), Some("signature"));

    // Session is reused across attempts.
    assert_eq!(second.room_id, first.room_id);
}

#[tokio::test]
async fn failing_signer_blocks_connect() {
    let server = MockServer::start().await;
    mount_cookie(&server, 1).await;
    mount_room_page(&server, &format!(r#"{{"roomId":"{ROOM_ID}"}}"#)).await;

    let b = TokenBootstrapper::new(
        LIVE_ID,
        section(&server),
        Arc::new(StaticSigner::failing()),
        Duration::from_secs(1),
    )
    .unwrap();
    let err = b.connect_target().await.unwrap_err();
    assert_eq!(err.kind().as_str(), "SIGNER_FAILURE");
}

#[tokio::test]
async fn room_status_reports_streamer() {
    let server = MockServer::start().await;
    mount_cookie(&server, 1).await;
    mount_room_page(&server, &format!(r#"{{"roomId":"{ROOM_ID}"}}"#)).await;
    Mock::given(method("GET"))
        .and(path("/host/"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "__ac_nonce=n0nce; Path=/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/webcast/room/web/enter/"))
        .and(query_param("web_rid", LIVE_ID))
        .and(query_param("room_id_str", ROOM_ID))
        .and(query_param("a_bogus", "sig"))
        .and(header_regex("cookie", "__ac_signature=sig"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "room_status": 0,
                "user": { "id_str": "42", "nickname": "anchor" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let status = bootstrapper(&server, "sig").room_status().await.unwrap();
    assert!(status.is_live());
    assert_eq!(status.user_id, "42");
    assert_eq!(status.nickname, "anchor");
}

#[tokio::test]
async fn room_status_without_data_is_pattern_not_found() {
    let server = MockServer::start().await;
    mount_cookie(&server, 1).await;
    mount_room_page(&server, &format!(r#"{{"roomId":"{ROOM_ID}"}}"#)).await;
    Mock::given(method("GET"))
        .and(path("/host/"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "__ac_nonce=n0nce; Path=/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/webcast/room/web/enter/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status_code": 0 })))
        .mount(&server)
        .await;

    let err = bootstrapper(&server, "sig").room_status().await.unwrap_err();
    assert_eq!(err.kind().as_str(), "PATTERN_NOT_FOUND");
}
