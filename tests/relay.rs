//! End-to-end relay behaviour against mock backends.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};

use garuda_relay::config::MissingTargetPolicy;

mod common;

use common::{client, relay_config, start_mock_backend, start_programmable_backend, start_relay, MockReply};

const LANDS: &str = r#"{"message":"ok","data":[{"land_id":"LAND-1","land_details":{"land_area":"5"}}]}"#;

#[tokio::test]
async fn get_with_url_parameter_is_relayed_verbatim() {
    let backend = start_mock_backend(MockReply::json(StatusCode::OK, LANDS)).await;
    let relay = start_relay(relay_config("http://127.0.0.1:1")).await;

    let target = format!("{}/user/verified/land", backend.origin());
    let res = client()
        .get(relay.url("/relay"))
        .query(&[("url", target.as_str())])
        .send()
        .await
        .expect("relay unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.headers()["access-control-allow-methods"], "GET, POST, PUT, DELETE, OPTIONS");
    assert_eq!(res.headers()["access-control-allow-headers"], "Content-Type, Authorization");
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.text().await.unwrap(), LANDS);

    let seen = backend.captured();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].uri.path(), "/user/verified/land");
    assert_eq!(seen[0].headers["content-type"], "application/json");
    assert!(!seen[0].headers.contains_key("authorization"));
    assert!(seen[0].body.is_empty());
}

#[tokio::test]
async fn get_body_is_not_forwarded() {
    let backend = start_mock_backend(MockReply::json(StatusCode::OK, LANDS)).await;
    let relay = start_relay(relay_config(&backend.origin())).await;

    let res = client()
        .get(relay.url("/relay/user/verified/land"))
        .body(r#"{"ignored":true}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), LANDS);

    let seen = backend.captured();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "GET");
    assert!(seen[0].body.is_empty());
}

#[tokio::test]
async fn post_body_and_authorization_are_forwarded() {
    let backend = start_mock_backend(MockReply::json(StatusCode::OK, r#"{"token":"abc"}"#)).await;
    let relay = start_relay(relay_config(&backend.origin())).await;

    let body = r#"{"identifier":"a@b.com","password":"x"}"#;
    let res = client()
        .post(relay.url("/relay/auth/login-user"))
        .header("content-type", "text/plain")
        .header("authorization", "Bearer old-token")
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), r#"{"token":"abc"}"#);

    let seen = backend.captured();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].uri.path(), "/auth/login-user");
    assert_eq!(&seen[0].body[..], body.as_bytes());
    assert_eq!(seen[0].headers["content-type"], "application/json");
    assert_eq!(seen[0].headers["authorization"], "Bearer old-token");
}

#[tokio::test]
async fn upstream_errors_are_relayed_not_converted() {
    let backend =
        start_mock_backend(MockReply::json(StatusCode::UNAUTHORIZED, r#"{"error":"invalid credentials"}"#)).await;
    let relay = start_relay(relay_config("http://127.0.0.1:1")).await;

    let res = client()
        .post(relay.url("/relay"))
        .query(&[("url", format!("{}/auth/login-user", backend.origin()))])
        .body(r#"{"identifier":"a@b.com","password":"x"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.text().await.unwrap(), r#"{"error":"invalid credentials"}"#);
}

#[tokio::test]
async fn put_and_delete_keep_their_method_and_body() {
    let backend = start_programmable_backend(|req| {
        MockReply::json(StatusCode::OK, &format!(r#"{{"method":"{}"}}"#, req.method))
    })
    .await;
    let relay = start_relay(relay_config(&backend.origin())).await;

    let res = client()
        .put(relay.url("/relay/user/verified/land/LAND-1"))
        .body(r#"{"price":100}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "method": "PUT" }));

    let res = client()
        .delete(relay.url("/relay/user/verified/land/LAND-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "method": "DELETE" }));

    let seen = backend.captured();
    assert_eq!(seen.len(), 2);
    assert_eq!(&seen[0].body[..], br#"{"price":100}"#);
    assert!(seen[1].body.is_empty());
}

#[tokio::test]
async fn path_rewrite_keeps_query_string() {
    let backend = start_mock_backend(MockReply::json(StatusCode::OK, "[]")).await;
    let relay = start_relay(relay_config(&format!("{}/v1", backend.origin()))).await;

    let res = client()
        .get(relay.url("/relay/user/verified/land?district=Guntur&page=2"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let seen = backend.captured();
    assert_eq!(seen[0].uri.path(), "/v1/user/verified/land");
    assert_eq!(seen[0].uri.query(), Some("district=Guntur&page=2"));
}

#[tokio::test]
async fn binary_bodies_and_content_types_pass_through() {
    let image: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let expected = image.clone();
    let backend = start_mock_backend(MockReply {
        status: StatusCode::OK,
        content_type: Some("image/jpeg"),
        body: image,
    })
    .await;
    let relay = start_relay(relay_config(&backend.origin())).await;

    let res = client()
        .get(relay.url("/relay/uploads/land_photo/1.jpg"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.headers()["content-type"], "image/jpeg");
    assert_eq!(res.bytes().await.unwrap().to_vec(), expected);
}

#[tokio::test]
async fn missing_upstream_content_type_defaults_to_json() {
    let backend = start_mock_backend(MockReply {
        status: StatusCode::ACCEPTED,
        content_type: None,
        body: b"queued".to_vec(),
    })
    .await;
    let relay = start_relay(relay_config(&backend.origin())).await;

    let res = client()
        .post(relay.url("/relay/api/create-user"))
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::ACCEPTED);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.text().await.unwrap(), "queued");
}

#[tokio::test]
async fn preflight_never_reaches_upstream() {
    let backend = start_mock_backend(MockReply::json(StatusCode::OK, "{}")).await;
    let relay = start_relay(relay_config(&backend.origin())).await;

    for path in ["/relay", "/relay/auth/login-user"] {
        let res = client()
            .request(reqwest::Method::OPTIONS, relay.url(path))
            .header("origin", "https://garuda.example")
            .header("access-control-request-method", "POST")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["access-control-allow-origin"], "*");
        assert_eq!(res.headers()["access-control-max-age"], "86400");
        assert!(res.bytes().await.unwrap().is_empty());
    }

    assert!(backend.captured().is_empty());
}

#[tokio::test]
async fn missing_target_strict_and_lenient() {
    let backend = start_mock_backend(MockReply::json(StatusCode::OK, r#"{"service":"garuda"}"#)).await;

    let strict = start_relay(relay_config(&backend.origin())).await;
    let res = client().get(strict.url("/relay")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "Missing url parameter" }));
    assert!(backend.captured().is_empty());

    let mut config = relay_config(&backend.origin());
    config.relay.on_missing_target = MissingTargetPolicy::UseDefault;
    let lenient = start_relay(config).await;
    let res = client().get(lenient.url("/relay?lang=te")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), r#"{"service":"garuda"}"#);

    let seen = backend.captured();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].uri.path(), "/");
    assert_eq!(seen[0].uri.query(), Some("lang=te"));
}

#[tokio::test]
async fn unreachable_upstream_yields_proxy_failed() {
    let dead = common::unused_addr();
    let relay = start_relay(relay_config(&format!("http://{dead}"))).await;

    let res = client()
        .post(relay.url("/relay/auth/login-user"))
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.headers()["content-type"], "application/json");
    let payload: Value = res.json().await.unwrap();
    assert_eq!(payload["error"], "Proxy failed");
    assert!(!payload["details"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn slow_upstream_times_out_as_proxy_failed() {
    let silent = common::start_silent_backend().await;
    let mut config = relay_config(&format!("http://{silent}"));
    config.timeouts.upstream_secs = 1;
    let relay = start_relay(config).await;

    let res = client().get(relay.url("/relay/slow")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload: Value = res.json().await.unwrap();
    assert_eq!(payload["error"], "Proxy failed");
}

#[tokio::test]
async fn request_id_is_propagated_both_ways() {
    let backend = start_mock_backend(MockReply::json(StatusCode::OK, "{}")).await;
    let relay = start_relay(relay_config(&backend.origin())).await;

    let res = client()
        .get(relay.url("/relay/user/verified/land"))
        .header("x-request-id", "trace-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-123");
    assert_eq!(backend.captured()[0].headers["x-request-id"], "trace-123");

    let res = client().get(relay.url("/relay/user/verified/land")).send().await.unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&generated).is_ok());
    assert_eq!(backend.captured()[1].headers["x-request-id"], generated.as_str());
}

#[tokio::test]
async fn reload_switches_upstream_without_restart() {
    let first = start_mock_backend(MockReply::json(StatusCode::OK, r#"{"from":"first"}"#)).await;
    let second = start_mock_backend(MockReply::json(StatusCode::OK, r#"{"from":"second"}"#)).await;
    let relay = start_relay(relay_config(&first.origin())).await;

    let res = client().get(relay.url("/relay/ping")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), r#"{"from":"first"}"#);

    relay.updates.send(relay_config(&second.origin())).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let res = client().get(relay.url("/relay/ping")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), r#"{"from":"second"}"#);
    assert_eq!(first.captured().len(), 1);
    assert_eq!(second.captured().len(), 1);
}
