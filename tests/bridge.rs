//! End-to-end tests of the HTTP surface against a local session.

use bridge_sdk::{BridgeClient, CallRequest, CallResponse, ClientError, PublishRequest};
use pubsub_bridge::config::BridgeConfig;
use pubsub_bridge::session::CallOutcome;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use tokio::sync::broadcast::error::TryRecvError;

mod common;

async fn post(
    bridge: &common::TestBridge,
    path: &str,
    body: impl Into<String>,
) -> (StatusCode, String) {
    let res = common::client()
        .post(bridge.url(path))
        .body(body.into())
        .send()
        .await
        .expect("bridge unreachable");
    let status = res.status();
    (status, res.text().await.unwrap())
}

async fn post_json(bridge: &common::TestBridge, path: &str, body: Value) -> (StatusCode, String) {
    post(bridge, path, body.to_string()).await
}

#[tokio::test]
async fn test_publish_only_args() {
    let bridge = common::start_bridge().await;
    let mut events = bridge.session.subscribe("bridge.tests.some.topic");

    let (status, body) = post_json(
        &bridge,
        "/pub",
        json!({"topic": "bridge.tests.some.topic", "args": [1, "two"]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "pub");

    let event = events.try_recv().unwrap();
    assert_eq!(event.topic, "bridge.tests.some.topic");
    assert_eq!(event.args, vec![json!(1), json!("two")]);
    assert_eq!(event.args_kw, None);
    assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
}

#[tokio::test]
async fn test_publish_lowercases_topic() {
    let bridge = common::start_bridge().await;
    let mut events = bridge.session.subscribe("bridge.tests.mixed");

    let body = json!({"topic": "Bridge.Tests.MIXED", "args": []});
    let (status, _) = post_json(&bridge, "/pub", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.try_recv().unwrap().topic, "bridge.tests.mixed");
}

#[tokio::test]
async fn test_publish_with_options() {
    let bridge = common::start_bridge().await;
    let mut events = bridge.session.subscribe("bridge.tests.nonexclude.topic");

    let (status, body) = post_json(
        &bridge,
        "/pub",
        json!({
            "topic": "bridge.tests.nonexclude.topic",
            "args": [1, "two"],
            "argsKw": {"k": "v"},
            "options": {"exclude_me": false}
        }),
    )
    .await;

    assert_eq!((status, body.as_str()), (StatusCode::OK, "pub"));
    let event = events.try_recv().unwrap();
    assert_eq!(event.args_kw.unwrap().get("k"), Some(&json!("v")));
    assert_eq!(event.options.unwrap().get("exclude_me"), Some(&json!(false)));
}

#[tokio::test]
async fn test_publish_array_args_kw_is_dropped() {
    let bridge = common::start_bridge().await;
    let mut events = bridge.session.subscribe("bridge.tests.some.topic");

    let (status, _) = post_json(
        &bridge,
        "/pub",
        json!({"topic": "bridge.tests.some.topic", "args": [1], "argsKw": [1, "two"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.try_recv().unwrap().args_kw, None);
}

#[tokio::test]
async fn test_publish_twice_publishes_twice() {
    let bridge = common::start_bridge().await;
    let mut events = bridge.session.subscribe("bridge.tests.twice");
    let body = json!({"topic": "bridge.tests.twice", "args": ["same"]});

    for _ in 0..2 {
        let (status, _) = post_json(&bridge, "/pub", body.clone()).await;
        assert_eq!(status, StatusCode::OK);
    }

    let first = events.try_recv().unwrap();
    let second = events.try_recv().unwrap();
    assert_eq!(first.args, second.args);
    assert_ne!(first.publication, second.publication);
    assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
}

#[tokio::test]
async fn test_publish_null_args() {
    let bridge = common::start_bridge().await;
    let mut events = bridge.session.subscribe("bridge.tests.some.topic");

    let (status, body) = post_json(
        &bridge,
        "/pub",
        json!({"topic": "bridge.tests.some.topic", "args": null}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad Request: missing field `args`");
    assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
}

#[tokio::test]
async fn test_publish_object_args() {
    let bridge = common::start_bridge().await;
    let (status, body) =
        post_json(&bridge, "/pub", json!({"topic": "a.b", "args": {"0": 1}})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad Request: field `args` must be an array");
}

#[tokio::test]
async fn test_publish_bad_uri() {
    let bridge = common::start_bridge().await;
    let mut events = bridge.session.subscribe("bridge.tests.*");

    let (status, body) =
        post_json(&bridge, "/pub", json!({"topic": "bridge.tests.*", "args": []})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad Request: Invalid URI: bridge.tests.*");
    assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
}

#[tokio::test]
async fn test_no_topic_publish() {
    let bridge = common::start_bridge().await;
    let (status, body) = post_json(&bridge, "/pub", json!({"args": null})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad Request: missing field `topic`; missing field `args`");
}

#[tokio::test]
async fn test_bad_json() {
    let bridge = common::start_bridge().await;
    let (status, body) = post(
        &bridge,
        "/pub",
        r#"{ "topic": "bridge.tests.some.topic", "args": [1,2,3], }"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body.starts_with("Bad Request: JSON decoding failed: "),
        "unexpected body: {}",
        body
    );
}

#[tokio::test]
async fn test_get_is_not_found() {
    let bridge = common::start_bridge().await;
    let res = common::client()
        .get(bridge.url("/pub"))
        .body(json!({"args": null}).to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "Not found");
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let bridge = common::start_bridge().await;
    for path in ["/", "/publish", "/pub/extra", "/call/"] {
        let (status, body) = post(&bridge, path, "{}").await;
        assert_eq!(status, StatusCode::NOT_FOUND, "path {}", path);
        assert_eq!(body, "Not found");
    }
}

async fn start_limited_bridge() -> common::TestBridge {
    let mut config = BridgeConfig::default();
    config.limits.max_body_size = 16;
    common::start_bridge_with(config).await
}

#[tokio::test]
async fn test_oversized_get_is_not_found() {
    let bridge = start_limited_bridge().await;
    let res = common::client()
        .get(bridge.url("/pub"))
        .body("x".repeat(64))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "Not found");
}

#[tokio::test]
async fn test_oversized_publish_is_bad_request() {
    let bridge = start_limited_bridge().await;
    let mut events = bridge.session.subscribe("a.b");
    let body = json!({"topic": "a.b", "args": ["way too long for the limit"]});

    let (status, text) = post_json(&bridge, "/pub", body.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Bad Request: body exceeds 16 bytes");
    assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);

    let (status, text) = post_json(&bridge, "/call", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "Problem");
}

#[tokio::test]
async fn test_call_with_error() {
    let bridge = common::start_bridge().await;
    bridge
        .session
        .serve("procedure.that.errors", |_| {
            let mut kw = Map::new();
            kw.insert("x".into(), json!("y"));
            let mut details = Map::new();
            details.insert("y".into(), json!("z"));
            CallOutcome::error("my.custom.error", vec![json!(4), json!(5), json!(6)])
                .with_args_kw(kw)
                .with_details(details)
        })
        .unwrap();

    let res = common::client()
        .post(bridge.url("/call"))
        .body(json!({"procedure": "procedure.that.errors", "args": [1, 2, 3]}).to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "result": "ERROR",
            "error_uri": "my.custom.error",
            "error_args": [4, 5, 6],
            "error_argskw": {"x": "y"},
            "error_details": {"y": "z"}
        })
    );
}

#[tokio::test]
async fn test_call_success() {
    let bridge = common::start_bridge().await;
    bridge
        .session
        .serve("math.add", |inv| {
            let sum: i64 = inv.args.iter().flatten().filter_map(Value::as_i64).sum();
            let mut kw = Map::new();
            let precise = inv
                .args_kw
                .as_ref()
                .and_then(|kw| kw.get("precise"))
                .cloned()
                .unwrap_or(Value::Null);
            kw.insert("precise".into(), precise);
            CallOutcome::success(vec![json!(sum)]).with_args_kw(kw)
        })
        .unwrap();

    let (status, body) = post_json(
        &bridge,
        "/call",
        json!({"procedure": "math.add", "args": [1, 2, 3], "argsKw": {"precise": true}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        body,
        json!({"result": "SUCCESS", "args": [6], "argsKw": {"precise": true}, "details": {}})
    );
}

#[tokio::test]
async fn test_call_unknown_procedure() {
    let bridge = common::start_bridge().await;
    let (status, body) = post_json(&bridge, "/call", json!({"procedure": "nobody.home"})).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["result"], "ERROR");
    assert_eq!(body["error_uri"], "wamp.error.no_such_procedure");
}

#[tokio::test]
async fn test_call_without_procedure() {
    let bridge = common::start_bridge().await;
    for body in [
        json!({"args": [1]}).to_string(),
        json!({"procedure": "bad..uri"}).to_string(),
        json!({"procedure": 7}).to_string(),
        "not json".to_string(),
    ] {
        let (status, text) = post(&bridge, "/call", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "No procedure set");
    }
}

#[tokio::test]
async fn test_sdk_round_trip() {
    let bridge = common::start_bridge().await;
    let mut events = bridge.session.subscribe("sdk.topic");
    bridge
        .session
        .serve("sdk.echo", |inv| CallOutcome::success(inv.args.clone().unwrap_or_default()))
        .unwrap();

    let client = BridgeClient::new(&bridge.base_url());

    client
        .publish(&PublishRequest {
            topic: "sdk.topic".into(),
            args: vec![json!("hello")],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(events.try_recv().unwrap().args, vec![json!("hello")]);

    let reply = client
        .call(&CallRequest {
            procedure: "sdk.echo".into(),
            args: Some(vec![json!(1), json!(2)]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(
        reply,
        CallResponse::Success {
            args: Some(vec![json!(1), json!(2)]),
            args_kw: None,
            details: Map::new(),
        }
    );

    let rejected = client
        .publish(&PublishRequest {
            topic: "sdk.*".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    match rejected {
        ClientError::Rejected { status, body } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, "Bad Request: Invalid URI: sdk.*");
        }
        other => panic!("unexpected error: {}", other),
    }
}
