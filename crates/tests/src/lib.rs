//! # Integration Tests
//!
//! End-to-end scenarios across crates.
//!
//! Covers:
//! - Config file -> dispatcher -> HTTP targets (wiremock)
//! - Router -> gate -> dispatcher -> targets
//! - Failure isolation and acknowledgment latency

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(contracts::ACK_MESSAGE, "WO received.");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use access_gate::AccessGate;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::RelayBlueprint;
    use dispatcher::{create_dispatcher, FanOutDispatcher};
    use ingress::{create_router, AppState};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PORTAL: &str = "https://portal.example.com";

    /// Two HTTP targets shaped like the reference deployment
    fn reference_config(netsuite_url: &str, acumatica_url: &str) -> RelayBlueprint {
        let toml = format!(
            r#"
[access]
allowed_origins = ["{PORTAL}", "151.101.0.0/16"]

[delay]
floor_ms = 10
step_ms = 10
ceiling_ms = 100

[recorder]
kind = "none"

[[targets]]
name = "netsuite"
target_type = "http"
envelope = "body"
shape = {{ kind = "flatten", field = "location" }}
params = {{ url = "{netsuite_url}", timeout_ms = "2000" }}

[[targets]]
name = "acumatica"
target_type = "http"
envelope = "body"
params = {{ url = "{acumatica_url}", timeout_ms = "2000" }}
"#
        );
        ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap()
    }

    async fn mock_target(status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/invoke"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        server
    }

    async fn received_bodies(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| r.body_json::<Value>().unwrap())
            .collect()
    }

    fn state(blueprint: &RelayBlueprint, dispatcher: Arc<FanOutDispatcher>) -> AppState {
        AppState::new(
            AccessGate::from_config(&blueprint.access),
            dispatcher,
            blueprint.server.welcome_message.clone(),
            Duration::from_secs(5),
        )
    }

    async fn drain(dispatcher: &FanOutDispatcher) -> Vec<(String, dispatcher::MetricsSnapshot)> {
        dispatcher.shutdown(Duration::from_secs(10)).await
    }

    fn post_work_request(id: &str, body: &'static str) -> Request<Body> {
        Request::post(format!("/workrequest/{id}"))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ORIGIN, PORTAL)
            .body(Body::from(body))
            .unwrap()
    }

    /// POST /workrequest/77 reaches both targets with their own shape
    #[tokio::test]
    async fn test_e2e_post_fans_out_with_shaping() {
        let netsuite = mock_target(200).await;
        let acumatica = mock_target(200).await;
        let blueprint = reference_config(
            &format!("{}/invoke", netsuite.uri()),
            &format!("{}/invoke", acumatica.uri()),
        );
        let dispatcher = Arc::new(create_dispatcher(&blueprint).await.unwrap());

        let response = create_router(state(&blueprint, Arc::clone(&dispatcher)))
            .oneshot(post_work_request(
                "77",
                r#"{"a":1,"location":{"x":2,"y":3}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            PORTAL
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            serde_json::from_slice::<Value>(&body).unwrap(),
            json!({ "workrequest": "WO received." })
        );

        drain(&dispatcher).await;

        assert_eq!(
            received_bodies(&netsuite).await,
            vec![json!({ "body": { "a": 1, "location": { "x": 2, "y": 3 }, "x": 2, "y": 3 } })]
        );
        assert_eq!(
            received_bodies(&acumatica).await,
            vec![json!({ "body": { "a": 1, "location": { "x": 2, "y": 3 } } })]
        );
    }

    /// A failing target never affects the other one or the caller
    #[tokio::test]
    async fn test_failing_target_is_isolated() {
        let failing = mock_target(500).await;
        let healthy = mock_target(200).await;
        let blueprint = reference_config(
            &format!("{}/invoke", failing.uri()),
            &format!("{}/invoke", healthy.uri()),
        );
        let dispatcher = Arc::new(create_dispatcher(&blueprint).await.unwrap());

        let response = create_router(state(&blueprint, Arc::clone(&dispatcher)))
            .oneshot(post_work_request("42", r#"{"wo":42}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let totals: std::collections::HashMap<_, _> = drain(&dispatcher).await.into_iter().collect();

        assert_eq!(totals["netsuite"].failure_count, 1);
        assert_eq!(totals["netsuite"].delivered_count, 0);
        assert_eq!(totals["acumatica"].delivered_count, 1);
        assert_eq!(totals["acumatica"].failure_count, 0);
        assert_eq!(
            received_bodies(&healthy).await,
            vec![json!({ "body": { "wo": 42 } })]
        );
    }

    /// Acknowledgment latency does not depend on the delay or on targets
    #[tokio::test]
    async fn test_ack_is_immediate_with_long_delay_and_dead_targets() {
        let mut blueprint = reference_config(
            "http://127.0.0.1:9/invoke",
            "http://127.0.0.1:9/invoke",
        );
        blueprint.delay.floor_ms = 10_000;
        blueprint.delay.ceiling_ms = 20_000;
        let dispatcher = Arc::new(create_dispatcher(&blueprint).await.unwrap());

        let started = Instant::now();
        let response = create_router(state(&blueprint, Arc::clone(&dispatcher)))
            .oneshot(post_work_request("1", r#"{"wo":1}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(dispatcher.pending_dispatches(), 1);
        assert_eq!(dispatcher.delay().current_ms(), 10_010);
    }

    /// Concurrent requests each advance the counter exactly once
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_advance_counter_once_each() {
        let mut blueprint = reference_config(
            "http://127.0.0.1:9/invoke",
            "http://127.0.0.1:9/invoke",
        );
        blueprint.delay.floor_ms = 60_000;
        blueprint.delay.step_ms = 1;
        blueprint.delay.ceiling_ms = 120_000;
        let dispatcher = Arc::new(create_dispatcher(&blueprint).await.unwrap());
        let router = create_router(state(&blueprint, Arc::clone(&dispatcher)));

        let mut tasks = Vec::new();
        for i in 0..40 {
            let router = router.clone();
            tasks.push(tokio::spawn(async move {
                let request = Request::post(format!("/workrequest/{i}"))
                    .body(Body::from("{}"))
                    .unwrap();
                router.oneshot(request).await.unwrap().status()
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap(), StatusCode::OK);
        }

        assert_eq!(dispatcher.delay().current_ms(), 60_040);
        assert_eq!(dispatcher.pending_dispatches(), 40);
    }

    /// The file recorder keeps the raw event, independent of shaping
    #[tokio::test]
    async fn test_file_recorder_records_raw_event() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("events").join("workorders.jsonl");
        let netsuite = mock_target(200).await;
        let acumatica = mock_target(200).await;

        let mut blueprint = reference_config(
            &format!("{}/invoke", netsuite.uri()),
            &format!("{}/invoke", acumatica.uri()),
        );
        blueprint.recorder.kind = contracts::RecorderKind::File;
        blueprint
            .recorder
            .params
            .insert("path".into(), log_path.display().to_string());
        let dispatcher = Arc::new(create_dispatcher(&blueprint).await.unwrap());

        let response = create_router(state(&blueprint, Arc::clone(&dispatcher)))
            .oneshot(post_work_request("77", r#"{"location":{"x":2}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        drain(&dispatcher).await;

        let content = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        let recorded: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(recorded["work_order_id"], "77");
        assert_eq!(recorded["body"], json!({ "location": { "x": 2 } }));
    }

    /// A real server stop followed by a drain still delivers what was accepted
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_drain_after_server_stop_delivers_scheduled_work() {
        let netsuite = mock_target(200).await;
        let acumatica = mock_target(200).await;
        let mut blueprint = reference_config(
            &format!("{}/invoke", netsuite.uri()),
            &format!("{}/invoke", acumatica.uri()),
        );
        blueprint.delay.floor_ms = 500;
        blueprint.delay.ceiling_ms = 1_000;
        let dispatcher = Arc::new(create_dispatcher(&blueprint).await.unwrap());

        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(ingress::start_server(
            state(&blueprint, Arc::clone(&dispatcher)),
            addr,
            async {
                let _ = stop_rx.await;
            },
        ));

        let client = reqwest::Client::new();
        let url = format!("http://{addr}/workrequest/5");
        let mut response = None;
        for _ in 0..50 {
            match client
                .post(&url)
                .header("origin", PORTAL)
                .json(&json!({ "wo": 5 }))
                .send()
                .await
            {
                Ok(r) => {
                    response = Some(r);
                    break;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
            }
        }
        let response = response.expect("server never came up");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(dispatcher.pending_dispatches(), 1);
        drop(response);
        drop(client);

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();

        let totals: std::collections::HashMap<_, _> = drain(&dispatcher).await.into_iter().collect();

        assert_eq!(totals["netsuite"].delivered_count, 1);
        assert_eq!(totals["acumatica"].delivered_count, 1);
        assert_eq!(
            received_bodies(&acumatica).await,
            vec![json!({ "body": { "wo": 5 } })]
        );
    }

    /// Malformed bodies never reach the dispatcher
    #[tokio::test]
    async fn test_malformed_body_is_not_dispatched() {
        let netsuite = mock_target(200).await;
        let acumatica = mock_target(200).await;
        let blueprint = reference_config(
            &format!("{}/invoke", netsuite.uri()),
            &format!("{}/invoke", acumatica.uri()),
        );
        let dispatcher = Arc::new(create_dispatcher(&blueprint).await.unwrap());

        let response = create_router(state(&blueprint, Arc::clone(&dispatcher)))
            .oneshot(post_work_request("13", r#""just a string""#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        drain(&dispatcher).await;
        assert!(received_bodies(&netsuite).await.is_empty());
        assert!(received_bodies(&acumatica).await.is_empty());
    }
}
