//! End-to-end behaviour of the `/feature` endpoints through the axum router.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::http::header::WWW_AUTHENTICATE;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::task::JoinSet;
use tracing::Level;

use jobgate_core::{CommandDispatcher, CommandName, FeatureCommandFactory, MAX_BODY_BYTES, Server};
use jobgate_test_utils::config::{TEST_PASS, TEST_USER, TestConfigBuilder};
use jobgate_test_utils::handlers::{FailingHandler, RecordingHandler, SpyFactory};
use jobgate_test_utils::http::{
    basic_auth, feature_router, list_request, schedule_request, schedule_request_raw, send,
};
use jobgate_test_utils::log_capture;
use jobgate_test_utils::server::TestServer;
use jobgate_test_utils::tracing_setup::init_test_tracing_with;

fn auth() -> String {
    basic_auth(TEST_USER, TEST_PASS)
}

// ── Registration gating ─────────────────────────────────────────────────

#[tokio::test]
async fn test_feature_disabled_is_plain_not_found() {
    let server = TestServer::with_toml("[daemons]\nfeature = false\n").await;

    let resp = send(server.router(), list_request(Some(&auth()))).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.headers.get(WWW_AUTHENTICATE).is_none());

    let resp = send(
        server.router(),
        schedule_request(Some(&auth()), &json!({"daemonTarget": "d"})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feature_key_absent_is_plain_not_found() {
    let server = TestServer::default_config().await;
    let resp = send(server.router(), list_request(None)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_is_always_served() {
    let server = TestServer::default_config().await;
    let resp = send(
        server.router(),
        axum::http::Request::get("/health")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "ok");
    assert!(resp.body["gitHash"].is_string());
}

// ── Credential gate ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_credentials_never_reach_factory_or_dispatcher() {
    let factory = SpyFactory::new();
    let list = RecordingHandler::returning(json!([]));
    let schedule = RecordingHandler::echo();
    let dispatcher = CommandDispatcher::new()
        .with_handler(CommandName::ListDaemons, list.clone())
        .with_handler(CommandName::ScheduleJob, schedule.clone());
    let router = feature_router(
        TestConfigBuilder::new().with_feature().settings().as_ref(),
        factory.clone(),
        dispatcher,
    );

    let resp = send(router.clone(), list_request(None)).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body, json!({"error": "unauthorized"}));
    assert_eq!(
        resp.headers.get(WWW_AUTHENTICATE).unwrap(),
        "Basic realm=\"Protected\""
    );

    let resp = send(
        router,
        schedule_request(None, &json!({"daemonTarget": "feature-1"})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    assert_eq!(factory.build_count(), 0);
    assert_eq!(list.call_count(), 0);
    assert_eq!(schedule.call_count(), 0);
}

#[tokio::test]
async fn test_wrong_credentials_are_rejected() {
    let factory = SpyFactory::new();
    let schedule = RecordingHandler::echo();
    let dispatcher =
        CommandDispatcher::new().with_handler(CommandName::ScheduleJob, schedule.clone());
    let router = feature_router(
        TestConfigBuilder::new().with_feature().settings().as_ref(),
        factory.clone(),
        dispatcher,
    );

    let attempts = [
        basic_auth(TEST_USER, "wrong"),
        basic_auth("intruder", TEST_PASS),
        basic_auth("", ""),
        "Bearer abc".to_string(),
        "Basic !!!not-base64".to_string(),
    ];
    for header in attempts {
        let resp = send(
            router.clone(),
            schedule_request(Some(&header), &json!({"daemonTarget": "feature-1"})),
        )
        .await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED, "header {header:?}");
    }

    assert_eq!(factory.build_count(), 0);
    assert_eq!(schedule.call_count(), 0);
}

#[tokio::test]
async fn test_auth_runs_before_body_is_parsed() {
    let factory = SpyFactory::new();
    let router = feature_router(
        TestConfigBuilder::new().with_feature().settings().as_ref(),
        factory.clone(),
        CommandDispatcher::new(),
    );

    let resp = send(router, schedule_request_raw(None, "{not json")).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(factory.build_count(), 0);
}

#[tokio::test]
async fn test_oversized_body_is_gated_before_it_is_read() {
    let factory = SpyFactory::new();
    let router = feature_router(
        TestConfigBuilder::new().with_feature().settings().as_ref(),
        factory.clone(),
        CommandDispatcher::new().with_handler(CommandName::ScheduleJob, RecordingHandler::echo()),
    );
    let oversized = vec![b'x'; 3 * MAX_BODY_BYTES];

    let resp = send(router.clone(), schedule_request_raw(None, oversized.clone())).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body, json!({"error": "unauthorized"}));
    assert!(resp.headers.get(WWW_AUTHENTICATE).is_some());
    assert_eq!(factory.build_count(), 0);

    let resp = send(router, schedule_request_raw(Some(&auth()), oversized)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "malformed_payload");
    assert_eq!(resp.body["field"], "body");
    assert_eq!(factory.build_count(), 0);
}

// ── listDaemons ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_daemons_with_empty_stub_returns_empty_array() {
    let list = RecordingHandler::returning(json!([]));
    let dispatcher = CommandDispatcher::new().with_handler(CommandName::ListDaemons, list.clone());
    let router = feature_router(
        TestConfigBuilder::new().with_feature().settings().as_ref(),
        Arc::new(FeatureCommandFactory),
        dispatcher,
    );

    let resp = send(router, list_request(Some(&auth()))).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!([]));

    let calls = list.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].is_empty());
}

#[tokio::test]
async fn test_list_daemons_reports_configured_roster() {
    let server = TestServer::with_toml(
        r#"
        [daemons]
        feature = true

        [[daemons.roster]]
        identifier = "feature-1"
        status = "idle"

        [[daemons.roster]]
        identifier = "feature-2"
        status = "busy"

        [feature]
        user = "scheduler"
        pass = "s3cret"
        "#,
    )
    .await;

    let resp = send(server.router(), list_request(Some(&auth()))).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.body,
        json!([
            {"identifier": "feature-1", "status": "idle"},
            {"identifier": "feature-2", "status": "busy"},
        ])
    );
}

// ── scheduleJob ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_accepted_versions_reach_the_dispatcher() {
    let schedule = RecordingHandler::echo();
    let dispatcher =
        CommandDispatcher::new().with_handler(CommandName::ScheduleJob, schedule.clone());
    let router = feature_router(
        TestConfigBuilder::new().with_feature().settings().as_ref(),
        Arc::new(FeatureCommandFactory),
        dispatcher,
    );

    for version in ["", "1", "1.2", "1.2.3", "1.*", "2.*"] {
        let resp = send(
            router.clone(),
            schedule_request(
                Some(&auth()),
                &json!({"daemonTarget": "feature-1", "version": version}),
            ),
        )
        .await;
        assert_eq!(resp.status, StatusCode::ACCEPTED, "version {version:?}");
    }

    let versions: Vec<Option<String>> = schedule
        .calls()
        .iter()
        .map(|payload| payload.get("version").and_then(Value::as_str).map(String::from))
        .collect();
    assert_eq!(
        versions,
        vec![
            None,
            Some("1".to_string()),
            Some("1.2".to_string()),
            Some("1.2.3".to_string()),
            Some("1.*".to_string()),
            Some("2.*".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_rejected_versions_are_bad_requests() {
    let schedule = RecordingHandler::echo();
    let dispatcher =
        CommandDispatcher::new().with_handler(CommandName::ScheduleJob, schedule.clone());
    let router = feature_router(
        TestConfigBuilder::new().with_feature().settings().as_ref(),
        Arc::new(FeatureCommandFactory),
        dispatcher,
    );

    for version in ["v1", "1.2.3.4", "a.b", "1..2"] {
        let resp = send(
            router.clone(),
            schedule_request(
                Some(&auth()),
                &json!({"daemonTarget": "feature-1", "version": version}),
            ),
        )
        .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "version {version:?}");
        assert_eq!(resp.body["error"], "invalid_version");
        assert_eq!(resp.body["field"], "version");
    }
    assert_eq!(schedule.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_bodies_name_the_field() {
    let router = feature_router(
        TestConfigBuilder::new().with_feature().settings().as_ref(),
        Arc::new(FeatureCommandFactory),
        CommandDispatcher::new(),
    );

    let cases = [
        (json!({}), "daemonTarget"),
        (json!({"daemonTarget": 7}), "daemonTarget"),
        (json!({"daemonTarget": "d", "parameters": [1]}), "parameters"),
        (json!(["daemonTarget"]), "body"),
    ];
    for (body, field) in cases {
        let resp = send(router.clone(), schedule_request(Some(&auth()), &body)).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(resp.body["error"], "malformed_payload");
        assert_eq!(resp.body["field"], field);
    }
}

#[tokio::test]
async fn test_scheduled_job_lands_in_the_queue() {
    let server = TestServer::with_toml(
        "[daemons]\nfeature = true\n[feature]\nuser = \"scheduler\"\npass = \"s3cret\"\n",
    )
    .await;
    let mut jobs = server.server.take_job_receiver().unwrap();

    let resp = send(
        server.router(),
        schedule_request(
            Some(&auth()),
            &json!({
                "daemonTarget": "feature-1",
                "version": "2.*",
                "parameters": {"userId": 42},
            }),
        ),
    )
    .await;
    assert_eq!(resp.status, StatusCode::ACCEPTED);
    assert_eq!(resp.body["daemonTarget"], "feature-1");
    assert_eq!(resp.body["status"], "queued");

    let job = jobs.recv().await.unwrap();
    assert_eq!(Some(job.id), resp.body["jobId"].as_u64());
    assert_eq!(job.request.version.as_deref(), Some("2.*"));
    assert_eq!(job.request.parameters["userId"], 42);
}

#[tokio::test]
async fn test_full_queue_fails_instead_of_dropping_jobs() {
    init_test_tracing_with("jobgate_core=warn");
    let config = TestConfigBuilder::new().with_feature().bus_capacity(2).build();
    let server = Server::new(config).unwrap();
    let mut jobs = server.take_job_receiver().unwrap();
    let router = server.route_table().unwrap().into_router();

    let mut accepted = Vec::new();
    let mut failed = 0;
    for i in 0..5 {
        let resp = send(
            router.clone(),
            schedule_request(Some(&auth()), &json!({"daemonTarget": format!("daemon-{i}")})),
        )
        .await;
        if resp.status == StatusCode::ACCEPTED {
            accepted.push(resp.body["jobId"].as_u64().unwrap());
        } else {
            assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(resp.body, json!({"error": "internal_error"}));
            failed += 1;
        }
    }
    assert_eq!(accepted.len(), 2);
    assert_eq!(failed, 3);

    // Every acknowledged job is delivered, and nothing else is.
    let mut delivered = Vec::new();
    while let Ok(job) = jobs.try_recv() {
        delivered.push(job.id);
    }
    assert_eq!(delivered, accepted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_schedules_dispatch_exactly_once_each() {
    let schedule = RecordingHandler::echo();
    let dispatcher =
        CommandDispatcher::new().with_handler(CommandName::ScheduleJob, schedule.clone());
    let router = feature_router(
        TestConfigBuilder::new().with_feature().settings().as_ref(),
        Arc::new(FeatureCommandFactory),
        dispatcher,
    );

    let mut tasks = JoinSet::new();
    for i in 0..100 {
        let router = router.clone();
        tasks.spawn(async move {
            let body = json!({"daemonTarget": format!("daemon-{i}"), "parameters": {"seq": i}});
            let resp = send(router, schedule_request(Some(&auth()), &body)).await;
            (i, resp)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (i, resp) = joined.unwrap();
        assert_eq!(resp.status, StatusCode::ACCEPTED);
        assert_eq!(resp.body["daemonTarget"], format!("daemon-{i}"));
        assert_eq!(resp.body["parameters"]["seq"], i);
    }

    let calls = schedule.calls();
    assert_eq!(calls.len(), 100);
    let targets: BTreeSet<String> = calls
        .iter()
        .map(|payload| payload["daemonTarget"].as_str().unwrap().to_string())
        .collect();
    let expected: BTreeSet<String> = (0..100).map(|i| format!("daemon-{i}")).collect();
    assert_eq!(targets, expected);
    for payload in &calls {
        let target = payload["daemonTarget"].as_str().unwrap();
        let seq = payload["parameters"]["seq"].as_u64().unwrap();
        assert_eq!(target, format!("daemon-{seq}"));
    }
}

// ── Dispatch failures ───────────────────────────────────────────────────

#[tokio::test]
async fn test_unknown_command_is_internal_error_and_logged() {
    let (logs, _guard) = log_capture::capture();
    let router = feature_router(
        TestConfigBuilder::new().with_feature().settings().as_ref(),
        Arc::new(FeatureCommandFactory),
        CommandDispatcher::new().with_handler(CommandName::ListDaemons, RecordingHandler::echo()),
    );

    let resp = send(
        router,
        schedule_request(Some(&auth()), &json!({"daemonTarget": "feature-1"})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body, json!({"error": "internal_error"}));
    assert!(logs.contains(Level::ERROR, "no handler registered"));
    let miswired = logs.at_level(Level::ERROR);
    assert!(miswired.iter().any(|e| e.target == "jobgate_core::dispatch"));
}

#[tokio::test]
async fn test_handler_failure_is_internal_error_and_logged() {
    let (logs, _guard) = log_capture::capture();
    let router = feature_router(
        TestConfigBuilder::new().with_feature().settings().as_ref(),
        Arc::new(FeatureCommandFactory),
        CommandDispatcher::new()
            .with_handler(CommandName::ListDaemons, FailingHandler::new("backend down")),
    );

    let resp = send(router, list_request(Some(&auth()))).await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body, json!({"error": "internal_error"}));
    assert!(logs.contains(Level::ERROR, "command handler failed"));
    // The client never sees the handler's message.
    assert!(!resp.body.to_string().contains("backend down"));
}

#[tokio::test]
async fn test_auth_failure_logs_without_credentials() {
    let (logs, _guard) = log_capture::capture();
    let router = feature_router(
        TestConfigBuilder::new().with_feature().settings().as_ref(),
        Arc::new(FeatureCommandFactory),
        CommandDispatcher::new(),
    );

    let header = basic_auth(TEST_USER, "hunter2");
    let resp = send(router, list_request(Some(&header))).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let rejected = logs.at_level(Level::DEBUG);
    assert!(rejected.iter().any(|e| e.message.contains("credential gate")));
    for entry in logs.entries() {
        assert!(!entry.fields.contains("hunter2"));
        assert!(!entry.message.contains("hunter2"));
    }
}
