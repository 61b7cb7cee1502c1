use std::sync::Arc;
use std::time::Duration;

use fitment_engine::{
    submit, ApiSettings, FailureKind, FitmentApi, JobError, ProgressSample, ReqwestApi,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> ReqwestApi {
    let settings = ApiSettings {
        base_url: server.uri(),
        ..ApiSettings::default()
    };
    ReqwestApi::new(&settings).expect("client")
}

#[tokio::test]
async fn start_job_posts_comma_joined_hostnames() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/check"))
        .and(body_json(json!({ "hostnames": "vm1,vm2,vm2" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let targets = vec!["vm1".to_string(), "vm2".to_string(), "vm2".to_string()];

    submit(&api, &targets).await.expect("submit ok");
}

#[tokio::test]
async fn start_job_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/check"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let err = submit(&api, &["vm1".to_string()]).await.unwrap_err();

    match err {
        JobError::SubmissionFailed(cause) => {
            assert_eq!(cause.kind, FailureKind::HttpStatus(503))
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn start_job_fails_when_backend_unreachable() {
    let settings = ApiSettings {
        base_url: "http://127.0.0.1:1".to_string(),
        connect_timeout: Duration::from_millis(200),
        ..ApiSettings::default()
    };
    let api = ReqwestApi::new(&settings).unwrap();

    let err = submit(&api, &["vm1".to_string()]).await.unwrap_err();
    assert!(matches!(
        err,
        JobError::SubmissionFailed(ref cause)
            if matches!(cause.kind, FailureKind::Network | FailureKind::Timeout)
    ));
}

#[tokio::test]
async fn read_progress_decodes_counters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 3, "processed": 2 })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    assert_eq!(api.read_progress().await.unwrap(), ProgressSample::new(3, 2));
}

#[tokio::test]
async fn read_progress_defaults_missing_fields_to_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "queued" })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    assert_eq!(api.read_progress().await.unwrap(), ProgressSample::default());
}

#[tokio::test]
async fn read_progress_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/progress"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let err = api.read_progress().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(502));
}

#[tokio::test]
async fn read_progress_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/progress"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({ "total": 1, "processed": 1 })),
        )
        .mount(&server)
        .await;

    let settings = ApiSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ApiSettings::default()
    };
    let api = ReqwestApi::new(&settings).unwrap();

    let err = api.read_progress().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn poller_against_http_backend_completes() {
    use fitment_engine::{PollDecision, PollOutcome, PollSettings, Poller};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 2, "processed": 2 })))
        .expect(1)
        .mount(&server)
        .await;

    let api: Arc<dyn FitmentApi> = Arc::new(api_for(&server));
    let settings = PollSettings {
        interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(10),
    };
    let handle = Poller::new(api, settings).start(
        1,
        ProgressSample::new(2, 0),
        |sample| PollDecision::for_sample(&sample),
        |_| {},
    );

    assert_eq!(
        handle.join().await,
        PollOutcome::Completed(ProgressSample::new(2, 2))
    );
}
