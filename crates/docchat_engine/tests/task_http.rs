use docchat_engine::{
    ClientSettings, HttpTaskClient, Mode, SubmitRequest, TaskApi, TaskError, TaskStatus,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> ClientSettings {
    ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    }
}

fn request() -> SubmitRequest {
    SubmitRequest {
        prompt: "What is the total?".to_string(),
        document_ids: vec!["d1".to_string()],
        mode: Mode::Retrieval,
    }
}

#[tokio::test]
async fn submit_sends_camel_case_body_and_returns_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent-task"))
        .and(body_json(json!({
            "prompt": "What is the total?",
            "documentIds": ["d1"],
            "userId": "demo",
            "mode": "retrieval",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "taskId": "task_17",
            "sessionId": "sess_17",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpTaskClient::new(&settings(&server)).expect("client");
    let receipt = client.submit(&request()).await.expect("submit ok");

    assert_eq!(receipt.task_id, "task_17");
    assert_eq!(receipt.session_id.as_deref(), Some("sess_17"));
}

#[tokio::test]
async fn submit_maps_non_success_to_submission_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent-task"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = HttpTaskClient::new(&settings(&server)).expect("client");
    let err = client.submit(&request()).await.unwrap_err();
    assert_eq!(err, TaskError::SubmissionStatus(500));
}

#[tokio::test]
async fn poll_reads_status_result_and_error() {
    let server = MockServer::start().await;
    let payload = r#"{"text":"42","sources":[{"documentId":"d1","pages":[1,2]}]}"#;
    Mock::given(method("GET"))
        .and(path("/agent-task"))
        .and(query_param("taskId", "task_17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "taskId": "task_17",
            "status": "COMPLETED",
            "result": payload,
        })))
        .mount(&server)
        .await;

    let client = HttpTaskClient::new(&settings(&server)).expect("client");
    let snapshot = client.poll("task_17").await.expect("poll ok");

    assert_eq!(snapshot.status, TaskStatus::Completed);
    assert_eq!(snapshot.result.as_deref(), Some(payload));
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn poll_treats_running_as_pending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agent-task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "taskId": "task_17",
            "status": "RUNNING",
        })))
        .mount(&server)
        .await;

    let client = HttpTaskClient::new(&settings(&server)).expect("client");
    let snapshot = client.poll("task_17").await.expect("poll ok");
    assert_eq!(snapshot.status, TaskStatus::Pending);
    assert!(!snapshot.status.is_terminal());
}

#[tokio::test]
async fn poll_maps_non_success_to_poll_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agent-task"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = HttpTaskClient::new(&settings(&server)).expect("client");
    let err = client.poll("task_404").await.unwrap_err();
    assert_eq!(err, TaskError::PollStatus(404));
}

#[tokio::test]
async fn baseline_mode_is_sent_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent-task"))
        .and(body_json(json!({
            "prompt": "hello",
            "documentIds": [],
            "userId": "demo",
            "mode": "baseline",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"taskId": "task_1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpTaskClient::new(&settings(&server)).expect("client");
    let receipt = client
        .submit(&SubmitRequest {
            prompt: "hello".to_string(),
            document_ids: Vec::new(),
            mode: Mode::Baseline,
        })
        .await
        .expect("submit ok");

    assert_eq!(receipt.task_id, "task_1");
    assert_eq!(receipt.session_id, None);
}
