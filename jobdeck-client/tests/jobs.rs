use jobdeck_client::{ClientError, SchedulerClient, SubmitError, SubmitGuard};
use jobdeck_core::domain::job::{HttpMethod, HttpRequest, JobStatus, TriggerKind};
use jobdeck_core::dto::job::{CreateJob, TriggerSpec};
use jobdeck_core::form::JobForm;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn job_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": null,
        "status": status,
        "trigger": { "type": "cron", "fields": {
            "minute": "0", "hour": "9", "day": "*", "month": "*", "day_of_week": "1"
        }},
        "next_run_time": "2030-01-07T09:00:00Z",
        "request": { "url": "https://x.test/hook", "method": "POST", "headers": null, "body": null },
        "result": null,
        "created_at": "2030-01-01T00:00:00Z"
    })
}

fn completed_json(id: &str, completed_at: &str) -> Value {
    json!({
        "id": id,
        "status": "completed-response-error",
        "trigger": { "type": "one-time", "fields": { "date": null } },
        "request": { "url": "https://x.test/hook", "method": "GET" },
        "result": {
            "completed_at": completed_at,
            "error_message": null,
            "response": { "status_code": 502, "headers": null, "body": "bad gateway" }
        },
        "created_at": "2030-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn test_list_jobs() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            job_json("a", "active"),
            job_json("b", "paused"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = SchedulerClient::new(server.uri());
    let jobs = client.list_jobs().await?;

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[1].status, JobStatus::Paused);
    assert_eq!(jobs[0].trigger.kind(), TriggerKind::Cron);
    assert_eq!(jobs[0].trigger.cron_expression().as_deref(), Some("0 9 * * 1"));
    Ok(())
}

#[tokio::test]
async fn test_list_completed_jobs() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/completed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            completed_json("r", "2030-01-02T00:00:00Z"),
            completed_json("r", "2030-01-03T00:00:00Z"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let jobs = SchedulerClient::new(server.uri()).list_completed_jobs().await?;

    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().all(|job| job.is_completed()));
    assert_ne!(jobs[0].completed_at(), jobs[1].completed_at());
    Ok(())
}

#[tokio::test]
async fn test_get_missing_job_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such job"))
        .mount(&server)
        .await;

    let err = SchedulerClient::new(server.uri())
        .get_job("gone")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, ClientError::NotFound(ref id) if id == "gone"));
}

#[tokio::test]
async fn test_create_job_sends_payload() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(body_json(json!({
            "request": { "url": "https://x.test/hook", "method": "POST", "headers": null, "body": null },
            "trigger": { "cron": "0 9 * * 1" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(job_json("new", "active")))
        .expect(1)
        .mount(&server)
        .await;

    let payload = CreateJob {
        id: None,
        name: None,
        request: HttpRequest {
            url: "https://x.test/hook".to_string(),
            method: HttpMethod::Post,
            headers: None,
            body: None,
        },
        trigger: TriggerSpec::Cron {
            cron: "0 9 * * 1".to_string(),
        },
    };

    let job = SchedulerClient::new(server.uri()).create_job(&payload).await?;
    assert_eq!(job.id, "new");
    Ok(())
}

#[tokio::test]
async fn test_update_uses_path_id() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/jobs/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("a", "active")))
        .expect(1)
        .mount(&server)
        .await;

    let payload = CreateJob {
        id: None,
        name: Some("weekly".to_string()),
        request: HttpRequest {
            url: "https://x.test/hook".to_string(),
            method: HttpMethod::Get,
            headers: None,
            body: None,
        },
        trigger: TriggerSpec::Delay { delay: 30.0 },
    };

    let job = SchedulerClient::new(server.uri())
        .update_job("a", &payload)
        .await?;
    assert_eq!(job.id, "a");
    Ok(())
}

#[tokio::test]
async fn test_pause_resume_delete_ignore_body() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs/a/pause"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/jobs/a/resume"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/jobs/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deleted": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SchedulerClient::new(server.uri());
    client.pause_job("a").await?;
    client.resume_job("a").await?;
    client.remove_job("a").await?;
    Ok(())
}

#[tokio::test]
async fn test_non_success_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs/a/pause"))
        .respond_with(ResponseTemplate::new(409).set_body_string("already paused"))
        .mount(&server)
        .await;

    let err = SchedulerClient::new(server.uri())
        .pause_job("a")
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "already paused");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = SchedulerClient::new(server.uri())
        .list_jobs()
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)));
}

#[tokio::test]
async fn test_submit_form_against_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(body_json(json!({
            "id": "nightly",
            "request": {
                "url": "https://x.test/hook",
                "method": "GET",
                "headers": { "X-Token": "t" },
                "body": null
            },
            "trigger": { "delay": 90 }
        })))
        .respond_with(ResponseTemplate::new(500).set_body_string("scheduler down"))
        .expect(1)
        .mount(&server)
        .await;

    let mut form = JobForm::new();
    form.id = "nightly".to_string();
    form.url = "https://x.test/hook".to_string();
    form.headers = r#"{"X-Token": "t"}"#.to_string();
    form.delay = "90".to_string();

    let guard = SubmitGuard::new();
    let err = guard
        .submit(&SchedulerClient::new(server.uri()), &form)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::Remote(ref e) if e.is_server_error()));
    assert!(!guard.is_busy());
}
