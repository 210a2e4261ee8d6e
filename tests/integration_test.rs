use poetry_camera::capture::CaptureService;
use poetry_camera::clients::{OpenAiComposer, ReplicateDescriber};
use poetry_camera::mock::{LedState, MockRig};
use poetry_camera::model::{SessionOutcome, SessionState};
use poetry_camera::receipt::{PrintRenderer, DEFAULT_ATTRIBUTION, DEFAULT_ARCHIVE_URL};
use poetry_camera::session::{FailureKind, RetryPolicy, SessionOrchestrator};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CAPTION: &str = "a dog running on a beach at sunset";
const POEM: &str = "the sun sinks low on the shore,\n\
paws press prints in wet sand,\n\
gold light on a running coat,\n\
the waves keep time with him,\n\
wind combs salt through fur,\n\
the sky burns down to amber,\n\
no leash, no clock, no hurry,\n\
just this run, this evening.";

struct Services {
    replicate: MockServer,
    openai: MockServer,
}

impl Services {
    async fn start() -> Self {
        Self {
            replicate: MockServer::start().await,
            openai: MockServer::start().await,
        }
    }

    fn orchestrator(&self, rig: &MockRig, photo: &Path, timeout: Duration) -> SessionOrchestrator {
        let describer =
            ReplicateDescriber::new(&self.replicate.uri(), "r8_test", "blip-2:test", timeout)
                .unwrap();
        let composer =
            OpenAiComposer::new(&self.openai.uri(), "sk-test", "gpt-test", timeout).unwrap();
        SessionOrchestrator::new(
            CaptureService::new(Arc::new(rig.camera.clone()), 0, photo),
            Arc::new(describer),
            Arc::new(composer),
            PrintRenderer::default(),
            Box::new(rig.printer.clone()),
            Box::new(rig.led.clone()),
        )
    }
}

fn caption_ok() -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(json!({
        "id": "p-1",
        "status": "succeeded",
        "output": CAPTION,
    }))
}

fn poem_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": POEM } }]
    }))
}

/// Full flow: mocked camera and printer, real HTTP clients against local
/// servers.
#[tokio::test]
async fn shutter_press_prints_a_poem() {
    let services = Services::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .and(header("authorization", "Bearer r8_test"))
        .respond_with(caption_ok())
        .expect(1)
        .mount(&services.replicate)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(poem_ok())
        .expect(1)
        .mount(&services.openai)
        .await;

    let rig = MockRig::new();
    rig.camera.expect_read().return_frame(b"\xFF\xD8jpeg".to_vec());
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("image.jpg");
    let mut orchestrator = services.orchestrator(&rig, &photo, Duration::from_secs(5));

    let report = orchestrator.on_shutter_pressed().await.unwrap();

    assert!(report.is_completed());
    assert_eq!(
        report.history,
        vec![
            SessionState::Idle,
            SessionState::Capturing,
            SessionState::Describing,
            SessionState::Composing,
            SessionState::Printing,
            SessionState::Completed,
        ]
    );
    assert_eq!(std::fs::read(&photo).unwrap(), b"\xFF\xD8jpeg");
    assert_eq!(rig.camera.close_count(), 1);

    let requests = services.openai.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains(&format!("Scene description: {}", CAPTION)));

    let lines = rig.printer.lines();
    let poem_lines: Vec<&str> = POEM.lines().collect();
    assert_eq!(&lines[7..15], poem_lines.as_slice());
    assert!(lines.contains(&DEFAULT_ATTRIBUTION.to_string()));
    assert!(lines.contains(&DEFAULT_ARCHIVE_URL.to_string()));
    assert!(lines.ends_with(&vec![String::new(); 5]));
    assert_eq!(rig.led.states(), vec![LedState::Blink, LedState::Off]);
    assert_eq!(orchestrator.state(), SessionState::Idle);
}

#[tokio::test]
async fn camera_failure_makes_no_network_calls() {
    let services = Services::start().await;
    Mock::given(method("POST"))
        .respond_with(caption_ok())
        .expect(0)
        .mount(&services.replicate)
        .await;
    Mock::given(method("POST"))
        .respond_with(poem_ok())
        .expect(0)
        .mount(&services.openai)
        .await;

    let rig = MockRig::new();
    rig.camera.expect_read().return_none();
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("image.jpg");
    let mut orchestrator = services.orchestrator(&rig, &photo, Duration::from_secs(5));

    let report = orchestrator.on_shutter_pressed().await.unwrap();

    let failure = report.failure().expect("session should fail");
    assert_eq!(failure.kind, FailureKind::CameraUnavailable);
    assert_eq!(failure.step, SessionState::Capturing);
    assert!(!photo.exists());
    assert!(rig.printer.ops().is_empty());
    assert_eq!(rig.led.current(), Some(LedState::Off));
}

#[tokio::test]
async fn caption_service_error_skips_generation() {
    let services = Services::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .expect(1)
        .mount(&services.replicate)
        .await;
    Mock::given(method("POST"))
        .respond_with(poem_ok())
        .expect(0)
        .mount(&services.openai)
        .await;

    let rig = MockRig::new();
    rig.camera.expect_read().return_frame(b"jpeg".to_vec());
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator =
        services.orchestrator(&rig, &dir.path().join("image.jpg"), Duration::from_secs(5));

    let report = orchestrator.on_shutter_pressed().await.unwrap();

    match &report.outcome {
        SessionOutcome::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::ServiceError);
            assert_eq!(failure.step, SessionState::Describing);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(rig.printer.ops().is_empty());
}

#[tokio::test]
async fn generation_timeout_fails_the_session() {
    let services = Services::start().await;
    Mock::given(method("POST"))
        .respond_with(caption_ok())
        .mount(&services.replicate)
        .await;
    Mock::given(method("POST"))
        .respond_with(poem_ok().set_delay(Duration::from_secs(2)))
        .mount(&services.openai)
        .await;

    let rig = MockRig::new();
    rig.camera.expect_read().return_frame(b"jpeg".to_vec());
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = services.orchestrator(
        &rig,
        &dir.path().join("image.jpg"),
        Duration::from_millis(200),
    );

    let report = orchestrator.on_shutter_pressed().await.unwrap();

    let failure = report.failure().expect("session should fail");
    assert_eq!(failure.kind, FailureKind::Timeout);
    assert_eq!(failure.step, SessionState::Composing);
    assert!(rig.printer.ops().is_empty());
    assert_eq!(rig.led.current(), Some(LedState::Off));
}

#[tokio::test]
async fn transient_timeout_is_retried_when_enabled() {
    let services = Services::start().await;
    Mock::given(method("POST"))
        .respond_with(caption_ok().set_delay(Duration::from_secs(2)))
        .up_to_n_times(1)
        .mount(&services.replicate)
        .await;
    Mock::given(method("POST"))
        .respond_with(caption_ok())
        .mount(&services.replicate)
        .await;
    Mock::given(method("POST"))
        .respond_with(poem_ok())
        .expect(1)
        .mount(&services.openai)
        .await;

    let rig = MockRig::new();
    rig.camera.expect_read().return_frame(b"jpeg".to_vec());
    let dir = tempfile::tempdir().unwrap();
    let mut orchestrator = services
        .orchestrator(
            &rig,
            &dir.path().join("image.jpg"),
            Duration::from_millis(200),
        )
        .with_retry(RetryPolicy {
            attempts: 2,
            backoff: Duration::from_millis(10),
        });

    let report = orchestrator.on_shutter_pressed().await.unwrap();

    assert!(report.is_completed());
    assert_eq!(services.replicate.received_requests().await.unwrap().len(), 2);
    assert!(rig.printer.lines().contains(&"the waves keep time with him,".to_string()));
}
