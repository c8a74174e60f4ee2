//! Integration tests for the conversion orchestrator.
//!
//! A scripted in-memory provider stands in for the remote service, so every
//! retry/fallback path is exercised without network access. Backoff values
//! are shrunk to keep the suite fast; elapsed-time assertions use generous
//! margins so they hold on loaded CI machines.

use async_trait::async_trait;
use pdf2doc::{
    convert, ConversionConfig, ConversionObserver, ConversionRequest, ConvertError,
    GenerationParams, GenerativeProvider, ModelCandidate, ModelError,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// ── Scripted provider ────────────────────────────────────────────────────────

#[derive(Clone)]
enum Script {
    Succeed(&'static str),
    Fail {
        status: Option<u16>,
        message: &'static str,
    },
    FailThenSucceed {
        failures: u32,
        status: Option<u16>,
        message: &'static str,
        markup: &'static str,
    },
}

struct MockProvider {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    fn new(scripts: &[(&str, Script)]) -> Arc<Self> {
        Arc::new(Self {
            scripts: scripts
                .iter()
                .map(|(id, s)| (id.to_string(), s.clone()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls_for(&self, model: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == model).count()
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerativeProvider for MockProvider {
    async fn generate(
        &self,
        model: &ModelCandidate,
        _request: &ConversionRequest,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, ModelError> {
        let prior = {
            let mut calls = self.calls.lock().unwrap();
            let prior = calls.iter().filter(|c| **c == model.id).count();
            calls.push(model.id.clone());
            prior as u32
        };

        match self.scripts.get(&model.id) {
            None => Err(ModelError::new(Some(404), "model not found")),
            Some(Script::Succeed(markup)) => Ok(markup.to_string()),
            Some(Script::Fail { status, message }) => Err(ModelError::new(*status, *message)),
            Some(Script::FailThenSucceed {
                failures,
                status,
                message,
                markup,
            }) => {
                if prior < *failures {
                    Err(ModelError::new(*status, *message))
                } else {
                    Ok(markup.to_string())
                }
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn request_of_size(bytes: usize) -> ConversionRequest {
    ConversionRequest::new(vec![0u8; bytes], "application/pdf", "exam.pdf")
}

fn config_with(provider: Arc<MockProvider>, models: &[&str]) -> ConversionConfig {
    ConversionConfig::builder()
        .models(models.iter().map(|m| ModelCandidate::new(*m)).collect())
        .provider(provider as Arc<dyn GenerativeProvider>)
        .max_retries(3)
        .rate_limit_backoff_ms(60)
        .transient_backoff_ms(10)
        .build()
        .expect("valid config")
}

// ── Precondition tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn oversized_request_fails_with_zero_network_calls() {
    let provider = MockProvider::new(&[("model-a", Script::Succeed("<p>ok</p>"))]);
    let config = config_with(Arc::clone(&provider), &["model-a"]);

    // Default shared-tier ceiling is 10 MiB.
    let request = request_of_size(10 * 1024 * 1024 + 1);
    let err = convert(&request, &config).await.unwrap_err();

    assert!(matches!(err, ConvertError::SizeExceeded { .. }));
    assert_eq!(provider.total_calls(), 0, "no network call may happen");
}

#[tokio::test]
async fn request_at_the_ceiling_is_accepted() {
    let provider = MockProvider::new(&[("model-a", Script::Succeed("<p>ok</p>"))]);
    let mut config = config_with(Arc::clone(&provider), &["model-a"]);
    config.max_file_size = 1024;

    let result = convert(&request_of_size(1024), &config).await.unwrap();
    assert_eq!(result.markup, "<p>ok</p>");
}

// ── Fallback & retry tests ───────────────────────────────────────────────────

#[tokio::test]
async fn not_found_tries_model_once_then_next_without_delay() {
    let provider = MockProvider::new(&[
        (
            "model-a",
            Script::Fail {
                status: Some(404),
                message: "models/model-a is not found",
            },
        ),
        ("model-b", Script::Succeed("<p>from b</p>")),
    ]);
    let mut config = config_with(Arc::clone(&provider), &["model-a", "model-b"]);
    // A long quota backoff proves no sleep happens on the NotFound path.
    config.rate_limit_backoff_ms = 5_000;
    config.transient_backoff_ms = 5_000;

    let start = Instant::now();
    let result = convert(&request_of_size(16), &config).await.unwrap();

    assert_eq!(result.markup, "<p>from b</p>");
    assert_eq!(provider.calls_for("model-a"), 1, "exactly one attempt on A");
    assert_eq!(provider.calls_for("model-b"), 1);
    assert!(
        start.elapsed() < Duration::from_millis(4_000),
        "NotFound fallback must not sleep"
    );
}

#[tokio::test]
async fn rate_limited_sleeps_between_retries_then_falls_through() {
    let provider = MockProvider::new(&[
        (
            "model-a",
            Script::Fail {
                status: Some(429),
                message: "quota exceeded",
            },
        ),
        ("model-b", Script::Succeed("<p>from b</p>")),
    ]);
    let config = config_with(Arc::clone(&provider), &["model-a", "model-b"]);

    let start = Instant::now();
    let result = convert(&request_of_size(16), &config).await.unwrap();

    assert_eq!(result.markup, "<p>from b</p>");
    assert_eq!(
        provider.calls_for("model-a"),
        3,
        "all attempts on A before falling through"
    );
    assert_eq!(provider.calls_for("model-b"), 1);
    // Two 60 ms waits happened between A's three attempts.
    assert!(
        start.elapsed() >= Duration::from_millis(100),
        "rate-limit retries must sleep, elapsed {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn server_busy_recovers_on_the_same_model() {
    let provider = MockProvider::new(&[(
        "model-a",
        Script::FailThenSucceed {
            failures: 2,
            status: Some(503),
            message: "the model is overloaded",
            markup: "<p>third time lucky</p>",
        },
    )]);
    let config = config_with(Arc::clone(&provider), &["model-a"]);

    let result = convert(&request_of_size(16), &config).await.unwrap();
    assert_eq!(result.markup, "<p>third time lucky</p>");
    assert_eq!(provider.calls_for("model-a"), 3);
}

#[tokio::test]
async fn empty_response_is_retried_not_special_cased() {
    let provider = MockProvider::new(&[
        (
            "model-a",
            Script::Fail {
                status: None,
                message: "empty response from model",
            },
        ),
        ("model-b", Script::Succeed("<p>from b</p>")),
    ]);
    let config = config_with(Arc::clone(&provider), &["model-a", "model-b"]);

    let result = convert(&request_of_size(16), &config).await.unwrap();
    assert_eq!(result.markup, "<p>from b</p>");
    assert_eq!(provider.calls_for("model-a"), 3, "retryable, so all attempts");
}

#[tokio::test]
async fn unknown_error_abandons_model_after_one_attempt() {
    let provider = MockProvider::new(&[
        (
            "model-a",
            Script::Fail {
                status: Some(500),
                message: "internal error",
            },
        ),
        ("model-b", Script::Succeed("<p>from b</p>")),
    ]);
    let config = config_with(Arc::clone(&provider), &["model-a", "model-b"]);

    let result = convert(&request_of_size(16), &config).await.unwrap();
    assert_eq!(result.markup, "<p>from b</p>");
    assert_eq!(provider.calls_for("model-a"), 1);
}

// ── Terminal failure tests ───────────────────────────────────────────────────

#[tokio::test]
async fn fatal_client_error_aborts_without_trying_other_models() {
    let provider = MockProvider::new(&[
        (
            "model-a",
            Script::Fail {
                status: Some(400),
                message: "invalid argument: request payload malformed",
            },
        ),
        ("model-b", Script::Succeed("<p>never reached</p>")),
    ]);
    let config = config_with(Arc::clone(&provider), &["model-a", "model-b"]);

    // A 5 MB file is well within the ceiling; the abort must come from the
    // fatal classification, not preconditions.
    let err = convert(&request_of_size(5 * 1024 * 1024), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::Fatal { .. }), "got: {err:?}");
    assert_eq!(provider.calls_for("model-a"), 1);
    assert_eq!(provider.calls_for("model-b"), 0, "model B must not be tried");
}

#[tokio::test]
async fn terminal_rate_limit_yields_servers_busy_message() {
    let provider = MockProvider::new(&[
        (
            "model-a",
            Script::Fail {
                status: Some(429),
                message: "quota exceeded",
            },
        ),
        (
            "model-b",
            Script::Fail {
                status: Some(429),
                message: "quota exceeded",
            },
        ),
    ]);
    let config = config_with(Arc::clone(&provider), &["model-a", "model-b"]);

    let err = convert(&request_of_size(16), &config).await.unwrap_err();

    assert!(matches!(err, ConvertError::ServersBusy), "got: {err:?}");
    assert_eq!(provider.calls_for("model-a"), 3);
    assert_eq!(provider.calls_for("model-b"), 3);
    // Never a raw unclassified error: the message is the dedicated sentence.
    assert!(err.to_string().contains("overloaded"), "got: {err}");
}

#[tokio::test]
async fn terminal_generic_failure_yields_exhausted_with_last_error() {
    let provider = MockProvider::new(&[(
        "model-a",
        Script::Fail {
            status: Some(500),
            message: "internal error xyz",
        },
    )]);
    let config = config_with(Arc::clone(&provider), &["model-a"]);

    let err = convert(&request_of_size(16), &config).await.unwrap_err();

    match err {
        ConvertError::Exhausted { ref message } => {
            assert!(message.contains("internal error xyz"), "got: {message}")
        }
        other => panic!("expected Exhausted, got: {other:?}"),
    }
}

// ── Success-path tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn success_strips_fences_and_derives_base_name() {
    let provider = MockProvider::new(&[(
        "model-a",
        Script::Succeed("```html\n<h1>Exam</h1>\n<p>Q1</p>\n```"),
    )]);
    let config = config_with(Arc::clone(&provider), &["model-a"]);

    let result = convert(&request_of_size(16), &config).await.unwrap();
    assert_eq!(result.markup, "<h1>Exam</h1>\n<p>Q1</p>");
    assert_eq!(result.base_name, "exam");
}

#[tokio::test]
async fn first_success_stops_the_roster_walk() {
    let provider = MockProvider::new(&[
        ("model-a", Script::Succeed("<p>from a</p>")),
        ("model-b", Script::Succeed("<p>from b</p>")),
    ]);
    let config = config_with(Arc::clone(&provider), &["model-a", "model-b"]);

    let result = convert(&request_of_size(16), &config).await.unwrap();
    assert_eq!(result.markup, "<p>from a</p>");
    assert_eq!(provider.total_calls(), 1);
}

// ── Observer tests ───────────────────────────────────────────────────────────

struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl ConversionObserver for RecordingObserver {
    fn on_conversion_start(&self, file_name: &str, _size: u64) {
        self.events.lock().unwrap().push(format!("start:{file_name}"));
    }
    fn on_model_start(&self, model: &str) {
        self.events.lock().unwrap().push(format!("model:{model}"));
    }
    fn on_retry(&self, model: &str, attempt: u32, _delay: Duration) {
        self.events
            .lock()
            .unwrap()
            .push(format!("retry:{model}:{attempt}"));
    }
    fn on_model_exhausted(&self, model: &str, _error: &str) {
        self.events.lock().unwrap().push(format!("exhausted:{model}"));
    }
    fn on_conversion_complete(&self, model: &str, _markup_len: usize) {
        self.events.lock().unwrap().push(format!("done:{model}"));
    }
}

#[tokio::test]
async fn observer_sees_the_full_attempt_sequence() {
    let provider = MockProvider::new(&[
        (
            "model-a",
            Script::Fail {
                status: Some(429),
                message: "quota exceeded",
            },
        ),
        ("model-b", Script::Succeed("<p>ok</p>")),
    ]);
    let observer = Arc::new(RecordingObserver {
        events: Mutex::new(Vec::new()),
    });

    let config = ConversionConfig::builder()
        .models(vec![
            ModelCandidate::new("model-a"),
            ModelCandidate::new("model-b"),
        ])
        .provider(provider as Arc<dyn GenerativeProvider>)
        .max_retries(3)
        .rate_limit_backoff_ms(5)
        .transient_backoff_ms(5)
        .observer(Arc::clone(&observer) as Arc<dyn ConversionObserver>)
        .build()
        .unwrap();

    convert(&request_of_size(16), &config).await.unwrap();

    let events = observer.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start:exam.pdf",
            "model:model-a",
            "retry:model-a:1",
            "retry:model-a:2",
            "exhausted:model-a",
            "model:model-b",
            "done:model-b",
        ]
    );
}
