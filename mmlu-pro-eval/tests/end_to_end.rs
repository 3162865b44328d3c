//! End-to-end evaluation against an in-process chat-completion server.
//!
//! The fake server answers every prompt with "The answer is (B)" unless the
//! question text contains `FAIL`, in which case it returns HTTP 500. Dataset
//! files are written to a temporary directory in JSON Lines form.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

use mmlu_pro_eval::{
    config::Config,
    providers::create_provider,
    runner::{Dispatcher, DispatcherConfig, Orchestrator},
    store::{result_path, summary_path, ResultStore},
    tasks::{load_split, ResultRecord},
};

// =============================================================================
// Fake endpoint
// =============================================================================

async fn chat(State(calls): State<Arc<AtomicUsize>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    calls.fetch_add(1, Ordering::SeqCst);
    let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
    let target = prompt.rsplit("Question: ").next().unwrap_or_default();

    if target.contains("FAIL") {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "overloaded"})));
    }

    (
        StatusCode::OK,
        Json(json!({
            "model": body["model"],
            "choices": [{
                "message": {"role": "assistant", "content": "Let me think. **The answer is (B)**"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        })),
    )
}

async fn start_server(calls: Arc<AtomicUsize>) -> String {
    let app = Router::new()
        .route("/v1/chat/completions", post(chat))
        .with_state(calls);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

// =============================================================================
// Helpers
// =============================================================================

fn question(id: i64, category: &str, text: &str, answer_index: usize) -> Value {
    let letters = ["A", "B", "C", "D"];
    json!({
        "question_id": id,
        "question": text,
        "options": ["one", "two", "three", "N/A"],
        "answer": letters[answer_index],
        "answer_index": answer_index,
        "cot_content": "",
        "category": category,
        "src": format!("ori_mmlu-{}", category)
    })
}

fn write_jsonl(path: &Path, rows: &[Value]) {
    let lines: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
    std::fs::write(path, lines.join("\n")).unwrap();
}

fn write_dataset(dir: &Path) {
    write_jsonl(
        &dir.join("test.jsonl"),
        &[
            question(1, "math", "What is 1+1?", 1),
            question(2, "math", "What is 3-1?", 0),
            question(3, "law", "Is this legal?", 1),
            question(4, "math", "FAIL this one", 1),
            question(5, "law", "Is that legal?", 2),
        ],
    );
    write_jsonl(
        &dir.join("validation.jsonl"),
        &[json!({
            "question_id": 100,
            "question": "What is 2+2?",
            "options": ["3", "4"],
            "answer": "B",
            "answer_index": 1,
            "cot_content": "A: Let's think step by step. 2+2=4. The answer is (B).",
            "category": "math",
            "src": "ori_mmlu-math"
        })],
    );
}

fn config_for(url: &str, data_dir: &Path, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.endpoint.base_url = url.to_string();
    config.run.data_dir = data_dir.display().to_string();
    config.run.output_dir = output_dir.display().to_string();
    config.run.batch_size = 2;
    config.run.max_concurrent = 3;
    config.run.timeout_ms = 5_000;
    config
}

fn orchestrator(config: &Config) -> Orchestrator {
    let provider = create_provider(config, "fake-model").unwrap();
    let dispatcher = Dispatcher::new(provider, DispatcherConfig::from(config));
    Orchestrator::new(
        dispatcher,
        ResultStore::seeded(config.run.seed),
        &config.run.output_dir,
        config.run.batch_size,
    )
}

fn read_records(dir: &Path, subject: &str) -> Vec<ResultRecord> {
    serde_json::from_str(&std::fs::read_to_string(result_path(dir, subject)).unwrap()).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_full_run_writes_results_and_summaries() {
    let calls = Arc::new(AtomicUsize::new(0));
    let url = start_server(calls.clone()).await;
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_dataset(data.path());

    let config = config_for(&url, data.path(), out.path());
    let test = load_split(data.path(), "test").unwrap();
    let validation = load_split(data.path(), "validation").unwrap();

    let outcomes = orchestrator(&config)
        .evaluate(&test, &validation, &[])
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].category, "math");
    assert_eq!(outcomes[1].category, "law");
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    let math = read_records(out.path(), "math");
    assert_eq!(math.len(), 3);
    let failed = math.iter().find(|r| r.question_id() == 4).unwrap();
    assert!(failed.pred.is_none());
    assert!(failed.error.as_deref().unwrap().contains("500"));
    let first = math.iter().find(|r| r.question_id() == 1).unwrap();
    assert_eq!(first.pred.as_deref(), Some("B"));
    assert_eq!(first.model_outputs.as_deref(), Some("Let me think. The answer is (B)"));
    assert_eq!(first.question.options, vec!["one", "two", "three"]);
    assert_eq!(first.question.extra["src"], "ori_mmlu-math");

    let summary: Value =
        serde_json::from_str(&std::fs::read_to_string(summary_path(out.path(), "math")).unwrap()).unwrap();
    assert_eq!(summary["math"]["corr"], 1.0);
    assert_eq!(summary["math"]["wrong"], 2.0);
    assert_eq!(summary["total"]["corr"], 1.0);

    let law = read_records(out.path(), "law");
    assert_eq!(law.len(), 2);
    assert_eq!(outcomes[1].counts().unwrap().corr, 1.0);
}

#[tokio::test]
async fn test_rerun_only_sends_missing_questions() {
    let calls = Arc::new(AtomicUsize::new(0));
    let url = start_server(calls.clone()).await;
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_dataset(data.path());

    let config = config_for(&url, data.path(), out.path());
    let test = load_split(data.path(), "test").unwrap();
    let validation = load_split(data.path(), "validation").unwrap();
    let subjects = vec!["math".to_string()];

    orchestrator(&config).evaluate(&test, &validation, &subjects).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // Failed records are kept in the file, so nothing is re-sent
    let outcomes = orchestrator(&config).evaluate(&test, &validation, &subjects).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(outcomes[0].dispatched, 0);
    assert_eq!(outcomes[0].skipped, 3);
    assert_eq!(read_records(out.path(), "math").len(), 3);
    assert!(!result_path(out.path(), "law").exists());
}

#[tokio::test]
async fn test_prompt_includes_validation_examples() {
    let seen = Arc::new(parking_lot::Mutex::new(Vec::<String>::new()));
    let capture = seen.clone();
    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |Json(body): Json<Value>| {
            let capture = capture.clone();
            async move {
                capture
                    .lock()
                    .push(body["messages"][0]["content"].as_str().unwrap_or_default().to_string());
                Json(json!({
                    "choices": [{"message": {"content": "Answer: A"}, "finish_reason": "stop"}]
                }))
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_dataset(data.path());
    let config = config_for(&format!("http://{}/v1", addr), data.path(), out.path());
    let test = load_split(data.path(), "test").unwrap();
    let validation = load_split(data.path(), "validation").unwrap();

    orchestrator(&config)
        .evaluate(&test, &validation, &["math".to_string()])
        .await
        .unwrap();

    let prompts = seen.lock();
    assert_eq!(prompts.len(), 3);
    for prompt in prompts.iter() {
        assert!(prompt.starts_with("The following are multiple choice questions (with answers) about math."));
        assert!(prompt.contains("Answer: Let's think step by step. 2+2=4. The answer is (B).\n\n"));
        assert!(prompt.ends_with("Answer: Let's think step by step.\n\n"));
    }

    let math = read_records(out.path(), "math");
    assert!(math.iter().all(|r| r.pred.as_deref() == Some("A")));
}
