#![allow(dead_code)]

use serde_json::{json, Value};
use verifact::{GeminiClient, GeminiConfig, ResponseInterpreter};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-key";
pub const GENERATE_PATH: &str = "/models/gemini-3-flash-preview:generateContent";

pub const RELIABLE_ANSWER: &str = "# TRUST_SCORE: 87\n# VERDICT: Reliable\n# SUMMARY: Claim Confirmed\n# FINDINGS: Matches WHO guidance.";

/// Body shaped like a real `generateContent` reply.
pub fn gemini_reply(text: &str, sources: &[(&str, &str)]) -> Value {
    let chunks: Vec<Value> = sources
        .iter()
        .map(|(uri, title)| json!({ "web": { "uri": uri, "title": title } }))
        .collect();
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP",
            "groundingMetadata": {
                "webSearchQueries": ["who guidance"],
                "groundingChunks": chunks
            }
        }],
        "modelVersion": "gemini-3-flash-preview"
    })
}

pub async fn mount_reply(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub fn interpreter_for(api_base: &str) -> ResponseInterpreter {
    let config = GeminiConfig::new(API_KEY).with_api_base(api_base);
    ResponseInterpreter::new(GeminiClient::new(config).unwrap())
}
