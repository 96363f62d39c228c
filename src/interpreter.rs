//! Turns a submission into a model request and the model's free-text answer
//! back into a [`VerificationResult`].
//!
//! The answer is untrusted text. Every field is extracted independently and
//! falls back to a default, so a malformed answer never becomes an error.

use chrono::Utc;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{Result, VerifyError};
use crate::gemini::{
    Blob, Content, GeminiClient, GenerateContentRequest, GroundingChunk, Part, Tool,
};
use crate::prompt::{SCREENSHOT_PLACEHOLDER, SYSTEM_INSTRUCTION};
use crate::request::VerificationRequest;
use crate::verdict::{GroundingSource, Verdict, VerificationResult};

pub const DEFAULT_SCORE: u8 = 50;
pub const DEFAULT_SUMMARY: &str = "Unable to verify claim.";
pub const DEFAULT_DETAILS: &str = "No detailed findings available.";
pub const DEFAULT_SOURCE_TITLE: &str = "Reference Source";

lazy_static::lazy_static! {
    static ref SCORE_RE: Regex = Regex::new(r"(?i)TRUST_SCORE:\s*[*_]*\s*(-?\d+)").unwrap();
    static ref VERDICT_RE: Regex = Regex::new(r"(?i)VERDICT:\s*[*_]*\s*(\w+(?:[ \t]+\w+)?)").unwrap();
    static ref SUMMARY_RE: Regex = Regex::new(r"(?i)SUMMARY:\s*([^\n#]+)").unwrap();
    static ref FINDINGS_RE: Regex = Regex::new(r"(?is)FINDINGS:\s*(.*)").unwrap();
}

/// Builds the `generateContent` payload: user text first, then the optional
/// image, with the fixed instruction and search grounding enabled.
pub fn build_request(request: &VerificationRequest) -> GenerateContentRequest {
    let text = if request.text.trim().is_empty() {
        SCREENSHOT_PLACEHOLDER.to_string()
    } else {
        request.text.clone()
    };

    let mut parts = vec![Part::Text { text }];
    if let Some(image) = &request.image {
        parts.push(Part::InlineData {
            inline_data: Blob {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        });
    }

    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part::Text {
                text: SYSTEM_INSTRUCTION.to_string(),
            }],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        tools: vec![Tool::GoogleSearch {}],
    }
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

fn parse_score(raw: &str) -> u8 {
    let Some(digits) = capture(&SCORE_RE, raw) else {
        return DEFAULT_SCORE;
    };
    // Only overflow can fail here; saturate toward the sign.
    let value = digits
        .parse::<i64>()
        .unwrap_or(if digits.starts_with('-') { i64::MIN } else { i64::MAX });
    value.clamp(0, 100) as u8
}

fn strip_emphasis(s: &str) -> &str {
    s.trim_matches(|c: char| c == '*' || c == '_').trim()
}

/// Web references only, titled, unique by uri in first-seen order.
pub fn extract_sources(chunks: &[GroundingChunk]) -> Vec<GroundingSource> {
    let mut seen = HashSet::new();
    chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .filter_map(|web| {
            let uri = web.uri.as_deref()?;
            if uri.trim().is_empty() {
                return None;
            }
            let title = web
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_SOURCE_TITLE);
            Some(GroundingSource {
                title: title.to_string(),
                uri: uri.to_string(),
            })
        })
        .filter(|source| seen.insert(source.uri.clone()))
        .collect()
}

pub fn parse_response(raw: &str, chunks: &[GroundingChunk]) -> VerificationResult {
    let score = parse_score(raw);

    let verdict = match capture(&VERDICT_RE, raw) {
        Some(label) => {
            let verdict = Verdict::from_label(label);
            if verdict == Verdict::Unknown {
                debug!(label, "Model returned a label outside the verdict set");
            }
            verdict
        }
        None => Verdict::Unknown,
    };

    let summary = capture(&SUMMARY_RE, raw)
        .map(strip_emphasis)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUMMARY)
        .to_string();

    let details = capture(&FINDINGS_RE, raw)
        .unwrap_or(DEFAULT_DETAILS)
        .to_string();

    VerificationResult {
        score,
        verdict,
        summary,
        details,
        sources: extract_sources(chunks),
        timestamp: Utc::now(),
    }
}

/// Sends submissions to the model and interprets its answers.
#[derive(Debug, Clone)]
pub struct ResponseInterpreter {
    client: GeminiClient,
}

impl ResponseInterpreter {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// One request, no retry. Transport and status failures surface as
    /// [`VerifyError::Unavailable`].
    #[instrument(skip(self, request), fields(has_image = request.image.is_some()))]
    pub async fn verify(&self, request: &VerificationRequest) -> Result<VerificationResult> {
        let payload = build_request(request);

        let response = self.client.generate_content(&payload).await.map_err(|e| {
            error!("Verification error: {:#}", e);
            VerifyError::unavailable(format!("{e:#}"))
        })?;

        let text = response.text();
        if text.is_empty() {
            warn!("Model returned no text; falling back to defaults");
        }

        let result = parse_response(&text, response.grounding_chunks());
        info!(
            score = result.score,
            verdict = %result.verdict,
            sources = result.sources.len(),
            "Verification complete"
        );
        Ok(result)
    }
}
