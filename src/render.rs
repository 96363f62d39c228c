use reqwest::Url;
use serde::Serialize;
use std::fmt::Write as _;

use crate::verdict::VerificationResult;

/// Sources shown under "Credible Evidence".
pub const MAX_DISPLAYED_SOURCES: usize = 3;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceView {
    pub title: String,
    pub uri: String,
    pub host: String,
}

/// Presentation model shared by the terminal and HTML renderers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResultView {
    pub verdict: &'static str,
    pub icon: &'static str,
    pub tone: &'static str,
    pub score: u8,
    pub summary: String,
    pub details: String,
    pub sources: Vec<SourceView>,
    pub time: String,
}

fn host_of(uri: &str) -> String {
    Url::parse(uri)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| uri.to_string())
}

impl From<&VerificationResult> for ResultView {
    fn from(result: &VerificationResult) -> Self {
        Self {
            verdict: result.verdict.label(),
            icon: result.verdict.icon(),
            tone: result.verdict.tone(),
            score: result.score,
            summary: result.summary.clone(),
            details: result.details.clone(),
            sources: result
                .sources
                .iter()
                .take(MAX_DISPLAYED_SOURCES)
                .map(|s| SourceView {
                    title: s.title.clone(),
                    uri: s.uri.clone(),
                    host: host_of(&s.uri),
                })
                .collect(),
            time: result.timestamp.format("%H:%M").to_string(),
        }
    }
}

/// Plain-text verdict card for the terminal.
pub fn render_text(result: &VerificationResult) -> String {
    let view = ResultView::from(result);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {}  (Trust Score: {}%)",
        view.icon,
        view.verdict.to_uppercase(),
        view.score
    );
    let _ = writeln!(out, "{}", view.summary);
    out.push('\n');
    let _ = writeln!(out, "{}", view.details);

    if !view.sources.is_empty() {
        out.push('\n');
        out.push_str("Credible Evidence:\n");
        for source in &view.sources {
            let _ = writeln!(out, "  - {} [{}]", source.title, source.host);
            let _ = writeln!(out, "    {}", source.uri);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::{GroundingSource, Verdict};
    use chrono::{TimeZone, Utc};

    fn sample(sources: usize) -> VerificationResult {
        VerificationResult {
            score: 12,
            verdict: Verdict::Fake,
            summary: "NASA issued no such warning".into(),
            details: "- Recycled hoax from 2015.".into(),
            sources: (0..sources)
                .map(|i| GroundingSource {
                    title: format!("Source {i}"),
                    uri: format!("https://www{i}.example.com/path?q={i}"),
                })
                .collect(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 0).unwrap(),
        }
    }

    #[test]
    fn test_view_limits_sources_and_extracts_host() {
        let view = ResultView::from(&sample(5));
        assert_eq!(view.sources.len(), MAX_DISPLAYED_SOURCES);
        assert_eq!(view.sources[1].host, "www1.example.com");
        assert_eq!(view.icon, "❌");
        assert_eq!(view.tone, "red");
        assert_eq!(view.time, "09:05");
    }

    #[test]
    fn test_host_falls_back_to_raw_uri() {
        assert_eq!(host_of("not a url"), "not a url");
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample(1));
        assert!(text.starts_with("❌ FAKE  (Trust Score: 12%)\n"));
        assert!(text.contains("NASA issued no such warning"));
        assert!(text.contains("Credible Evidence:\n  - Source 0 [www0.example.com]"));

        let bare = render_text(&sample(0));
        assert!(!bare.contains("Credible Evidence"));
    }
}
