use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Truthfulness label attached to a verification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Reliable,
    #[serde(rename = "Partially True")]
    PartiallyTrue,
    Misleading,
    Fake,
    Unknown,
}

impl Verdict {
    // Longest labels first so "partially true" is not shadowed.
    const KNOWN: [Verdict; 4] = [
        Verdict::PartiallyTrue,
        Verdict::Misleading,
        Verdict::Reliable,
        Verdict::Fake,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Verdict::Reliable => "Reliable",
            Verdict::PartiallyTrue => "Partially True",
            Verdict::Misleading => "Misleading",
            Verdict::Fake => "Fake",
            Verdict::Unknown => "Unknown",
        }
    }

    /// Maps a free-text label from the model onto the closed set.
    ///
    /// Matching is case-insensitive and accepts trailing words
    /// ("Fake News" is `Fake`). Anything else is `Unknown`.
    pub fn from_label(raw: &str) -> Self {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Self::KNOWN
            .into_iter()
            .find(|verdict| {
                let label = verdict.label().to_lowercase();
                normalized == label || normalized.starts_with(&format!("{label} "))
            })
            .unwrap_or(Verdict::Unknown)
    }

    pub fn icon(self) -> &'static str {
        match self {
            Verdict::Reliable => "✅",
            Verdict::PartiallyTrue => "⚖️",
            Verdict::Misleading => "⚠️",
            Verdict::Fake => "❌",
            Verdict::Unknown => "❓",
        }
    }

    /// Colour family used by the chat UI.
    pub fn tone(self) -> &'static str {
        match self {
            Verdict::Reliable => "green",
            Verdict::PartiallyTrue => "lime",
            Verdict::Misleading => "orange",
            Verdict::Fake => "red",
            Verdict::Unknown => "slate",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Always within 0..=100.
    pub score: u8,
    pub verdict: Verdict,
    pub summary: String,
    pub details: String,
    /// Unique by `uri`, in the order the model cited them.
    pub sources: Vec<GroundingSource>,
    pub timestamp: DateTime<Utc>,
}

/// Progress stages reported to the chat while a verification is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStep {
    Scanning,
    Searching,
    Evaluating,
}

impl AnalysisStep {
    pub const IN_FLIGHT: [AnalysisStep; 3] = [
        AnalysisStep::Scanning,
        AnalysisStep::Searching,
        AnalysisStep::Evaluating,
    ];

    pub fn message(self) -> &'static str {
        match self {
            AnalysisStep::Scanning => "Scanning claims...",
            AnalysisStep::Searching => "Cross-referencing web sources...",
            AnalysisStep::Evaluating => "Confirming truth score...",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_known_set() {
        assert_eq!(Verdict::from_label("Reliable"), Verdict::Reliable);
        assert_eq!(Verdict::from_label("partially   TRUE"), Verdict::PartiallyTrue);
        assert_eq!(Verdict::from_label("MISLEADING"), Verdict::Misleading);
        assert_eq!(Verdict::from_label("Fake News"), Verdict::Fake);
    }

    #[test]
    fn test_from_label_falls_back_to_unknown() {
        assert_eq!(Verdict::from_label(""), Verdict::Unknown);
        assert_eq!(Verdict::from_label("Partially"), Verdict::Unknown);
        assert_eq!(Verdict::from_label("Fakery"), Verdict::Unknown);
        assert_eq!(Verdict::from_label("Mostly False"), Verdict::Unknown);
    }

    #[test]
    fn test_verdict_serializes_as_label() {
        let json = serde_json::to_string(&Verdict::PartiallyTrue).unwrap();
        assert_eq!(json, "\"Partially True\"");
        let back: Verdict = serde_json::from_str("\"Unknown\"").unwrap();
        assert_eq!(back, Verdict::Unknown);
    }

    #[test]
    fn test_step_messages() {
        assert_eq!(AnalysisStep::Scanning.message(), "Scanning claims...");
        assert_eq!(
            serde_json::to_string(&AnalysisStep::Evaluating).unwrap(),
            "\"evaluating\""
        );
    }
}
