//! Signal results: a discrete label, a confidence score and the notes behind it.

pub mod scorer;

pub use scorer::{label_for, score_signal, scorecard, ScoreBreakdown, Scorecard, MIN_HISTORY};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    Rise,
    Fall,
    Potential,
    Wait,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Rise => "RISE",
            Label::Fall => "FALL",
            Label::Potential => "POTENTIAL",
            Label::Wait => "WAIT",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scoring one enriched series.
///
/// `confidence` is `None` only for the indeterminate result produced when the
/// series is too short for the momentum check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SignalResultRepr")]
pub struct SignalResult {
    label: Label,
    confidence: Option<u8>,
    rationale: Vec<String>,
}

#[derive(Deserialize)]
struct SignalResultRepr {
    label: Label,
    confidence: Option<u8>,
    rationale: Vec<String>,
}

impl TryFrom<SignalResultRepr> for SignalResult {
    type Error = String;

    fn try_from(repr: SignalResultRepr) -> Result<Self, Self::Error> {
        match repr.confidence {
            Some(c) if c > 100 => Err(format!("confidence {c} is above 100")),
            _ => Ok(Self {
                label: repr.label,
                confidence: repr.confidence,
                rationale: repr.rationale,
            }),
        }
    }
}

impl SignalResult {
    pub fn new(label: Label, confidence: u8, rationale: Vec<String>) -> Self {
        Self {
            label,
            confidence: Some(confidence.min(100)),
            rationale,
        }
    }

    /// `WAIT` with no score: not enough bars for a defined RSI.
    pub fn indeterminate(bars: usize, required: usize) -> Self {
        Self {
            label: Label::Wait,
            confidence: None,
            rationale: vec![format!(
                "Insufficient history: {bars} bars, need {required}"
            )],
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn confidence(&self) -> Option<u8> {
        self.confidence
    }

    pub fn rationale(&self) -> &[String] {
        &self.rationale
    }

    pub fn is_indeterminate(&self) -> bool {
        self.confidence.is_none()
    }

    /// True when the score reaches `threshold`. Indeterminate results never do.
    pub fn meets_threshold(&self, threshold: u8) -> bool {
        self.confidence.is_some_and(|c| c >= threshold)
    }
}

impl fmt::Display for SignalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.confidence {
            Some(c) => write!(f, "{} ({c}%)", self.label)?,
            None => write!(f, "{} (n/a)", self.label)?,
        }
        write!(f, ": {}", self.rationale.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        let result = SignalResult::new(Label::Potential, 70, vec![]);
        assert!(result.meets_threshold(70));
        assert!(!result.meets_threshold(71));
    }

    #[test]
    fn indeterminate_never_alerts() {
        let result = SignalResult::indeterminate(3, 15);
        assert_eq!(result.label(), Label::Wait);
        assert!(result.is_indeterminate());
        assert!(!result.meets_threshold(0));
        assert_eq!(result.rationale(), ["Insufficient history: 3 bars, need 15"]);
    }

    #[test]
    fn display_joins_rationale() {
        let result = SignalResult::new(
            Label::Rise,
            80,
            vec!["EMA9>EMA21".into(), "RSI in range: 50.0".into()],
        );
        assert_eq!(result.to_string(), "RISE (80%): EMA9>EMA21, RSI in range: 50.0");
    }

    #[test]
    fn decoding_rejects_confidence_above_100() {
        let err = serde_json::from_str::<SignalResult>(
            r#"{"label":"RISE","confidence":250,"rationale":[]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("above 100"));

        let ok: SignalResult = serde_json::from_str(
            r#"{"label":"WAIT","confidence":null,"rationale":["Insufficient history: 3 bars, need 15"]}"#,
        )
        .unwrap();
        assert_eq!(ok, SignalResult::indeterminate(3, 15));
    }

    #[test]
    fn label_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Label::Potential).unwrap(), "\"POTENTIAL\"");
    }
}
