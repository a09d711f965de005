use std::fmt::Display;

use serde::Serialize;
use uuid::Uuid;

use super::Title;

/// Ordinal strength of a match, strongest first
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfidenceLabel {
    #[serde(rename = "Strong Match")]
    Strong,
    #[serde(rename = "Good Match")]
    Good,
    #[serde(rename = "Fair Match")]
    Fair,
    #[serde(rename = "Possible Match")]
    Possible,
}

impl ConfidenceLabel {
    /// 1 is the strongest band, 4 the weakest
    pub fn rank(&self) -> u8 {
        match self {
            ConfidenceLabel::Strong => 1,
            ConfidenceLabel::Good => 2,
            ConfidenceLabel::Fair => 3,
            ConfidenceLabel::Possible => 4,
        }
    }
}

impl Display for ConfidenceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConfidenceLabel::Strong => "Strong Match",
            ConfidenceLabel::Good => "Good Match",
            ConfidenceLabel::Fair => "Fair Match",
            ConfidenceLabel::Possible => "Possible Match",
        };
        write!(f, "{}", label)
    }
}

/// How strongly a title fits a household, in [0, 1]
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Confidence {
    value: f64,
    label: ConfidenceLabel,
    rank: u8,
}

impl Confidence {
    /// Clamps `value` into [0, 1] and derives its band
    pub fn new(value: f64) -> Self {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        let label = match value {
            v if v >= 0.8 => ConfidenceLabel::Strong,
            v if v >= 0.6 => ConfidenceLabel::Good,
            v if v >= 0.4 => ConfidenceLabel::Fair,
            _ => ConfidenceLabel::Possible,
        };

        Self {
            value,
            label,
            rank: label.rank(),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label(&self) -> ConfidenceLabel {
        self.label
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }
}

impl Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// A plain-language explanation for a recommendation
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Reason {
    pub explanation: String,
}

impl Reason {
    pub fn new(explanation: impl Into<String>) -> Self {
        Self {
            explanation: explanation.into(),
        }
    }
}

impl Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.explanation)
    }
}

/// A title suggested to a household, with why and how strongly
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub title: Title,
    pub confidence: Confidence,
    pub reasons: Vec<Reason>,
}

impl Recommendation {
    pub fn title_id(&self) -> Uuid {
        self.title.id
    }
}
