/// Shared data structures for the session state
///
/// These types flow between the classification client, the session
/// container and the UI layer.
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::advice::advice_for;
use crate::error::FlowError;

/// A locally addressable image picked by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle(PathBuf);

impl ImageHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Filename only (e.g., "leaf.jpg"), for status lines
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Bounding box of an object-detection prediction, in source pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Center x
    pub x: f64,
    /// Center y
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One labeled prediction from the service
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLabel {
    pub label: String,
    /// 0.0 to 1.0, when the service reports one
    pub confidence: Option<f64>,
    /// Only present for object-detection models
    pub region: Option<Region>,
}

impl ScoredLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            confidence: None,
            region: None,
        }
    }
}

/// The top-ranked prediction, or the JSON we could not read a label from
#[derive(Debug, Clone, PartialEq)]
pub enum TopPrediction {
    Label(ScoredLabel),
    Unrecognized(Value),
}

/// A parsed 200 response
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub top: TopPrediction,
    /// Every labeled entry of `predictions`, in service order
    pub ranked: Vec<ScoredLabel>,
    /// The full response body
    pub raw: Value,
}

impl Classification {
    /// The top label, if the response carried one
    pub fn label(&self) -> Option<&str> {
        match &self.top {
            TopPrediction::Label(scored) => Some(&scored.label),
            TopPrediction::Unrecognized(_) => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match &self.top {
            TopPrediction::Label(scored) => scored.confidence,
            TopPrediction::Unrecognized(_) => None,
        }
    }

    /// Treatment advice for the top label
    pub fn advice(&self) -> &'static str {
        advice_for(self.label())
    }
}

/// The state of the current classification cycle
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Outcome {
    #[default]
    Unset,
    Pending,
    Success(Classification),
    Failure(FlowError),
}

impl Outcome {
    /// Error text for the presentation layer
    pub fn error_message(&self) -> Option<String> {
        match self {
            Outcome::Failure(err) => Some(err.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_advice_follows_label() {
        let classification = Classification {
            top: TopPrediction::Label(ScoredLabel::new("Tomato Bacterial Spot")),
            ranked: Vec::new(),
            raw: Value::Null,
        };
        assert_eq!(classification.label(), Some("Tomato Bacterial Spot"));
        assert_eq!(
            classification.advice(),
            "Use copper-based bactericide; remove infected leaves"
        );
    }

    #[test]
    fn test_unrecognized_has_no_label() {
        let raw = serde_json::json!({ "time": 0.1 });
        let classification = Classification {
            top: TopPrediction::Unrecognized(raw.clone()),
            ranked: Vec::new(),
            raw,
        };
        assert_eq!(classification.label(), None);
        assert_eq!(classification.advice(), "Consult an agronomist");
    }

    #[test]
    fn test_outcome_error_message() {
        assert_eq!(Outcome::Unset.error_message(), None);
        assert_eq!(
            Outcome::Failure(FlowError::MissingCredential).error_message(),
            Some("missing credential".to_string())
        );
    }

    #[test]
    fn test_file_name() {
        let handle = ImageHandle::new("/photos/leaf.jpg");
        assert_eq!(handle.file_name(), "leaf.jpg");
    }
}
