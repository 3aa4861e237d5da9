/// Parsing of hosted inference responses
///
/// Classification models answer with a `top` label and a `predictions`
/// list; object-detection models only send `predictions`, each with a box.
/// The top result is `top`, then `predictions[0]`, then the whole body.
use serde_json::{Map, Value};

use crate::error::FlowError;
use crate::state::data::{Classification, Region, ScoredLabel, TopPrediction};

/// Parse a 200 response body
pub fn parse_classification(body: &str) -> Result<Classification, FlowError> {
    let raw: Value = serde_json::from_str(body)?;
    Ok(interpret(raw))
}

/// Extract the top prediction and the ranked list from parsed JSON
pub fn interpret(raw: Value) -> Classification {
    let predictions = raw
        .get("predictions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let ranked = predictions
        .iter()
        .filter_map(Value::as_object)
        .filter_map(scored_label)
        .collect();

    let top = top_from_field(&raw)
        .or_else(|| predictions.first().map(top_from_entry))
        .unwrap_or_else(|| TopPrediction::Unrecognized(raw.clone()));

    Classification { top, ranked, raw }
}

/// The `top` field, if present and non-empty
fn top_from_field(raw: &Value) -> Option<TopPrediction> {
    match raw.get("top")? {
        Value::String(label) if !label.is_empty() => {
            let mut scored = ScoredLabel::new(label.as_str());
            scored.confidence = raw.get("confidence").and_then(Value::as_f64);
            Some(TopPrediction::Label(scored))
        }
        Value::Object(entry) => scored_label(entry).map(TopPrediction::Label),
        _ => None,
    }
}

fn top_from_entry(entry: &Value) -> TopPrediction {
    entry
        .as_object()
        .and_then(scored_label)
        .map(TopPrediction::Label)
        .unwrap_or_else(|| TopPrediction::Unrecognized(entry.clone()))
}

/// Read `class` (or `label`), `confidence` and an optional box
fn scored_label(entry: &Map<String, Value>) -> Option<ScoredLabel> {
    let label = ["class", "label"]
        .iter()
        .filter_map(|key| entry.get(*key).and_then(Value::as_str))
        .find(|label| !label.is_empty())?;

    Some(ScoredLabel {
        label: label.to_string(),
        confidence: entry.get("confidence").and_then(Value::as_f64),
        region: region(entry),
    })
}

fn region(entry: &Map<String, Value>) -> Option<Region> {
    let field = |key: &str| entry.get(key).and_then(Value::as_f64);
    Some(Region {
        x: field("x")?,
        y: field("y")?,
        width: field("width")?,
        height: field("height")?,
    })
}
