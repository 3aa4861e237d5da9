/// Result card and status widgets
///
/// Everything here is a pure function of the session.
use iced::widget::{column, container, image, text, Column};
use iced::{color, Alignment, Color, Element, Font, Length};

use crate::state::{Classification, ImageHandle, Outcome, ScoredLabel, TopPrediction};
use crate::Message;

const PREVIEW_HEIGHT: f32 = 180.0;

const TEXT_COLOR: Color = color!(0x2d, 0x3a, 0x33);
const TREATMENT_COLOR: Color = color!(0x3d, 0x51, 0x48);
const ACCENT_COLOR: Color = color!(0x2f, 0x6f, 0x3e);
const ERROR_COLOR: Color = color!(0xb0, 0x00, 0x20);
const PLACEHOLDER_COLOR: Color = color!(0x6b, 0x8f, 0x7c);

/// The picked photo, or a placeholder box
pub fn photo_preview<'a>(selected: Option<&ImageHandle>) -> Element<'a, Message> {
    match selected {
        Some(handle) => image(image::Handle::from_path(handle.path()))
            .width(Length::Fill)
            .height(PREVIEW_HEIGHT)
            .into(),
        None => container(text("Select a leaf photo").color(PLACEHOLDER_COLOR))
            .width(Length::Fill)
            .height(PREVIEW_HEIGHT)
            .center_x(Length::Fill)
            .center_y(PREVIEW_HEIGHT)
            .style(container::rounded_box)
            .into(),
    }
}

/// Loading line, error line, or the result card
pub fn outcome_view<'a>(outcome: &Outcome) -> Option<Element<'a, Message>> {
    match outcome {
        Outcome::Unset => None,
        Outcome::Pending => Some(text("Analyzing...").color(ACCENT_COLOR).into()),
        Outcome::Failure(_) => outcome
            .error_message()
            .map(|message| text(format!("Error: {}", message)).color(ERROR_COLOR).into()),
        Outcome::Success(classification) => Some(result_card(classification)),
    }
}

fn result_card<'a>(classification: &Classification) -> Element<'a, Message> {
    let mut card: Column<'a, Message> = column![
        text(disease_line(classification)).size(16).color(TEXT_COLOR),
        text(treatment_line(classification)).size(14).color(TREATMENT_COLOR),
    ]
    .spacing(6);

    if let Some(confidence) = classification.confidence() {
        card = card.push(
            text(format!("Confidence: {}", percent(confidence)))
                .size(14)
                .color(TREATMENT_COLOR),
        );
    }

    // Only worth a list when there is more than the top entry
    if classification.ranked.len() > 1 {
        let scores = classification
            .ranked
            .iter()
            .fold(column![].spacing(2), |list, scored| {
                list.push(text(score_line(scored)).size(13).color(TREATMENT_COLOR))
            });
        card = card.push(text("Scores").size(14).color(TEXT_COLOR)).push(scores);
    }

    if let Some(json) = unreadable_json(classification) {
        card = card
            .push(text("Response").size(14).color(TEXT_COLOR))
            .push(text(json).size(12).font(Font::MONOSPACE).color(TREATMENT_COLOR));
    }

    card.align_x(Alignment::Start).into()
}

/// "Disease: <label>" or "Disease: Unknown"
pub fn disease_line(classification: &Classification) -> String {
    format!("Disease: {}", classification.label().unwrap_or("Unknown"))
}

pub fn treatment_line(classification: &Classification) -> String {
    format!("Treatment: {}", classification.advice())
}

/// 0.914 -> "91.4%"
pub fn percent(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Pretty-printed JSON the label could not be read from
pub fn unreadable_json(classification: &Classification) -> Option<String> {
    match &classification.top {
        TopPrediction::Label(_) => None,
        TopPrediction::Unrecognized(value) => serde_json::to_string_pretty(value).ok(),
    }
}

/// One row of the score list
pub fn score_line(scored: &ScoredLabel) -> String {
    let mut line = scored.label.clone();
    if let Some(confidence) = scored.confidence {
        line.push_str(&format!("  {}", percent(confidence)));
    }
    if let Some(region) = scored.region {
        line.push_str(&format!(
            "  at ({:.0}, {:.0}) {:.0}x{:.0}",
            region.x, region.y, region.width, region.height
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::response::interpret;
    use serde_json::json;

    #[test]
    fn test_lines_for_known_label() {
        let c = interpret(json!({ "top": "Early Blight", "confidence": 0.914 }));
        assert_eq!(disease_line(&c), "Disease: Early Blight");
        assert_eq!(
            treatment_line(&c),
            "Treatment: Apply appropriate fungicide; improve airflow"
        );
        assert_eq!(percent(c.confidence().unwrap()), "91.4%");
    }

    #[test]
    fn test_lines_for_unrecognized() {
        let c = interpret(json!({ "message": "ok" }));
        assert_eq!(disease_line(&c), "Disease: Unknown");
        assert_eq!(treatment_line(&c), "Treatment: Consult an agronomist");
        assert_eq!(
            unreadable_json(&c).as_deref(),
            Some("{\n  \"message\": \"ok\"\n}")
        );
    }

    #[test]
    fn test_labeled_result_has_no_json_block() {
        let c = interpret(json!({ "top": "Leaf Rust", "confidence": 0.7 }));
        assert_eq!(unreadable_json(&c), None);

        let c = interpret(json!({ "predictions": [{ "score": 0.3 }] }));
        let json = unreadable_json(&c).unwrap();
        assert!(json.contains("\"score\": 0.3"));
    }

    #[test]
    fn test_palette() {
        assert_eq!(ERROR_COLOR, Color::from_rgb8(0xb0, 0x00, 0x20));
        assert_eq!(TEXT_COLOR, Color::from_rgb8(0x2d, 0x3a, 0x33));
        assert_eq!(PLACEHOLDER_COLOR.a, 1.0);
    }

    #[test]
    fn test_score_line() {
        let c = interpret(json!({ "predictions": [
            { "class": "Leaf Rust", "confidence": 0.5 },
            { "class": "Bacterial Spot", "confidence": 0.25, "x": 10, "y": 20.4, "width": 30, "height": 40 }
        ]}));
        assert_eq!(score_line(&c.ranked[0]), "Leaf Rust  50.0%");
        assert_eq!(score_line(&c.ranked[1]), "Bacterial Spot  25.0%  at (10, 20) 30x40");
    }
}
