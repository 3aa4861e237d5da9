/// Treatment advice lookup
///
/// Maps a predicted disease label to a fixed treatment suggestion by
/// case-insensitive keyword containment. Rules are checked in order and the
/// first match wins, so "Bacterial Blight" gets the bactericide advice.

/// Advice shown when there is no label at all
pub const NO_LABEL_ADVICE: &str = "Consult an agronomist";

/// Advice shown when a label matches none of the rules
pub const FALLBACK_ADVICE: &str = "Use fungicide; monitor plant health";

/// A static keyword table with its two defaults
#[derive(Debug, Clone, Copy)]
pub struct AdviceLookup {
    /// (lower-case keyword, advice), in evaluation order
    rules: &'static [(&'static str, &'static str)],
    fallback: &'static str,
    no_label: &'static str,
}

/// The table used by the application
pub static ADVICE: AdviceLookup = AdviceLookup {
    rules: &[
        ("bacterial", "Use copper-based bactericide; remove infected leaves"),
        ("blight", "Apply appropriate fungicide; improve airflow"),
        ("rust", "Use fungicide; prune and destroy infected leaves"),
        ("mildew", "Use sulfur-based fungicide; avoid overhead watering"),
    ],
    fallback: FALLBACK_ADVICE,
    no_label: NO_LABEL_ADVICE,
};

impl AdviceLookup {
    /// Look up the advice for a label
    pub fn lookup(&self, label: Option<&str>) -> &'static str {
        let key = match label {
            Some(label) if !label.is_empty() => label.to_lowercase(),
            _ => return self.no_label,
        };

        self.rules
            .iter()
            .find(|(keyword, _)| key.contains(keyword))
            .map(|(_, advice)| *advice)
            .unwrap_or(self.fallback)
    }
}

/// Advice for a label using the application table
pub fn advice_for(label: Option<&str>) -> &'static str {
    ADVICE.lookup(label)
}
