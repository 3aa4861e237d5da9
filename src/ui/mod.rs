/// UI widgets
///
/// Views are pure functions of the session; no widget holds state.

pub mod result_card;

pub use result_card::{outcome_view, photo_preview};
