/// State management module
///
/// This module holds the session state, including:
/// - Shared data structures (data.rs)
/// - The session container and its request tickets (session.rs)
///
/// Nothing here is persisted; a restart starts from an empty session.

pub mod data;
pub mod session;

pub use data::{Classification, ImageHandle, Outcome, ScoredLabel, TopPrediction};
pub use session::RequestTicket;
