/// Remote classification module
///
/// This module handles:
/// - Uploading image bytes to the hosted inference endpoint (client.rs)
/// - Reading the top label out of the JSON response (response.rs)

pub mod client;
pub mod response;

pub use client::{Classifier, RoboflowClient};
