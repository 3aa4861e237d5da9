use tracing::debug;

use super::data::{Classification, ImageHandle, Outcome};
use crate::error::FlowError;

/// Identifies one classification request.
/// The session only accepts a response for the ticket it is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// The single session-scoped state container.
///
/// Cycle: `Unset -> Pending -> {Success | Failure}`. A new selection resets
/// the outcome to `Unset`, and so does clearing a shown failure; a response
/// that settles after it was superseded is dropped.
#[derive(Debug, Default)]
pub struct Session {
    selected: Option<ImageHandle>,
    outcome: Outcome,
    in_flight: Option<RequestTicket>,
    issued: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&ImageHandle> {
        self.selected.as_ref()
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Replace the selected image and reset the outcome.
    /// Any request still in flight becomes stale.
    pub fn select(&mut self, image: ImageHandle) {
        if let Some(ticket) = self.in_flight.take() {
            debug!("Superseding in-flight request {:?}", ticket);
        }
        self.selected = Some(image);
        self.outcome = Outcome::Unset;
    }

    /// Enter `Pending` and hand out the ticket the response must carry
    pub fn begin_request(&mut self) -> RequestTicket {
        self.issued += 1;
        let ticket = RequestTicket(self.issued);
        self.in_flight = Some(ticket);
        self.outcome = Outcome::Pending;
        ticket
    }

    /// Record a failure that happened outside a request.
    /// A request still in flight is dropped; its response will be stale.
    pub fn fail(&mut self, err: FlowError) {
        if let Some(ticket) = self.in_flight.take() {
            debug!("Dropping in-flight request {:?} on failure", ticket);
        }
        self.outcome = Outcome::Failure(err);
    }

    /// Put a shown failure back to `Unset`. Other outcomes are left alone.
    pub fn clear_failure(&mut self) -> bool {
        if matches!(self.outcome, Outcome::Failure(_)) {
            self.outcome = Outcome::Unset;
            true
        } else {
            false
        }
    }

    /// Apply a settled response. Returns false if the ticket is stale.
    pub fn settle(
        &mut self,
        ticket: RequestTicket,
        result: Result<Classification, FlowError>,
    ) -> bool {
        if self.in_flight != Some(ticket) {
            debug!("Discarding stale response for {:?}", ticket);
            return false;
        }
        self.in_flight = None;
        self.outcome = match result {
            Ok(classification) => Outcome::Success(classification),
            Err(err) => Outcome::Failure(err),
        };
        true
    }
}
