use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::{
    entities::RecalculationRequest,
    error::{unexpected_error, Error},
};

pub const DEFAULT_MOVEMENT_THRESHOLD_METERS: f64 = 1.0;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Identifies one accepted computation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ticket {
    pub sequence: u64,
    pub request: RecalculationRequest,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decision {
    Recompute(Ticket),
    /// The route computed for an equivalent request is still valid.
    Unchanged,
    /// An equivalent request is already being computed.
    InFlight,
    /// A later input arrived before this request was accepted.
    Superseded,
}

/// Whether `next` differs enough from the last accepted request to warrant a new route.
pub fn should_recompute(
    previous: Option<&RecalculationRequest>,
    next: &RecalculationRequest,
    movement_threshold_meters: f64,
) -> bool {
    let previous = match previous {
        Some(previous) => previous,
        None => return true,
    };

    previous.mode != next.mode
        || previous.origin.haversine_distance(&next.origin) > movement_threshold_meters
        || previous.destination.haversine_distance(&next.destination) > movement_threshold_meters
}

#[derive(Debug, Default)]
struct PolicyState {
    sequence: u64,
    last_accepted: Option<Ticket>,
    in_flight: bool,
}

#[derive(Debug)]
pub struct RecalculationPolicy {
    movement_threshold_meters: f64,
    debounce: Duration,
    inputs: AtomicU64,
    state: Mutex<PolicyState>,
}

impl Default for RecalculationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MOVEMENT_THRESHOLD_METERS, DEFAULT_DEBOUNCE)
    }
}

impl RecalculationPolicy {
    pub fn new(movement_threshold_meters: f64, debounce: Duration) -> Self {
        Self {
            movement_threshold_meters,
            debounce,
            inputs: AtomicU64::new(0),
            state: Mutex::new(PolicyState::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, PolicyState>, Error> {
        self.state.lock().map_err(|_| unexpected_error())
    }

    /// Registers an input change and returns its generation.
    pub fn input_changed(&self) -> u64 {
        self.inputs.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, generation: u64) -> bool {
        self.inputs.load(Ordering::SeqCst) == generation
    }

    /// Waits out the debounce interval; false if a later input arrived meanwhile.
    pub async fn settle(&self, generation: u64) -> bool {
        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }

        self.is_latest(generation)
    }

    /// Accepts `request` unless it is redundant or a later input exists.
    ///
    /// `on_accept` runs under the policy lock once a ticket is issued.
    #[tracing::instrument(skip(self, on_accept))]
    pub fn evaluate<F: FnOnce()>(
        &self,
        request: RecalculationRequest,
        generation: u64,
        on_accept: F,
    ) -> Result<Decision, Error> {
        let mut state = self.lock()?;

        if !self.is_latest(generation) {
            return Ok(Decision::Superseded);
        }

        let previous = state.last_accepted.as_ref().map(|ticket| &ticket.request);

        if !should_recompute(previous, &request, self.movement_threshold_meters) {
            if state.in_flight {
                return Ok(Decision::InFlight);
            }

            return Ok(Decision::Unchanged);
        }

        state.sequence += 1;

        let ticket = Ticket {
            sequence: state.sequence,
            request,
        };

        state.last_accepted = Some(ticket);
        state.in_flight = true;
        on_accept();

        tracing::info!(sequence = ticket.sequence, "accepted route request");

        Ok(Decision::Recompute(ticket))
    }

    /// Runs `apply` only if `ticket` is still the last accepted request.
    pub fn finish<F: FnOnce()>(&self, ticket: &Ticket, apply: F) -> Result<bool, Error> {
        let mut state = self.lock()?;

        if !is_current(&state, ticket) {
            return Ok(false);
        }

        state.in_flight = false;
        apply();

        Ok(true)
    }

    /// Forgets a computation that produced nothing, so the same request can run again.
    pub fn abandon<F: FnOnce()>(&self, ticket: &Ticket, on_abandon: F) -> Result<(), Error> {
        let mut state = self.lock()?;

        if is_current(&state, ticket) {
            state.last_accepted = None;
            state.in_flight = false;
            on_abandon();
        }

        Ok(())
    }

    /// Drops the accepted request; pending results become stale.
    pub fn reset<F: FnOnce()>(&self, on_reset: F) -> Result<(), Error> {
        let mut state = self.lock()?;
        state.last_accepted = None;
        state.in_flight = false;
        on_reset();

        Ok(())
    }
}

fn is_current(state: &PolicyState, ticket: &Ticket) -> bool {
    state
        .last_accepted
        .map(|accepted| accepted.sequence == ticket.sequence)
        .unwrap_or(false)
}
