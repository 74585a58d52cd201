use crate::backend::Backend;
use crate::config::GateConfig;
use crate::eligibility::{EligibilityFilter, EligibilityReason};
use crate::error::Result;
use crate::types::{ApprovalOutcome, ApprovedVia, Signal, SignalSource};
use std::time::{Duration, Instant};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Monotonic time source and suspension point for the wait loop.
///
/// Injected so the loop can be driven deterministically in tests; the
/// delay between polls is the only place this crate ever blocks.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Production clock: `Instant::now` and a thread sleep.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// ---------------------------------------------------------------------------
// WaitLoop
// ---------------------------------------------------------------------------

/// Polling state machine: `Polling` until a vote or the deadline resolves
/// it to one of the terminal [`ApprovalOutcome`] states.
pub struct WaitLoop<'a> {
    backend: &'a dyn Backend,
    filter: &'a EligibilityFilter<'a>,
    config: &'a GateConfig,
    clock: &'a dyn Clock,
}

impl<'a> WaitLoop<'a> {
    pub fn new(
        backend: &'a dyn Backend,
        filter: &'a EligibilityFilter<'a>,
        config: &'a GateConfig,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            backend,
            filter,
            config,
            clock,
        }
    }

    /// Runs until a terminal state is reached. The deadline is measured
    /// from loop start on the injected monotonic clock and checked at the
    /// top of every iteration; it never interrupts a call in flight.
    pub fn run(&self, source: SignalSource) -> Result<ApprovalOutcome> {
        let started = self.clock.now();
        let deadline = (self.config.timeout_seconds > 0)
            .then(|| Duration::from_secs(self.config.timeout_seconds));

        loop {
            if let Some(deadline) = deadline {
                let elapsed = self.clock.now().saturating_duration_since(started);
                if elapsed >= deadline {
                    info!(
                        timeout_seconds = self.config.timeout_seconds,
                        "approval wait timed out"
                    );
                    return Ok(ApprovalOutcome::TimedOut);
                }
            }

            if let Some(outcome) = self.poll_once(source)? {
                return Ok(outcome);
            }

            debug!("waiting for approval...");
            self.clock
                .sleep(Duration::from_secs(self.config.poll_interval_seconds));
        }
    }

    /// One eligibility pass over the current signals. Rejection beats
    /// approval within the same poll; among equals the first signal in
    /// backend order wins.
    pub fn poll_once(&self, source: SignalSource) -> Result<Option<ApprovalOutcome>> {
        let signals = self.backend.list_signals(source)?;

        let mut accepted = Vec::new();
        for signal in &signals {
            let decision = self.filter.classify(signal)?;
            if decision.accepted() {
                accepted.push(decision);
            }
        }

        if let Some(rejection) = accepted
            .iter()
            .find(|d| d.reason == EligibilityReason::AcceptedRejection)
        {
            let by = rejection.signal.actor().clone();
            info!(by = %by.login, "workflow rejected");
            return Ok(Some(ApprovalOutcome::Rejected { by }));
        }

        if let Some(approval) = accepted.iter().find(|d| d.reason.accepted()) {
            let by = approval.signal.actor().clone();
            let via = match (&approval.signal, approval.reason) {
                (_, EligibilityReason::AcceptedDeployCommand) => ApprovedVia::DeployCommand,
                (Signal::Review { .. }, _) => ApprovedVia::Review,
                (Signal::Reaction { .. }, _) => ApprovedVia::Reaction,
            };
            let review_id = match &approval.signal {
                Signal::Review { id, .. } => Some(*id),
                Signal::Reaction { .. } => None,
            };
            info!(by = %by.login, via = %via, "workflow approved");
            return Ok(Some(ApprovalOutcome::Approved { by, via, review_id }));
        }

        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
