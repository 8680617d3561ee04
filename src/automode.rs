//! Bounded autonomous loop over the ordinary chat path
//!
//! `automode N` hands the session to the model for up to `N` round-trips. The
//! first round-trip carries the user's goal; every later one sends
//! [`CONTINUATION_PROMPT`]. While running, the system prompt is extended with
//! [`automode_addendum`] so the model knows its iteration and how to stop.
//!
//! ```text
//! Idle ──automode N──> Running(N) ──round-trip──> Running(N-1) ...
//!                          │
//!                          ├── remaining == 0          ─> Stopped(Exhausted)
//!                          ├── reply has the marker    ─> Stopped(Completed)
//!                          ├── interrupt flag set      ─> Stopped(Interrupted)
//!                          └── gateway error           ─> Stopped(Failed)
//! ```
//!
//! The interrupt flag is only read between round-trips. A model call that is
//! already in flight finishes and is recorded before the loop stops.

use crate::prompts::{CONTINUATION_PROMPT, automode_addendum};
use crate::session::{Session, TurnEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Bookkeeping for a run in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomodeState {
    pub remaining_iterations: u32,
    pub active: bool,
}

/// Why a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The iteration budget ran out
    Exhausted,
    /// The model emitted the completion marker
    Completed,
    /// The user interrupted the run
    Interrupted,
    /// A round-trip failed; the message describes the error
    Failed(String),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "iteration budget exhausted"),
            StopReason::Completed => write!(f, "goal completed"),
            StopReason::Interrupted => write!(f, "interrupted by user"),
            StopReason::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// Controller state between and during runs
///
/// A stopped run is reported through [`AutomodeSummary`]; the controller
/// itself is `Idle` again by the time the summary is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomodeStatus {
    Idle,
    Running { remaining: u32 },
}

/// What a finished run hands back to the prompt loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomodeSummary {
    /// Successful round-trips
    pub round_trips: u32,
    pub reason: StopReason,
}

/// Progress reported during a run
#[derive(Debug)]
pub enum AutomodeEvent<'a> {
    IterationStarted { iteration: u32, budget: u32 },
    Turn(TurnEvent<'a>),
}

pub type AutomodeSink<'a> = &'a mut (dyn FnMut(AutomodeEvent<'_>) + Send);

#[derive(Debug)]
pub struct AutomodeController {
    state: Option<AutomodeState>,
    interrupted: Arc<AtomicBool>,
}

impl Default for AutomodeController {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomodeController {
    pub fn new() -> Self {
        Self {
            state: None,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag that stops the run at the next iteration boundary
    ///
    /// Hand this to a signal listener; setting it from any thread is safe.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn state(&self) -> Option<AutomodeState> {
        self.state
    }

    pub fn status(&self) -> AutomodeStatus {
        match self.state {
            Some(state) if state.active => AutomodeStatus::Running {
                remaining: state.remaining_iterations,
            },
            _ => AutomodeStatus::Idle,
        }
    }

    /// Drive `session` toward `goal` for at most `budget` round-trips
    ///
    /// Errors never escape: a failed round-trip ends the run with
    /// [`StopReason::Failed`] and the session is left as it was before that
    /// round-trip. The controller is back to `Idle` when this returns.
    pub async fn run(
        &mut self,
        session: &mut Session,
        goal: &str,
        budget: u32,
        on_event: AutomodeSink<'_>,
    ) -> AutomodeSummary {
        self.interrupted.store(false, Ordering::SeqCst);
        self.state = Some(AutomodeState {
            remaining_iterations: budget,
            active: true,
        });
        log::debug!("Automode started with a budget of {}", budget);

        let mut round_trips = 0;
        let reason = loop {
            let remaining = self.state.map_or(0, |s| s.remaining_iterations);
            if remaining == 0 {
                break StopReason::Exhausted;
            }
            if self.interrupted.load(Ordering::SeqCst) {
                break StopReason::Interrupted;
            }

            let iteration = budget - remaining + 1;
            on_event(AutomodeEvent::IterationStarted { iteration, budget });

            let prompt = if iteration == 1 { goal } else { CONTINUATION_PROMPT };
            let addendum = automode_addendum(iteration, budget);
            let mut forward = |event: TurnEvent<'_>| on_event(AutomodeEvent::Turn(event));

            let outcome = match session
                .chat_with_addendum(prompt, Some(&addendum), &mut forward)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => break StopReason::Failed(e.to_string()),
            };

            round_trips += 1;
            if let Some(state) = self.state.as_mut() {
                state.remaining_iterations -= 1;
            }
            if outcome.completed {
                break StopReason::Completed;
            }
        };

        log::debug!(
            "Automode stopped after {} round-trips: {}",
            round_trips,
            reason
        );

        self.state = None;
        self.interrupted.store(false, Ordering::SeqCst);

        AutomodeSummary {
            round_trips,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_controller_is_idle() {
        let controller = AutomodeController::new();
        assert_eq!(controller.status(), AutomodeStatus::Idle);
        assert!(controller.state().is_none());
    }

    #[test]
    fn test_interrupt_sets_shared_flag() {
        let controller = AutomodeController::new();
        let handle = controller.interrupt_handle();
        assert!(!handle.load(Ordering::SeqCst));

        controller.interrupt();
        assert!(handle.load(Ordering::SeqCst));
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::Completed.to_string(), "goal completed");
        assert_eq!(
            StopReason::Failed("Rate limited: x".to_string()).to_string(),
            "failed: Rate limited: x"
        );
    }
}
