/// Timeframe reconciliation state machine.
///
/// On every change to pickup/delivery completeness, the calendar date, or the
/// order status, the reconciler decides whether to keep the existing
/// timeframe, refetch candidates, or clear the selection. The policy lives in
/// two pure functions (`plan` and `apply`) so every transition is
/// unit-testable without I/O; the workflow layer performs the actual fetch
/// between them.
use crate::completion::Completion;
use crate::models::{DraftOrder, OrderStatus, ServiceAvailability, TimeSlot, Timeframe};
use crate::selector::select_preferred;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candidate-list state for a draft order, as shipped back to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CandidateState {
    /// Nothing to offer: pickup/delivery incomplete or no availability.
    NoCandidates,
    /// Candidates fetched but nothing auto-selectable.
    PendingSelection {
        candidates: Vec<ServiceAvailability>,
    },
    /// Candidates fetched with a current selection.
    WithSelection {
        candidates: Vec<ServiceAvailability>,
        selected: Timeframe,
    },
    /// Edit mode with a window that already started: the committed timeframe
    /// is the sole, unchangeable option.
    Locked { timeframe: Timeframe },
}

impl CandidateState {
    /// The candidate list the UI should render. For `Locked` this is a
    /// synthesized single-entry list holding only the committed timeframe.
    pub fn candidates(&self) -> Vec<ServiceAvailability> {
        match self {
            CandidateState::NoCandidates => Vec::new(),
            CandidateState::PendingSelection { candidates }
            | CandidateState::WithSelection { candidates, .. } => candidates.clone(),
            CandidateState::Locked { timeframe } => vec![ServiceAvailability {
                service: timeframe.service.clone(),
                slots: vec![TimeSlot {
                    start_time: timeframe.start_time.clone(),
                    end_time: timeframe.end_time.clone(),
                }],
            }],
        }
    }

    /// The currently selected timeframe, if any.
    pub fn selected(&self) -> Option<&Timeframe> {
        match self {
            CandidateState::WithSelection { selected, .. } => Some(selected),
            CandidateState::Locked { timeframe } => Some(timeframe),
            _ => None,
        }
    }
}

/// What the reconciler decided to do for the current draft state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    /// Pickup/delivery incomplete: clear the candidate list, do not fetch.
    Clear,
    /// Fetch fresh candidates and overwrite the selection with the
    /// preferred-service default.
    FetchAndSelect,
    /// Fetch fresh candidates for display but keep the committed selection;
    /// the user must explicitly re-pick.
    FetchKeepSelection,
    /// The committed window already started: no fetch, collapse to the
    /// existing timeframe.
    LockExisting,
}

/// Inputs to a single reconciliation decision.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileTrigger {
    /// The pickup address identity changed since the last reconcile.
    pub pickup_address_changed: bool,
    /// The user explicitly picked a new calendar date.
    pub explicit_date_change: bool,
}

/// Decides the fetch/keep/clear action for a draft.
///
/// Rule order matters: completeness gates everything; an explicit date change
/// always refetches with a fresh default; otherwise new orders, missing
/// selections, and processing-with-moved-pickup refetch; a still-future
/// committed window fetches without overwriting; a started window locks.
pub fn plan(
    draft: &DraftOrder,
    completion: &Completion,
    trigger: ReconcileTrigger,
    now: DateTime<Utc>,
) -> FetchPlan {
    if !completion.routes() {
        return FetchPlan::Clear;
    }

    if trigger.explicit_date_change {
        return FetchPlan::FetchAndSelect;
    }

    let pickup_moved_while_processing =
        draft.status == OrderStatus::Processing && trigger.pickup_address_changed;
    if draft.status.is_new() || !draft.timeframe.is_selected() || pickup_moved_while_processing {
        return FetchPlan::FetchAndSelect;
    }

    if starts_in_future(&draft.timeframe.start_time, now) {
        FetchPlan::FetchKeepSelection
    } else {
        FetchPlan::LockExisting
    }
}

/// Whether an ISO-8601 start time is still ahead of `now`.
///
/// Unparseable timestamps are treated as already started, so a malformed
/// committed window locks instead of being silently replaced.
fn starts_in_future(start_time: &str, now: DateTime<Utc>) -> bool {
    match DateTime::parse_from_rfc3339(start_time) {
        Ok(start) => start.with_timezone(&Utc) > now,
        Err(_) => {
            tracing::warn!("Unparseable timeframe start_time: {}", start_time);
            false
        }
    }
}

/// Folds fetched candidates into the next state and the draft's resulting
/// timeframe selection.
///
/// A failed fetch is passed in as an empty candidate list; it behaves exactly
/// like a day with no availability.
pub fn apply(
    plan: FetchPlan,
    fetched: Vec<ServiceAvailability>,
    existing: &Timeframe,
) -> (CandidateState, Timeframe) {
    match plan {
        FetchPlan::Clear => (CandidateState::NoCandidates, existing.clone()),
        FetchPlan::FetchAndSelect => match select_preferred(&fetched) {
            Some(selected) => (
                CandidateState::WithSelection {
                    candidates: fetched,
                    selected: selected.clone(),
                },
                selected,
            ),
            None if fetched.is_empty() => (CandidateState::NoCandidates, Timeframe::default()),
            None => (
                CandidateState::PendingSelection { candidates: fetched },
                Timeframe::default(),
            ),
        },
        FetchPlan::FetchKeepSelection => (
            CandidateState::WithSelection {
                candidates: fetched,
                selected: existing.clone(),
            },
            existing.clone(),
        ),
        FetchPlan::LockExisting => (
            CandidateState::Locked {
                timeframe: existing.clone(),
            },
            existing.clone(),
        ),
    }
}

/// Computes the "use fastest available" affordance.
///
/// Shown only for complete, not-yet-submitted orders where the preferred
/// candidate exists and differs (by start/end) from the current selection.
/// Returns the timeframe the affordance would switch to.
pub fn fastest_available(
    draft: &DraftOrder,
    completion: &Completion,
    candidates: &[ServiceAvailability],
) -> Option<Timeframe> {
    if !completion.routes() || !draft.status.is_new() {
        return None;
    }
    let preferred = select_preferred(candidates)?;
    if draft.timeframe.is_selected() && draft.timeframe.same_slot(&preferred) {
        return None;
    }
    Some(preferred)
}
