/// Reconcile/quote/submit orchestration.
///
/// Each operation follows the same shape: validate the request at the
/// boundary, run the pure decision functions, perform at most one upstream
/// call, and discard the result if a newer request for the same draft was
/// observed while the call was in flight.
use crate::completion::{self, Completion};
use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::{DraftOrder, ServiceAvailability, Timeframe};
use crate::quote::{self, QuoteDecision, QuoteDisplay};
use crate::reconcile::{self, CandidateState, FetchPlan, ReconcileTrigger};
use crate::slot_cache;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Draft keys with no activity for this long are forgotten.
const SEQUENCE_IDLE_TTL: Duration = Duration::from_secs(15 * 60);
/// Upper bound on concurrently tracked draft keys.
const MAX_TRACKED_DRAFTS: u64 = 10_000;

/// Tracks the highest request sequence number applied per draft key.
///
/// The dashboard tags every reconcile/quote request with a monotonically
/// increasing `seq`; a slow response from an older form state must never
/// overwrite the result of a newer one. In-flight upstream calls are not
/// aborted; their results are simply not applied.
///
/// Keys are client-supplied, so the ledger is bounded: entries expire
/// after an idle period and the cache has a hard capacity. An expired key
/// is indistinguishable from a never-seen one, which matches the first
/// request for a fresh draft.
pub struct SequenceLedger {
    inner: moka::sync::Cache<String, u64>,
}

impl SequenceLedger {
    pub fn new() -> Self {
        Self::with_time_to_idle(SEQUENCE_IDLE_TTL)
    }

    fn with_time_to_idle(ttl: Duration) -> Self {
        Self {
            inner: moka::sync::Cache::builder()
                .max_capacity(MAX_TRACKED_DRAFTS)
                .time_to_idle(ttl)
                .build(),
        }
    }

    /// Records `seq` for `key` if it is not stale. Returns false when a
    /// higher sequence has already been observed.
    pub fn observe(&self, key: &str, seq: u64) -> bool {
        let mut fresh = true;
        self.inner.entry_by_ref(key).and_upsert_with(|existing| {
            let latest = existing.map(|entry| entry.into_value()).unwrap_or(0);
            if seq < latest {
                fresh = false;
                latest
            } else {
                seq
            }
        });
        fresh
    }

    /// Whether `seq` is still the newest observed sequence for `key`.
    pub fn is_current(&self, key: &str, seq: u64) -> bool {
        self.inner.get(key).map(|latest| seq >= latest).unwrap_or(true)
    }
}

impl Default for SequenceLedger {
    fn default() -> Self {
        Self::new()
    }
}

// ============ Reconcile ============

#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    /// Client-chosen identity of the draft being edited (order id when
    /// editing, a session-unique token for new orders).
    pub draft_key: String,
    /// Monotonic sequence number of the triggering state change.
    pub seq: u64,
    /// Selected calendar date, `MM-DD-YYYY`.
    pub date: String,
    pub draft: DraftOrder,
    /// Pickup address identity at the previous reconcile, used to detect a
    /// moved pickup while the order is processing.
    #[serde(default)]
    pub previous_pickup_address_id: Option<String>,
    /// The user explicitly picked this date from the calendar.
    #[serde(default)]
    pub explicit_date_change: bool,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub seq: u64,
    /// True when a newer request for this draft was already applied; the
    /// dashboard ignores everything else in the response.
    pub superseded: bool,
    pub completion: Completion,
    #[serde(flatten)]
    pub state: CandidateState,
    /// The draft with the resulting timeframe selection applied.
    pub draft: DraftOrder,
    /// Timeframe the "use fastest available" affordance would switch to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fastest_available: Option<Timeframe>,
}

impl ReconcileResponse {
    fn superseded(seq: u64, draft: DraftOrder) -> Self {
        Self {
            seq,
            superseded: true,
            completion: completion::evaluate(&draft),
            state: CandidateState::NoCandidates,
            draft,
            fastest_available: None,
        }
    }
}

/// Runs one reconciliation pass for a draft.
pub async fn reconcile(
    state: &AppState,
    request: ReconcileRequest,
) -> Result<ReconcileResponse, AppError> {
    let date = NaiveDate::parse_from_str(&request.date, "%m-%d-%Y")
        .map_err(|_| AppError::BadRequest("date must be formatted MM-DD-YYYY".to_string()))?;

    let seq_key = format!("reconcile:{}", request.draft_key);
    if !state.sequences.observe(&seq_key, request.seq) {
        tracing::debug!("Discarding stale reconcile seq {} for {}", request.seq, request.draft_key);
        return Ok(ReconcileResponse::superseded(request.seq, request.draft));
    }

    let draft = request.draft;
    let completion = completion::evaluate(&draft);
    let trigger = ReconcileTrigger {
        pickup_address_changed: request
            .previous_pickup_address_id
            .as_deref()
            .map(|previous| previous != draft.pickup.address.address_id)
            .unwrap_or(false),
        explicit_date_change: request.explicit_date_change,
    };

    let plan = reconcile::plan(&draft, &completion, trigger, Utc::now());
    tracing::debug!("Reconcile plan for {}: {:?}", request.draft_key, plan);

    let fetched = match plan {
        FetchPlan::Clear | FetchPlan::LockExisting => Vec::new(),
        FetchPlan::FetchAndSelect | FetchPlan::FetchKeepSelection => {
            fetch_candidates(state, date, &draft).await
        }
    };

    // The fetch awaited; a newer edit may have landed in the meantime.
    if !state.sequences.is_current(&seq_key, request.seq) {
        tracing::debug!("Reconcile seq {} superseded mid-flight for {}", request.seq, request.draft_key);
        return Ok(ReconcileResponse::superseded(request.seq, draft));
    }

    let (candidate_state, timeframe) = reconcile::apply(plan, fetched, &draft.timeframe);
    let draft = draft.with_timeframe(timeframe);
    let completion = completion::evaluate(&draft);
    let fastest_available =
        reconcile::fastest_available(&draft, &completion, &candidate_state.candidates());

    Ok(ReconcileResponse {
        seq: request.seq,
        superseded: false,
        completion,
        state: candidate_state,
        draft,
        fastest_available,
    })
}

/// Fetches the candidate list through the validated slot cache.
///
/// A failed fetch degrades to an empty list (no availability) and is never
/// cached; the next qualifying state change retries naturally.
async fn fetch_candidates(
    state: &AppState,
    date: NaiveDate,
    draft: &DraftOrder,
) -> Vec<ServiceAvailability> {
    let cache_key = slot_cache::availability_key(date, draft);

    if let Some(sealed) = state.slot_cache.get(&cache_key).await {
        if let Some(candidates) = slot_cache::open::<Vec<ServiceAvailability>>(&sealed) {
            tracing::debug!("Slot cache HIT for {}", date);
            return candidates;
        }
        // Corrupted entry: drop it and refetch.
        state.slot_cache.invalidate(&cache_key).await;
    }

    match state.courier.fetch_slots(date, draft).await {
        Ok(candidates) => {
            if let Some(sealed) = slot_cache::seal(&candidates) {
                state.slot_cache.insert(cache_key, sealed).await;
            }
            candidates
        }
        Err(e) => {
            tracing::warn!("Slot fetch failed, treating as no availability: {}", e);
            Vec::new()
        }
    }
}

// ============ Quote ============

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub draft_key: String,
    pub seq: u64,
    pub draft: DraftOrder,
    /// Last-saved server copy when editing; deep equality against it decides
    /// delta vs nothing-to-charge.
    #[serde(default)]
    pub saved: Option<DraftOrder>,
    /// Required when the draft belongs to a submitted order.
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub seq: u64,
    pub superseded: bool,
    pub completion: Completion,
    pub quote: QuoteDisplay,
}

/// Runs the quote engine for a draft.
pub async fn run_quote(state: &AppState, request: QuoteRequest) -> Result<QuoteResponse, AppError> {
    let seq_key = format!("quote:{}", request.draft_key);
    if !state.sequences.observe(&seq_key, request.seq) {
        return Ok(QuoteResponse {
            seq: request.seq,
            superseded: true,
            completion: completion::evaluate(&request.draft),
            quote: QuoteDisplay::cleared(false),
        });
    }

    let draft = request.draft;
    let completion = completion::evaluate(&draft);
    let decision = quote::decide(&draft, request.saved.as_ref(), &completion);

    let quote = match decision {
        QuoteDecision::Clear => QuoteDisplay::cleared(false),
        QuoteDecision::NothingToCharge => QuoteDisplay::cleared(true),
        QuoteDecision::QuoteNew => match state.courier.quote_new(&draft).await {
            Ok(quote) => QuoteDisplay::from_new(&quote),
            // Quote failures disable submission but never destroy the form.
            Err(e) => QuoteDisplay::failed(e.to_string()),
        },
        QuoteDecision::QuoteDelta => {
            let order_id = request.order_id.as_deref().ok_or_else(|| {
                AppError::BadRequest("order_id is required when quoting an edit".to_string())
            })?;
            match state.courier.quote_update(order_id, &draft).await {
                Ok(quote) => QuoteDisplay::from_delta(&quote),
                Err(e) => QuoteDisplay::failed(e.to_string()),
            }
        }
    };

    if !state.sequences.is_current(&seq_key, request.seq) {
        return Ok(QuoteResponse {
            seq: request.seq,
            superseded: true,
            completion,
            quote: QuoteDisplay::cleared(false),
        });
    }

    Ok(QuoteResponse {
        seq: request.seq,
        superseded: false,
        completion,
        quote,
    })
}

// ============ Submit ============

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub draft: DraftOrder,
    /// Required when updating a submitted order.
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub order_id: String,
    /// Where the dashboard navigates on success.
    pub tracking_path: String,
}

/// Creates or updates the order upstream.
///
/// Completion is re-checked here; a submit for an incomplete draft is a
/// client bug and is refused outright. Upstream failures propagate so the
/// dashboard keeps the form intact with the error visible.
pub async fn submit(state: &AppState, request: SubmitRequest) -> Result<SubmitResponse, AppError> {
    let draft = request.draft;
    let completion = completion::evaluate(&draft);
    if !completion.all() {
        return Err(AppError::BadRequest(
            "draft is not complete: pickup, delivery, and timeframe are all required".to_string(),
        ));
    }

    let order_id = if draft.status.is_new() {
        state.courier.create_order(&draft).await?
    } else {
        let order_id = request.order_id.as_deref().ok_or_else(|| {
            AppError::BadRequest("order_id is required when updating an order".to_string())
        })?;
        state.courier.update_order(order_id, &draft).await?
    };

    let tracking_path = format!("{}/{}", state.config.tracking_path_prefix, order_id);
    Ok(SubmitResponse {
        order_id,
        tracking_path,
    })
}
