/// Quote decision and rendering.
///
/// Runs on every draft change: completeness gates everything, new orders get
/// an absolute quote, edits get a delta quote only when the draft actually
/// differs from the last-saved server copy.
use crate::completion::Completion;
use crate::models::{format_cents, DeltaQuote, DraftOrder, NewOrderQuote};
use serde::Serialize;

/// What the quote engine should do for the current draft state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteDecision {
    /// Some section incomplete: clear any displayed quote silently.
    Clear,
    /// Not-yet-submitted order: request a fresh absolute quote.
    QuoteNew,
    /// Editing and the draft differs from the saved copy: request a delta.
    QuoteDelta,
    /// Editing but nothing changed: nothing to charge, clear the display.
    NothingToCharge,
}

/// Picks the quote action for a draft.
///
/// `saved` is the last-saved server copy when editing; deep equality against
/// it decides delta vs nothing-to-charge. An edit with no saved copy at hand
/// is treated as differing.
pub fn decide(draft: &DraftOrder, saved: Option<&DraftOrder>, completion: &Completion) -> QuoteDecision {
    if !completion.all() {
        return QuoteDecision::Clear;
    }

    if draft.status.is_new() {
        return QuoteDecision::QuoteNew;
    }

    match saved {
        Some(saved) if saved == draft => QuoteDecision::NothingToCharge,
        _ => QuoteDecision::QuoteDelta,
    }
}

/// Rendered quote state for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteDisplay {
    /// Main price line, e.g. `"$12.00 + $3.00 tip"`; `None` when cleared.
    pub summary: Option<String>,
    /// Pre-discount price rendered struck through.
    pub original_price: Option<String>,
    /// Delta line, e.g. `"Additional: $2.00"`.
    pub additional: Option<String>,
    /// Whether the submit action is enabled.
    pub submit_enabled: bool,
    /// Server-provided quote error, shown in place of the price.
    pub error: Option<String>,
}

impl QuoteDisplay {
    /// Nothing to show and nothing to charge; submit allowed only when the
    /// caller says the draft is submittable without payment (unchanged edit).
    pub fn cleared(submit_enabled: bool) -> Self {
        Self {
            summary: None,
            original_price: None,
            additional: None,
            submit_enabled,
            error: None,
        }
    }

    /// A fresh absolute quote.
    pub fn from_new(quote: &NewOrderQuote) -> Self {
        Self {
            summary: Some(format!(
                "{} + {} tip",
                format_cents(quote.price),
                format_cents(quote.tip)
            )),
            original_price: quote.original_price.map(format_cents),
            additional: None,
            submit_enabled: true,
            error: None,
        }
    }

    /// A delta quote against the previously charged totals.
    pub fn from_delta(quote: &DeltaQuote) -> Self {
        Self {
            summary: Some(format!(
                "{} + {} tip",
                format_cents(quote.price),
                format_cents(quote.tip)
            )),
            original_price: None,
            additional: Some(format!(
                "Additional: {}",
                format_cents(quote.additional_cents())
            )),
            submit_enabled: true,
            error: None,
        }
    }

    /// Quote request failed: surface the server message, disable submission,
    /// leave all entered data intact.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            summary: None,
            original_price: None,
            additional: None,
            submit_enabled: false,
            error: Some(message.into()),
        }
    }
}
