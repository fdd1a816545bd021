/// Completion evaluation for the draft-order sub-forms.
///
/// Pure, synchronous predicates deciding whether the pickup, delivery, and
/// timeframe sections hold enough data to fetch availability, quote, and
/// submit. Validation shortfalls are never surfaced as errors; they simply
/// suppress the dependent requests.
use crate::models::{DraftOrder, Party};
use regex::Regex;
use serde::Serialize;

/// Per-section readiness of a draft order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub pickup: bool,
    pub delivery: bool,
    pub timeframe: bool,
}

impl Completion {
    /// True when every section is ready for quoting and submission.
    pub fn all(&self) -> bool {
        self.pickup && self.delivery && self.timeframe
    }

    /// True when both address-bearing sections are ready; the gate for
    /// fetching slot availability.
    pub fn routes(&self) -> bool {
        self.pickup && self.delivery
    }
}

/// Validates a US phone number.
///
/// Accepts common formatting characters (spaces, dashes, dots, parentheses)
/// and requires the +1 country prefix followed by a ten-digit number whose
/// area code does not start with 0 or 1.
pub fn is_valid_us_phone(raw: &str) -> bool {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let phone_regex = Regex::new(r"^\+1[2-9][0-9]{9}$").unwrap();
    if !phone_regex.is_match(&stripped) {
        tracing::debug!("Phone failed US pattern: {}", raw);
        return false;
    }
    true
}

/// Whether a party section is complete: valid phone, a name, and a geocoded
/// street address.
pub fn party_is_complete(party: &Party) -> bool {
    is_valid_us_phone(&party.phone) && !party.name.is_empty() && party.address.is_present()
}

/// Whether a party section is untouched.
///
/// The dashboard pre-fills the phone field with the bare `"+1"` prefix, so
/// both the empty string and that prefix count as no input. Used to decide
/// between the "fill from store defaults" and "reset" affordances.
pub fn party_is_empty(party: &Party) -> bool {
    (party.phone.is_empty() || party.phone == "+1")
        && party.name.is_empty()
        && party.address.street.is_empty()
        && party.address.lat.is_empty()
        && party.address.lon.is_empty()
}

/// Evaluates all three sections of a draft order.
pub fn evaluate(draft: &DraftOrder) -> Completion {
    Completion {
        pickup: party_is_complete(&draft.pickup),
        delivery: party_is_complete(&draft.delivery),
        timeframe: draft.timeframe.is_selected(),
    }
}
