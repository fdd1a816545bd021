use serde::{Deserialize, Serialize};

// ============ Draft Order Domain Models ============

/// A geocoded street address embedded in a pickup, delivery, or customer record.
///
/// An address is considered present only when `street`, `lat`, and `lon` are
/// all non-empty; partially geocoded input never counts toward completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Identifier assigned by the address/geocoding provider.
    #[serde(default)]
    pub address_id: String,
    /// Full formatted address line as returned by the geocoder.
    #[serde(default)]
    pub formatted: String,
    /// Street line (number + street name).
    #[serde(default)]
    pub street: String,
    /// City name.
    #[serde(default)]
    pub city: String,
    /// Two-letter state code.
    #[serde(default)]
    pub state: String,
    /// Postal code.
    #[serde(default)]
    pub zip: String,
    /// Latitude as a decimal string; empty when not geocoded.
    #[serde(default)]
    pub lat: String,
    /// Longitude as a decimal string; empty when not geocoded.
    #[serde(default)]
    pub lon: String,
}

impl Address {
    /// Whether the address carries enough data to route against.
    pub fn is_present(&self) -> bool {
        !self.street.is_empty() && !self.lat.is_empty() && !self.lon.is_empty()
    }
}

/// Verification steps the courier must perform at handoff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequirements {
    /// Photo proof of delivery.
    #[serde(default)]
    pub picture: bool,
    /// Recipient signature.
    #[serde(default)]
    pub signature: bool,
    /// Government ID check.
    #[serde(default)]
    pub id_check: bool,
    /// Recipient must be 21 or older.
    #[serde(default)]
    pub over_21: bool,
}

/// Package size tier used for pricing and vehicle selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSize {
    Xsmall,
    Small,
    Medium,
    Large,
}

impl ItemSize {
    /// Derives a size tier from a free-text item description.
    ///
    /// Fixed keyword lookup; the first matching keyword wins. Returns `None`
    /// for descriptions with no known keyword so a manual override survives.
    pub fn from_description(description: &str) -> Option<Self> {
        let lowered = description.to_lowercase();
        const TABLE: &[(&str, ItemSize)] = &[
            ("envelope", ItemSize::Xsmall),
            ("document", ItemSize::Xsmall),
            ("key", ItemSize::Xsmall),
            ("bag", ItemSize::Small),
            ("box", ItemSize::Small),
            ("flowers", ItemSize::Small),
            ("catering", ItemSize::Medium),
            ("cooler", ItemSize::Medium),
            ("tire", ItemSize::Medium),
            ("furniture", ItemSize::Large),
            ("appliance", ItemSize::Large),
            ("pallet", ItemSize::Large),
        ];
        TABLE
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, size)| *size)
    }
}

impl Default for ItemSize {
    fn default() -> Self {
        ItemSize::Small
    }
}

/// A single line item carried on the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Count of identical pieces; always at least 1.
    pub quantity: u32,
    /// Free-text description.
    pub description: String,
    /// Size tier, auto-derived from the description unless overridden.
    pub size: ItemSize,
}

impl Item {
    /// Builds an item, deriving the size from the description when possible.
    pub fn new(quantity: u32, description: impl Into<String>) -> Self {
        let description = description.into();
        let size = ItemSize::from_description(&description).unwrap_or_default();
        Self {
            quantity: quantity.max(1),
            description,
            size,
        }
    }
}

/// One side of the order: the pickup or the delivery party.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    /// Contact phone number; expected in +1 E.164 form when complete.
    #[serde(default)]
    pub phone: String,
    /// Contact name.
    #[serde(default)]
    pub name: String,
    /// Courier-facing note (gate codes, parking hints).
    #[serde(default)]
    pub note: String,
    /// Building access code.
    #[serde(default)]
    pub access_code: String,
    /// Apartment / suite / unit.
    #[serde(default)]
    pub apt: String,
    /// Geocoded address for this side.
    #[serde(default)]
    pub address: Address,
    /// Handoff verification requirements.
    #[serde(default)]
    pub required_verification: VerificationRequirements,
    /// Line items (delivery side only in practice).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
    /// Tip in cents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<i64>,
    /// Order reference in an external system (e.g. a POS ticket number).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_order_id: Option<String>,
}

/// A selected delivery service tier plus a concrete start/end slot.
///
/// Valid only when `service`, `start_time`, and `end_time` are all non-empty;
/// `service_id` indexes into the fetched candidate list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeframe {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub service_id: usize,
    /// ISO-8601 start of the delivery window.
    #[serde(default)]
    pub start_time: String,
    /// ISO-8601 end of the delivery window.
    #[serde(default)]
    pub end_time: String,
}

impl Timeframe {
    /// Whether a slot has actually been chosen.
    pub fn is_selected(&self) -> bool {
        !self.service.is_empty() && !self.start_time.is_empty() && !self.end_time.is_empty()
    }

    /// Slot identity comparison used by the fastest-available affordance:
    /// two timeframes are the same slot when start and end match.
    pub fn same_slot(&self, other: &Timeframe) -> bool {
        self.start_time == other.start_time && self.end_time == other.end_time
    }
}

/// Lifecycle state of an order as reported by the courier platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    NewOrder,
    Processing,
    Assigned,
    ArrivedAtPickup,
    PickedUp,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// True while the order has never been submitted.
    pub fn is_new(&self) -> bool {
        matches!(self, OrderStatus::NewOrder)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::NewOrder
    }
}

/// The in-progress order being created or edited.
///
/// This aggregate is the unit sent upstream for slot availability, quoting,
/// and submission. It is treated as an immutable value: operations take it by
/// reference and return updated copies rather than mutating shared state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftOrder {
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub pickup: Party,
    #[serde(default)]
    pub delivery: Party,
    #[serde(default)]
    pub timeframe: Timeframe,
}

impl DraftOrder {
    /// Returns a copy with the given timeframe selected.
    pub fn with_timeframe(&self, timeframe: Timeframe) -> Self {
        let mut next = self.clone();
        next.timeframe = timeframe;
        next
    }

    /// Returns a copy with the timeframe cleared.
    pub fn without_timeframe(&self) -> Self {
        let mut next = self.clone();
        next.timeframe = Timeframe::default();
        next
    }
}

// ============ Availability Models ============

/// A concrete delivery window offered by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_time: String,
    pub end_time: String,
}

/// Availability of one service tier on a given date.
///
/// An empty `slots` array means the tier exists but is unavailable that day;
/// it is rendered disabled and is never auto-selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAvailability {
    pub service: String,
    #[serde(default)]
    pub slots: Vec<TimeSlot>,
}

// ============ Quote Models ============

/// Price computed for a not-yet-submitted order. All amounts in cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderQuote {
    pub price: i64,
    pub tip: i64,
    /// Pre-discount price, rendered struck through when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<i64>,
}

/// Delta price computed while editing an already-submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaQuote {
    pub price: i64,
    pub tip: i64,
    pub previous_price: i64,
    pub previous_tip: i64,
}

impl DeltaQuote {
    /// Signed difference between the new and previously charged totals.
    /// Amounts come straight from upstream JSON, so the arithmetic
    /// saturates rather than trusting them to stay in range.
    pub fn additional_cents(&self) -> i64 {
        self.price
            .saturating_add(self.tip)
            .saturating_sub(self.previous_price.saturating_add(self.previous_tip))
    }
}

/// Formats an amount of cents as a dollar string, e.g. `1200` → `"$12.00"`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}
