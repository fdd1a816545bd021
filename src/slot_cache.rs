use crate::models::DraftOrder;
use chrono::NaiveDate;
use hex;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};

/// Checksum-validated entries for the slot-availability cache.
///
/// Availability responses are cached briefly to absorb keystroke-level
/// re-reconciles. Each entry stores a SHA-256 checksum alongside the payload;
/// an entry that fails validation on read is discarded and the caller falls
/// back to a fresh upstream fetch.

/// Wrapper for cached data with integrity validation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SealedEntry {
    /// The cached payload (JSON string).
    pub data: String,
    /// SHA-256 checksum of the payload (hex encoded).
    pub checksum: String,
}

impl SealedEntry {
    fn compute_checksum(data: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Whether the stored checksum still matches the payload.
    pub fn is_valid(&self) -> bool {
        Self::compute_checksum(&self.data) == self.checksum
    }
}

/// Serializes a value into a sealed cache string.
pub fn seal<T: Serialize>(value: &T) -> Option<String> {
    let data = serde_json::to_string(value).ok()?;
    let entry = SealedEntry {
        checksum: SealedEntry::compute_checksum(&data),
        data,
    };
    serde_json::to_string(&entry).ok()
}

/// Deserializes and validates a sealed cache string.
///
/// Returns `None` when the entry is corrupted, tampered with, or no longer
/// matches the expected shape; the caller refetches from upstream.
pub fn open<T: DeserializeOwned>(sealed: &str) -> Option<T> {
    let entry: SealedEntry = serde_json::from_str(sealed).ok()?;
    if !entry.is_valid() {
        tracing::warn!(
            "Slot cache validation failed: checksum mismatch (data length {})",
            entry.data.len()
        );
        return None;
    }
    serde_json::from_str(&entry.data).ok()
}

/// Cache key for a slot-availability lookup.
///
/// Availability depends on the date, both endpoints' coordinates, and the
/// order status; everything else on the draft is irrelevant to the upstream
/// slot computation and would only fragment the cache.
pub fn availability_key(date: NaiveDate, draft: &DraftOrder) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.format("%m-%d-%Y").to_string().as_bytes());
    hasher.update(draft.pickup.address.lat.as_bytes());
    hasher.update(draft.pickup.address.lon.as_bytes());
    hasher.update(draft.delivery.address.lat.as_bytes());
    hasher.update(draft.delivery.address.lon.as_bytes());
    hasher.update(format!("{:?}", draft.status).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, Party, ServiceAvailability, TimeSlot};
    use chrono::NaiveDate;

    fn sample_candidates() -> Vec<ServiceAvailability> {
        vec![ServiceAvailability {
            service: "3 Hour".to_string(),
            slots: vec![TimeSlot {
                start_time: "2026-09-01T10:00:00Z".to_string(),
                end_time: "2026-09-01T13:00:00Z".to_string(),
            }],
        }]
    }

    #[test]
    fn seal_then_open_round_trips() {
        let candidates = sample_candidates();
        let sealed = seal(&candidates).unwrap();
        let opened: Vec<ServiceAvailability> = open(&sealed).unwrap();
        assert_eq!(opened, candidates);
    }

    #[test]
    fn tampered_entry_is_rejected() {
        let sealed = seal(&sample_candidates()).unwrap();
        let tampered = sealed.replace("3 Hour", "9 Hour");
        let opened: Option<Vec<ServiceAvailability>> = open(&tampered);
        assert_eq!(opened, None);
    }

    #[test]
    fn garbage_entry_is_rejected() {
        let opened: Option<Vec<ServiceAvailability>> = open("not json at all");
        assert_eq!(opened, None);
    }

    #[test]
    fn key_depends_on_coordinates_and_date() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let mut draft = DraftOrder {
            pickup: Party {
                address: Address {
                    lat: "40.71".to_string(),
                    lon: "-74.00".to_string(),
                    ..Address::default()
                },
                ..Party::default()
            },
            ..DraftOrder::default()
        };

        let base = availability_key(date, &draft);
        assert_eq!(base, availability_key(date, &draft));

        draft.pickup.address.lat = "40.72".to_string();
        assert_ne!(base, availability_key(date, &draft));

        let other_date = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();
        draft.pickup.address.lat = "40.71".to_string();
        assert_ne!(base, availability_key(other_date, &draft));
    }

    #[test]
    fn key_ignores_contact_details() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let mut draft = DraftOrder::default();
        let base = availability_key(date, &draft);

        draft.delivery.name = "Ada".to_string();
        draft.delivery.phone = "+12125551234".to_string();
        assert_eq!(base, availability_key(date, &draft));
    }
}
