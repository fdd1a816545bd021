/// Preferred-service selection over a fetched candidate list.
use crate::models::{ServiceAvailability, Timeframe};

/// Picks the default service/slot from a candidate list.
///
/// Scan order is authoritative (the upstream decides tier ordering): the
/// first service whose name case-insensitively contains both "3" and "hour"
/// and has at least one slot wins; otherwise the first service with any slot;
/// otherwise nothing is selectable. Always the first slot of the winning tier.
pub fn select_preferred(candidates: &[ServiceAvailability]) -> Option<Timeframe> {
    let three_hour = candidates.iter().enumerate().find(|(_, candidate)| {
        let name = candidate.service.to_lowercase();
        name.contains('3') && name.contains("hour") && !candidate.slots.is_empty()
    });

    let (service_id, candidate) = match three_hour {
        Some(found) => found,
        None => candidates
            .iter()
            .enumerate()
            .find(|(_, candidate)| !candidate.slots.is_empty())?,
    };

    let slot = candidate.slots.first()?;
    Some(Timeframe {
        service: candidate.service.clone(),
        service_id,
        start_time: slot.start_time.clone(),
        end_time: slot.end_time.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeSlot;

    fn slot(start: &str, end: &str) -> TimeSlot {
        TimeSlot {
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    #[test]
    fn three_hour_tier_wins_even_when_not_first() {
        let candidates = vec![
            ServiceAvailability {
                service: "2 Hour".to_string(),
                slots: vec![],
            },
            ServiceAvailability {
                service: "3 Hour Service".to_string(),
                slots: vec![slot("T1", "T2")],
            },
        ];

        let picked = select_preferred(&candidates).unwrap();
        assert_eq!(picked.service, "3 Hour Service");
        assert_eq!(picked.service_id, 1);
        assert_eq!(picked.start_time, "T1");
        assert_eq!(picked.end_time, "T2");
    }

    #[test]
    fn falls_back_to_first_tier_with_slots() {
        let candidates = vec![ServiceAvailability {
            service: "Same Day".to_string(),
            slots: vec![slot("T1", "T2")],
        }];

        let picked = select_preferred(&candidates).unwrap();
        assert_eq!(picked.service, "Same Day");
        assert_eq!(picked.service_id, 0);
        assert_eq!(picked.start_time, "T1");
    }

    #[test]
    fn empty_tiers_are_never_selected() {
        let candidates = vec![ServiceAvailability {
            service: "X".to_string(),
            slots: vec![],
        }];
        assert_eq!(select_preferred(&candidates), None);
    }

    #[test]
    fn empty_three_hour_tier_does_not_block_fallback() {
        let candidates = vec![
            ServiceAvailability {
                service: "3 Hour".to_string(),
                slots: vec![],
            },
            ServiceAvailability {
                service: "Same Day".to_string(),
                slots: vec![slot("T3", "T4"), slot("T5", "T6")],
            },
        ];

        let picked = select_preferred(&candidates).unwrap();
        assert_eq!(picked.service, "Same Day");
        // Always the first slot of the winning tier.
        assert_eq!(picked.start_time, "T3");
    }

    #[test]
    fn match_is_case_insensitive() {
        let candidates = vec![ServiceAvailability {
            service: "3 HOUR RUSH".to_string(),
            slots: vec![slot("T1", "T2")],
        }];
        assert_eq!(
            select_preferred(&candidates).unwrap().service,
            "3 HOUR RUSH"
        );
    }

    #[test]
    fn no_candidates_yields_none() {
        assert_eq!(select_preferred(&[]), None);
    }
}
