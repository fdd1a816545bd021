/// Unit tests for the reconciliation workflow's pure logic
/// Tests completion evaluation, preferred-service selection, and the
/// timeframe reconciler's fetch/keep/clear/lock policy
use chrono::{DateTime, TimeZone, Utc};
use rust_dispatch_api::completion::{self, is_valid_us_phone, party_is_empty};
use rust_dispatch_api::models::{
    Address, DraftOrder, OrderStatus, Party, ServiceAvailability, TimeSlot, Timeframe,
};
use rust_dispatch_api::reconcile::{
    apply, fastest_available, plan, CandidateState, FetchPlan, ReconcileTrigger,
};
use rust_dispatch_api::selector::select_preferred;

fn complete_party() -> Party {
    Party {
        phone: "+12125551234".to_string(),
        name: "Grace".to_string(),
        address: Address {
            address_id: "addr-pickup".to_string(),
            street: "500 Grand St".to_string(),
            city: "Brooklyn".to_string(),
            state: "NY".to_string(),
            zip: "11211".to_string(),
            lat: "40.7127".to_string(),
            lon: "-73.9566".to_string(),
            ..Address::default()
        },
        ..Party::default()
    }
}

fn future_timeframe() -> Timeframe {
    Timeframe {
        service: "3 Hour".to_string(),
        service_id: 0,
        start_time: "2026-09-01T10:00:00Z".to_string(),
        end_time: "2026-09-01T13:00:00Z".to_string(),
    }
}

fn complete_draft(status: OrderStatus) -> DraftOrder {
    DraftOrder {
        status,
        pickup: complete_party(),
        delivery: complete_party(),
        timeframe: future_timeframe(),
    }
}

fn no_trigger() -> ReconcileTrigger {
    ReconcileTrigger {
        pickup_address_changed: false,
        explicit_date_change: false,
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap()
}

fn tier(service: &str, slots: &[(&str, &str)]) -> ServiceAvailability {
    ServiceAvailability {
        service: service.to_string(),
        slots: slots
            .iter()
            .map(|(start, end)| TimeSlot {
                start_time: start.to_string(),
                end_time: end.to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod completion_tests {
    use super::*;

    #[test]
    fn test_completion_requires_every_party_field() {
        let draft = complete_draft(OrderStatus::NewOrder);
        assert!(completion::evaluate(&draft).all());

        // Each missing field independently breaks that side's completion.
        let break_one = |mutator: fn(&mut Party)| {
            let mut draft = complete_draft(OrderStatus::NewOrder);
            mutator(&mut draft.pickup);
            let result = completion::evaluate(&draft);
            assert!(!result.pickup, "pickup should be incomplete");
            assert!(result.delivery, "delivery untouched");
        };

        break_one(|p| p.phone = "212555".to_string());
        break_one(|p| p.phone = "+1".to_string());
        break_one(|p| p.name.clear());
        break_one(|p| p.address.street.clear());
        break_one(|p| p.address.lat.clear());
        break_one(|p| p.address.lon.clear());
    }

    #[test]
    fn test_timeframe_completion() {
        let draft = complete_draft(OrderStatus::NewOrder);
        assert!(completion::evaluate(&draft).timeframe);

        let draft = draft.without_timeframe();
        assert!(!completion::evaluate(&draft).timeframe);
    }

    #[test]
    fn test_us_phone_pattern() {
        assert!(is_valid_us_phone("+12125551234"));
        assert!(is_valid_us_phone("+1 (917) 555-0100"));
        assert!(!is_valid_us_phone("+1"));
        assert!(!is_valid_us_phone("9175550100"));
        assert!(!is_valid_us_phone("+10175550100")); // area code cannot start with 0
    }

    #[test]
    fn test_empty_party_detection() {
        let untouched = Party::default();
        assert!(party_is_empty(&untouched));

        let prefix_only = Party {
            phone: "+1".to_string(),
            ..Party::default()
        };
        assert!(party_is_empty(&prefix_only));

        let mut touched = Party::default();
        touched.address.street = "500 Grand St".to_string();
        assert!(!party_is_empty(&touched));
    }
}

#[cfg(test)]
mod selector_tests {
    use super::*;

    #[test]
    fn test_three_hour_preferred_over_earlier_tiers() {
        let candidates = vec![tier("2 Hour", &[]), tier("3 Hour Service", &[("T1", "T2")])];
        let picked = select_preferred(&candidates).unwrap();
        assert_eq!(picked.service, "3 Hour Service");
        assert_eq!(picked.service_id, 1);
        assert_eq!((picked.start_time.as_str(), picked.end_time.as_str()), ("T1", "T2"));
    }

    #[test]
    fn test_fallback_to_first_available_tier() {
        let candidates = vec![tier("Same Day", &[("T1", "T2")])];
        let picked = select_preferred(&candidates).unwrap();
        assert_eq!(picked.service, "Same Day");
        assert_eq!(picked.start_time, "T1");
    }

    #[test]
    fn test_no_slots_anywhere_selects_nothing() {
        let candidates = vec![tier("X", &[])];
        assert_eq!(select_preferred(&candidates), None);
    }
}

#[cfg(test)]
mod reconciler_policy_tests {
    use super::*;

    #[test]
    fn test_incomplete_sides_clear_and_skip_fetch() {
        let mut draft = complete_draft(OrderStatus::NewOrder);
        draft.delivery.address.lon.clear();
        let completion = completion::evaluate(&draft);
        assert_eq!(plan(&draft, &completion, no_trigger(), now()), FetchPlan::Clear);
    }

    #[test]
    fn test_new_order_refetches_and_overwrites_selection() {
        let draft = complete_draft(OrderStatus::NewOrder);
        let completion = completion::evaluate(&draft);
        assert_eq!(
            plan(&draft, &completion, no_trigger(), now()),
            FetchPlan::FetchAndSelect
        );

        let fetched = vec![
            tier("2 Hour", &[]),
            tier(
                "3 Hour",
                &[("2026-09-02T09:00:00Z", "2026-09-02T12:00:00Z")],
            ),
        ];
        let (state, timeframe) = apply(FetchPlan::FetchAndSelect, fetched, &draft.timeframe);
        assert_eq!(timeframe.service, "3 Hour");
        assert_eq!(timeframe.start_time, "2026-09-02T09:00:00Z");
        assert!(matches!(state, CandidateState::WithSelection { .. }));
    }

    #[test]
    fn test_edit_with_future_window_keeps_selection_across_identical_fetches() {
        // Reconciler idempotence: rule 3 never overwrites.
        let draft = complete_draft(OrderStatus::Processing);
        let completion = completion::evaluate(&draft);
        assert_eq!(
            plan(&draft, &completion, no_trigger(), now()),
            FetchPlan::FetchKeepSelection
        );

        let fetched = vec![
            tier(
                "3 Hour",
                &[("2026-09-02T09:00:00Z", "2026-09-02T12:00:00Z")],
            ),
            tier(
                "Same Day",
                &[("2026-09-02T09:00:00Z", "2026-09-02T20:00:00Z")],
            ),
        ];

        let (_, first) = apply(FetchPlan::FetchKeepSelection, fetched.clone(), &draft.timeframe);
        let (_, second) = apply(FetchPlan::FetchKeepSelection, fetched, &first);
        assert_eq!(first, draft.timeframe);
        assert_eq!(second, draft.timeframe);
    }

    #[test]
    fn test_past_window_locks_to_existing_timeframe() {
        let mut draft = complete_draft(OrderStatus::Processing);
        draft.timeframe.start_time = "2026-08-29T09:00:00Z".to_string();
        draft.timeframe.end_time = "2026-08-29T20:00:00Z".to_string();
        let completion = completion::evaluate(&draft);

        assert_eq!(
            plan(&draft, &completion, no_trigger(), now()),
            FetchPlan::LockExisting
        );

        // Regardless of what the backend would offer, the candidate list
        // collapses to the single committed window.
        let (state, timeframe) = apply(FetchPlan::LockExisting, Vec::new(), &draft.timeframe);
        assert_eq!(timeframe, draft.timeframe);
        let candidates = state.candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].slots.len(), 1);
        assert_eq!(candidates[0].slots[0].start_time, draft.timeframe.start_time);
    }

    #[test]
    fn test_explicit_date_change_always_refetches() {
        for status in [
            OrderStatus::NewOrder,
            OrderStatus::Processing,
            OrderStatus::Assigned,
            OrderStatus::PickedUp,
        ] {
            let draft = complete_draft(status);
            let completion = completion::evaluate(&draft);
            let trigger = ReconcileTrigger {
                pickup_address_changed: false,
                explicit_date_change: true,
            };
            assert_eq!(
                plan(&draft, &completion, trigger, now()),
                FetchPlan::FetchAndSelect,
                "explicit date change must refetch for {:?}",
                status
            );
        }
    }

    #[test]
    fn test_explicit_date_change_still_gated_by_completeness() {
        let mut draft = complete_draft(OrderStatus::NewOrder);
        draft.pickup.phone.clear();
        let completion = completion::evaluate(&draft);
        let trigger = ReconcileTrigger {
            pickup_address_changed: false,
            explicit_date_change: true,
        };
        assert_eq!(plan(&draft, &completion, trigger, now()), FetchPlan::Clear);
    }

    #[test]
    fn test_moved_pickup_during_processing_resets_selection() {
        let draft = complete_draft(OrderStatus::Processing);
        let completion = completion::evaluate(&draft);
        let trigger = ReconcileTrigger {
            pickup_address_changed: true,
            explicit_date_change: false,
        };
        assert_eq!(
            plan(&draft, &completion, trigger, now()),
            FetchPlan::FetchAndSelect
        );
    }

    #[test]
    fn test_moved_pickup_does_not_reset_assigned_orders() {
        // The address-identity trigger applies to processing orders only;
        // later statuses keep their committed window.
        let draft = complete_draft(OrderStatus::Assigned);
        let completion = completion::evaluate(&draft);
        let trigger = ReconcileTrigger {
            pickup_address_changed: true,
            explicit_date_change: false,
        };
        assert_eq!(
            plan(&draft, &completion, trigger, now()),
            FetchPlan::FetchKeepSelection
        );
    }

    #[test]
    fn test_fastest_available_affordance() {
        let candidates = vec![
            tier(
                "3 Hour",
                &[("2026-09-01T09:00:00Z", "2026-09-01T12:00:00Z")],
            ),
            tier(
                "Same Day",
                &[("2026-09-01T09:00:00Z", "2026-09-01T20:00:00Z")],
            ),
        ];

        let mut draft = complete_draft(OrderStatus::NewOrder);
        draft.timeframe = Timeframe {
            service: "Same Day".to_string(),
            service_id: 1,
            start_time: "2026-09-01T09:00:00Z".to_string(),
            end_time: "2026-09-01T20:00:00Z".to_string(),
        };
        let completion = completion::evaluate(&draft);

        let offered = fastest_available(&draft, &completion, &candidates).unwrap();
        assert_eq!(offered.service, "3 Hour");

        // Selecting the offered slot hides the affordance.
        let draft = draft.with_timeframe(offered);
        assert_eq!(fastest_available(&draft, &completion, &candidates), None);

        // Never offered while editing a submitted order.
        let mut editing = complete_draft(OrderStatus::Processing);
        editing.timeframe = Timeframe::default();
        let completion = completion::evaluate(&editing);
        assert_eq!(fastest_available(&editing, &completion, &candidates), None);
    }
}
