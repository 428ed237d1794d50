//! Property-based tests for the tank volume ledger.
//!
//! These tests use proptest to verify invariants across a wide range of
//! movement histories, helping to catch edge cases that unit tests might
//! miss.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use farmgate_api::entities::milk_reception;
use farmgate_api::ledger::validation::{validate_offload, OffloadRequest, ValidationFailure};
use farmgate_api::ledger::{calculate_balance, find_alternative_tank};

const TANKS: [&str; 3] = ["Tank A", "Tank B", "Direct-Processing"];

// Strategies for generating test data
fn liters_strategy() -> impl Strategy<Value = Decimal> {
    // Signed volumes between -5000.00 and 5000.00 liters, two decimal places.
    (-500_000i64..=500_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn history_strategy() -> impl Strategy<Value = Vec<(usize, Decimal)>> {
    prop::collection::vec((0..TANKS.len(), liters_strategy()), 0..60)
}

fn requested_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

// Property: balances are a pure fold of the history
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn received_minus_offloaded_is_available(history in history_strategy()) {
        let records = build_records(&history);
        for tank in TANKS {
            let balance = calculate_balance(&records, tank);
            prop_assert!(balance.received >= Decimal::ZERO);
            prop_assert!(balance.offloaded >= Decimal::ZERO);
            prop_assert_eq!(balance.available, balance.received - balance.offloaded);
        }
    }

    #[test]
    fn balance_ignores_movement_order(
        (original, shuffled) in history_strategy().prop_flat_map(|history| {
            (Just(history.clone()), Just(history).prop_shuffle())
        })
    ) {
        let forward = build_records(&original);
        let reordered = build_records(&shuffled);
        for tank in TANKS {
            prop_assert_eq!(
                calculate_balance(&forward, tank),
                calculate_balance(&reordered, tank)
            );
        }
    }

    #[test]
    fn totals_split_cleanly_by_sign(history in history_strategy()) {
        let records = build_records(&history);
        for (index, tank) in TANKS.iter().enumerate() {
            let expected_received: Decimal = history
                .iter()
                .filter(|(t, volume)| *t == index && *volume > Decimal::ZERO)
                .map(|(_, volume)| *volume)
                .sum();
            let expected_offloaded: Decimal = history
                .iter()
                .filter(|(t, volume)| *t == index && *volume < Decimal::ZERO)
                .map(|(_, volume)| volume.abs())
                .sum();

            let balance = calculate_balance(&records, tank);
            prop_assert_eq!(balance.received, expected_received);
            prop_assert_eq!(balance.offloaded, expected_offloaded);
        }
    }
}

// Property: the alternative tank resolver only makes promises it can keep
proptest! {
    #[test]
    fn suggested_tank_actually_fits_the_volume(
        history in history_strategy(),
        current in 0..TANKS.len(),
        required in requested_strategy(),
    ) {
        let records = build_records(&history);
        let known: Vec<String> = TANKS.iter().map(|t| t.to_string()).collect();
        let current = TANKS[current];

        match find_alternative_tank(&records, current, required, &known) {
            Some(suggestion) => {
                prop_assert_ne!(&suggestion.tank_number, current);
                prop_assert!(known.contains(&suggestion.tank_number));
                prop_assert!(suggestion.available >= required);
                prop_assert_eq!(
                    suggestion.available,
                    calculate_balance(&records, &suggestion.tank_number).available
                );
                // No other tank was a strictly better pick.
                for tank in TANKS.iter().filter(|t| **t != current) {
                    prop_assert!(
                        calculate_balance(&records, tank).available <= suggestion.available
                    );
                }
            }
            None => {
                for tank in TANKS.iter().filter(|t| **t != current) {
                    prop_assert!(calculate_balance(&records, tank).available < required);
                }
            }
        }
    }
}

// Property: offload validation reports exactly the real problems
proptest! {
    #[test]
    fn each_blank_required_field_yields_one_failure(
        batch_present in any::<bool>(),
        tank_present in any::<bool>(),
        volume_present in any::<bool>(),
        temperature_present in any::<bool>(),
        destination_present in any::<bool>(),
    ) {
        let request = OffloadRequest {
            batch_id: batch_present.then(|| "B-1".to_string()),
            storage_tank: tank_present.then(|| "Tank A".to_string()),
            // Zero liters parses and can never trip the sufficiency check.
            milk_volume: volume_present.then(|| "0".to_string()),
            temperature: temperature_present.then(|| "4.0".to_string()),
            destination: destination_present.then(|| "Pasteurizer".to_string()),
            ..OffloadRequest::default()
        };

        let absent = [
            batch_present,
            tank_present,
            volume_present,
            temperature_present,
            destination_present,
        ]
        .iter()
        .filter(|present| !**present)
        .count();

        let failures = validate_offload(&request, &[]);
        prop_assert_eq!(failures.len(), absent);
        for failure in &failures {
            prop_assert!(
                matches!(failure, ValidationFailure::MissingField { .. }),
                "expected MissingField, got: {:?}",
                failure
            );
            prop_assert!(failure.to_string().ends_with("is required"));
        }
    }

    #[test]
    fn sufficiency_matches_the_strict_comparison(
        history in history_strategy(),
        requested in requested_strategy(),
    ) {
        let records = build_records(&history);
        let request = OffloadRequest {
            batch_id: Some("B-1".to_string()),
            storage_tank: Some("Tank A".to_string()),
            milk_volume: Some(requested.to_string()),
            temperature: Some("4.0".to_string()),
            destination: Some("Pasteurizer".to_string()),
            ..OffloadRequest::default()
        };

        let available = calculate_balance(&records, "Tank A").available;
        let failures = validate_offload(&request, &records);
        let short = failures
            .iter()
            .any(|f| matches!(f, ValidationFailure::InsufficientVolume { .. }));

        prop_assert_eq!(short, requested > available);
        if !short {
            prop_assert!(failures.is_empty(), "unexpected failures: {failures:?}");
        }
    }
}

// Helpers for materializing movement histories
fn build_records(history: &[(usize, Decimal)]) -> Vec<milk_reception::Model> {
    history
        .iter()
        .map(|(tank, volume)| milk_reception::Model {
            id: Uuid::new_v4(),
            tank_number: TANKS[*tank].to_string(),
            milk_volume: *volume,
            batch_id: None,
            supplier_name: None,
            destination: None,
            temperature: None,
            fat_percentage: None,
            protein_percentage: None,
            acidity: None,
            total_plate_count: None,
            quality_check: None,
            notes: None,
            created_at: Utc::now(),
        })
        .collect()
}
