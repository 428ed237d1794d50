//! Offload form validation.
//!
//! The dashboard submits offload forms as raw text fields. Validation walks
//! the whole form and accumulates every failure instead of stopping at the
//! first one, so the operator can fix the entire form in a single pass.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::calculate_balance;
use crate::entities::milk_reception;

/// Required offload fields, in the order their failures are reported.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "batch_id",
    "storage_tank",
    "milk_volume",
    "temperature",
    "destination",
];

/// An offload form exactly as submitted. Every field is optional text;
/// nothing is trusted until [`parse_offload`] has seen it.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct OffloadRequest {
    pub batch_id: Option<String>,
    pub storage_tank: Option<String>,
    pub milk_volume: Option<String>,
    pub temperature: Option<String>,
    pub destination: Option<String>,
    pub supplier_name: Option<String>,
    pub quality_check: Option<String>,
    pub fat_percentage: Option<String>,
    pub protein_percentage: Option<String>,
    pub acidity: Option<String>,
    pub total_plate_count: Option<String>,
    pub notes: Option<String>,
}

impl OffloadRequest {
    /// Trimmed value of a required field, `None` when absent or blank.
    pub fn required_field(&self, field: &str) -> Option<&str> {
        let value = match field {
            "batch_id" => &self.batch_id,
            "storage_tank" => &self.storage_tank,
            "milk_volume" => &self.milk_volume,
            "temperature" => &self.temperature,
            "destination" => &self.destination,
            _ => return None,
        };
        trimmed(value)
    }
}

/// One reason an offload form cannot be accepted.
///
/// `Display` renders the operator-facing message; field names appear with
/// underscores replaced by spaces, matching the labels on the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// A required field was absent or blank.
    #[error("{} is required", .field.replace('_', " "))]
    MissingField { field: &'static str },

    /// A numeric field held text that does not parse.
    #[error("{} must be a number", .field.replace('_', " "))]
    InvalidNumber { field: &'static str },

    /// The tank does not hold enough milk to cover the withdrawal.
    #[error("Insufficient volume in {tank}: requested {requested:.2} L, only {available:.2} L available")]
    InsufficientVolume {
        tank: String,
        requested: Decimal,
        available: Decimal,
    },
}

/// A fully parsed, storage-ready offload. Only produced when the form passed
/// every check; `volume` is the absolute number of liters to withdraw.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidOffload {
    pub batch_id: String,
    pub storage_tank: String,
    pub volume: Decimal,
    pub temperature: Decimal,
    pub destination: String,
    pub supplier_name: Option<String>,
    pub quality_check: Option<String>,
    pub fat_percentage: Option<Decimal>,
    pub protein_percentage: Option<Decimal>,
    pub acidity: Option<Decimal>,
    pub total_plate_count: Option<i32>,
    pub notes: Option<String>,
}

/// Check an offload form against the movement history and report every
/// failure. An empty result means the form would be accepted as-is.
pub fn validate_offload(
    request: &OffloadRequest,
    records: &[milk_reception::Model],
) -> Vec<ValidationFailure> {
    match parse_offload(request, records) {
        Ok(_) => Vec::new(),
        Err(failures) => failures,
    }
}

/// Validate an offload form and, when it is clean, hand back the typed
/// values ready for storage.
///
/// Failures accumulate in a fixed order: the five required fields first,
/// then numeric problems with the volume, then volume sufficiency, then the
/// remaining numeric fields. Sufficiency is only judged once both the volume
/// parses and a tank is named; reporting a shortfall against an unnamed tank
/// would be noise on top of the missing-field failure already present.
pub fn parse_offload(
    request: &OffloadRequest,
    records: &[milk_reception::Model],
) -> Result<ValidOffload, Vec<ValidationFailure>> {
    let mut failures = Vec::new();

    for field in REQUIRED_FIELDS {
        if request.required_field(field).is_none() {
            failures.push(ValidationFailure::MissingField { field });
        }
    }

    let volume = match request.required_field("milk_volume") {
        Some(raw) => match raw.parse::<Decimal>() {
            // The form is free to submit the withdrawal as a negative
            // movement; either sign means the same withdrawal.
            Ok(parsed) => Some(parsed.abs()),
            Err(_) => {
                failures.push(ValidationFailure::InvalidNumber {
                    field: "milk_volume",
                });
                None
            }
        },
        None => None,
    };

    let storage_tank = request.required_field("storage_tank");
    if let (Some(requested), Some(tank)) = (volume, storage_tank) {
        let available = calculate_balance(records, tank).available;
        if requested > available {
            failures.push(ValidationFailure::InsufficientVolume {
                tank: tank.to_string(),
                requested,
                available,
            });
        }
    }

    let temperature = match request.required_field("temperature") {
        Some(raw) => match raw.parse::<Decimal>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                failures.push(ValidationFailure::InvalidNumber {
                    field: "temperature",
                });
                None
            }
        },
        None => None,
    };

    let mut decimal_field = |field: &'static str, value: &Option<String>| {
        match parse_decimal_field(field, value) {
            Ok(parsed) => parsed,
            Err(failure) => {
                failures.push(failure);
                None
            }
        }
    };
    let fat_percentage = decimal_field("fat_percentage", &request.fat_percentage);
    let protein_percentage = decimal_field("protein_percentage", &request.protein_percentage);
    let acidity = decimal_field("acidity", &request.acidity);

    let total_plate_count = match trimmed(&request.total_plate_count) {
        Some(raw) => match raw.parse::<i32>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                failures.push(ValidationFailure::InvalidNumber {
                    field: "total_plate_count",
                });
                None
            }
        },
        None => None,
    };

    if !failures.is_empty() {
        return Err(failures);
    }

    match (
        request.required_field("batch_id"),
        storage_tank,
        volume,
        temperature,
        request.required_field("destination"),
    ) {
        (Some(batch_id), Some(tank), Some(volume), Some(temperature), Some(destination)) => {
            Ok(ValidOffload {
                batch_id: batch_id.to_string(),
                storage_tank: tank.to_string(),
                volume,
                temperature,
                destination: destination.to_string(),
                supplier_name: trimmed(&request.supplier_name).map(str::to_string),
                quality_check: trimmed(&request.quality_check).map(str::to_string),
                fat_percentage,
                protein_percentage,
                acidity,
                total_plate_count,
                notes: trimmed(&request.notes).map(str::to_string),
            })
        }
        // Every absent or malformed value pushed a failure above.
        _ => Err(failures),
    }
}

/// Parse an optional numeric form field, reporting `InvalidNumber` instead
/// of silently dropping malformed input.
pub fn parse_decimal_field(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<Decimal>, ValidationFailure> {
    match trimmed(value) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<Decimal>()
            .map(Some)
            .map_err(|_| ValidationFailure::InvalidNumber { field }),
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use test_case::test_case;
    use uuid::Uuid;

    use super::*;

    fn movement(tank: &str, volume: Decimal) -> milk_reception::Model {
        milk_reception::Model {
            id: Uuid::new_v4(),
            tank_number: tank.to_string(),
            milk_volume: volume,
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
        }
    }

    fn tank_a_with_70() -> Vec<milk_reception::Model> {
        vec![movement("Tank A", dec!(100)), movement("Tank A", dec!(-30))]
    }

    fn full_request(volume: &str) -> OffloadRequest {
        OffloadRequest {
            batch_id: Some("B-2025-114".into()),
            storage_tank: Some("Tank A".into()),
            milk_volume: Some(volume.into()),
            temperature: Some("4.2".into()),
            destination: Some("Pasteurizer 1".into()),
            supplier_name: Some("Meadow Farm".into()),
            ..OffloadRequest::default()
        }
    }

    fn rendered(failures: &[ValidationFailure]) -> Vec<String> {
        failures.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn empty_form_reports_every_required_field_once() {
        let failures = validate_offload(&OffloadRequest::default(), &[]);
        assert_eq!(
            rendered(&failures),
            vec![
                "batch id is required",
                "storage tank is required",
                "milk volume is required",
                "temperature is required",
                "destination is required",
            ]
        );
    }

    #[test]
    fn blank_and_whitespace_fields_count_as_missing() {
        let request = OffloadRequest {
            batch_id: Some("".into()),
            storage_tank: Some("   ".into()),
            ..full_request("10")
        };
        let failures = validate_offload(&request, &tank_a_with_70());
        assert_eq!(
            failures,
            vec![
                ValidationFailure::MissingField { field: "batch_id" },
                ValidationFailure::MissingField {
                    field: "storage_tank"
                },
            ]
        );
    }

    #[test]
    fn single_missing_field_yields_exactly_one_failure() {
        let request = OffloadRequest {
            batch_id: None,
            ..full_request("10")
        };
        let failures = validate_offload(&request, &tank_a_with_70());
        assert_eq!(rendered(&failures), vec!["batch id is required"]);
    }

    #[test_case("30", true ; "well below available")]
    #[test_case("70", true ; "exactly available")]
    #[test_case("70.01", false ; "a centiliter over")]
    #[test_case("71", false ; "above available")]
    fn sufficiency_is_a_strict_comparison(volume: &str, accepted: bool) {
        let failures = validate_offload(&full_request(volume), &tank_a_with_70());
        assert_eq!(failures.is_empty(), accepted, "failures: {failures:?}");
    }

    #[test]
    fn shortfall_message_formats_two_decimal_places() {
        let failures = validate_offload(&full_request("71"), &tank_a_with_70());
        assert_eq!(
            rendered(&failures),
            vec!["Insufficient volume in Tank A: requested 71.00 L, only 70.00 L available"]
        );
    }

    #[test]
    fn negative_volume_is_the_same_withdrawal() {
        assert!(validate_offload(&full_request("-70"), &tank_a_with_70()).is_empty());
        let failures = validate_offload(&full_request("-71"), &tank_a_with_70());
        assert_eq!(
            failures,
            vec![ValidationFailure::InsufficientVolume {
                tank: "Tank A".into(),
                requested: dec!(71),
                available: dec!(70),
            }]
        );
    }

    #[test]
    fn unparsable_volume_reports_invalid_number_not_shortfall() {
        let failures = validate_offload(&full_request("a lot"), &tank_a_with_70());
        assert_eq!(
            failures,
            vec![ValidationFailure::InvalidNumber {
                field: "milk_volume"
            }]
        );
        assert_eq!(rendered(&failures), vec!["milk volume must be a number"]);
    }

    #[test]
    fn sufficiency_skipped_when_no_tank_named() {
        let request = OffloadRequest {
            storage_tank: None,
            ..full_request("1000")
        };
        let failures = validate_offload(&request, &tank_a_with_70());
        assert_eq!(rendered(&failures), vec!["storage tank is required"]);
    }

    #[test]
    fn offload_from_unknown_tank_reports_zero_availability() {
        let request = OffloadRequest {
            storage_tank: Some("Tank Z".into()),
            ..full_request("10")
        };
        let failures = validate_offload(&request, &tank_a_with_70());
        assert_eq!(
            rendered(&failures),
            vec!["Insufficient volume in Tank Z: requested 10.00 L, only 0.00 L available"]
        );
    }

    #[test]
    fn malformed_optional_numerics_accumulate_after_core_failures() {
        let request = OffloadRequest {
            batch_id: None,
            fat_percentage: Some("creamy".into()),
            total_plate_count: Some("12.5".into()),
            ..full_request("10")
        };
        let failures = validate_offload(&request, &tank_a_with_70());
        assert_eq!(
            failures,
            vec![
                ValidationFailure::MissingField { field: "batch_id" },
                ValidationFailure::InvalidNumber {
                    field: "fat_percentage"
                },
                ValidationFailure::InvalidNumber {
                    field: "total_plate_count"
                },
            ]
        );
    }

    #[test]
    fn parse_produces_typed_values_on_success() {
        let request = OffloadRequest {
            fat_percentage: Some(" 3.9 ".into()),
            total_plate_count: Some("42000".into()),
            notes: Some("  evening run  ".into()),
            ..full_request("-45.5")
        };
        let offload = parse_offload(&request, &tank_a_with_70()).unwrap();
        assert_eq!(offload.batch_id, "B-2025-114");
        assert_eq!(offload.storage_tank, "Tank A");
        assert_eq!(offload.volume, dec!(45.5));
        assert_eq!(offload.temperature, dec!(4.2));
        assert_eq!(offload.destination, "Pasteurizer 1");
        assert_eq!(offload.fat_percentage, Some(dec!(3.9)));
        assert_eq!(offload.total_plate_count, Some(42000));
        assert_eq!(offload.notes.as_deref(), Some("evening run"));
    }

    #[test]
    fn validation_is_pure_and_leaves_the_request_untouched() {
        let request = full_request("70");
        let first = validate_offload(&request, &tank_a_with_70());
        let second = validate_offload(&request, &tank_a_with_70());
        assert_eq!(first, second);
        assert_eq!(request.milk_volume.as_deref(), Some("70"));
    }
}
