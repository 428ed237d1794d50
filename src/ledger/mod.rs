//! Tank volume accounting over the raw movement history.
//!
//! Balances are never stored. Every figure the dashboard shows is recomputed
//! from the full list of signed movements, so the history remains the single
//! source of truth and a crashed write can never leave a stale counter behind.

pub mod validation;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::milk_reception;

/// Derived totals for one storage tank, all in liters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct TankBalance {
    /// Sum of all positive movements.
    pub received: Decimal,
    /// Absolute sum of all negative movements.
    pub offloaded: Decimal,
    /// `received - offloaded`.
    pub available: Decimal,
}

impl TankBalance {
    pub const ZERO: TankBalance = TankBalance {
        received: Decimal::ZERO,
        offloaded: Decimal::ZERO,
        available: Decimal::ZERO,
    };
}

/// A tank that could absorb an offload the requested tank cannot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TankSuggestion {
    pub tank_number: String,
    pub available: Decimal,
}

/// Fold the movement history into the balance of a single tank.
///
/// Movements against other tanks are ignored. Addition over `Decimal` is
/// commutative, so the result does not depend on the order of `records`.
/// An empty history yields [`TankBalance::ZERO`].
pub fn calculate_balance(records: &[milk_reception::Model], tank: &str) -> TankBalance {
    let mut received = Decimal::ZERO;
    let mut offloaded = Decimal::ZERO;

    for record in records.iter().filter(|r| r.tank_number == tank) {
        if record.milk_volume > Decimal::ZERO {
            received += record.milk_volume;
        } else if record.milk_volume < Decimal::ZERO {
            offloaded += record.milk_volume.abs();
        }
    }

    TankBalance {
        received,
        offloaded,
        available: received - offloaded,
    }
}

/// Pick the fullest tank other than `current_tank` that already holds at
/// least `required_volume` liters.
///
/// Candidates come from `known_tanks` only; tank names appearing in the
/// history but absent from the configured topology are never suggested.
/// Ties on availability resolve to whichever tank is listed first.
pub fn find_alternative_tank(
    records: &[milk_reception::Model],
    current_tank: &str,
    required_volume: Decimal,
    known_tanks: &[String],
) -> Option<TankSuggestion> {
    let mut candidates: Vec<TankSuggestion> = known_tanks
        .iter()
        .filter(|name| name.as_str() != current_tank)
        .map(|name| TankSuggestion {
            tank_number: name.clone(),
            available: calculate_balance(records, name).available,
        })
        .filter(|candidate| candidate.available >= required_volume)
        .collect();

    candidates.sort_by(|a, b| b.available.cmp(&a.available));
    candidates.into_iter().next()
}
