use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{milk_reception, MilkReception},
    errors::ServiceError,
    events::{Event, EventSender},
    ledger::{
        self,
        validation::{self, OffloadRequest, ValidationFailure},
        TankBalance, TankSuggestion,
    },
};

/// A new delivery of raw milk into a storage tank.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewReception {
    #[validate(length(min = 1, max = 120))]
    pub supplier_name: String,
    #[validate(length(min = 1, max = 60))]
    pub tank_number: String,
    /// Liters delivered; must be positive.
    pub milk_volume: Decimal,
    #[validate(length(max = 60))]
    pub batch_id: Option<String>,
    pub temperature: Option<Decimal>,
    pub fat_percentage: Option<Decimal>,
    pub protein_percentage: Option<Decimal>,
    pub acidity: Option<Decimal>,
    pub total_plate_count: Option<i32>,
    pub quality_check: Option<String>,
    pub notes: Option<String>,
}

/// Whether a movement put milk into the tank or took it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MovementDirection {
    Received,
    Offloaded,
}

impl MovementDirection {
    pub fn of(volume: Decimal) -> MovementDirection {
        if volume < Decimal::ZERO {
            MovementDirection::Offloaded
        } else {
            MovementDirection::Received
        }
    }
}

/// Point-in-time level of one configured tank.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TankLevel {
    pub tank_number: String,
    pub received: Decimal,
    pub offloaded: Decimal,
    pub available: Decimal,
}

impl TankLevel {
    fn new(tank: &str, balance: TankBalance) -> Self {
        Self {
            tank_number: tank.to_string(),
            received: balance.received,
            offloaded: balance.offloaded,
            available: balance.available,
        }
    }
}

/// Everything the dashboard needs to render a rejected or dry-run offload.
#[derive(Debug, Clone)]
pub struct OffloadAssessment {
    pub failures: Vec<ValidationFailure>,
    pub suggested_tank: Option<TankSuggestion>,
}

impl OffloadAssessment {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of attempting to commit an offload.
#[derive(Debug)]
pub enum OffloadOutcome {
    Accepted {
        record: milk_reception::Model,
        balance: TankBalance,
    },
    Rejected(OffloadAssessment),
}

/// Service for recording milk movements and answering balance queries
#[derive(Clone)]
pub struct MilkReceptionService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    known_tanks: Arc<Vec<String>>,
}

impl MilkReceptionService {
    /// Creates a new milk reception service instance
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, known_tanks: Vec<String>) -> Self {
        Self {
            db,
            event_sender,
            known_tanks: Arc::new(known_tanks),
        }
    }

    /// The configured tank topology.
    pub fn known_tanks(&self) -> &[String] {
        &self.known_tanks
    }

    fn is_known_tank(&self, tank: &str) -> bool {
        self.known_tanks.iter().any(|known| known == tank)
    }

    /// Records a delivery as a positive movement.
    #[instrument(skip(self, reception), fields(tank = %reception.tank_number))]
    pub async fn record_reception(
        &self,
        reception: NewReception,
    ) -> Result<milk_reception::Model, ServiceError> {
        reception.validate()?;

        if reception.milk_volume <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "milk volume must be positive".to_string(),
            ));
        }
        if !self.is_known_tank(&reception.tank_number) {
            return Err(ServiceError::InvalidInput(format!(
                "unknown storage tank: {}",
                reception.tank_number
            )));
        }

        let record = milk_reception::ActiveModel {
            id: Set(Uuid::new_v4()),
            tank_number: Set(reception.tank_number),
            milk_volume: Set(reception.milk_volume),
            batch_id: Set(reception.batch_id),
            supplier_name: Set(Some(reception.supplier_name)),
            destination: Set(None),
            temperature: Set(reception.temperature),
            fat_percentage: Set(reception.fat_percentage),
            protein_percentage: Set(reception.protein_percentage),
            acidity: Set(reception.acidity),
            total_plate_count: Set(reception.total_plate_count),
            quality_check: Set(reception.quality_check),
            notes: Set(reception.notes),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await?;

        self.event_sender
            .send(Event::MilkReceived {
                record_id: record.id,
                tank_number: record.tank_number.clone(),
                volume_liters: record.milk_volume,
                supplier_name: record.supplier_name.clone(),
                received_at: record.created_at,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(record_id = %record.id, volume = %record.milk_volume, "milk reception recorded");
        Ok(record)
    }

    /// Validates an offload form without committing anything.
    #[instrument(skip(self, request))]
    pub async fn validate_offload(
        &self,
        request: &OffloadRequest,
    ) -> Result<OffloadAssessment, ServiceError> {
        let records = MilkReception::find().all(self.db.as_ref()).await?;
        let failures = validation::validate_offload(request, &records);
        let suggested_tank = suggest_for_failures(&failures, &records, &self.known_tanks);
        Ok(OffloadAssessment {
            failures,
            suggested_tank,
        })
    }

    /// Validates and, when clean, commits an offload as a negative movement.
    ///
    /// The history read, the sufficiency check and the insert share one
    /// transaction so a concurrent offload cannot overdraw the tank through
    /// this service.
    #[instrument(skip(self, request))]
    pub async fn record_offload(
        &self,
        request: OffloadRequest,
    ) -> Result<OffloadOutcome, ServiceError> {
        let requested_tank = request.required_field("storage_tank").map(str::to_string);
        let known_tanks = Arc::clone(&self.known_tanks);

        let outcome = self
            .db
            .transaction::<_, OffloadOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    let records = MilkReception::find()
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let offload = match validation::parse_offload(&request, &records) {
                        Ok(offload) => offload,
                        Err(failures) => {
                            let suggested_tank =
                                suggest_for_failures(&failures, &records, &known_tanks);
                            return Ok(OffloadOutcome::Rejected(OffloadAssessment {
                                failures,
                                suggested_tank,
                            }));
                        }
                    };

                    if offload.volume <= Decimal::ZERO {
                        return Err(ServiceError::InvalidOperation(
                            "offload volume must be positive".to_string(),
                        ));
                    }

                    let record = milk_reception::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        tank_number: Set(offload.storage_tank.clone()),
                        milk_volume: Set(-offload.volume),
                        batch_id: Set(Some(offload.batch_id)),
                        supplier_name: Set(offload.supplier_name),
                        destination: Set(Some(offload.destination)),
                        temperature: Set(Some(offload.temperature)),
                        fat_percentage: Set(offload.fat_percentage),
                        protein_percentage: Set(offload.protein_percentage),
                        acidity: Set(offload.acidity),
                        total_plate_count: Set(offload.total_plate_count),
                        quality_check: Set(offload.quality_check),
                        notes: Set(offload.notes),
                        created_at: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let mut after = records;
                    after.push(record.clone());
                    let balance = ledger::calculate_balance(&after, &offload.storage_tank);

                    Ok(OffloadOutcome::Accepted { record, balance })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        match &outcome {
            OffloadOutcome::Accepted { record, balance } => {
                self.event_sender
                    .send(Event::MilkOffloaded {
                        record_id: record.id,
                        tank_number: record.tank_number.clone(),
                        volume_liters: record.milk_volume.abs(),
                        destination: record.destination.clone().unwrap_or_default(),
                        available_after: balance.available,
                    })
                    .await
                    .map_err(ServiceError::EventError)?;
                info!(record_id = %record.id, tank = %record.tank_number, "milk offload recorded");
            }
            OffloadOutcome::Rejected(assessment) => {
                self.event_sender
                    .send(Event::OffloadRejected {
                        tank_number: requested_tank,
                        failure_count: assessment.failures.len(),
                    })
                    .await
                    .map_err(ServiceError::EventError)?;
            }
        }

        Ok(outcome)
    }

    /// Current level of a single configured tank.
    #[instrument(skip(self))]
    pub async fn tank_balance(&self, tank: &str) -> Result<TankLevel, ServiceError> {
        if !self.is_known_tank(tank) {
            return Err(ServiceError::NotFound(format!(
                "Storage tank {} is not configured",
                tank
            )));
        }
        let records = MilkReception::find().all(self.db.as_ref()).await?;
        Ok(TankLevel::new(tank, ledger::calculate_balance(&records, tank)))
    }

    /// Levels of every configured tank, from one history read.
    #[instrument(skip(self))]
    pub async fn tank_balances(&self) -> Result<Vec<TankLevel>, ServiceError> {
        let records = MilkReception::find().all(self.db.as_ref()).await?;
        Ok(self
            .known_tanks
            .iter()
            .map(|tank| TankLevel::new(tank, ledger::calculate_balance(&records, tank)))
            .collect())
    }

    /// Best alternative tank for a withdrawal the given tank cannot absorb.
    #[instrument(skip(self))]
    pub async fn suggest_alternative(
        &self,
        tank: &str,
        required_volume: Decimal,
    ) -> Result<Option<TankSuggestion>, ServiceError> {
        let required = required_volume.abs();
        let records = MilkReception::find().all(self.db.as_ref()).await?;
        Ok(ledger::find_alternative_tank(
            &records,
            tank,
            required,
            &self.known_tanks,
        ))
    }

    /// Movement history, most recent first.
    #[instrument(skip(self))]
    pub async fn list_receptions(
        &self,
        page: u64,
        limit: u64,
        tank: Option<&str>,
        direction: Option<MovementDirection>,
    ) -> Result<(Vec<milk_reception::Model>, u64), ServiceError> {
        let mut query = MilkReception::find().order_by_desc(milk_reception::Column::CreatedAt);
        if let Some(tank) = tank {
            query = query.filter(milk_reception::Column::TankNumber.eq(tank));
        }
        match direction {
            Some(MovementDirection::Received) => {
                query = query.filter(milk_reception::Column::MilkVolume.gt(Decimal::ZERO));
            }
            Some(MovementDirection::Offloaded) => {
                query = query.filter(milk_reception::Column::MilkVolume.lt(Decimal::ZERO));
            }
            None => {}
        }

        let paginator = query.paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((records, total))
    }
}

/// A tank suggestion is only relevant when the rejection was about volume.
fn suggest_for_failures(
    failures: &[ValidationFailure],
    records: &[milk_reception::Model],
    known_tanks: &[String],
) -> Option<TankSuggestion> {
    failures.iter().find_map(|failure| match failure {
        ValidationFailure::InsufficientVolume {
            tank, requested, ..
        } => ledger::find_alternative_tank(records, tank, *requested, known_tanks),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

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

    #[test]
    fn direction_follows_the_sign() {
        assert_eq!(MovementDirection::of(dec!(10)), MovementDirection::Received);
        assert_eq!(
            MovementDirection::of(dec!(-10)),
            MovementDirection::Offloaded
        );
    }

    #[test]
    fn suggestion_only_offered_for_volume_failures() {
        let records = vec![movement("Tank A", dec!(10)), movement("Tank B", dec!(500))];
        let known = vec!["Tank A".to_string(), "Tank B".to_string()];

        let missing_only = vec![ValidationFailure::MissingField { field: "batch_id" }];
        assert!(suggest_for_failures(&missing_only, &records, &known).is_none());

        let short = vec![ValidationFailure::InsufficientVolume {
            tank: "Tank A".into(),
            requested: dec!(100),
            available: dec!(10),
        }];
        let suggestion = suggest_for_failures(&short, &records, &known).unwrap();
        assert_eq!(suggestion.tank_number, "Tank B");
        assert_eq!(suggestion.available, dec!(500));
    }
}
