use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One signed volume movement against a storage tank.
///
/// The sign of `milk_volume` is the sole discriminator between inflow and
/// outflow: positive liters were received into the tank, negative liters were
/// offloaded from it. Rows are append-only; history is never rewritten.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "milk_receptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tank_number: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub milk_volume: Decimal,
    pub batch_id: Option<String>,
    pub supplier_name: Option<String>,
    pub destination: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub temperature: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub fat_percentage: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub protein_percentage: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub acidity: Option<Decimal>,
    pub total_plate_count: Option<i32>,
    pub quality_check: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
