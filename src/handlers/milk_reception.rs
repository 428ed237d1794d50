use crate::errors::ServiceError;
use crate::ledger::validation::OffloadRequest;
use crate::ledger::TankSuggestion;
use crate::services::milk_reception::{
    MilkReceptionService, MovementDirection, NewReception, OffloadAssessment, OffloadOutcome,
    TankLevel,
};
use crate::{entities::milk_reception, handlers::AppState, ApiResponse, PaginatedResponse};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// Trait for reception handler state that provides access to the ledger service
pub trait MilkReceptionHandlerState: Clone + Send + Sync + 'static {
    fn milk_reception_service(&self) -> &MilkReceptionService;
}

/// One ledger movement as the dashboard consumes it.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReceptionRecord {
    pub id: Uuid,
    pub tank_number: String,
    pub direction: MovementDirection,
    /// Unsigned liters; `direction` carries the sign.
    pub volume_liters: Decimal,
    pub batch_id: Option<String>,
    pub supplier_name: Option<String>,
    pub destination: Option<String>,
    pub temperature: Option<Decimal>,
    pub fat_percentage: Option<Decimal>,
    pub protein_percentage: Option<Decimal>,
    pub acidity: Option<Decimal>,
    pub total_plate_count: Option<i32>,
    pub quality_check: Option<String>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl From<milk_reception::Model> for ReceptionRecord {
    fn from(model: milk_reception::Model) -> Self {
        Self {
            id: model.id,
            tank_number: model.tank_number,
            direction: MovementDirection::of(model.milk_volume),
            volume_liters: model.milk_volume.abs(),
            batch_id: model.batch_id,
            supplier_name: model.supplier_name,
            destination: model.destination,
            temperature: model.temperature,
            fat_percentage: model.fat_percentage,
            protein_percentage: model.protein_percentage,
            acidity: model.acidity,
            total_plate_count: model.total_plate_count,
            quality_check: model.quality_check,
            notes: model.notes,
            recorded_at: model.created_at,
        }
    }
}

/// Outcome of an offload dry run, and the body of a rejected commit.
#[derive(Debug, Serialize, ToSchema)]
pub struct OffloadEvaluation {
    pub valid: bool,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_tank: Option<TankSuggestion>,
}

impl From<OffloadAssessment> for OffloadEvaluation {
    fn from(assessment: OffloadAssessment) -> Self {
        Self {
            valid: assessment.is_valid(),
            errors: assessment
                .failures
                .iter()
                .map(ToString::to_string)
                .collect(),
            suggested_tank: assessment.suggested_tank,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OffloadAccepted {
    pub record: ReceptionRecord,
    pub balance: TankLevel,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReceptionFilters {
    /// Restrict to one tank.
    pub tank: Option<String>,
    /// Restrict to deliveries or withdrawals.
    pub direction: Option<MovementDirection>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AlternativeQuery {
    /// Liters the caller needs to withdraw.
    pub required_volume: Decimal,
}

/// Create the milk reception router
pub fn milk_reception_routes<S>() -> Router<S>
where
    S: MilkReceptionHandlerState,
{
    Router::new()
        .route(
            "/",
            get(list_receptions::<S>).post(record_reception::<S>),
        )
        .route("/offloads", post(record_offload::<S>))
        .route("/offloads/validate", post(validate_offload::<S>))
        .route("/tanks", get(tank_balances::<S>))
        .route("/tanks/:tank/balance", get(tank_balance::<S>))
        .route("/tanks/:tank/alternative", get(suggest_alternative::<S>))
}

/// List movement history with optional filtering
#[utoipa::path(
    get,
    path = "/api/v1/milk-receptions",
    params(ReceptionFilters),
    responses(
        (status = 200, description = "Movement history returned",
            headers(
                ("X-Request-Id" = String, description = "Unique request id for tracing"),
            )
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "milk-receptions"
)]
pub async fn list_receptions<S>(
    State(state): State<S>,
    Query(filters): Query<ReceptionFilters>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: MilkReceptionHandlerState,
{
    let (records, total) = state
        .milk_reception_service()
        .list_receptions(
            filters.page,
            filters.limit,
            filters.tank.as_deref(),
            filters.direction,
        )
        .await?;

    let items: Vec<ReceptionRecord> = records.into_iter().map(ReceptionRecord::from).collect();
    let page = PaginatedResponse::new(items, total, filters.page, filters.limit);
    Ok(Json(ApiResponse::success(page)))
}

/// Record a milk delivery into a storage tank
#[utoipa::path(
    post,
    path = "/api/v1/milk-receptions",
    request_body = NewReception,
    responses(
        (status = 201, description = "Delivery recorded", body = ReceptionRecord),
        (status = 400, description = "Invalid delivery", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "milk-receptions"
)]
pub async fn record_reception<S>(
    State(state): State<S>,
    Json(payload): Json<NewReception>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: MilkReceptionHandlerState,
{
    let record = state
        .milk_reception_service()
        .record_reception(payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ReceptionRecord::from(record))),
    ))
}

/// Record an offload from a storage tank
///
/// Every problem with the form is reported at once; a rejected offload
/// carries the full list plus an alternative tank when one would fit.
#[utoipa::path(
    post,
    path = "/api/v1/milk-receptions/offloads",
    request_body = OffloadRequest,
    responses(
        (status = 201, description = "Offload recorded", body = OffloadAccepted),
        (status = 400, description = "Offload rejected", body = OffloadEvaluation),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "milk-receptions"
)]
pub async fn record_offload<S>(
    State(state): State<S>,
    Json(payload): Json<OffloadRequest>,
) -> Result<Response, ServiceError>
where
    S: MilkReceptionHandlerState,
{
    match state.milk_reception_service().record_offload(payload).await? {
        OffloadOutcome::Accepted { record, balance } => {
            let tank_number = record.tank_number.clone();
            let accepted = OffloadAccepted {
                record: ReceptionRecord::from(record),
                balance: TankLevel {
                    tank_number,
                    received: balance.received,
                    offloaded: balance.offloaded,
                    available: balance.available,
                },
            };
            Ok((StatusCode::CREATED, Json(ApiResponse::success(accepted))).into_response())
        }
        OffloadOutcome::Rejected(assessment) => {
            let evaluation = OffloadEvaluation::from(assessment);
            let mut body = ApiResponse::validation_errors(evaluation.errors.clone());
            body.data = Some(evaluation);
            Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
        }
    }
}

/// Validate an offload form without committing it
#[utoipa::path(
    post,
    path = "/api/v1/milk-receptions/offloads/validate",
    request_body = OffloadRequest,
    responses(
        (status = 200, description = "Evaluation returned", body = OffloadEvaluation),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "milk-receptions"
)]
pub async fn validate_offload<S>(
    State(state): State<S>,
    Json(payload): Json<OffloadRequest>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: MilkReceptionHandlerState,
{
    let assessment = state
        .milk_reception_service()
        .validate_offload(&payload)
        .await?;
    Ok(Json(ApiResponse::success(OffloadEvaluation::from(
        assessment,
    ))))
}

/// Current level of every configured tank
#[utoipa::path(
    get,
    path = "/api/v1/milk-receptions/tanks",
    responses(
        (status = 200, description = "Tank levels returned", body = [TankLevel]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "milk-receptions"
)]
pub async fn tank_balances<S>(State(state): State<S>) -> Result<impl IntoResponse, ServiceError>
where
    S: MilkReceptionHandlerState,
{
    let levels = state.milk_reception_service().tank_balances().await?;
    Ok(Json(ApiResponse::success(levels)))
}

/// Current level of one tank
#[utoipa::path(
    get,
    path = "/api/v1/milk-receptions/tanks/{tank}/balance",
    params(("tank" = String, Path, description = "Storage tank number")),
    responses(
        (status = 200, description = "Tank level returned", body = TankLevel),
        (status = 404, description = "Unknown tank", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "milk-receptions"
)]
pub async fn tank_balance<S>(
    State(state): State<S>,
    Path(tank): Path<String>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: MilkReceptionHandlerState,
{
    let level = state.milk_reception_service().tank_balance(&tank).await?;
    Ok(Json(ApiResponse::success(level)))
}

/// Suggest another tank for a withdrawal this tank cannot absorb
#[utoipa::path(
    get,
    path = "/api/v1/milk-receptions/tanks/{tank}/alternative",
    params(
        ("tank" = String, Path, description = "Storage tank number"),
        AlternativeQuery
    ),
    responses(
        (status = 200, description = "Alternative tank found", body = TankSuggestion),
        (status = 404, description = "No tank can absorb the volume", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "milk-receptions"
)]
pub async fn suggest_alternative<S>(
    State(state): State<S>,
    Path(tank): Path<String>,
    Query(query): Query<AlternativeQuery>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: MilkReceptionHandlerState,
{
    let suggestion = state
        .milk_reception_service()
        .suggest_alternative(&tank, query.required_volume)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "No tank can absorb {:.2} L",
                query.required_volume.abs()
            ))
        })?;

    Ok(Json(ApiResponse::success(suggestion)))
}

impl MilkReceptionHandlerState for AppState {
    fn milk_reception_service(&self) -> &MilkReceptionService {
        self.services.milk_reception.as_ref()
    }
}
