use crate::errors::ServiceError;
use crate::services::suppliers::{NewSupplier, SupplierService};
use crate::{handlers::AppState, ApiResponse, PaginatedResponse};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

// Trait for supplier handler state that provides access to the directory service
pub trait SupplierHandlerState: Clone + Send + Sync + 'static {
    fn supplier_service(&self) -> &SupplierService;
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DirectoryQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// When true, only active entries are returned.
    #[serde(default)]
    pub active_only: bool,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

/// Create the supplier directory router
pub fn supplier_routes<S>() -> Router<S>
where
    S: SupplierHandlerState,
{
    Router::new()
        .route("/", get(list_suppliers::<S>).post(create_supplier::<S>))
        .route("/:id", get(get_supplier::<S>))
}

/// Register a milk supplier
#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = NewSupplier,
    responses(
        (status = 201, description = "Supplier registered"),
        (status = 400, description = "Invalid supplier", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn create_supplier<S>(
    State(state): State<S>,
    Json(payload): Json<NewSupplier>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: SupplierHandlerState,
{
    let supplier = state.supplier_service().create_supplier(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(supplier))))
}

/// Fetch one supplier
#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier returned"),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn get_supplier<S>(
    State(state): State<S>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: SupplierHandlerState,
{
    let supplier = state.supplier_service().get_supplier(id).await?;
    Ok(Json(ApiResponse::success(supplier)))
}

/// List the supplier directory
#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    params(DirectoryQuery),
    responses(
        (status = 200, description = "Suppliers returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn list_suppliers<S>(
    State(state): State<S>,
    Query(query): Query<DirectoryQuery>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: SupplierHandlerState,
{
    let (suppliers, total) = state
        .supplier_service()
        .list_suppliers(query.page, query.limit, query.active_only)
        .await?;

    let page = PaginatedResponse::new(suppliers, total, query.page, query.limit);
    Ok(Json(ApiResponse::success(page)))
}

impl SupplierHandlerState for AppState {
    fn supplier_service(&self) -> &SupplierService {
        self.services.suppliers.as_ref()
    }
}
