use crate::errors::ServiceError;
use crate::services::employees::{EmployeeService, NewEmployee};
use crate::{
    handlers::suppliers::DirectoryQuery, handlers::AppState, ApiResponse, PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use uuid::Uuid;

// Trait for employee handler state that provides access to the registry service
pub trait EmployeeHandlerState: Clone + Send + Sync + 'static {
    fn employee_service(&self) -> &EmployeeService;
}

/// Create the personnel registry router
pub fn employee_routes<S>() -> Router<S>
where
    S: EmployeeHandlerState,
{
    Router::new()
        .route("/", get(list_employees::<S>).post(create_employee::<S>))
        .route("/:id", get(get_employee::<S>))
}

/// Register an employee
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee registered"),
        (status = 400, description = "Invalid employee", body = crate::errors::ErrorResponse)
    ),
    tag = "employees"
)]
pub async fn create_employee<S>(
    State(state): State<S>,
    Json(payload): Json<NewEmployee>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: EmployeeHandlerState,
{
    let employee = state.employee_service().create_employee(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(employee))))
}

/// Fetch one employee
#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee returned"),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse)
    ),
    tag = "employees"
)]
pub async fn get_employee<S>(
    State(state): State<S>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: EmployeeHandlerState,
{
    let employee = state.employee_service().get_employee(id).await?;
    Ok(Json(ApiResponse::success(employee)))
}

/// List the personnel registry
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(DirectoryQuery),
    responses(
        (status = 200, description = "Employees returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "employees"
)]
pub async fn list_employees<S>(
    State(state): State<S>,
    Query(query): Query<DirectoryQuery>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: EmployeeHandlerState,
{
    let (employees, total) = state
        .employee_service()
        .list_employees(query.page, query.limit, query.active_only)
        .await?;

    let page = PaginatedResponse::new(employees, total, query.page, query.limit);
    Ok(Json(ApiResponse::success(page)))
}

impl EmployeeHandlerState for AppState {
    fn employee_service(&self) -> &EmployeeService {
        self.services.employees.as_ref()
    }
}
