use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FarmGate API",
        version = "1.0.0",
        description = r#"
# FarmGate Dairy Reception API

Backend for the farm dashboard's milk reception module: an append-only
ledger of tank movements, derived tank balances, offload validation and
the supplier and personnel directories.

## Movements

Every delivery and offload is one immutable ledger row. Deliveries carry
a positive volume, offloads a negative one; balances are recomputed from
the full history on every read and never stored.

## Offload validation

Submitting an offload reports every problem with the form at once:
missing fields, malformed numbers and insufficient tank volume. A
rejected offload also names an alternative tank when one could absorb
the requested volume.

## Pagination

List endpoints support pagination with the following query parameters:
- `page`: Page number (default: 1)
- `limit`: Items per page (default: 20)
        "#,
        contact(
            name = "FarmGate Support",
            email = "support@farmgate.example"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080/api/v1", description = "Local development")
    ),
    tags(
        (name = "milk-receptions", description = "Reception ledger and tank balances"),
        (name = "suppliers", description = "Milk supplier directory"),
        (name = "employees", description = "Personnel registry")
    ),
    paths(
        // Reception ledger
        crate::handlers::milk_reception::list_receptions,
        crate::handlers::milk_reception::record_reception,
        crate::handlers::milk_reception::record_offload,
        crate::handlers::milk_reception::validate_offload,
        crate::handlers::milk_reception::tank_balances,
        crate::handlers::milk_reception::tank_balance,
        crate::handlers::milk_reception::suggest_alternative,

        // Directories
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::employees::list_employees,
        crate::handlers::employees::create_employee,
        crate::handlers::employees::get_employee,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,

            // Reception ledger types
            crate::handlers::milk_reception::ReceptionRecord,
            crate::handlers::milk_reception::OffloadEvaluation,
            crate::handlers::milk_reception::OffloadAccepted,
            crate::ledger::validation::OffloadRequest,
            crate::ledger::TankBalance,
            crate::ledger::TankSuggestion,
            crate::services::milk_reception::NewReception,
            crate::services::milk_reception::MovementDirection,
            crate::services::milk_reception::TankLevel,

            // Directory types
            crate::services::suppliers::NewSupplier,
            crate::services::employees::NewEmployee,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_ledger_paths() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).expect("document should serialize");
        assert!(json.contains("FarmGate API"));
        assert!(json.contains("/api/v1/milk-receptions"));
        assert!(json.contains("/api/v1/milk-receptions/offloads/validate"));
        assert!(json.contains("/api/v1/suppliers"));
    }
}
