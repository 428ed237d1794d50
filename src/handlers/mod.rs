pub mod employees;
pub mod milk_reception;
pub mod suppliers;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub milk_reception: Arc<crate::services::MilkReceptionService>,
    pub suppliers: Arc<crate::services::SupplierService>,
    pub employees: Arc<crate::services::EmployeeService>,
}

impl AppServices {
    /// Build the service container from shared infrastructure.
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, known_tanks: Vec<String>) -> Self {
        let milk_reception = Arc::new(crate::services::MilkReceptionService::new(
            db_pool.clone(),
            event_sender.clone(),
            known_tanks,
        ));
        let suppliers = Arc::new(crate::services::SupplierService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let employees = Arc::new(crate::services::EmployeeService::new(db_pool, event_sender));

        Self {
            milk_reception,
            suppliers,
            employees,
        }
    }
}
