// Core reception ledger service
pub mod milk_reception;

// Directory services that work directly with entities
pub mod employees;
pub mod suppliers;

pub use employees::EmployeeService;
pub use milk_reception::MilkReceptionService;
pub use suppliers::SupplierService;
