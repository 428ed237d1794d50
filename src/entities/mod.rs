pub mod employee;
pub mod milk_reception;
pub mod supplier;

pub use employee::Entity as Employee;
pub use milk_reception::Entity as MilkReception;
pub use supplier::Entity as Supplier;
