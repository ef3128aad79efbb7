//! Customers, order intake, list management and status transitions.

pub mod domain;
pub mod export;
pub mod memory;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    BeneficiarySnapshot, Customer, CustomerId, CustomerSummary, CustomerValidationError,
    Dependent, Gender, MaritalStatus, NewCustomer, NewOrderRequest, Order, OrderId, OrderStatus,
    OrderSummary, ServiceSnapshot, SubjectProfile, TransitionError, VariantSnapshot,
};
pub use export::{orders_csv, write_orders_csv, ExportError};
pub use memory::{InMemoryCustomerDirectory, InMemoryOrderRepository};
pub use query::{OrderFilter, Page, PageRequest};
pub use repository::{CustomerDirectory, OrderRepository, RepositoryError};
pub use router::{order_router, OrdersState};
pub use service::{BulkStatusOutcome, OrderService, OrderServiceError, SkippedOrder};
