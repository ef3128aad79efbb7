use super::domain::{Customer, CustomerId, Order, OrderId};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait OrderRepository: Send + Sync {
    fn insert(&self, order: Order) -> Result<Order, RepositoryError>;
    fn update(&self, order: Order) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;
    /// Every stored order, in no particular order.
    fn all(&self) -> Result<Vec<Order>, RepositoryError>;
}

/// Customer lookup used by the counter's search-as-you-type box.
pub trait CustomerDirectory: Send + Sync {
    fn insert(&self, customer: Customer) -> Result<Customer, RepositoryError>;
    fn fetch(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;
    fn search(&self, term: &str, limit: usize) -> Result<Vec<Customer>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
