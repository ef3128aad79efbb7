//! Order pricing: variant price, photography surcharge, delivery, fines/add-ons and discount.

mod fines;
mod total;

pub use fines::{
    FineCatalog, FineCatalogEntry, FineCategory, FineSelection, EXPENSES_EXEMPT_FINE_ID,
    EXPENSES_ID,
};
pub use total::{
    compute_total, fine_lines_lenient, DeliveryType, FineLine, PhotographyLocation,
    PricingBreakdown, PricingInput,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(u32),
    #[error("unknown fine or add-on '{0}'")]
    UnknownFine(String),
    #[error("override for '{id}' cannot be negative ({amount})")]
    NegativeOverride { id: String, amount: i64 },
    #[error("{0} cannot be negative")]
    NegativeAmount(&'static str),
}
