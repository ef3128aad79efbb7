//! Service catalog: variants, required documents and questionnaire fields.

pub mod domain;
pub mod router;
pub mod standard;
mod store;

pub use domain::{
    AnswerError, FieldKind, Service, ServiceCategory, ServiceDefinitionError, ServiceDocument,
    ServiceField, ServiceFieldOption, ServiceVariant,
};
pub use router::catalog_router;
pub use store::{CatalogError, ServiceCatalog};
