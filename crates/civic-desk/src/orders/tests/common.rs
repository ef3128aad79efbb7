use std::collections::BTreeMap;
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::catalog::ServiceCatalog;
use crate::config::{OfficeConfig, PricingConfig};
use crate::orders::domain::{
    Customer, CustomerId, Dependent, Gender, MaritalStatus, NewCustomer, NewOrderRequest, Order,
    OrderId, SubjectProfile,
};
use crate::orders::memory::{InMemoryCustomerDirectory, InMemoryOrderRepository};
use crate::orders::repository::{CustomerDirectory, OrderRepository, RepositoryError};
use crate::orders::{order_router, OrderService};
use crate::pricing::{DeliveryType, FineCatalog};

pub(super) type MemoryService = OrderService<InMemoryOrderRepository, InMemoryCustomerDirectory>;

pub(super) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn pricing_config() -> PricingConfig {
    PricingConfig {
        delivery_fee_cents: 5_000,
        search_debounce_ms: 300,
    }
}

pub(super) fn office() -> OfficeConfig {
    OfficeConfig {
        name: "Civil Documents Office".to_string(),
        currency: "EGP".to_string(),
    }
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryOrderRepository>,
    Arc<InMemoryCustomerDirectory>,
) {
    let orders = Arc::new(InMemoryOrderRepository::default());
    let customers = Arc::new(InMemoryCustomerDirectory::default());
    let service = OrderService::new(
        orders.clone(),
        customers.clone(),
        Arc::new(ServiceCatalog::standard()),
        Arc::new(FineCatalog::standard()),
        pricing_config(),
    );
    (service, orders, customers)
}

pub(super) fn service_with<R, C>(orders: R, customers: C) -> OrderService<R, C>
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    OrderService::new(
        Arc::new(orders),
        Arc::new(customers),
        Arc::new(ServiceCatalog::standard()),
        Arc::new(FineCatalog::standard()),
        pricing_config(),
    )
}

pub(super) fn router_for(service: MemoryService) -> axum::Router {
    order_router(Arc::new(service), office())
}

pub(super) fn walk_in() -> NewCustomer {
    NewCustomer {
        full_name: "Karim Mostafa".to_string(),
        national_id: Some("29003151234567".to_string()),
        phone: Some("01001234567".to_string()),
        address: Some("12 Tahrir St, Cairo".to_string()),
        profile: SubjectProfile {
            gender: Some(Gender::Male),
            birth_date: NaiveDate::from_ymd_opt(1990, 3, 15),
            marital_status: Some(MaritalStatus::Married),
        },
        dependents: vec![Dependent {
            id: "child-1".to_string(),
            full_name: "Laila Karim".to_string(),
            relation: "daughter".to_string(),
            profile: SubjectProfile {
                gender: Some(Gender::Female),
                birth_date: NaiveDate::from_ymd_opt(2015, 6, 1),
                marital_status: Some(MaritalStatus::Single),
            },
        }],
    }
}

pub(super) fn passport_answers() -> BTreeMap<String, String> {
    [
        ("policeStation", "Nasr City"),
        ("pickupLocation", "abbasia"),
        ("employmentSector", "private"),
    ]
    .into_iter()
    .map(|(field, value)| (field.to_string(), value.to_string()))
    .collect()
}

pub(super) fn passport_request(customer_id: &CustomerId) -> NewOrderRequest {
    NewOrderRequest {
        customer_id: Some(customer_id.clone()),
        service_slug: "passport".to_string(),
        variant_id: "standard".to_string(),
        quantity: 1,
        delivery_type: DeliveryType::Office,
        answers: passport_answers(),
        ..NewOrderRequest::default()
    }
}

pub(super) fn birth_request(customer_id: &CustomerId, day: &str) -> NewOrderRequest {
    NewOrderRequest {
        customer_id: Some(customer_id.clone()),
        dependent_id: Some("child-1".to_string()),
        service_slug: "birth-certificate".to_string(),
        variant_id: "copy".to_string(),
        quantity: 2,
        answers: [("birthDate", day), ("motherName", "Sara Adel")]
            .into_iter()
            .map(|(field, value)| (field.to_string(), value.to_string()))
            .collect(),
        ..NewOrderRequest::default()
    }
}

pub(super) fn registered(service: &MemoryService) -> Customer {
    service
        .register_customer(walk_in())
        .expect("customer registers")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

pub(super) struct UnavailableRepository;

impl OrderRepository for UnavailableRepository {
    fn insert(&self, _order: Order) -> Result<Order, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _order: Order) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<Order>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct ConflictRepository;

impl OrderRepository for ConflictRepository {
    fn insert(&self, _order: Order) -> Result<Order, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _order: Order) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, _id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(None)
    }

    fn all(&self) -> Result<Vec<Order>, RepositoryError> {
        Ok(Vec::new())
    }
}
