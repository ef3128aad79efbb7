use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    BeneficiarySnapshot, Customer, CustomerId, CustomerSummary, CustomerValidationError,
    NewCustomer, NewOrderRequest, Order, OrderId, OrderStatus, ServiceSnapshot, SubjectProfile,
    TransitionError, VariantSnapshot,
};
use super::query::{OrderFilter, Page, PageRequest};
use super::repository::{CustomerDirectory, OrderRepository, RepositoryError};
use crate::catalog::{AnswerError, CatalogError, Service, ServiceCatalog, ServiceVariant};
use crate::config::PricingConfig;
use crate::form::DebouncedSearch;
use crate::pricing::{
    compute_total, DeliveryType, FineCatalog, FineSelection, PhotographyLocation,
    PricingBreakdown, PricingError, PricingInput,
};
use crate::rules::EvaluationContext;

/// Shortest customer search term worth querying the directory for.
pub const MIN_SEARCH_CHARS: usize = 2;
pub const CUSTOMER_SEARCH_LIMIT: usize = 10;

/// Service composing the catalog, fine list, pricing aggregator and storage.
pub struct OrderService<R, C> {
    orders: Arc<R>,
    customers: Arc<C>,
    catalog: Arc<ServiceCatalog>,
    fines: Arc<FineCatalog>,
    pricing: PricingConfig,
    order_sequence: AtomicU64,
    customer_sequence: AtomicU64,
}

/// Outcome of a bulk status change; orders that could not move are reported, not fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkStatusOutcome {
    pub updated: Vec<OrderId>,
    pub skipped: Vec<SkippedOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedOrder {
    pub id: OrderId,
    pub reason: String,
}

/// Who the order is for, resolved before anything is persisted.
struct Applicant {
    existing: Option<Customer>,
    walk_in: Option<NewCustomer>,
    beneficiary: Option<BeneficiarySnapshot>,
    profile: SubjectProfile,
}

impl<R, C> OrderService<R, C>
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    pub fn new(
        orders: Arc<R>,
        customers: Arc<C>,
        catalog: Arc<ServiceCatalog>,
        fines: Arc<FineCatalog>,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            orders,
            customers,
            catalog,
            fines,
            pricing,
            order_sequence: AtomicU64::new(1),
            customer_sequence: AtomicU64::new(1),
        }
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn fines(&self) -> &FineCatalog {
        &self.fines
    }

    pub fn pricing_config(&self) -> &PricingConfig {
        &self.pricing
    }

    fn next_order_id(&self) -> OrderId {
        let id = self.order_sequence.fetch_add(1, Ordering::Relaxed);
        OrderId(format!("ORD-{id:06}"))
    }

    fn next_customer_id(&self) -> CustomerId {
        let id = self.customer_sequence.fetch_add(1, Ordering::Relaxed);
        CustomerId(format!("CUS-{id:06}"))
    }

    pub fn register_customer(&self, customer: NewCustomer) -> Result<Customer, OrderServiceError> {
        self.register_customer_at(customer, Utc::now())
    }

    fn register_customer_at(
        &self,
        customer: NewCustomer,
        now: DateTime<Utc>,
    ) -> Result<Customer, OrderServiceError> {
        customer.validate()?;
        let customer = customer.into_customer(self.next_customer_id(), now);
        let stored = self.customers.insert(customer)?;
        info!(customer_id = %stored.id, "customer registered");
        Ok(stored)
    }

    /// Directory matches for the counter search box; short terms return nothing.
    pub fn search_customers(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<CustomerSummary>, OrderServiceError> {
        let term = term.trim();
        if term.chars().count() < MIN_SEARCH_CHARS {
            return Ok(Vec::new());
        }
        let customers = self
            .customers
            .search(term, limit.clamp(1, CUSTOMER_SEARCH_LIMIT))?;
        Ok(customers.iter().map(Customer::summary).collect())
    }

    /// Search-as-you-type handle for the counter, debounced by the configured window.
    pub fn customer_search(&self) -> DebouncedSearch<C> {
        DebouncedSearch::new(Arc::clone(&self.customers), self.pricing.search_debounce())
    }

    pub fn customer(&self, id: &CustomerId) -> Result<Customer, OrderServiceError> {
        self.customers
            .fetch(id)?
            .ok_or_else(|| OrderServiceError::UnknownCustomer(id.clone()))
    }

    /// Price a request without persisting anything.
    pub fn quote(&self, request: &NewOrderRequest) -> Result<PricingBreakdown, OrderServiceError> {
        let service = self.catalog.get(&request.service_slug)?;
        let variant = resolve_variant(&service, &request.variant_id)?;
        Ok(self.price(request, variant.price_cents)?)
    }

    pub fn create(&self, request: NewOrderRequest) -> Result<Order, OrderServiceError> {
        self.create_at(request, Utc::now())
    }

    /// Validate, price and persist a new order as of `now`.
    pub fn create_at(
        &self,
        request: NewOrderRequest,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderServiceError> {
        let service = self.catalog.get(&request.service_slug)?;
        if !service.active {
            return Err(OrderServiceError::InactiveService(service.slug));
        }
        let variant = resolve_variant(&service, &request.variant_id)?.clone();

        let delivery_address = request
            .delivery_address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .map(str::to_string);
        if request.delivery_type == DeliveryType::Address && delivery_address.is_none() {
            return Err(OrderServiceError::MissingDeliveryAddress);
        }

        let applicant = self.resolve_applicant(&request)?;
        let context = EvaluationContext::for_subject(&applicant.profile, now.date_naive())
            .with_answers(&request.answers);
        service
            .validate_answers(&context, &request.answers)
            .map_err(OrderServiceError::InvalidAnswers)?;
        let answers = service.retain_visible_answers(&context, &request.answers);
        let required_documents = service.required_documents(&context);

        let pricing = self.price(&request, variant.price_cents)?;

        let customer = match (applicant.existing, applicant.walk_in) {
            (Some(customer), _) => customer,
            (None, Some(walk_in)) => self.register_customer_at(walk_in, now)?,
            (None, None) => return Err(OrderServiceError::MissingCustomer),
        };

        let order = Order {
            id: self.next_order_id(),
            customer_id: customer.id.clone(),
            customer_name: customer.full_name.clone(),
            customer_phone: customer.phone.clone(),
            national_id: customer.national_id.clone(),
            beneficiary: applicant.beneficiary,
            service: ServiceSnapshot {
                slug: service.slug.clone(),
                name: service.name.clone(),
                category: service.category.clone(),
            },
            variant: VariantSnapshot {
                id: variant.id,
                name: variant.name,
                price_cents: variant.price_cents,
            },
            quantity: request.quantity,
            delivery_type: request.delivery_type,
            delivery_address,
            photography_location: PhotographyLocation::parse(
                request.photography_location.as_deref(),
            ),
            answers,
            required_documents,
            pricing,
            status: OrderStatus::Pending,
            notes: request
                .notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            created_at: now,
            updated_at: now,
        };

        let stored = self.orders.insert(order)?;
        info!(
            order_id = %stored.id,
            customer_id = %stored.customer_id,
            service = %stored.service.slug,
            total_cents = stored.pricing.total_cents,
            "order created"
        );
        Ok(stored)
    }

    pub fn get(&self, id: &OrderId) -> Result<Order, OrderServiceError> {
        self.orders
            .fetch(id)?
            .ok_or_else(|| OrderServiceError::NotFound(id.clone()))
    }

    /// Every order matching `filter`, newest first.
    pub fn filtered(&self, filter: &OrderFilter) -> Result<Vec<Order>, OrderServiceError> {
        Ok(filter.apply(self.orders.all()?))
    }

    pub fn list(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Page<Order>, OrderServiceError> {
        Ok(page.slice(self.filtered(filter)?))
    }

    /// Move each order to `status`; invalid transitions and unknown ids are skipped.
    pub fn update_status(
        &self,
        ids: &[OrderId],
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<BulkStatusOutcome, OrderServiceError> {
        if ids.is_empty() {
            return Err(OrderServiceError::NoOrders);
        }

        let mut outcome = BulkStatusOutcome::default();
        for id in ids {
            let Some(mut order) = self.orders.fetch(id)? else {
                outcome.skipped.push(SkippedOrder {
                    id: id.clone(),
                    reason: RepositoryError::NotFound.to_string(),
                });
                continue;
            };

            if let Err(err) = order.status.check_transition(status, order.delivery_type) {
                warn!(order_id = %id, from = order.status.as_str(), to = status.as_str(), "status change skipped");
                outcome.skipped.push(SkippedOrder {
                    id: id.clone(),
                    reason: err.to_string(),
                });
                continue;
            }

            order.status = status;
            order.updated_at = now;
            self.orders.update(order)?;
            outcome.updated.push(id.clone());
        }

        info!(
            status = status.as_str(),
            updated = outcome.updated.len(),
            skipped = outcome.skipped.len(),
            "bulk status update"
        );
        Ok(outcome)
    }

    pub fn cancel(&self, id: &OrderId, now: DateTime<Utc>) -> Result<Order, OrderServiceError> {
        let mut order = self.get(id)?;
        order
            .status
            .check_transition(OrderStatus::Cancelled, order.delivery_type)?;
        order.status = OrderStatus::Cancelled;
        order.updated_at = now;
        self.orders.update(order.clone())?;
        info!(order_id = %id, "order cancelled");
        Ok(order)
    }

    /// Orders selected for printing, in the order they were selected.
    pub fn orders_for_print(&self, ids: &[OrderId]) -> Result<Vec<Order>, OrderServiceError> {
        if ids.is_empty() {
            return Err(OrderServiceError::NoOrders);
        }
        ids.iter().map(|id| self.get(id)).collect()
    }

    fn resolve_applicant(&self, request: &NewOrderRequest) -> Result<Applicant, OrderServiceError> {
        let (existing, walk_in) = match (&request.customer_id, &request.walk_in) {
            (Some(id), _) => (Some(self.customer(id)?), None),
            (None, Some(walk_in)) => {
                walk_in.validate()?;
                (None, Some(walk_in.clone()))
            }
            (None, None) => return Err(OrderServiceError::MissingCustomer),
        };

        let (own_profile, dependents) = match (&existing, &walk_in) {
            (Some(customer), _) => (customer.profile.clone(), customer.dependents.as_slice()),
            (None, Some(walk_in)) => (walk_in.profile.clone(), walk_in.dependents.as_slice()),
            (None, None) => return Err(OrderServiceError::MissingCustomer),
        };

        let (beneficiary, profile) = match request.dependent_id.as_deref() {
            Some(dependent_id) => {
                let dependent = dependents
                    .iter()
                    .find(|dependent| dependent.id == dependent_id)
                    .ok_or_else(|| OrderServiceError::UnknownDependent(dependent_id.to_string()))?;
                (
                    Some(BeneficiarySnapshot {
                        dependent_id: dependent.id.clone(),
                        full_name: dependent.full_name.clone(),
                        relation: dependent.relation.clone(),
                    }),
                    dependent.profile.clone(),
                )
            }
            None => (None, own_profile),
        };

        Ok(Applicant {
            existing,
            walk_in,
            beneficiary,
            profile,
        })
    }

    fn price(
        &self,
        request: &NewOrderRequest,
        variant_price_cents: i64,
    ) -> Result<PricingBreakdown, PricingError> {
        let input = PricingInput {
            variant_price_cents,
            quantity: request.quantity,
            photography_location: PhotographyLocation::parse(
                request.photography_location.as_deref(),
            ),
            delivery_type: request.delivery_type,
            delivery_fee_cents: self.pricing.delivery_fee_cents,
            selection: FineSelection::from_ids(request.selected_fines.iter().cloned(), &self.fines)?,
            overrides: request.fine_overrides.clone(),
            other_fees_cents: request.other_fees_cents,
            discount_cents: request.discount_cents,
        };
        compute_total(&input, &self.fines)
    }
}

fn resolve_variant<'a>(
    service: &'a Service,
    variant_id: &str,
) -> Result<&'a ServiceVariant, OrderServiceError> {
    service
        .variant(variant_id)
        .filter(|variant| variant.active)
        .ok_or_else(|| OrderServiceError::UnknownVariant {
            service: service.slug.clone(),
            variant: variant_id.to_string(),
        })
}

fn join_problems(errors: &[AnswerError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error raised by the order service.
#[derive(Debug, thiserror::Error)]
pub enum OrderServiceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    InvalidCustomer(#[from] CustomerValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("customer '{0}' not found")]
    UnknownCustomer(CustomerId),
    #[error("an order needs an existing customer or walk-in details")]
    MissingCustomer,
    #[error("dependent '{0}' does not belong to this customer")]
    UnknownDependent(String),
    #[error("variant '{variant}' is not offered for '{service}'")]
    UnknownVariant { service: String, variant: String },
    #[error("service '{0}' is not currently offered")]
    InactiveService(String),
    #[error("address delivery needs a delivery address")]
    MissingDeliveryAddress,
    #[error("invalid answers: {}", join_problems(.0))]
    InvalidAnswers(Vec<AnswerError>),
    #[error("order '{0}' not found")]
    NotFound(OrderId),
    #[error("no orders selected")]
    NoOrders,
}
