use chrono::NaiveDate;
use civic_desk::catalog::ServiceCatalog;
use civic_desk::config::PricingConfig;
use civic_desk::money::parse_cents;
use civic_desk::orders::{InMemoryCustomerDirectory, InMemoryOrderRepository, OrderService};
use civic_desk::pricing::{FineCatalog, PhotographyLocation};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type DeskOrderService =
    OrderService<InMemoryOrderRepository, InMemoryCustomerDirectory>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) fines: Arc<FineCatalog>,
    pub(crate) pricing: PricingConfig,
}

/// Catalog, fines and order service wired over the in-memory stores.
pub(crate) struct Backoffice {
    pub(crate) catalog: Arc<ServiceCatalog>,
    pub(crate) fines: Arc<FineCatalog>,
    pub(crate) orders: Arc<DeskOrderService>,
}

impl Backoffice {
    pub(crate) fn in_memory(pricing: &PricingConfig) -> Self {
        let catalog = Arc::new(ServiceCatalog::standard());
        let fines = Arc::new(FineCatalog::standard());
        let orders = Arc::new(OrderService::new(
            Arc::new(InMemoryOrderRepository::default()),
            Arc::new(InMemoryCustomerDirectory::default()),
            Arc::clone(&catalog),
            Arc::clone(&fines),
            pricing.clone(),
        ));
        Self {
            catalog,
            fines,
            orders,
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// `"125.50"` style amounts into minor units.
pub(crate) fn parse_amount(raw: &str) -> Result<i64, String> {
    parse_cents(raw).ok_or_else(|| format!("'{raw}' is not an amount like 125 or 125.50"))
}

pub(crate) fn parse_photography(raw: &str) -> Result<PhotographyLocation, String> {
    PhotographyLocation::parse(Some(raw))
        .ok_or_else(|| format!("unknown photography location '{raw}' (in_office, home, hospital)"))
}
