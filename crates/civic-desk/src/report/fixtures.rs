use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};

use super::ReportOptions;
use crate::orders::domain::{
    CustomerId, Order, OrderId, OrderStatus, ServiceSnapshot, VariantSnapshot,
};
use crate::pricing::{DeliveryType, PricingBreakdown};

pub(crate) fn options() -> ReportOptions {
    ReportOptions {
        title: "تقرير اليوم".to_string(),
        office_name: "Civil Documents Office".to_string(),
        currency: "EGP".to_string(),
        generated_on: NaiveDate::from_ymd_opt(2025, 10, 1).expect("valid date"),
    }
}

pub(crate) fn order(id: &str, slug: &str, service_name: &str, variant_name: &str) -> Order {
    let created_at = Utc
        .with_ymd_and_hms(2025, 10, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp");
    Order {
        id: OrderId(id.to_string()),
        customer_id: CustomerId("CUS-000001".to_string()),
        customer_name: "Hassan Ali".to_string(),
        customer_phone: Some("01001234567".to_string()),
        national_id: Some("28501011234567".to_string()),
        beneficiary: None,
        service: ServiceSnapshot {
            slug: slug.to_string(),
            name: service_name.to_string(),
            category: "identity".to_string(),
        },
        variant: VariantSnapshot {
            id: "standard".to_string(),
            name: variant_name.to_string(),
            price_cents: 10_000,
        },
        quantity: 1,
        delivery_type: DeliveryType::Office,
        delivery_address: None,
        photography_location: None,
        answers: BTreeMap::new(),
        required_documents: Vec::new(),
        pricing: PricingBreakdown {
            base_cents: 10_000,
            subtotal_cents: 10_000,
            total_cents: 10_000,
            ..PricingBreakdown::default()
        },
        status: OrderStatus::Pending,
        notes: None,
        created_at,
        updated_at: created_at,
    }
}
