use std::io::Write;

use serde::Serialize;

use super::domain::Order;
use crate::money::format_cents;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv export failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct OrderRow<'a> {
    order_id: &'a str,
    created_at: String,
    status: &'static str,
    customer: &'a str,
    beneficiary: &'a str,
    national_id: &'a str,
    phone: &'a str,
    service: &'a str,
    variant: &'a str,
    quantity: u32,
    delivery: &'static str,
    fines: String,
    discount: String,
    total: String,
}

impl<'a> OrderRow<'a> {
    fn from_order(order: &'a Order) -> Self {
        Self {
            order_id: &order.id.0,
            created_at: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
            status: order.status.label(),
            customer: &order.customer_name,
            beneficiary: order.beneficiary_name(),
            national_id: order.national_id.as_deref().unwrap_or_default(),
            phone: order.customer_phone.as_deref().unwrap_or_default(),
            service: &order.service.name,
            variant: &order.variant.name,
            quantity: order.quantity,
            delivery: order.delivery_type.label(),
            fines: format_cents(order.pricing.fines_cents),
            discount: format_cents(order.pricing.discount_cents),
            total: format_cents(order.pricing.total_cents),
        }
    }
}

/// Write `orders` as a header-first CSV table, amounts in major units.
pub fn write_orders_csv<W: Write>(orders: &[Order], writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);
    for order in orders {
        csv_writer.serialize(OrderRow::from_order(order))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn orders_csv(orders: &[Order]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_orders_csv(orders, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
