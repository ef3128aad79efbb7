use std::fmt::Write as _;

use super::{esc, html_shell, letterhead, ReportError, ReportOptions};
use crate::money::{format_cents, format_with_currency};
use crate::orders::domain::Order;

fn line(html: &mut String, label: &str, cents: i64) {
    let _ = write!(
        html,
        "<tr><td>{}</td><td>{}</td></tr>",
        esc(label),
        format_cents(cents)
    );
}

/// One customer's orders as an itemized receipt.
pub fn render_receipt(orders: &[Order], options: &ReportOptions) -> Result<String, ReportError> {
    let first = orders.first().ok_or(ReportError::NoOrders)?;
    if orders
        .iter()
        .any(|order| order.customer_id != first.customer_id)
    {
        return Err(ReportError::MixedCustomers);
    }

    let mut body = letterhead(options);
    let _ = write!(
        body,
        "<p>العميل: <strong>{}</strong>{}</p>",
        esc(&first.customer_name),
        first
            .national_id
            .as_deref()
            .map(|id| format!(" &middot; {}", esc(id)))
            .unwrap_or_default()
    );

    let mut grand_total = 0i64;
    for order in orders {
        let _ = write!(
            body,
            "<div class=\"group\"><h3>{} &middot; {} &middot; {}</h3><table><tbody>",
            esc(&order.id.0),
            esc(&order.service.name),
            esc(&order.variant.name)
        );
        if order.beneficiary.is_some() {
            let _ = write!(
                body,
                "<tr><td>المستفيد</td><td>{}</td></tr>",
                esc(order.beneficiary_name())
            );
        }

        let pricing = &order.pricing;
        line(
            &mut body,
            &format!(
                "{} × {}",
                format_cents(order.variant.price_cents),
                order.quantity
            ),
            pricing.base_cents,
        );
        if let Some(location) = order.photography_location {
            line(&mut body, location.label(), pricing.surcharge_cents);
        }
        if pricing.delivery_fee_cents > 0 {
            line(&mut body, order.delivery_type.label(), pricing.delivery_fee_cents);
        }
        for fine in &pricing.fine_lines {
            line(&mut body, &fine.name, fine.amount_cents);
        }
        if pricing.other_fees_cents > 0 {
            line(&mut body, "رسوم أخرى", pricing.other_fees_cents);
        }
        if pricing.discount_cents > 0 {
            line(&mut body, "خصم", -pricing.discount_cents);
        }
        let _ = write!(
            body,
            "</tbody><tfoot><tr><td>الإجمالي</td><td>{}</td></tr></tfoot></table>",
            format_cents(pricing.total_cents)
        );

        if !order.required_documents.is_empty() {
            body.push_str("<div class=\"muted\">المستندات المطلوبة: ");
            let documents: Vec<String> = order
                .required_documents
                .iter()
                .map(|name| esc(name))
                .collect();
            body.push_str(&documents.join("، "));
            body.push_str("</div>");
        }
        body.push_str("</div>");
        grand_total = grand_total.saturating_add(pricing.total_cents);
    }

    let _ = write!(
        body,
        "<div class=\"totals\">المطلوب سداده: {}</div>",
        esc(&format_with_currency(grand_total, &options.currency))
    );
    Ok(html_shell(&options.title, &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::domain::CustomerId;
    use crate::pricing::{FineCategory, FineLine};
    use crate::report::fixtures::{options, order};

    #[test]
    fn rejects_orders_from_different_customers() {
        let first = order("ORD-000001", "passport", "جواز سفر", "عادي");
        let mut second = order("ORD-000002", "passport", "جواز سفر", "عادي");
        second.customer_id = CustomerId("CUS-000009".to_string());

        assert_eq!(
            render_receipt(&[first, second], &options()),
            Err(ReportError::MixedCustomers)
        );
        assert_eq!(render_receipt(&[], &options()), Err(ReportError::NoOrders));
    }

    #[test]
    fn itemizes_fines_and_discount() {
        let mut passport = order("ORD-000003", "passport", "جواز سفر", "عادي");
        passport.pricing.fine_lines.push(FineLine {
            id: "fine_001".to_string(),
            name: "غرامة تأخير التجديد".to_string(),
            category: FineCategory::Fines,
            amount_cents: 10_000,
            overridden: false,
        });
        passport.pricing.discount_cents = 2_000;
        passport.pricing.total_cents = 18_000;
        passport.required_documents = vec!["صورة البطاقة".to_string()];

        let html = render_receipt(&[passport], &options()).expect("renders");
        assert!(html.contains("غرامة تأخير التجديد"));
        assert!(html.contains("-20.00"));
        assert!(html.contains("صورة البطاقة"));
        assert!(html.contains("المطلوب سداده: 180.00 EGP"));
    }
}
