use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::classify::ReportCategory;
use super::{esc, html_shell, letterhead, ReportError, ReportOptions};
use crate::money::{format_cents, format_with_currency};
use crate::orders::domain::Order;

struct Group<'a> {
    category: ReportCategory,
    variant: &'a str,
    orders: Vec<&'a Order>,
}

/// Bucket by category (priority order) then variant name; orders keep their input order.
fn group_orders(orders: &[Order]) -> Vec<Group<'_>> {
    let mut buckets: BTreeMap<(ReportCategory, &str), Vec<&Order>> = BTreeMap::new();
    for order in orders {
        buckets
            .entry((ReportCategory::for_order(order), order.variant.name.as_str()))
            .or_default()
            .push(order);
    }
    buckets
        .into_iter()
        .map(|((category, variant), orders)| Group {
            category,
            variant,
            orders,
        })
        .collect()
}

/// Render the grouped order report as a standalone HTML document.
pub fn render_orders_report(
    orders: &[Order],
    options: &ReportOptions,
) -> Result<String, ReportError> {
    if orders.is_empty() {
        return Err(ReportError::NoOrders);
    }

    let mut body = letterhead(options);
    let mut current_category = None;
    let mut grand_count = 0usize;
    let mut grand_fines = 0i64;
    let mut grand_total = 0i64;

    for group in group_orders(orders) {
        if current_category != Some(group.category) {
            if current_category.is_some() {
                body.push_str("</section>");
            }
            let _ = write!(
                body,
                "<section class=\"category\"><h2>{}</h2>",
                esc(group.category.title())
            );
            current_category = Some(group.category);
        }
        body.push_str(&render_group(&group, options));

        grand_count += group.orders.len();
        for order in &group.orders {
            grand_fines = grand_fines.saturating_add(order.pricing.fines_cents);
            grand_total = grand_total.saturating_add(order.pricing.total_cents);
        }
    }
    body.push_str("</section>");

    let _ = write!(
        body,
        "<div class=\"totals\"><div>عدد الطلبات: {grand_count}</div><div>إجمالي الغرامات: {}</div><div>الإجمالي: {}</div></div>",
        esc(&format_with_currency(grand_fines, &options.currency)),
        esc(&format_with_currency(grand_total, &options.currency)),
    );

    Ok(html_shell(&options.title, &body))
}

fn render_group(group: &Group<'_>, options: &ReportOptions) -> String {
    let extra = group.category.answer_columns();
    let mut html = String::new();
    let _ = write!(
        html,
        "<div class=\"group\"><h3>{} ({})</h3><table><thead><tr>",
        esc(group.variant),
        group.orders.len()
    );
    html.push_str("<th>#</th><th>رقم الطلب</th><th>الاسم</th><th>الرقم القومي</th>");
    for column in extra {
        let _ = write!(html, "<th>{}</th>", esc(column.header));
    }
    html.push_str("<th>العدد</th><th>الغرامات</th><th>الإجمالي</th></tr></thead><tbody>");

    let mut fines = 0i64;
    let mut total = 0i64;
    for (index, order) in group.orders.iter().enumerate() {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
            index + 1,
            esc(&order.id.0),
            esc(order.beneficiary_name()),
            esc(order.national_id.as_deref().unwrap_or("-")),
        );
        for column in extra {
            let _ = write!(
                html,
                "<td>{}</td>",
                esc(order.answer(column.field).unwrap_or("-"))
            );
        }
        let _ = write!(
            html,
            "<td>{}</td><td>{}</td><td>{}</td></tr>",
            order.quantity,
            format_cents(order.pricing.fines_cents),
            format_cents(order.pricing.total_cents),
        );
        fines = fines.saturating_add(order.pricing.fines_cents);
        total = total.saturating_add(order.pricing.total_cents);
    }

    let _ = write!(
        html,
        "</tbody><tfoot><tr><td colspan=\"{}\">الإجمالي الفرعي ({})</td><td>{}</td><td>{}</td></tr></tfoot></table></div>",
        5 + extra.len(),
        esc(&options.currency),
        format_cents(fines),
        format_cents(total),
    );
    html
}
