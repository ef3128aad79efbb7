//! Printable HTML documents: grouped order reports and customer receipts.

mod classify;
#[cfg(test)]
mod fixtures;
mod receipt;
mod render;

use chrono::NaiveDate;

use crate::config::OfficeConfig;

pub use classify::{AnswerColumn, ReportCategory};
pub use receipt::render_receipt;
pub use render::render_orders_report;

pub const DEFAULT_REPORT_TITLE: &str = "تقرير الطلبات";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("no orders selected for printing")]
    NoOrders,
    #[error("a receipt can only cover one customer's orders")]
    MixedCustomers,
}

/// Letterhead and dating applied to every printed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub title: String,
    pub office_name: String,
    pub currency: String,
    pub generated_on: NaiveDate,
}

impl ReportOptions {
    pub fn new(office: &OfficeConfig, title: Option<&str>, generated_on: NaiveDate) -> Self {
        let title = title
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(DEFAULT_REPORT_TITLE);
        Self {
            title: title.to_string(),
            office_name: office.name.clone(),
            currency: office.currency.clone(),
            generated_on,
        }
    }
}

pub(crate) fn esc(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub(crate) fn html_shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ar" dir="rtl">
<head>
<meta charset="UTF-8"/>
<title>{}</title>
<style>
body {{ font-family: "Noto Naskh Arabic", Tahoma, sans-serif; margin: 16px; color: #111; }}
header {{ display: flex; justify-content: space-between; border-bottom: 2px solid #111; margin-bottom: 12px; }}
h2 {{ font-size: 16px; margin: 18px 0 6px; }}
h3 {{ font-size: 13px; margin: 10px 0 4px; color: #444; }}
table {{ width: 100%; border-collapse: collapse; font-size: 12px; margin-bottom: 6px; }}
th, td {{ border: 1px solid #999; padding: 4px 6px; text-align: right; }}
th {{ background: #eee; }}
tfoot td {{ font-weight: bold; }}
.totals {{ margin-top: 16px; border-top: 2px solid #111; padding-top: 8px; font-weight: bold; }}
.muted {{ color: #666; font-size: 11px; }}
@media print {{ body {{ margin: 0; }} .group {{ page-break-inside: avoid; }} }}
</style>
</head>
<body>{}</body>
</html>"#,
        esc(title),
        body
    )
}

pub(crate) fn letterhead(options: &ReportOptions) -> String {
    format!(
        "<header><div><strong>{}</strong><div>{}</div></div><div class=\"muted\">{}</div></header>",
        esc(&options.office_name),
        esc(&options.title),
        options.generated_on.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            esc(r#"<b>"Ali" & 'Omar'</b>"#),
            "&lt;b&gt;&quot;Ali&quot; &amp; &#39;Omar&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn blank_titles_fall_back_to_the_default() {
        let office = OfficeConfig {
            name: "Office".to_string(),
            currency: "EGP".to_string(),
        };
        let today = NaiveDate::from_ymd_opt(2025, 10, 1).expect("valid");
        assert_eq!(
            ReportOptions::new(&office, Some("  "), today).title,
            DEFAULT_REPORT_TITLE
        );
    }
}
