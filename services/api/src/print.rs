use crate::infra::{parse_amount, parse_date, parse_photography};
use chrono::{Local, NaiveDate};
use civic_desk::config::AppConfig;
use civic_desk::error::AppError;
use civic_desk::money::format_with_currency;
use civic_desk::orders::Order;
use civic_desk::pricing::{
    compute_total, DeliveryType, FineCatalog, FineSelection, PhotographyLocation,
    PricingBreakdown, PricingInput,
};
use civic_desk::report::{render_orders_report, render_receipt, ReportOptions};
use clap::{Args, ValueEnum};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum PrintLayout {
    /// Orders grouped by service category and variant
    Report,
    /// Itemized receipt for one customer's orders
    Receipt,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// JSON file holding an array of orders as returned by the orders API
    #[arg(long)]
    pub(crate) orders: PathBuf,
    #[arg(long, value_enum, default_value = "report")]
    pub(crate) layout: PrintLayout,
    /// Heading printed above the tables
    #[arg(long)]
    pub(crate) title: Option<String>,
    /// Date printed on the document (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Write the HTML here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Variant price in major units, e.g. 125.50
    #[arg(long, value_parser = parse_amount)]
    pub(crate) price: i64,
    #[arg(long, default_value_t = 1)]
    pub(crate) quantity: u32,
    /// in_office, home or hospital
    #[arg(long, value_parser = parse_photography)]
    pub(crate) photography: Option<PhotographyLocation>,
    /// Deliver to the customer's address (adds the configured delivery fee)
    #[arg(long)]
    pub(crate) deliver: bool,
    /// Fine or add-on id; repeat for several
    #[arg(long = "fine")]
    pub(crate) fines: Vec<String>,
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    pub(crate) other_fees: i64,
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    pub(crate) discount: i64,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let raw = fs::read_to_string(&args.orders)?;
    let orders: Vec<Order> = serde_json::from_str(&raw)?;

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let options = ReportOptions::new(&config.office, args.title.as_deref(), today);
    let html = match args.layout {
        PrintLayout::Report => render_orders_report(&orders, &options)?,
        PrintLayout::Receipt => render_receipt(&orders, &options)?,
    };

    match args.output {
        Some(path) => {
            fs::write(&path, html)?;
            println!("Wrote {} order(s) to {}", orders.len(), path.display());
        }
        None => println!("{html}"),
    }
    Ok(())
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let fines = FineCatalog::standard();
    let breakdown = price(&args, config.pricing.delivery_fee_cents, &fines)?;

    for line in quote_lines(&breakdown, &config.office.currency) {
        println!("{line}");
    }
    Ok(())
}

fn price(
    args: &QuoteArgs,
    delivery_fee_cents: i64,
    fines: &FineCatalog,
) -> Result<PricingBreakdown, AppError> {
    let input = PricingInput {
        photography_location: args.photography,
        delivery_type: if args.deliver {
            DeliveryType::Address
        } else {
            DeliveryType::Office
        },
        delivery_fee_cents,
        selection: FineSelection::from_ids(args.fines.iter().cloned(), fines)?,
        other_fees_cents: args.other_fees,
        discount_cents: args.discount,
        ..PricingInput::new(args.price, args.quantity)
    };
    Ok(compute_total(&input, fines)?)
}

fn quote_lines(breakdown: &PricingBreakdown, currency: &str) -> Vec<String> {
    let money = |cents: i64| format_with_currency(cents, currency);
    let mut lines = vec![format!("Base: {}", money(breakdown.base_cents))];
    if breakdown.surcharge_cents > 0 {
        lines.push(format!("Photography: {}", money(breakdown.surcharge_cents)));
    }
    if breakdown.delivery_fee_cents > 0 {
        lines.push(format!("Delivery: {}", money(breakdown.delivery_fee_cents)));
    }
    for fine in &breakdown.fine_lines {
        lines.push(format!("{} ({}): {}", fine.name, fine.id, money(fine.amount_cents)));
    }
    if breakdown.other_fees_cents > 0 {
        lines.push(format!("Other fees: {}", money(breakdown.other_fees_cents)));
    }
    if breakdown.discount_cents > 0 {
        lines.push(format!("Discount: -{}", money(breakdown.discount_cents)));
    }
    lines.push(format!("Total: {}", money(breakdown.total_cents)));
    lines
}
