use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::fines::{FineCatalog, FineCategory, FineSelection, EXPENSES_ID};
use super::PricingError;

/// Where the applicant's photo is taken; off-site visits carry a flat surcharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhotographyLocation {
    InOffice,
    Home,
    Hospital,
}

impl PhotographyLocation {
    pub const fn surcharge_cents(self) -> i64 {
        match self {
            Self::InOffice => 2_500,
            Self::Home => 15_000,
            Self::Hospital => 20_000,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InOffice => "IN_OFFICE",
            Self::Home => "HOME",
            Self::Hospital => "HOSPITAL",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::InOffice => "تصوير بالمكتب",
            Self::Home => "تصوير منزلي",
            Self::Hospital => "تصوير بالمستشفى",
        }
    }

    /// Unknown or blank values mean "no photography surcharge".
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim)?.to_ascii_uppercase().as_str() {
            "IN_OFFICE" => Some(Self::InOffice),
            "HOME" => Some(Self::Home),
            "HOSPITAL" => Some(Self::Hospital),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    #[default]
    Office,
    Address,
}

impl DeliveryType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Office => "استلام من المكتب",
            Self::Address => "توصيل للعنوان",
        }
    }
}

/// Everything the aggregator needs to price one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingInput {
    pub variant_price_cents: i64,
    pub quantity: u32,
    pub photography_location: Option<PhotographyLocation>,
    pub delivery_type: DeliveryType,
    pub delivery_fee_cents: i64,
    pub selection: FineSelection,
    pub overrides: BTreeMap<String, i64>,
    pub other_fees_cents: i64,
    pub discount_cents: i64,
}

impl PricingInput {
    pub fn new(variant_price_cents: i64, quantity: u32) -> Self {
        Self {
            variant_price_cents,
            quantity,
            photography_location: None,
            delivery_type: DeliveryType::Office,
            delivery_fee_cents: 0,
            selection: FineSelection::default(),
            overrides: BTreeMap::new(),
            other_fees_cents: 0,
            discount_cents: 0,
        }
    }
}

/// Resolved fine/add-on line as printed on receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineLine {
    pub id: String,
    pub name: String,
    pub category: FineCategory,
    pub amount_cents: i64,
    #[serde(default)]
    pub overridden: bool,
}

/// Itemized price of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub base_cents: i64,
    pub surcharge_cents: i64,
    pub delivery_fee_cents: i64,
    #[serde(default, deserialize_with = "fine_lines_lenient")]
    pub fine_lines: Vec<FineLine>,
    pub fines_cents: i64,
    pub other_fees_cents: i64,
    pub discount_cents: i64,
    pub subtotal_cents: i64,
    pub total_cents: i64,
}

impl PricingBreakdown {
    /// Amount attributable to penalty lines only (excludes add-on services).
    pub fn penalties_cents(&self) -> i64 {
        self.fine_lines
            .iter()
            .filter(|line| line.category == FineCategory::Fines)
            .map(|line| line.amount_cents)
            .sum()
    }
}

/// `variant*qty + surcharge + delivery + fines/add-ons + other fees - discount`, never below zero.
///
/// A negative discount is treated as no discount. The expenses line only counts while a real
/// fine is selected, whatever the selection says.
pub fn compute_total(
    input: &PricingInput,
    catalog: &FineCatalog,
) -> Result<PricingBreakdown, PricingError> {
    if input.quantity < 1 {
        return Err(PricingError::InvalidQuantity(input.quantity));
    }
    if input.other_fees_cents < 0 {
        return Err(PricingError::NegativeAmount("other fees"));
    }
    if input.delivery_fee_cents < 0 {
        return Err(PricingError::NegativeAmount("delivery fee"));
    }

    let base_cents = input
        .variant_price_cents
        .saturating_mul(i64::from(input.quantity));
    let surcharge_cents = input
        .photography_location
        .map_or(0, PhotographyLocation::surcharge_cents);
    let delivery_fee_cents = match input.delivery_type {
        DeliveryType::Office => 0,
        DeliveryType::Address => input.delivery_fee_cents,
    };

    let real_fine_selected = input.selection.has_real_fine(catalog);
    let mut fine_lines = Vec::with_capacity(input.selection.len());
    for id in input.selection.iter() {
        let entry = catalog
            .entry(id)
            .ok_or_else(|| PricingError::UnknownFine(id.to_string()))?;
        if id == EXPENSES_ID && !real_fine_selected {
            continue;
        }

        let (amount_cents, overridden) = match input.overrides.get(id) {
            Some(amount) if *amount < 0 => {
                return Err(PricingError::NegativeOverride {
                    id: id.to_string(),
                    amount: *amount,
                })
            }
            Some(amount) => (*amount, true),
            None => (entry.amount_cents, false),
        };

        fine_lines.push(FineLine {
            id: entry.id.clone(),
            name: entry.name.clone(),
            category: entry.category,
            amount_cents,
            overridden,
        });
    }
    let fines_cents = fine_lines
        .iter()
        .fold(0i64, |acc, line| acc.saturating_add(line.amount_cents));

    let discount_cents = input.discount_cents.max(0);
    let subtotal_cents = base_cents
        .saturating_add(surcharge_cents)
        .saturating_add(delivery_fee_cents)
        .saturating_add(fines_cents)
        .saturating_add(input.other_fees_cents);
    let total_cents = subtotal_cents.saturating_sub(discount_cents).max(0);

    Ok(PricingBreakdown {
        base_cents,
        surcharge_cents,
        delivery_fee_cents,
        fine_lines,
        fines_cents,
        other_fees_cents: input.other_fees_cents,
        discount_cents,
        subtotal_cents,
        total_cents,
    })
}

/// Persisted fine details arrive either as an array or as a JSON-encoded string; anything
/// unreadable becomes an empty list.
pub fn fine_lines_lenient<'de, D>(deserializer: D) -> Result<Vec<FineLine>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    let parsed = match value {
        Value::Null => Ok(Vec::new()),
        Value::String(text) if text.trim().is_empty() => Ok(Vec::new()),
        Value::String(text) => serde_json::from_str::<Vec<FineLine>>(&text),
        other => serde_json::from_value::<Vec<FineLine>>(other),
    };

    Ok(parsed.unwrap_or_else(|err| {
        warn!(error = %err, "ignoring malformed fine details");
        Vec::new()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> FineCatalog {
        FineCatalog::standard()
    }

    #[test]
    fn discount_larger_than_subtotal_floors_at_zero() {
        let mut input = PricingInput::new(10_000, 1);
        input.discount_cents = 99_999;

        let breakdown = compute_total(&input, &catalog()).expect("prices");
        assert_eq!(breakdown.subtotal_cents, 10_000);
        assert_eq!(breakdown.total_cents, 0);
    }

    #[test]
    fn manual_override_replaces_catalog_amount() {
        let catalog = catalog();
        let mut input = PricingInput::new(0, 1);
        input.selection = FineSelection::from_ids(["service_002"], &catalog).expect("known");
        input.overrides.insert("service_002".to_string(), 3_000);

        let breakdown = compute_total(&input, &catalog).expect("prices");
        assert_eq!(breakdown.fines_cents, 3_000);
        assert!(breakdown.fine_lines[0].overridden);
        assert_eq!(breakdown.total_cents, 3_000);
    }

    #[test]
    fn sums_every_component() {
        let catalog = catalog();
        let mut input = PricingInput::new(12_500, 2);
        input.photography_location = Some(PhotographyLocation::Home);
        input.delivery_type = DeliveryType::Address;
        input.delivery_fee_cents = 5_000;
        input.selection = FineSelection::from_ids(["fine_001"], &catalog).expect("known");
        input.other_fees_cents = 700;
        input.discount_cents = 1_200;

        let breakdown = compute_total(&input, &catalog).expect("prices");

        assert_eq!(breakdown.base_cents, 25_000);
        assert_eq!(breakdown.surcharge_cents, 15_000);
        assert_eq!(breakdown.delivery_fee_cents, 5_000);
        assert_eq!(breakdown.fines_cents, 10_000 + 2_500);
        assert_eq!(breakdown.penalties_cents(), 10_000);
        assert_eq!(breakdown.subtotal_cents, 25_000 + 15_000 + 5_000 + 12_500 + 700);
        assert_eq!(breakdown.total_cents, breakdown.subtotal_cents - 1_200);
    }

    #[test]
    fn office_pickup_ignores_delivery_fee() {
        let mut input = PricingInput::new(2_000, 1);
        input.delivery_fee_cents = 5_000;

        let breakdown = compute_total(&input, &catalog()).expect("prices");
        assert_eq!(breakdown.delivery_fee_cents, 0);
        assert_eq!(breakdown.total_cents, 2_000);
    }

    #[test]
    fn stray_expenses_line_is_not_charged() {
        let catalog = catalog();
        let mut input = PricingInput::new(2_000, 1);
        input.selection = serde_json::from_value(json!(["service_001", "fine_004"]))
            .expect("selection parses");

        let breakdown = compute_total(&input, &catalog).expect("prices");
        assert_eq!(breakdown.fine_lines.len(), 1);
        assert_eq!(breakdown.fines_cents, 5_000);
    }

    #[test]
    fn rejects_bad_inputs() {
        let catalog = catalog();
        assert!(matches!(
            compute_total(&PricingInput::new(2_000, 0), &catalog),
            Err(PricingError::InvalidQuantity(0))
        ));

        let mut input = PricingInput::new(2_000, 1);
        input.selection = FineSelection::from_ids(["service_003"], &catalog).expect("known");
        input.overrides.insert("service_003".to_string(), -1);
        assert!(matches!(
            compute_total(&input, &catalog),
            Err(PricingError::NegativeOverride { .. })
        ));
    }

    #[test]
    fn negative_discount_is_ignored() {
        let mut input = PricingInput::new(2_000, 1);
        input.discount_cents = -500;
        let breakdown = compute_total(&input, &catalog()).expect("prices");
        assert_eq!(breakdown.discount_cents, 0);
        assert_eq!(breakdown.total_cents, 2_000);
    }

    #[test]
    fn unknown_photography_location_has_no_surcharge() {
        assert_eq!(PhotographyLocation::parse(Some("studio")), None);
        assert_eq!(PhotographyLocation::parse(Some("")), None);
        assert_eq!(
            PhotographyLocation::parse(Some("hospital")),
            Some(PhotographyLocation::Hospital)
        );
    }

    #[test]
    fn stored_fine_details_parse_leniently() {
        let line = json!({
            "id": "fine_001",
            "name": "late",
            "category": "fines",
            "amount_cents": 10000
        });
        let encoded = json!({ "fine_lines": json!([line]).to_string(),
            "base_cents": 0, "surcharge_cents": 0, "delivery_fee_cents": 0, "fines_cents": 10000,
            "other_fees_cents": 0, "discount_cents": 0, "subtotal_cents": 10000, "total_cents": 10000 });
        let breakdown: PricingBreakdown = serde_json::from_value(encoded).expect("parses");
        assert_eq!(breakdown.fine_lines.len(), 1);

        let corrupt = json!({ "fine_lines": "[{oops",
            "base_cents": 0, "surcharge_cents": 0, "delivery_fee_cents": 0, "fines_cents": 0,
            "other_fees_cents": 0, "discount_cents": 0, "subtotal_cents": 0, "total_cents": 0 });
        let breakdown: PricingBreakdown = serde_json::from_value(corrupt).expect("parses");
        assert!(breakdown.fine_lines.is_empty());
    }
}
