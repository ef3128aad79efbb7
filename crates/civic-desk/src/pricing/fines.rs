use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::PricingError;

/// Companion "service expenses" line that follows real fines.
pub const EXPENSES_ID: &str = "service_001";
/// Fines-category entry that is an administrative fee, not a penalty, and so never pulls in
/// the expenses line.
pub const EXPENSES_EXEMPT_FINE_ID: &str = "fine_004";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FineCategory {
    Fines,
    AdditionalServices,
}

impl FineCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fines => "غرامات",
            Self::AdditionalServices => "خدمات إضافية",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineCatalogEntry {
    pub id: String,
    pub name: String,
    pub category: FineCategory,
    pub amount_cents: i64,
}

/// Static list of fines and add-on services staff can attach to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FineCatalog {
    entries: Vec<FineCatalogEntry>,
}

impl FineCatalog {
    pub fn new(entries: Vec<FineCatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            entry("fine_001", "غرامة تأخير التجديد", FineCategory::Fines, 10_000),
            entry("fine_002", "غرامة فقد", FineCategory::Fines, 20_000),
            entry("fine_003", "غرامة تلف", FineCategory::Fines, 15_000),
            entry(
                EXPENSES_EXEMPT_FINE_ID,
                "رسم تصحيح بيانات",
                FineCategory::Fines,
                5_000,
            ),
            entry(
                EXPENSES_ID,
                "مصاريف إدارية",
                FineCategory::AdditionalServices,
                2_500,
            ),
            entry(
                "service_002",
                "ترجمة معتمدة",
                FineCategory::AdditionalServices,
                5_000,
            ),
            entry(
                "service_003",
                "نسخة إضافية",
                FineCategory::AdditionalServices,
                1_500,
            ),
            entry(
                "service_004",
                "متابعة برسائل نصية",
                FineCategory::AdditionalServices,
                1_000,
            ),
        ])
    }

    pub fn entries(&self) -> &[FineCatalogEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&FineCatalogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// A penalty that triggers the expenses line.
    pub fn is_real_fine(&self, id: &str) -> bool {
        id != EXPENSES_EXEMPT_FINE_ID
            && self
                .entry(id)
                .map_or(false, |entry| entry.category == FineCategory::Fines)
    }
}

fn entry(id: &str, name: &str, category: FineCategory, amount_cents: i64) -> FineCatalogEntry {
    FineCatalogEntry {
        id: id.to_string(),
        name: name.to_string(),
        category,
        amount_cents,
    }
}

/// Selected fine/add-on ids.
///
/// Every mutation re-applies the companion rule: the expenses line is present exactly when at
/// least one real fine is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FineSelection {
    ids: BTreeSet<String>,
}

impl FineSelection {
    pub fn from_ids<I, S>(ids: I, catalog: &FineCatalog) -> Result<Self, PricingError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::default();
        for id in ids {
            let id = id.into();
            selection.ensure_known(&id, catalog)?;
            selection.ids.insert(id);
        }
        selection.relink(catalog);
        Ok(selection)
    }

    pub fn select(&mut self, id: &str, catalog: &FineCatalog) -> Result<(), PricingError> {
        self.ensure_known(id, catalog)?;
        self.ids.insert(id.to_string());
        self.relink(catalog);
        Ok(())
    }

    pub fn deselect(&mut self, id: &str, catalog: &FineCatalog) {
        self.ids.remove(id);
        self.relink(catalog);
    }

    /// Flip `id` and report whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str, catalog: &FineCatalog) -> Result<bool, PricingError> {
        if self.ids.contains(id) {
            self.deselect(id, catalog);
        } else {
            self.select(id, catalog)?;
        }
        Ok(self.ids.contains(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn has_real_fine(&self, catalog: &FineCatalog) -> bool {
        self.ids.iter().any(|id| catalog.is_real_fine(id))
    }

    fn ensure_known(&self, id: &str, catalog: &FineCatalog) -> Result<(), PricingError> {
        match catalog.entry(id) {
            Some(_) => Ok(()),
            None => Err(PricingError::UnknownFine(id.to_string())),
        }
    }

    fn relink(&mut self, catalog: &FineCatalog) {
        if self.has_real_fine(catalog) {
            self.ids.insert(EXPENSES_ID.to_string());
        } else {
            self.ids.remove(EXPENSES_ID);
        }
    }
}
