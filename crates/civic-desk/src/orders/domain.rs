use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::pricing::{DeliveryType, PhotographyLocation, PricingBreakdown};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
    Widowed,
}

impl MaritalStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "SINGLE",
            Self::Married => "MARRIED",
            Self::Divorced => "DIVORCED",
            Self::Widowed => "WIDOWED",
        }
    }
}

/// Person attributes visibility rules may inspect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectProfile {
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub marital_status: Option<MaritalStatus>,
}

impl SubjectProfile {
    /// Completed years on `today`; `None` without a birth date or for future birth dates.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.birth_date.and_then(|born| today.years_since(born))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Family member an order can be placed for (a child's birth certificate, a parent's ID).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependent {
    pub id: String,
    pub full_name: String,
    pub relation: String,
    #[serde(flatten)]
    pub profile: SubjectProfile,
}

/// Walk-in customer registered at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub full_name: String,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(flatten)]
    pub profile: SubjectProfile,
    #[serde(default)]
    pub dependents: Vec<Dependent>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn dependent(&self, id: &str) -> Option<&Dependent> {
        self.dependents.iter().find(|dependent| dependent.id == id)
    }

    /// Search-as-you-type match: name substring (case-insensitive), national id or phone prefix.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return false;
        }
        let lowered = term.to_lowercase();
        self.full_name.to_lowercase().contains(&lowered)
            || self
                .national_id
                .as_deref()
                .map_or(false, |id| id.starts_with(term))
            || self
                .phone
                .as_deref()
                .map_or(false, |phone| phone.starts_with(term))
    }

    pub fn summary(&self) -> CustomerSummary {
        CustomerSummary {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
            national_id: self.national_id.clone(),
            phone: self.phone.clone(),
            dependents: self
                .dependents
                .iter()
                .map(|dependent| (dependent.id.clone(), dependent.full_name.clone()))
                .collect(),
        }
    }
}

/// Compact view returned by customer search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: CustomerId,
    pub full_name: String,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub dependents: BTreeMap<String, String>,
}

/// Registration payload for a walk-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub full_name: String,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(flatten)]
    pub profile: SubjectProfile,
    #[serde(default)]
    pub dependents: Vec<Dependent>,
}

/// Validation failures for customer registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomerValidationError {
    #[error("customer name is required")]
    MissingName,
    #[error("national id must be 14 digits")]
    InvalidNationalId,
    #[error("phone number may only contain digits and a leading +")]
    InvalidPhone,
    #[error("dependent id '{0}' is used twice")]
    DuplicateDependent(String),
}

impl NewCustomer {
    pub fn validate(&self) -> Result<(), CustomerValidationError> {
        if self.full_name.trim().is_empty() {
            return Err(CustomerValidationError::MissingName);
        }
        if let Some(national_id) = self.national_id.as_deref() {
            if national_id.len() != 14 || !national_id.chars().all(|c| c.is_ascii_digit()) {
                return Err(CustomerValidationError::InvalidNationalId);
            }
        }
        if let Some(phone) = self.phone.as_deref() {
            let digits = phone.strip_prefix('+').unwrap_or(phone);
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(CustomerValidationError::InvalidPhone);
            }
        }
        let mut seen = std::collections::HashSet::new();
        for dependent in &self.dependents {
            if !seen.insert(dependent.id.as_str()) {
                return Err(CustomerValidationError::DuplicateDependent(
                    dependent.id.clone(),
                ));
            }
        }
        Ok(())
    }

    pub fn into_customer(self, id: CustomerId, created_at: DateTime<Utc>) -> Customer {
        Customer {
            id,
            full_name: self.full_name.trim().to_string(),
            national_id: self.national_id,
            phone: self.phone,
            address: self.address,
            profile: self.profile,
            dependents: self.dependents,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of an order at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    InProgress,
    AwaitingDocuments,
    Ready,
    Delivered,
    Completed,
    Cancelled,
}

/// Why a status change was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("order is already {0}")]
    Unchanged(&'static str),
    #[error("order is {0} and can no longer change")]
    Closed(&'static str),
    #[error("only address deliveries can be marked delivered")]
    NotADelivery,
}

impl OrderStatus {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Pending,
            Self::InProgress,
            Self::AwaitingDocuments,
            Self::Ready,
            Self::Delivered,
            Self::Completed,
            Self::Cancelled,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "قيد الانتظار",
            Self::InProgress => "جاري التنفيذ",
            Self::AwaitingDocuments => "بانتظار المستندات",
            Self::Ready => "جاهز للاستلام",
            Self::Delivered => "تم التوصيل",
            Self::Completed => "مكتمل",
            Self::Cancelled => "ملغي",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::AwaitingDocuments => "AWAITING_DOCUMENTS",
            Self::Ready => "READY",
            Self::Delivered => "DELIVERED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn check_transition(
        self,
        next: Self,
        delivery_type: DeliveryType,
    ) -> Result<(), TransitionError> {
        if self == next {
            return Err(TransitionError::Unchanged(self.as_str()));
        }
        if self.is_terminal() {
            return Err(TransitionError::Closed(self.as_str()));
        }
        if next == Self::Delivered && delivery_type != DeliveryType::Address {
            return Err(TransitionError::NotADelivery);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub slug: String,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSnapshot {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
}

/// Person the documents are issued for when it is not the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiarySnapshot {
    pub dependent_id: String,
    pub full_name: String,
    pub relation: String,
}

/// A persisted order with the catalog and pricing state frozen at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub beneficiary: Option<BeneficiarySnapshot>,
    pub service: ServiceSnapshot,
    pub variant: VariantSnapshot,
    pub quantity: u32,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub photography_location: Option<PhotographyLocation>,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub required_documents: Vec<String>,
    #[serde(default)]
    pub pricing: PricingBreakdown,
    pub status: OrderStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Name printed on documents: the dependent when there is one.
    pub fn beneficiary_name(&self) -> &str {
        self.beneficiary
            .as_ref()
            .map_or(self.customer_name.as_str(), |b| b.full_name.as_str())
    }

    pub fn answer(&self, field: &str) -> Option<&str> {
        self.answers
            .get(field)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        let lowered = term.to_lowercase();
        self.id.0.to_lowercase().contains(&lowered)
            || self.customer_name.to_lowercase().contains(&lowered)
            || self.beneficiary_name().to_lowercase().contains(&lowered)
            || self
                .national_id
                .as_deref()
                .map_or(false, |id| id.starts_with(term))
            || self
                .customer_phone
                .as_deref()
                .map_or(false, |phone| phone.starts_with(term))
    }

    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id.clone(),
            customer_name: self.customer_name.clone(),
            beneficiary_name: self.beneficiary_name().to_string(),
            service_name: self.service.name.clone(),
            variant_name: self.variant.name.clone(),
            quantity: self.quantity,
            status: self.status,
            status_label: self.status.label(),
            total_cents: self.pricing.total_cents,
            created_at: self.created_at,
        }
    }
}

/// Row in the order list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub customer_name: String,
    pub beneficiary_name: String,
    pub service_name: String,
    pub variant_name: String,
    pub quantity: u32,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

fn default_quantity() -> u32 {
    1
}

/// Order-creation payload posted by the counter form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub walk_in: Option<NewCustomer>,
    #[serde(default)]
    pub dependent_id: Option<String>,
    pub service_slug: String,
    pub variant_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub photography_location: Option<String>,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub selected_fines: Vec<String>,
    #[serde(default)]
    pub fine_overrides: BTreeMap<String, i64>,
    #[serde(default)]
    pub other_fees_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub notes: Option<String>,
}
