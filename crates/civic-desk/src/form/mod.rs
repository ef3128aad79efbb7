//! Counter-side order form: reducer state, derived quote and visibility, request building.

mod search;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::catalog::{Service, ServiceDocument, ServiceField, ServiceVariant};
use crate::config::PricingConfig;
use crate::money::parse_cents;
use crate::orders::domain::{Customer, NewCustomer, NewOrderRequest, SubjectProfile};
use crate::pricing::{
    compute_total, DeliveryType, FineCatalog, FineSelection, PhotographyLocation,
    PricingBreakdown, PricingError, PricingInput,
};
use crate::rules::EvaluationContext;

pub use search::DebouncedSearch;

/// One user edit to the form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    SelectCustomer(Customer),
    EnterWalkIn(NewCustomer),
    ClearCustomer,
    SelectDependent(Option<String>),
    SelectService(Service),
    SelectVariant(String),
    SetQuantity(u32),
    SetPhotography(Option<PhotographyLocation>),
    SetDelivery {
        delivery_type: DeliveryType,
        address: Option<String>,
    },
    ToggleFine(String),
    SetOverride { id: String, amount_cents: i64 },
    ClearOverride(String),
    SetOtherFees(i64),
    /// Raw text from the discount box.
    SetDiscount(String),
    SetAnswer { field: String, value: String },
    SetNotes(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("choose a customer first")]
    NoCustomer,
    #[error("choose a service first")]
    NoService,
    #[error("choose a variant first")]
    NoVariant,
    #[error("variant '{0}' is not offered for this service")]
    UnknownVariant(String),
    #[error("dependent '{0}' does not belong to this customer")]
    UnknownDependent(String),
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

#[derive(Debug, Clone, PartialEq)]
enum Applicant {
    Existing(Customer),
    WalkIn(NewCustomer),
}

/// In-progress order as staff fill it in.
#[derive(Debug, Clone)]
pub struct OrderForm {
    fines: Arc<FineCatalog>,
    delivery_fee_cents: i64,
    today: NaiveDate,
    applicant: Option<Applicant>,
    dependent_id: Option<String>,
    service: Option<Service>,
    variant_id: Option<String>,
    quantity: u32,
    photography_location: Option<PhotographyLocation>,
    delivery_type: DeliveryType,
    delivery_address: Option<String>,
    selection: FineSelection,
    overrides: BTreeMap<String, i64>,
    other_fees_cents: i64,
    discount_input: String,
    answers: BTreeMap<String, String>,
    notes: Option<String>,
}

impl OrderForm {
    pub fn new(fines: Arc<FineCatalog>, pricing: &PricingConfig, today: NaiveDate) -> Self {
        Self {
            fines,
            delivery_fee_cents: pricing.delivery_fee_cents,
            today,
            applicant: None,
            dependent_id: None,
            service: None,
            variant_id: None,
            quantity: 1,
            photography_location: None,
            delivery_type: DeliveryType::Office,
            delivery_address: None,
            selection: FineSelection::default(),
            overrides: BTreeMap::new(),
            other_fees_cents: 0,
            discount_input: String::new(),
            answers: BTreeMap::new(),
            notes: None,
        }
    }

    /// Apply one edit. A rejected edit leaves the form unchanged.
    pub fn apply(&mut self, action: FormAction) -> Result<(), FormError> {
        match action {
            FormAction::SelectCustomer(customer) => {
                self.applicant = Some(Applicant::Existing(customer));
                self.dependent_id = None;
            }
            FormAction::EnterWalkIn(customer) => {
                self.applicant = Some(Applicant::WalkIn(customer));
                self.dependent_id = None;
            }
            FormAction::ClearCustomer => {
                self.applicant = None;
                self.dependent_id = None;
            }
            FormAction::SelectDependent(None) => self.dependent_id = None,
            FormAction::SelectDependent(Some(id)) => {
                let known = match &self.applicant {
                    Some(Applicant::Existing(customer)) => customer.dependent(&id).is_some(),
                    Some(Applicant::WalkIn(customer)) => {
                        customer.dependents.iter().any(|dependent| dependent.id == id)
                    }
                    None => return Err(FormError::NoCustomer),
                };
                if !known {
                    return Err(FormError::UnknownDependent(id));
                }
                self.dependent_id = Some(id);
            }
            FormAction::SelectService(service) => {
                self.variant_id = {
                    let mut active = service.active_variants();
                    match (active.next(), active.next()) {
                        (Some(only), None) => Some(only.id.clone()),
                        _ => None,
                    }
                };
                self.answers.clear();
                debug!(service = %service.slug, "form service selected");
                self.service = Some(service);
            }
            FormAction::SelectVariant(id) => {
                let service = self.service.as_ref().ok_or(FormError::NoService)?;
                if !service.variant(&id).map_or(false, |variant| variant.active) {
                    return Err(FormError::UnknownVariant(id));
                }
                self.variant_id = Some(id);
            }
            FormAction::SetQuantity(0) => return Err(FormError::InvalidQuantity),
            FormAction::SetQuantity(quantity) => self.quantity = quantity,
            FormAction::SetPhotography(location) => self.photography_location = location,
            FormAction::SetDelivery {
                delivery_type,
                address,
            } => {
                self.delivery_type = delivery_type;
                self.delivery_address = address;
            }
            FormAction::ToggleFine(id) => {
                self.selection.toggle(&id, &self.fines)?;
            }
            FormAction::SetOverride { id, amount_cents } => {
                if amount_cents < 0 {
                    return Err(PricingError::NegativeOverride {
                        id,
                        amount: amount_cents,
                    }
                    .into());
                }
                self.overrides.insert(id, amount_cents);
            }
            FormAction::ClearOverride(id) => {
                self.overrides.remove(&id);
            }
            FormAction::SetOtherFees(cents) => {
                if cents < 0 {
                    return Err(PricingError::NegativeAmount("other fees").into());
                }
                self.other_fees_cents = cents;
            }
            FormAction::SetDiscount(raw) => self.discount_input = raw,
            FormAction::SetAnswer { field, value } => {
                if value.trim().is_empty() {
                    self.answers.remove(&field);
                } else {
                    self.answers.insert(field, value);
                }
            }
            FormAction::SetNotes(notes) => {
                self.notes = Some(notes).filter(|notes| !notes.trim().is_empty());
            }
        }
        Ok(())
    }

    pub fn service(&self) -> Option<&Service> {
        self.service.as_ref()
    }

    pub fn variant(&self) -> Option<&ServiceVariant> {
        let service = self.service.as_ref()?;
        service.variant(self.variant_id.as_deref()?)
    }

    pub fn selection(&self) -> &FineSelection {
        &self.selection
    }

    pub fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }

    /// Discount typed by staff; anything unparseable counts as no discount.
    pub fn discount_cents(&self) -> i64 {
        parse_cents(&self.discount_input).unwrap_or(0)
    }

    /// The person the documents are for: the chosen dependent, else the customer.
    pub fn subject(&self) -> SubjectProfile {
        let (profile, dependents) = match &self.applicant {
            Some(Applicant::Existing(customer)) => (&customer.profile, &customer.dependents),
            Some(Applicant::WalkIn(customer)) => (&customer.profile, &customer.dependents),
            None => return SubjectProfile::default(),
        };
        self.dependent_id
            .as_deref()
            .and_then(|id| dependents.iter().find(|dependent| dependent.id == id))
            .map_or_else(|| profile.clone(), |dependent| dependent.profile.clone())
    }

    pub fn context(&self) -> EvaluationContext {
        EvaluationContext::for_subject(&self.subject(), self.today).with_answers(&self.answers)
    }

    pub fn visible_fields(&self) -> Vec<&ServiceField> {
        let context = self.context();
        self.service
            .as_ref()
            .map(|service| service.visible_fields(&context))
            .unwrap_or_default()
    }

    pub fn visible_documents(&self) -> Vec<&ServiceDocument> {
        let context = self.context();
        self.service
            .as_ref()
            .map(|service| service.visible_documents(&context))
            .unwrap_or_default()
    }

    /// Live price for the current state.
    pub fn quote(&self) -> Result<PricingBreakdown, FormError> {
        if self.service.is_none() {
            return Err(FormError::NoService);
        }
        let variant = self.variant().ok_or(FormError::NoVariant)?;
        let input = PricingInput {
            variant_price_cents: variant.price_cents,
            quantity: self.quantity,
            photography_location: self.photography_location,
            delivery_type: self.delivery_type,
            delivery_fee_cents: self.delivery_fee_cents,
            selection: self.selection.clone(),
            overrides: self.overrides.clone(),
            other_fees_cents: self.other_fees_cents,
            discount_cents: self.discount_cents(),
        };
        Ok(compute_total(&input, &self.fines)?)
    }

    /// Build the creation payload. Answers to fields hidden by the current context are dropped.
    pub fn to_request(&self) -> Result<NewOrderRequest, FormError> {
        let service = self.service.as_ref().ok_or(FormError::NoService)?;
        let variant = self.variant().ok_or(FormError::NoVariant)?;
        let (customer_id, walk_in) = match &self.applicant {
            Some(Applicant::Existing(customer)) => (Some(customer.id.clone()), None),
            Some(Applicant::WalkIn(customer)) => (None, Some(customer.clone())),
            None => return Err(FormError::NoCustomer),
        };

        let answers = service.retain_visible_answers(&self.context(), &self.answers);
        let overrides = self
            .overrides
            .iter()
            .filter(|(id, _)| self.selection.contains(id))
            .map(|(id, amount)| (id.clone(), *amount))
            .collect();

        Ok(NewOrderRequest {
            customer_id,
            walk_in,
            dependent_id: self.dependent_id.clone(),
            service_slug: service.slug.clone(),
            variant_id: variant.id.clone(),
            quantity: self.quantity,
            photography_location: self
                .photography_location
                .map(|location| location.as_str().to_string()),
            delivery_type: self.delivery_type,
            delivery_address: match self.delivery_type {
                DeliveryType::Address => self.delivery_address.clone(),
                DeliveryType::Office => None,
            },
            selected_fines: self.selection.iter().map(str::to_string).collect(),
            fine_overrides: overrides,
            other_fees_cents: self.other_fees_cents,
            discount_cents: self.discount_cents(),
            answers,
            notes: self.notes.clone(),
        })
    }
}
