use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rules::{self, EvaluationContext, RuleSet};

/// Grouping shown in the catalog sidebar (identity, travel, civil registry, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub slug: String,
    pub name: String,
}

/// A document-processing service offered at the counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub slug: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub active: bool,
    pub variants: Vec<ServiceVariant>,
    #[serde(default)]
    pub documents: Vec<ServiceDocument>,
    #[serde(default)]
    pub fields: Vec<ServiceField>,
}

/// Priced sub-option of a service, e.g. standard vs urgent issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceVariant {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    #[serde(default)]
    pub processing_days: u16,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Supporting paper the customer must bring, possibly only under some conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDocument {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, deserialize_with = "rules::lenient")]
    pub rules: RuleSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Select,
    Checkbox,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFieldOption {
    pub value: String,
    pub label: String,
}

/// Dynamic questionnaire field. `name` is the key answers are stored and evaluated under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<ServiceFieldOption>,
    #[serde(default, deserialize_with = "rules::lenient")]
    pub rules: RuleSet,
}

fn default_true() -> bool {
    true
}

/// Problems with questionnaire answers for a service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerError {
    #[error("'{label}' is required")]
    Missing { field: String, label: String },
    #[error("'{value}' is not an option for '{field}'")]
    InvalidOption { field: String, value: String },
    #[error("'{field}' expects a number, got '{value}'")]
    InvalidNumber { field: String, value: String },
    #[error("'{field}' expects a YYYY-MM-DD date, got '{value}'")]
    InvalidDate { field: String, value: String },
    #[error("'{field}' expects true or false, got '{value}'")]
    InvalidCheckbox { field: String, value: String },
}

/// Configuration mistakes rejected when a service is saved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceDefinitionError {
    #[error("service slug '{0}' must be lowercase letters, digits and dashes")]
    InvalidSlug(String),
    #[error("service '{0}' needs at least one variant")]
    NoVariants(String),
    #[error("variant id '{0}' is used twice")]
    DuplicateVariant(String),
    #[error("variant '{0}' has a negative price")]
    NegativePrice(String),
    #[error("field name '{0}' is used twice")]
    DuplicateField(String),
    #[error("select field '{0}' has no options")]
    SelectWithoutOptions(String),
    #[error("rules for '{owner}' are invalid: {reason}")]
    InvalidRules { owner: String, reason: String },
    #[error("service definition is malformed: {0}")]
    Malformed(String),
}

impl Service {
    /// Parse a definition submitted by staff. Stored rows tolerate broken rules; new
    /// definitions must carry rules that parse.
    pub fn from_definition(raw: Value) -> Result<Self, ServiceDefinitionError> {
        for (section, key) in [("documents", "id"), ("fields", "name")] {
            let entries = raw
                .get(section)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for entry in entries {
                let Some(rules) = entry.get("rules") else {
                    continue;
                };
                RuleSet::from_value(rules).map_err(|err| ServiceDefinitionError::InvalidRules {
                    owner: entry
                        .get(key)
                        .and_then(Value::as_str)
                        .unwrap_or(section)
                        .to_string(),
                    reason: err.to_string(),
                })?;
            }
        }

        serde_json::from_value(raw)
            .map_err(|err| ServiceDefinitionError::Malformed(err.to_string()))
    }

    pub fn variant(&self, id: &str) -> Option<&ServiceVariant> {
        self.variants.iter().find(|variant| variant.id == id)
    }

    pub fn active_variants(&self) -> impl Iterator<Item = &ServiceVariant> {
        self.variants.iter().filter(|variant| variant.active)
    }

    pub fn field(&self, name: &str) -> Option<&ServiceField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn visible_documents(&self, context: &EvaluationContext) -> Vec<&ServiceDocument> {
        self.documents
            .iter()
            .filter(|document| document.rules.evaluate(context))
            .collect()
    }

    /// Names of the documents the counter must collect for this context.
    pub fn required_documents(&self, context: &EvaluationContext) -> Vec<String> {
        self.visible_documents(context)
            .into_iter()
            .filter(|document| document.required)
            .map(|document| document.name.clone())
            .collect()
    }

    pub fn visible_fields(&self, context: &EvaluationContext) -> Vec<&ServiceField> {
        self.fields
            .iter()
            .filter(|field| field.rules.evaluate(context))
            .collect()
    }

    /// Keep only answers to fields currently visible; hidden answers are stale form state.
    pub fn retain_visible_answers(
        &self,
        context: &EvaluationContext,
        answers: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let visible: HashSet<&str> = self
            .visible_fields(context)
            .into_iter()
            .map(|field| field.name.as_str())
            .collect();
        answers
            .iter()
            .filter(|(name, _)| visible.contains(name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Check every visible field's answer; returns all problems rather than the first.
    pub fn validate_answers(
        &self,
        context: &EvaluationContext,
        answers: &BTreeMap<String, String>,
    ) -> Result<(), Vec<AnswerError>> {
        let errors: Vec<AnswerError> = self
            .visible_fields(context)
            .into_iter()
            .filter_map(|field| field.check(answers.get(&field.name).map(String::as_str)))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate the definition itself before it is stored.
    pub fn check_definition(&self) -> Result<(), ServiceDefinitionError> {
        let slug_ok = !self.slug.is_empty()
            && self
                .slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !slug_ok {
            return Err(ServiceDefinitionError::InvalidSlug(self.slug.clone()));
        }
        if self.variants.is_empty() {
            return Err(ServiceDefinitionError::NoVariants(self.slug.clone()));
        }

        let mut variant_ids = HashSet::new();
        for variant in &self.variants {
            if !variant_ids.insert(variant.id.as_str()) {
                return Err(ServiceDefinitionError::DuplicateVariant(variant.id.clone()));
            }
            if variant.price_cents < 0 {
                return Err(ServiceDefinitionError::NegativePrice(variant.id.clone()));
            }
        }

        let mut field_names = HashSet::new();
        for field in &self.fields {
            if !field_names.insert(field.name.as_str()) {
                return Err(ServiceDefinitionError::DuplicateField(field.name.clone()));
            }
            if field.kind == FieldKind::Select && field.options.is_empty() {
                return Err(ServiceDefinitionError::SelectWithoutOptions(
                    field.name.clone(),
                ));
            }
        }

        Ok(())
    }
}

impl ServiceField {
    fn check(&self, answer: Option<&str>) -> Option<AnswerError> {
        let value = match answer.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => value,
            None if self.required => {
                return Some(AnswerError::Missing {
                    field: self.name.clone(),
                    label: self.label.clone(),
                })
            }
            None => return None,
        };

        match self.kind {
            FieldKind::Text => None,
            FieldKind::Number => value.parse::<f64>().is_err().then(|| AnswerError::InvalidNumber {
                field: self.name.clone(),
                value: value.to_string(),
            }),
            FieldKind::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .is_err()
                .then(|| AnswerError::InvalidDate {
                    field: self.name.clone(),
                    value: value.to_string(),
                }),
            FieldKind::Checkbox => (!matches!(value, "true" | "false")).then(|| {
                AnswerError::InvalidCheckbox {
                    field: self.name.clone(),
                    value: value.to_string(),
                }
            }),
            FieldKind::Select => (!self.options.iter().any(|option| option.value == value))
                .then(|| AnswerError::InvalidOption {
                    field: self.name.clone(),
                    value: value.to_string(),
                }),
        }
    }
}
