use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::orders::domain::SubjectProfile;

pub const GENDER_FIELD: &str = "gender";
pub const AGE_FIELD: &str = "age";
pub const MARITAL_STATUS_FIELD: &str = "maritalStatus";

/// Values rules are evaluated against: built-in person fields plus questionnaire answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationContext {
    values: BTreeMap<String, String>,
}

impl EvaluationContext {
    /// Seed `gender`, `age` and `maritalStatus` from the person the order is for.
    pub fn for_subject(subject: &SubjectProfile, today: NaiveDate) -> Self {
        let mut context = Self::default();
        if let Some(gender) = subject.gender {
            context.insert(GENDER_FIELD, gender.as_str());
        }
        if let Some(age) = subject.age_on(today) {
            context.insert(AGE_FIELD, age.to_string());
        }
        if let Some(status) = subject.marital_status {
            context.insert(MARITAL_STATUS_FIELD, status.as_str());
        }
        context
    }

    /// Layer questionnaire answers on top. Blank answers count as unanswered and never shadow
    /// a built-in field.
    pub fn with_answers<'a, I>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (field, value) in answers {
            if value.trim().is_empty() || Self::is_builtin(field) {
                continue;
            }
            self.values.insert(field.clone(), value.clone());
        }
        self
    }

    pub fn is_builtin(field: &str) -> bool {
        matches!(field, GENDER_FIELD | AGE_FIELD | MARITAL_STATUS_FIELD)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for EvaluationContext {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
