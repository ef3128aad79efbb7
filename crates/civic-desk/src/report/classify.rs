use serde::Serialize;

use crate::orders::domain::Order;

/// Print template family, inferred from the service's name and slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    NationalId,
    Passport,
    Death,
    Birth,
    Marriage,
    General,
}

/// Extra per-category column: questionnaire field and its printed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerColumn {
    pub field: &'static str,
    pub header: &'static str,
}

const fn column(field: &'static str, header: &'static str) -> AnswerColumn {
    AnswerColumn { field, header }
}

const PASSPORT_COLUMNS: [AnswerColumn; 2] = [
    column("policeStation", "قسم الشرطة"),
    column("pickupLocation", "مكان الاستلام"),
];
const BIRTH_COLUMNS: [AnswerColumn; 2] = [
    column("birthDate", "تاريخ الميلاد"),
    column("motherName", "اسم الأم"),
];
const DEATH_COLUMNS: [AnswerColumn; 2] = [
    column("deceasedName", "اسم المتوفى"),
    column("deathDate", "تاريخ الوفاة"),
];
const MARRIAGE_COLUMNS: [AnswerColumn; 2] = [
    column("husbandName", "اسم الزوج"),
    column("wifeName", "اسم الزوجة"),
];

/// Checked in this order; the first match wins.
const MATCHERS: [(ReportCategory, &[&str], &[&str]); 5] = [
    (
        ReportCategory::NationalId,
        &["بطاقة", "رقم قومي"],
        &["national-id", "id-card"],
    ),
    (ReportCategory::Passport, &["جواز"], &["passport"]),
    (ReportCategory::Death, &["وفاة"], &["death"]),
    (ReportCategory::Birth, &["ميلاد"], &["birth"]),
    (ReportCategory::Marriage, &["زواج"], &["marriage"]),
];

impl ReportCategory {
    pub fn classify(service_name: &str, service_slug: &str) -> Self {
        let slug = service_slug.to_ascii_lowercase();
        MATCHERS
            .iter()
            .find(|(_, names, slugs)| {
                names.iter().any(|needle| service_name.contains(needle))
                    || slugs.iter().any(|needle| slug.contains(needle))
            })
            .map_or(Self::General, |(category, _, _)| *category)
    }

    pub fn for_order(order: &Order) -> Self {
        Self::classify(&order.service.name, &order.service.slug)
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::NationalId => "بطاقات الرقم القومي",
            Self::Passport => "جوازات السفر",
            Self::Death => "شهادات الوفاة",
            Self::Birth => "شهادات الميلاد",
            Self::Marriage => "وثائق الزواج",
            Self::General => "خدمات أخرى",
        }
    }

    pub fn answer_columns(self) -> &'static [AnswerColumn] {
        match self {
            Self::Passport => &PASSPORT_COLUMNS,
            Self::Birth => &BIRTH_COLUMNS,
            Self::Death => &DEATH_COLUMNS,
            Self::Marriage => &MARRIAGE_COLUMNS,
            Self::NationalId | Self::General => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_card_wins_over_passport() {
        assert_eq!(
            ReportCategory::classify("جواز سفر مع بطاقة", "combo"),
            ReportCategory::NationalId
        );
    }

    #[test]
    fn slug_is_used_when_the_name_is_not_arabic() {
        assert_eq!(
            ReportCategory::classify("Passport renewal", "passport-renewal"),
            ReportCategory::Passport
        );
        assert_eq!(
            ReportCategory::classify("Certificate", "Death-Certificate"),
            ReportCategory::Death
        );
    }

    #[test]
    fn death_is_checked_before_birth() {
        assert_eq!(
            ReportCategory::classify("شهادة وفاة وميلاد", "x"),
            ReportCategory::Death
        );
    }

    #[test]
    fn unknown_services_are_general() {
        let category = ReportCategory::classify("توثيق عقد", "contract-notary");
        assert_eq!(category, ReportCategory::General);
        assert!(category.answer_columns().is_empty());
    }
}
