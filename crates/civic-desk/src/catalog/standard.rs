//! Stock catalog the office starts from before staff customize it.

use super::domain::{
    FieldKind, Service, ServiceCategory, ServiceDocument, ServiceField, ServiceFieldOption,
    ServiceVariant,
};
use crate::rules::RuleSet;

pub const IDENTITY: &str = "identity";
pub const TRAVEL: &str = "travel";
pub const CIVIL_REGISTRY: &str = "civil-registry";

pub fn categories() -> Vec<ServiceCategory> {
    vec![
        category(IDENTITY, "الهوية"),
        category(TRAVEL, "السفر"),
        category(CIVIL_REGISTRY, "السجل المدني"),
    ]
}

pub fn services() -> Vec<Service> {
    vec![
        national_id(),
        passport(),
        birth_certificate(),
        death_certificate(),
        marriage_certificate(),
    ]
}

pub fn national_id() -> Service {
    Service {
        slug: "national-id".to_string(),
        name: "بطاقة رقم قومي".to_string(),
        category: IDENTITY.to_string(),
        description: "إصدار وتجديد بطاقة الرقم القومي".to_string(),
        active: true,
        variants: vec![
            variant("standard", "عادي", 12_500, 7),
            variant("urgent", "مستعجل", 27_500, 1),
            variant("replacement", "بدل فاقد", 17_500, 3),
        ],
        documents: vec![
            document("birth_certificate", "شهادة ميلاد كمبيوتر", RuleSet::default()),
            document(
                "marriage_contract",
                "قسيمة الزواج",
                RuleSet::builder().equals("maritalStatus", "MARRIED").build(),
            ),
            document(
                "guardian_consent",
                "موافقة ولي الأمر",
                RuleSet::builder().less_than("age", "21").build(),
            ),
            document(
                "military_certificate",
                "شهادة الموقف من التجنيد",
                RuleSet::builder()
                    .equals("gender", "MALE")
                    .greater_than("age", "17")
                    .build(),
            ),
        ],
        fields: vec![
            field("question_1", "المهنة", FieldKind::Text, true, RuleSet::default()),
            ServiceField {
                options: options(&[
                    ("none", "بدون"),
                    ("secondary", "مؤهل متوسط"),
                    ("university", "مؤهل عالي"),
                ]),
                ..field(
                    "question_2",
                    "المؤهل الدراسي",
                    FieldKind::Select,
                    true,
                    RuleSet::default(),
                )
            },
            field(
                "spouseName",
                "اسم الزوج/الزوجة",
                FieldKind::Text,
                true,
                RuleSet::builder().equals("maritalStatus", "MARRIED").build(),
            ),
        ],
    }
}

pub fn passport() -> Service {
    Service {
        slug: "passport".to_string(),
        name: "جواز سفر".to_string(),
        category: TRAVEL.to_string(),
        description: "استخراج وتجديد جواز السفر".to_string(),
        active: true,
        variants: vec![
            variant("standard", "عادي", 51_000, 10),
            variant("urgent", "مستعجل", 91_500, 2),
        ],
        documents: vec![
            document("national_id_copy", "صورة البطاقة", RuleSet::default()),
            document(
                "military_certificate",
                "شهادة الموقف من التجنيد",
                RuleSet::builder()
                    .equals("gender", "MALE")
                    .greater_than("age", "17")
                    .build(),
            ),
            document(
                "employer_permit",
                "تصريح جهة العمل",
                RuleSet::builder()
                    .equals("employmentSector", "government")
                    .build(),
            ),
        ],
        fields: vec![
            field(
                "policeStation",
                "قسم الشرطة",
                FieldKind::Text,
                true,
                RuleSet::default(),
            ),
            ServiceField {
                options: options(&[
                    ("abbasia", "الجوازات - العباسية"),
                    ("heliopolis", "مصر الجديدة"),
                    ("office", "المكتب"),
                ]),
                ..field(
                    "pickupLocation",
                    "مكان الاستلام",
                    FieldKind::Select,
                    true,
                    RuleSet::default(),
                )
            },
            ServiceField {
                options: options(&[
                    ("private", "قطاع خاص"),
                    ("government", "قطاع حكومي"),
                    ("none", "لا يعمل"),
                ]),
                ..field(
                    "employmentSector",
                    "جهة العمل",
                    FieldKind::Select,
                    true,
                    RuleSet::default(),
                )
            },
        ],
    }
}

pub fn birth_certificate() -> Service {
    Service {
        slug: "birth-certificate".to_string(),
        name: "شهادة ميلاد".to_string(),
        category: CIVIL_REGISTRY.to_string(),
        description: "مستخرج شهادة ميلاد مميكنة".to_string(),
        active: true,
        variants: vec![
            variant("first_issue", "أول مرة", 5_000, 1),
            variant("copy", "بدل فاقد", 2_000, 1),
        ],
        documents: vec![document(
            "applicant_id",
            "بطاقة مقدم الطلب",
            RuleSet::default(),
        )],
        fields: vec![
            field(
                "birthDate",
                "تاريخ الميلاد",
                FieldKind::Date,
                true,
                RuleSet::default(),
            ),
            field("motherName", "اسم الأم", FieldKind::Text, true, RuleSet::default()),
        ],
    }
}

pub fn death_certificate() -> Service {
    Service {
        slug: "death-certificate".to_string(),
        name: "شهادة وفاة".to_string(),
        category: CIVIL_REGISTRY.to_string(),
        description: "مستخرج شهادة وفاة".to_string(),
        active: true,
        variants: vec![variant("standard", "عادي", 2_000, 1)],
        documents: vec![
            document("applicant_id", "بطاقة مقدم الطلب", RuleSet::default()),
            document("hospital_report", "تقرير المستشفى", RuleSet::default()),
        ],
        fields: vec![
            field(
                "deceasedName",
                "اسم المتوفى",
                FieldKind::Text,
                true,
                RuleSet::default(),
            ),
            field(
                "deathDate",
                "تاريخ الوفاة",
                FieldKind::Date,
                true,
                RuleSet::default(),
            ),
        ],
    }
}

pub fn marriage_certificate() -> Service {
    Service {
        slug: "marriage-certificate".to_string(),
        name: "وثيقة زواج".to_string(),
        category: CIVIL_REGISTRY.to_string(),
        description: "مستخرج وثيقة زواج".to_string(),
        active: true,
        variants: vec![variant("standard", "عادي", 3_000, 2)],
        documents: vec![document(
            "marriage_contract_copy",
            "صورة عقد الزواج",
            RuleSet::default(),
        )],
        fields: vec![
            field(
                "husbandName",
                "اسم الزوج",
                FieldKind::Text,
                true,
                RuleSet::default(),
            ),
            field("wifeName", "اسم الزوجة", FieldKind::Text, true, RuleSet::default()),
        ],
    }
}

fn category(slug: &str, name: &str) -> ServiceCategory {
    ServiceCategory {
        slug: slug.to_string(),
        name: name.to_string(),
    }
}

fn variant(id: &str, name: &str, price_cents: i64, processing_days: u16) -> ServiceVariant {
    ServiceVariant {
        id: id.to_string(),
        name: name.to_string(),
        price_cents,
        processing_days,
        active: true,
    }
}

fn document(id: &str, name: &str, rules: RuleSet) -> ServiceDocument {
    ServiceDocument {
        id: id.to_string(),
        name: name.to_string(),
        required: true,
        rules,
    }
}

fn field(name: &str, label: &str, kind: FieldKind, required: bool, rules: RuleSet) -> ServiceField {
    ServiceField {
        name: name.to_string(),
        label: label.to_string(),
        kind,
        required,
        options: Vec::new(),
        rules,
    }
}

fn options(pairs: &[(&str, &str)]) -> Vec<ServiceFieldOption> {
    pairs
        .iter()
        .map(|(value, label)| ServiceFieldOption {
            value: value.to_string(),
            label: label.to_string(),
        })
        .collect()
}
