use std::collections::BTreeMap;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::domain::grouping::Categorized;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    MajorCategory,
    MiddleCategory,
    Payload(&'static str),
}

impl Field {
    pub fn is_grouped(&self) -> bool {
        matches!(self, Field::MajorCategory | Field::MiddleCategory)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    #[serde(rename = "majorCategory", default)]
    pub major_category: String,
    #[serde(rename = "middleCategory", default)]
    pub middle_category: String,
    #[serde(flatten)]
    pub payload: BTreeMap<String, String>,
}

impl SheetRow {
    pub fn empty(kind: DocumentKind) -> Self {
        let mut row = SheetRow::default();
        for column in kind.columns() {
            if let Field::Payload(key) = column.field {
                row.payload.insert(key.to_string(), String::new());
            }
        }
        row
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::MajorCategory => &self.major_category,
            Field::MiddleCategory => &self.middle_category,
            Field::Payload(key) => self.payload.get(key).map(String::as_str).unwrap_or(""),
        }
    }

    pub fn set_value(&mut self, field: Field, value: &str) {
        match field {
            Field::MajorCategory => self.major_category = value.to_string(),
            Field::MiddleCategory => self.middle_category = value.to_string(),
            Field::Payload(key) => {
                self.payload.insert(key.to_string(), value.to_string());
            }
        }
    }
}

impl Categorized for SheetRow {
    fn major_category(&self) -> &str {
        &self.major_category
    }

    fn middle_category(&self) -> &str {
        &self.middle_category
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub field: Field,
    pub label: &'static str,
}

const FEATURE_LIST_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        field: Field::MajorCategory,
        label: "대분류",
    },
    ColumnSpec {
        field: Field::MiddleCategory,
        label: "중분류",
    },
    ColumnSpec {
        field: Field::Payload("minorCategory"),
        label: "소분류",
    },
    ColumnSpec {
        field: Field::Payload("featureDescription"),
        label: "기능 설명",
    },
];

const TESTCASE_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        field: Field::MajorCategory,
        label: "대분류",
    },
    ColumnSpec {
        field: Field::MiddleCategory,
        label: "중분류",
    },
    ColumnSpec {
        field: Field::Payload("minorCategory"),
        label: "소분류",
    },
    ColumnSpec {
        field: Field::Payload("testcaseId"),
        label: "테스트 케이스 ID",
    },
    ColumnSpec {
        field: Field::Payload("scenario"),
        label: "테스트 시나리오",
    },
    ColumnSpec {
        field: Field::Payload("input"),
        label: "입력(사전조건 포함)",
    },
    ColumnSpec {
        field: Field::Payload("expected"),
        label: "기대 출력(사후조건 포함)",
    },
    ColumnSpec {
        field: Field::Payload("result"),
        label: "테스트 결과",
    },
    ColumnSpec {
        field: Field::Payload("detail"),
        label: "상세 테스트 결과",
    },
    ColumnSpec {
        field: Field::Payload("note"),
        label: "비고",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    FeatureList,
    Testcases,
}

impl DocumentKind {
    pub fn title(self) -> &'static str {
        match self {
            DocumentKind::FeatureList => "기능리스트",
            DocumentKind::Testcases => "테스트케이스",
        }
    }

    pub fn columns(self) -> &'static [ColumnSpec] {
        match self {
            DocumentKind::FeatureList => FEATURE_LIST_COLUMNS,
            DocumentKind::Testcases => TESTCASE_COLUMNS,
        }
    }

    pub fn rows_path(self) -> &'static str {
        match self {
            DocumentKind::FeatureList => "/drive/feature-list/rows",
            DocumentKind::Testcases => "/drive/testcases/rows",
        }
    }

    pub fn download_path(self) -> &'static str {
        match self {
            DocumentKind::FeatureList => "/drive/feature-list/download",
            DocumentKind::Testcases => "/drive/testcases/download",
        }
    }

    pub fn fallback_file_name(self) -> String {
        format!("{}_{}.xlsx", self.title(), Local::now().format("%Y%m%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_to_empty_strings() {
        let row: SheetRow = serde_json::from_str("{}").expect("empty object should deserialize");

        assert_eq!(row.major_category, "");
        assert_eq!(row.middle_category, "");
        assert!(row.payload.is_empty());
    }

    #[test]
    fn unknown_fields_are_preserved_across_a_round_trip() {
        let json = r#"{"majorCategory":"대1","middleCategory":"중1","scenario":"로그인","legacyNote":"유지"}"#;

        let row: SheetRow = serde_json::from_str(json).expect("row should deserialize");
        assert_eq!(row.major_category, "대1");
        assert_eq!(row.value(Field::Payload("scenario")), "로그인");
        assert_eq!(row.payload.get("legacyNote").map(String::as_str), Some("유지"));

        let back = serde_json::to_value(&row).expect("row should serialize");
        assert_eq!(back["majorCategory"], "대1");
        assert_eq!(back["legacyNote"], "유지");
    }

    #[test]
    fn empty_row_seeds_every_payload_column_of_the_kind() {
        let row = SheetRow::empty(DocumentKind::Testcases);

        assert_eq!(row.major_category, "");
        assert_eq!(row.middle_category, "");
        for column in DocumentKind::Testcases.columns() {
            if let Field::Payload(key) = column.field {
                assert_eq!(
                    row.payload.get(key).map(String::as_str),
                    Some(""),
                    "column {key} should be present and empty"
                );
            }
        }
    }

    #[test]
    fn set_value_routes_to_named_fields_and_payload() {
        let mut row = SheetRow::empty(DocumentKind::FeatureList);

        row.set_value(Field::MajorCategory, "대1");
        row.set_value(Field::MiddleCategory, " 중1 ");
        row.set_value(Field::Payload("featureDescription"), "목록 조회");

        assert_eq!(row.value(Field::MajorCategory), "대1");
        assert_eq!(row.value(Field::MiddleCategory), " 중1 ", "values are stored verbatim");
        assert_eq!(row.value(Field::Payload("featureDescription")), "목록 조회");
        assert_eq!(row.value(Field::Payload("unknownColumn")), "");
    }

    #[test]
    fn grouped_fields_are_exactly_the_two_category_columns() {
        for kind in [DocumentKind::FeatureList, DocumentKind::Testcases] {
            let grouped: Vec<_> = kind
                .columns()
                .iter()
                .filter(|column| column.field.is_grouped())
                .map(|column| column.label)
                .collect();
            assert_eq!(grouped, vec!["대분류", "중분류"]);
        }
    }

    #[test]
    fn fallback_file_name_carries_title_and_extension() {
        let name = DocumentKind::FeatureList.fallback_file_name();

        assert!(name.starts_with("기능리스트_"), "unexpected name: {name}");
        assert!(name.ends_with(".xlsx"), "unexpected name: {name}");
    }
}
