use serde::{Deserialize, Serialize};
use voya_catalog::Sku;

/// Participant category a SKU sells to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkuCategory {
    Adult,
    Child,
    Other,
}

/// Keyword tables driving SKU classification.
///
/// The defaults carry the production synonym sets including the Korean
/// terms. Counting "고등학생" (high-school student) as a child category is a
/// market policy default, not a rule; markets that price high-schoolers as
/// adults override the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub child_keywords: Vec<String>,
    pub adult_keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            child_keywords: [
                "child",
                "kid",
                "youth",
                "infant",
                "어린이",
                "아동",
                "소아",
                "유아",
                "청소년",
                "고등학생",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            adult_keywords: [
                "adult", "man", "woman", "성인", "대인", "어른", "남성", "여성",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl ClassifierConfig {
    /// Classify free text. Child keywords are tested before adult keywords.
    pub fn classify_text(&self, text: &str) -> SkuCategory {
        let haystack = text.to_lowercase();
        if self.matches(&self.child_keywords, &haystack) {
            return SkuCategory::Child;
        }
        if self.matches(&self.adult_keywords, &haystack) {
            return SkuCategory::Adult;
        }
        SkuCategory::Other
    }

    /// Classify a SKU over its concatenated spec/spec_ref/title/name text.
    pub fn classify(&self, sku: &Sku) -> SkuCategory {
        self.classify_text(&sku.search_text())
    }

    fn matches(&self, keywords: &[String], haystack: &str) -> bool {
        keywords
            .iter()
            .any(|keyword| haystack.contains(&keyword.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sku(value: serde_json::Value) -> Sku {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_keyword_buckets() {
        let config = ClassifierConfig::default();
        assert_eq!(
            config.classify(&sku(json!({"title": "Adult admission"}))),
            SkuCategory::Adult
        );
        assert_eq!(
            config.classify(&sku(json!({"name": "Child (ages 4-12)"}))),
            SkuCategory::Child
        );
        assert_eq!(
            config.classify(&sku(json!({"spec": "성인 1인"}))),
            SkuCategory::Adult
        );
        assert_eq!(
            config.classify(&sku(json!({"spec_ref": "어린이 입장권"}))),
            SkuCategory::Child
        );
        assert_eq!(
            config.classify(&sku(json!({"title": "고등학생"}))),
            SkuCategory::Child
        );
        assert_eq!(
            config.classify(&sku(json!({"title": "Standard package"}))),
            SkuCategory::Other
        );
    }

    #[test]
    fn test_child_tested_before_adult() {
        // "Adult + Child combo" style labels resolve to child
        let config = ClassifierConfig::default();
        assert_eq!(
            config.classify_text("adult & child family pass"),
            SkuCategory::Child
        );
    }

    #[test]
    fn test_case_insensitive() {
        let config = ClassifierConfig::default();
        assert_eq!(config.classify_text("YOUTH TICKET"), SkuCategory::Child);
        assert_eq!(config.classify_text("Woman spa entry"), SkuCategory::Adult);
    }

    #[test]
    fn test_custom_table_overrides_policy() {
        let config = ClassifierConfig {
            child_keywords: vec!["child".to_string()],
            adult_keywords: vec!["adult".to_string(), "고등학생".to_string()],
        };
        assert_eq!(config.classify_text("고등학생"), SkuCategory::Adult);
    }

    #[test]
    fn test_classification_over_concatenated_fields() {
        let config = ClassifierConfig::default();
        // No single field matches; the joined text does
        let sku = sku(json!({"spec": "입장권", "name": "소아"}));
        assert_eq!(config.classify(&sku), SkuCategory::Child);
    }
}
