//! Structural schema validation for upstream payloads
//!
//! A `Schema` is a small declarative tree (objects, arrays, primitives,
//! nullables and unions) checked against an untyped `serde_json::Value`.
//! Acceptance is all-or-nothing: a document with any issue is rejected as a
//! whole, and only a clean document is turned into typed models.
//!
//! Objects ignore keys they do not declare. Optional fields may be absent but
//! not `null`; use `Schema::Nullable` where `null` is part of the contract.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::error::ProxyError;
use crate::models::HoroscopeApiResponse;

pub mod contract;

pub use contract::horoscope_api_response_schema;

#[derive(Debug, Clone)]
pub enum Schema {
    String,
    Number,
    Boolean,
    Array(Box<Schema>),
    Object(Vec<Field>),
    Nullable(Box<Schema>),
    Union(Vec<Schema>),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub schema: Schema,
    pub required: bool,
}

pub fn required(name: &'static str, schema: Schema) -> Field {
    Field {
        name,
        schema,
        required: true,
    }
}

pub fn optional(name: &'static str, schema: Schema) -> Field {
    Field {
        name,
        schema,
        required: false,
    }
}

pub fn object(fields: Vec<Field>) -> Schema {
    Schema::Object(fields)
}

pub fn array_of(items: Schema) -> Schema {
    Schema::Array(Box::new(items))
}

pub fn nullable(inner: Schema) -> Schema {
    Schema::Nullable(Box::new(inner))
}

/// One structural violation, addressed by a dotted path such as
/// `data.personal.transits_top[0].explanation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "(root)" } else { &self.path };
        write!(f, "{}: {}", path, self.reason)
    }
}

impl Schema {
    /// Every issue found in `value`; empty means the value conforms.
    pub fn check(&self, value: &Value) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();
        self.check_at(value, "", &mut issues);
        issues
    }

    fn check_at(&self, value: &Value, path: &str, issues: &mut Vec<SchemaIssue>) {
        match (self, value) {
            (Schema::String, Value::String(_))
            | (Schema::Number, Value::Number(_))
            | (Schema::Boolean, Value::Bool(_)) => {}

            (Schema::Nullable(_), Value::Null) => {}
            (Schema::Nullable(inner), _) => inner.check_at(value, path, issues),

            (Schema::Array(items), Value::Array(elements)) => {
                for (i, element) in elements.iter().enumerate() {
                    items.check_at(element, &format!("{}[{}]", path, i), issues);
                }
            }

            (Schema::Object(fields), Value::Object(map)) => {
                for field in fields {
                    let child = child_path(path, field.name);
                    match map.get(field.name) {
                        Some(v) => field.schema.check_at(v, &child, issues),
                        None if field.required => issues.push(SchemaIssue {
                            path: child,
                            reason: format!("required {} is missing", field.schema.describe()),
                        }),
                        None => {}
                    }
                }
            }

            (Schema::Union(variants), _) => {
                let matched = variants.iter().any(|variant| {
                    let mut scratch = Vec::new();
                    variant.check_at(value, path, &mut scratch);
                    scratch.is_empty()
                });

                if !matched {
                    issues.push(SchemaIssue {
                        path: path.to_string(),
                        reason: format!("matched no variant of {}", self.describe()),
                    });
                }
            }

            _ => issues.push(SchemaIssue {
                path: path.to_string(),
                reason: format!(
                    "expected {}, received {}",
                    self.describe(),
                    type_name(value)
                ),
            }),
        }
    }

    /// Human-readable type, used in issue reasons
    pub fn describe(&self) -> String {
        match self {
            Schema::String => "string".to_string(),
            Schema::Number => "number".to_string(),
            Schema::Boolean => "boolean".to_string(),
            Schema::Array(_) => "array".to_string(),
            Schema::Object(_) => "object".to_string(),
            Schema::Nullable(inner) => format!("{} | null", inner.describe()),
            Schema::Union(variants) => variants
                .iter()
                .map(Schema::describe)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//
// ================= Horoscope Response =================
//

/// Outcome of validating an upstream horoscope document
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid(Box<HoroscopeApiResponse>),
    Invalid(Vec<SchemaIssue>),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    pub fn into_result(self) -> crate::Result<HoroscopeApiResponse> {
        match self {
            Validation::Valid(response) => Ok(*response),
            Validation::Invalid(issues) => Err(ProxyError::ContractViolation(issues)),
        }
    }
}

/// Check `value` against the horoscope contract and build the typed response.
///
/// Pure; never panics on arbitrary input.
pub fn validate_response(value: &Value) -> Validation {
    let issues = horoscope_api_response_schema().check(value);
    if !issues.is_empty() {
        debug!(issue_count = issues.len(), "Horoscope document rejected");
        return Validation::Invalid(issues);
    }

    match serde_json::from_value::<HoroscopeApiResponse>(value.clone()) {
        Ok(response) => Validation::Valid(Box::new(response)),
        Err(e) => Validation::Invalid(vec![SchemaIssue {
            path: String::new(),
            reason: format!("conforming document failed to decode: {}", e),
        }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_response;
    use serde_json::json;

    fn point_schema() -> Schema {
        object(vec![
            required("x", Schema::Number),
            optional("label", Schema::String),
            required("note", nullable(Schema::String)),
        ])
    }

    #[test]
    fn test_object_fields() {
        let schema = point_schema();

        assert!(schema.check(&json!({"x": 1, "note": null})).is_empty());
        assert!(schema
            .check(&json!({"x": 1.5, "label": "a", "note": "n", "extra": [1, 2]}))
            .is_empty());

        let issues = schema.check(&json!({"label": "a"}));
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].path, "x");
        assert_eq!(issues[1].path, "note");
    }

    #[test]
    fn test_optional_field_rejects_null() {
        let issues = point_schema().check(&json!({"x": 1, "label": null, "note": null}));
        assert_eq!(
            issues,
            vec![SchemaIssue {
                path: "label".into(),
                reason: "expected string, received null".into(),
            }]
        );
    }

    #[test]
    fn test_array_paths() {
        let schema = object(vec![required("points", array_of(point_schema()))]);
        let issues = schema.check(&json!({
            "points": [{"x": 1, "note": null}, {"x": "2", "note": null}]
        }));

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "points[1].x");
        assert_eq!(issues[0].to_string(), "points[1].x: expected number, received string");
    }

    #[test]
    fn test_union() {
        let schema = Schema::Union(vec![
            Schema::String,
            object(vec![required("main", Schema::String)]),
        ]);

        assert!(schema.check(&json!("plain")).is_empty());
        assert!(schema.check(&json!({"main": "structured"})).is_empty());

        let issues = schema.check(&json!({"supporting": []}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].reason, "matched no variant of string | object");
        assert_eq!(issues[0].to_string(), "(root): matched no variant of string | object");
    }

    #[test]
    fn test_sample_response_is_valid() {
        let validation = validate_response(&sample_response());
        let response = validation.into_result().unwrap();

        assert_eq!(response.data.sign, "aries");
        assert_eq!(response.data.scores.love, 72.0);
        assert_eq!(response.meta.engine.name, "astro-engine");
        let personal = response.data.personal.unwrap();
        assert_eq!(personal.transits_top.len(), 2);
        assert_eq!(personal.transits_top[1].exact_at, None);
    }

    #[test]
    fn test_missing_love_score_rejects_document() {
        let mut doc = sample_response();
        doc["data"]["scores"]
            .as_object_mut()
            .unwrap()
            .remove("love");

        match validate_response(&doc) {
            Validation::Invalid(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].path, "data.scores.love");
            }
            Validation::Valid(_) => panic!("document without data.scores.love accepted"),
        }
    }

    #[test]
    fn test_nested_type_error_rejects_document() {
        let mut doc = sample_response();
        doc["data"]["astro"]["highlights"][0]["label"] = json!(42);

        let issues = match validate_response(&doc) {
            Validation::Invalid(issues) => issues,
            Validation::Valid(_) => panic!("accepted"),
        };
        assert_eq!(issues[0].path, "data.astro.highlights[0].label");
    }

    #[test]
    fn test_explanation_union() {
        let mut doc = sample_response();
        doc["data"]["personal"]["transits_top"][0]["explanation"] = json!("Plain text");
        assert!(validate_response(&doc).is_valid());

        doc["data"]["personal"]["transits_top"][0]["explanation"] =
            json!({"main": "Structured", "supporting": ["one", "two"]});
        assert!(validate_response(&doc).is_valid());

        doc["data"]["personal"]["transits_top"][0]["explanation"] = json!(7);
        let issues = match validate_response(&doc) {
            Validation::Invalid(issues) => issues,
            Validation::Valid(_) => panic!("numeric explanation accepted"),
        };
        assert_eq!(issues[0].path, "data.personal.transits_top[0].explanation");
    }

    #[test]
    fn test_exact_at_must_be_present_but_may_be_null() {
        let mut doc = sample_response();
        doc["data"]["personal"]["transits_top"][0]["exact_at"] = json!(null);
        assert!(validate_response(&doc).is_valid());

        doc["data"]["personal"]["transits_top"][0]
            .as_object_mut()
            .unwrap()
            .remove("exact_at");
        assert!(!validate_response(&doc).is_valid());
    }

    #[test]
    fn test_scores_are_not_range_checked() {
        let mut doc = sample_response();
        doc["data"]["scores"]["career"] = json!(150);
        doc["data"]["scores"]["money"] = json!(-3.5);
        assert!(validate_response(&doc).is_valid());
    }

    #[test]
    fn test_optional_blocks_may_be_absent() {
        let mut doc = sample_response();
        let data = doc["data"].as_object_mut().unwrap();
        data.remove("personal");
        data["scores"].as_object_mut().unwrap().remove("overall");
        data["content"].as_object_mut().unwrap().remove("do");

        let response = validate_response(&doc).into_result().unwrap();
        assert!(response.data.personal.is_none());
        assert!(response.data.scores.overall.is_none());
        assert!(response.data.content.dos.is_none());
    }

    #[test]
    fn test_non_object_documents() {
        for doc in [json!(null), json!([]), json!("ok"), json!({"data": {}})] {
            assert!(!validate_response(&doc).is_valid(), "{} accepted", doc);
        }
    }
}
