//! Parameter schema - typed, machine-checkable tool parameters.
//!
//! A [`ParameterSchema`] is the contract a tool publishes. It serves three
//! consumers:
//!
//! - the router prompt (rendered as JSON Schema),
//! - validation of model-extracted parameters before any execution,
//! - auto-generated forms or docs (again via JSON Schema).
//!
//! Validation is strict: unknown fields are rejected, every violation is
//! reported at once, and the result is a normalised [`ToolParameters`]
//! value that tools can read without re-checking types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::ValidationError;

/// ISO calendar date format accepted for `Date` parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Type of a single tool parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// One of a fixed set of string literals.
    Enum(Vec<String>),
    StringList,
}

impl ParamType {
    /// Short human-readable type name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Date => "date (YYYY-MM-DD)",
            ParamType::Enum(_) => "enum",
            ParamType::StringList => "array of strings",
        }
    }

    fn json_schema(&self) -> Value {
        match self {
            ParamType::String => serde_json::json!({ "type": "string" }),
            ParamType::Integer => serde_json::json!({ "type": "integer" }),
            ParamType::Number => serde_json::json!({ "type": "number" }),
            ParamType::Boolean => serde_json::json!({ "type": "boolean" }),
            ParamType::Date => serde_json::json!({ "type": "string", "format": "date" }),
            ParamType::Enum(values) => serde_json::json!({ "type": "string", "enum": values }),
            ParamType::StringList => {
                serde_json::json!({ "type": "array", "items": { "type": "string" } })
            }
        }
    }
}

/// Specification of one named parameter.
///
/// `min`/`max` bound the value for numbers, the character count for
/// strings and the item count for lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ParamSpec {
    /// Creates a required parameter.
    pub fn required(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            description: description.into(),
            min: None,
            max: None,
        }
    }

    /// Creates an optional parameter.
    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    /// Sets an inclusive lower bound.
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Sets an inclusive upper bound.
    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    fn json_schema(&self) -> Value {
        let mut obj = match self.param_type.json_schema() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        obj.insert("description".into(), Value::String(self.description.clone()));

        let (min_key, max_key) = match self.param_type {
            ParamType::Integer | ParamType::Number => ("minimum", "maximum"),
            ParamType::StringList => ("minItems", "maxItems"),
            _ => ("minLength", "maxLength"),
        };
        if let Some(min) = self.min {
            obj.insert(min_key.into(), bound_to_json(min));
        }
        if let Some(max) = self.max {
            obj.insert(max_key.into(), bound_to_json(max));
        }
        Value::Object(obj)
    }

    fn check_bounds(&self, measured: f64, label: &str) -> Option<ValidationError> {
        let constraint = match (self.min, self.max) {
            (Some(min), Some(max)) if measured < min || measured > max => {
                format!("{} between {} and {}", label, min, max)
            }
            (Some(min), None) if measured < min => format!("{} >= {}", label, min),
            (None, Some(max)) if measured > max => format!("{} <= {}", label, max),
            _ => return None,
        };
        Some(ValidationError::out_of_range(&self.name, constraint, measured))
    }

    /// Checks one present, non-null value and returns its normalised form.
    fn check(&self, value: &Value) -> Result<Value, ValidationError> {
        let field = self.name.as_str();
        match &self.param_type {
            ParamType::String => {
                let s = expect_str(field, value, "string")?;
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::empty_field(field));
                }
                if let Some(err) = self.check_bounds(trimmed.chars().count() as f64, "length") {
                    return Err(err);
                }
                Ok(Value::String(trimmed.to_string()))
            }
            ParamType::Integer => {
                let n = match value {
                    Value::Number(n) if n.is_i64() => n.as_i64(),
                    Value::Number(n) => n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64),
                    _ => None,
                }
                .ok_or_else(|| ValidationError::invalid_type(field, "integer", type_name(value)))?;
                if let Some(err) = self.check_bounds(n as f64, "value") {
                    return Err(err);
                }
                Ok(Value::from(n))
            }
            ParamType::Number => {
                let n = value
                    .as_f64()
                    .ok_or_else(|| ValidationError::invalid_type(field, "number", type_name(value)))?;
                if let Some(err) = self.check_bounds(n, "value") {
                    return Err(err);
                }
                Ok(value.clone())
            }
            ParamType::Boolean => value
                .as_bool()
                .map(Value::Bool)
                .ok_or_else(|| ValidationError::invalid_type(field, "boolean", type_name(value))),
            ParamType::Date => {
                let s = expect_str(field, value, "date")?;
                let date = NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| {
                    ValidationError::invalid_format(field, format!("expected YYYY-MM-DD, got '{}'", s))
                })?;
                Ok(Value::String(date.format(DATE_FORMAT).to_string()))
            }
            ParamType::Enum(allowed) => {
                let s = expect_str(field, value, "string")?;
                allowed
                    .iter()
                    .find(|candidate| candidate.eq_ignore_ascii_case(s.trim()))
                    .map(|canonical| Value::String(canonical.clone()))
                    .ok_or_else(|| ValidationError::not_allowed(field, allowed, s))
            }
            ParamType::StringList => {
                let items = value.as_array().ok_or_else(|| {
                    ValidationError::invalid_type(field, "array of strings", type_name(value))
                })?;
                let mut normalised = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str().map(str::trim) {
                        Some(s) if !s.is_empty() => normalised.push(Value::String(s.to_string())),
                        Some(_) => return Err(ValidationError::empty_field(field)),
                        None => {
                            return Err(ValidationError::invalid_type(
                                field,
                                "array of strings",
                                format!("array containing {}", type_name(item)),
                            ))
                        }
                    }
                }
                if let Some(err) = self.check_bounds(normalised.len() as f64, "item count") {
                    return Err(err);
                }
                Ok(Value::Array(normalised))
            }
        }
    }
}

/// The full parameter contract of a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    fields: Vec<ParamSpec>,
    /// Pairs of date fields where the first must not be after the second.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ordered_dates: Vec<(String, String)>,
}

impl ParameterSchema {
    /// Creates an empty schema (a tool with no parameters).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter.
    pub fn field(mut self, spec: ParamSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Requires `start <= end` whenever both date fields are present.
    pub fn ordered_dates(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.ordered_dates.push((start.into(), end.into()));
        self
    }

    /// Returns all parameter specs in declaration order.
    pub fn fields(&self) -> &[ParamSpec] {
        &self.fields
    }

    /// Looks up a parameter spec by name.
    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Renders the schema as a JSON Schema object.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }

    /// Validates raw (typically model-extracted) parameters.
    ///
    /// `null` is treated as an empty object. Optional fields set to `null`
    /// are treated as absent.
    pub fn validate(&self, raw: &Value) -> Result<ToolParameters, ValidationError> {
        let empty = Map::new();
        let input = match raw {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(ValidationError::invalid_type(
                    "parameters",
                    "object",
                    type_name(other),
                ))
            }
        };

        let mut errors = Vec::new();

        for key in input.keys() {
            if self.get(key).is_none() {
                errors.push(ValidationError::unknown_field(key.clone()));
            }
        }

        let mut values = Map::new();
        for spec in &self.fields {
            match input.get(&spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        errors.push(ValidationError::missing(&spec.name));
                    }
                }
                Some(value) => match spec.check(value) {
                    Ok(normalised) => {
                        values.insert(spec.name.clone(), normalised);
                    }
                    Err(err) => errors.push(err),
                },
            }
        }

        for (start, end) in &self.ordered_dates {
            let parse = |name: &str| {
                values
                    .get(name)
                    .and_then(Value::as_str)
                    .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
            };
            if let (Some(s), Some(e)) = (parse(start), parse(end)) {
                if s > e {
                    errors.push(ValidationError::out_of_range(
                        end.clone(),
                        format!("must not be before {} ({})", start, s),
                        e,
                    ));
                }
            }
        }

        match ValidationError::combine(errors) {
            Some(err) => Err(err),
            None => Ok(ToolParameters(values)),
        }
    }
}

/// Parameters that passed schema validation.
///
/// Only [`ParameterSchema::validate`] produces values of this type, so a
/// tool holding one can rely on types, bounds and required fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolParameters(Map<String, Value>);

impl ToolParameters {
    /// Returns the raw value of a parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Returns a date parameter as a calendar date.
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.str(name)
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
    }

    /// Returns a list parameter, empty when absent.
    pub fn string_list(&self, name: &str) -> Vec<&str> {
        self.get(name)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns the parameters as a JSON object value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn expect_str<'a>(field: &str, value: &'a Value, expected: &str) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| ValidationError::invalid_type(field, expected, type_name(value)))
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

fn bound_to_json(bound: f64) -> Value {
    if bound.fract() == 0.0 {
        Value::from(bound as i64)
    } else {
        Value::from(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn blueprint_schema() -> ParameterSchema {
        ParameterSchema::new()
            .field(ParamSpec::required(
                "description",
                ParamType::String,
                "What the blueprint depicts",
            ))
            .field(ParamSpec::optional("start_date", ParamType::Date, "Earliest date"))
            .field(ParamSpec::optional("end_date", ParamType::Date, "Latest date"))
            .field(
                ParamSpec::optional("limit", ParamType::Integer, "Max results")
                    .with_min(1.0)
                    .with_max(50.0),
            )
            .ordered_dates("start_date", "end_date")
    }

    #[test]
    fn valid_parameters_are_normalised() {
        let params = blueprint_schema()
            .validate(&json!({
                "description": "  city hall blueprints ",
                "start_date": "2010-01-01",
                "end_date": "2010-12-31",
                "limit": 5.0
            }))
            .unwrap();

        assert_eq!(params.str("description"), Some("city hall blueprints"));
        assert_eq!(params.i64("limit"), Some(5));
        assert_eq!(
            params.date("end_date"),
            NaiveDate::from_ymd_opt(2010, 12, 31)
        );
    }

    #[test]
    fn null_input_is_empty_object() {
        let err = blueprint_schema().validate(&Value::Null).unwrap_err();
        assert_eq!(err, ValidationError::missing("description"));
    }

    #[test]
    fn non_object_input_is_rejected() {
        let err = blueprint_schema().validate(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidType { .. }));
    }

    #[test]
    fn all_violations_are_reported_together() {
        let err = blueprint_schema()
            .validate(&json!({
                "start_date": "January 2010",
                "limit": 500,
                "color": "blue"
            }))
            .unwrap_err();

        let violations = err.violations();
        assert_eq!(violations.len(), 4);
        assert!(violations
            .iter()
            .any(|v| matches!(v, ValidationError::UnknownField { field } if field == "color")));
        assert!(violations
            .iter()
            .any(|v| matches!(v, ValidationError::MissingRequired { field } if field == "description")));
        assert!(violations
            .iter()
            .any(|v| matches!(v, ValidationError::InvalidFormat { field, .. } if field == "start_date")));
        assert!(violations
            .iter()
            .any(|v| matches!(v, ValidationError::OutOfRange { field, .. } if field == "limit")));
    }

    #[test]
    fn reversed_date_range_is_rejected() {
        let err = blueprint_schema()
            .validate(&json!({
                "description": "bridge",
                "start_date": "2012-01-01",
                "end_date": "2010-01-01"
            }))
            .unwrap_err();

        assert_eq!(err.field(), Some("end_date"));
    }

    #[test]
    fn optional_null_is_treated_as_absent() {
        let params = blueprint_schema()
            .validate(&json!({ "description": "bridge", "start_date": null }))
            .unwrap();
        assert!(params.get("start_date").is_none());
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn empty_string_is_rejected() {
        let err = blueprint_schema()
            .validate(&json!({ "description": "   " }))
            .unwrap_err();
        assert_eq!(err, ValidationError::empty_field("description"));
    }

    #[test]
    fn enum_matches_case_insensitively_and_canonicalises() {
        let schema = ParameterSchema::new().field(ParamSpec::required(
            "table",
            ParamType::Enum(vec!["contracts".into(), "permits".into()]),
            "Table to search",
        ));

        let params = schema.validate(&json!({ "table": "Contracts" })).unwrap();
        assert_eq!(params.str("table"), Some("contracts"));

        let err = schema.validate(&json!({ "table": "people" })).unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { .. }));
    }

    #[test]
    fn string_list_rejects_non_strings() {
        let schema = ParameterSchema::new().field(ParamSpec::required(
            "tags",
            ParamType::StringList,
            "Tags",
        ));

        assert!(schema.validate(&json!({ "tags": ["a", 1] })).is_err());
        let params = schema.validate(&json!({ "tags": [" a ", "b"] })).unwrap();
        assert_eq!(params.string_list("tags"), vec!["a", "b"]);
    }

    #[test]
    fn json_schema_lists_properties_and_required() {
        let schema = blueprint_schema().to_json_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"], json!(["description"]));
        assert_eq!(schema["properties"]["start_date"]["format"], "date");
        assert_eq!(schema["properties"]["limit"]["minimum"], 1);
        assert_eq!(schema["properties"]["limit"]["maximum"], 50);
    }

    #[test]
    fn schema_round_trips_through_serde() {
        let schema = blueprint_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let back: ParameterSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, back);
    }

    proptest! {
        #[test]
        fn integer_bounds_are_enforced(n in -1000i64..1000) {
            let result = blueprint_schema().validate(&json!({ "description": "x", "limit": n }));
            prop_assert_eq!(result.is_ok(), (1..=50).contains(&n));
        }

        #[test]
        fn unknown_fields_never_validate(key in "[a-z]{3,12}") {
            prop_assume!(!["description", "start_date", "end_date", "limit"].contains(&key.as_str()));
            let mut raw = serde_json::Map::new();
            raw.insert("description".into(), json!("x"));
            raw.insert(key, json!("value"));
            prop_assert!(blueprint_schema().validate(&Value::Object(raw)).is_err());
        }
    }
}
