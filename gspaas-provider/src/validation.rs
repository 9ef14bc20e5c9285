//! Validation - Check desired parameters against a template's schema
//!
//! Every applicable rule runs and every failure is collected, so a single
//! plan reports all problems at once.

use std::collections::HashMap;
use std::fmt;

use gspaas_core::resource::{Value, lookup_path};

use crate::catalog::{ParameterRule, RuleKind, TemplateDescriptor};

/// Type of a user-facing parameter attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    String,
    Int,
    /// Unordered collection of strings
    StringSet,
}

/// Link between a user attribute and the template parameter behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamMapping {
    /// Attribute path in the resource (dotted for nested blocks)
    pub attribute: &'static str,
    /// Parameter name in the template schema and the service payload
    pub parameter: &'static str,
    pub kind: ParamKind,
}

impl ParamMapping {
    pub const fn new(attribute: &'static str, parameter: &'static str, kind: ParamKind) -> Self {
        Self {
            attribute,
            parameter,
            kind,
        }
    }

    /// Payload value for a configured attribute; `None` on a type mismatch
    pub fn to_parameter(&self, value: &Value) -> Option<serde_json::Value> {
        match (self.kind, value) {
            (ParamKind::Bool, Value::Bool(b)) => Some(serde_json::Value::Bool(*b)),
            (ParamKind::String, Value::String(s)) => Some(serde_json::Value::String(s.clone())),
            (ParamKind::Int, Value::Int(n)) => Some(serde_json::Value::Number((*n).into())),
            (ParamKind::StringSet, Value::List(items)) => Some(serde_json::Value::Array(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(|s| serde_json::Value::String(s.to_string())))
                    .collect(),
            )),
            _ => None,
        }
    }

    /// Attribute value for a parameter echoed by the API
    ///
    /// Tolerates numbers and booleans the API serialises as strings.
    pub fn to_attribute(&self, json: &serde_json::Value) -> Option<Value> {
        match (self.kind, json) {
            (ParamKind::Bool, serde_json::Value::Bool(b)) => Some(Value::Bool(*b)),
            (ParamKind::Bool, serde_json::Value::String(s)) => s.parse().ok().map(Value::Bool),
            (ParamKind::Int, serde_json::Value::Number(n)) => n.as_i64().map(Value::Int),
            (ParamKind::Int, serde_json::Value::String(s)) => s.parse().ok().map(Value::Int),
            (ParamKind::String, serde_json::Value::String(s)) => Some(Value::String(s.clone())),
            (ParamKind::String, serde_json::Value::Number(n)) => Some(Value::String(n.to_string())),
            (ParamKind::StringSet, serde_json::Value::Array(items)) => Some(Value::List(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(|s| Value::String(s.to_string())))
                    .collect(),
            )),
            _ => None,
        }
    }
}

/// Plan-time checks shared by all PaaS kinds
///
/// The set is deliberately closed: release selection and the autoscaling
/// bound on `max_core_count`. Parameter rules are driven by the mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOption {
    /// Resolve (release, performance class) against the catalog
    Release,
    /// Check `max_core_count` against the template's autoscaling bounds
    MaxCoreCount,
}

/// Every rule violation found for one resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    messages: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.messages.extend(other.messages);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join("\n"))
    }
}

impl std::error::Error for ValidationErrors {}

/// Check every configured parameter that has a rule in the template
///
/// Absent attributes and parameters without a rule are not checked.
pub fn validate_parameters(
    attributes: &HashMap<String, Value>,
    descriptor: &TemplateDescriptor,
    mappings: &[ParamMapping],
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for mapping in mappings {
        let (Some(value), Some(rule)) = (
            lookup_path(attributes, mapping.attribute),
            descriptor.rule(mapping.parameter),
        ) else {
            continue;
        };
        match value {
            Value::List(items) if mapping.kind == ParamKind::StringSet => {
                for item in items {
                    check_rule(mapping.attribute, mapping.parameter, rule, item, &mut errors);
                }
            }
            _ => check_rule(mapping.attribute, mapping.parameter, rule, value, &mut errors),
        }
    }
    errors
}

fn check_rule(
    attribute: &str,
    parameter: &str,
    rule: &ParameterRule,
    value: &Value,
    errors: &mut ValidationErrors,
) {
    for constraint in &rule.constraints {
        check_constraint(attribute, parameter, rule, constraint, value, errors);
    }
}

fn check_constraint(
    attribute: &str,
    parameter: &str,
    rule: &ParameterRule,
    constraint: &RuleKind,
    value: &Value,
    errors: &mut ValidationErrors,
) {
    match constraint {
        RuleKind::Regex(re) => match scalar_text(value) {
            Some(text) if re.is_match(&text) => {}
            _ => errors.push(format!(
                "Invalid '{}' value. Example value: '{}'",
                attribute,
                rule.default_display()
            )),
        },
        RuleKind::InvalidPattern { reason, .. } => errors.push(format!(
            "Template parameter '{}' advertises an invalid pattern: {}",
            parameter, reason
        )),
        RuleKind::IntRange { min, max } => match value {
            Value::Int(n) if n >= min && n <= max => {}
            Value::Int(_) => errors.push(format!(
                "Invalid '{}' value. Value must stays between {} and {}",
                attribute, min, max
            )),
            _ => errors.push(format!(
                "Invalid '{}' value. Value must be an integer between {} and {}",
                attribute, min, max
            )),
        },
        RuleKind::AllowedSet(allowed) => {
            let matched = scalar_text(value).is_some_and(|text| allowed.contains(&text));
            if !matched {
                errors.push(format!(
                    "Invalid '{}' value. Value must be one of these:\n\t{}",
                    attribute,
                    allowed.join("\n\t")
                ));
            }
        }
    }
}

/// Text form of a scalar, as the API receives it
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Int(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Check `max_core_count` against the template's autoscaling bounds
pub fn validate_max_core_count(
    attributes: &HashMap<String, Value>,
    descriptor: &TemplateDescriptor,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if let (Some(Value::Int(cores)), Some(bounds)) =
        (attributes.get("max_core_count"), descriptor.autoscaling)
        && (*cores < bounds.min || *cores > bounds.max)
    {
        errors.push(format!(
            "Invalid 'max_core_count' value. Value must stays between {} and {}",
            bounds.min, bounds.max
        ));
    }
    errors
}

/// Payload parameters for every configured attribute in the table
pub fn build_parameters(
    attributes: &HashMap<String, Value>,
    mappings: &[ParamMapping],
) -> serde_json::Map<String, serde_json::Value> {
    mappings
        .iter()
        .filter_map(|m| {
            let value = lookup_path(attributes, m.attribute)?;
            m.to_parameter(value).map(|v| (m.parameter.to_string(), v))
        })
        .collect()
}
