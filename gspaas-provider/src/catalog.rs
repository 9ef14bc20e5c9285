//! Catalog - Typed view of the PaaS template list
//!
//! The catalog is fetched once per operation and never cached, so template
//! changes on the provider side are visible on the next plan.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;

use crate::api::{CoreBounds, ParameterSchema, PaasTemplate};
use crate::client::{ApiResult, PaasApi};
use crate::flavour::Flavour;
use crate::timeouts::with_deadline;

/// One constraint a template places on a parameter
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// The value must match the pattern
    Regex(Regex),
    /// The template advertised a pattern that does not compile
    InvalidPattern { pattern: String, reason: String },
    /// The value must lie within the inclusive bounds
    IntRange { min: i64, max: i64 },
    /// The value must be one of the listed values
    AllowedSet(Vec<String>),
}

impl RuleKind {
    pub fn regex(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(re) => RuleKind::Regex(re),
            Err(e) => RuleKind::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            },
        }
    }
}

impl PartialEq for RuleKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuleKind::Regex(a), RuleKind::Regex(b)) => a.as_str() == b.as_str(),
            (
                RuleKind::InvalidPattern { pattern: a, .. },
                RuleKind::InvalidPattern { pattern: b, .. },
            ) => a == b,
            (
                RuleKind::IntRange { min: a, max: b },
                RuleKind::IntRange { min: c, max: d },
            ) => a == c && b == d,
            (RuleKind::AllowedSet(a), RuleKind::AllowedSet(b)) => a == b,
            _ => false,
        }
    }
}

/// Every constraint a template advertises for one parameter
///
/// An empty constraint list means the parameter is described but not
/// constrained.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRule {
    pub constraints: Vec<RuleKind>,
    pub default: Option<serde_json::Value>,
}

impl ParameterRule {
    pub fn new(constraints: Vec<RuleKind>, default: Option<serde_json::Value>) -> Self {
        Self {
            constraints,
            default,
        }
    }

    /// Default value rendered for messages
    pub fn default_display(&self) -> String {
        match &self.default {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

impl From<&ParameterSchema> for ParameterRule {
    fn from(schema: &ParameterSchema) -> Self {
        let mut constraints = Vec::new();
        if let Some(allowed) = &schema.allowed
            && !allowed.is_empty()
        {
            constraints.push(RuleKind::AllowedSet(allowed.clone()));
        }
        if let Some(pattern) = &schema.regex
            && !pattern.is_empty()
        {
            constraints.push(RuleKind::regex(pattern));
        }
        if schema.min.is_some() || schema.max.is_some() {
            constraints.push(RuleKind::IntRange {
                min: schema.min.unwrap_or(i64::MIN),
                max: schema.max.unwrap_or(i64::MAX),
            });
        }
        Self::new(constraints, schema.default.clone())
    }
}

/// Immutable snapshot of one catalog template
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDescriptor {
    pub uuid: String,
    pub flavour: Flavour,
    pub release: String,
    pub performance_class: String,
    pub autoscaling: Option<CoreBounds>,
    pub parameters: HashMap<String, ParameterRule>,
}

impl TemplateDescriptor {
    /// Convert a raw template; `None` for flavours this provider does not manage
    pub fn from_template(template: &PaasTemplate) -> Option<Self> {
        let flavour = template.flavour.parse::<Flavour>().ok()?;
        Some(Self {
            uuid: template.object_uuid.clone(),
            flavour,
            release: template.release.clone(),
            performance_class: template.performance_class.clone(),
            autoscaling: template.autoscaling.map(|a| a.cores),
            parameters: template
                .parameters_schema
                .iter()
                .map(|(name, schema)| {
                    let rule = ParameterRule::from(schema);
                    for constraint in &rule.constraints {
                        if let RuleKind::InvalidPattern { pattern, reason } = constraint {
                            log::warn!(
                                "template {} advertises an invalid pattern '{}' for '{}': {}",
                                template.object_uuid,
                                pattern,
                                name,
                                reason
                            );
                        }
                    }
                    (name.clone(), rule)
                })
                .collect(),
        })
    }

    pub fn rule(&self, parameter: &str) -> Option<&ParameterRule> {
        self.parameters.get(parameter)
    }
}

/// List every template the provider can work with
pub async fn fetch(api: &dyn PaasApi, deadline: Duration) -> ApiResult<Vec<TemplateDescriptor>> {
    let templates = with_deadline(deadline, api.get_paas_template_list()).await?;
    let descriptors: Vec<TemplateDescriptor> = templates
        .iter()
        .filter_map(|t| {
            let descriptor = TemplateDescriptor::from_template(t);
            if descriptor.is_none() {
                log::debug!(
                    "skipping template {} with unmanaged flavour '{}'",
                    t.object_uuid,
                    t.flavour
                );
            }
            descriptor
        })
        .collect();
    log::debug!("fetched {} PaaS templates", descriptors.len());
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Autoscaling;

    fn schema() -> ParameterSchema {
        ParameterSchema::default()
    }

    #[test]
    fn rule_keeps_each_advertised_constraint() {
        let allowed = ParameterSchema {
            allowed: Some(vec!["ROW".to_string()]),
            ..schema()
        };
        assert_eq!(
            ParameterRule::from(&allowed).constraints,
            vec![RuleKind::AllowedSet(vec!["ROW".to_string()])]
        );

        let regex = ParameterSchema {
            regex: Some("^[0-9]+M$".to_string()),
            default: Some(serde_json::json!("64M")),
            ..schema()
        };
        let rule = ParameterRule::from(&regex);
        assert_eq!(rule.constraints, vec![RuleKind::regex("^[0-9]+M$")]);
        assert_eq!(rule.default_display(), "64M");

        let range = ParameterSchema {
            min: Some(1),
            ..schema()
        };
        assert_eq!(
            ParameterRule::from(&range).constraints,
            vec![RuleKind::IntRange {
                min: 1,
                max: i64::MAX
            }]
        );

        let empty = ParameterSchema {
            allowed: Some(vec![]),
            regex: Some(String::new()),
            ..schema()
        };
        assert!(ParameterRule::from(&empty).constraints.is_empty());
    }

    #[test]
    fn integer_rule_with_pattern_keeps_its_range() {
        let both = ParameterSchema {
            param_type: Some("integer".to_string()),
            regex: Some("^[0-9]+$".to_string()),
            min: Some(1),
            max: Some(10),
            ..schema()
        };
        assert_eq!(
            ParameterRule::from(&both).constraints,
            vec![
                RuleKind::regex("^[0-9]+$"),
                RuleKind::IntRange { min: 1, max: 10 },
            ]
        );
    }

    #[test]
    fn invalid_pattern_is_compiled_once_into_the_rule() {
        let broken = ParameterSchema {
            regex: Some("([".to_string()),
            ..schema()
        };
        let rule = ParameterRule::from(&broken);
        assert!(matches!(
            rule.constraints.as_slice(),
            [RuleKind::InvalidPattern { pattern, .. }] if pattern == "(["
        ));
    }

    #[test]
    fn descriptor_skips_unknown_flavours() {
        let mut template = PaasTemplate {
            object_uuid: "tpl-1".to_string(),
            name: "MariaDB 10.5".to_string(),
            flavour: "mariadb".to_string(),
            release: "10.5".to_string(),
            performance_class: "standard".to_string(),
            parameters_schema: HashMap::new(),
            autoscaling: Some(Autoscaling {
                cores: CoreBounds { min: 1, max: 8 },
            }),
        };
        let descriptor = TemplateDescriptor::from_template(&template).unwrap();
        assert_eq!(descriptor.flavour, Flavour::MariaDb);
        assert_eq!(descriptor.autoscaling, Some(CoreBounds { min: 1, max: 8 }));

        template.flavour = "tomcat".to_string();
        assert!(TemplateDescriptor::from_template(&template).is_none());
    }
}
