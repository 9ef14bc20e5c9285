//! PaaS service kinds
//!
//! Every PaaS kind shares the same lifecycle and common attributes. What
//! differs per kind is declared in a [`PaasKind`]: the flavour it resolves
//! templates for, the parameter mapping table, plan-time checks and timeouts.

use std::collections::HashMap;

use gspaas_core::resource::{Resource, Value, insert_path};
use gspaas_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use thiserror::Error;

use crate::api::{
    Network, PaasService, ResourceLimit, ServiceCreateRequest, ServiceUpdateRequest,
};
use crate::catalog::TemplateDescriptor;
use crate::flavour::Flavour;
use crate::index::TemplateIndex;
use crate::resolver::{ResolveError, resolve};
use crate::timeouts::Timeouts;
use crate::utils::{format_time, labels_from_value, labels_to_value, listen_ports_to_value};
use crate::validation::{
    ParamKind, ParamMapping, ValidationErrors, ValidationOption, validate_max_core_count,
    validate_parameters,
};

/// Additional plan-time check for a kind
pub type ExtraCheck = fn(&HashMap<String, Value>, &TemplateDescriptor, &mut ValidationErrors);

/// Configuration of a PaaS resource kind
pub struct PaasKind {
    /// Host resource type name (e.g., "gridscale_mariadb")
    pub resource_type: &'static str,
    pub flavour: Flavour,
    /// Noun used in error messages (e.g., "MariaDB service")
    pub label: &'static str,
    pub parameters: &'static [ParamMapping],
    pub validation: &'static [ValidationOption],
    pub checks: &'static [ExtraCheck],
    pub timeouts: Timeouts,
    /// Kind-specific schema adjustments applied after the derived attributes
    pub customize: fn(ResourceSchema) -> ResourceSchema,
}

pub fn no_customization(schema: ResourceSchema) -> ResourceSchema {
    schema
}

/// Why a desired configuration cannot be planned
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("{0}")]
    Selection(#[from] ResolveError),

    #[error("{0}")]
    Parameters(#[from] ValidationErrors),
}

impl PaasKind {
    /// Attribute schema: common PaaS attributes, then the parameter table
    pub fn schema(&self) -> ResourceSchema {
        let mut schema = common_schema(self.resource_type);

        let mut blocks: Vec<(&str, Vec<AttributeSchema>)> = Vec::new();
        for mapping in self.parameters {
            let attr_type = match mapping.kind {
                ParamKind::Bool => AttributeType::Bool,
                ParamKind::Int => AttributeType::Int,
                ParamKind::String => AttributeType::String,
                ParamKind::StringSet => types::string_set(),
            };
            match mapping.attribute.split_once('.') {
                None => {
                    schema = schema.attribute(AttributeSchema::new(mapping.attribute, attr_type));
                }
                Some((block, field)) => {
                    let inner = AttributeSchema::new(field, attr_type);
                    match blocks.iter_mut().find(|(name, _)| *name == block) {
                        Some((_, fields)) => fields.push(inner),
                        None => blocks.push((block, vec![inner])),
                    }
                }
            }
        }
        for (block, fields) in blocks {
            schema = schema.attribute(AttributeSchema::new(block, AttributeType::Block(fields)));
        }

        (self.customize)(schema)
    }

    /// Resolve the template and run every parameter check against it
    ///
    /// Selection errors are reported alone since parameters can only be
    /// checked against a resolved template.
    pub fn check<'a>(
        &self,
        attributes: &HashMap<String, Value>,
        catalog: &'a [TemplateDescriptor],
    ) -> Result<&'a TemplateDescriptor, CheckError> {
        let descriptor = self.resolve(attributes, catalog)?;

        let mut errors = validate_parameters(attributes, descriptor, self.parameters);
        if self.validation.contains(&ValidationOption::MaxCoreCount) {
            errors.extend(validate_max_core_count(attributes, descriptor));
        }
        for check in self.checks {
            check(attributes, descriptor, &mut errors);
        }
        errors.into_result()?;
        Ok(descriptor)
    }

    /// The template selected by the `release` and `performance_class` attributes
    pub fn resolve<'a>(
        &self,
        attributes: &HashMap<String, Value>,
        catalog: &'a [TemplateDescriptor],
    ) -> Result<&'a TemplateDescriptor, ResolveError> {
        let release = attributes
            .get("release")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let class = attributes
            .get("performance_class")
            .and_then(Value::as_str)
            .unwrap_or_default();
        resolve(catalog, self.flavour, release, class)
    }

    /// Payload for creating the service
    ///
    /// A network UUID takes precedence: the API rejects a create that binds
    /// both a network and a security zone.
    pub fn build_create_request(
        &self,
        resource: &Resource,
        template_uuid: &str,
    ) -> ServiceCreateRequest {
        let network_uuid = non_empty(resource.get_str("network_uuid"));
        let paas_security_zone_uuid = match network_uuid {
            Some(_) => None,
            None => non_empty(resource.get_str("security_zone_uuid")),
        };

        ServiceCreateRequest {
            name: resource.get_str("name").unwrap_or_default().to_string(),
            paas_service_template_uuid: template_uuid.to_string(),
            labels: labels_from_value(resource.get("labels")),
            parameters: self.build_parameters(&resource.attributes),
            resource_limits: resource_limits(resource),
            paas_security_zone_uuid,
            network_uuid,
        }
    }

    /// Payload for updating the service
    ///
    /// `template_uuid` is only set when the release or performance class changed.
    pub fn build_update_request(
        &self,
        resource: &Resource,
        template_uuid: Option<&str>,
    ) -> ServiceUpdateRequest {
        ServiceUpdateRequest {
            name: resource.get_str("name").unwrap_or_default().to_string(),
            labels: labels_from_value(resource.get("labels")),
            parameters: self.build_parameters(&resource.attributes),
            resource_limits: resource_limits(resource),
            paas_service_template_uuid: template_uuid.map(String::from),
        }
    }

    fn build_parameters(
        &self,
        attributes: &HashMap<String, Value>,
    ) -> serde_json::Map<String, serde_json::Value> {
        crate::validation::build_parameters(attributes, self.parameters)
    }

    /// Host state attributes for a service
    ///
    /// Release and performance class come from the catalog entry of the
    /// service's template. The network of a service bound through a security
    /// zone is attributed separately, see [`attribute_network`].
    pub fn service_attributes(
        &self,
        service: &PaasService,
        catalog: &[TemplateDescriptor],
    ) -> HashMap<String, Value> {
        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), Value::String(service.name.clone()));
        attributes.insert("labels".to_string(), labels_to_value(&service.labels));
        attributes.insert(
            "service_template_uuid".to_string(),
            Value::String(service.service_template_uuid.clone()),
        );
        attributes.insert("status".to_string(), Value::String(service.status.clone()));
        attributes.insert(
            "create_time".to_string(),
            Value::String(format_time(&service.create_time)),
        );
        attributes.insert(
            "change_time".to_string(),
            Value::String(format_time(&service.change_time)),
        );
        attributes.insert(
            "listen_port".to_string(),
            listen_ports_to_value(&service.listen_ports),
        );

        match TemplateIndex::new(catalog, self.flavour).by_uuid(&service.service_template_uuid) {
            Some(template) => {
                attributes.insert("release".to_string(), Value::String(template.release.clone()));
                attributes.insert(
                    "performance_class".to_string(),
                    Value::String(template.performance_class.clone()),
                );
            }
            None => log::warn!(
                "template {} of service {} is not in the {} catalog",
                service.service_template_uuid,
                service.object_uuid,
                self.flavour
            ),
        }

        if let Some(credential) = service.credentials.first() {
            attributes.insert(
                "username".to_string(),
                Value::String(credential.username.clone()),
            );
            attributes.insert(
                "password".to_string(),
                Value::String(credential.password.clone()),
            );
            if self.flavour == Flavour::Kubernetes
                && let Some(kube_config) = &credential.kube_config
            {
                attributes.insert("kubeconfig".to_string(), Value::String(kube_config.clone()));
            }
        }

        if let Some(limit) = service
            .resource_limits
            .iter()
            .find(|l| l.resource == ResourceLimit::CORES)
        {
            attributes.insert("max_core_count".to_string(), Value::Int(limit.limit));
        }

        if let Some(zone) = non_empty(service.security_zone_uuid.as_deref()) {
            attributes.insert("security_zone_uuid".to_string(), Value::String(zone));
        }
        if let Some(network) = non_empty(service.network_uuid.as_deref()) {
            attributes.insert("network_uuid".to_string(), Value::String(network));
        }

        for mapping in self.parameters {
            if let Some(value) = service
                .parameters
                .get(mapping.parameter)
                .and_then(|json| mapping.to_attribute(json))
            {
                insert_path(&mut attributes, mapping.attribute, value);
            }
        }

        attributes
    }
}

/// The network whose security-zone relation points at `security_zone_uuid`
///
/// Only the first security zone related to a network is considered.
pub fn attribute_network<'a>(networks: &'a [Network], security_zone_uuid: &str) -> Option<&'a str> {
    networks
        .iter()
        .find(|network| {
            network
                .relations
                .paas_security_zones
                .first()
                .is_some_and(|zone| zone.object_uuid == security_zone_uuid)
        })
        .map(|network| network.object_uuid.as_str())
}

fn common_schema(resource_type: &str) -> ResourceSchema {
    ResourceSchema::new(resource_type)
        .attribute(
            AttributeSchema::new("name", types::name())
                .required()
                .with_description("Human-readable name of the service"),
        )
        .attribute(AttributeSchema::new("release", types::non_empty_string()).required())
        .attribute(AttributeSchema::new("performance_class", types::non_empty_string()).required())
        .attribute(AttributeSchema::new("labels", types::string_set()))
        .attribute(AttributeSchema::new("network_uuid", AttributeType::String).force_new())
        .attribute(AttributeSchema::new("security_zone_uuid", AttributeType::String).force_new())
        .attribute(AttributeSchema::new("max_core_count", types::positive_int()))
        .attribute(AttributeSchema::new("username", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("password", AttributeType::String)
                .computed()
                .sensitive(),
        )
        .attribute(
            AttributeSchema::new(
                "listen_port",
                AttributeType::List(Box::new(AttributeType::Block(vec![
                    AttributeSchema::new("name", AttributeType::String),
                    AttributeSchema::new("host", AttributeType::String),
                    AttributeSchema::new("port", AttributeType::Int),
                ]))),
            )
            .computed(),
        )
        .attribute(AttributeSchema::new("service_template_uuid", AttributeType::String).computed())
        .attribute(AttributeSchema::new("create_time", AttributeType::String).computed())
        .attribute(AttributeSchema::new("change_time", AttributeType::String).computed())
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
}

fn resource_limits(resource: &Resource) -> Vec<ResourceLimit> {
    resource
        .get_int("max_core_count")
        .map(|cores| vec![ResourceLimit::cores(cores)])
        .unwrap_or_default()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(String::from)
}
