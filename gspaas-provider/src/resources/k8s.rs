//! Managed Kubernetes clusters

use std::collections::HashMap;

use gspaas_core::resource::{Value, lookup_path};
use gspaas_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::paas::PaasKind;
use crate::catalog::TemplateDescriptor;
use crate::flavour::Flavour;
use crate::release::{Feature, Release};
use crate::timeouts::Timeouts;
use crate::validation::{ParamKind, ParamMapping, ValidationErrors, ValidationOption};

pub const STORAGE_TYPES: &[&str] = &["storage", "storage_high", "storage_insane"];

pub static K8S: PaasKind = PaasKind {
    resource_type: "gridscale_k8s",
    flavour: Flavour::Kubernetes,
    label: "Kubernetes cluster",
    parameters: &[
        ParamMapping::new("node_pool.name", "k8s_worker_node_pool_name", ParamKind::String),
        ParamMapping::new("node_pool.node_count", "k8s_worker_node_count", ParamKind::Int),
        ParamMapping::new("node_pool.cores", "k8s_worker_node_cores", ParamKind::Int),
        ParamMapping::new("node_pool.memory", "k8s_worker_node_ram", ParamKind::Int),
        ParamMapping::new("node_pool.storage", "k8s_worker_node_storage", ParamKind::Int),
        ParamMapping::new(
            "node_pool.storage_type",
            "k8s_worker_node_storage_type",
            ParamKind::String,
        ),
        ParamMapping::new("node_pool.surge_node", "k8s_surge_node", ParamKind::Bool),
        ParamMapping::new("cluster_cidr", "k8s_cluster_cidr", ParamKind::String),
    ],
    validation: &[ValidationOption::Release],
    checks: &[check_release_features],
    timeouts: Timeouts::KUBERNETES,
    customize: k8s_schema,
};

/// Attributes that only exist from a given release on
const GATED_ATTRIBUTES: &[(&str, &str)] = &[("node_pool.surge_node", "1.25"), ("cluster_cidr", "1.24")];

fn check_release_features(
    attributes: &HashMap<String, Value>,
    descriptor: &TemplateDescriptor,
    errors: &mut ValidationErrors,
) {
    let configured: Vec<&(&str, &str)> = GATED_ATTRIBUTES
        .iter()
        .filter(|(attribute, _)| lookup_path(attributes, attribute).is_some())
        .collect();
    if configured.is_empty() {
        return;
    }

    let release = match Release::parse(&descriptor.release) {
        Ok(release) => release,
        Err(e) => {
            errors.push(e.to_string());
            return;
        }
    };
    for (attribute, since) in configured {
        if let Err(e) = release.check(&Feature::since(*attribute, since)) {
            errors.push(e.to_string());
        }
    }
}

fn k8s_schema(schema: ResourceSchema) -> ResourceSchema {
    schema
        .attribute(
            AttributeSchema::new(
                "node_pool",
                AttributeType::Block(vec![
                    AttributeSchema::new("name", AttributeType::String).required(),
                    AttributeSchema::new("node_count", types::positive_int()).required(),
                    AttributeSchema::new("cores", types::positive_int()).required(),
                    AttributeSchema::new("memory", types::positive_int()).required(),
                    AttributeSchema::new("storage", types::positive_int()).required(),
                    AttributeSchema::new(
                        "storage_type",
                        AttributeType::Enum(STORAGE_TYPES.iter().map(|s| s.to_string()).collect()),
                    ),
                    AttributeSchema::new("surge_node", AttributeType::Bool),
                ]),
            )
            .required()
            .with_description("Worker node pool of the cluster"),
        )
        .attribute(AttributeSchema::new("cluster_cidr", types::cidr()))
        .attribute(
            AttributeSchema::new("kubeconfig", AttributeType::String)
                .computed()
                .sensitive(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(release: &str) -> TemplateDescriptor {
        TemplateDescriptor {
            uuid: "tpl-k8s".to_string(),
            flavour: Flavour::Kubernetes,
            release: release.to_string(),
            performance_class: "standard".to_string(),
            autoscaling: None,
            parameters: HashMap::new(),
        }
    }

    fn node_pool(surge_node: bool) -> HashMap<String, Value> {
        HashMap::from([(
            "node_pool".to_string(),
            Value::Map(HashMap::from([
                ("name".to_string(), Value::from("pool-0")),
                ("surge_node".to_string(), Value::Bool(surge_node)),
            ])),
        )])
    }

    #[test]
    fn surge_node_requires_release_1_25() {
        let mut errors = ValidationErrors::new();
        check_release_features(&node_pool(true), &descriptor("1.25"), &mut errors);
        check_release_features(&node_pool(true), &descriptor("1.26.3"), &mut errors);
        assert!(errors.is_empty());

        check_release_features(&node_pool(true), &descriptor("1.24"), &mut errors);
        assert_eq!(
            errors.to_string(),
            "node_pool.surge_node is not available on release 1.24"
        );
    }

    #[test]
    fn cluster_cidr_requires_release_1_24() {
        let mut attributes = HashMap::new();
        attributes.insert("cluster_cidr".to_string(), Value::from("10.244.0.0/16"));

        let mut errors = ValidationErrors::new();
        check_release_features(&attributes, &descriptor("1.23"), &mut errors);
        assert_eq!(
            errors.to_string(),
            "cluster_cidr is not available on release 1.23"
        );
    }

    #[test]
    fn ungated_configuration_is_not_checked() {
        let mut errors = ValidationErrors::new();
        check_release_features(&HashMap::new(), &descriptor("not-a-version"), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn node_pool_parameters_use_dotted_paths() {
        let schema = K8S.schema();
        assert!(schema.attributes["node_pool"].required);
        assert!(schema.attributes["kubeconfig"].sensitive);
        assert!(schema.is_computed("kubeconfig"));

        let attributes = node_pool(false);
        let params = crate::validation::build_parameters(&attributes, K8S.parameters);
        assert_eq!(params["k8s_worker_node_pool_name"], serde_json::json!("pool-0"));
        assert_eq!(params["k8s_surge_node"], serde_json::json!(false));
    }
}
