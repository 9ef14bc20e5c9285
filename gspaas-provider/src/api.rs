//! Wire types exchanged with the gridscale API

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the PaaS template catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaasTemplate {
    pub object_uuid: String,
    #[serde(default)]
    pub name: String,
    pub flavour: String,
    pub release: String,
    pub performance_class: String,
    #[serde(default)]
    pub parameters_schema: HashMap<String, ParameterSchema>,
    #[serde(default)]
    pub autoscaling: Option<Autoscaling>,
}

/// Per-parameter rule as advertised by a template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type", default)]
    pub param_type: Option<String>,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Autoscaling {
    pub cores: CoreBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreBounds {
    pub min: i64,
    pub max: i64,
}

/// A PaaS service instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaasService {
    pub object_uuid: String,
    pub name: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
    /// Ports keyed by host, then by port name
    #[serde(default)]
    pub listen_ports: HashMap<String, HashMap<String, i64>>,
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub resource_limits: Vec<ResourceLimit>,
    pub service_template_uuid: String,
    #[serde(default)]
    pub security_zone_uuid: Option<String>,
    #[serde(default)]
    pub network_uuid: Option<String>,
    pub status: String,
    pub create_time: DateTime<Utc>,
    pub change_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub kube_config: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimit {
    pub resource: String,
    pub limit: i64,
}

impl ResourceLimit {
    pub const CORES: &'static str = "cores";

    pub fn cores(limit: i64) -> Self {
        Self {
            resource: Self::CORES.to_string(),
            limit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceCreateRequest {
    pub name: String,
    pub paas_service_template_uuid: String,
    pub labels: Vec<String>,
    pub parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub resource_limits: Vec<ResourceLimit>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub paas_security_zone_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub network_uuid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceUpdateRequest {
    pub name: String,
    pub labels: Vec<String>,
    pub parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub resource_limits: Vec<ResourceLimit>,
    /// Only sent when release or performance class changed
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub paas_service_template_uuid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResponse {
    pub object_uuid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub object_uuid: String,
    pub name: String,
    #[serde(default)]
    pub relations: NetworkRelations,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkRelations {
    #[serde(default)]
    pub paas_security_zones: Vec<SecurityZoneRelation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityZoneRelation {
    pub object_uuid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SslCertificate {
    pub object_uuid: String,
    pub name: String,
    pub common_name: String,
    pub status: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub create_time: DateTime<Utc>,
    pub change_time: DateTime<Utc>,
    pub not_valid_after: DateTime<Utc>,
    pub fingerprints: Fingerprints,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprints {
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SslCertificateCreateRequest {
    pub name: String,
    pub private_key: String,
    pub leaf_certificate: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub certificate_chain: Option<String>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub object_uuid: String,
    pub name: String,
    #[serde(default)]
    pub parent_location_uuid: String,
    #[serde(default)]
    pub product_no: i64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub iata: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub cpunode_count: i64,
    pub status: String,
    pub create_time: DateTime<Utc>,
    pub change_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationCreateRequest {
    pub name: String,
    pub parent_location_uuid: String,
    pub product_no: i64,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdateRequest {
    pub name: String,
    pub labels: Vec<String>,
}
