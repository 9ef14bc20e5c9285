//! In-memory gridscale API
//!
//! Serves a [`Snapshot`] of templates, services, networks, certificates and
//! locations. Used by the tests and by the CLI, which persists the snapshot
//! to a JSON file between runs. Latency and failures can be injected to
//! exercise deadlines and retries.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::{
    CreateResponse, Credential, Fingerprints, Location, LocationCreateRequest,
    LocationUpdateRequest, Network, PaasService, PaasTemplate, ServiceCreateRequest,
    ServiceUpdateRequest, SslCertificate, SslCertificateCreateRequest,
};
use crate::client::{ApiError, ApiResult, PaasApi};
use crate::flavour::Flavour;

/// Everything the simulated API knows about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub templates: Vec<PaasTemplate>,
    #[serde(default)]
    pub services: Vec<PaasService>,
    #[serde(default)]
    pub networks: Vec<Network>,
    #[serde(default)]
    pub ssl_certificates: Vec<SslCertificate>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to access snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[derive(Default)]
struct Faults {
    latency: Option<Duration>,
    failures: VecDeque<ApiError>,
    targeted: HashMap<String, VecDeque<ApiError>>,
}

pub struct InMemoryApi {
    snapshot: Mutex<Snapshot>,
    faults: Mutex<Faults>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryApi {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            faults: Mutex::new(Faults::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.lock().await.clone()
    }

    /// Delay every following call
    pub async fn set_latency(&self, latency: Duration) {
        self.faults.lock().await.latency = Some(latency);
    }

    /// Fail the next call with `error`; queued failures are consumed in order
    pub async fn fail_next(&self, error: ApiError) {
        self.faults.lock().await.failures.push_back(error);
    }

    /// Fail the next call named `call` with `error`
    pub async fn fail_call(&self, call: &str, error: ApiError) {
        self.faults
            .lock()
            .await
            .targeted
            .entry(call.to_string())
            .or_default()
            .push_back(error);
    }

    /// Names of the calls served so far, in order
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn enter(&self, call: &str) -> ApiResult<()> {
        log::debug!("in-memory API: {}", call);
        self.calls.lock().await.push(call.to_string());
        let (latency, failure) = {
            let mut faults = self.faults.lock().await;
            let failure = match faults.failures.pop_front() {
                Some(error) => Some(error),
                None => faults.targeted.get_mut(call).and_then(VecDeque::pop_front),
            };
            (faults.latency, failure)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaasApi for InMemoryApi {
    async fn get_paas_template_list(&self) -> ApiResult<Vec<PaasTemplate>> {
        self.enter("get_paas_template_list").await?;
        Ok(self.snapshot.lock().await.templates.clone())
    }

    async fn get_paas_service(&self, id: &str) -> ApiResult<PaasService> {
        self.enter("get_paas_service").await?;
        let snapshot = self.snapshot.lock().await;
        snapshot
            .services
            .iter()
            .find(|s| s.object_uuid == id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("PaaS service {}", id)))
    }

    async fn create_paas_service(&self, request: ServiceCreateRequest) -> ApiResult<CreateResponse> {
        self.enter("create_paas_service").await?;
        if request.network_uuid.is_some() && request.paas_security_zone_uuid.is_some() {
            return Err(ApiError::status(
                400,
                "network_uuid and paas_security_zone_uuid cannot both be set",
            ));
        }

        let mut snapshot = self.snapshot.lock().await;
        let template = snapshot
            .templates
            .iter()
            .find(|t| t.object_uuid == request.paas_service_template_uuid)
            .ok_or_else(|| {
                ApiError::status(
                    400,
                    format!("unknown template {}", request.paas_service_template_uuid),
                )
            })?;
        let flavour = template.flavour.parse::<Flavour>().ok();

        let object_uuid = Uuid::new_v4().to_string();
        let now = Utc::now();
        let host = format!("10.0.{}.10", snapshot.services.len() % 250);
        let kube_config = (flavour == Some(Flavour::Kubernetes))
            .then(|| format!("apiVersion: v1\nkind: Config\nclusters:\n- name: {}\n", object_uuid));
        let service = PaasService {
            object_uuid: object_uuid.clone(),
            name: request.name,
            labels: request.labels,
            credentials: vec![Credential {
                username: format!("user_{}", &object_uuid[..8]),
                password: Uuid::new_v4().simple().to_string(),
                kube_config,
            }],
            listen_ports: HashMap::from([(
                host,
                HashMap::from([(
                    template.flavour.clone(),
                    flavour.map(default_port).unwrap_or(8080),
                )]),
            )]),
            parameters: request.parameters,
            resource_limits: request.resource_limits,
            service_template_uuid: request.paas_service_template_uuid,
            security_zone_uuid: request.paas_security_zone_uuid,
            network_uuid: request.network_uuid,
            status: "active".to_string(),
            create_time: now,
            change_time: now,
        };
        snapshot.services.push(service);

        Ok(CreateResponse { object_uuid })
    }

    async fn update_paas_service(&self, id: &str, request: ServiceUpdateRequest) -> ApiResult<()> {
        self.enter("update_paas_service").await?;
        let mut snapshot = self.snapshot.lock().await;
        if let Some(template_uuid) = &request.paas_service_template_uuid
            && !snapshot.templates.iter().any(|t| &t.object_uuid == template_uuid)
        {
            return Err(ApiError::status(400, format!("unknown template {}", template_uuid)));
        }
        let service = snapshot
            .services
            .iter_mut()
            .find(|s| s.object_uuid == id)
            .ok_or_else(|| ApiError::not_found(format!("PaaS service {}", id)))?;

        service.name = request.name;
        service.labels = request.labels;
        service.parameters = request.parameters;
        service.resource_limits = request.resource_limits;
        if let Some(template_uuid) = request.paas_service_template_uuid {
            service.service_template_uuid = template_uuid;
        }
        service.change_time = Utc::now();
        Ok(())
    }

    async fn delete_paas_service(&self, id: &str) -> ApiResult<()> {
        self.enter("delete_paas_service").await?;
        let mut snapshot = self.snapshot.lock().await;
        let before = snapshot.services.len();
        snapshot.services.retain(|s| s.object_uuid != id);
        if snapshot.services.len() == before {
            return Err(ApiError::not_found(format!("PaaS service {}", id)));
        }
        Ok(())
    }

    async fn get_network_list(&self) -> ApiResult<Vec<Network>> {
        self.enter("get_network_list").await?;
        Ok(self.snapshot.lock().await.networks.clone())
    }

    async fn get_ssl_certificate(&self, id: &str) -> ApiResult<SslCertificate> {
        self.enter("get_ssl_certificate").await?;
        let snapshot = self.snapshot.lock().await;
        snapshot
            .ssl_certificates
            .iter()
            .find(|c| c.object_uuid == id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("SSL certificate {}", id)))
    }

    async fn create_ssl_certificate(
        &self,
        request: SslCertificateCreateRequest,
    ) -> ApiResult<CreateResponse> {
        self.enter("create_ssl_certificate").await?;
        if !request.leaf_certificate.starts_with("-----BEGIN CERTIFICATE-----") {
            return Err(ApiError::status(400, "leaf_certificate is not a PEM certificate"));
        }

        let object_uuid = Uuid::new_v4().to_string();
        let now = Utc::now();
        let certificate = SslCertificate {
            object_uuid: object_uuid.clone(),
            common_name: request.name.clone(),
            name: request.name,
            status: "active".to_string(),
            labels: request.labels,
            create_time: now,
            change_time: now,
            not_valid_after: now + chrono::Duration::days(365),
            fingerprints: Fingerprints {
                md5: digest("md5", &request.leaf_certificate),
                sha1: digest("sha1", &request.leaf_certificate),
                sha256: digest("sha256", &request.leaf_certificate),
            },
        };
        self.snapshot.lock().await.ssl_certificates.push(certificate);

        Ok(CreateResponse { object_uuid })
    }

    async fn delete_ssl_certificate(&self, id: &str) -> ApiResult<()> {
        self.enter("delete_ssl_certificate").await?;
        let mut snapshot = self.snapshot.lock().await;
        let before = snapshot.ssl_certificates.len();
        snapshot.ssl_certificates.retain(|c| c.object_uuid != id);
        if snapshot.ssl_certificates.len() == before {
            return Err(ApiError::not_found(format!("SSL certificate {}", id)));
        }
        Ok(())
    }

    async fn get_location(&self, id: &str) -> ApiResult<Location> {
        self.enter("get_location").await?;
        let snapshot = self.snapshot.lock().await;
        snapshot
            .locations
            .iter()
            .find(|l| l.object_uuid == id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("location {}", id)))
    }

    async fn create_location(&self, request: LocationCreateRequest) -> ApiResult<CreateResponse> {
        self.enter("create_location").await?;
        let mut snapshot = self.snapshot.lock().await;
        let parent = snapshot
            .locations
            .iter()
            .find(|l| l.object_uuid == request.parent_location_uuid)
            .ok_or_else(|| {
                ApiError::status(
                    400,
                    format!("unknown parent location {}", request.parent_location_uuid),
                )
            })?;

        let object_uuid = Uuid::new_v4().to_string();
        let now = Utc::now();
        let location = Location {
            object_uuid: object_uuid.clone(),
            name: request.name,
            parent_location_uuid: request.parent_location_uuid.clone(),
            product_no: request.product_no,
            labels: request.labels,
            iata: parent.iata.clone(),
            country: parent.country.clone(),
            active: true,
            cpunode_count: 0,
            status: "active".to_string(),
            create_time: now,
            change_time: now,
        };
        snapshot.locations.push(location);

        Ok(CreateResponse { object_uuid })
    }

    async fn update_location(&self, id: &str, request: LocationUpdateRequest) -> ApiResult<()> {
        self.enter("update_location").await?;
        let mut snapshot = self.snapshot.lock().await;
        let location = snapshot
            .locations
            .iter_mut()
            .find(|l| l.object_uuid == id)
            .ok_or_else(|| ApiError::not_found(format!("location {}", id)))?;
        location.name = request.name;
        location.labels = request.labels;
        location.change_time = Utc::now();
        Ok(())
    }

    async fn delete_location(&self, id: &str) -> ApiResult<()> {
        self.enter("delete_location").await?;
        let mut snapshot = self.snapshot.lock().await;
        let before = snapshot.locations.len();
        snapshot.locations.retain(|l| l.object_uuid != id);
        if snapshot.locations.len() == before {
            return Err(ApiError::not_found(format!("location {}", id)));
        }
        Ok(())
    }
}

fn default_port(flavour: Flavour) -> i64 {
    match flavour {
        Flavour::Kubernetes => 6443,
        Flavour::MariaDb | Flavour::MySql => 3306,
        Flavour::Postgres => 5432,
        Flavour::MsSql => 1433,
        Flavour::Memcached => 11211,
        Flavour::RedisStore => 6379,
        Flavour::Filesystem => 2049,
    }
}

/// Stable stand-in for a certificate fingerprint
fn digest(algorithm: &str, content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    algorithm.hash(&mut hasher);
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> PaasTemplate {
        PaasTemplate {
            object_uuid: "tpl-1".to_string(),
            name: "PostgreSQL 13".to_string(),
            flavour: "postgres".to_string(),
            release: "13".to_string(),
            performance_class: "standard".to_string(),
            parameters_schema: HashMap::new(),
            autoscaling: None,
        }
    }

    fn request() -> ServiceCreateRequest {
        ServiceCreateRequest {
            name: "db".to_string(),
            paas_service_template_uuid: "tpl-1".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_then_delete_service() {
        let api = InMemoryApi::new(Snapshot {
            templates: vec![template()],
            ..Default::default()
        });

        let created = api.create_paas_service(request()).await.unwrap();
        let service = api.get_paas_service(&created.object_uuid).await.unwrap();
        assert_eq!(service.name, "db");
        assert_eq!(service.credentials.len(), 1);
        assert_eq!(service.listen_ports.values().next().unwrap()["postgres"], 5432);

        api.delete_paas_service(&created.object_uuid).await.unwrap();
        assert!(
            api.delete_paas_service(&created.object_uuid)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn rejects_network_and_security_zone_together() {
        let api = InMemoryApi::new(Snapshot {
            templates: vec![template()],
            ..Default::default()
        });
        let request = ServiceCreateRequest {
            network_uuid: Some("net-1".to_string()),
            paas_security_zone_uuid: Some("sz-1".to_string()),
            ..request()
        };
        let err = api.create_paas_service(request).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status_code: 400, .. }));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let api = InMemoryApi::new(Snapshot::default());
        api.fail_next(ApiError::status(503, "busy")).await;

        assert!(api.get_network_list().await.is_err());
        assert!(api.get_network_list().await.is_ok());
        assert_eq!(api.calls().await, vec!["get_network_list", "get_network_list"]);
    }

    #[tokio::test]
    async fn targeted_failures_wait_for_their_call() {
        let api = InMemoryApi::new(Snapshot::default());
        api.fail_call("get_network_list", ApiError::status(503, "busy")).await;

        assert!(api.get_paas_template_list().await.is_ok());
        assert!(api.get_network_list().await.is_err());
        assert!(api.get_network_list().await.is_ok());
    }

    #[test]
    fn snapshot_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api").join("snapshot.json");
        let snapshot = Snapshot {
            templates: vec![template()],
            ..Default::default()
        };

        snapshot.save(&path).unwrap();
        assert_eq!(Snapshot::load(&path).unwrap(), snapshot);
    }
}
