//! gspaas gridscale PaaS Provider
//!
//! Manages gridscale PaaS services (Kubernetes, filesystems, SQL databases,
//! caches), SSL certificates and locations.
//!
//! ## Module Structure
//!
//! - `client` / `api` - SDK surface and wire types
//! - `catalog` / `index` / `resolver` - Template catalog and selection
//! - `validation` - Template-driven parameter checks
//! - `resources` - Resource type definitions and per-kind configuration
//! - `provider` - GridscaleProvider implementation
//! - `fake` - In-memory API backed by a JSON snapshot

pub mod api;
pub mod catalog;
pub mod client;
pub mod config;
pub mod fake;
pub mod flavour;
pub mod index;
pub mod provider;
pub mod release;
pub mod resolver;
pub mod resources;
pub mod retry;
pub mod timeouts;
pub mod utils;
pub mod validation;

// Re-export main types
pub use client::{ApiError, PaasApi};
pub use config::ProviderConfig;
pub use provider::GridscaleProvider;
pub use release::Release;

use gspaas_core::provider::{BoxFuture, Provider, ProviderResult};
use gspaas_core::resource::{Resource, ResourceId, State};

use resources::resource_types;

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for GridscaleProvider {
    fn name(&self) -> &'static str {
        "gridscale"
    }

    fn resource_types(&self) -> Vec<Box<dyn gspaas_core::provider::ResourceType>> {
        resource_types()
    }

    fn plan<'a>(
        &'a self,
        resource: &'a Resource,
        prior: Option<&'a State>,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(self.plan_resource(resource, prior))
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_resource(&id, identifier.as_deref()).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(&resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(&id, &identifier, &from, &to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use gspaas_core::provider::ErrorKind;

    use crate::fake::{InMemoryApi, Snapshot};

    fn provider() -> Box<dyn Provider> {
        Box::new(GridscaleProvider::new(Arc::new(InMemoryApi::new(
            Snapshot::default(),
        ))))
    }

    #[test]
    fn exposes_every_resource_type() {
        let provider = provider();
        assert_eq!(provider.name(), "gridscale");
        let names: Vec<&str> = provider.resource_types().iter().map(|t| t.name()).collect();
        assert!(names.contains(&"gridscale_k8s"));
        assert!(names.contains(&"gridscale_ssl_certificate"));
        assert_eq!(names.len(), 11);
    }

    #[tokio::test]
    async fn import_of_missing_object_fails() {
        let provider = provider();
        let id = ResourceId::new("gridscale_postgresql", "db");

        let err = provider.import(&id, "abc").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.resource_id, Some(id));
    }

    #[tokio::test]
    async fn read_without_identifier_is_absent() {
        let provider = provider();
        let id = ResourceId::new("gridscale_postgresql", "db");

        let state = provider.read(&id, None).await.unwrap();
        assert!(!state.exists);
    }
}
