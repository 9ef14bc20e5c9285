//! Client - The gridscale SDK surface the provider depends on
//!
//! The provider never talks HTTP itself; every remote call goes through
//! [`PaasApi`], which is injected into the provider per instance.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::api::{
    CreateResponse, Location, LocationCreateRequest, LocationUpdateRequest, Network,
    PaasService, PaasTemplate, ServiceCreateRequest, ServiceUpdateRequest, SslCertificate,
    SslCertificateCreateRequest,
};

/// Errors returned by the SDK
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The API answered with a non-success status code
    #[error("status code {status_code}: {message}")]
    Status { status_code: u16, message: String },

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// The scoped deadline expired before the call completed
    #[error("deadline of {}s exceeded", .0.as_secs())]
    DeadlineExceeded(Duration),
}

impl ApiError {
    pub fn status(status_code: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status_code,
            message: message.into(),
        }
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::status(404, format!("{} not found", what))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status_code: 404, .. })
    }

    /// Whether repeating the call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Status { status_code, .. } => *status_code == 429 || *status_code >= 500,
            ApiError::Transport(_) => true,
            ApiError::DeadlineExceeded(_) => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Operations of the gridscale SDK used by this provider
#[async_trait]
pub trait PaasApi: Send + Sync {
    async fn get_paas_template_list(&self) -> ApiResult<Vec<PaasTemplate>>;

    async fn get_paas_service(&self, id: &str) -> ApiResult<PaasService>;

    async fn create_paas_service(&self, request: ServiceCreateRequest) -> ApiResult<CreateResponse>;

    async fn update_paas_service(&self, id: &str, request: ServiceUpdateRequest) -> ApiResult<()>;

    async fn delete_paas_service(&self, id: &str) -> ApiResult<()>;

    async fn get_network_list(&self) -> ApiResult<Vec<Network>>;

    async fn get_ssl_certificate(&self, id: &str) -> ApiResult<SslCertificate>;

    async fn create_ssl_certificate(
        &self,
        request: SslCertificateCreateRequest,
    ) -> ApiResult<CreateResponse>;

    async fn delete_ssl_certificate(&self, id: &str) -> ApiResult<()>;

    async fn get_location(&self, id: &str) -> ApiResult<Location>;

    async fn create_location(&self, request: LocationCreateRequest) -> ApiResult<CreateResponse>;

    async fn update_location(&self, id: &str, request: LocationUpdateRequest) -> ApiResult<()>;

    async fn delete_location(&self, id: &str) -> ApiResult<()>;
}
