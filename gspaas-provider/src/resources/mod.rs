//! Resource type configurations for the gridscale provider
//!
//! This module defines:
//! - Resource type definitions (implementing ResourceType trait)
//! - Per-kind configuration for PaaS services, looked up by resource type

pub mod cache;
pub mod filesystem;
pub mod k8s;
pub mod location;
pub mod paas;
pub mod sql;
pub mod ssl_certificate;

use std::collections::HashMap;

use gspaas_core::provider::ResourceType;
use gspaas_core::schema::ResourceSchema;

use crate::timeouts::Timeouts;
use paas::PaasKind;

// =============================================================================
// Resource Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $kind:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $kind.resource_type()
            }
            fn schema(&self) -> ResourceSchema {
                $kind.schema()
            }
        }
    };
}

define_resource_type!(K8sType, Kind::Paas(&k8s::K8S));
define_resource_type!(FilesystemType, Kind::Paas(&filesystem::FILESYSTEM));
define_resource_type!(MariaDbType, Kind::Paas(&sql::MARIADB));
define_resource_type!(MySqlType, Kind::Paas(&sql::MYSQL));
define_resource_type!(MySql8Type, Kind::Paas(&sql::MYSQL8));
define_resource_type!(PostgresType, Kind::Paas(&sql::POSTGRES));
define_resource_type!(SqlServerType, Kind::Paas(&sql::SQLSERVER));
define_resource_type!(MemcachedType, Kind::Paas(&cache::MEMCACHED));
define_resource_type!(RedisStoreType, Kind::Paas(&cache::REDIS_STORE));
define_resource_type!(LocationType, Kind::Location);
define_resource_type!(SslCertificateType, Kind::SslCertificate);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(K8sType),
        Box::new(FilesystemType),
        Box::new(MariaDbType),
        Box::new(MySqlType),
        Box::new(MySql8Type),
        Box::new(PostgresType),
        Box::new(SqlServerType),
        Box::new(MemcachedType),
        Box::new(RedisStoreType),
        Box::new(LocationType),
        Box::new(SslCertificateType),
    ]
}

/// Schemas of every resource type, keyed by type name
pub fn schemas() -> HashMap<String, ResourceSchema> {
    resource_types()
        .into_iter()
        .map(|t| (t.name().to_string(), t.schema()))
        .collect()
}

// =============================================================================
// Kind Lookup
// =============================================================================

/// How a resource type is reconciled
#[derive(Clone, Copy)]
pub enum Kind {
    Paas(&'static PaasKind),
    SslCertificate,
    Location,
}

impl Kind {
    pub fn resource_type(&self) -> &'static str {
        match self {
            Kind::Paas(kind) => kind.resource_type,
            Kind::SslCertificate => ssl_certificate::RESOURCE_TYPE,
            Kind::Location => location::RESOURCE_TYPE,
        }
    }

    pub fn schema(&self) -> ResourceSchema {
        match self {
            Kind::Paas(kind) => kind.schema(),
            Kind::SslCertificate => ssl_certificate::schema(),
            Kind::Location => location::schema(),
        }
    }

    /// Noun used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Paas(kind) => kind.label,
            Kind::SslCertificate => "SSL certificate",
            Kind::Location => "location",
        }
    }

    pub fn default_timeouts(&self) -> Timeouts {
        match self {
            Kind::Paas(kind) => kind.timeouts,
            Kind::SslCertificate | Kind::Location => Timeouts::SHORT,
        }
    }
}

/// Get the kind by resource type name
pub fn get_kind(resource_type: &str) -> Option<Kind> {
    match resource_type {
        "gridscale_k8s" => Some(Kind::Paas(&k8s::K8S)),
        "gridscale_filesystem" => Some(Kind::Paas(&filesystem::FILESYSTEM)),
        "gridscale_mariadb" => Some(Kind::Paas(&sql::MARIADB)),
        "gridscale_mysql" => Some(Kind::Paas(&sql::MYSQL)),
        "gridscale_mysql8_0" => Some(Kind::Paas(&sql::MYSQL8)),
        "gridscale_postgresql" => Some(Kind::Paas(&sql::POSTGRES)),
        "gridscale_sqlserver" => Some(Kind::Paas(&sql::SQLSERVER)),
        "gridscale_memcached" => Some(Kind::Paas(&cache::MEMCACHED)),
        "gridscale_redis_store" => Some(Kind::Paas(&cache::REDIS_STORE)),
        "gridscale_location" => Some(Kind::Location),
        "gridscale_ssl_certificate" => Some(Kind::SslCertificate),
        _ => None,
    }
}
