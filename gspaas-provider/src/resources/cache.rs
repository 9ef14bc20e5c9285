//! In-memory cache kinds: Memcached and Redis

use super::paas::{PaasKind, no_customization};
use crate::flavour::Flavour;
use crate::timeouts::Timeouts;
use crate::validation::ValidationOption;

pub static MEMCACHED: PaasKind = PaasKind {
    resource_type: "gridscale_memcached",
    flavour: Flavour::Memcached,
    label: "Memcached service",
    parameters: &[],
    validation: &[ValidationOption::Release, ValidationOption::MaxCoreCount],
    checks: &[],
    timeouts: Timeouts::PAAS,
    customize: no_customization,
};

pub static REDIS_STORE: PaasKind = PaasKind {
    resource_type: "gridscale_redis_store",
    flavour: Flavour::RedisStore,
    label: "Redis store service",
    parameters: &[],
    validation: &[ValidationOption::Release, ValidationOption::MaxCoreCount],
    checks: &[],
    timeouts: Timeouts::PAAS,
    customize: no_customization,
};
