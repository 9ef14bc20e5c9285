//! NFS filesystem service

use gspaas_core::schema::{AttributeSchema, ResourceSchema, types};

use super::paas::PaasKind;
use crate::flavour::Flavour;
use crate::timeouts::Timeouts;
use crate::validation::{ParamKind, ParamMapping, ValidationOption};

pub static FILESYSTEM: PaasKind = PaasKind {
    resource_type: "gridscale_filesystem",
    flavour: Flavour::Filesystem,
    label: "filesystem service",
    parameters: &[
        ParamMapping::new("root_squash", "root_squash", ParamKind::Bool),
        ParamMapping::new("allowed_ip_ranges", "allowed_ip_ranges", ParamKind::StringSet),
        ParamMapping::new("anon_uid", "anon_uid", ParamKind::Int),
        ParamMapping::new("anon_gid", "anon_gid", ParamKind::Int),
    ],
    validation: &[ValidationOption::Release, ValidationOption::MaxCoreCount],
    checks: &[],
    timeouts: Timeouts::PAAS,
    customize: filesystem_schema,
};

fn filesystem_schema(schema: ResourceSchema) -> ResourceSchema {
    schema
        .attribute(AttributeSchema::new("anon_uid", types::non_negative_int()))
        .attribute(AttributeSchema::new("anon_gid", types::non_negative_int()))
}
