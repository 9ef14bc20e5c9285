//! SQL database kinds: MariaDB, MySQL, PostgreSQL and MS SQL Server

use std::collections::HashMap;

use gspaas_core::resource::{Value, lookup_path};
use gspaas_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::paas::{PaasKind, no_customization};
use crate::catalog::TemplateDescriptor;
use crate::flavour::Flavour;
use crate::timeouts::Timeouts;
use crate::validation::{ParamKind, ParamMapping, ValidationErrors, ValidationOption};

const DEFAULT_VALIDATION: &[ValidationOption] =
    &[ValidationOption::Release, ValidationOption::MaxCoreCount];

macro_rules! mysql_parameters {
    ($($prefix:literal),*) => {
        &[$(
            ParamMapping::new(concat!($prefix, "_log_bin"), "log_bin", ParamKind::Bool),
            ParamMapping::new(concat!($prefix, "_sql_mode"), "sql_mode", ParamKind::String),
            ParamMapping::new(concat!($prefix, "_server_id"), "server_id", ParamKind::Int),
            ParamMapping::new(concat!($prefix, "_query_cache"), "query_cache", ParamKind::Bool),
            ParamMapping::new(concat!($prefix, "_binlog_format"), "binlog_format", ParamKind::String),
            ParamMapping::new(concat!($prefix, "_max_connections"), "max_connections", ParamKind::Int),
            ParamMapping::new(concat!($prefix, "_query_cache_size"), "query_cache_size", ParamKind::String),
            ParamMapping::new(concat!($prefix, "_default_time_zone"), "default_time_zone", ParamKind::String),
            ParamMapping::new(concat!($prefix, "_query_cache_limit"), "query_cache_limit", ParamKind::String),
            ParamMapping::new(concat!($prefix, "_max_allowed_packet"), "max_allowed_packet", ParamKind::String),
        )*]
    };
}

pub static MARIADB: PaasKind = PaasKind {
    resource_type: "gridscale_mariadb",
    flavour: Flavour::MariaDb,
    label: "MariaDB service",
    parameters: mysql_parameters!("mariadb"),
    validation: DEFAULT_VALIDATION,
    checks: &[],
    timeouts: Timeouts::PAAS,
    customize: no_customization,
};

pub static MYSQL: PaasKind = PaasKind {
    resource_type: "gridscale_mysql",
    flavour: Flavour::MySql,
    label: "MySQL service",
    parameters: mysql_parameters!("mysql"),
    validation: DEFAULT_VALIDATION,
    checks: &[],
    timeouts: Timeouts::PAAS,
    customize: no_customization,
};

/// MySQL 8.0 dropped the query cache
pub static MYSQL8: PaasKind = PaasKind {
    resource_type: "gridscale_mysql8_0",
    flavour: Flavour::MySql,
    label: "MySQL 8.0 service",
    parameters: &[
        ParamMapping::new("mysql_sql_mode", "sql_mode", ParamKind::String),
        ParamMapping::new("mysql_server_id", "server_id", ParamKind::Int),
        ParamMapping::new("mysql_binlog_format", "binlog_format", ParamKind::String),
        ParamMapping::new("mysql_max_connections", "max_connections", ParamKind::Int),
        ParamMapping::new("mysql_default_time_zone", "default_time_zone", ParamKind::String),
        ParamMapping::new("mysql_max_allowed_packet", "max_allowed_packet", ParamKind::String),
    ],
    validation: DEFAULT_VALIDATION,
    checks: &[],
    timeouts: Timeouts::PAAS,
    customize: no_customization,
};

/// PostgreSQL takes no tunable parameters; only release and core count are checked
pub static POSTGRES: PaasKind = PaasKind {
    resource_type: "gridscale_postgresql",
    flavour: Flavour::Postgres,
    label: "PostgreSQL service",
    parameters: &[],
    validation: DEFAULT_VALIDATION,
    checks: &[],
    timeouts: Timeouts::PAAS,
    customize: no_customization,
};

/// The only S3 endpoint MS SQL Server backups may target
pub const BACKUP_SERVER_URL: &str = "https://gos3.io/";

pub static SQLSERVER: PaasKind = PaasKind {
    resource_type: "gridscale_sqlserver",
    flavour: Flavour::MsSql,
    label: "MS SQL Server service",
    parameters: &[
        ParamMapping::new("s3_backup.backup_bucket", "backup_bucket", ParamKind::String),
        ParamMapping::new("s3_backup.backup_retention", "backup_retention", ParamKind::Int),
        ParamMapping::new("s3_backup.backup_access_key", "backup_access_key", ParamKind::String),
        ParamMapping::new("s3_backup.backup_secret_key", "backup_secret_key", ParamKind::String),
        ParamMapping::new("s3_backup.backup_server_url", "backup_server_url", ParamKind::String),
    ],
    validation: DEFAULT_VALIDATION,
    checks: &[check_backup_server_url],
    timeouts: Timeouts::PAAS,
    customize: sqlserver_schema,
};

fn check_backup_server_url(
    attributes: &HashMap<String, Value>,
    _descriptor: &TemplateDescriptor,
    errors: &mut ValidationErrors,
) {
    if let Some(url) = lookup_path(attributes, "s3_backup.backup_server_url").and_then(Value::as_str)
        && url != BACKUP_SERVER_URL
    {
        errors.push(format!(
            "Invalid 'backup_server_url' value. Value must be '{}'",
            BACKUP_SERVER_URL
        ));
    }
}

fn sqlserver_schema(schema: ResourceSchema) -> ResourceSchema {
    schema.attribute(
        AttributeSchema::new(
            "s3_backup",
            AttributeType::Block(vec![
                AttributeSchema::new("backup_bucket", AttributeType::String).required(),
                AttributeSchema::new("backup_retention", AttributeType::Int).required(),
                AttributeSchema::new("backup_access_key", AttributeType::String).required(),
                AttributeSchema::new("backup_secret_key", AttributeType::String).required(),
                AttributeSchema::new("backup_server_url", AttributeType::String)
                    .with_default(Value::from(BACKUP_SERVER_URL)),
            ]),
        )
        .sensitive()
        .with_description("S3 bucket receiving database backups"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> TemplateDescriptor {
        TemplateDescriptor {
            uuid: "tpl-mssql".to_string(),
            flavour: Flavour::MsSql,
            release: "2019".to_string(),
            performance_class: "standard".to_string(),
            autoscaling: None,
            parameters: HashMap::new(),
        }
    }

    fn with_backup(url: &str) -> HashMap<String, Value> {
        HashMap::from([(
            "s3_backup".to_string(),
            Value::Map(HashMap::from([
                ("backup_bucket".to_string(), Value::from("bucket")),
                ("backup_server_url".to_string(), Value::from(url)),
            ])),
        )])
    }

    #[test]
    fn mysql_tables_share_parameters_with_distinct_prefixes() {
        assert_eq!(MARIADB.parameters.len(), 10);
        assert_eq!(MYSQL.parameters.len(), 10);
        assert!(MARIADB.parameters.iter().all(|m| m.attribute.starts_with("mariadb_")));
        assert!(MYSQL.parameters.iter().all(|m| m.attribute.starts_with("mysql_")));
        assert_eq!(
            MARIADB
                .parameters
                .iter()
                .map(|m| m.parameter)
                .collect::<Vec<_>>(),
            MYSQL.parameters.iter().map(|m| m.parameter).collect::<Vec<_>>()
        );
        assert!(!MYSQL8.parameters.iter().any(|m| m.parameter.starts_with("query_cache")));
    }

    #[test]
    fn postgres_checks_release_and_core_count_only() {
        assert!(POSTGRES.parameters.is_empty());
        assert_eq!(
            POSTGRES.validation,
            [ValidationOption::Release, ValidationOption::MaxCoreCount]
        );
    }

    #[test]
    fn backup_server_url_is_fixed() {
        let mut errors = ValidationErrors::new();
        check_backup_server_url(&with_backup(BACKUP_SERVER_URL), &descriptor(), &mut errors);
        assert!(errors.is_empty());

        check_backup_server_url(&with_backup("https://s3.example.com/"), &descriptor(), &mut errors);
        assert_eq!(
            errors.to_string(),
            "Invalid 'backup_server_url' value. Value must be 'https://gos3.io/'"
        );
    }

    #[test]
    fn sqlserver_backup_block_is_sensitive() {
        let schema = SQLSERVER.schema();
        let block = &schema.attributes["s3_backup"];
        assert!(block.sensitive);
        assert!(matches!(block.attr_type, AttributeType::Block(ref fields) if fields.len() == 5));
    }
}
