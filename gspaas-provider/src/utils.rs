//! Utility functions for value normalization and conversion

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use gspaas_core::resource::Value;

/// Labels from a `labels` attribute, sorted and deduplicated
pub fn labels_from_value(value: Option<&Value>) -> Vec<String> {
    let mut labels: Vec<String> = value
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect();
    labels.sort();
    labels.dedup();
    labels
}

pub fn labels_to_value(labels: &[String]) -> Value {
    let mut labels = labels.to_vec();
    labels.sort();
    Value::List(labels.into_iter().map(Value::String).collect())
}

/// Flatten `listen_ports` (host, then port name) into `{name, host, port}` entries
///
/// Entries are ordered by host, then by name.
pub fn listen_ports_to_value(listen_ports: &HashMap<String, HashMap<String, i64>>) -> Value {
    let mut entries: Vec<(&String, &String, i64)> = listen_ports
        .iter()
        .flat_map(|(host, ports)| ports.iter().map(move |(name, port)| (host, name, *port)))
        .collect();
    entries.sort();
    Value::List(
        entries
            .into_iter()
            .map(|(host, name, port)| {
                Value::Map(HashMap::from([
                    ("name".to_string(), Value::String(name.clone())),
                    ("host".to_string(), Value::String(host.clone())),
                    ("port".to_string(), Value::Int(port)),
                ]))
            })
            .collect(),
    )
}

/// Strip leading and trailing whitespace from a PEM block
pub fn trim_pem(pem: &str) -> String {
    pem.trim().to_string()
}

pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_labels_from_value() {
        let value = Value::List(vec![
            Value::from("prod"),
            Value::from("db"),
            Value::from("prod"),
        ]);
        assert_eq!(labels_from_value(Some(&value)), vec!["db", "prod"]);
        assert!(labels_from_value(None).is_empty());
    }

    #[test]
    fn test_listen_ports_to_value() {
        let ports = HashMap::from([(
            "10.0.0.5".to_string(),
            HashMap::from([("mysql".to_string(), 3306), ("admin".to_string(), 8080)]),
        )]);
        let Value::List(entries) = listen_ports_to_value(&ports) else {
            panic!("expected list");
        };
        assert_eq!(entries.len(), 2);
        let first = entries[0].as_map().unwrap();
        assert_eq!(first["name"], Value::from("admin"));
        assert_eq!(first["port"], Value::Int(8080));
    }

    #[test]
    fn test_trim_pem() {
        assert_eq!(
            trim_pem("\n  -----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n\n"),
            "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----"
        );
    }

    #[test]
    fn test_format_time() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(format_time(&time), "2024-03-01T12:30:00Z");
    }
}
