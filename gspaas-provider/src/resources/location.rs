//! Private locations

use std::collections::HashMap;

use gspaas_core::resource::{Resource, Value};
use gspaas_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::api::{Location, LocationCreateRequest, LocationUpdateRequest};
use crate::utils::{format_time, labels_from_value, labels_to_value};

pub const RESOURCE_TYPE: &str = "gridscale_location";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Private location carved out of a public parent location")
        .attribute(AttributeSchema::new("name", types::name()).required())
        .attribute(
            AttributeSchema::new("parent_location_uuid", types::non_empty_string())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("product_no", types::positive_int())
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("labels", types::string_set()))
        .attribute(AttributeSchema::new("iata", AttributeType::String).computed())
        .attribute(AttributeSchema::new("country", AttributeType::String).computed())
        .attribute(AttributeSchema::new("active", AttributeType::Bool).computed())
        .attribute(AttributeSchema::new("cpunode_count", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
        .attribute(AttributeSchema::new("create_time", AttributeType::String).computed())
        .attribute(AttributeSchema::new("change_time", AttributeType::String).computed())
}

pub fn build_create_request(resource: &Resource) -> LocationCreateRequest {
    LocationCreateRequest {
        name: resource.get_str("name").unwrap_or_default().to_string(),
        parent_location_uuid: resource
            .get_str("parent_location_uuid")
            .unwrap_or_default()
            .to_string(),
        product_no: resource.get_int("product_no").unwrap_or_default(),
        labels: labels_from_value(resource.get("labels")),
    }
}

/// Only the name and labels of a location can change in place
pub fn build_update_request(resource: &Resource) -> LocationUpdateRequest {
    LocationUpdateRequest {
        name: resource.get_str("name").unwrap_or_default().to_string(),
        labels: labels_from_value(resource.get("labels")),
    }
}

pub fn location_attributes(location: &Location) -> HashMap<String, Value> {
    HashMap::from([
        ("name".to_string(), Value::String(location.name.clone())),
        (
            "parent_location_uuid".to_string(),
            Value::String(location.parent_location_uuid.clone()),
        ),
        ("product_no".to_string(), Value::Int(location.product_no)),
        ("labels".to_string(), labels_to_value(&location.labels)),
        ("iata".to_string(), Value::String(location.iata.clone())),
        ("country".to_string(), Value::String(location.country.clone())),
        ("active".to_string(), Value::Bool(location.active)),
        ("cpunode_count".to_string(), Value::Int(location.cpunode_count)),
        ("status".to_string(), Value::String(location.status.clone())),
        ("create_time".to_string(), Value::String(format_time(&location.create_time))),
        ("change_time".to_string(), Value::String(format_time(&location.change_time))),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_and_product_force_replacement() {
        let schema = schema();
        assert!(schema.is_force_new("parent_location_uuid"));
        assert!(schema.is_force_new("product_no"));
        assert!(!schema.is_force_new("name"));
        assert!(schema.is_computed("iata"));
    }

    #[test]
    fn update_request_carries_name_and_labels() {
        let resource = Resource::new(RESOURCE_TYPE, "loc")
            .with_attribute("name", "edge")
            .with_attribute("product_no", Value::Int(1500001))
            .with_attribute("labels", Value::List(vec![Value::from("edge")]));

        let request = build_update_request(&resource);
        assert_eq!(request.name, "edge");
        assert_eq!(request.labels, vec!["edge"]);
        assert_eq!(build_create_request(&resource).product_no, 1500001);
    }
}
