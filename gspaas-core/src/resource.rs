//! Resource - Representing resources and their state

use std::collections::HashMap;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "gridscale_mariadb", "gridscale_k8s")
    pub resource_type: String,
    /// Resource name (identifier chosen by the user)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert a JSON value into an attribute value.
    ///
    /// `null` has no attribute representation and yields `None`; floats are truncated.
    pub fn from_json(json: &serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(Value::Int),
            serde_json::Value::Array(items) => Some(Value::List(
                items.iter().filter_map(Value::from_json).collect(),
            )),
            serde_json::Value::Object(map) => Some(Value::Map(
                map.iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }

    /// Convert an attribute value into JSON
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(n) => serde_json::Value::Number((*n).into()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Look up a possibly nested attribute by dotted path (e.g. "node_pool.cores").
///
/// A list on the way is entered through its first element, which is how
/// single-item blocks are stored.
pub fn lookup_path<'a>(attributes: &'a HashMap<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = attributes.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Map(map) => map.get(segment)?,
            Value::List(items) => items.first()?.as_map()?.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Insert a value at a dotted path, creating intermediate maps as needed
pub fn insert_path(attributes: &mut HashMap<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            attributes.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = attributes
                .entry(head.to_string())
                .or_insert_with(|| Value::Map(HashMap::new()));
            if !matches!(entry, Value::Map(_)) {
                *entry = Value::Map(HashMap::new());
            }
            if let Value::Map(inner) = entry {
                insert_path(inner, rest, value);
            }
        }
    }
}

/// Desired state declared by the user
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.attributes, path)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_int(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Value::as_int)
    }
}

/// Current state mirrored from the remote API
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    /// Remote object UUID
    pub identifier: Option<String>,
    pub attributes: HashMap<String, Value>,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            identifier: None,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: HashMap<String, Value>) -> Self {
        Self {
            id,
            identifier: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Set the attribute only when a value is present
    pub fn set_opt(&mut self, key: impl Into<String>, value: Option<impl Into<Value>>) {
        if let Some(value) = value {
            self.set(key, value);
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.attributes, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_nested_path_through_map_and_list() {
        let pool = HashMap::from([("cores".to_string(), Value::Int(4))]);
        let mut attrs = HashMap::new();
        attrs.insert("node_pool".to_string(), Value::List(vec![Value::Map(pool)]));

        assert_eq!(lookup_path(&attrs, "node_pool.cores"), Some(&Value::Int(4)));
        assert_eq!(lookup_path(&attrs, "node_pool.memory"), None);
        assert_eq!(lookup_path(&attrs, "missing"), None);
    }

    #[test]
    fn insert_path_creates_intermediate_maps() {
        let mut attrs = HashMap::new();
        insert_path(&mut attrs, "node_pool.node_count", Value::Int(3));
        insert_path(&mut attrs, "node_pool.cores", Value::Int(2));
        insert_path(&mut attrs, "name", Value::from("k8s"));

        assert_eq!(lookup_path(&attrs, "node_pool.node_count"), Some(&Value::Int(3)));
        assert_eq!(lookup_path(&attrs, "node_pool.cores"), Some(&Value::Int(2)));
        assert_eq!(attrs.get("name"), Some(&Value::from("k8s")));
    }

    #[test]
    fn json_conversion_skips_nulls() {
        let json = serde_json::json!({"a": 1, "b": null, "c": ["x", null]});
        let value = Value::from_json(&json).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.get("a"), Some(&Value::Int(1)));
        assert!(!map.contains_key("b"));
        assert_eq!(map.get("c"), Some(&Value::List(vec![Value::from("x")])));
        assert_eq!(Value::from_json(&value.to_json()), Some(value));
    }
}
