use serde::{Deserialize, Serialize};

use crate::debug_info::DebugInfo;
use crate::value::{Dictionary, Value};

pub const HOST_TYPE: &str = "Host";
pub const SERVICE_TYPE: &str = "Service";

/// A committed configuration object.
///
/// `name` is the registry identity (for services `host!short`); the short
/// name lives in the `name` attribute when it differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigObject {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub attrs: Dictionary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<DebugInfo>,
}

impl ConfigObject {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            attrs: Dictionary::new(),
            origin: None,
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_origin(mut self, origin: DebugInfo) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    fn str_attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    /// Name without the host prefix.
    pub fn short_name(&self) -> &str {
        self.str_attr("name").unwrap_or(&self.name)
    }

    /// Zone name, empty when the object is not pinned to a zone.
    pub fn zone(&self) -> &str {
        self.str_attr("zone").unwrap_or("")
    }

    pub fn host_name(&self) -> Option<&str> {
        self.str_attr("host_name")
    }

    pub fn is_host(&self) -> bool {
        self.type_name == HOST_TYPE
    }

    pub fn is_service(&self) -> bool {
        self.type_name == SERVICE_TYPE
    }

    /// Dictionary view bound as `host`/`service` during rule evaluation.
    pub fn to_value(&self) -> Value {
        let mut dict = Dictionary::new();
        dict.insert("type".to_string(), Value::from(self.type_name.as_str()));
        dict.insert("__name".to_string(), Value::from(self.name.as_str()));
        dict.insert("name".to_string(), Value::from(self.short_name()));
        for (key, value) in &self.attrs {
            if key != "name" {
                dict.insert(key.clone(), value.clone());
            }
        }
        Value::Dictionary(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_accessors() {
        let svc = ConfigObject::new(SERVICE_TYPE, "web1!http")
            .with_attr("name", "http")
            .with_attr("host_name", "web1")
            .with_attr("zone", "dmz");

        assert!(svc.is_service());
        assert!(!svc.is_host());
        assert_eq!(svc.short_name(), "http");
        assert_eq!(svc.host_name(), Some("web1"));
        assert_eq!(svc.zone(), "dmz");
    }

    #[test]
    fn to_value_exposes_identity_and_attributes() {
        let host = ConfigObject::new(HOST_TYPE, "web1").with_attr("address", "10.0.0.1");
        let value = host.to_value();

        assert_eq!(value.get("name"), Some(&Value::from("web1")));
        assert_eq!(value.get("__name"), Some(&Value::from("web1")));
        assert_eq!(value.get("type"), Some(&Value::from("Host")));
        assert!(host.is_host());
        assert_eq!(value.get("address"), Some(&Value::from("10.0.0.1")));
        assert_eq!(host.zone(), "");
    }
}
