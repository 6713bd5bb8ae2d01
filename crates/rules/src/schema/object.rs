//! Explicitly declared objects (hosts, services, ...).

use serde::{Deserialize, Serialize};
use vigil_core::{ConfigObject, DebugInfo, Dictionary, Value, SERVICE_TYPE};

/// An `Object` document.
///
/// ```yaml
/// kind: Object
/// type: Service
/// name: http
/// host_name: web1
/// vars: { port: 80 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectDef {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Dictionary::is_empty")]
    pub vars: Dictionary,
    /// Any further attributes, copied verbatim.
    #[serde(default, skip_serializing_if = "Dictionary::is_empty")]
    pub attrs: Dictionary,
}

impl ObjectDef {
    /// Registry identity: services are qualified by their host.
    pub fn identity(&self) -> std::result::Result<String, String> {
        if self.type_name != SERVICE_TYPE {
            return Ok(self.name.clone());
        }
        match self.host_name.as_deref() {
            Some(host) if !host.is_empty() => Ok(format!("{}!{}", host, self.name)),
            _ => Err(format!("Service '{}' must set host_name", self.name)),
        }
    }

    pub fn to_object(&self, origin: DebugInfo) -> std::result::Result<ConfigObject, String> {
        let mut object = ConfigObject::new(self.type_name.clone(), self.identity()?)
            .with_attr("name", self.name.as_str())
            .with_origin(origin);

        if let Some(host) = &self.host_name {
            object = object.with_attr("host_name", host.as_str());
        }
        if let Some(zone) = self.zone.as_deref().filter(|z| !z.is_empty()) {
            object = object.with_attr("zone", zone);
        }
        if !self.vars.is_empty() {
            object = object.with_attr("vars", Value::Dictionary(self.vars.clone()));
        }
        for (key, value) in &self.attrs {
            object.attrs.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Ok(object)
    }
}
