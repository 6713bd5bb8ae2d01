//! Rule kinds: which object type an apply rule produces and how it links
//! back to its candidate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use vigil_core::{HOST_TYPE, SERVICE_TYPE};

/// Object types that apply rules can synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleKind {
    Service,
    Dependency,
    Notification,
    ScheduledDowntime,
}

impl RuleKind {
    pub const ALL: [RuleKind; 4] = [
        RuleKind::Service,
        RuleKind::Dependency,
        RuleKind::Notification,
        RuleKind::ScheduledDowntime,
    ];

    /// Order in which kinds are applied. Services come first so that the
    /// services they create are candidates for the remaining kinds.
    pub fn evaluation_order() -> &'static [RuleKind] {
        &Self::ALL
    }

    /// Candidate types this kind may be applied to.
    pub fn default_targets(&self) -> &'static [&'static str] {
        match self {
            RuleKind::Service => &[HOST_TYPE],
            RuleKind::Dependency | RuleKind::Notification | RuleKind::ScheduledDowntime => {
                &[HOST_TYPE, SERVICE_TYPE]
            }
        }
    }

    /// Target type used when a rule does not name one.
    pub fn implicit_target(&self) -> &'static str {
        match self.default_targets() {
            [single] => *single,
            _ => HOST_TYPE,
        }
    }

    /// Implicit parent-linkage fields for an object attached to `host` and,
    /// for service candidates, `service` (short name).
    pub fn linkage_fields(&self, host: &str, service: Option<&str>) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        match self {
            RuleKind::Service => fields.push(("host_name", host.to_string())),
            RuleKind::Dependency => {
                fields.push(("parent_host_name", host.to_string()));
                fields.push(("child_host_name", host.to_string()));
                if let Some(service) = service {
                    fields.push(("child_service_name", service.to_string()));
                }
            }
            RuleKind::Notification | RuleKind::ScheduledDowntime => {
                fields.push(("host_name", host.to_string()));
                if let Some(service) = service {
                    fields.push(("service_name", service.to_string()));
                }
            }
        }
        fields
    }

    /// Registry identity of an object named `name` attached to the given
    /// host/service pair.
    pub fn compose_name(&self, host: &str, service: Option<&str>, name: &str) -> String {
        match (self, service) {
            (RuleKind::Service, _) | (_, None) => format!("{}!{}", host, name),
            (_, Some(service)) => format!("{}!{}!{}", host, service, name),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Service => write!(f, "Service"),
            RuleKind::Dependency => write!(f, "Dependency"),
            RuleKind::Notification => write!(f, "Notification"),
            RuleKind::ScheduledDowntime => write!(f, "ScheduledDowntime"),
        }
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Service" => Ok(RuleKind::Service),
            "Dependency" => Ok(RuleKind::Dependency),
            "Notification" => Ok(RuleKind::Notification),
            "ScheduledDowntime" => Ok(RuleKind::ScheduledDowntime),
            other => Err(format!("unknown rule kind: '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_linkage_for_service_candidate() {
        let fields = RuleKind::Dependency.linkage_fields("web1", Some("http"));
        assert_eq!(
            fields,
            vec![
                ("parent_host_name", "web1".to_string()),
                ("child_host_name", "web1".to_string()),
                ("child_service_name", "http".to_string()),
            ]
        );
    }

    #[test]
    fn compose_names() {
        assert_eq!(RuleKind::Service.compose_name("web1", None, "ping"), "web1!ping");
        assert_eq!(RuleKind::Notification.compose_name("web1", None, "mail"), "web1!mail");
        assert_eq!(
            RuleKind::Dependency.compose_name("web1", Some("http"), "dep"),
            "web1!http!dep"
        );
    }

    #[test]
    fn parse_and_display_roundtrip() {
        for kind in RuleKind::ALL {
            assert_eq!(kind.to_string().parse::<RuleKind>(), Ok(kind));
        }
        assert!("Zone".parse::<RuleKind>().is_err());
        assert_eq!(RuleKind::Service.implicit_target(), "Host");
        assert_eq!(RuleKind::Dependency.implicit_target(), "Host");
    }
}
