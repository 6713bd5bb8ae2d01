//! Tests for schema types.

use vigil_core::{DebugInfo, Scope, Value};

use super::*;
use crate::expr::Expr;

const APPLY_YAML: &str = r#"
kind: Apply
type: Dependency
name: uplink
assign:
  - match: [{ lit: "web*" }, { var: host.name }]
  - eq: [{ var: host.vars.role }, { lit: frontend }]
ignore:
  - eq: [{ var: host.zone }, { lit: lab }]
for:
  key: idx
  in: { lit: [1, 2] }
body:
  - set: { field: parent_host_name, value: { lit: router } }
"#;

const SERVICE_YAML: &str = r#"
kind: Object
type: Service
name: http
host_name: web1
zone: dmz
vars:
  port: 80
attrs:
  check_command: http
"#;

fn parse(yaml: &str) -> ConfigDocument {
    let envelope: DocumentEnvelope = serde_yaml::from_str(yaml).unwrap();
    envelope.parse_full().unwrap()
}

#[test]
fn parse_apply_document() {
    let doc = parse(APPLY_YAML);
    assert_eq!(doc.kind(), DocumentKind::Apply);

    let apply = doc.as_apply().unwrap();
    assert_eq!(apply.kind, RuleKind::Dependency);
    assert_eq!(apply.name, "uplink");
    assert_eq!(apply.target_type(), "Host");
    assert_eq!(apply.assign.len(), 2);
    assert_eq!(apply.ignore.len(), 1);

    let clause = apply.for_clause.as_ref().unwrap();
    assert_eq!(clause.key.as_deref(), Some("idx"));
    assert!(clause.value.is_none());
    assert!(clause.source.is_some());
}

#[test]
fn effective_filter_combines_assign_and_ignore() {
    let doc = parse(APPLY_YAML);
    let filter = doc.as_apply().unwrap().effective_filter().unwrap();
    match filter {
        Expr::And(parts) => {
            assert_eq!(parts.len(), 2);
            assert!(matches!(parts[0], Expr::Or(ref any) if any.len() == 2));
            assert!(matches!(parts[1], Expr::Not(_)));
        }
        other => panic!("expected and, got {:?}", other),
    }
}

#[test]
fn effective_filter_drops_absent_parts() {
    let mut def = parse(APPLY_YAML).as_apply().unwrap().clone();
    def.assign.clear();
    def.ignore.clear();
    assert!(def.effective_filter().is_none());

    def.filter = Some(Expr::lit(true));
    assert_eq!(def.effective_filter(), Some(Expr::lit(true)));
}

#[test]
fn apply_definition_builds_rule() {
    let doc = parse(APPLY_YAML);
    let origin = DebugInfo::new("conf.d/deps.yml", 2, 16);
    let rule = doc
        .as_apply()
        .unwrap()
        .to_rule(Scope::new().freeze(), origin.clone())
        .unwrap();

    assert_eq!(rule.name(), "uplink");
    assert_eq!(rule.target_type(), "Host");
    assert_eq!(rule.key_var(), Some("idx"));
    assert_eq!(rule.body().len(), 1);
    assert_eq!(rule.origin(), &origin);
}

#[test]
fn for_clause_without_source_is_rejected() {
    let yaml = r#"
kind: Apply
type: Service
name: disk
for: { key: mount }
"#;
    let doc = parse(yaml);
    let err = doc
        .as_apply()
        .unwrap()
        .to_rule(Scope::new().freeze(), DebugInfo::default())
        .unwrap_err();
    assert!(matches!(err, crate::apply::DefinitionError::LoopVarsWithoutSource { .. }));
}

#[test]
fn unknown_fields_are_rejected() {
    let yaml = r#"
kind: Apply
type: Service
name: disk
filtr: { lit: true }
"#;
    let envelope: DocumentEnvelope = serde_yaml::from_str(yaml).unwrap();
    let err = envelope.parse_full().unwrap_err();
    assert!(err.contains("filtr"), "{}", err);
}

#[test]
fn unknown_kind_is_rejected() {
    let envelope: DocumentEnvelope = serde_yaml::from_str("kind: Zone\nname: master\n").unwrap();
    assert!(envelope.parse_full().unwrap_err().contains("unknown document kind"));
}

#[test]
fn service_object_is_qualified_by_host() {
    let doc = parse(SERVICE_YAML);
    let def = doc.as_object().unwrap();
    let object = def.to_object(DebugInfo::new("conf.d/web.yml", 1, 9)).unwrap();

    assert_eq!(object.name, "web1!http");
    assert_eq!(object.short_name(), "http");
    assert_eq!(object.zone(), "dmz");
    assert_eq!(object.get("vars").and_then(|v| v.get("port")), Some(&Value::Number(80.0)));
    assert_eq!(object.get("check_command"), Some(&Value::from("http")));
}

#[test]
fn service_without_host_is_rejected() {
    let mut def = parse(SERVICE_YAML).as_object().unwrap().clone();
    def.host_name = None;
    assert!(def.to_object(DebugInfo::default()).is_err());
}

#[test]
fn locals_see_earlier_bindings() {
    let yaml = r#"
kind: Locals
vars:
  domain: { lit: example.org }
  mail: { concat: [{ lit: "ops@" }, { var: domain }] }
"#;
    let doc = parse(yaml);
    let ConfigDocument::Locals(locals) = doc else {
        panic!("expected locals");
    };
    let mut scope = Scope::new();
    locals.apply_to(&mut scope).unwrap();
    assert_eq!(scope.get("mail"), Some(&Value::from("ops@example.org")));
}

#[test]
fn unit_kind_and_nested_vars_read_alongside_expressions() {
    let yaml = r#"
kind: Object
type: Host
name: web1
vars:
  disks:
    "/var": { disk_wfree: 10, tags: [ssd] }
"#;
    let object = parse(yaml).as_object().unwrap().to_object(DebugInfo::default()).unwrap();
    let disks = object.get("vars").and_then(|v| v.get("disks")).unwrap();
    let var = disks.get("/var").unwrap();
    assert_eq!(var.get("disk_wfree"), Some(&Value::Number(10.0)));

    for kind in RuleKind::ALL {
        let yaml = format!("kind: Apply\ntype: {}\nname: r\nfilter: {{ lit: true }}\n", kind);
        let apply = parse(&yaml).as_apply().unwrap().clone();
        assert_eq!(apply.kind, kind);
        assert_eq!(apply.filter, Some(Expr::lit(true)));
    }
}
