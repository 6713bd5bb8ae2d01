//! Tests for the configuration loader module.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use vigil_core::Value;

use super::*;
use crate::apply::ApplyRuleRegistry;
use crate::schema::RuleKind;
use crate::store::{ObjectRegistry, ObjectStore};

const HOSTS_YAML: &str = r#"
# edge hosts
kind: Object
type: Host
name: web1
zone: dmz
vars:
  role: frontend
---
kind: Object
type: Host
name: db1
"#;

const RULES_YAML: &str = r#"
kind: Locals
vars:
  team: { lit: ops }
---
kind: Apply
type: Notification
name: mail
body:
  - set: { field: users, value: { array: [{ var: team }] } }
---
kind: Locals
vars:
  team: { lit: dev }
"#;

fn temp_loader() -> (TempDir, ConfigLoader) {
    let dir = TempDir::new().expect("create tempdir");
    let loader = ConfigLoader::new(dir.path().to_path_buf());
    (dir, loader)
}

#[test]
fn split_tracks_line_ranges() {
    let docs = split_documents("a: 1\nb: 2\n---\n\n# only a comment\n---\n\nc: 3\n\n");
    assert_eq!(docs.len(), 2);
    assert_eq!((docs[0].first_line, docs[0].last_line), (1, 2));
    assert_eq!((docs[1].first_line, docs[1].last_line), (8, 8));
    assert_eq!(docs[1].last_column, 4);
}

#[test]
fn load_objects_from_file() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("hosts.yml");
    fs::write(&path, HOSTS_YAML).unwrap();

    let rules = ApplyRuleRegistry::with_default_targets();
    let store = ObjectRegistry::new();
    let status = loader.load_file(&path, &rules, &store).unwrap();

    assert_eq!(status, LoadStatus::Loaded { objects: 2, rules: 0 });
    let web1 = store.get("Host", "web1").unwrap();
    assert_eq!(web1.zone(), "dmz");
    let origin = web1.origin.clone().unwrap();
    assert_eq!((origin.first_line, origin.last_line), (3, 8));
    assert!(origin.path.ends_with("hosts.yml"));
}

#[test]
fn apply_rule_closes_over_file_scope_snapshot() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("rules.yml");
    fs::write(&path, RULES_YAML).unwrap();

    let rules = ApplyRuleRegistry::with_default_targets();
    let store = ObjectRegistry::new();
    let status = loader.load_file(&path, &rules, &store).unwrap();
    assert_eq!(status, LoadStatus::Loaded { objects: 0, rules: 1 });

    let registered = rules.rules_for(RuleKind::Notification);
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].target_type(), "Host");
    assert_eq!(registered[0].closure_scope().get("team"), Some(&Value::from("ops")));
    assert_eq!(registered[0].origin().first_line, 6);
}

#[test]
fn load_all_skips_dotfiles_and_non_yaml() {
    let (dir, loader) = temp_loader();

    fs::write(dir.path().join("hosts.yml"), HOSTS_YAML).unwrap();
    fs::write(dir.path().join(".hidden.yml"), HOSTS_YAML).unwrap();
    fs::write(dir.path().join("readme.txt"), "not config").unwrap();

    let rules = ApplyRuleRegistry::with_default_targets();
    let store = ObjectRegistry::new();
    let results = loader.load_all(&rules, &store).unwrap();

    let loaded = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Loaded { .. }))
        .count();
    let skipped = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Skipped { .. }))
        .count();

    assert_eq!(loaded, 1);
    assert_eq!(skipped, 2);
    assert_eq!(store.len(), 2);
}

#[test]
fn load_all_recurses_in_path_order() {
    let (dir, loader) = temp_loader();
    fs::create_dir(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("b").join("rules.yml"), RULES_YAML).unwrap();
    fs::write(dir.path().join("a.yaml"), HOSTS_YAML).unwrap();

    let rules = ApplyRuleRegistry::with_default_targets();
    let store = ObjectRegistry::new();
    let results = loader.load_all(&rules, &store).unwrap();

    let names: Vec<_> = results
        .iter()
        .map(|r| r.path.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(names, vec![PathBuf::from("a.yaml"), PathBuf::from("b/rules.yml")]);
    assert_eq!(rules.rule_count(), 1);
}

#[test]
fn broken_file_does_not_abort_scan() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("a.yml"), "kind: Object\ntype: [unclosed\n").unwrap();
    fs::write(dir.path().join("b.yml"), HOSTS_YAML).unwrap();

    let rules = ApplyRuleRegistry::with_default_targets();
    let store = ObjectRegistry::new();
    let results = loader.load_all(&rules, &store).unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_failed());
    assert!(!results[1].is_failed());
    assert_eq!(store.len(), 2);
}

#[test]
fn parse_errors_leave_no_partial_state() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("mixed.yml");
    fs::write(&path, format!("{}---\nkind: Object\nname: [\n", HOSTS_YAML)).unwrap();

    let rules = ApplyRuleRegistry::with_default_targets();
    let store = ObjectRegistry::new();
    let err = loader.load_file(&path, &rules, &store).unwrap_err();

    assert!(matches!(err, LoaderError::Parse { .. }));
    assert!(store.is_empty());
}

#[test]
fn invalid_target_type_is_reported() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("bad.yml");
    fs::write(&path, "kind: Apply\ntype: Service\nname: ping\nto: Zone\n").unwrap();

    let rules = ApplyRuleRegistry::with_default_targets();
    let store = ObjectRegistry::new();
    let err = loader.load_file(&path, &rules, &store).unwrap_err();

    assert!(
        err.to_string().contains("Can't apply Service 'ping' to object type 'Zone'"),
        "{}",
        err
    );
    assert_eq!(rules.rule_count(), 0);
}

#[test]
fn duplicate_objects_are_reported() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("a.yml"), HOSTS_YAML).unwrap();
    fs::write(dir.path().join("b.yml"), "kind: Object\ntype: Host\nname: web1\n").unwrap();

    let rules = ApplyRuleRegistry::with_default_targets();
    let store = ObjectRegistry::new();
    let results = loader.load_all(&rules, &store).unwrap();

    match &results[1].status {
        LoadStatus::Failed { error } => {
            assert!(error.contains("An object with type 'Host' and name 'web1' already exists"))
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn missing_directory_loads_nothing() {
    let dir = TempDir::new().unwrap();
    let loader = ConfigLoader::new(dir.path().join("absent"));
    let results = loader
        .load_all(&ApplyRuleRegistry::with_default_targets(), &ObjectRegistry::new())
        .unwrap();
    assert!(results.is_empty());
}
