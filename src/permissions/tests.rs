// src/permissions/tests.rs
// Tests for capability resolution and rule matching

use super::*;
use crate::path::PathHandle;
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, PathHandle) {
    let dir = TempDir::new().unwrap();
    let root = PathHandle::new(dir.path().canonicalize().unwrap());
    fs::create_dir_all(root.join("docs/private")).unwrap();
    fs::write(root.join("docs/readme.txt"), "hello").unwrap();
    fs::write(root.join("docs/private/key.pem"), "secret").unwrap();
    (dir, root)
}

fn resolver(root: &PathHandle, rules: Vec<PermissionRule>) -> PermissionResolver {
    PermissionResolver::new(root.clone(), CapabilitySet::ALL, rules)
}

// ============================================================================
// Basic Resolution
// ============================================================================

#[test]
fn test_everything_allowed_by_default() {
    let (_dir, root) = setup();
    let resolver = resolver(&root, vec![]);

    assert_eq!(resolver.resolve(&root.join("docs")), CapabilitySet::ALL);
    assert_eq!(
        resolver.resolve(&root.join("docs/readme.txt")),
        CapabilitySet::ALL
    );
}

#[test]
fn test_root_is_never_removable() {
    let (_dir, root) = setup();
    let caps = resolver(&root, vec![]).resolve(&root);

    assert!(caps.read);
    assert!(caps.write);
    assert!(!caps.remove);
}

#[test]
fn test_missing_path_has_no_capabilities() {
    let (_dir, root) = setup();
    let caps = resolver(&root, vec![]).resolve(&root.join("nope.txt"));

    assert_eq!(caps, CapabilitySet::NONE);
}

#[test]
fn test_defaults_cap_everything() {
    let (_dir, root) = setup();
    let defaults = CapabilitySet {
        read: true,
        write: false,
        remove: true,
    };
    let resolver = PermissionResolver::new(root.clone(), defaults, vec![]);

    let caps = resolver.resolve(&root.join("docs"));
    assert!(caps.read);
    assert!(!caps.write);
    // remove requires write
    assert!(!caps.remove);
}

// ============================================================================
// Write / Remove Coupling
// ============================================================================

#[test]
fn test_file_write_and_remove_are_coupled() {
    let (_dir, root) = setup();
    let no_remove = resolver(
        &root,
        vec![PermissionRule::new(RulePattern::Exact("docs/readme.txt".into())).deny_remove()],
    );

    let caps = no_remove.resolve(&root.join("docs/readme.txt"));
    assert!(caps.read);
    assert!(!caps.write, "a file that cannot be removed cannot be written");
    assert!(!caps.remove);
}

#[test]
fn test_directory_write_survives_remove_denial() {
    let (_dir, root) = setup();
    let no_remove = resolver(
        &root,
        vec![PermissionRule::new(RulePattern::Exact("docs".into())).deny_remove()],
    );

    let caps = no_remove.resolve(&root.join("docs"));
    assert!(caps.write);
    assert!(!caps.remove);
}

#[cfg(unix)]
#[test]
fn test_readonly_file_is_neither_writable_nor_removable() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, root) = setup();
    let file = root.join("docs/readme.txt");
    fs::set_permissions(&file, fs::Permissions::from_mode(0o444)).unwrap();

    let caps = resolver(&root, vec![]).resolve(&file);
    assert!(caps.read);
    assert!(!caps.write);
    assert!(!caps.remove);
}

// ============================================================================
// Rule Matching
// ============================================================================

#[test]
fn test_exact_rule_matches_only_that_path() {
    let (_dir, root) = setup();
    let resolver = resolver(
        &root,
        vec![PermissionRule::new(RulePattern::Exact("docs".into())).deny_read()],
    );

    assert!(!resolver.resolve(&root.join("docs")).read);
    assert!(resolver.resolve(&root.join("docs/readme.txt")).read);
}

#[test]
fn test_regex_rule_is_unanchored() {
    let (_dir, root) = setup();
    let resolver = resolver(
        &root,
        vec![PermissionRule::new(RulePattern::regex(r"private").unwrap()).deny_write()],
    );

    assert!(!resolver.resolve(&root.join("docs/private")).write);
    assert!(!resolver.resolve(&root.join("docs/private/key.pem")).write);
    assert!(resolver.resolve(&root.join("docs/readme.txt")).write);
}

#[test]
fn test_root_rule_uses_dot() {
    let (_dir, root) = setup();
    let resolver = resolver(
        &root,
        vec![PermissionRule::new(RulePattern::Exact(".".into())).deny_write()],
    );

    assert!(!resolver.resolve(&root).write);
    assert!(resolver.resolve(&root.join("docs")).write);
}

#[test]
fn test_any_matching_deny_wins() {
    let (_dir, root) = setup();
    let allow = PermissionRule {
        pattern: RulePattern::regex(r"^docs").unwrap(),
        read: Some(true),
        write: Some(true),
        remove: Some(true),
    };
    let deny = PermissionRule::new(RulePattern::regex(r"\.txt$").unwrap()).deny_read();
    let resolver = resolver(&root, vec![allow, deny]);

    assert!(!resolver.resolve(&root.join("docs/readme.txt")).read);
    assert!(resolver.resolve(&root.join("docs")).read);
}

#[test]
fn test_allow_override_cannot_beat_defaults() {
    let (_dir, root) = setup();
    let defaults = CapabilitySet {
        read: false,
        write: true,
        remove: true,
    };
    let allow = PermissionRule {
        pattern: RulePattern::Exact("docs".into()),
        read: Some(true),
        write: None,
        remove: None,
    };
    let resolver = PermissionResolver::new(root.clone(), defaults, vec![allow]);

    assert!(!resolver.resolve(&root.join("docs")).read);
}

#[test]
fn test_invalid_regex_is_a_config_error() {
    let err = RulePattern::regex("([unclosed").unwrap_err();
    assert!(err.to_string().contains("([unclosed"));
}

#[test]
fn test_rule_from_config_entry() {
    let spec: RuleSpec =
        serde_json::from_str(r#"{"pattern": "^tmp/", "regex": true, "rm": false}"#).unwrap();
    let rule = PermissionRule::try_from(spec).unwrap();

    assert!(rule.pattern.matches("tmp/a"));
    assert!(!rule.pattern.matches("a/tmp/b"));
    assert!(rule.denies(Capability::Remove));
    assert!(!rule.denies(Capability::Read));
    assert!(!rule.denies(Capability::Write));
}

// ============================================================================
// Destination Checks
// ============================================================================

#[test]
fn test_can_create_follows_parent_and_rules() {
    let (_dir, root) = setup();
    let resolver = resolver(
        &root,
        vec![PermissionRule::new(RulePattern::Exact("docs/blocked".into())).deny_write()],
    );

    assert!(resolver.can_create(&root.join("docs/new.txt")));
    assert!(!resolver.can_create(&root.join("docs/blocked")));
    assert!(!resolver.can_create(&root.join("missing/new.txt")));
}

#[test]
fn test_capabilities_serialize_with_rm_key() {
    let json = serde_json::to_value(CapabilitySet::ALL).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"read": true, "write": true, "rm": true})
    );
}
