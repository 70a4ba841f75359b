// src/response/tests.rs
//!
//! Tests for descriptor construction and the serialized response shape
//!

use super::builder::format_date;
use super::*;
use crate::config::ConnectorConfig;
use crate::handlers::{Dimensions, ImageResizer, ImageSizer};
use crate::path::PathHandle;
use crate::Connector;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

struct FixedSizer;

impl ImageSizer for FixedSizer {
    fn dimensions(&self, _path: &Path) -> Option<Dimensions> {
        Some(Dimensions {
            width: 640,
            height: 480,
        })
    }
}

struct NoopResizer;

impl ImageResizer for NoopResizer {
    fn resize(&self, _path: &Path, _width: u32, _height: u32) -> io::Result<()> {
        Ok(())
    }
}

fn setup() -> (TempDir, PathHandle) {
    let dir = TempDir::new().unwrap();
    let root = PathHandle::new(dir.path().canonicalize().unwrap());

    fs::create_dir_all(root.join("beta/inner")).unwrap();
    fs::create_dir(root.join("Alpha")).unwrap();
    fs::create_dir(root.join("gamma")).unwrap();
    fs::create_dir(root.join(".hidden")).unwrap();
    fs::write(root.join("notes.txt"), "hello").unwrap();
    fs::write(root.join("photo.png"), [0u8; 16]).unwrap();
    fs::write(root.join(".env"), "KEY=1").unwrap();

    (dir, root)
}

fn connector(config: ConnectorConfig) -> Connector {
    Connector::new(config).unwrap()
}

fn find<'a>(nodes: &'a [NodeDescriptor], name: &str) -> &'a NodeDescriptor {
    nodes
        .iter()
        .find(|n| n.name == name)
        .unwrap_or_else(|| panic!("{name} not listed"))
}

// ============================================================================
// Directory Descriptors
// ============================================================================

#[test]
fn test_cwd_of_root_uses_home_label() {
    let (_dir, root) = setup();
    let connector = connector(ConnectorConfig::new(root.as_path(), "/files").with_home("Shared"));
    let cwd = connector.response_builder().cwd(&root);

    assert_eq!(cwd.rel, "Shared");
    assert_eq!(cwd.mime, "directory");
    assert_eq!(cwd.size, 0);
    assert_eq!(cwd.hash, connector.encode(&root));
    assert!(!cwd.perms.remove);
}

#[test]
fn test_cwd_of_subdirectory() {
    let (_dir, root) = setup();
    let connector = connector(ConnectorConfig::new(root.as_path(), "/files"));
    let cwd = connector.response_builder().cwd(&root.join("beta/inner"));

    assert_eq!(cwd.name, "inner");
    assert_eq!(cwd.rel, "Home/beta/inner");
    assert!(cwd.perms.remove);
}

// ============================================================================
// Entry Descriptors
// ============================================================================

#[test]
fn test_file_descriptor() {
    let (_dir, root) = setup();
    let connector = connector(ConnectorConfig::new(root.as_path(), "/files/"));
    let node = connector.response_builder().child(&root.join("notes.txt"));

    assert_eq!(node.name, "notes.txt");
    assert_eq!(node.mime.as_deref(), Some("text/plain"));
    assert_eq!(node.size, Some(5));
    assert_eq!(node.url.as_deref(), Some("/files/notes.txt"));
    assert!(node.resize.is_none());
    assert!(node.dim.is_none());
    assert!(node.link.is_none());
    assert!(!node.date.is_empty());
}

#[test]
fn test_directory_descriptor() {
    let (_dir, root) = setup();
    let connector = connector(ConnectorConfig::new(root.as_path(), "/files"));
    let node = connector.response_builder().child(&root.join("beta"));

    assert_eq!(node.mime.as_deref(), Some("directory"));
    assert_eq!(node.size, Some(0));
    assert!(node.url.is_none());
}

#[test]
fn test_image_metadata_requires_both_handlers() {
    let (_dir, root) = setup();

    let only_sizer = connector(
        ConnectorConfig::new(root.as_path(), "/files")
            .with_image_size_handler(Arc::new(FixedSizer)),
    );
    let node = only_sizer.response_builder().child(&root.join("photo.png"));
    assert_eq!(node.mime.as_deref(), Some("image/png"));
    assert!(node.resize.is_none());
    assert!(node.dim.is_none());

    let both = connector(
        ConnectorConfig::new(root.as_path(), "/files")
            .with_image_size_handler(Arc::new(FixedSizer))
            .with_image_resize_handler(Arc::new(NoopResizer)),
    );
    let node = both.response_builder().child(&root.join("photo.png"));
    assert_eq!(node.resize, Some(true));
    assert_eq!(node.dim.as_deref(), Some("640x480"));

    // non-images never get image fields
    let node = both.response_builder().child(&root.join("notes.txt"));
    assert!(node.resize.is_none());
}

#[cfg(unix)]
#[test]
fn test_symlink_descriptor_inside_root() {
    let (_dir, root) = setup();
    std::os::unix::fs::symlink(root.join("notes.txt"), root.join("shortcut")).unwrap();
    let connector = connector(ConnectorConfig::new(root.as_path(), "/files"));

    let node = connector.response_builder().child(&root.join("shortcut"));
    assert_eq!(node.link.as_deref(), Some(connector.encode(&root.join("notes.txt")).as_str()));
    assert_eq!(node.link_to.as_deref(), Some("Home/notes.txt"));
    assert_eq!(node.parent.as_deref(), Some(connector.encode(&root).as_str()));
    assert_eq!(node.size, Some(5));
}

#[cfg(unix)]
#[test]
fn test_symlink_descriptor_outside_root() {
    let (_dir, root) = setup();
    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("secret.txt"), "x").unwrap();
    std::os::unix::fs::symlink(outside.path().join("secret.txt"), root.join("leak")).unwrap();
    let connector = connector(ConnectorConfig::new(root.as_path(), "/files"));

    let node = connector.response_builder().child(&root.join("leak"));
    assert!(node.link.is_none());
    assert!(node.link_to.is_none());
    assert!(node.url.is_none());
}

#[test]
fn test_dot_files_hidden_when_disabled() {
    let (_dir, root) = setup();

    let shown = connector(ConnectorConfig::new(root.as_path(), "/files"));
    let names: Vec<_> = shown
        .response_builder()
        .children(&root)
        .into_iter()
        .map(|n| n.name)
        .collect();
    assert!(names.contains(&".env".to_string()));

    let hidden = connector(ConnectorConfig::new(root.as_path(), "/files").with_show_dot_files(false));
    let children = hidden.response_builder().children(&root);
    assert!(children.iter().all(|n| !n.name.starts_with('.')));
    find(&children, "notes.txt");
    assert!(hidden
        .response_builder()
        .root_tree()
        .dirs
        .iter()
        .all(|d| d.name != ".hidden"));
}

// ============================================================================
// Tree
// ============================================================================

#[test]
fn test_tree_contains_directories_sorted_case_insensitively() {
    let (_dir, root) = setup();
    let connector = connector(ConnectorConfig::new(root.as_path(), "/files").with_show_dot_files(false));
    let tree = connector.response_builder().root_tree();

    assert_eq!(tree.name, "Home");
    assert_eq!(tree.hash, connector.encode(&root));
    let names: Vec<_> = tree.dirs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "beta", "gamma"]);

    let beta = &tree.dirs[1];
    assert_eq!(beta.dirs.len(), 1);
    assert_eq!(beta.dirs[0].name, "inner");
    assert!(beta.dirs[0].dirs.is_empty());
}

#[cfg(unix)]
#[test]
fn test_tree_survives_directory_cycles() {
    let (_dir, root) = setup();
    std::os::unix::fs::symlink(root.as_path(), root.join("beta/inner/loop")).unwrap();
    let connector = connector(ConnectorConfig::new(root.as_path(), "/files").with_show_dot_files(false));

    let tree = connector.response_builder().root_tree();
    let inner = &tree.dirs[1].dirs[0];
    assert_eq!(inner.dirs.len(), 1);
    assert_eq!(inner.dirs[0].name, "loop");
    assert!(inner.dirs[0].dirs.is_empty());
}

#[cfg(unix)]
#[test]
fn test_tree_leaves_out_directories_outside_root() {
    let (_dir, root) = setup();
    let outside = TempDir::new().unwrap();
    fs::create_dir(outside.path().join("elsewhere")).unwrap();
    std::os::unix::fs::symlink(outside.path(), root.join("escape")).unwrap();
    std::os::unix::fs::symlink(root.join("gamma"), root.join("shortcut")).unwrap();
    let connector = connector(ConnectorConfig::new(root.as_path(), "/files").with_show_dot_files(false));

    let tree = connector.response_builder().root_tree();
    let names: Vec<_> = tree.dirs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "beta", "gamma", "shortcut"]);
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_are_skipped() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let (_dir, root) = setup();
    fs::write(root.join(OsStr::from_bytes(b"bad\xff.txt")), "x").unwrap();
    fs::create_dir(root.join(OsStr::from_bytes(b"dir\xfe"))).unwrap();
    let connector = connector(ConnectorConfig::new(root.as_path(), "/files"));
    let builder = connector.response_builder();

    let children = builder.children(&root);
    assert_eq!(children.len(), 7);
    assert!(children.iter().all(|n| !n.name.contains('\u{fffd}')));
    assert!(builder.root_tree().dirs.iter().all(|d| !d.name.contains('\u{fffd}')));
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_format_date() {
    let time = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    assert_eq!(format_date(Some(time)), "2023-11-14 22:13:20 +0000");
    assert_eq!(format_date(None), "");
    assert!(!format_date(Some(SystemTime::now())).is_empty());
}

#[test]
fn test_response_omits_unset_fields() {
    let mut response = Response {
        error: Some("Access Denied".to_string()),
        ..Default::default()
    };
    response.add_error_data("a.txt", "already exists in '.'");

    let json: serde_json::Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "error": "Access Denied",
            "errorData": {"a.txt": "already exists in '.'"}
        })
    );
    assert!(response.has_error());
}

#[test]
fn test_descriptor_flattens_capabilities() {
    let (_dir, root) = setup();
    let connector = connector(ConnectorConfig::new(root.as_path(), "/files"));
    let node = connector.response_builder().child(&root.join("beta"));

    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["read"], true);
    assert_eq!(json["write"], true);
    assert_eq!(json["rm"], true);
    assert!(json.get("perms").is_none());
    assert!(json.get("url").is_none());
    assert!(json.get("linkTo").is_none());
}

#[test]
fn test_init_params_keys() {
    let (_dir, root) = setup();
    let connector = connector(ConnectorConfig::new(root.as_path(), "/files"));
    let json = serde_json::to_value(connector.response_builder().init_params()).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "dotFiles": true,
            "uplMaxSize": "50M",
            "archives": [],
            "extract": [],
            "url": "/files"
        })
    );
}
