//! Integration test: drive the wharf CLI against a temporary state root.
//!
//! Seeds the disk-backed image graph and repository index directly, then
//! exercises the built `wharf` binary:
//!
//! 1. List images and verify bindings show up
//! 2. Delete by tag and verify untag + delete output, in order
//! 3. Verify not-found and conflict reporting
//! 4. Recover supervisor status for a container with no reports

use std::path::Path;
use std::process::Command;

use chrono::Utc;
use tempfile::TempDir;
use wharf_engine::{DiskImageGraph, DiskTagStore, Image, TagStore};

/// Run the wharf binary and return (stdout, stderr, success).
fn run_wharf(root: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_wharf"))
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("failed to run wharf");
    (
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
        output.status.success(),
    )
}

fn seed_image(root: &Path, id: &str, parent: Option<&str>) {
    let graph = DiskImageGraph::open(&root.join("graph")).unwrap();
    graph
        .insert(Image {
            id: id.to_string(),
            parent: parent.map(String::from),
            created: Utc::now(),
            last_use_time: None,
            size_bytes: 1024,
        })
        .unwrap();
}

fn seed_binding(root: &Path, repo: &str, tag: &str, id: &str) {
    let tags = DiskTagStore::open(&root.join("repositories")).unwrap();
    tags.set(repo, tag, id).unwrap();
}

#[test]
fn test_images_then_rmi_lifecycle() {
    let tmp = TempDir::new().unwrap();
    seed_image(tmp.path(), "aabbccddeeff", None);
    seed_binding(tmp.path(), "busybox", "latest", "aabbccddeeff");

    let (stdout, _, ok) = run_wharf(tmp.path(), &["images"]);
    assert!(ok);
    assert!(stdout.contains("busybox:latest"));
    assert!(stdout.contains("aabbccddeeff"));

    let (stdout, _, ok) = run_wharf(tmp.path(), &["rmi", "busybox:latest"]);
    assert!(ok, "rmi failed: {stdout}");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "Untagged: busybox:latest");
    assert_eq!(lines[1], "Deleted: aabbccddeeff");

    // A second delete of the same reference no longer resolves.
    let (_, stderr, ok) = run_wharf(tmp.path(), &["rmi", "busybox:latest"]);
    assert!(!ok);
    assert!(stderr.contains("No such image: busybox:latest"));
}

#[test]
fn test_rmi_reports_conflict_when_nothing_was_deleted() {
    let tmp = TempDir::new().unwrap();
    seed_image(tmp.path(), "parent0000", None);
    seed_image(tmp.path(), "child00000", Some("parent0000"));

    // The parent is untagged but pinned by its child: no effects.
    let (_, stderr, ok) = run_wharf(tmp.path(), &["rmi", "parent0000"]);
    assert!(!ok);
    assert!(stderr.contains("Conflict, parent0000 wasn't deleted"));
}

#[test]
fn test_tag_creates_a_new_binding() {
    let tmp = TempDir::new().unwrap();
    seed_image(tmp.path(), "aabbccddeeff", None);
    seed_binding(tmp.path(), "busybox", "latest", "aabbccddeeff");

    let (stdout, _, ok) = run_wharf(tmp.path(), &["tag", "aabbcc", "mirror/busybox:v1"]);
    assert!(ok, "tag failed: {stdout}");

    let (stdout, _, ok) = run_wharf(tmp.path(), &["images"]);
    assert!(ok);
    assert!(stdout.contains("mirror/busybox:v1"));
}

#[test]
fn test_status_with_no_reports_is_absent_not_an_error() {
    let tmp = TempDir::new().unwrap();

    let (stdout, _, ok) = run_wharf(tmp.path(), &["status", "unknown-container"]);
    assert!(ok);
    assert!(stdout.contains("start: not recorded"));
    assert!(stdout.contains("stop: not recorded"));
}
