//! Integration tests for the virtual filesystem.
//!
//! Covers the atomicity guarantees of structural edits and the
//! write/read and delete properties over generated paths.

use proptest::prelude::*;
use studio_vfs::{ChangeKind, Vfs, VfsBuilder, VfsPath, VfsSnapshot};

fn project() -> Vfs {
    VfsBuilder::new()
        .add_file(
            "/App.jsx",
            "import Button from '@/components/Button';\n\
             export default function App() { return <Button />; }",
        )
        .add_file(
            "/components/Button.jsx",
            "export default function Button() { return <button>Hi</button>; }",
        )
        .add_file("/components/forms/Input.jsx", "export default () => <input />;")
        .add_file("/styles/app.css", "body { margin: 0; }")
        .build()
        .unwrap()
}

#[test]
fn test_failed_rename_is_byte_for_byte_unchanged() {
    let mut vfs = project();
    let before = vfs.snapshot().to_json().unwrap();
    let revision = vfs.revision();

    assert!(vfs.rename("/components", "/App.jsx").unwrap_err().is_conflict());
    assert!(
        vfs.rename("/components", "/components/forms/inner")
            .unwrap_err()
            .is_cyclic_move()
    );
    assert!(vfs.rename("/missing", "/x").unwrap_err().is_not_found());

    assert_eq!(vfs.snapshot().to_json().unwrap(), before);
    assert_eq!(vfs.revision(), revision);
    assert!(vfs.pending_changes().is_empty());
}

#[test]
fn test_move_into_new_directory_tree() {
    let mut vfs = project();
    let pairs = vfs.rename("/components", "/src/ui/components").unwrap();

    assert_eq!(pairs.len(), 4);
    assert!(vfs.is_dir("/src/ui"));
    assert!(vfs.is_file("/src/ui/components/forms/Input.jsx"));

    let changes = vfs.take_changes();
    let old = VfsPath::parse("/components/Button.jsx").unwrap();
    let new = VfsPath::parse("/src/ui/components/Button.jsx").unwrap();
    assert_eq!(changes.kind_of(&old), Some(ChangeKind::Deleted));
    assert_eq!(changes.kind_of(&new), Some(ChangeKind::Created));
}

#[test]
fn test_move_back_and_forth_coalesces_to_modified() {
    let mut vfs = project();
    vfs.rename("/App.jsx", "/Main.jsx").unwrap();
    vfs.rename("/Main.jsx", "/App.jsx").unwrap();

    let changes = vfs.take_changes();
    let app = VfsPath::parse("/App.jsx").unwrap();
    assert_eq!(changes.kind_of(&app), Some(ChangeKind::Modified));
    assert!(!changes.contains(&VfsPath::parse("/Main.jsx").unwrap()));
}

#[test]
fn test_delete_directory_then_descendant_reads_fail() {
    let mut vfs = project();
    vfs.delete("/components").unwrap();

    for path in [
        "/components",
        "/components/Button.jsx",
        "/components/forms",
        "/components/forms/Input.jsx",
    ] {
        assert!(!vfs.exists(path), "{path} should be gone");
    }
    assert!(vfs.read("/components/Button.jsx").unwrap_err().is_not_found());
    assert_eq!(vfs.file_count(), 2);
}

#[test]
fn test_snapshot_roundtrip_through_json() {
    let vfs = project();
    let json = vfs.snapshot().to_json().unwrap();
    let restored = Vfs::from_snapshot(&VfsSnapshot::from_json(&json).unwrap()).unwrap();

    assert_eq!(restored.file_paths(), vfs.file_paths());
    for path in vfs.file_paths() {
        assert_eq!(restored.read(&path).unwrap(), vfs.read(&path).unwrap());
    }
}

#[test]
fn test_revision_strictly_increases() {
    let mut vfs = Vfs::new();
    let mut last = vfs.revision();
    vfs.write("/a.js", "1").unwrap();
    assert!(vfs.revision() > last);
    last = vfs.revision();
    vfs.create_dir("/dir").unwrap();
    assert!(vfs.revision() > last);
    last = vfs.revision();
    vfs.rename("/a.js", "/dir/a.js").unwrap();
    assert!(vfs.revision() > last);
    last = vfs.revision();
    vfs.delete("/dir").unwrap();
    assert!(vfs.revision() > last);
}

fn segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,8}(\\.[a-z]{1,3})?"
}

fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..5).prop_map(|segments| format!("/{}", segments.join("/")))
}

proptest! {
    #[test]
    fn prop_write_then_read_returns_content(path in path_strategy(), content in ".*") {
        let mut vfs = Vfs::new();
        vfs.write(&path, content.clone()).unwrap();
        prop_assert_eq!(vfs.read(&path).unwrap(), content.as_str());
    }

    #[test]
    fn prop_every_ancestor_is_directory(path in path_strategy()) {
        let mut vfs = Vfs::new();
        vfs.write(&path, "x").unwrap();
        let parsed = VfsPath::parse(&path).unwrap();
        for ancestor in parsed.ancestors() {
            prop_assert!(vfs.is_dir(&ancestor));
        }
    }

    #[test]
    fn prop_delete_removes_subtree(
        dir in segment(),
        children in prop::collection::vec(path_strategy(), 1..6),
    ) {
        let mut vfs = Vfs::new();
        vfs.write("/outside.js", "kept").unwrap();
        let mut written = Vec::new();
        for child in &children {
            let full = format!("/d_{dir}{child}");
            // Generated children may collide with a file-as-directory; skip those.
            if vfs.write(&full, "x").is_ok() {
                written.push(full);
            }
        }

        vfs.delete(format!("/d_{dir}")).unwrap();
        for full in &written {
            prop_assert!(vfs.read(full).unwrap_err().is_not_found());
        }
        prop_assert_eq!(vfs.read("/outside.js").unwrap(), "kept");
    }
}
