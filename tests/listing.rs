mod common;

use arcview::{ErrorCategory, ListingResult, list_local};
use common::{mark_zip_encrypted, write_zip};
use tempfile::tempdir;

fn child_names(result: &ListingResult) -> Vec<(&str, bool)> {
    result
        .children()
        .map(|e| (e.name.as_str(), e.is_dir))
        .collect()
}

#[tokio::test]
async fn test_single_file_at_root() {
    let dir = tempdir().unwrap();
    let docs = write_zip(dir.path(), "docs.zip", &[("readme.txt", b"0123456789")]);

    let result = list_local(&docs, "").await.unwrap();

    assert!(result.success);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].name, "readme.txt");
    assert_eq!(result.entries[0].path, "readme.txt");
    assert!(!result.entries[0].is_dir);
    assert_eq!(result.file_count, 1);
    assert_eq!(result.total_size, 10);
    assert!(result.breadcrumbs.is_empty());
    assert!(result.is_root);
    assert!(!result.is_rar_family);
}

#[tokio::test]
async fn test_nested_navigation() {
    let dir = tempdir().unwrap();
    let nested = write_zip(dir.path(), "nested.zip", &[("a/b/c.txt", b"abc")]);

    let root = list_local(&nested, "").await.unwrap();
    assert_eq!(child_names(&root), [("a", true)]);
    assert_eq!(root.entries[0].size, 0);

    let a = list_local(&nested, "a").await.unwrap();
    assert_eq!(child_names(&a), [("b", true)]);
    assert_eq!(a.entries[0].path, "a/b");
    assert_eq!(a.breadcrumbs.len(), 1);
    assert_eq!(a.breadcrumbs[0].name, "a");
    assert_eq!(a.breadcrumbs[0].path, "a");
    assert_eq!(a.parent_subpath, "");
    assert!(!a.is_root);

    let ab = list_local(&nested, "a/b").await.unwrap();
    assert_eq!(child_names(&ab), [("c.txt", false)]);
    assert_eq!(ab.entries.len(), 1);
    assert_eq!(ab.entries[0].path, "a/b/c.txt");
    assert_eq!(ab.parent_subpath, "a");
    assert_eq!(ab.breadcrumbs.len(), 2);
    assert!(ab.breadcrumbs[1].is_last);
}

#[tokio::test]
async fn test_shared_parents_are_deduplicated() {
    let dir = tempdir().unwrap();
    let container = write_zip(
        dir.path(),
        "dedup.zip",
        &[("a/b/x.txt", b"x"), ("a/b/y.txt", b"yy"), ("a/", b""), ("a/b/", b"")],
    );

    let result = list_local(&container, "").await.unwrap();

    let dirs: Vec<_> = result
        .entries
        .iter()
        .filter(|e| e.is_dir)
        .map(|e| e.path.as_str())
        .collect();
    assert_eq!(dirs, ["a", "a/b"]);
    assert_eq!(result.file_count, 2);
    assert_eq!(result.total_size, 3);
}

#[tokio::test]
async fn test_counts_and_scope_properties() {
    let dir = tempdir().unwrap();
    let container = write_zip(
        dir.path(),
        "mixed.zip",
        &[
            ("music/rock/one.mp3", &[1u8; 100]),
            ("music/rock/two.mp3", &[2u8; 50]),
            ("music/jazz/three.mp3", &[3u8; 25]),
            ("musical.txt", b"not in scope"),
            ("photos/cat.jpg", &[4u8; 7]),
        ],
    );

    for subpath in ["", "music", "music/rock", "photos"] {
        let result = list_local(&container, subpath).await.unwrap();
        assert!(result.success);

        let files: Vec<_> = result.entries.iter().filter(|e| !e.is_dir).collect();
        assert_eq!(result.file_count, files.len() as u64);
        assert_eq!(result.total_size, files.iter().map(|e| e.size).sum::<u64>());

        let segments = subpath.split('/').filter(|s| !s.is_empty()).count();
        assert_eq!(result.breadcrumbs.len(), segments);

        if !subpath.is_empty() {
            let prefix = format!("{subpath}/");
            assert!(
                result
                    .entries
                    .iter()
                    .all(|e| e.path == subpath || e.path.starts_with(&prefix)),
                "entry outside {subpath}"
            );
        }
    }

    let music = list_local(&container, "music").await.unwrap();
    assert_eq!(child_names(&music), [("jazz", true), ("rock", true)]);
    assert_eq!(music.total_size, 175);
}

#[tokio::test]
async fn test_sort_order() {
    let dir = tempdir().unwrap();
    let container = write_zip(
        dir.path(),
        "sort.zip",
        &[
            ("zeta.txt", b"z"),
            ("Alpha.txt", b"a"),
            ("beta/inside.txt", b"b"),
            ("Gamma/inside.txt", b"g"),
        ],
    );

    let result = list_local(&container, "").await.unwrap();
    assert_eq!(
        child_names(&result),
        [
            ("beta", true),
            ("Gamma", true),
            ("Alpha.txt", false),
            ("zeta.txt", false)
        ]
    );
}

#[tokio::test]
async fn test_listing_is_idempotent() {
    let dir = tempdir().unwrap();
    let container = write_zip(
        dir.path(),
        "same.zip",
        &[("a/b/c.txt", b"abc"), ("a/d.txt", b"d"), ("e.txt", b"eeee")],
    );

    let first = list_local(&container, "a").await.unwrap();
    let second = list_local(&container, "a").await.unwrap();
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[tokio::test]
async fn test_subpath_naming_a_file_is_empty() {
    let dir = tempdir().unwrap();
    let container = write_zip(dir.path(), "file.zip", &[("a/b/c.txt", b"abc")]);

    let result = list_local(&container, "a/b/c.txt").await.unwrap();
    assert!(result.success);
    assert!(result.entries.is_empty());
    assert_eq!(result.file_count, 0);
    assert_eq!(result.parent_subpath, "a/b");
}

#[tokio::test]
async fn test_backslash_subpath_is_canonicalized() {
    let dir = tempdir().unwrap();
    let container = write_zip(dir.path(), "win.zip", &[("a/b/c.txt", b"abc")]);

    let result = list_local(&container, "a\\b/").await.unwrap();
    assert_eq!(result.current_subpath, "a/b");
    assert_eq!(child_names(&result), [("c.txt", false)]);
}

#[tokio::test]
async fn test_empty_archive_is_an_empty_success() {
    let dir = tempdir().unwrap();
    let container = write_zip(dir.path(), "empty.zip", &[]);

    let result = list_local(&container, "").await.unwrap();
    assert!(result.success);
    assert!(result.entries.is_empty());
    assert_eq!(result.file_count, 0);
}

#[tokio::test]
async fn test_failures_are_results() {
    let dir = tempdir().unwrap();

    let missing = list_local(&dir.path().join("missing.zip"), "").await.unwrap();
    assert!(!missing.success);
    assert_eq!(missing.category, Some(ErrorCategory::NotFound));

    let directory = list_local(dir.path(), "").await.unwrap();
    assert!(!directory.success);
    assert_eq!(directory.category, Some(ErrorCategory::NotAFile));

    let corrupt = dir.path().join("corrupt.zip");
    std::fs::write(&corrupt, b"PK\x03\x04 this is not really a zip file").unwrap();
    let result = list_local(&corrupt, "").await.unwrap();
    assert!(!result.success);
    assert_eq!(result.category, Some(ErrorCategory::CorruptArchive));
    assert!(result.entries.is_empty());

    let text = dir.path().join("notes.txt");
    std::fs::write(&text, b"plain text").unwrap();
    let result = list_local(&text, "").await.unwrap();
    assert!(!result.success);
    assert_eq!(result.category, Some(ErrorCategory::UnsupportedFeature));
}

#[tokio::test]
async fn test_encrypted_zip_is_unsupported() {
    let dir = tempdir().unwrap();
    let container = write_zip(dir.path(), "secret.zip", &[("secret.txt", b"hidden")]);
    mark_zip_encrypted(&container);

    let result = list_local(&container, "").await.unwrap();
    assert!(!result.success);
    assert_eq!(result.category, Some(ErrorCategory::UnsupportedFeature));
    assert!(result.entries.is_empty());
    assert!(result.error.unwrap().contains("password"));
}

#[tokio::test]
async fn test_cbz_extension_is_zip() {
    let dir = tempdir().unwrap();
    let comic = write_zip(
        dir.path(),
        "issue.cbz",
        &[("pages/001.jpg", b"jpg"), ("pages/002.jpg", b"jpg")],
    );

    let result = list_local(&comic, "pages").await.unwrap();
    assert!(result.success);
    assert_eq!(result.file_count, 2);
    assert!(!result.is_rar_family);
}

#[tokio::test]
async fn test_unusable_leading_name_is_skipped() {
    let dir = tempdir().unwrap();
    let container = write_zip(
        dir.path(),
        "dotted.zip",
        &[(".", b"x"), ("./", b""), ("ok.txt", b"fine")],
    );

    let result = list_local(&container, "").await.unwrap();
    assert!(result.success);
    assert_eq!(child_names(&result), vec![("ok.txt", false)]);
    assert_eq!(result.file_count, 1);
    assert_eq!(result.total_size, 4);
}
