//! Handle lifecycle, repository creation and concurrent readers

mod common;

use std::thread;
use svnlens_core::engine::runtime;
use svnlens_core::{DiskEngine, Error, QueryConfig, Repository, RepositoryEngine};
use tempfile::TempDir;

#[test]
fn test_queries_fail_after_close() {
    let tmp = common::fixture();
    let mut repo = Repository::open(tmp.path()).unwrap();
    repo.close().unwrap();

    assert!(matches!(repo.latest_revision(), Err(Error::Closed)));
    assert!(matches!(repo.commit_info(1), Err(Error::Closed)));
    assert!(matches!(repo.tree("trunk", 1), Err(Error::Closed)));
    assert!(matches!(repo.file_content("trunk/TODO", 6), Err(Error::Closed)));
    assert!(matches!(repo.diff("trunk/TODO", 6), Err(Error::Closed)));
    assert!(matches!(repo.changeset(6, true), Err(Error::Closed)));
    assert!(matches!(repo.close(), Err(Error::Closed)));
}

#[test]
fn test_open_rejects_non_repository() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("format"), "something else\n").unwrap();
    let err = Repository::open(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::Open { .. }));
    assert!(err.to_string().contains("Cannot open repository"));
}

#[test]
fn test_create_over_existing_repository_fails() {
    let tmp = common::fixture();
    let err = Repository::create(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::Create { .. }));

    // Existing history is untouched
    let repo = Repository::open(tmp.path()).unwrap();
    assert_eq!(repo.latest_revision().unwrap(), 10);
}

#[test]
fn test_created_repository_is_empty() {
    let tmp = TempDir::new().unwrap();
    let location = tmp.path().join("fresh");
    let repo = Repository::create(&location).unwrap();
    assert_eq!(repo.latest_revision().unwrap(), 0);
    assert!(repo.tree("", 0).unwrap().is_empty());
    assert_eq!(repo.commit_info(0).unwrap().author, "");
    assert!(DiskEngine::is_repository(&location));
}

#[test]
fn test_new_commits_are_visible_to_open_handles() {
    let tmp = TempDir::new().unwrap();
    let repo = Repository::create(tmp.path()).unwrap();

    let mut engine = DiskEngine::open(tmp.path()).unwrap();
    let mut txn = engine.begin_txn("lz", "later").unwrap();
    txn.add_file("late.txt", "late\n").unwrap();
    txn.commit().unwrap();

    assert_eq!(repo.latest_revision().unwrap(), 1);
    assert_eq!(repo.file_size("late.txt", 1).unwrap(), 5);
}

#[test]
fn test_config_applies_to_diffs() {
    let tmp = common::fixture();
    let config = QueryConfig {
        diff_context: 0,
        ..QueryConfig::default()
    };
    let repo = Repository::open_with_config(tmp.path(), config).unwrap();
    let diff = repo.diff("trunk/Makefile", 5).unwrap();
    assert!(diff.ends_with("@@ -0,0 +1 @@\n+# Make file to build newbc project\n"));
}

#[test]
fn test_independent_handles_across_threads() {
    let tmp = common::fixture();
    let location = tmp.path().to_path_buf();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let location = location.clone();
            thread::spawn(move || {
                let repo = Repository::open(&location).unwrap();
                assert!(runtime::live_handles() >= 1);
                let rev = 5 + i;
                (
                    repo.last_path_rev("trunk/Makefile", rev).unwrap(),
                    repo.diff("trunk/Makefile", 5).unwrap(),
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results[0].0, 5);
    assert_eq!(results[3].0, 5);
    assert!(results.windows(2).all(|w| w[0].1 == w[1].1));
    assert!(runtime::is_initialized());
}
