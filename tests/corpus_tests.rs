use std::fs;
use std::path::Path;

use clip_regress::config::CorpusConfig;
use clip_regress::console::Console;
use clip_regress::corpus::{find_files, CorpusProvider, TestDataCorpus};
use clip_regress::error::RegressError;
use tempfile::TempDir;

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "{}").unwrap();
}

/// Test data directory with an archive and an already extracted corpus.
fn extracted_layout(clips: &[&str], configs: &[&str]) -> TempDir {
    let root = TempDir::new().unwrap();
    let cfg = CorpusConfig::new(root.path());

    fs::write(cfg.archive_path(), b"placeholder").unwrap();
    fs::create_dir_all(cfg.data_dir()).unwrap();
    fs::create_dir_all(cfg.configs_dir()).unwrap();

    for clip in clips {
        touch(&cfg.data_dir().join(clip));
    }
    for config in configs {
        touch(&cfg.configs_dir().join(config));
    }
    root
}

#[tokio::test]
async fn test_load_discovers_sorted_clips_and_configs() {
    let root = extracted_layout(
        &[
            "walk.acl.sjson",
            "nested/run.acl.sjson",
            "anim.acl.sjson",
            "notes.txt",
            "nested/readme.sjson",
        ],
        &["uniform.config.sjson", "high.config.sjson", "ignored.json"],
    );
    let cfg = CorpusConfig::new(root.path());
    let (console, buffer) = Console::capture();

    let corpus = TestDataCorpus::new(cfg.clone(), console).load().await.unwrap();

    let data_dir = cfg.data_dir();
    let expected_clips: Vec<String> = ["anim.acl.sjson", "nested/run.acl.sjson", "walk.acl.sjson"]
        .iter()
        .map(|c| data_dir.join(c).to_string_lossy().into_owned())
        .collect();
    assert_eq!(corpus.clips, expected_clips);

    let configs_dir = cfg.configs_dir();
    let expected_configs: Vec<String> = ["high.config.sjson", "uniform.config.sjson"]
        .iter()
        .map(|c| configs_dir.join(c).to_string_lossy().into_owned())
        .collect();
    assert_eq!(corpus.configs, expected_configs);

    assert_eq!(
        buffer.contents(),
        "Preparing regression test data ...\n\
         Found 3 regression clips\n\
         Found 2 regression configurations\n"
    );
}

#[tokio::test]
async fn test_existing_corpus_is_not_reindexed() {
    let root = extracted_layout(&["a.acl.sjson"], &["c.config.sjson"]);
    let cfg = CorpusConfig::new(root.path());
    let (console, _buffer) = Console::capture();

    TestDataCorpus::new(cfg.clone(), console).load().await.unwrap();

    assert!(!cfg.data_dir().join("metadata.sjson").exists());
}

#[tokio::test]
async fn test_missing_archive() {
    let root = TempDir::new().unwrap();
    let cfg = CorpusConfig::new(root.path());
    let (console, buffer) = Console::capture();

    let result = TestDataCorpus::new(cfg.clone(), console).load().await;

    match result {
        Err(RegressError::ArchiveNotFound(path)) => assert_eq!(path, cfg.archive_path()),
        other => panic!("expected ArchiveNotFound, got {:?}", other),
    }
    assert_eq!(buffer.contents(), "Preparing regression test data ...\n");
}

#[tokio::test]
async fn test_no_clips() {
    let root = extracted_layout(&["readme.txt"], &["c.config.sjson"]);
    let cfg = CorpusConfig::new(root.path());
    let (console, _buffer) = Console::capture();

    let result = TestDataCorpus::new(cfg, console).load().await;

    let err = result.unwrap_err();
    assert!(matches!(err, RegressError::NoClips(_)));
    assert!(err.is_environment());
}

#[tokio::test]
async fn test_no_configs() {
    let root = extracted_layout(&["a.acl.sjson"], &[]);
    let cfg = CorpusConfig::new(root.path());
    let (console, buffer) = Console::capture();

    let result = TestDataCorpus::new(cfg, console).load().await;

    assert!(matches!(result, Err(RegressError::NoConfigs(_))));
    assert!(buffer.contents().contains("Found 1 regression clips\n"));
}

#[tokio::test]
async fn test_corrupt_archive_fails_decompression() {
    let root = TempDir::new().unwrap();
    let cfg = CorpusConfig::new(root.path());
    fs::write(cfg.archive_path(), b"not a zip archive").unwrap();
    let (console, buffer) = Console::capture();

    let result = TestDataCorpus::new(cfg.clone(), console).load().await;

    assert!(matches!(result, Err(RegressError::Decompress(..))));
    assert!(buffer
        .contents()
        .contains(&format!("Decompressing {} ...", cfg.archive_path().display())));
}

#[tokio::test]
async fn test_custom_data_version() {
    let root = TempDir::new().unwrap();
    let mut cfg = CorpusConfig::new(root.path());
    cfg.data_version = "test_data_v2".to_string();
    fs::write(cfg.archive_path(), b"placeholder").unwrap();
    touch(&cfg.data_dir().join("x.acl.sjson"));
    touch(&cfg.configs_dir().join("y.config.sjson"));
    let (console, _buffer) = Console::capture();

    let corpus = TestDataCorpus::new(cfg, console).load().await.unwrap();

    assert_eq!(corpus.clips.len(), 1);
    assert!(corpus.clips[0].contains("test_data_v2"));
}

#[test]
fn test_find_files_ignores_directories_with_matching_names() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("odd.acl.sjson")).unwrap();
    touch(&root.path().join("odd.acl.sjson/inner.acl.sjson"));

    let files = find_files(root.path(), ".acl.sjson");

    assert_eq!(files, vec![root.path().join("odd.acl.sjson/inner.acl.sjson")]);
}
