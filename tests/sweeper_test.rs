//! Retention sweeper against a real directory tree with controlled mtimes.

use reelfetch::cache::{MediaCache, RetentionSweeper};
use reelfetch::extractor::Platform;
use reelfetch::utils::MinSizes;
use std::fs::File;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn write_aged(path: &Path, now: SystemTime, age_secs: u64) {
    std::fs::write(path, vec![0u8; 2048]).expect("write file");
    let file = File::options().write(true).open(path).expect("open file");
    file.set_modified(now - Duration::from_secs(age_secs))
        .expect("set mtime");
}

fn sweeper(root: &Path) -> RetentionSweeper {
    RetentionSweeper::new(root, Duration::from_secs(180), Duration::from_secs(300))
}

#[tokio::test]
async fn old_files_are_deleted_and_fresh_ones_kept() {
    let temp = tempdir().unwrap();
    let cache = MediaCache::new(temp.path(), MinSizes::default());
    cache.ensure_dirs().await.unwrap();
    let now = SystemTime::now();

    let old = cache.target_path(Platform::Instagram, "old");
    let fresh = cache.target_path(Platform::Instagram, "fresh");
    write_aged(&old, now, 200);
    write_aged(&fresh, now, 100);

    let report = sweeper(temp.path()).sweep_once(now).await;

    assert_eq!(report.scanned, 2);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.failed, 0);
    assert!(!old.exists());
    assert!(fresh.exists());
}

#[tokio::test]
async fn every_platform_directory_is_swept() {
    let temp = tempdir().unwrap();
    let cache = MediaCache::new(temp.path(), MinSizes::default());
    cache.ensure_dirs().await.unwrap();
    let now = SystemTime::now();

    for platform in Platform::ALL {
        write_aged(&cache.target_path(platform, "expired"), now, 1000);
    }
    // stray partial downloads expire too
    write_aged(&cache.platform_dir(Platform::X).join("20.abc.part"), now, 1000);

    let report = sweeper(temp.path()).sweep_once(now).await;
    assert_eq!(report.deleted, Platform::ALL.len() + 1);
    for platform in Platform::ALL {
        assert!(cache.lookup(platform, "expired").await.is_none());
    }
}

#[tokio::test]
async fn advancing_the_clock_expires_a_fresh_file() {
    let temp = tempdir().unwrap();
    let cache = MediaCache::new(temp.path(), MinSizes::default());
    cache.ensure_dirs().await.unwrap();
    let now = SystemTime::now();

    let path = cache.target_path(Platform::Threads, "DS-74VmCbK9");
    write_aged(&path, now, 0);

    let sweeper = sweeper(temp.path());
    assert_eq!(sweeper.sweep_once(now).await.deleted, 0);
    assert!(path.exists());

    let later = now + Duration::from_secs(181);
    assert_eq!(sweeper.sweep_once(later).await.deleted, 1);
    assert!(!path.exists());
}

#[tokio::test]
async fn files_outside_platform_directories_are_ignored() {
    let temp = tempdir().unwrap();
    let stray = temp.path().join("notes.txt");
    write_aged(&stray, SystemTime::now(), 10_000);

    let report = sweeper(temp.path()).sweep_once(SystemTime::now()).await;
    assert_eq!(report.scanned, 0);
    assert!(stray.exists());
}
