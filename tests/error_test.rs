//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use cover_sync::error::CoverSyncError;
use cover_sync::images;
use std::path::Path;
use tempfile::tempdir;

/// 存在しないフォルダを開こうとした場合
#[test]
fn test_open_nonexistent_folder() {
    let result = images::open_directory(Path::new("/nonexistent/path/12345"));
    assert!(matches!(result, Err(CoverSyncError::FolderNotFound(_))));
}

/// 存在しない画像フォルダは空の検索結果
#[test]
fn test_find_images_in_missing_folder() {
    let found = images::find_source_images(&[Path::new("/nonexistent/path/12345").to_path_buf()], "Okami");
    assert!(found.is_empty());
}

/// 壊れた画像を縮小しようとした場合
#[test]
fn test_resize_broken_image() {
    let dir = tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("broken.png");
    std::fs::write(&source, b"not an image").unwrap();

    let result = images::place_image(&source, &dir.path().join("out.png"), 10);
    assert!(matches!(result, Err(CoverSyncError::ImageLoad(_))));
    assert!(!dir.path().join("out.png").exists());
}

/// 縮小しない設定なら壊れた画像でもそのままコピー
#[test]
fn test_copy_without_resize_ignores_content() {
    let dir = tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("broken.png");
    std::fs::write(&source, b"not an image").unwrap();

    let result = images::place_image(&source, &dir.path().join("out.png"), 0);
    assert_eq!(result.unwrap(), images::Placement::Copied);
}

/// 壊れた設定ファイル
#[test]
fn test_broken_config_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = cover_sync::config::Config::load_from(&path);
    assert!(matches!(result, Err(CoverSyncError::JsonParse(_))));
}

/// CoverSyncErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        CoverSyncError::Config("テスト設定エラー".to_string()),
        CoverSyncError::RootNotFound,
        CoverSyncError::FileNotFound("Platforms.xml".to_string()),
        CoverSyncError::FolderNotFound("/covers".to_string()),
        CoverSyncError::Catalog("XML".to_string()),
        CoverSyncError::ImageLoad("a.png".to_string()),
        CoverSyncError::ImageSave("b.jpg".to_string()),
        CoverSyncError::Prompt("stdin".to_string()),
    ];

    for err in errors {
        let msg = err.to_string();
        assert!(!msg.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// コピー失敗のメッセージにコピー元・コピー先が含まれる
#[test]
fn test_copy_failed_context() {
    let err = CoverSyncError::CopyFailed {
        source_path: "LaunchBox/Okami-01.png".to_string(),
        destination: "PCSX2/covers/Okami.png".to_string(),
        reason: "permission denied".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("LaunchBox/Okami-01.png"));
    assert!(msg.contains("PCSX2/covers/Okami.png"));
}

/// 共通ライブラリのエラーからの変換
#[test]
fn test_common_error_conversion() {
    let err: CoverSyncError = cover_sync_common::Error::CacheNotPersistent.into();
    assert!(matches!(err, CoverSyncError::Common(_)));

    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: CoverSyncError = io.into();
    assert!(matches!(err, CoverSyncError::Io(_)));
}

/// 保存済みの選択を削除できない場合は Common として伝わる
#[test]
fn test_clear_choices_failure_propagates() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("choices.json");
    std::fs::create_dir(&path).unwrap();

    let result: cover_sync::error::Result<bool> =
        cover_sync_common::ChoiceCache::clear(&path).map_err(CoverSyncError::from);
    assert!(matches!(
        result,
        Err(CoverSyncError::Common(cover_sync_common::Error::Io(_)))
    ));
}
