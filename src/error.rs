use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoverSyncError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("LaunchBox/PCSX2 のルートフォルダが見つかりません。`cover-sync settings` で設定してください")]
    RootNotFound,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("カタログ読み込みエラー: {0}")]
    Catalog(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("画像保存エラー: {0}")]
    ImageSave(String),

    #[error("コピー失敗: {source_path} → {destination}: {reason}")]
    CopyFailed {
        source_path: String,
        destination: String,
        reason: String,
    },

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error(transparent)]
    Common(#[from] cover_sync_common::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoverSyncError>;
