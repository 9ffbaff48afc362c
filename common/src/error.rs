//! エラー型定義

use thiserror::Error;

/// 照合コアの共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 選択キャッシュの保存先が未設定（メモリ上のみのキャッシュ）
    #[error("Choice cache is not backed by a file")]
    CacheNotPersistent,
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
