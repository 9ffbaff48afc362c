//! 既存カバー画像を置き換えながらの配置

use super::{place_image, Placement};
use crate::error::Result;
use std::path::{Path, PathBuf};

/// 配置の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub destination: PathBuf,
    pub placement: Placement,
    /// 削除した既存カバー画像の数
    pub removed: usize,
}

/// 既存ファイルの退避先（`<name>.tmp`, `<name>.tmp1`, ...）
fn temp_path_for(destination: &Path) -> PathBuf {
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut candidate = destination.with_file_name(format!("{}.tmp", file_name));
    let mut n = 0;
    while candidate.exists() {
        n += 1;
        candidate = destination.with_file_name(format!("{}.tmp{}", file_name, n));
    }
    candidate
}

/// カバー画像を配置する
///
/// `overwrite` の場合、配置先と同名のファイルを一時的に退避してから配置し、
/// 成功したら退避ファイルと `conflicts` を削除、失敗したら退避ファイルを元に戻す。
pub fn install_cover(
    source: &Path,
    destination: &Path,
    conflicts: &[PathBuf],
    overwrite: bool,
    target_height: u32,
) -> Result<Installed> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut to_remove: Vec<PathBuf> = Vec::new();
    let mut moved_aside: Option<PathBuf> = None;

    if overwrite {
        to_remove.extend(conflicts.iter().filter(|p| p.as_path() != destination).cloned());
        if destination.exists() {
            let temp = temp_path_for(destination);
            std::fs::rename(destination, &temp)?;
            log::debug!("既存ファイルを退避: {} → {}", destination.display(), temp.display());
            to_remove.push(temp.clone());
            moved_aside = Some(temp);
        }
    }

    let placement = match place_image(source, destination, target_height) {
        Ok(placement) => placement,
        Err(e) => {
            if let Some(temp) = moved_aside {
                // 途中まで書かれたファイルがあれば消してから戻す
                let _ = std::fs::remove_file(destination);
                if let Err(restore) = std::fs::rename(&temp, destination) {
                    log::warn!("退避ファイルを戻せません {}: {}", temp.display(), restore);
                }
            }
            return Err(e);
        }
    };

    let mut removed = 0;
    for path in &to_remove {
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => log::warn!("削除できません {}: {}", path.display(), e),
        }
    }

    Ok(Installed {
        destination: destination.to_path_buf(),
        placement,
        removed,
    })
}
