//! 選択キャッシュモジュール
//!
//! 人が行った選択を (ゲームタイトル, ディスクパス, 選択の種類) をキーに保存し、
//! 次回以降の実行で同じ選択を自動で再現する。
//!
//! - 選択は1始まりの番号で保存する（0 は「該当なし」）
//! - 更新のたびにファイル全体を書き直す
//! - 期限切れや削除はない（Overwrite の取り消しを除く）

use crate::error::{Error, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// 選択の種類
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChoiceKind {
    /// 完全一致リストからの選択
    FullMatched,
    /// 高確率一致リストからの選択
    LooseMatched,
    /// 画像ファイルの選択（画像カテゴリごと）
    Image(String),
    /// 既存カバー画像の上書き（画像カテゴリごと）
    Overwrite(String),
}

impl ChoiceKind {
    /// 保存時のキー
    pub fn key(&self) -> String {
        match self {
            ChoiceKind::FullMatched => "FullMatched".to_string(),
            ChoiceKind::LooseMatched => "LooseMatched".to_string(),
            ChoiceKind::Image(media_type) => format!("Image:{}", media_type),
            ChoiceKind::Overwrite(media_type) => format!("Overwrite:{}", media_type),
        }
    }
}

impl fmt::Display for ChoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// ディスクごとの選択（種類キー → 選択番号）
pub type DiscChoices = BTreeMap<String, usize>;

/// 選択キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceCache {
    /// バージョン（互換性チェック用）
    version: u32,
    /// タイトル → ディスクパス → 選択
    games: BTreeMap<String, BTreeMap<String, DiscChoices>>,
    /// 保存先（None ならメモリ上のみ）
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl ChoiceCache {
    const CURRENT_VERSION: u32 = 1;

    /// ファイルに保存しないキャッシュ
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// キャッシュファイルを読み込み
    ///
    /// ファイルがない・壊れている・バージョンが違う場合は空のキャッシュを返す。
    /// 保存先は `path` のまま。
    pub fn load(path: &Path) -> Self {
        let mut cache = Self::read(path).unwrap_or_default();
        cache.path = Some(path.to_path_buf());
        cache
    }

    fn read(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("選択キャッシュを開けません {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_reader::<_, ChoiceCache>(BufReader::new(file)) {
            Ok(cache) if cache.version == Self::CURRENT_VERSION => Some(cache),
            Ok(_) => {
                warn!("選択キャッシュのバージョン不一致、空のキャッシュで開始します");
                None
            }
            Err(e) => {
                warn!("選択キャッシュが壊れています {}: {}", path.display(), e);
                None
            }
        }
    }

    /// キャッシュファイルを保存
    pub fn save(&self) -> Result<()> {
        let path = self.path.as_ref().ok_or(Error::CacheNotPersistent)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // 一時ファイルに書き切ってから置き換える（失敗しても既存ファイルは残る）
        let temp = temp_path(path);
        let written = self.write_replacing(&temp, path);
        if written.is_err() && temp.is_file() {
            let _ = std::fs::remove_file(&temp);
        }
        written
    }

    fn write_replacing(&self, temp: &Path, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(temp)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        std::fs::rename(temp, path)?;
        Ok(())
    }

    /// メモリ上のキャッシュなら何もしない
    fn persist(&self) -> Result<()> {
        if self.path.is_some() {
            self.save()
        } else {
            Ok(())
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 保存済みの選択番号を取得（1始まり、0は「該当なし」）
    pub fn get(&self, title: &str, disc_path: &str, kind: &ChoiceKind) -> Option<usize> {
        self.games
            .get(title)
            .and_then(|discs| discs.get(disc_path))
            .and_then(|choices| choices.get(&kind.key()))
            .copied()
    }

    /// 選択を保存してすぐにファイルへ書き込む
    pub fn put(&mut self, title: &str, disc_path: &str, kind: &ChoiceKind, selection: usize) -> Result<()> {
        debug!("選択を保存: {} / {} / {} = {}", title, disc_path, kind, selection);
        self.games
            .entry(title.to_string())
            .or_default()
            .entry(disc_path.to_string())
            .or_default()
            .insert(kind.key(), selection);
        self.persist()
    }

    /// 選択を削除（削除した場合は true）
    pub fn remove(&mut self, title: &str, disc_path: &str, kind: &ChoiceKind) -> Result<bool> {
        let removed = self
            .games
            .get_mut(title)
            .and_then(|discs| discs.get_mut(disc_path))
            .map(|choices| choices.remove(&kind.key()).is_some())
            .unwrap_or(false);

        if removed {
            debug!("選択を削除: {} / {} / {}", title, disc_path, kind);
            self.persist()?;
        }
        Ok(removed)
    }

    /// 保存済みの選択を現在の候補リストに当てはめる
    ///
    /// 候補リストは実行ごとに変わりうるため、範囲外の番号は使わない。
    pub fn replay<'a, T>(
        &self,
        title: &str,
        disc_path: &str,
        kind: &ChoiceKind,
        candidates: &'a [T],
    ) -> Option<&'a T> {
        let selection = self.get(title, disc_path, kind)?;
        if selection == 0 || selection > candidates.len() {
            return None;
        }
        candidates.get(selection - 1)
    }

    /// 保存済みの選択件数（全ゲーム・全ディスク）
    pub fn len(&self) -> usize {
        self.games
            .values()
            .flat_map(|discs| discs.values())
            .map(|choices| choices.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 保存済みのゲーム数
    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// キャッシュファイルを削除（存在した場合は true）
    pub fn clear(path: &Path) -> Result<bool> {
        if path.exists() {
            std::fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

impl Default for ChoiceCache {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            games: BTreeMap::new(),
            path: None,
        }
    }
}

/// 保存用の一時ファイル（`choices.json` → `choices.json.tmp`）
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TITLE: &str = "Silent Hill 2";
    const DISC: &str = r"D:\PS2\Silent Hill 2.iso";

    #[test]
    fn test_put_and_get() {
        let mut cache = ChoiceCache::in_memory();
        assert_eq!(cache.get(TITLE, DISC, &ChoiceKind::FullMatched), None);

        cache.put(TITLE, DISC, &ChoiceKind::FullMatched, 2).unwrap();
        assert_eq!(cache.get(TITLE, DISC, &ChoiceKind::FullMatched), Some(2));
        assert_eq!(cache.get(TITLE, DISC, &ChoiceKind::LooseMatched), None);
        assert_eq!(cache.get(TITLE, "other.iso", &ChoiceKind::FullMatched), None);
    }

    #[test]
    fn test_put_overwrites_same_key() {
        let mut cache = ChoiceCache::in_memory();
        cache.put(TITLE, DISC, &ChoiceKind::LooseMatched, 1).unwrap();
        cache.put(TITLE, DISC, &ChoiceKind::LooseMatched, 3).unwrap();
        assert_eq!(cache.get(TITLE, DISC, &ChoiceKind::LooseMatched), Some(3));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_media_type_qualifies_image_kinds() {
        let mut cache = ChoiceCache::in_memory();
        cache.put(TITLE, DISC, &ChoiceKind::Image("Box - Front".into()), 2).unwrap();
        assert_eq!(cache.get(TITLE, DISC, &ChoiceKind::Image("Box - Front".into())), Some(2));
        assert_eq!(cache.get(TITLE, DISC, &ChoiceKind::Image("Disc".into())), None);
    }

    #[test]
    fn test_remove() {
        let mut cache = ChoiceCache::in_memory();
        let kind = ChoiceKind::Overwrite("Box - Front".into());
        cache.put(TITLE, DISC, &kind, 1).unwrap();
        assert!(cache.remove(TITLE, DISC, &kind).unwrap());
        assert_eq!(cache.get(TITLE, DISC, &kind), None);
        assert!(!cache.remove(TITLE, DISC, &kind).unwrap());
    }

    #[test]
    fn test_replay_bounds() {
        let mut cache = ChoiceCache::in_memory();
        let candidates = vec!["a", "b", "c"];

        cache.put(TITLE, DISC, &ChoiceKind::FullMatched, 3).unwrap();
        assert_eq!(cache.replay(TITLE, DISC, &ChoiceKind::FullMatched, &candidates), Some(&"c"));

        // 候補が減った → 範囲外は使わない
        assert_eq!(cache.replay(TITLE, DISC, &ChoiceKind::FullMatched, &candidates[..2]), None);

        // 0 は「該当なし」
        cache.put(TITLE, DISC, &ChoiceKind::FullMatched, 0).unwrap();
        assert_eq!(cache.replay(TITLE, DISC, &ChoiceKind::FullMatched, &candidates), None);
    }

    #[test]
    fn test_persisted_on_put() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("choices.json");

        let mut cache = ChoiceCache::load(&path);
        cache.put(TITLE, DISC, &ChoiceKind::FullMatched, 2).unwrap();
        assert!(path.exists());

        let loaded = ChoiceCache::load(&path);
        assert_eq!(loaded.get(TITLE, DISC, &ChoiceKind::FullMatched), Some(2));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("choices.json");

        let mut cache = ChoiceCache::load(&path);
        cache.put(TITLE, DISC, &ChoiceKind::FullMatched, 1).unwrap();
        cache.put(TITLE, DISC, &ChoiceKind::LooseMatched, 2).unwrap();

        assert!(!temp_path(&path).exists());
        let loaded = ChoiceCache::load(&path);
        assert_eq!(loaded.get(TITLE, DISC, &ChoiceKind::LooseMatched), Some(2));
    }

    /// 書き込みに失敗したら put はエラーを返し、保存先は壊さない
    #[test]
    fn test_put_reports_write_failure() {
        let dir = tempdir().expect("Failed to create temp dir");
        // 保存先がフォルダ → 置き換えに失敗する
        let path = dir.path().join("choices.json");
        std::fs::create_dir(&path).unwrap();

        let mut cache = ChoiceCache::load(&path);
        let result = cache.put(TITLE, DISC, &ChoiceKind::FullMatched, 2);
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(path.is_dir());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("choices.json");

        let mut cache = ChoiceCache::load(&path);
        cache.put(TITLE, DISC, &ChoiceKind::FullMatched, 2).unwrap();

        // 一時ファイルの位置をフォルダで塞ぐ → 作成に失敗する
        std::fs::create_dir(temp_path(&path)).unwrap();
        assert!(cache.put(TITLE, DISC, &ChoiceKind::FullMatched, 3).is_err());

        let loaded = ChoiceCache::load(&path);
        assert_eq!(loaded.get(TITLE, DISC, &ChoiceKind::FullMatched), Some(2));
    }

    #[test]
    fn test_in_memory_save_fails() {
        let cache = ChoiceCache::in_memory();
        assert!(matches!(cache.save(), Err(Error::CacheNotPersistent)));
    }

    #[test]
    fn test_corrupted_file_is_empty() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("choices.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let cache = ChoiceCache::load(&path);
        assert!(cache.is_empty());
        assert_eq!(cache.path(), Some(path.as_path()));
    }

    #[test]
    fn test_version_mismatch_is_empty() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("choices.json");
        std::fs::write(
            &path,
            r#"{"version": 99, "games": {"Ico": {"ico.iso": {"FullMatched": 1}}}}"#,
        )
        .unwrap();

        assert!(ChoiceCache::load(&path).is_empty());
    }
}
