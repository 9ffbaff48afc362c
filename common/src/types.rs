//! カタログ照合で使う型定義
//!
//! - CatalogEntry: ランチャー（LaunchBox）側のゲーム
//! - EmulatorEntry: エミュレータ（PCSX2）が認識済みのゲーム
//! - CanonicalTitle: ゲームデータベースの正式タイトル（照合対象）
//! - MatchLists: 照合結果（完全一致・高確率一致）

use serde::{Deserialize, Serialize};
use std::fmt;

/// ランチャー側のゲーム
///
/// 1つのゲームが複数のディスク（別リージョン・改造版など）を持つことがある。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub disc_paths: Vec<String>,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>, disc_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            disc_paths: vec![disc_path.into()],
        }
    }

    /// ディスクを追加（重複は無視）
    pub fn add_disc(&mut self, disc_path: impl Into<String>) {
        let disc_path = disc_path.into();
        if !self.disc_paths.contains(&disc_path) {
            self.disc_paths.push(disc_path);
        }
    }

    /// 指定ディスクのみを持つコピーを作成
    pub fn with_single_disc(&self, disc_path: &str) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            disc_paths: vec![disc_path.to_string()],
        }
    }
}

/// エミュレータが認識済みのゲーム（1ディスク1エントリ）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmulatorEntry {
    /// シリアル（SLUS-20946 など）。読み取れなければ空
    pub serial: String,
    /// 作業用タイトル（データベース照合後に上書きされる）
    pub title: String,
    pub disc_path: String,
}

/// ゲームデータベースの正式タイトル
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalTitle(String);

impl CanonicalTitle {
    pub fn new(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CanonicalTitle {
    fn from(title: &str) -> Self {
        Self::new(title)
    }
}

impl AsRef<str> for CanonicalTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 照合結果の候補リスト
///
/// どちらも候補の入力順を保持する。完全一致に含まれるものは高確率一致に含まれない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLists<T = CanonicalTitle> {
    /// 全検索語を含む候補
    pub full: Vec<T>,
    /// 検索語の半数以上を含む候補
    pub probable: Vec<T>,
}

impl<T> Default for MatchLists<T> {
    fn default() -> Self {
        Self {
            full: Vec::new(),
            probable: Vec::new(),
        }
    }
}

impl<T> MatchLists<T> {
    pub fn is_empty(&self) -> bool {
        self.full.is_empty() && self.probable.is_empty()
    }
}

/// 照合オプション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchOptions {
    /// ローマ数字⇔算用数字を入れ替えたタイトルでも検索する
    pub numeral_search: bool,
    /// ローマ数字は大文字表記のみ認識する（"Vi" などの誤認識を防ぐ）
    pub uppercase_roman_only: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            numeral_search: true,
            uppercase_roman_only: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_disc_ignores_duplicates() {
        let mut game = CatalogEntry::new("1", "Ico", r"D:\PS2\Ico.iso");
        game.add_disc(r"D:\PS2\Ico (Europe).iso");
        game.add_disc(r"D:\PS2\Ico.iso");
        assert_eq!(game.disc_paths.len(), 2);
    }

    #[test]
    fn test_with_single_disc() {
        let mut game = CatalogEntry::new("7", "Xenosaga", "disc1.iso");
        game.add_disc("disc2.iso");
        let single = game.with_single_disc("disc2.iso");
        assert_eq!(single.disc_paths, vec!["disc2.iso".to_string()]);
        assert_eq!(single.title, "Xenosaga");
    }

    #[test]
    fn test_match_options_default() {
        let options = MatchOptions::default();
        assert!(options.numeral_search);
        assert!(options.uppercase_roman_only);
    }

    #[test]
    fn test_match_options_partial_json() {
        let options: MatchOptions = serde_json::from_str(r#"{"numeralSearch": false}"#).unwrap();
        assert!(!options.numeral_search);
        assert!(options.uppercase_roman_only);
    }
}
