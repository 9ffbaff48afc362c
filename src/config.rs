use crate::error::{CoverSyncError, Result};
use cover_sync_common::MatchOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// すべての画像カテゴリから選ぶ場合の特別な値
pub const MEDIA_TYPE_ALL: &str = "全カテゴリ (All)";

/// PCSX2の実行ファイル名の候補
const PCSX2_EXECUTABLES: &[&str] = &[
    "pcsx2.exe",
    "pcsx2-qt.exe",
    "pcsx2-qtx64.exe",
    "pcsx2-qtx64-avx2.exe",
    "pcsx2x64-avx2.exe",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub launchbox_root: PathBuf,
    pub pcsx2_root: PathBuf,
    /// LaunchBoxのプラットフォーム名
    pub platform: String,
    /// LaunchBoxの画像カテゴリ（"Box - Front" など）
    pub media_type: String,
    /// カバー画像の縮小後の高さ（0 = 縮小しない）
    pub resize_height: u32,
    /// 既存のカバー画像を常に上書き
    pub always_overwrite: bool,
    /// 保存済みの選択を常に再現
    pub always_use_previous_choices: bool,
    /// ゲームデータベースの英語タイトルのみを照合対象にする
    pub english_titles_only: bool,
    pub match_options: MatchOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// 設定フォルダ（環境変数 COVER_SYNC_CONFIG_DIR を優先）
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("COVER_SYNC_CONFIG_DIR") {
            return Ok(PathBuf::from(dir));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| CoverSyncError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("cover-sync"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// 選択キャッシュの保存先
    pub fn choices_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("choices.json"))
    }

    fn default_config() -> Self {
        let program_files = std::env::var("ProgramFiles").unwrap_or_else(|_| r"C:\Program Files".into());
        let program_files = PathBuf::from(program_files);

        Self {
            launchbox_root: program_files.join("LaunchBox"),
            pcsx2_root: program_files.join("PCSX2"),
            platform: "Sony Playstation 2".into(),
            media_type: "Box - Front".into(),
            resize_height: 720,
            always_overwrite: false,
            always_use_previous_choices: false,
            english_titles_only: true,
            match_options: MatchOptions::default(),
        }
    }

    /// 既定値に戻す（ルートフォルダは既定のフォルダが存在する場合のみ戻す）
    pub fn reset(&mut self) {
        let defaults = Self::default_config();
        let launchbox_root = if defaults.launchbox_root.exists() {
            defaults.launchbox_root.clone()
        } else {
            self.launchbox_root.clone()
        };
        let pcsx2_root = if defaults.pcsx2_root.exists() {
            defaults.pcsx2_root.clone()
        } else {
            self.pcsx2_root.clone()
        };

        *self = Self {
            launchbox_root,
            pcsx2_root,
            ..defaults
        };
    }

    pub fn all_media_types(&self) -> bool {
        self.media_type == MEDIA_TYPE_ALL
    }

    // --- LaunchBox ---

    /// プラットフォームのゲーム一覧XML
    pub fn launchbox_platform_xml(&self) -> PathBuf {
        self.launchbox_root
            .join("Data")
            .join("Platforms")
            .join(format!("{}.xml", self.platform))
    }

    /// 画像フォルダ一覧を含むXML
    pub fn launchbox_platforms_xml(&self) -> PathBuf {
        self.launchbox_root.join("Data").join("Platforms.xml")
    }

    /// Platforms.xml が読めない場合の画像フォルダ
    pub fn default_launchbox_image_folder(&self) -> PathBuf {
        self.launchbox_root
            .join("Images")
            .join(&self.platform)
            .join(&self.media_type)
    }

    pub fn launchbox_root_valid(&self) -> bool {
        self.launchbox_root.join("LaunchBox.exe").exists() || self.launchbox_platforms_xml().exists()
    }

    // --- PCSX2 ---

    pub fn pcsx2_game_index(&self) -> PathBuf {
        self.pcsx2_root.join("resources").join("GameIndex.yaml")
    }

    pub fn pcsx2_game_list_cache(&self) -> PathBuf {
        self.pcsx2_root.join("cache").join("gamelist.cache")
    }

    pub fn pcsx2_custom_properties(&self) -> PathBuf {
        self.pcsx2_root.join("inis").join("custom_properties.ini")
    }

    pub fn pcsx2_settings_ini(&self) -> PathBuf {
        self.pcsx2_root.join("inis").join("PCSX2.ini")
    }

    /// PCSX2.ini に指定がない場合のカバー画像フォルダ
    pub fn default_pcsx2_covers(&self) -> PathBuf {
        self.pcsx2_root.join("covers")
    }

    pub fn pcsx2_root_valid(&self) -> bool {
        PCSX2_EXECUTABLES
            .iter()
            .any(|exe| self.pcsx2_root.join(exe).exists())
            || self.pcsx2_game_index().exists()
    }

    /// 両方のルートフォルダが正しいか
    pub fn roots_valid(&self) -> bool {
        self.launchbox_root_valid() && self.pcsx2_root_valid()
    }

    pub fn require_roots(&self) -> Result<()> {
        if self.roots_valid() {
            Ok(())
        } else {
            Err(CoverSyncError::RootNotFound)
        }
    }
}
