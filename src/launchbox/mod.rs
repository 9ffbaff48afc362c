//! LaunchBoxカタログ読み込みモジュール
//!
//! - `Data/Platforms/<platform>.xml`: ゲーム一覧（Game / AdditionalApplication）
//! - `Data/Platforms.xml`: プラットフォームごとの画像フォルダ（PlatformFolder）
//!
//! 必要な要素だけを正規表現で取り出す。

use crate::config::{Config, MEDIA_TYPE_ALL};
use crate::error::{CoverSyncError, Result};
use cover_sync_common::CatalogEntry;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 画像カテゴリと画像フォルダ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFolder {
    pub media_type: String,
    pub path: PathBuf,
}

/// LaunchBox側のカタログ
#[derive(Debug, Clone, Default)]
pub struct LaunchBoxCatalog {
    pub games: Vec<CatalogEntry>,
    /// 画像カテゴリ一覧（末尾に「全カテゴリ」を含む）
    pub media_folders: Vec<MediaFolder>,
    /// 設定中のカテゴリの画像フォルダ
    pub image_folder: PathBuf,
}

impl LaunchBoxCatalog {
    /// 画像の検索対象フォルダ
    pub fn image_folders(&self, config: &Config) -> Vec<PathBuf> {
        if config.all_media_types() {
            self.media_folders
                .iter()
                .filter(|f| f.media_type != MEDIA_TYPE_ALL)
                .map(|f| f.path.clone())
                .collect()
        } else {
            vec![self.image_folder.clone()]
        }
    }

    /// `show` で開くフォルダ（全カテゴリの場合はカテゴリフォルダの親）
    pub fn show_folder(&self, config: &Config) -> PathBuf {
        if !config.all_media_types() {
            return self.image_folder.clone();
        }
        self.media_folders
            .iter()
            .filter(|f| f.media_type != MEDIA_TYPE_ALL)
            .find_map(|f| f.path.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| config.launchbox_root.join("Images").join(&config.platform))
    }

    /// 画像カテゴリ名の一覧
    pub fn media_types(&self) -> Vec<String> {
        self.media_folders.iter().map(|f| f.media_type.clone()).collect()
    }

    /// ディスクパスが完全一致するゲーム（そのディスクのみに絞る）
    pub fn find_by_disc(&self, disc_path: &str) -> Vec<CatalogEntry> {
        self.games
            .iter()
            .filter(|game| game.disc_paths.iter().any(|p| p == disc_path))
            .map(|game| game.with_single_disc(disc_path))
            .collect()
    }

    /// タイトルの部分一致（大文字小文字を区別しない）
    pub fn find_by_title(&self, query: &str) -> Vec<CatalogEntry> {
        let query = query.to_lowercase();
        self.games
            .iter()
            .filter(|game| game.title.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }
}

/// XMLの実体参照・文字参照を戻す（一度だけ置換するので `&amp;lt;` は `&lt;` になる）
fn unescape_xml(value: &str) -> String {
    lazy_static::lazy_static! {
        static ref ENTITY_RE: Regex = Regex::new(r"&(lt|gt|quot|apos|amp|#[0-9]+|#[xX][0-9a-fA-F]+);").unwrap();
    }

    ENTITY_RE
        .replace_all(value, |caps: &regex::Captures| {
            let decoded = match &caps[1] {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                reference => {
                    let code = match reference.strip_prefix("#x").or_else(|| reference.strip_prefix("#X")) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => reference[1..].parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

/// 要素ブロック内の子要素（タグ名 → テキスト、空要素は含めない）
fn child_elements(block: &str) -> HashMap<String, String> {
    lazy_static::lazy_static! {
        static ref CHILD_RE: Regex = Regex::new(r"(?s)<(\w+)>(.*?)</(\w+)>").unwrap();
    }

    CHILD_RE
        .captures_iter(block)
        .filter(|caps| caps[1] == caps[3])
        .filter_map(|caps| {
            let text = caps[2].trim();
            if text.is_empty() {
                None
            } else {
                Some((caps[1].to_string(), unescape_xml(text)))
            }
        })
        .collect()
}

/// プラットフォームXMLからゲーム一覧を作る
///
/// AdditionalApplication のうちエミュレータに紐づくもの（EmulatorId あり）は、
/// 同じ ID のゲームの追加ディスクとして扱う。
pub fn parse_platform_games(xml: &str) -> Vec<CatalogEntry> {
    lazy_static::lazy_static! {
        static ref GAME_RE: Regex = Regex::new(r"(?s)<Game>(.*?)</Game>").unwrap();
        static ref ADDITIONAL_RE: Regex =
            Regex::new(r"(?s)<AdditionalApplication>(.*?)</AdditionalApplication>").unwrap();
    }

    let mut games: Vec<CatalogEntry> = Vec::new();

    for caps in GAME_RE.captures_iter(xml) {
        let mut fields = child_elements(&caps[1]);
        let (Some(id), Some(title)) = (fields.remove("ID"), fields.remove("Title")) else {
            continue;
        };
        let disc_path = fields.remove("ApplicationPath").unwrap_or_default();
        games.push(CatalogEntry::new(id, title, disc_path));
    }

    for caps in ADDITIONAL_RE.captures_iter(xml) {
        let mut fields = child_elements(&caps[1]);
        if !fields.contains_key("EmulatorId") {
            continue;
        }
        let (Some(game_id), Some(disc_path)) = (fields.remove("GameID"), fields.remove("ApplicationPath"))
        else {
            continue;
        };
        if let Some(game) = games.iter_mut().find(|g| g.id == game_id) {
            game.add_disc(disc_path);
        }
    }

    // ApplicationPath が空のゲームは追加ディスクのみを持つ
    for game in &mut games {
        game.disc_paths.retain(|p| !p.is_empty());
    }

    games
}

/// Platforms.xml からプラットフォームの画像フォルダ一覧を作る
pub fn parse_media_folders(xml: &str, platform: &str) -> Vec<MediaFolder> {
    lazy_static::lazy_static! {
        static ref FOLDER_RE: Regex = Regex::new(r"(?s)<PlatformFolder>(.*?)</PlatformFolder>").unwrap();
    }

    FOLDER_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let mut fields = child_elements(&caps[1]);
            if fields.get("Platform").map(String::as_str) != Some(platform) {
                return None;
            }
            Some(MediaFolder {
                media_type: fields.remove("MediaType")?,
                path: PathBuf::from(fields.remove("FolderPath")?),
            })
        })
        .collect()
}

/// 相対パスをルートフォルダ基準で解決
pub fn resolve_path(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// LaunchBoxのカタログを読み込む
pub fn load(config: &Config) -> Result<LaunchBoxCatalog> {
    let platform_xml = config.launchbox_platform_xml();
    if !platform_xml.exists() {
        return Err(CoverSyncError::FileNotFound(platform_xml.display().to_string()));
    }
    let content = std::fs::read_to_string(&platform_xml)
        .map_err(|e| CoverSyncError::Catalog(format!("{}: {}", platform_xml.display(), e)))?;
    let games = parse_platform_games(&content);

    let mut catalog = LaunchBoxCatalog {
        games,
        media_folders: Vec::new(),
        image_folder: config.default_launchbox_image_folder(),
    };

    let platforms_xml = config.launchbox_platforms_xml();
    match std::fs::read_to_string(&platforms_xml) {
        Ok(content) => {
            catalog.media_folders = parse_media_folders(&content, &config.platform)
                .into_iter()
                .map(|f| MediaFolder {
                    path: resolve_path(&f.path, &config.launchbox_root),
                    ..f
                })
                .collect();
        }
        Err(e) => {
            log::warn!("画像フォルダ一覧を読み込めません {}: {}", platforms_xml.display(), e);
        }
    }

    if let Some(folder) = catalog
        .media_folders
        .iter()
        .find(|f| f.media_type == config.media_type)
    {
        catalog.image_folder = folder.path.clone();
    }

    catalog.media_folders.push(MediaFolder {
        media_type: MEDIA_TYPE_ALL.into(),
        path: PathBuf::new(),
    });

    log::info!(
        "LaunchBox: {}件のゲーム, {}件の画像カテゴリ",
        catalog.games.len(),
        catalog.media_folders.len() - 1
    );

    Ok(catalog)
}

/// ゲーム一覧を表示
pub fn print_games(catalog: &LaunchBoxCatalog, show_id: bool) {
    println!();
    for game in &catalog.games {
        if show_id {
            println!("ID:       {}", game.id);
        }
        println!("タイトル: {}", game.title);
        for disc_path in &game.disc_paths {
            println!("ディスク: {}", disc_path);
        }
        println!();
    }
}
