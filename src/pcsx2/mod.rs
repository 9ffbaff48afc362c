//! PCSX2カタログ読み込みモジュール
//!
//! - `inis/PCSX2.ini`: キャッシュ・カバー画像フォルダの設定
//! - `cache/gamelist.cache`: 認識済みゲーム（ディスクパス・シリアル）
//! - `resources/GameIndex.yaml`: 全ゲームの正式タイトル（シリアル別）
//! - `inis/custom_properties.ini`: ユーザーが付けたタイトル

use crate::config::Config;
use crate::launchbox::resolve_path;
use cover_sync_common::{CanonicalTitle, EmulatorEntry};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

lazy_static::lazy_static! {
    static ref SERIAL_RE: Regex = Regex::new(r"\w{4}-\d{5}").unwrap();
    static ref DISC_PATH_RE: Regex = Regex::new(
        r"(?:[A-Za-z]:[\\/]|/).*\.(?i:iso|bin|chd|cso|zso|gz|elf|img|mdf|nrg)"
    ).unwrap();
    static ref INDEX_SERIAL_RE: Regex = Regex::new(r"^(\w{4}-\d{5}):").unwrap();
    static ref INDEX_NAME_RE: Regex = Regex::new(r#"^\s\sname:\s"(.*?)""#).unwrap();
    static ref INDEX_NAME_EN_RE: Regex = Regex::new(r#"^\s\sname-en:\s"(.*?)""#).unwrap();
    static ref INI_SECTION_RE: Regex = Regex::new(r"^\s*\[(.+)\]\s*$").unwrap();
    static ref INI_KEY_RE: Regex = Regex::new(r"^\s*([^=:;#]+?)\s*[=:]\s*(.*?)\s*$").unwrap();
}

/// PCSX2側のカタログ
#[derive(Debug, Clone, Default)]
pub struct Pcsx2Catalog {
    /// 認識済みゲーム（タイトルはデータベース・カスタムタイトルで上書き済み）
    pub games: Vec<EmulatorEntry>,
    /// 照合対象の正式タイトル
    pub titles: Vec<CanonicalTitle>,
    pub covers_dir: PathBuf,
}

/// GameIndex.yaml の内容
#[derive(Debug, Clone, Default)]
pub struct GameIndex {
    pub titles: Vec<CanonicalTitle>,
    pub by_serial: HashMap<String, String>,
}

/// PCSX2.ini の [Folders] 設定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSettings {
    pub cache: Option<PathBuf>,
    pub covers: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheField {
    DiscPath,
    Serial,
    Title,
}

/// Latin-1として解釈し、表示可能な文字の連続ごとに分ける
fn printable_runs(bytes: &[u8]) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();

    for &byte in bytes {
        let c = byte as char;
        let printable = byte >= 0x20 && byte != 0x7f && !(0x80..0xa0).contains(&byte);
        if printable {
            current.push(c);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

/// gamelist.cache から認識済みゲームを取り出す
///
/// ディスクパス → シリアル → 仮タイトルの順に並んでいる。
/// 仮タイトルは照合用で、後でデータベースのタイトルに置き換える。
pub fn parse_game_list_cache(bytes: &[u8]) -> Vec<EmulatorEntry> {
    let mut games: Vec<EmulatorEntry> = Vec::new();
    let mut next = CacheField::DiscPath;

    for run in printable_runs(bytes) {
        let run = run.trim();

        if let Some(path) = DISC_PATH_RE.find(run) {
            games.push(EmulatorEntry {
                serial: String::new(),
                title: String::new(),
                disc_path: path.as_str().to_string(),
            });
            next = CacheField::Serial;
            continue;
        }

        match next {
            CacheField::DiscPath => {}
            CacheField::Serial => {
                // 直前の長さ情報が混ざることがあるので最後の一致を使う
                if let Some(serial) = SERIAL_RE.find_iter(run).last() {
                    if let Some(game) = games.last_mut() {
                        game.serial = serial.as_str().to_string();
                    }
                    next = CacheField::Title;
                }
            }
            CacheField::Title => {
                if run.chars().count() > 1 {
                    if let Some(game) = games.last_mut() {
                        game.title = run.to_string();
                    }
                    next = CacheField::DiscPath;
                }
            }
        }
    }

    games
}

/// GameIndex.yaml から正式タイトル一覧を作る
///
/// `english_only` の場合、英語タイトル（name-en）があれば元のタイトルと置き換える。
pub fn parse_game_index(text: &str, english_only: bool) -> GameIndex {
    let mut index = GameIndex::default();
    let mut current_serial: Option<String> = None;
    // このレコードで追加した元のタイトルの位置
    let mut native_slot: Option<usize> = None;

    for line in text.lines() {
        if let Some(caps) = INDEX_SERIAL_RE.captures(line) {
            current_serial = Some(caps[1].to_string());
            native_slot = None;
            continue;
        }

        let title = if let Some(caps) = INDEX_NAME_RE.captures(line) {
            let title = CanonicalTitle::new(&caps[1]);
            if !index.titles.contains(&title) {
                native_slot = Some(index.titles.len());
                index.titles.push(title.clone());
            }
            title
        } else if let Some(caps) = INDEX_NAME_EN_RE.captures(line) {
            let title = CanonicalTitle::new(&caps[1]);
            let known = index.titles.contains(&title);
            match (english_only, native_slot.take()) {
                (true, Some(slot)) if known => {
                    index.titles.remove(slot);
                }
                (true, Some(slot)) => index.titles[slot] = title.clone(),
                _ if !known => index.titles.push(title.clone()),
                _ => {}
            }
            title
        } else {
            continue;
        };

        if let Some(serial) = &current_serial {
            index.by_serial.insert(serial.clone(), title.to_string());
        }
    }

    index
}

/// custom_properties.ini からディスクパス別のタイトルを取り出す
///
/// 角括弧を含むタイトルは使わない（PCSX2側で正しく保存されないため）。
pub fn parse_custom_titles(text: &str) -> Vec<(String, String)> {
    let mut titles = Vec::new();
    let mut section: Option<String> = None;

    for line in text.lines() {
        if let Some(caps) = INI_SECTION_RE.captures(line) {
            section = Some(caps[1].to_string());
            continue;
        }
        let (Some(disc_path), Some(caps)) = (&section, INI_KEY_RE.captures(line)) else {
            continue;
        };
        if !caps[1].eq_ignore_ascii_case("title") {
            continue;
        }
        let title = &caps[2];
        if title.is_empty() || title.contains('[') || title.contains(']') {
            continue;
        }
        titles.push((disc_path.clone(), title.to_string()));
    }

    titles
}

/// PCSX2.ini の [Folders] から Cache / Covers を取り出す
pub fn parse_folder_settings(text: &str) -> FolderSettings {
    let mut settings = FolderSettings::default();
    let mut in_folders = false;

    for line in text.lines() {
        if let Some(caps) = INI_SECTION_RE.captures(line) {
            in_folders = caps[1].eq_ignore_ascii_case("folders");
            continue;
        }
        if !in_folders {
            continue;
        }
        let Some(caps) = INI_KEY_RE.captures(line) else {
            continue;
        };
        let value = &caps[2];
        if value.is_empty() {
            continue;
        }
        match caps[1].to_ascii_lowercase().as_str() {
            "cache" => settings.cache = Some(PathBuf::from(value)),
            "covers" => settings.covers = Some(PathBuf::from(value)),
            _ => {}
        }
    }

    settings
}

fn read_text(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            log::warn!("読み込めません {}: {}", path.display(), e);
            None
        }
    }
}

/// PCSX2のカタログを読み込む（読めないファイルは空として扱う）
pub fn load(config: &Config) -> Pcsx2Catalog {
    let root = &config.pcsx2_root;

    let mut cache_file = config.pcsx2_game_list_cache();
    let mut covers_dir = config.default_pcsx2_covers();

    let settings_ini = config.pcsx2_settings_ini();
    if settings_ini.exists() {
        if let Some(text) = read_text(&settings_ini) {
            let folders = parse_folder_settings(&text);
            if let Some(cache) = folders.cache {
                cache_file = resolve_path(&cache, root).join("gamelist.cache");
            }
            if let Some(covers) = folders.covers {
                covers_dir = resolve_path(&covers, root);
            }
        }
    } else {
        log::warn!("{} がありません。既定のフォルダを使用します", settings_ini.display());
    }

    let mut games = match std::fs::read(&cache_file) {
        Ok(bytes) => parse_game_list_cache(&bytes),
        Err(e) => {
            log::warn!("ゲーム一覧を読み込めません {}: {}", cache_file.display(), e);
            Vec::new()
        }
    };

    let index = read_text(&config.pcsx2_game_index())
        .map(|text| parse_game_index(&text, config.english_titles_only))
        .unwrap_or_default();

    for game in &mut games {
        if let Some(title) = index.by_serial.get(&game.serial) {
            game.title = title.clone();
        }
    }

    let custom_file = config.pcsx2_custom_properties();
    if custom_file.exists() {
        if let Some(text) = read_text(&custom_file) {
            for (disc_path, title) in parse_custom_titles(&text) {
                if let Some(game) = games.iter_mut().find(|g| g.disc_path == disc_path) {
                    game.title = title;
                }
            }
        }
    }

    log::info!(
        "PCSX2: {}件の認識済みゲーム, {}件のタイトル",
        games.len(),
        index.titles.len()
    );

    Pcsx2Catalog {
        games,
        titles: index.titles,
        covers_dir,
    }
}

/// 認識済みゲーム一覧を表示
pub fn print_games(catalog: &Pcsx2Catalog, show_id: bool) {
    println!();
    for game in &catalog.games {
        if show_id {
            println!("シリアル: {}", game.serial);
        }
        println!("タイトル: {}", game.title);
        println!("ディスク: {}", game.disc_path);
        println!();
    }
}
