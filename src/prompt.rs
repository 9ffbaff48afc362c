//! コンソールでの対話
//!
//! 番号付きメニュー（候補が10件を超えると2列表示）、`0` は「該当なし」「キャンセル」。
//! どのメニューでも `show lb` / `show ps` で画像フォルダを開ける。

use crate::config::{Config, MEDIA_TYPE_ALL};
use crate::error::{CoverSyncError, Result};
use crate::images;
use cover_sync_common::{CatalogEntry, Selection, SelectionRequest, SelectionStage, Selector};
use dialoguer::Input;
use std::path::{Path, PathBuf};

/// 既存カバー画像がある場合の対応
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    Overwrite,
    Rename,
    Cancel,
}

/// 照合以外の選択も含めた対話の窓口
pub trait Interaction: Selector {
    /// 複数の画像から配置する画像を選ぶ（None = キャンセル）
    fn choose_image(&mut self, game_title: &str, images: &[PathBuf]) -> Option<usize>;

    /// 同名のカバー画像が既にある場合の対応を選ぶ
    fn resolve_conflict(&mut self, destination: &Path, existing: &[PathBuf]) -> ConflictAction;

    /// 新しいカバー画像名（拡張子なし）を入力（None = キャンセル）
    fn new_cover_name(&mut self, previous: &str) -> Option<String>;

    /// タイトル検索で複数見つかったゲームから選ぶ（空 = キャンセル）
    fn choose_games(&mut self, query: &str, games: &[CatalogEntry]) -> Vec<usize>;
}

/// 候補数に応じた列数
pub fn columns_for(count: usize) -> usize {
    if count > 10 {
        2
    } else {
        1
    }
}

/// 番号付きメニューの行を作る
///
/// 複数列の場合は上から下へ番号を振り、最も長い項目に合わせて揃える。
pub fn format_menu(choices: &[String], columns: usize, none_choice: &str) -> Vec<String> {
    let columns = columns.max(1);
    let number_width = choices.len().to_string().len();
    let labels: Vec<String> = choices
        .iter()
        .enumerate()
        .map(|(i, choice)| format!("{:>width$}) {}", i + 1, choice, width = number_width))
        .collect();
    let cell_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let rows = labels.len().div_ceil(columns);

    let mut lines = Vec::with_capacity(rows + 1);
    for row in 0..rows {
        let cells: Vec<&String> = (0..columns)
            .filter_map(|column| labels.get(column * rows + row))
            .collect();
        let mut line = String::from("  ");
        for (i, cell) in cells.iter().enumerate() {
            if i + 1 < cells.len() {
                let padding = cell_width - cell.chars().count();
                line.push_str(cell);
                line.push_str(&" ".repeat(padding + 4));
            } else {
                line.push_str(cell);
            }
        }
        lines.push(line);
    }
    lines.push(format!("  {:>width$}) {}", 0, none_choice, width = number_width));
    lines
}

/// 番号入力を解釈（0..=max）
pub fn parse_selection(input: &str, max: usize) -> Option<usize> {
    input.trim().parse::<usize>().ok().filter(|&n| n <= max)
}

/// カンマ区切りの番号入力を解釈（1始まり、重複除去）
///
/// `0` を含む場合は空（キャンセル）、無効な番号があれば None。
pub fn parse_multi_selection(input: &str, max: usize) -> Option<Vec<usize>> {
    let mut selected = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let n = parse_selection(part, max)?;
        if n == 0 {
            return Some(Vec::new());
        }
        if !selected.contains(&n) {
            selected.push(n);
        }
    }
    if selected.is_empty() {
        None
    } else {
        Some(selected)
    }
}

/// 対話ループのヘルプ
pub fn print_help() {
    println!();
    println!("使い方:");
    println!("  ディスクパス        LaunchBoxに登録されたディスクのカバー画像を配置");
    println!("  タイトル            タイトルの一部で検索（大文字小文字を区別しない）");
    println!("  all                 すべてのゲームを処理");
    println!("  <入力>*             末尾に * を付けると保存済みの選択を再現");
    println!("  list lb | list ps   LaunchBox / PCSX2 のゲーム一覧");
    println!("  show lb | show ps   LaunchBox / PCSX2 の画像フォルダを開く");
    println!("  settings | *        設定メニュー");
    println!("  help                このヘルプ");
    println!("  (空行)              終了");
}

/// `show` コマンドの対象
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowTarget {
    LaunchBox,
    Pcsx2,
}

impl ShowTarget {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "show lb" | "show launchbox" => Some(ShowTarget::LaunchBox),
            "show ps" | "show pcsx2" => Some(ShowTarget::Pcsx2),
            _ => None,
        }
    }
}

/// コンソール版の対話
pub struct ConsolePrompter {
    launchbox_images: PathBuf,
    pcsx2_covers: PathBuf,
}

impl ConsolePrompter {
    pub fn new(launchbox_images: PathBuf, pcsx2_covers: PathBuf) -> Self {
        Self {
            launchbox_images,
            pcsx2_covers,
        }
    }

    pub fn show(&self, target: ShowTarget) {
        let folder = match target {
            ShowTarget::LaunchBox => &self.launchbox_images,
            ShowTarget::Pcsx2 => &self.pcsx2_covers,
        };
        match images::open_directory(folder) {
            Ok(()) => println!("→ {}", folder.display()),
            Err(e) => println!("⚠ {}", e),
        }
    }

    /// 1行入力（入力できなければ None）
    fn read_line(&self, prompt: &str) -> Option<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| log::debug!("入力エラー: {}", e))
            .ok()
    }

    /// 番号付きメニューで1つ選ぶ（0 = 該当なし、入力不能も 0）
    fn menu(&self, heading: &[String], choices: &[String], none_choice: &str) -> usize {
        println!();
        for line in heading {
            println!("{}", line);
        }
        for line in format_menu(choices, columns_for(choices.len()), none_choice) {
            println!("{}", line);
        }

        loop {
            let Some(input) = self.read_line(&format!("番号を入力 [0-{}]", choices.len())) else {
                return 0;
            };
            if let Some(target) = ShowTarget::parse(&input) {
                self.show(target);
                continue;
            }
            match parse_selection(&input, choices.len()) {
                Some(n) => return n,
                None => println!("⚠ 無効な入力です"),
            }
        }
    }

    fn multi_menu(&self, heading: &str, choices: &[String], none_choice: &str) -> Vec<usize> {
        println!();
        println!("{}", heading);
        for line in format_menu(choices, columns_for(choices.len()), none_choice) {
            println!("{}", line);
        }

        loop {
            let Some(input) = self.read_line("番号を入力（カンマ区切りで複数可）") else {
                return Vec::new();
            };
            if let Some(target) = ShowTarget::parse(&input) {
                self.show(target);
                continue;
            }
            match parse_multi_selection(&input, choices.len()) {
                Some(selected) => return selected,
                None => println!("⚠ 無効な入力です"),
            }
        }
    }
}

impl Selector for ConsolePrompter {
    fn select(&mut self, request: &SelectionRequest<'_>) -> Selection {
        let (message, none_choice) = match request.stage {
            SelectionStage::FullMatched => (
                "よく似たPCSX2タイトルが複数見つかりました。上のゲームに合うものを選んでください。",
                "-- 該当なし（検索範囲を広げる） --",
            ),
            SelectionStage::LooseMatched => (
                "一致するタイトルがありません。部分的に一致したPCSX2タイトルから選んでください。",
                "-- 該当なし（このディスクをスキップ） --",
            ),
        };
        let heading = vec![
            format!("タイトル: {}", request.game_title),
            format!("ディスク: {}", request.disc_path),
            String::new(),
            message.to_string(),
        ];
        let choices: Vec<String> = request.candidates.iter().map(|t| t.to_string()).collect();

        match self.menu(&heading, &choices, none_choice) {
            0 => Selection::NoneOfTheAbove,
            n => Selection::Picked(n - 1),
        }
    }
}

impl Interaction for ConsolePrompter {
    fn choose_image(&mut self, game_title: &str, images: &[PathBuf]) -> Option<usize> {
        let heading = vec![format!("{} の画像が複数見つかりました。配置する画像を選んでください。", game_title)];
        let choices: Vec<String> = images.iter().map(|p| p.display().to_string()).collect();
        match self.menu(&heading, &choices, "キャンセル") {
            0 => None,
            n => Some(n - 1),
        }
    }

    fn resolve_conflict(&mut self, destination: &Path, existing: &[PathBuf]) -> ConflictAction {
        let mut heading = vec![format!("同じ名前のカバー画像が既にあります: {}", destination.display())];
        heading.extend(existing.iter().map(|p| format!("  - {}", p.display())));
        let choices = vec!["上書き".to_string(), "名前を変更".to_string()];
        match self.menu(&heading, &choices, "キャンセル") {
            1 => ConflictAction::Overwrite,
            2 => ConflictAction::Rename,
            _ => ConflictAction::Cancel,
        }
    }

    fn new_cover_name(&mut self, previous: &str) -> Option<String> {
        let input = self.read_line(&format!("新しいカバー画像名（元の名前: {}、空欄でキャンセル）", previous))?;
        let name = input.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    fn choose_games(&mut self, query: &str, games: &[CatalogEntry]) -> Vec<usize> {
        let heading = format!("\"{}\" に一致するLaunchBoxのゲームが複数あります。処理するゲームを選んでください。", query);
        let choices: Vec<String> = games.iter().map(|g| g.title.clone()).collect();
        self.multi_menu(&heading, &choices, "-- 該当なし（別の検索をする） --")
            .into_iter()
            .map(|n| n - 1)
            .collect()
    }
}

/// 設定変更の結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsOutcome {
    /// カタログの再読み込みが必要
    pub reload_catalogs: bool,
}

/// フォルダ選択ダイアログ（使えない環境では入力で代用）
fn pick_folder(prompter: &ConsolePrompter, title: &str, current: &Path) -> Option<PathBuf> {
    let mut dialog = rfd::FileDialog::new().set_title(title);
    if current.exists() {
        dialog = dialog.set_directory(current);
    }
    if let Some(folder) = dialog.pick_folder() {
        return Some(folder);
    }

    let input = prompter.read_line(&format!("{}（空欄で変更しない）", title))?;
    let input = input.trim().trim_matches('"');
    if input.is_empty() {
        None
    } else {
        Some(PathBuf::from(input))
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "オン"
    } else {
        "オフ"
    }
}

/// 対話式の設定メニュー（変更のたびに保存）
pub fn settings_menu(config: &mut Config, media_types: &[String]) -> Result<SettingsOutcome> {
    let prompter = ConsolePrompter::new(
        config.default_launchbox_image_folder(),
        config.default_pcsx2_covers(),
    );
    let mut outcome = SettingsOutcome::default();

    loop {
        let choices = vec![
            format!("LaunchBoxフォルダ: {}", config.launchbox_root.display()),
            format!("PCSX2フォルダ: {}", config.pcsx2_root.display()),
            format!("画像カテゴリ: {}", config.media_type),
            format!("縮小後の高さ: {}", if config.resize_height == 0 { "縮小しない".to_string() } else { format!("{}px", config.resize_height) }),
            format!("常に上書き: {}", on_off(config.always_overwrite)),
            format!("数字表記を入れ替えて検索: {}", on_off(config.match_options.numeral_search)),
            format!("ローマ数字は大文字のみ: {}", on_off(config.match_options.uppercase_roman_only)),
            format!("英語タイトルのみ: {}", on_off(config.english_titles_only)),
            format!("常に保存済みの選択を再現: {}", on_off(config.always_use_previous_choices)),
            "既定値に戻す".to_string(),
        ];
        let selection = prompter.menu(&["設定".to_string()], &choices, "戻る");

        match selection {
            0 => break,
            1 => {
                if let Some(folder) = pick_folder(&prompter, "LaunchBoxのフォルダを選択", &config.launchbox_root) {
                    config.launchbox_root = folder;
                    outcome.reload_catalogs = true;
                }
            }
            2 => {
                if let Some(folder) = pick_folder(&prompter, "PCSX2のフォルダを選択", &config.pcsx2_root) {
                    config.pcsx2_root = folder;
                    outcome.reload_catalogs = true;
                }
            }
            3 => {
                let mut types: Vec<String> = media_types.to_vec();
                if !types.iter().any(|t| t == MEDIA_TYPE_ALL) {
                    types.push(MEDIA_TYPE_ALL.to_string());
                }
                let n = prompter.menu(&["画像カテゴリを選択".to_string()], &types, "戻る");
                if n > 0 {
                    config.media_type = types[n - 1].clone();
                    outcome.reload_catalogs = true;
                }
            }
            4 => {
                let input = prompter.read_line("縮小後の高さ（0 = 縮小しない）").unwrap_or_default();
                match input.trim().parse::<u32>() {
                    Ok(height) => config.resize_height = height,
                    Err(_) => println!("⚠ 無効な入力です"),
                }
            }
            5 => config.always_overwrite = !config.always_overwrite,
            6 => config.match_options.numeral_search = !config.match_options.numeral_search,
            7 => config.match_options.uppercase_roman_only = !config.match_options.uppercase_roman_only,
            8 => {
                config.english_titles_only = !config.english_titles_only;
                outcome.reload_catalogs = true;
            }
            9 => config.always_use_previous_choices = !config.always_use_previous_choices,
            10 => {
                config.reset();
                outcome.reload_catalogs = true;
                println!("✔ 既定値に戻しました");
            }
            _ => {}
        }

        config.save()?;
    }

    if !config.roots_valid() {
        println!("⚠ LaunchBox/PCSX2 のフォルダが正しくありません");
    }

    Ok(outcome)
}

/// 対話ループの1行入力
pub fn read_command() -> Result<String> {
    println!();
    println!("ディスクパスまたはタイトルを入力してください（help でヘルプ、空行で終了）");
    let input: String = Input::new()
        .with_prompt("--->")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| CoverSyncError::Prompt(e.to_string()))?;
    Ok(input.replace('"', "").trim().to_string())
}
