//! ゲーム・ディスクごとの処理
//!
//! 検索 → タイトル照合 → 画像選択 → 既存画像の確認 → 配置 の順に進める。
//! ディスク単位の失敗は報告して次のディスクへ進む。

use crate::config::Config;
use crate::images::{self, Installed, Placement};
use crate::launchbox::{self, LaunchBoxCatalog};
use crate::pcsx2::{self, Pcsx2Catalog};
use crate::prompt::{ConflictAction, Interaction};
use cover_sync_common::{CatalogEntry, ChoiceCache, ChoiceKind, Reconciler, Resolution};
use std::path::{Path, PathBuf};

/// 読み込み済みの両カタログ
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub launchbox: LaunchBoxCatalog,
    pub pcsx2: Pcsx2Catalog,
}

impl Catalogs {
    /// 両カタログを読み込む（読めないものは空として扱う）
    pub fn load(config: &Config) -> Self {
        let launchbox = launchbox::load(config).unwrap_or_else(|e| {
            log::warn!("LaunchBoxのカタログを読み込めません: {}", e);
            LaunchBoxCatalog {
                image_folder: config.default_launchbox_image_folder(),
                ..Default::default()
            }
        });
        let pcsx2 = pcsx2::load(config);
        Self { launchbox, pcsx2 }
    }
}

/// 検索対象
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchItem {
    /// LaunchBoxに登録されたディスクパス（完全一致）
    DiscPath(String),
    /// タイトルの一部
    Title(String),
    /// すべてのゲーム
    All,
}

impl SearchItem {
    /// 入力を解釈する。末尾の `*` は保存済み選択の再現指定（戻り値の bool）
    pub fn parse(input: &str, launchbox: &LaunchBoxCatalog) -> Option<(Self, bool)> {
        let input = input.replace('"', "");
        let mut input = input.trim();
        let replay = input.ends_with('*');
        if replay {
            input = input[..input.len() - 1].trim_end();
        }
        if input.is_empty() {
            return None;
        }

        let item = if input.eq_ignore_ascii_case("all") {
            SearchItem::All
        } else if launchbox.games.iter().any(|g| g.disc_paths.iter().any(|p| p == input)) {
            SearchItem::DiscPath(input.to_string())
        } else {
            SearchItem::Title(input.to_string())
        };
        Some((item, replay))
    }
}

/// ディスク1枚の処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscOutcome {
    Installed { title: String, installed: Installed },
    /// 照合できるタイトルがない
    NoMatch,
    /// 候補から「該当なし」が選ばれた
    Abandoned,
    NoImages { title: String },
    Canceled { title: String },
    Failed { title: String, reason: String },
}

/// ディスクごとの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscReport {
    pub game_title: String,
    pub disc_path: String,
    pub outcome: DiscOutcome,
}

pub struct Session<'a> {
    config: &'a Config,
    catalogs: &'a Catalogs,
    cache: &'a mut ChoiceCache,
}

impl<'a> Session<'a> {
    pub fn new(config: &'a Config, catalogs: &'a Catalogs, cache: &'a mut ChoiceCache) -> Self {
        Self { config, catalogs, cache }
    }

    /// 検索対象のゲームを探す
    pub fn find_games<I: Interaction>(&self, item: &SearchItem, ui: &mut I) -> Vec<CatalogEntry> {
        let launchbox = &self.catalogs.launchbox;
        match item {
            SearchItem::All => launchbox.games.clone(),
            SearchItem::DiscPath(disc_path) => launchbox.find_by_disc(disc_path),
            SearchItem::Title(query) => {
                let found = launchbox.find_by_title(query);
                if found.len() <= 1 {
                    return found;
                }
                ui.choose_games(query, &found)
                    .into_iter()
                    .filter_map(|i| found.get(i).cloned())
                    .collect()
            }
        }
    }

    /// 検索対象のすべてのディスクを処理
    pub fn run<I: Interaction>(&mut self, item: &SearchItem, replay: bool, ui: &mut I) -> Vec<DiscReport> {
        let games = self.find_games(item, ui);
        if games.is_empty() {
            let label = match item {
                SearchItem::DiscPath(s) | SearchItem::Title(s) => s.as_str(),
                SearchItem::All => "all",
            };
            println!("⚠ LaunchBoxにゲームが見つかりません: {}", label);
            return Vec::new();
        }

        let mut reports = Vec::new();
        for game in &games {
            for disc_path in &game.disc_paths {
                println!();
                println!("タイトル: {}", game.title);
                println!("ディスク: {}", disc_path);

                let outcome = self.process_disc(game, disc_path, replay, ui);
                print_outcome(&outcome);
                reports.push(DiscReport {
                    game_title: game.title.clone(),
                    disc_path: disc_path.clone(),
                    outcome,
                });
            }
        }

        if reports.len() > 1 {
            print_summary(&reports);
        }
        reports
    }

    /// ディスク1枚を処理
    pub fn process_disc<I: Interaction>(
        &mut self,
        game: &CatalogEntry,
        disc_path: &str,
        replay: bool,
        ui: &mut I,
    ) -> DiscOutcome {
        let config = self.config;
        let catalogs = self.catalogs;
        let pcsx2 = &catalogs.pcsx2;
        let reconciler = Reconciler::new(&pcsx2.games, &pcsx2.titles, config.match_options);

        let resolution = reconciler.resolve(game, disc_path, self.cache, replay, ui);
        let title = match &resolution {
            Resolution::NoMatch => return DiscOutcome::NoMatch,
            Resolution::Abandoned => return DiscOutcome::Abandoned,
            resolution => match resolution.title() {
                Some(title) => title.to_string(),
                None => return DiscOutcome::NoMatch,
            },
        };
        println!("→ PCSX2タイトル: {}", title);

        let folders = catalogs.launchbox.image_folders(config);
        let sources = images::find_source_images(&folders, &game.title);
        if sources.is_empty() {
            return DiscOutcome::NoImages { title };
        }

        let Some(source) = self.choose_image(game, disc_path, &sources, replay, ui) else {
            return DiscOutcome::Canceled { title };
        };

        let destination = pcsx2.covers_dir.join(images::cover_file_name(&title, &source));
        let conflicts = images::existing_covers(&destination);

        let result = if conflicts.is_empty() {
            images::install_cover(&source, &destination, &[], false, config.resize_height)
        } else {
            match self.decide_conflict(game, disc_path, &destination, &conflicts, replay, ui) {
                ConflictAction::Overwrite => images::install_cover(
                    &source,
                    &destination,
                    &conflicts,
                    true,
                    config.resize_height,
                ),
                ConflictAction::Rename => {
                    let Some(renamed) = ask_new_destination(&destination, &source, ui) else {
                        return DiscOutcome::Canceled { title };
                    };
                    images::install_cover(&source, &renamed, &[], false, config.resize_height)
                }
                ConflictAction::Cancel => return DiscOutcome::Canceled { title },
            }
        };

        match result {
            Ok(installed) => DiscOutcome::Installed { title, installed },
            Err(e) => DiscOutcome::Failed {
                title,
                reason: e.to_string(),
            },
        }
    }

    fn choose_image<I: Interaction>(
        &mut self,
        game: &CatalogEntry,
        disc_path: &str,
        sources: &[PathBuf],
        replay: bool,
        ui: &mut I,
    ) -> Option<PathBuf> {
        if sources.len() == 1 {
            return sources.first().cloned();
        }

        let kind = ChoiceKind::Image(self.config.media_type.clone());
        if replay {
            if let Some(source) = self.cache.replay(&game.title, disc_path, &kind, sources) {
                log::debug!("保存済みの画像を再現: {}", source.display());
                return Some(source.clone());
            }
        }

        let index = ui.choose_image(&game.title, sources)?;
        let source = sources.get(index)?.clone();
        if let Err(e) = self.cache.put(&game.title, disc_path, &kind, index + 1) {
            log::warn!("選択を保存できませんでした: {}", e);
        }
        Some(source)
    }

    /// 既存カバー画像の扱いを決める
    ///
    /// 再現できるのは「上書き」のみ。それ以外を選んだら保存済みの「上書き」を消す。
    fn decide_conflict<I: Interaction>(
        &mut self,
        game: &CatalogEntry,
        disc_path: &str,
        destination: &Path,
        conflicts: &[PathBuf],
        replay: bool,
        ui: &mut I,
    ) -> ConflictAction {
        let kind = ChoiceKind::Overwrite(self.config.media_type.clone());

        if replay && self.cache.get(&game.title, disc_path, &kind) == Some(1) {
            log::debug!("保存済みの上書きを再現: {}", destination.display());
            return ConflictAction::Overwrite;
        }
        if self.config.always_overwrite {
            return ConflictAction::Overwrite;
        }

        let action = ui.resolve_conflict(destination, conflicts);
        let saved = match action {
            ConflictAction::Overwrite => self.cache.put(&game.title, disc_path, &kind, 1).map(|_| ()),
            ConflictAction::Rename | ConflictAction::Cancel => {
                self.cache.remove(&game.title, disc_path, &kind).map(|_| ())
            }
        };
        if let Err(e) = saved {
            log::warn!("選択を保存できませんでした: {}", e);
        }
        action
    }
}

/// 名前変更後の配置先を決める（同じ名前・既存の名前は再入力）
fn ask_new_destination<I: Interaction>(destination: &Path, source: &Path, ui: &mut I) -> Option<PathBuf> {
    let previous = destination
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    loop {
        let name = ui.new_cover_name(&previous)?;
        if name == previous {
            println!("⚠ 元の名前と同じです");
            continue;
        }
        let renamed = destination.with_file_name(images::cover_file_name(&name, source));
        if !images::existing_covers(&renamed).is_empty() {
            println!("⚠ 既に存在します: {}", renamed.display());
            continue;
        }
        return Some(renamed);
    }
}

fn print_outcome(outcome: &DiscOutcome) {
    match outcome {
        DiscOutcome::Installed { installed, .. } => {
            match installed.placement {
                Placement::Resized { from, to } => println!(
                    "✔ 縮小して配置しました ({}x{} → {}x{})",
                    from.0, from.1, to.0, to.1
                ),
                Placement::Copied => println!("✔ コピーしました"),
            }
            println!("  {}", installed.destination.display());
            if installed.removed > 0 {
                println!("  既存のカバー画像 {}件を置き換えました", installed.removed);
            }
        }
        DiscOutcome::NoMatch => println!("⚠ 一致するPCSX2タイトルがありません"),
        DiscOutcome::Abandoned => println!("→ スキップしました"),
        DiscOutcome::NoImages { title } => println!("⚠ 画像が見つかりません: {}", title),
        DiscOutcome::Canceled { .. } => println!("→ キャンセルしました"),
        DiscOutcome::Failed { reason, .. } => println!("⚠ 配置に失敗しました: {}", reason),
    }
}

fn print_summary(reports: &[DiscReport]) {
    let installed = reports
        .iter()
        .filter(|r| matches!(r.outcome, DiscOutcome::Installed { .. }))
        .count();
    let failed = reports
        .iter()
        .filter(|r| matches!(r.outcome, DiscOutcome::Failed { .. }))
        .count();
    println!();
    println!(
        "✔ 完了: {}枚中 {}枚を配置（失敗 {}枚、その他 {}枚）",
        reports.len(),
        installed,
        failed,
        reports.len() - installed - failed
    );
}
