use clap::Parser;
use cover_sync::{cli, config, error, launchbox, pcsx2, prompt, session};
use cli::{App, Cli, Commands};
use config::Config;
use cover_sync_common::ChoiceCache;
use error::{CoverSyncError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use prompt::{ConsolePrompter, ShowTarget};
use session::{Catalogs, SearchItem, Session};
use std::time::Duration;

const DIVIDER: &str = "--------------------------------------------------";

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut clog = colog::default_builder();
    clog.filter(
        None,
        if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        },
    );
    clog.init();

    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("設定を読み込めません。既定値を使用します: {}", e);
        Config::default()
    });

    match cli.command.unwrap_or(Commands::Run { item: None }) {
        Commands::Run { item } => {
            println!("🎮 cover-sync - LaunchBox → PCSX2 カバー画像\n");
            ensure_roots(&mut config)?;
            interactive(&mut config, item)?;
        }

        Commands::Sync { item, previous } => {
            ensure_roots(&mut config)?;
            let catalogs = load_catalogs(&config);
            let mut cache = open_choice_cache();

            let Some((item, replay)) = SearchItem::parse(&item, &catalogs.launchbox) else {
                return Err(CoverSyncError::Prompt("検索対象が空です".into()));
            };
            let replay = replay || previous || config.always_use_previous_choices;
            let mut ui = console_prompter(&config, &catalogs);
            Session::new(&config, &catalogs, &mut cache).run(&item, replay, &mut ui);
        }

        Commands::List { app, ids } => {
            let catalogs = load_catalogs(&config);
            match app {
                App::Launchbox => launchbox::print_games(&catalogs.launchbox, ids),
                App::Pcsx2 => pcsx2::print_games(&catalogs.pcsx2, ids),
            }
        }

        Commands::Settings => {
            let catalogs = load_catalogs(&config);
            prompt::settings_menu(&mut config, &catalogs.launchbox.media_types())?;
        }

        Commands::Config {
            show,
            launchbox_root,
            pcsx2_root,
            media_type,
            resize,
            always_overwrite,
            numeral_search,
            uppercase_roman,
            reset,
        } => {
            let mut changed = false;

            if reset {
                config.reset();
                changed = true;
            }
            if let Some(root) = launchbox_root {
                config.launchbox_root = root;
                changed = true;
            }
            if let Some(root) = pcsx2_root {
                config.pcsx2_root = root;
                changed = true;
            }
            if let Some(media_type) = media_type {
                config.media_type = media_type;
                changed = true;
            }
            if let Some(height) = resize {
                config.resize_height = height;
                changed = true;
            }
            if let Some(value) = always_overwrite {
                config.always_overwrite = value;
                changed = true;
            }
            if let Some(value) = numeral_search {
                config.match_options.numeral_search = value;
                changed = true;
            }
            if let Some(value) = uppercase_roman {
                config.match_options.uppercase_roman_only = value;
                changed = true;
            }

            if changed {
                config.save()?;
                println!("✔ 設定を保存しました: {}", Config::config_path()?.display());
            }

            if show || !changed {
                print_config(&config);
            }
        }

        Commands::Choices { clear, info } => {
            let path = Config::choices_path()?;

            if info || !clear {
                if path.exists() {
                    let cache = ChoiceCache::load(&path);
                    println!("保存済みの選択:");
                    println!("  パス: {}", path.display());
                    println!("  ゲーム数: {}", cache.game_count());
                    println!("  件数: {}", cache.len());
                } else {
                    println!("保存済みの選択はありません: {}", path.display());
                }
            }

            if clear {
                if ChoiceCache::clear(&path)? {
                    println!("✔ 保存済みの選択を削除しました: {}", path.display());
                } else {
                    println!("保存済みの選択はありません");
                }
            }
        }

        Commands::Show { app } => {
            let catalogs = load_catalogs(&config);
            let ui = console_prompter(&config, &catalogs);
            ui.show(match app {
                App::Launchbox => ShowTarget::LaunchBox,
                App::Pcsx2 => ShowTarget::Pcsx2,
            });
        }
    }

    Ok(())
}

/// ルートフォルダが正しくなければ設定メニューを開く
fn ensure_roots(config: &mut Config) -> Result<()> {
    if config.roots_valid() {
        return Ok(());
    }

    println!("⚠ LaunchBox/PCSX2 のフォルダが見つかりません。設定してください");
    println!("  LaunchBox: {}", config.launchbox_root.display());
    println!("  PCSX2:     {}", config.pcsx2_root.display());
    prompt::settings_menu(config, &[])?;
    config.require_roots()
}

fn load_catalogs(config: &Config) -> Catalogs {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("カタログを読み込み中...");

    let catalogs = Catalogs::load(config);

    spinner.finish_and_clear();
    println!(
        "✔ LaunchBox: {}件 / PCSX2: {}件（タイトル {}件）",
        catalogs.launchbox.games.len(),
        catalogs.pcsx2.games.len(),
        catalogs.pcsx2.titles.len()
    );
    catalogs
}

fn open_choice_cache() -> ChoiceCache {
    match Config::choices_path() {
        Ok(path) => ChoiceCache::load(&path),
        Err(e) => {
            log::warn!("選択を保存できません（今回のみ有効）: {}", e);
            ChoiceCache::in_memory()
        }
    }
}

fn console_prompter(config: &Config, catalogs: &Catalogs) -> ConsolePrompter {
    ConsolePrompter::new(
        catalogs.launchbox.show_folder(config),
        catalogs.pcsx2.covers_dir.clone(),
    )
}

fn print_config(config: &Config) {
    println!("設定:");
    println!("  LaunchBoxフォルダ: {}", config.launchbox_root.display());
    println!("  PCSX2フォルダ: {}", config.pcsx2_root.display());
    println!("  プラットフォーム: {}", config.platform);
    println!("  画像カテゴリ: {}", config.media_type);
    println!("  縮小後の高さ: {}", config.resize_height);
    println!("  常に上書き: {}", config.always_overwrite);
    println!("  常に保存済みの選択を再現: {}", config.always_use_previous_choices);
    println!("  英語タイトルのみ: {}", config.english_titles_only);
    println!("  数字表記を入れ替えて検索: {}", config.match_options.numeral_search);
    println!("  ローマ数字は大文字のみ: {}", config.match_options.uppercase_roman_only);
}

/// 対話ループ（空行で終了）
fn interactive(config: &mut Config, first: Option<String>) -> Result<()> {
    let mut catalogs = load_catalogs(config);
    let mut cache = open_choice_cache();
    let mut pending = first;

    loop {
        let input = match pending.take() {
            Some(input) => input,
            None => match prompt::read_command() {
                Ok(input) => input,
                Err(e) => {
                    log::debug!("{}", e);
                    break;
                }
            },
        };

        if let Some(target) = ShowTarget::parse(&input) {
            console_prompter(config, &catalogs).show(target);
            continue;
        }

        match input.to_lowercase().as_str() {
            "" => break,
            "help" => {
                prompt::print_help();
                continue;
            }
            "list lb" | "list launchbox" => {
                launchbox::print_games(&catalogs.launchbox, false);
                continue;
            }
            "list ps" | "list pcsx2" => {
                pcsx2::print_games(&catalogs.pcsx2, false);
                continue;
            }
            "settings" | "*" => {
                let outcome = prompt::settings_menu(config, &catalogs.launchbox.media_types())?;
                if outcome.reload_catalogs {
                    catalogs = load_catalogs(config);
                }
                continue;
            }
            _ => {}
        }

        let Some((item, replay)) = SearchItem::parse(&input, &catalogs.launchbox) else {
            continue;
        };
        let replay = replay || config.always_use_previous_choices;

        println!("{}", DIVIDER);
        let mut ui = console_prompter(config, &catalogs);
        Session::new(config, &catalogs, &mut cache).run(&item, replay, &mut ui);
        println!("{}", DIVIDER);
    }

    Ok(())
}
