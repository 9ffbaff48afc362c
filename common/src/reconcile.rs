//! ランチャーとエミュレータのカタログ照合
//!
//! ディスクごとに次の順で正式タイトルを決める。
//!
//! 1. ディスクパスの完全一致（正規化なし）
//! 2. タイトル照合（数字表記の入れ替えを含む）で完全一致が1件
//! 3. 保存済みの選択を再現（再現が有効で、番号が現在の候補の範囲内の場合のみ）
//! 4. 人による選択（完全一致 → 高確率一致の順）
//!
//! 人の選択は常にランチャー側のタイトルとディスクパスをキーにして保存する。

use crate::choice_cache::{ChoiceCache, ChoiceKind};
use crate::scorer::search_titles;
use crate::types::{CanonicalTitle, CatalogEntry, EmulatorEntry, MatchLists, MatchOptions};
use log::{debug, warn};

/// 選択メニューの段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStage {
    /// 完全一致が複数ある
    FullMatched,
    /// 完全一致なし（または「該当なし」）で高確率一致から選ぶ
    LooseMatched,
}

impl SelectionStage {
    pub fn choice_kind(&self) -> ChoiceKind {
        match self {
            SelectionStage::FullMatched => ChoiceKind::FullMatched,
            SelectionStage::LooseMatched => ChoiceKind::LooseMatched,
        }
    }
}

/// 選択の依頼内容
#[derive(Debug, Clone, Copy)]
pub struct SelectionRequest<'a> {
    pub stage: SelectionStage,
    /// ランチャー側のタイトル
    pub game_title: &'a str,
    pub disc_path: &'a str,
    pub candidates: &'a [CanonicalTitle],
}

/// 人による選択の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// 候補の番号（0始まり）
    Picked(usize),
    /// 該当なし
    NoneOfTheAbove,
}

impl Selection {
    /// 保存用の番号（1始まり、0は「該当なし」）
    pub fn saved_value(&self) -> usize {
        match self {
            Selection::Picked(index) => index + 1,
            Selection::NoneOfTheAbove => 0,
        }
    }
}

/// 候補から1つを選ぶ窓口（コンソール・GUIなど）
pub trait Selector {
    fn select(&mut self, request: &SelectionRequest<'_>) -> Selection;
}

/// タイトルの決まり方
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// ディスクパスが一致
    Exact(String),
    /// 完全一致が1件だけ
    AutoMatched(String),
    /// 保存済みの選択を再現
    Replayed(String),
    /// 人が選択
    Selected(String),
    /// 候補はあったが「該当なし」が選ばれた
    Abandoned,
    /// 候補が1件もない
    NoMatch,
}

impl Resolution {
    /// 決まったタイトル
    pub fn title(&self) -> Option<&str> {
        match self {
            Resolution::Exact(title)
            | Resolution::AutoMatched(title)
            | Resolution::Replayed(title)
            | Resolution::Selected(title) => Some(title),
            Resolution::Abandoned | Resolution::NoMatch => None,
        }
    }
}

/// カタログ照合
pub struct Reconciler<'a> {
    emulator_games: &'a [EmulatorEntry],
    titles: &'a [CanonicalTitle],
    options: MatchOptions,
}

impl<'a> Reconciler<'a> {
    pub fn new(emulator_games: &'a [EmulatorEntry], titles: &'a [CanonicalTitle], options: MatchOptions) -> Self {
        Self {
            emulator_games,
            titles,
            options,
        }
    }

    /// ディスクパスの完全一致でエミュレータ側のゲームを探す
    pub fn exact_lookup(&self, disc_path: &str) -> Option<&'a EmulatorEntry> {
        self.emulator_games
            .iter()
            .find(|entry| entry.disc_path == disc_path && !entry.title.is_empty())
    }

    /// タイトル照合のみ行う
    pub fn search(&self, game_title: &str) -> MatchLists {
        search_titles(game_title, self.titles, &self.options)
    }

    /// 1ディスク分のタイトルを決める
    pub fn resolve(
        &self,
        game: &CatalogEntry,
        disc_path: &str,
        cache: &mut ChoiceCache,
        replay: bool,
        selector: &mut dyn Selector,
    ) -> Resolution {
        if let Some(entry) = self.exact_lookup(disc_path) {
            debug!("ディスクパス一致: {} → {}", disc_path, entry.title);
            return Resolution::Exact(entry.title.clone());
        }

        let lists = self.search(&game.title);

        if lists.full.len() == 1 {
            return Resolution::AutoMatched(lists.full[0].to_string());
        }

        if replay {
            if let Some(title) = Self::replay(&lists, &game.title, disc_path, cache) {
                return Resolution::Replayed(title);
            }
        }

        self.ask(&lists, game, disc_path, cache, selector)
    }

    /// 保存済みの選択を完全一致 → 高確率一致の順に当てはめる
    fn replay(lists: &MatchLists, game_title: &str, disc_path: &str, cache: &ChoiceCache) -> Option<String> {
        let full = cache.replay(game_title, disc_path, &ChoiceKind::FullMatched, &lists.full);
        let loose = || cache.replay(game_title, disc_path, &ChoiceKind::LooseMatched, &lists.probable);

        let title = full.or_else(loose)?;
        debug!("保存済みの選択を再現: {} → {}", game_title, title);
        Some(title.to_string())
    }

    fn ask(
        &self,
        lists: &MatchLists,
        game: &CatalogEntry,
        disc_path: &str,
        cache: &mut ChoiceCache,
        selector: &mut dyn Selector,
    ) -> Resolution {
        if lists.is_empty() {
            return Resolution::NoMatch;
        }

        if lists.full.len() > 1 {
            let selection = Self::ask_stage(SelectionStage::FullMatched, &lists.full, game, disc_path, cache, selector);
            if let Selection::Picked(index) = selection {
                if let Some(title) = lists.full.get(index) {
                    return Resolution::Selected(title.to_string());
                }
            }
        }

        if !lists.probable.is_empty() {
            let selection = Self::ask_stage(SelectionStage::LooseMatched, &lists.probable, game, disc_path, cache, selector);
            if let Selection::Picked(index) = selection {
                if let Some(title) = lists.probable.get(index) {
                    return Resolution::Selected(title.to_string());
                }
            }
        }

        Resolution::Abandoned
    }

    fn ask_stage(
        stage: SelectionStage,
        candidates: &[CanonicalTitle],
        game: &CatalogEntry,
        disc_path: &str,
        cache: &mut ChoiceCache,
        selector: &mut dyn Selector,
    ) -> Selection {
        let request = SelectionRequest {
            stage,
            game_title: &game.title,
            disc_path,
            candidates,
        };
        let selection = match selector.select(&request) {
            Selection::Picked(index) if index >= candidates.len() => Selection::NoneOfTheAbove,
            selection => selection,
        };

        // 完全一致の「該当なし」も保存する（次回は高確率一致の再現へ進む）
        let should_save = stage == SelectionStage::FullMatched || selection != Selection::NoneOfTheAbove;
        if should_save {
            if let Err(e) = cache.put(&game.title, disc_path, &stage.choice_kind(), selection.saved_value()) {
                warn!("選択を保存できませんでした: {}", e);
            }
        }

        selection
    }
}
