//! タイトル照合（完全一致・高確率一致の分類）
//!
//! ## 判定
//! 1. 検索タイトルを語に分割（tokenizer）
//! 2. 候補ごとに、見つかった語数と、そのうち数字・"the" の数を数える
//! 3. 全語が見つかれば完全一致
//! 4. それ以外は数字・"the" を除いた一致数が、調整後の語数の半分（切り上げ）以上なら高確率一致
//!
//! 通常の語は候補タイトル（小文字）への部分一致、数字は候補の語との完全一致で判定する。
//! "Final Fantasy X" の "X" が "X-2" や "XII" に一致しないようにするため。

use crate::numeral;
use crate::tokenizer::{numeral_core, split_words, tokenize, Token, TokenKind};
use crate::types::{CanonicalTitle, MatchLists, MatchOptions};
use log::debug;

/// 候補タイトルの比較用データ
struct CandidateText {
    lowered: String,
    /// 数字比較用の語（前後の記号を除去済み）
    words: Vec<String>,
}

impl CandidateText {
    fn new(title: &str) -> Self {
        let words = split_words(title)
            .iter()
            .map(|w| numeral_core(w).to_string())
            .collect();
        Self {
            lowered: title.trim().to_lowercase(),
            words,
        }
    }

    fn contains(&self, token: &Token, options: &MatchOptions) -> bool {
        match token.kind {
            TokenKind::Word => self.lowered.contains(&token.text),
            TokenKind::Arabic => self.words.iter().any(|w| *w == token.text),
            TokenKind::Roman if options.uppercase_roman_only => {
                self.words.iter().any(|w| *w == token.text)
            }
            TokenKind::Roman => self.words.iter().any(|w| w.eq_ignore_ascii_case(&token.text)),
        }
    }
}

/// 1候補の一致数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordCount {
    /// 検索語の総数
    pub total: usize,
    /// 見つかった語数
    pub found: usize,
    /// 見つかった語のうち数字・"the" の数
    pub skipped: usize,
}

/// 一致の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchClass {
    Full,
    Probable,
    None,
}

impl WordCount {
    /// 高確率一致に必要な一致数
    ///
    /// 数字・"the" が見つかっている場合は、見つからなかった語数を
    /// `skipped / total` の割合で語数から差し引いてから半分を取る。
    pub fn required(&self) -> usize {
        let total = self.total as f64;
        let denominator = if self.skipped > 0 {
            let not_found = (self.total - self.found) as f64;
            total - not_found * self.skipped as f64 / total
        } else {
            total
        };
        (denominator / 2.0).ceil() as usize
    }

    pub fn classify(&self) -> MatchClass {
        // 検索語がなければ何にも一致しない（空集合の完全一致を防ぐ）
        if self.total == 0 {
            return MatchClass::None;
        }
        if self.found == self.total {
            return MatchClass::Full;
        }
        if self.found - self.skipped >= self.required() {
            MatchClass::Probable
        } else {
            MatchClass::None
        }
    }
}

/// 検索語と候補タイトルの一致数を数える
pub fn count_words(tokens: &[Token], candidate: &str, options: &MatchOptions) -> WordCount {
    let text = CandidateText::new(candidate);
    let mut count = WordCount {
        total: tokens.len(),
        found: 0,
        skipped: 0,
    };

    for token in tokens {
        if text.contains(token, options) {
            count.found += 1;
            if token.is_skip_worthy() {
                count.skipped += 1;
            }
        }
    }

    count
}

/// 任意の候補型に対して照合する
///
/// `title_of` で候補からタイトル文字列を取り出す。出力は候補の入力順。
pub fn search_by<T, F>(query: &str, candidates: &[T], title_of: F, options: &MatchOptions) -> MatchLists<T>
where
    T: Clone + PartialEq,
    F: Fn(&T) -> &str,
{
    let tokens = tokenize(query, options);
    let mut lists = MatchLists::default();

    if tokens.is_empty() {
        debug!("検索語なし: {:?}", query);
        return lists;
    }

    for candidate in candidates {
        let count = count_words(&tokens, title_of(candidate), options);
        match count.classify() {
            MatchClass::Full => {
                if !lists.full.contains(candidate) {
                    lists.full.push(candidate.clone());
                }
            }
            MatchClass::Probable => {
                if !lists.probable.contains(candidate) {
                    lists.probable.push(candidate.clone());
                }
            }
            MatchClass::None => {}
        }
    }

    debug!(
        "照合 {:?}: 完全一致 {}件, 高確率一致 {}件",
        query,
        lists.full.len(),
        lists.probable.len()
    );

    lists
}

/// 正式タイトルのリストに対して照合する
pub fn search(query: &str, candidates: &[CanonicalTitle], options: &MatchOptions) -> MatchLists {
    search_by(query, candidates, |t| t.as_str(), options)
}

/// 2つの照合結果を統合する
///
/// 完全一致はどちらの結果でも高確率一致より優先される。順序は `first` → `second`。
pub fn merge<T: Clone + PartialEq>(first: MatchLists<T>, second: MatchLists<T>) -> MatchLists<T> {
    let mut merged = MatchLists::default();

    for title in first.full.into_iter().chain(second.full) {
        if !merged.full.contains(&title) {
            merged.full.push(title);
        }
    }
    for title in first.probable.into_iter().chain(second.probable) {
        if !merged.full.contains(&title) && !merged.probable.contains(&title) {
            merged.probable.push(title);
        }
    }

    merged
}

/// 数字表記の入れ替えも含めて照合する
///
/// `numeral_search` が有効で別表記が作れる場合は2回目の検索を行い、結果を統合する。
pub fn search_titles(query: &str, candidates: &[CanonicalTitle], options: &MatchOptions) -> MatchLists {
    let primary = search(query, candidates, options);

    if !options.numeral_search {
        return primary;
    }

    match numeral::transpose(query, options) {
        Some(alternate) => {
            debug!("数字表記を入れ替えて再検索: {:?}", alternate);
            let secondary = search(&alternate, candidates, options);
            merge(primary, secondary)
        }
        None => primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(list: &[&str]) -> Vec<CanonicalTitle> {
        list.iter().map(|&t| CanonicalTitle::from(t)).collect()
    }

    fn names(list: &[CanonicalTitle]) -> Vec<&str> {
        list.iter().map(|t| t.as_str()).collect()
    }

    #[test]
    fn test_final_fantasy_x_is_not_x2_or_xii() {
        let options = MatchOptions { numeral_search: false, ..MatchOptions::default() };
        let candidates = titles(&["Final Fantasy X", "Final Fantasy X-2", "Final Fantasy XII"]);
        let lists = search("Final Fantasy X", &candidates, &options);
        assert_eq!(names(&lists.full), vec!["Final Fantasy X"]);
        assert_eq!(names(&lists.probable), vec!["Final Fantasy X-2", "Final Fantasy XII"]);
    }

    #[test]
    fn test_full_matches_are_not_probable() {
        let options = MatchOptions::default();
        let candidates = titles(&["Final Fantasy X", "Final Fantasy X-2", "Final Fantasy XII"]);
        let lists = search_titles("Final Fantasy X", &candidates, &options);
        assert_eq!(names(&lists.full), vec!["Final Fantasy X"]);
        for title in &lists.full {
            assert!(!lists.probable.contains(title));
        }
    }

    #[test]
    fn test_numeral_pass_finds_roman_sequel() {
        let options = MatchOptions::default();
        let candidates = titles(&["Silent Hill II"]);
        let lists = search_titles("Silent Hill 2", &candidates, &options);
        assert_eq!(names(&lists.full), vec!["Silent Hill II"]);
        assert!(lists.probable.is_empty());
    }

    #[test]
    fn test_numeral_pass_disabled() {
        let options = MatchOptions { numeral_search: false, ..MatchOptions::default() };
        let candidates = titles(&["Silent Hill II"]);
        let lists = search_titles("Silent Hill 2", &candidates, &options);
        assert!(lists.full.is_empty());
        assert_eq!(names(&lists.probable), vec!["Silent Hill II"]);
    }

    #[test]
    fn test_threshold_boundary() {
        let options = MatchOptions::default();
        let candidates = titles(&["Shadow Hearts Covenant", "Shadow Tower Abyss"]);
        // shadow, hearts, from, the, new, world の6語中2語 → 必要数3に届かない
        let lists = search("Shadow Hearts From the New World", &candidates, &options);
        assert!(lists.full.is_empty());
        assert!(lists.probable.is_empty());

        // 4語中2語 = ちょうど50% → 高確率一致
        let lists = search("Shadow Hearts Dark Ruins", &candidates, &options);
        assert_eq!(names(&lists.probable), vec!["Shadow Hearts Covenant"]);
    }

    #[test]
    fn test_one_below_threshold_is_excluded() {
        let count = WordCount { total: 4, found: 2, skipped: 0 };
        assert_eq!(count.classify(), MatchClass::Probable);
        let count = WordCount { total: 4, found: 1, skipped: 0 };
        assert_eq!(count.classify(), MatchClass::None);
        let count = WordCount { total: 5, found: 3, skipped: 0 };
        assert_eq!(count.classify(), MatchClass::Probable);
        let count = WordCount { total: 5, found: 2, skipped: 0 };
        assert_eq!(count.classify(), MatchClass::None);
    }

    #[test]
    fn test_skip_worthy_words_are_discounted() {
        // "the" と数字だけの一致は根拠にならない
        let count = WordCount { total: 3, found: 2, skipped: 2 };
        assert_eq!(count.classify(), MatchClass::None);

        // 4語中 "the" + 2語一致、1語不一致: 4 - 1*1/4 = 3.75 → 必要数 2
        let count = WordCount { total: 4, found: 3, skipped: 1 };
        assert_eq!(count.required(), 2);
        assert_eq!(count.classify(), MatchClass::Probable);

        // 6語中 数字1 + 2語一致、3語不一致: 6 - 3*1/6 = 5.5 → 必要数 3
        let count = WordCount { total: 6, found: 3, skipped: 1 };
        assert_eq!(count.required(), 3);
        assert_eq!(count.classify(), MatchClass::None);
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let options = MatchOptions::default();
        let candidates = titles(&["Oh No!", "Ico"]);
        let lists = search("", &candidates, &options);
        assert!(lists.is_empty());
        assert_eq!(WordCount { total: 0, found: 0, skipped: 0 }.classify(), MatchClass::None);
    }

    #[test]
    fn test_short_words_only_query() {
        let options = MatchOptions::default();
        let candidates = titles(&["Oh No!", "Ico"]);
        let lists = search("Oh No", &candidates, &options);
        assert_eq!(names(&lists.full), vec!["Oh No!"]);
        assert!(lists.probable.is_empty());
    }

    #[test]
    fn test_single_short_word_query() {
        let options = MatchOptions::default();
        let candidates = titles(&["GT4", "Gran Turismo 4", "Ico"]);
        let lists = search("GT", &candidates, &options);
        assert_eq!(names(&lists.full), vec!["GT4"]);
    }

    #[test]
    fn test_full_match_contains_every_token() {
        let options = MatchOptions::default();
        let candidates = titles(&[
            "Grand Theft Auto: Vice City",
            "Grand Theft Auto: Vice City Stories",
            "Grand Theft Auto: San Andreas",
        ]);
        let query = "Grand Theft Auto - Vice City";
        let lists = search(query, &candidates, &options);
        let tokens = tokenize(query, &options);
        assert_eq!(lists.full.len(), 2);
        for title in &lists.full {
            let lowered = title.as_str().to_lowercase();
            for token in &tokens {
                assert!(lowered.contains(&token.text.to_lowercase()));
            }
        }
        assert_eq!(names(&lists.probable), vec!["Grand Theft Auto: San Andreas"]);
    }

    #[test]
    fn test_search_by_keeps_input_order() {
        #[derive(Clone, PartialEq, Debug)]
        struct Game {
            name: &'static str,
        }
        let games = vec![
            Game { name: "Tekken Tag Tournament" },
            Game { name: "Tekken 4" },
            Game { name: "Tekken 5" },
        ];
        let options = MatchOptions::default();
        let lists = search_by("Tekken", &games, |g| g.name, &options);
        assert_eq!(lists.full, games);
    }

    #[test]
    fn test_merge_deduplicates() {
        let first = MatchLists {
            full: titles(&["A"]),
            probable: titles(&["B", "C"]),
        };
        let second = MatchLists {
            full: titles(&["B"]),
            probable: titles(&["C", "D"]),
        };
        let merged = merge(first, second);
        assert_eq!(names(&merged.full), vec!["A", "B"]);
        assert_eq!(names(&merged.probable), vec!["C", "D"]);
    }
}
