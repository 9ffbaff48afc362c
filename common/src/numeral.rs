//! ローマ数字⇔算用数字の入れ替え
//!
//! "Silent Hill 2" と "Silent Hill II" のように、カタログ間で続編番号の表記が
//! 異なる場合の2回目の検索に使う。置換するのは最初に見つかった数字1つだけ。

use crate::tokenizer::{numeral_core, roman_value, to_roman};
use crate::types::MatchOptions;
use regex::Regex;
use std::ops::Range;

lazy_static::lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"\S+").unwrap();
}

/// 語の中で数字部分が占める範囲（前後の記号を除く）
fn core_range(title: &str, word: Range<usize>) -> (Range<usize>, &str) {
    let text = &title[word.clone()];
    let core = numeral_core(text);
    let offset = text.find(core).unwrap_or(0);
    let start = word.start + offset;
    (start..start + core.len(), core)
}

/// 最初のローマ数字を算用数字に置き換える（見つからなければそのまま）
pub fn roman_to_arabic(title: &str, uppercase_only: bool) -> String {
    for m in WORD_RE.find_iter(title) {
        let (range, core) = core_range(title, m.range());
        if let Some(value) = roman_value(core, uppercase_only) {
            let mut rewritten = title.to_string();
            rewritten.replace_range(range, &value.to_string());
            return rewritten;
        }
    }
    title.to_string()
}

/// 最初の算用数字（1〜20）をローマ数字に置き換える（見つからなければそのまま）
pub fn arabic_to_roman(title: &str) -> String {
    for m in WORD_RE.find_iter(title) {
        let (range, core) = core_range(title, m.range());
        if core.is_empty() || !core.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        // "02" のような0埋めは対象外
        let Ok(value) = core.parse::<u32>() else {
            continue;
        };
        if value.to_string() != core {
            continue;
        }
        if let Some(roman) = to_roman(value) {
            let mut rewritten = title.to_string();
            rewritten.replace_range(range, roman);
            return rewritten;
        }
    }
    title.to_string()
}

/// 数字表記を入れ替えたタイトルを返す
///
/// ローマ数字→算用数字を先に試し、変化がなければ算用数字→ローマ数字を試す。
/// どちらでも変化しなければ `None`（別表記なし）。
pub fn transpose(title: &str, options: &MatchOptions) -> Option<String> {
    let arabic = roman_to_arabic(title, options.uppercase_roman_only);
    if arabic != title {
        return Some(arabic);
    }

    let roman = arabic_to_roman(title);
    if roman != title {
        return Some(roman);
    }

    None
}
