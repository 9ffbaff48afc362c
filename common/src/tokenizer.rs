//! タイトルの分かち書き・正規化
//!
//! 記号を取り除いて空白で分割し、比較に使う語だけを残す。
//!
//! ## 残す語
//! - 整数（"2", "2002"）
//! - ローマ数字 I〜XX
//! - 3文字以上の語
//! - タイトル全体が1語しかない場合はその語（"GT" のような短いタイトル用）

use crate::types::MatchOptions;

/// ローマ数字 I〜XX（インデックス+1 が値）
pub const ROMAN_NUMERALS: [&str; 20] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X",
    "XI", "XII", "XIII", "XIV", "XV", "XVI", "XVII", "XVIII", "XIX", "XX",
];

/// 語の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    /// 算用数字（整数）
    Arabic,
    /// ローマ数字
    Roman,
}

/// 比較用の語
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 比較テキスト。Word は小文字、Roman は大文字限定モードなら元の表記
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    /// それだけでは一致の根拠にならない語（数字・"the"）
    pub fn is_skip_worthy(&self) -> bool {
        match self.kind {
            TokenKind::Arabic | TokenKind::Roman => true,
            TokenKind::Word => self.text == "the",
        }
    }

    /// 数字の語（候補側とは語単位で比較する）
    pub fn is_numeral(&self) -> bool {
        self.kind != TokenKind::Word
    }
}

/// ローマ数字の値を返す
///
/// `uppercase_only` が有効な場合は大文字表記のみ認識する。
pub fn roman_value(word: &str, uppercase_only: bool) -> Option<u32> {
    let candidate = if uppercase_only {
        word.to_string()
    } else {
        word.to_ascii_uppercase()
    };
    ROMAN_NUMERALS
        .iter()
        .position(|&numeral| numeral == candidate)
        .map(|i| i as u32 + 1)
}

/// 1〜20 をローマ数字に変換
pub fn to_roman(value: u32) -> Option<&'static str> {
    match value {
        1..=20 => Some(ROMAN_NUMERALS[value as usize - 1]),
        _ => None,
    }
}

/// 記号の除去・置換（分割前の正規化）
///
/// コロン、空白直後のハイフン・アンパサンド、括弧類、ダブルクォートを除去し、
/// パス区切り文字は空白に置き換える。大文字小文字はそのまま。
pub fn normalize(raw: &str) -> String {
    let replaced = raw.replace(" -", "").replace(" &", "");
    replaced
        .chars()
        .filter_map(|c| match c {
            ':' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | '“' | '”' => None,
            '\\' | '/' => Some(' '),
            _ => Some(c),
        })
        .collect()
}

/// 正規化して空白で分割（大文字小文字は保持、長さによる除外なし）
pub fn split_words(raw: &str) -> Vec<String> {
    normalize(raw)
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}

/// 数字判定用に語の前後の記号を取り除く
pub(crate) fn numeral_core(word: &str) -> &str {
    word.trim_matches(|c: char| c.is_ascii_punctuation())
}

/// 語を分類する
fn classify(word: &str, options: &MatchOptions) -> Token {
    let core = numeral_core(word);

    if !core.is_empty() && core.chars().all(|c| c.is_ascii_digit()) {
        return Token {
            text: core.to_string(),
            kind: TokenKind::Arabic,
        };
    }

    if roman_value(core, options.uppercase_roman_only).is_some() {
        let text = if options.uppercase_roman_only {
            core.to_string()
        } else {
            core.to_ascii_lowercase()
        };
        return Token {
            text,
            kind: TokenKind::Roman,
        };
    }

    Token {
        text: word.to_lowercase(),
        kind: TokenKind::Word,
    }
}

/// タイトルを比較用の語に分割する
pub fn tokenize(raw: &str, options: &MatchOptions) -> Vec<Token> {
    let words = split_words(raw);
    let single_word = words.len() == 1;

    let all: Vec<Token> = words.iter().map(|w| classify(w, options)).collect();
    let kept: Vec<Token> = all
        .iter()
        .filter(|t| single_word || t.is_numeral() || t.text.chars().count() > 2)
        .cloned()
        .collect();

    // 短い語だけのタイトル（"Oh No" など）は全語を残す
    if kept.is_empty() {
        all
    } else {
        kept
    }
}

/// 語を空白区切りで連結（再分割しても同じ語になる）
pub fn join_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
