//! Cover Sync Common Library
//!
//! ランチャーとエミュレータのゲームカタログを照合するコア部分。
//! 入出力や対話はCLI側が担当し、ここでは照合と選択キャッシュのみを扱う。

pub mod types;
pub mod error;
pub mod tokenizer;
pub mod numeral;
pub mod scorer;
pub mod choice_cache;
pub mod reconcile;

pub use types::{CanonicalTitle, CatalogEntry, EmulatorEntry, MatchLists, MatchOptions};
pub use error::{Error, Result};
pub use tokenizer::{tokenize, Token, TokenKind};
pub use numeral::transpose;
pub use scorer::{search, search_by, search_titles};
pub use choice_cache::{ChoiceCache, ChoiceKind};
pub use reconcile::{Reconciler, Resolution, Selection, SelectionRequest, SelectionStage, Selector};
