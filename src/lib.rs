//! Cover Sync
//!
//! LaunchBoxに登録されたPS2ゲームの画像を、PCSX2のカバー画像フォルダへ
//! PCSX2の正式タイトル名で配置する。

pub mod cli;
pub mod config;
pub mod error;
pub mod images;
pub mod launchbox;
pub mod pcsx2;
pub mod prompt;
pub mod session;
