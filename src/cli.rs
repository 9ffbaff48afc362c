use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cover-sync")]
#[command(about = "LaunchBoxの画像をPCSX2のカバー画像として配置するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 対話モードで実行（既定）
    Run {
        /// 最初に処理するディスクパスまたはタイトル
        item: Option<String>,
    },

    /// 1件だけ処理して終了
    Sync {
        /// ディスクパス、タイトルの一部、または all
        #[arg(required = true)]
        item: String,

        /// 保存済みの選択を再現
        #[arg(short, long)]
        previous: bool,
    },

    /// ゲーム一覧を表示
    List {
        /// 対象 (launchbox/pcsx2)
        #[arg(required = true)]
        app: App,

        /// ID（シリアル）も表示
        #[arg(long)]
        ids: bool,
    },

    /// 対話式の設定メニュー
    Settings,

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// LaunchBoxのフォルダ
        #[arg(long)]
        launchbox_root: Option<PathBuf>,

        /// PCSX2のフォルダ
        #[arg(long)]
        pcsx2_root: Option<PathBuf>,

        /// 画像カテゴリ（"Box - Front" など）
        #[arg(long)]
        media_type: Option<String>,

        /// 縮小後の高さ（0 = 縮小しない）
        #[arg(long)]
        resize: Option<u32>,

        /// 既存のカバー画像を常に上書き
        #[arg(long)]
        always_overwrite: Option<bool>,

        /// 数字表記を入れ替えて検索
        #[arg(long)]
        numeral_search: Option<bool>,

        /// ローマ数字は大文字のみ認識
        #[arg(long)]
        uppercase_roman: Option<bool>,

        /// 既定値に戻す
        #[arg(long)]
        reset: bool,
    },

    /// 保存済みの選択を管理
    Choices {
        /// 保存済みの選択を削除
        #[arg(long)]
        clear: bool,

        /// 情報を表示
        #[arg(long)]
        info: bool,
    },

    /// 画像フォルダを開く
    Show {
        /// 対象 (launchbox/pcsx2)
        #[arg(required = true)]
        app: App,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum App {
    #[value(alias = "lb")]
    Launchbox,
    #[value(alias = "ps")]
    Pcsx2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_command_defaults_to_run() {
        let cli = Cli::try_parse_from(["cover-sync"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_sync_with_previous() {
        let cli = Cli::try_parse_from(["cover-sync", "-v", "sync", "Okami", "--previous"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Sync { item, previous }) => {
                assert_eq!(item, "Okami");
                assert!(previous);
            }
            _ => panic!("sync expected"),
        }
    }

    #[test]
    fn test_list_alias() {
        let cli = Cli::try_parse_from(["cover-sync", "list", "ps", "--ids"]).unwrap();
        match cli.command {
            Some(Commands::List { app, ids }) => {
                assert_eq!(app, App::Pcsx2);
                assert!(ids);
            }
            _ => panic!("list expected"),
        }
    }

    #[test]
    fn test_config_flags() {
        let cli = Cli::try_parse_from([
            "cover-sync",
            "config",
            "--resize",
            "0",
            "--numeral-search",
            "false",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Config { resize, numeral_search, always_overwrite, .. }) => {
                assert_eq!(resize, Some(0));
                assert_eq!(numeral_search, Some(false));
                assert_eq!(always_overwrite, None);
            }
            _ => panic!("config expected"),
        }
    }
}
