//! カタログ読み込みテスト
//!
//! LaunchBox / PCSX2 のフォルダ構成を一時フォルダに作って読み込みを検証

use cover_sync::config::{Config, MEDIA_TYPE_ALL};
use cover_sync::error::CoverSyncError;
use cover_sync::session::Catalogs;
use cover_sync::{launchbox, pcsx2};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const PLATFORM_XML: &str = r#"<?xml version="1.0" standalone="yes"?>
<LaunchBox>
  <Game>
    <ApplicationPath>D:\PS2\Okami.iso</ApplicationPath>
    <ID>okami-id</ID>
    <Title>Okami</Title>
  </Game>
  <Game>
    <ApplicationPath>D:\PS2\FFX.iso</ApplicationPath>
    <ID>ffx-id</ID>
    <Title>Final Fantasy X</Title>
  </Game>
</LaunchBox>"#;

const PLATFORMS_XML: &str = r#"<LaunchBox>
  <PlatformFolder>
    <MediaType>Box - Front</MediaType>
    <FolderPath>Images/Sony Playstation 2/Box - Front</FolderPath>
    <Platform>Sony Playstation 2</Platform>
  </PlatformFolder>
  <PlatformFolder>
    <MediaType>Box - 3D</MediaType>
    <FolderPath>Images/Sony Playstation 2/Box - 3D</FolderPath>
    <Platform>Sony Playstation 2</Platform>
  </PlatformFolder>
</LaunchBox>"#;

const GAME_INDEX: &str = r#"SLUS-21115:
  name: "Okami"
  region: "NTSC-U"
SLPM-67003:
  name: "ファイナルファンタジーX インターナショナル"
  name-en: "Final Fantasy X International"
  region: "NTSC-J"
SLUS-20312:
  name: "Final Fantasy X"
  region: "NTSC-U"
"#;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn cache_bytes(records: &[[&str; 3]]) -> Vec<u8> {
    let mut bytes = vec![0x01, 0x00, 0x00, 0x00];
    for record in records {
        for text in record {
            bytes.extend_from_slice(&(text.len() as u32).to_le_bytes());
            bytes.extend_from_slice(text.as_bytes());
        }
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    }
    bytes
}

fn setup(root: &Path) -> Config {
    let mut config = Config::default();
    config.launchbox_root = root.join("LaunchBox");
    config.pcsx2_root = root.join("PCSX2");

    write(&config.launchbox_root.join("LaunchBox.exe"), b"");
    write(&config.launchbox_platform_xml(), PLATFORM_XML.as_bytes());
    write(&config.launchbox_platforms_xml(), PLATFORMS_XML.as_bytes());

    write(&config.pcsx2_root.join("pcsx2-qt.exe"), b"");
    write(&config.pcsx2_game_index(), GAME_INDEX.as_bytes());
    write(&config.pcsx2_settings_ini(), b"[Folders]\nCache = cache\nCovers = my covers\n");
    write(
        &config.pcsx2_game_list_cache(),
        &cache_bytes(&[
            [r"D:\PS2\Okami.iso", "SLUS-21115", "OKAMI"],
            [r"D:\PS2\FFX Intl.iso", "SLPM-67003", "FFX INTL"],
            [r"D:\PS2\FFX Hack.iso", "SLUS-20312", "FFX"],
        ]),
    );
    write(
        &config.pcsx2_custom_properties(),
        "[D:\\PS2\\FFX Hack.iso]\nTitle=Final Fantasy X Randomizer\n".as_bytes(),
    );

    config
}

#[test]
fn test_load_launchbox_catalog() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = setup(dir.path());
    assert!(config.roots_valid());

    let catalog = launchbox::load(&config).expect("LaunchBox読み込み失敗");
    assert_eq!(catalog.games.len(), 2);
    assert_eq!(catalog.media_types(), vec!["Box - Front", "Box - 3D", MEDIA_TYPE_ALL]);
    assert_eq!(
        catalog.image_folder,
        config.launchbox_root.join("Images/Sony Playstation 2/Box - Front")
    );
    assert_eq!(catalog.image_folders(&config), vec![catalog.image_folder.clone()]);
}

#[test]
fn test_all_media_types_searches_every_folder() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut config = setup(dir.path());
    config.media_type = MEDIA_TYPE_ALL.to_string();

    let catalog = launchbox::load(&config).expect("LaunchBox読み込み失敗");
    assert_eq!(catalog.image_folders(&config).len(), 2);
    assert_eq!(
        catalog.show_folder(&config),
        config.launchbox_root.join("Images/Sony Playstation 2")
    );
}

#[test]
fn test_load_pcsx2_catalog() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = setup(dir.path());

    let catalog = pcsx2::load(&config);
    assert_eq!(catalog.covers_dir, config.pcsx2_root.join("my covers"));

    let titles: Vec<&str> = catalog.titles.iter().map(|t| t.as_str()).collect();
    assert_eq!(titles, vec!["Okami", "Final Fantasy X International", "Final Fantasy X"]);

    let by_disc = |path: &str| {
        catalog
            .games
            .iter()
            .find(|g| g.disc_path == path)
            .map(|g| g.title.clone())
    };
    assert_eq!(by_disc(r"D:\PS2\Okami.iso").as_deref(), Some("Okami"));
    assert_eq!(by_disc(r"D:\PS2\FFX Intl.iso").as_deref(), Some("Final Fantasy X International"));
    assert_eq!(by_disc(r"D:\PS2\FFX Hack.iso").as_deref(), Some("Final Fantasy X Randomizer"));
}

/// ファイルがなくても空のカタログとして続行
#[test]
fn test_missing_files_degrade_to_empty() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.launchbox_root = dir.path().join("LaunchBox");
    config.pcsx2_root = dir.path().join("PCSX2");

    let result = launchbox::load(&config);
    assert!(matches!(result, Err(CoverSyncError::FileNotFound(_))));

    let catalogs = Catalogs::load(&config);
    assert!(catalogs.launchbox.games.is_empty());
    assert_eq!(catalogs.launchbox.image_folder, config.default_launchbox_image_folder());
    assert!(catalogs.pcsx2.games.is_empty());
    assert!(catalogs.pcsx2.titles.is_empty());
    assert_eq!(catalogs.pcsx2.covers_dir, config.default_pcsx2_covers());
}
