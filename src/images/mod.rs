//! カバー画像の検索・縮小・配置

mod placement;

pub use placement::{install_cover, Installed};

use crate::error::{CoverSyncError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 対応する画像の拡張子（小文字）
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "jpe", "png", "webp"];

const JPEG_QUALITY: u8 = 95;

/// 配置の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// 縮小して保存（元の幅×高さ → 新しい幅×高さ）
    Resized { from: (u32, u32), to: (u32, u32) },
    /// そのままコピー
    Copied,
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// 画像ファイル名の検索キー（LaunchBoxがファイル名に使えない文字を `_` にしたもの）
pub fn image_search_key(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            ':' | '\'' | '\\' | '/' => '_',
            c => c,
        })
        .collect()
}

/// 画像フォルダ（サブフォルダを含む）からタイトルに一致する画像を探す
pub fn find_source_images(folders: &[PathBuf], title: &str) -> Vec<PathBuf> {
    let key = image_search_key(title);
    let mut images = Vec::new();

    for folder in folders {
        if !folder.exists() {
            log::debug!("画像フォルダがありません: {}", folder.display());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(folder)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|path| path.is_file() && is_supported_image(path))
            .filter(|path| {
                path.file_stem()
                    .is_some_and(|stem| stem.to_string_lossy().contains(&key))
            })
            .collect();
        found.sort();
        images.extend(found);
    }

    images
}

/// 配置先のファイル名（正式タイトル + 元画像の拡張子）
pub fn cover_file_name(title: &str, source: &Path) -> String {
    let stem = title.replace(':', " -");
    match source.extension() {
        Some(ext) => format!("{}.{}", stem, ext.to_string_lossy()),
        None => stem,
    }
}

/// 配置先と同じ名前（拡張子違いを含む）の既存カバー画像
///
/// PCSX2はゲームごとに1枚しか表示しないため、拡張子が違っても競合とみなす。
pub fn existing_covers(destination: &Path) -> Vec<PathBuf> {
    let (Some(dir), Some(stem)) = (destination.parent(), destination.file_stem()) else {
        return Vec::new();
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut covers: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .filter(|path| path.file_stem() == Some(stem))
        .collect();
    covers.sort();
    covers
}

/// 高さ `target_height` に収まる大きさ（縦横比を保つ、拡大はしない）
pub fn fit_to_height(width: u32, height: u32, target_height: u32) -> (u32, u32) {
    if target_height == 0 || height <= target_height {
        return (width, height);
    }
    let scale = target_height as f64 / height as f64;
    let new_width = ((width as f64) * scale).round().max(1.0) as u32;
    (new_width, target_height)
}

fn copy_file(source: &Path, destination: &Path) -> Result<Placement> {
    std::fs::copy(source, destination).map_err(|e| CoverSyncError::CopyFailed {
        source_path: source.display().to_string(),
        destination: destination.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(Placement::Copied)
}

fn save_image(image: &DynamicImage, destination: &Path) -> Result<()> {
    let ext = destination
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let format = ImageFormat::from_extension(&ext)
        .ok_or_else(|| CoverSyncError::ImageSave(format!("{}: 保存できない形式です", destination.display())))?;

    write_image(image, format, File::create(destination)?)
        .map_err(|e| CoverSyncError::ImageSave(format!("{}: {}", destination.display(), e)))
}

/// 画像をエンコードして書き出す（最後のフラッシュ失敗もエラーにする）
fn write_image(image: &DynamicImage, format: ImageFormat, file: File) -> image::ImageResult<()> {
    let mut writer = BufWriter::new(file);

    match format {
        ImageFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            encoder.encode_image(&DynamicImage::ImageRgb8(image.to_rgb8()))?;
        }
        ImageFormat::Png => {
            let encoder = PngEncoder::new_with_quality(&mut writer, CompressionType::Best, PngFilterType::Adaptive);
            image.write_with_encoder(encoder)?;
        }
        _ => image.write_to(&mut writer, format)?,
    }

    writer.flush()?;
    Ok(())
}

/// 画像を配置する
///
/// `target_height` が 0、対応外の形式、または既に目標以下の高さならそのままコピーする。
pub fn place_image(source: &Path, destination: &Path, target_height: u32) -> Result<Placement> {
    if target_height == 0 || !is_supported_image(source) {
        return copy_file(source, destination);
    }

    let image = image::open(source)
        .map_err(|e| CoverSyncError::ImageLoad(format!("{}: {}", source.display(), e)))?;
    let (width, height) = image.dimensions();

    if height <= target_height {
        log::debug!("高さが既に{}p以下: {}", target_height, source.display());
        return copy_file(source, destination);
    }

    let (new_width, new_height) = fit_to_height(width, height, target_height);
    let resized = image.resize_exact(new_width, new_height, FilterType::CatmullRom);
    save_image(&resized, destination)?;

    Ok(Placement::Resized {
        from: (width, height),
        to: (new_width, new_height),
    })
}

/// フォルダをファイルマネージャーで開く
pub fn open_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CoverSyncError::FolderNotFound(path.display().to_string()));
    }

    let program = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };

    std::process::Command::new(program).arg(path).spawn()?;
    Ok(())
}
