use crate::host::AssetHost;
use crate::model::{Compression, ImageHandle, ImageInfo, ImportMode};
use crate::reconcile::normalize_path;
use image::{ImageFormat, ImageReader};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Extensions (lowercase) that count as raster images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tga"];

/// Returns true if `p` has one of [`IMAGE_EXTENSIONS`], ignoring case.
pub fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str())
    )
}

/// [`AssetHost`] over a project directory.
///
/// Rule paths are relative to `root`. Images are resolved by reading their
/// header only; every readable raster is treated as a single sprite.
#[derive(Debug, Clone)]
pub struct FsAssetHost {
    root: PathBuf,
}

impl FsAssetHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_dimensions(&self, path: &str) -> crate::error::Result<(u32, u32)> {
        let dims = ImageReader::open(self.root.join(path))?
            .with_guessed_format()?
            .into_dimensions()?;
        Ok(dims)
    }
}

fn compression_for(path: &str) -> Compression {
    match ImageFormat::from_path(path) {
        Ok(ImageFormat::Jpeg) => Compression::Lossy,
        Ok(ImageFormat::Png) => Compression::Lossless,
        _ => Compression::None,
    }
}

impl AssetHost for FsAssetHost {
    fn list_image_files(&self, folder: &str) -> Vec<String> {
        let folder = normalize_path(folder);
        let dir = self.root.join(&folder);
        if !dir.is_dir() {
            debug!(%folder, "not a folder");
            return Vec::new();
        }
        // an empty folder is the project root; its files are listed bare
        let mut list: Vec<String> = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_image(e.path()))
            .filter_map(|e| {
                let n = e.file_name().to_str()?;
                Some(if folder.is_empty() {
                    n.to_string()
                } else {
                    format!("{folder}/{n}")
                })
            })
            .collect();
        list.sort();
        list
    }

    fn resolve_image(&self, path: &str) -> Option<ImageInfo> {
        let path = normalize_path(path);
        if !is_image(Path::new(&path)) {
            return None;
        }
        match self.read_dimensions(&path) {
            Ok((width, height)) => Some(ImageInfo {
                handle: ImageHandle::from_path(&path),
                is_sprite: true,
                import_mode: ImportMode::Single,
                width,
                height,
                compression: compression_for(&path),
            }),
            Err(e) => {
                debug!(%path, error = %e, "unreadable image");
                None
            }
        }
    }
}
