use crate::settings::EffectiveSettings;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Opaque, comparable reference to an image known to the host.
///
/// `path` (forward slashes) is the identity; `name` is the display name used
/// for ordering. Handles sort by name ignoring ASCII case, then by exact name,
/// then by path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageHandle {
    pub name: String,
    pub path: String,
}

impl Ord for ImageHandle {
    fn cmp(&self, other: &Self) -> Ordering {
        let folded = self.name.bytes().map(|b| b.to_ascii_lowercase());
        folded
            .cmp(other.name.bytes().map(|b| b.to_ascii_lowercase()))
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for ImageHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl ImageHandle {
    /// Handle for `path`, named after its file stem.
    pub fn from_path(path: &str) -> Self {
        let path = crate::reconcile::normalize_path(path);
        let file = path.rsplit('/').next().unwrap_or(&path);
        let name = match file.rfind('.') {
            Some(i) if i > 0 => &file[..i],
            _ => file,
        }
        .to_string();
        Self { name, path }
    }
}

/// How the host imports an image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// One sprite per image.
    Single,
    /// The image is already a sheet of several sprites.
    Multiple,
}

/// Source compression as reported by the host.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    Lossless,
    Lossy,
}

/// Attributes of a resolved image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageInfo {
    pub handle: ImageHandle,
    pub is_sprite: bool,
    pub import_mode: ImportMode,
    pub width: u32,
    pub height: u32,
    pub compression: Compression,
}

impl ImageInfo {
    /// Pixel area as `u64` so large dimensions cannot overflow.
    pub fn area(&self) -> u64 {
        (self.width as u64) * (self.height as u64)
    }
}

/// Result of reconciling one rule against a bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundlePlan {
    pub settings: EffectiveSettings,
    /// Full desired membership, deduplicated and in handle order.
    pub desired: Vec<ImageHandle>,
    pub to_add: Vec<ImageHandle>,
    pub to_remove: Vec<ImageHandle>,
    /// Candidates that did not resolve to an image or were not eligible.
    pub dropped: usize,
}

impl BundlePlan {
    /// True when applying the plan would not change membership.
    pub fn is_unchanged(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
