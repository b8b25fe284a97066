//! Seams to the environment that owns images and bundles.

use crate::error::Result;
use crate::model::{ImageHandle, ImageInfo};
use crate::reconcile::is_packable;
use crate::settings::{DefaultSettings, EffectiveSettings};
use std::collections::BTreeSet;

/// Image lookup used while computing a bundle's desired membership.
pub trait AssetHost {
    /// Image files directly inside `folder` (`.png .jpg .jpeg .bmp .tga`,
    /// any case). Unknown folders list nothing.
    fn list_image_files(&self, folder: &str) -> Vec<String>;

    /// Resolve `path` to an image, or `None` if it is not one.
    fn resolve_image(&self, path: &str) -> Option<ImageInfo>;

    /// Whether a resolved image may be added to a bundle.
    fn is_eligible(&self, info: &ImageInfo) -> bool {
        is_packable(info)
    }
}

/// Host-side bundle storage. Bundles are addressed by the id returned from
/// [`BundleStore::open_or_create`].
pub trait BundleStore {
    type Id;

    /// Open the bundle for `atlas_name`, creating it from `defaults` if needed.
    fn open_or_create(
        &mut self,
        atlas_name: &str,
        defaults: &DefaultSettings,
    ) -> Result<Self::Id>;

    fn members(&self, id: &Self::Id) -> Result<BTreeSet<ImageHandle>>;

    fn set_members(&mut self, id: &Self::Id, members: BTreeSet<ImageHandle>) -> Result<()>;

    fn set_packing_params(&mut self, id: &Self::Id, settings: EffectiveSettings) -> Result<()>;

    /// Flush the bundle to durable storage.
    fn persist(&mut self, id: &Self::Id) -> Result<()>;
}
