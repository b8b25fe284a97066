use crate::host::AssetHost;
use crate::model::{BundlePlan, ImageHandle, ImageInfo, ImportMode};
use crate::reader::RuleDocument;
use crate::settings::{DefaultSettings, EffectiveSettings};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Images larger than this many pixels (1280x1024) are never packed.
pub const MAX_SPRITE_AREA: u64 = 1280 * 1024;

/// Canonical path form used for identity comparison: forward slashes, no
/// empty or `.` segments. `..` is kept as written.
pub fn normalize_path(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Default eligibility: a single sprite no larger than [`MAX_SPRITE_AREA`].
pub fn is_packable(info: &ImageInfo) -> bool {
    info.is_sprite && info.import_mode == ImportMode::Single && info.area() <= MAX_SPRITE_AREA
}

/// Computes effective settings and the membership delta for one rule.
///
/// Notes:
/// - Folder entries are expanded first, then explicit files, as declared.
/// - Candidates that do not resolve or are not eligible are dropped silently
///   (counted in `dropped`).
/// - The desired set is deduplicated by handle and sorted by display name, so
///   the result does not depend on input or directory enumeration order.
/// - Calling again with `current` equal to the previous `desired` yields an
///   empty delta.
#[instrument(skip_all, fields(atlas = rule.atlas_name.as_deref().unwrap_or_default()))]
pub fn plan_update<H: AssetHost + ?Sized>(
    rule: &RuleDocument,
    defaults: &DefaultSettings,
    current: &BTreeSet<ImageHandle>,
    host: &H,
) -> BundlePlan {
    let settings = EffectiveSettings::merge(rule, defaults);

    let mut candidates: Vec<String> = Vec::new();
    for folder in rule.folders.iter().flatten() {
        candidates.extend(host.list_image_files(&normalize_path(folder)));
    }
    candidates.extend(rule.files.iter().flatten().cloned());

    let mut desired: BTreeSet<ImageHandle> = BTreeSet::new();
    let mut dropped = 0;
    for path in candidates {
        let path = normalize_path(&path);
        match host.resolve_image(&path) {
            Some(info) if host.is_eligible(&info) => {
                desired.insert(info.handle);
            }
            Some(info) => {
                debug!(%path, w = info.width, h = info.height, "image not eligible");
                dropped += 1;
            }
            None => {
                debug!(%path, "not an image");
                dropped += 1;
            }
        }
    }

    let to_remove: Vec<ImageHandle> = current.difference(&desired).cloned().collect();
    let to_add: Vec<ImageHandle> = desired.difference(current).cloned().collect();
    debug!(
        desired = desired.len(),
        add = to_add.len(),
        remove = to_remove.len(),
        dropped,
        "planned"
    );

    BundlePlan {
        settings,
        desired: desired.into_iter().collect(),
        to_add,
        to_remove,
        dropped,
    }
}
