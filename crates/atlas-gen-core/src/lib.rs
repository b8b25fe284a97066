//! Core library for rule-driven sprite atlas generation.
//!
//! - Reader: `reader::parse` turns a JSON pack rule into a `RuleDocument`, tolerating non-JSON
//!   files and collecting per-field diagnostics instead of failing
//! - Reconciler: `plan_update` merges rule overrides with `DefaultSettings` and computes the
//!   add/remove delta between a bundle's current and desired membership
//! - Hosts: `AssetHost` / `BundleStore` abstract image lookup and bundle storage; filesystem
//!   implementations are provided (`FsAssetHost`, `FsBundleStore`)
//! - `Generator` runs a batch of rule files end to end, isolating per-document failures.
//!
//! Quick example:
//! ```ignore
//! use atlas_gen_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let settings = GeneratorSettings::default();
//! let host = FsAssetHost::new(".");
//! let mut store = FsBundleStore::new(&settings.output_dir)?;
//! let report = Generator::new(&settings, &host, &mut store)
//!     .run(&["Assets/Art/SpriteAtlas/PackRules/ui.json"], |_, _, _| {});
//! println!("{}", report.summary());
//! # Ok(()) }
//! ```

pub mod error;
pub mod fs_host;
pub mod generator;
pub mod host;
pub mod manifest;
pub mod model;
pub mod reader;
pub mod reconcile;
pub mod settings;

pub use error::*;
pub use fs_host::*;
pub use generator::*;
pub use host::*;
pub use manifest::*;
pub use model::*;
pub use reader::{RuleDocument, looks_like_json, parse, read_rule_file};
pub use reconcile::*;
pub use settings::*;

/// Convenience prelude for common types and functions.
/// Importing `atlas_gen_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::fs_host::FsAssetHost;
    pub use crate::generator::{GenerateReport, Generator, Outcome};
    pub use crate::host::{AssetHost, BundleStore};
    pub use crate::manifest::{BundleManifest, FsBundleStore};
    pub use crate::model::{BundlePlan, Compression, ImageHandle, ImageInfo, ImportMode};
    pub use crate::reader::{RuleDocument, parse, read_rule_file};
    pub use crate::reconcile::plan_update;
    pub use crate::settings::{DefaultSettings, EffectiveSettings, GeneratorSettings, SettingsPatch};
}
