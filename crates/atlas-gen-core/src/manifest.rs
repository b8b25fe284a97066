use crate::error::{AtlasGenError, Result};
use crate::host::BundleStore;
use crate::model::ImageHandle;
use crate::reconcile::normalize_path;
use crate::settings::{DefaultSettings, EffectiveSettings};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File suffix of a bundle manifest.
pub const MANIFEST_EXT: &str = ".atlas.json";

/// Current manifest schema version. Kept as a string so later revisions can
/// use dotted versions.
pub const SCHEMA_VERSION: &str = "1";

/// On-disk description of one atlas bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleManifest {
    pub schema_version: String,
    pub name: String,
    pub settings: EffectiveSettings,
    /// Members in handle order.
    #[serde(default)]
    pub members: Vec<ImageHandle>,
}

impl BundleManifest {
    pub fn new(name: impl Into<String>, defaults: &DefaultSettings) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.into(),
            name: name.into(),
            settings: EffectiveSettings::from_defaults(defaults),
            members: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Bundle id for an atlas name: the name with any manifest suffix removed,
/// in normalized path form.
///
/// The id must stay inside the output directory, so empty names, absolute
/// paths, drive prefixes and `..` segments are rejected.
pub fn bundle_id(atlas_name: &str) -> Result<String> {
    let name = atlas_name.replace('\\', "/");
    let name = name
        .strip_suffix(MANIFEST_EXT)
        .or_else(|| name.strip_suffix(".atlas"))
        .unwrap_or(name.as_str());
    let id = normalize_path(name);
    let escapes = name.starts_with('/')
        || id.contains(':')
        || id.split('/').any(|seg| seg == "..");
    if id.is_empty() || escapes {
        return Err(AtlasGenError::InvalidBundleName(atlas_name.to_string()));
    }
    Ok(id)
}

/// [`BundleStore`] keeping one JSON manifest per bundle in a directory.
///
/// Manifests are loaded lazily and only written by [`BundleStore::persist`].
#[derive(Debug)]
pub struct FsBundleStore {
    output_dir: PathBuf,
    open: BTreeMap<String, BundleManifest>,
}

impl FsBundleStore {
    /// Creates `output_dir` if missing. Fails if the path is a file.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::open(output_dir)?;
        fs::create_dir_all(&store.output_dir)?;
        Ok(store)
    }

    /// Like [`FsBundleStore::new`] but leaves the disk untouched; a missing
    /// `output_dir` reads as a store with no bundles.
    pub fn open(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        if output_dir.is_file() {
            return Err(AtlasGenError::OutputNotDirectory(output_dir));
        }
        Ok(Self {
            output_dir,
            open: BTreeMap::new(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn manifest_path(&self, id: &str) -> PathBuf {
        self.output_dir.join(format!("{id}{MANIFEST_EXT}"))
    }

    /// The in-memory manifest of an opened bundle.
    pub fn manifest(&self, id: &str) -> Option<&BundleManifest> {
        self.open.get(id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut BundleManifest> {
        self.open
            .get_mut(id)
            .ok_or_else(|| AtlasGenError::UnknownBundle(id.to_string()))
    }
}

impl BundleStore for FsBundleStore {
    type Id = String;

    fn open_or_create(&mut self, atlas_name: &str, defaults: &DefaultSettings) -> Result<String> {
        let id = bundle_id(atlas_name)?;
        if self.open.contains_key(&id) {
            return Ok(id);
        }
        let path = self.manifest_path(&id);
        let manifest = if path.is_file() {
            debug!(?path, "loading bundle");
            BundleManifest::from_json(&fs::read_to_string(&path)?)?
        } else {
            info!(?path, "creating bundle");
            BundleManifest::new(id.clone(), defaults)
        };
        self.open.insert(id.clone(), manifest);
        Ok(id)
    }

    fn members(&self, id: &String) -> Result<BTreeSet<ImageHandle>> {
        let manifest = self
            .open
            .get(id)
            .ok_or_else(|| AtlasGenError::UnknownBundle(id.clone()))?;
        Ok(manifest.members.iter().cloned().collect())
    }

    fn set_members(&mut self, id: &String, members: BTreeSet<ImageHandle>) -> Result<()> {
        self.get_mut(id)?.members = members.into_iter().collect();
        Ok(())
    }

    fn set_packing_params(&mut self, id: &String, settings: EffectiveSettings) -> Result<()> {
        self.get_mut(id)?.settings = settings;
        Ok(())
    }

    fn persist(&mut self, id: &String) -> Result<()> {
        let path = self.manifest_path(id);
        let json = self.get_mut(id)?.to_json()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, json)?;
        debug!(?path, "bundle written");
        Ok(())
    }
}
