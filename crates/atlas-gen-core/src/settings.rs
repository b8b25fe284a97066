use crate::reader::RuleDocument;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Smallest atlas page size a bundle may request.
pub const MIN_MAX_SIZE: i32 = 256;
/// Largest atlas page size a bundle may request.
pub const MAX_MAX_SIZE: i32 = 4096;
/// Page size used when neither the rule nor the defaults say otherwise.
pub const DEFAULT_MAX_SIZE: i32 = 2048;

/// Clamp a requested page size into `MIN_MAX_SIZE..=MAX_MAX_SIZE`.
pub fn clamp_max_size(v: i32) -> i32 {
    v.clamp(MIN_MAX_SIZE, MAX_MAX_SIZE)
}

/// Fallback packing parameters for rules that leave a field unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefaultSettings {
    /// If false, the atlas is not included in builds.
    #[serde(default = "default_true")]
    pub include_in_build: bool,
    /// Pixels between packed sprites.
    #[serde(default = "default_padding")]
    pub padding: i32,
    /// Allow 90° rotations while packing.
    #[serde(default)]
    pub enable_rotation: bool,
    /// Pack by sprite outline instead of bounding rect.
    #[serde(default)]
    pub enable_tight_packing: bool,
    /// Bleed edge colors into transparent padding.
    #[serde(default = "default_true")]
    pub enable_alpha_dilation: bool,
    /// Maximum page size in pixels.
    #[serde(default = "default_max_size")]
    pub max_size: i32,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            include_in_build: default_true(),
            padding: default_padding(),
            enable_rotation: false,
            enable_tight_packing: false,
            enable_alpha_dilation: default_true(),
            max_size: default_max_size(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_padding() -> i32 {
    8
}
fn default_max_size() -> i32 {
    DEFAULT_MAX_SIZE
}

/// Packing parameters after merging a rule's overrides with the defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectiveSettings {
    pub include_in_build: bool,
    pub padding: i32,
    pub enable_rotation: bool,
    pub enable_tight_packing: bool,
    pub enable_alpha_dilation: bool,
    pub max_size: i32,
}

impl EffectiveSettings {
    /// Rule value where present, default otherwise. `max_size` is clamped.
    pub fn merge(rule: &RuleDocument, defaults: &DefaultSettings) -> Self {
        Self {
            include_in_build: rule.include_in_build.unwrap_or(defaults.include_in_build),
            padding: rule.padding.unwrap_or(defaults.padding),
            enable_rotation: rule.enable_rotation.unwrap_or(defaults.enable_rotation),
            enable_tight_packing: rule
                .enable_tight_packing
                .unwrap_or(defaults.enable_tight_packing),
            enable_alpha_dilation: rule
                .enable_alpha_dilation
                .unwrap_or(defaults.enable_alpha_dilation),
            max_size: clamp_max_size(rule.max_size.unwrap_or(defaults.max_size)),
        }
    }

    /// Settings a freshly created bundle starts with.
    pub fn from_defaults(defaults: &DefaultSettings) -> Self {
        Self::merge(&RuleDocument::default(), defaults)
    }
}

/// Process-wide generator configuration.
///
/// Loaded once at startup and passed by reference; changed only through
/// [`GeneratorSettings::apply`] and saved explicitly by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratorSettings {
    /// Directory searched (recursively) for rule documents.
    #[serde(default = "default_rules_dir")]
    pub rules_dir: PathBuf,
    /// Directory bundles are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// File-name glob a rule document must match.
    #[serde(default = "default_rule_pattern")]
    pub rule_pattern: String,
    #[serde(default)]
    pub defaults: DefaultSettings,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            rules_dir: default_rules_dir(),
            output_dir: default_output_dir(),
            rule_pattern: default_rule_pattern(),
            defaults: DefaultSettings::default(),
        }
    }
}

fn default_rules_dir() -> PathBuf {
    PathBuf::from("Assets/Art/SpriteAtlas/PackRules")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("Assets/Art/SpriteAtlas/Generated")
}
fn default_rule_pattern() -> String {
    "*.json".into()
}

impl GeneratorSettings {
    /// Validates the settings.
    ///
    /// Returns an error if the output directory or the rule pattern is empty.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AtlasGenError;

        if self.output_dir.as_os_str().is_empty() {
            return Err(AtlasGenError::InvalidSettings(
                "output_dir must not be empty".into(),
            ));
        }
        if self.rule_pattern.trim().is_empty() {
            return Err(AtlasGenError::InvalidSettings(
                "rule_pattern must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Overwrite every field the patch sets; leave the rest untouched.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.rules_dir {
            self.rules_dir = v;
        }
        if let Some(v) = patch.output_dir {
            self.output_dir = v;
        }
        if let Some(v) = patch.rule_pattern {
            self.rule_pattern = v;
        }
        if let Some(v) = patch.include_in_build {
            self.defaults.include_in_build = v;
        }
        if let Some(v) = patch.padding {
            self.defaults.padding = v;
        }
        if let Some(v) = patch.enable_rotation {
            self.defaults.enable_rotation = v;
        }
        if let Some(v) = patch.enable_tight_packing {
            self.defaults.enable_tight_packing = v;
        }
        if let Some(v) = patch.enable_alpha_dilation {
            self.defaults.enable_alpha_dilation = v;
        }
        if let Some(v) = patch.max_size {
            self.defaults.max_size = clamp_max_size(v);
        }
    }
}

/// Partial update for [`GeneratorSettings`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsPatch {
    pub rules_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub rule_pattern: Option<String>,
    pub include_in_build: Option<bool>,
    pub padding: Option<i32>,
    pub enable_rotation: Option<bool>,
    pub enable_tight_packing: Option<bool>,
    pub enable_alpha_dilation: Option<bool>,
    pub max_size: Option<i32>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
