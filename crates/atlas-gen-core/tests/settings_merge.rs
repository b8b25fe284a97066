use atlas_gen_core::prelude::*;
use atlas_gen_core::settings::{MAX_MAX_SIZE, MIN_MAX_SIZE, clamp_max_size};

fn custom_defaults() -> DefaultSettings {
    DefaultSettings {
        include_in_build: false,
        padding: 3,
        enable_rotation: true,
        enable_tight_packing: true,
        enable_alpha_dilation: false,
        max_size: 1024,
    }
}

#[test]
fn builtin_defaults() {
    let d = DefaultSettings::default();
    assert!(d.include_in_build);
    assert_eq!(d.padding, 8);
    assert!(!d.enable_rotation);
    assert!(!d.enable_tight_packing);
    assert!(d.enable_alpha_dilation);
    assert_eq!(d.max_size, 2048);
}

#[test]
fn unset_rule_takes_every_default() {
    let rule = parse(br#"{"AtlasName":"UI"}"#);
    let eff = EffectiveSettings::merge(&rule, &custom_defaults());
    assert_eq!(
        eff,
        EffectiveSettings {
            include_in_build: false,
            padding: 3,
            enable_rotation: true,
            enable_tight_packing: true,
            enable_alpha_dilation: false,
            max_size: 1024,
        }
    );
}

#[test]
fn rule_overrides_win() {
    let rule = parse(
        br#"{"AtlasName":"UI","IncludeInBuild":true,"Padding":0,"EnableRotation":false,
             "EnableTightPacking":false,"EnableAlphaDilation":true,"MaxSize":512}"#,
    );
    let eff = EffectiveSettings::merge(&rule, &custom_defaults());
    assert!(eff.include_in_build);
    assert_eq!(eff.padding, 0);
    assert!(!eff.enable_rotation);
    assert!(!eff.enable_tight_packing);
    assert!(eff.enable_alpha_dilation);
    assert_eq!(eff.max_size, 512);
}

#[test]
fn bad_field_falls_back_to_default() {
    let rule = parse(br#"{"AtlasName":"UI","Padding":"4"}"#);
    let defaults = DefaultSettings::default();
    let eff = EffectiveSettings::merge(&rule, &defaults);
    assert_eq!(eff.padding, defaults.padding);
}

#[test]
fn max_size_is_clamped() {
    assert_eq!(clamp_max_size(0), MIN_MAX_SIZE);
    assert_eq!(clamp_max_size(-5), MIN_MAX_SIZE);
    assert_eq!(clamp_max_size(300), 300);
    assert_eq!(clamp_max_size(16384), MAX_MAX_SIZE);

    let rule = parse(br#"{"AtlasName":"UI","MaxSize":8192}"#);
    let eff = EffectiveSettings::merge(&rule, &DefaultSettings::default());
    assert_eq!(eff.max_size, 4096);

    let defaults = DefaultSettings {
        max_size: 16,
        ..Default::default()
    };
    let eff = EffectiveSettings::from_defaults(&defaults);
    assert_eq!(eff.max_size, 256);
}

#[test]
fn patch_updates_only_given_fields() {
    let mut s = GeneratorSettings::default();
    s.apply(SettingsPatch {
        padding: Some(2),
        output_dir: Some("Out".into()),
        max_size: Some(100_000),
        ..Default::default()
    });
    assert_eq!(s.defaults.padding, 2);
    assert_eq!(s.defaults.max_size, 4096);
    assert_eq!(s.output_dir, std::path::PathBuf::from("Out"));
    assert_eq!(s.rules_dir, GeneratorSettings::default().rules_dir);
    assert!(s.defaults.include_in_build);
}

#[test]
fn empty_patch() {
    assert!(SettingsPatch::default().is_empty());
    let p = SettingsPatch {
        enable_rotation: Some(false),
        ..Default::default()
    };
    assert!(!p.is_empty());
}

#[test]
fn validate_rejects_empty_paths() {
    assert!(GeneratorSettings::default().validate().is_ok());

    let s = GeneratorSettings {
        output_dir: "".into(),
        ..Default::default()
    };
    assert!(matches!(
        s.validate(),
        Err(atlas_gen_core::AtlasGenError::InvalidSettings(msg)) if msg.contains("output_dir")
    ));

    let s = GeneratorSettings {
        rule_pattern: "  ".into(),
        ..Default::default()
    };
    assert!(s.validate().is_err());
}

#[test]
fn settings_fill_missing_fields_from_defaults() {
    let s: GeneratorSettings =
        serde_json::from_str(r#"{"output_dir":"Gen","defaults":{"padding":2}}"#).unwrap();
    assert_eq!(s.output_dir, std::path::PathBuf::from("Gen"));
    assert_eq!(s.rule_pattern, "*.json");
    assert_eq!(s.defaults.padding, 2);
    assert_eq!(s.defaults.max_size, 2048);
    assert!(s.defaults.enable_alpha_dilation);
}
