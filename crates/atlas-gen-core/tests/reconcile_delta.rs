use atlas_gen_core::prelude::*;
use atlas_gen_core::reconcile::{MAX_SPRITE_AREA, is_packable, normalize_path};
use std::collections::{BTreeMap, BTreeSet};

/// In-memory host: known images by path and folder listings.
#[derive(Default)]
struct MapHost {
    images: BTreeMap<String, ImageInfo>,
    folders: BTreeMap<String, Vec<String>>,
}

impl MapHost {
    fn image(mut self, path: &str, w: u32, h: u32) -> Self {
        self.images.insert(path.to_string(), info(path, w, h));
        self
    }
    fn sheet(mut self, path: &str) -> Self {
        let mut i = info(path, 64, 64);
        i.import_mode = ImportMode::Multiple;
        self.images.insert(path.to_string(), i);
        self
    }
    fn texture(mut self, path: &str) -> Self {
        let mut i = info(path, 64, 64);
        i.is_sprite = false;
        self.images.insert(path.to_string(), i);
        self
    }
    fn folder(mut self, folder: &str, files: &[&str]) -> Self {
        self.folders
            .insert(folder.to_string(), files.iter().map(|s| s.to_string()).collect());
        self
    }
}

impl AssetHost for MapHost {
    fn list_image_files(&self, folder: &str) -> Vec<String> {
        self.folders.get(folder).cloned().unwrap_or_default()
    }
    fn resolve_image(&self, path: &str) -> Option<ImageInfo> {
        self.images.get(path).cloned()
    }
}

fn info(path: &str, w: u32, h: u32) -> ImageInfo {
    ImageInfo {
        handle: ImageHandle::from_path(path),
        is_sprite: true,
        import_mode: ImportMode::Single,
        width: w,
        height: h,
        compression: Compression::Lossless,
    }
}

fn h(path: &str) -> ImageHandle {
    ImageHandle::from_path(path)
}

fn paths(handles: &[ImageHandle]) -> Vec<&str> {
    handles.iter().map(|h| h.path.as_str()).collect()
}

#[test]
fn handle_from_path() {
    let a = h("Assets\\UI\\button.big.png");
    assert_eq!(a.path, "Assets/UI/button.big.png");
    assert_eq!(a.name, "button.big");
    assert_eq!(h(".hidden").name, ".hidden");
    assert_eq!(normalize_path("a\\b/c"), "a/b/c");
    assert_eq!(normalize_path("./Assets//UI/./b.png"), "Assets/UI/b.png");
    assert_eq!(normalize_path("."), "");
    assert_eq!(normalize_path("Icons/"), "Icons");
    assert_eq!(normalize_path("../shared/a.png"), "../shared/a.png");
}

#[test]
fn delta_matches_set_difference() {
    let host = MapHost::default()
        .image("X.png", 8, 8)
        .image("Y.png", 8, 8)
        .image("Z.png", 8, 8);
    let rule = parse(br#"{"AtlasName":"A","Files":["Y.png","Z.png"]}"#);
    let current: BTreeSet<_> = [h("X.png"), h("Y.png")].into_iter().collect();
    let plan = plan_update(&rule, &DefaultSettings::default(), &current, &host);
    assert_eq!(paths(&plan.to_remove), vec!["X.png"]);
    assert_eq!(paths(&plan.to_add), vec!["Z.png"]);
    assert_eq!(paths(&plan.desired), vec!["Y.png", "Z.png"]);
    assert!(!plan.is_unchanged());
}

#[test]
fn duplicate_file_added_once() {
    let host = MapHost::default().image("a.png", 16, 16);
    let rule = parse(br#"{"AtlasName":"UI","Files":["a.png","a.png"],"Padding":"4"}"#);
    let defaults = DefaultSettings::default();
    let plan = plan_update(&rule, &defaults, &BTreeSet::new(), &host);
    assert_eq!(plan.to_add, vec![h("a.png")]);
    assert_eq!(plan.settings.padding, defaults.padding);
    assert_eq!(rule.errors, vec!["Padding is not a valid int value.".to_string()]);
}

#[test]
fn file_and_folder_overlap_is_deduplicated() {
    let host = MapHost::default()
        .image("Icons/a.png", 16, 16)
        .image("Icons/b.png", 16, 16)
        .folder("Icons", &["Icons/a.png", "Icons/b.png"]);
    let rule = parse(br#"{"AtlasName":"UI","Folders":["Icons"],"Files":["Icons\\a.png"]}"#);
    let plan = plan_update(&rule, &DefaultSettings::default(), &BTreeSet::new(), &host);
    assert_eq!(paths(&plan.desired), vec!["Icons/a.png", "Icons/b.png"]);
    assert_eq!(plan.dropped, 0);
}

#[test]
fn output_sorted_by_display_name() {
    let host = MapHost::default()
        .image("z/apple.png", 4, 4)
        .image("a/zebra.png", 4, 4)
        .image("m/Mango.png", 4, 4);
    let rule = parse(br#"{"AtlasName":"F","Files":["a/zebra.png","z/apple.png","m/Mango.png"]}"#);
    let plan = plan_update(&rule, &DefaultSettings::default(), &BTreeSet::new(), &host);
    let names: Vec<&str> = plan.desired.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["apple", "Mango", "zebra"]);
}

#[test]
fn case_only_differences_sort_deterministically() {
    let mut handles = vec![h("b/icon.png"), h("a/Icon.png"), h("a/icon.png")];
    handles.sort();
    assert_eq!(paths(&handles), vec!["a/Icon.png", "a/icon.png", "b/icon.png"]);
}

#[test]
fn dot_and_empty_segments_name_the_same_image() {
    let host = MapHost::default()
        .image("a.png", 4, 4)
        .image("UI/b.png", 4, 4)
        .folder("", &["a.png"]);
    let rule = parse(br#"{"AtlasName":"A","Folders":["."],"Files":["./a.png","UI//./b.png","a.png"]}"#);
    let plan = plan_update(&rule, &DefaultSettings::default(), &BTreeSet::new(), &host);
    assert_eq!(paths(&plan.desired), vec!["a.png", "UI/b.png"]);
    assert_eq!(plan.dropped, 0);
}

#[test]
fn oversized_images_never_added() {
    let host = MapHost::default()
        .image("ok.png", 1280, 1024)
        .image("big.png", 1281, 1024)
        .image("tall.png", 1, 1_310_721);
    let rule = parse(br#"{"AtlasName":"A","Files":["ok.png","big.png","tall.png"]}"#);
    let plan = plan_update(&rule, &DefaultSettings::default(), &BTreeSet::new(), &host);
    assert_eq!(paths(&plan.to_add), vec!["ok.png"]);
    assert_eq!(plan.dropped, 2);
}

#[test]
fn non_sprites_sheets_and_unknown_paths_dropped() {
    let host = MapHost::default()
        .image("sprite.png", 32, 32)
        .sheet("sheet.png")
        .texture("tex.png");
    let rule = parse(
        br#"{"AtlasName":"A","Files":["sprite.png","sheet.png","tex.png","missing.png"],
             "Folders":["NoSuchFolder"]}"#,
    );
    let plan = plan_update(&rule, &DefaultSettings::default(), &BTreeSet::new(), &host);
    assert_eq!(paths(&plan.desired), vec!["sprite.png"]);
    assert_eq!(plan.dropped, 3);
}

#[test]
fn default_eligibility() {
    let mut i = info("a.png", 1280, 1024);
    assert_eq!(i.area(), MAX_SPRITE_AREA);
    assert!(is_packable(&i));
    i.height += 1;
    assert!(!is_packable(&i));
    let mut i = info("a.png", 1, 1);
    i.import_mode = ImportMode::Multiple;
    assert!(!is_packable(&i));
}

#[test]
fn custom_eligibility_is_respected() {
    struct NoJpeg(MapHost);
    impl AssetHost for NoJpeg {
        fn list_image_files(&self, folder: &str) -> Vec<String> {
            self.0.list_image_files(folder)
        }
        fn resolve_image(&self, path: &str) -> Option<ImageInfo> {
            self.0.resolve_image(path)
        }
        fn is_eligible(&self, info: &ImageInfo) -> bool {
            !info.handle.path.ends_with(".jpg")
        }
    }
    let host = NoJpeg(MapHost::default().image("a.png", 4, 4).image("b.jpg", 4, 4));
    let rule = parse(br#"{"AtlasName":"A","Files":["a.png","b.jpg"]}"#);
    let plan = plan_update(&rule, &DefaultSettings::default(), &BTreeSet::new(), &host);
    assert_eq!(paths(&plan.desired), vec!["a.png"]);
}

#[test]
fn second_pass_is_idempotent() {
    let host = MapHost::default()
        .image("Icons/a.png", 16, 16)
        .image("Icons/b.png", 16, 16)
        .image("c.png", 16, 16)
        .folder("Icons", &["Icons/b.png", "Icons/a.png"]);
    let rule = parse(br#"{"AtlasName":"UI","Folders":["Icons"],"Files":["c.png"]}"#);
    let defaults = DefaultSettings::default();
    let stale: BTreeSet<_> = [h("old.png"), h("c.png")].into_iter().collect();

    let first = plan_update(&rule, &defaults, &stale, &host);
    assert_eq!(paths(&first.to_remove), vec!["old.png"]);
    assert_eq!(first.to_add.len(), 2);

    let current: BTreeSet<_> = first.desired.iter().cloned().collect();
    let second = plan_update(&rule, &defaults, &current, &host);
    assert!(second.is_unchanged());
    assert_eq!(second.desired, first.desired);
}

#[test]
fn empty_rule_clears_bundle() {
    let host = MapHost::default();
    let rule = parse(br#"{"AtlasName":"UI"}"#);
    let current: BTreeSet<_> = [h("a.png")].into_iter().collect();
    let plan = plan_update(&rule, &DefaultSettings::default(), &current, &host);
    assert!(plan.desired.is_empty());
    assert_eq!(paths(&plan.to_remove), vec!["a.png"]);
}
