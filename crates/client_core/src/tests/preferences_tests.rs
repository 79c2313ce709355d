use super::*;
use serde_json::json;

fn scratch() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join(FILE_NAME);
    (dir, path)
}

#[test]
fn defaults_serialize_to_camel_case_record() {
    let value = serde_json::to_value(Preferences::default()).expect("json");
    assert_eq!(
        value,
        json!({
            "viewMode": "list",
            "pageSize": 10,
            "sortBy": "dueDate",
            "sortOrder": "asc",
            "showCompleted": true,
            "showArchived": false
        })
    );
}

#[test]
fn missing_file_loads_defaults_without_writing() {
    let (_dir, path) = scratch();
    let store = PreferenceStore::load(&path);
    assert_eq!(store.preferences(), &Preferences::default());
    assert!(!path.exists());
}

#[test]
fn update_persists_across_fresh_load() {
    let (_dir, path) = scratch();
    let mut store = PreferenceStore::load(&path);
    store
        .update(|p| {
            p.view_mode = "grid".into();
            p.page_size = 25;
            p.show_completed = false;
        })
        .expect("save");

    let reloaded = PreferenceStore::load(&path);
    assert_eq!(reloaded.preferences(), store.preferences());
    assert_eq!(reloaded.preferences().page_size, 25);
}

#[test]
fn corrupt_file_falls_back_to_defaults() {
    let (_dir, path) = scratch();
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, "{ not json").expect("write");

    let store = PreferenceStore::load(&path);
    assert_eq!(store.preferences(), &Preferences::default());
}

#[test]
fn partial_record_is_merged_over_defaults() {
    let (_dir, path) = scratch();
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, r#"{"sortOrder":"desc","theme":"dark"}"#).expect("write");

    let store = PreferenceStore::load(&path);
    let prefs = store.preferences();
    assert!(prefs.is_descending());
    assert_eq!(prefs.page_size, 10);
    assert_eq!(prefs.sort_by, "dueDate");
    assert_eq!(prefs.extra.get("theme"), Some(&json!("dark")));
}

#[test]
fn wrong_typed_key_keeps_the_rest_of_the_record() {
    let (_dir, path) = scratch();
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(
        &path,
        r#"{"pageSize":"20","sortOrder":"desc","viewMode":"grid","theme":"dark"}"#,
    )
    .expect("write");

    let mut store = PreferenceStore::load(&path);
    let prefs = store.preferences();
    assert_eq!(prefs.page_size, 10);
    assert!(prefs.is_descending());
    assert_eq!(prefs.view_mode, "grid");
    assert_eq!(prefs.extra.get("theme"), Some(&json!("dark")));

    store.update(|p| p.show_archived = true).expect("save");
    let raw: Value = serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(raw["sortOrder"], json!("desc"));
    assert_eq!(raw["viewMode"], json!("grid"));
    assert_eq!(raw["theme"], json!("dark"));
    assert_eq!(raw["showArchived"], json!(true));
}

#[test]
fn non_object_record_falls_back_to_defaults() {
    let (_dir, path) = scratch();
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, "[1, 2, 3]").expect("write");

    assert_eq!(PreferenceStore::load(&path).preferences(), &Preferences::default());
}

#[test]
fn unknown_keys_survive_a_save() {
    let (_dir, path) = scratch();
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, r#"{"theme":"dark","pageSize":5}"#).expect("write");

    let mut store = PreferenceStore::load(&path);
    store.update(|p| p.show_archived = true).expect("save");

    let raw: Value = serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(raw["theme"], json!("dark"));
    assert_eq!(raw["pageSize"], json!(5));
    assert_eq!(raw["showArchived"], json!(true));
}

#[test]
fn set_field_parses_json_or_falls_back_to_string() {
    let mut prefs = Preferences::default();
    prefs.set_field("pageSize", "50").expect("number");
    prefs.set_field("showCompleted", "false").expect("bool");
    prefs.set_field("viewMode", "grid").expect("string");

    assert_eq!(prefs.page_size, 50);
    assert!(!prefs.show_completed);
    assert_eq!(prefs.get("viewMode"), Some(json!("grid")));
    assert!(prefs.set_field("pageSize", "lots").is_err());
    assert_eq!(prefs.page_size, 50);
}

#[test]
fn reset_restores_and_saves_defaults() {
    let (_dir, path) = scratch();
    let mut store = PreferenceStore::load(&path);
    store.set("sortBy", "priority").expect("set");
    store.reset().expect("reset");

    assert_eq!(PreferenceStore::load(&path).preferences(), &Preferences::default());
}
