//! Settings files written by `init` and read back.

use crate::common::TestProject;
use clavero::Settings;

#[test]
fn test_init_then_load_from() {
    let project = TestProject::empty();
    let path = Settings::init_config_file_in(project.path(), false).unwrap();
    assert!(path.ends_with(".clavero/settings.toml"));

    // A second init without force refuses to overwrite
    assert!(Settings::init_config_file_in(project.path(), false).is_err());
    assert!(Settings::init_config_file_in(project.path(), true).is_ok());

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.search.top_k, 10);
    assert_eq!(settings.taxonomy.other_label, "Other");
}

#[test]
fn test_saved_settings_round_trip_through_load_from() {
    let project = TestProject::empty();
    let mut settings = Settings::default();
    settings.search.top_k = 25;
    settings.search.model = "MultilingualE5Small".to_string();
    settings.dictionary.code_columns = vec!["Codigo".to_string()];

    let path = project.path().join("custom.toml");
    settings.save(&path).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded.search.top_k, 25);
    assert_eq!(loaded.search.model, "MultilingualE5Small");
    assert_eq!(loaded.dictionary.code_columns, vec!["Codigo"]);
}

#[test]
fn test_relative_data_paths_resolve_against_workspace() {
    let project = TestProject::new();
    let settings = project.settings();
    let resolved = settings.resolve_path(&settings.data.corpus_path);
    assert!(resolved.starts_with(project.path()));
    assert!(resolved.exists());
}
