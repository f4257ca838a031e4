//! Manual selection through the taxonomy, action options and final keys.

use crate::common::TestProject;
use clavero::session::SessionId;
use clavero::types::{Level, NO_ACTION_REGISTERED, TaxonomyPath};

#[test]
fn test_level_options() {
    let project = TestProject::new();
    let workbench = project.workbench();

    let systems = workbench.taxonomy_options(None, None);
    assert_eq!(systems.level, Level::System);
    assert_eq!(systems.choices, vec!["Brakes", "Doors", "HVAC", "Lighting"]);

    let subsystems = workbench.taxonomy_options(Some("Brakes"), None);
    assert_eq!(subsystems.level, Level::Subsystem);
    assert_eq!(subsystems.choices, vec!["Caliper", "Other"]);

    let components = workbench.taxonomy_options(Some(" Brakes "), Some("Caliper"));
    assert_eq!(components.choices, vec!["Pad", "Piston"]);

    let other = workbench.taxonomy_options(Some("Brakes"), Some("Other"));
    assert_eq!(other.choices, vec!["Sensor"]);

    assert!(workbench.taxonomy_options(Some("Wheels"), None).choices.is_empty());
}

#[test]
fn test_resolve_each_level() {
    let project = TestProject::new();
    let workbench = project.workbench();

    let system = workbench.resolve_taxonomy(&TaxonomyPath::system("Doors")).unwrap();
    assert_eq!(system.code, "200");
    assert_eq!(system.level, Level::System);

    let subsystem = workbench
        .resolve_taxonomy(&TaxonomyPath::system("Doors").with_subsystem("Leaf"))
        .unwrap();
    assert_eq!(subsystem.code, "200.1");

    let path = TaxonomyPath::system("Brakes")
        .with_subsystem("Caliper")
        .with_component("Piston ");
    let component = workbench.resolve_taxonomy(&path).unwrap();
    assert_eq!(component.code, "100.2.1");
    assert_eq!(component.label, "Piston");
    assert_eq!(component.path, vec!["Brakes", "Caliper", "Piston"]);
}

#[test]
fn test_other_bucket_resolution() {
    let project = TestProject::new();
    let workbench = project.workbench();

    let sensor = TaxonomyPath::system("Brakes")
        .with_subsystem("Other")
        .with_component("Sensor");
    assert_eq!(workbench.resolve_taxonomy(&sensor).unwrap().code, "100.3.9");

    let bucket = TaxonomyPath::system("Brakes").with_subsystem("Other");
    assert!(workbench.resolve_taxonomy(&bucket).is_none());

    // Sensor has a real parent nowhere, so it is not under Caliper
    let wrong = TaxonomyPath::system("Brakes")
        .with_subsystem("Caliper")
        .with_component("Sensor");
    assert!(workbench.resolve_taxonomy(&wrong).is_none());
}

#[test]
fn test_resolution_is_idempotent() {
    let project = TestProject::new();
    let workbench = project.workbench();
    let path = TaxonomyPath::from_parts("HVAC", Some("Blower"), Some("Fan"));

    let first = workbench.resolve_taxonomy(&path);
    let second = workbench.resolve_taxonomy(&path);
    assert_eq!(first, second);
    assert_eq!(first.unwrap().code, "300.1.1");
}

#[test]
fn test_select_key_composes_final_code() {
    let project = TestProject::new();
    let workbench = project.workbench();
    let path = TaxonomyPath::from_parts("Brakes", Some("Caliper"), Some("Piston"));

    let selection = workbench.select_key(&path, Some("X3")).unwrap();
    let offered: Vec<&str> = selection
        .actions
        .iter()
        .map(|a| a.action_code.as_str())
        .collect();
    assert_eq!(offered, vec!["X1", "X3"]);
    assert_eq!(selection.final_code.as_deref(), Some("100.2.1X3"));

    // Registered without a description, so never offered
    let selection = workbench.select_key(&path, Some("X4")).unwrap();
    assert!(selection.action.is_none());
    assert!(selection.final_code.is_none());

    let selection = workbench.select_key(&path, None).unwrap();
    assert!(selection.final_code.is_none());
}

#[test]
fn test_definitions_through_both_code_columns() {
    let project = TestProject::new();
    let workbench = project.workbench();

    assert_eq!(workbench.resolve_definition("X1"), "Replace pad");
    assert_eq!(workbench.resolve_definition("T9"), "Inspect seal");
    assert_eq!(workbench.resolve_definition("X4"), NO_ACTION_REGISTERED);
    assert_eq!(workbench.resolve_definition("nope"), NO_ACTION_REGISTERED);
}

#[test]
fn test_session_keeps_only_final_selection() {
    let project = TestProject::new();
    let workbench = project.workbench();
    let alice = SessionId::new("alice");
    let bob = SessionId::new("bob");

    let piston = TaxonomyPath::from_parts("Brakes", Some("Caliper"), Some("Piston"));
    let lock = TaxonomyPath::from_parts("Doors", Some("Leaf"), Some("Lock"));
    workbench
        .select_for_session(alice.clone(), &piston, Some("X1"))
        .unwrap();
    workbench.select_for_session(bob.clone(), &lock, None).unwrap();

    let stored = workbench.sessions().get(&alice).unwrap();
    assert_eq!(stored.base_code, "100.2.1");
    assert_eq!(stored.final_code.as_deref(), Some("100.2.1X1"));
    assert_eq!(stored.path, piston);

    let stored = workbench.sessions().get(&bob).unwrap();
    assert_eq!(stored.base_code, "200.1.1");
    assert!(stored.final_code.is_none());

    // An unresolvable path leaves the session untouched
    let bucket = TaxonomyPath::system("Brakes").with_subsystem("Other");
    assert!(workbench.select_for_session(bob.clone(), &bucket, None).is_none());
    assert_eq!(workbench.sessions().get(&bob).unwrap().base_code, "200.1.1");
}
