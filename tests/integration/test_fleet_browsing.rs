//! Failures by train model over the work-order table.

use crate::common::TestProject;
use clavero::fleet::normalize_model_choice;

#[test]
fn test_fleet_browsing() {
    let project = TestProject::new();
    let workbench = project.workbench();
    let fleet = workbench.fleet().expect("work orders are present");

    assert_eq!(fleet.len(), 6);
    assert_eq!(fleet.models(), vec!["A1", "B2"]);

    let model = normalize_model_choice("Modelo A1");
    let counts = fleet.code_counts(Some(&model));
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].code, "100.2.1");
    assert_eq!(counts[0].count, 2);

    let unmodelled = fleet.code_counts(None);
    assert_eq!(unmodelled[0].code, "200.1.1");
    assert_eq!(unmodelled[0].count, 2);
    assert_eq!(unmodelled[1].count, 1);

    let orders = fleet.work_orders("200.1.1", Some("B2"));
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].repair_description, "Limpieza");
    assert!(fleet.work_orders("100.2.1", Some("B2")).is_empty());
}
