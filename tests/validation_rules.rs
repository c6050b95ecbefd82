#![warn(clippy::pedantic)]

use paramcad::{
    Catalog, ParameterSet, PieceSpec, Severity, ValidationEngine, ValidationResult, ValidationRule,
};

fn base_plate() -> PieceSpec {
    Catalog::builtin()
        .expect("embedded catalog loads")
        .piece("base_plate")
        .expect("base plate present")
        .clone()
}

fn check(assignments: &[&str]) -> ValidationResult {
    let piece = base_plate();
    let mut params = ParameterSet::defaults(&piece).expect("defaults coerce");
    for assignment in assignments {
        params
            .apply_assignment(&piece, assignment)
            .expect("assignment is valid");
    }
    ValidationEngine::new().check_piece(&piece, &params)
}

fn error_ids(result: &ValidationResult) -> Vec<&str> {
    result.errors().iter().map(|m| m.rule_id.as_str()).collect()
}

fn warning_ids(result: &ValidationResult) -> Vec<&str> {
    result.warnings().iter().map(|m| m.rule_id.as_str()).collect()
}

#[test]
fn defaults_pass_without_messages() {
    let result = check(&[]);
    assert!(result.is_valid());
    assert!(result.messages().is_empty());
}

#[test]
fn thin_plate_fails_minimum_thickness() {
    let result = check(&["espesor=2"]);
    assert!(!result.is_valid());
    assert!(error_ids(&result).contains(&"VR-BP-01"));
}

#[test]
fn small_edge_distance_fails() {
    // 20 mm < 1.5 x 18 mm
    let result = check(&["margen_perforacion=20"]);
    assert!(!result.is_valid());
    assert_eq!(error_ids(&result), vec!["VR-BP-04"]);
}

#[test]
fn short_plate_cannot_fit_holes() {
    // 60 mm < 2 x 30 mm + 18 mm
    let result = check(&["largo=60"]);
    assert!(!result.is_valid());
    assert!(error_ids(&result).contains(&"VR-BP-05"));
}

#[test]
fn six_hole_pattern_checks_half_spacing() {
    let result = check(&[
        "largo=200",
        "ancho=200",
        "diametro_perforacion=30",
        "margen_perforacion=45",
        "patron_perforaciones=rectangular_6",
    ]);
    assert_eq!(error_ids(&result), vec!["VR-BP-03"]);
}

#[test]
fn narrow_plate_needs_room_for_two_rows() {
    // 40 mm < 2 x 30 mm + 18 mm, and the rows would be -20 mm apart
    let corners = check(&["ancho=40"]);
    assert_eq!(error_ids(&corners), vec!["VR-BP-06", "VR-BP-10"]);
}

#[test]
fn corner_rows_need_spacing_across_the_width() {
    // rows 20 mm apart < 2.67 x 18 mm
    let result = check(&["ancho=80"]);
    assert!(!result.is_valid());
    assert_eq!(error_ids(&result), vec!["VR-BP-10"]);

    let six = check(&["ancho=80", "patron_perforaciones=rectangular_6"]);
    assert_eq!(error_ids(&six), vec!["VR-BP-10"]);
}

#[test]
fn centre_line_holes_need_edge_distance_across_the_width() {
    // 40 / 2 = 20 mm < 1.5 x 18 mm
    let narrow = check(&["ancho=40", "patron_perforaciones=lineal_2"]);
    assert!(!narrow.is_valid());
    assert_eq!(error_ids(&narrow), vec!["VR-BP-11"]);

    let wide_enough = check(&["ancho=60", "patron_perforaciones=lineal_2"]);
    assert!(wide_enough.is_valid());
}

#[test]
fn slender_plate_is_only_a_warning() {
    // 3000 / 200 = 15 > 10
    let result = check(&["largo=3000"]);
    assert!(result.is_valid());
    assert_eq!(warning_ids(&result), vec!["VR-BP-02"]);
    assert!(!error_ids(&result).contains(&"VR-BP-02"));
}

#[test]
fn strict_mode_promotes_warnings() {
    let result = check(&["largo=3000"]).promote_warnings();
    assert!(!result.is_valid());
    assert_eq!(error_ids(&result), vec!["VR-BP-02"]);
}

#[test]
fn long_slot_gives_warning() {
    let result = check(&["tiene_ranuras=true", "largo_ranura=250"]);
    assert!(result.is_valid());
    assert_eq!(warning_ids(&result), vec!["VR-BP-07"]);
}

#[test]
fn slot_rules_are_skipped_without_slots() {
    let result = check(&["tiene_ranuras=false", "largo_ranura=999"]);
    assert!(!warning_ids(&result).contains(&"VR-BP-07"));
    assert!(result.is_valid());
}

#[test]
fn thick_plate_must_be_drilled() {
    let result = check(&["espesor=20"]);
    assert!(result.is_valid());
    assert_eq!(warning_ids(&result), vec!["VR-BP-09"]);
}

#[test]
fn custom_pattern_falls_back_with_warning() {
    let result = check(&["patron_perforaciones=personalizado"]);
    assert!(result.is_valid());
    assert_eq!(warning_ids(&result), vec!["GEO-05"]);
}

#[test]
fn conflicting_slot_and_holes_fail_layout() {
    let result = check(&[
        "patron_perforaciones=rectangular_6",
        "tiene_ranuras=true",
        "ancho_ranura=30",
    ]);
    assert!(!result.is_valid());
    assert_eq!(error_ids(&result), vec!["GEO-03", "GEO-03"]);
}

#[test]
fn expression_error_becomes_error_message() {
    let piece = base_plate();
    let params = ParameterSet::defaults(&piece).expect("defaults coerce");
    let rules = [ValidationRule {
        rule_id: "VR-BAD".into(),
        description: String::new(),
        expression: "undefined_variable > 0".into(),
        severity: Severity::Warning,
        message: "Bad rule.".into(),
    }];
    let result = ValidationEngine::new().validate(&params, &rules);
    assert!(!result.is_valid());
    assert_eq!(error_ids(&result), vec!["VR-BAD"]);
    assert!(result.messages()[0].message.ends_with("] Bad rule."));
}

#[test]
fn empty_rules_always_pass() {
    let piece = base_plate();
    let params = ParameterSet::defaults(&piece).expect("defaults coerce");
    assert!(ValidationEngine::new().validate(&params, &[]).is_valid());
}
