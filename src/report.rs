//! Plain text rendering of pieces, validation results and layouts.

use std::fmt::Write;

use uom::si::area::square_millimeter;
use uom::si::mass::kilogram;

use crate::catalog::{ParameterKind, PieceSpec};
use crate::layout::PlateLayout;
use crate::validation::{Severity, ValidationResult};

/// Render validation feedback the way it is shown next to the parameter form.
///
/// Errors are marked with `✗` and warnings with `⚠`. A result with no
/// messages renders a single all-clear line.
#[must_use]
pub fn render_validation(piece: &PieceSpec, result: &ValidationResult) -> String {
    let mut output = String::new();

    let verdict = if result.is_valid() { "valid" } else { "invalid" };
    writeln!(
        &mut output,
        "{} ({}): {verdict}",
        piece.display_name, piece.code
    )
    .expect("writing to string cannot fail");

    if result.messages().is_empty() {
        output.push_str("✓ All parameters are valid.\n");
        return output;
    }

    for message in result.messages() {
        let marker = match message.severity {
            Severity::Error => '✗',
            Severity::Warning => '⚠',
        };
        writeln!(
            &mut output,
            "{marker} [{}] {}",
            message.rule_id, message.message
        )
        .expect("writing to string cannot fail");
    }

    writeln!(
        &mut output,
        "{} error(s), {} warning(s)",
        result.errors().len(),
        result.warnings().len()
    )
    .expect("writing to string cannot fail");

    output
}

/// Render hole centres, slot boxes and the resulting mass of a plate.
///
/// Net area and mass are left out when the layout has conflicting features.
#[must_use]
pub fn render_layout(layout: &PlateLayout) -> String {
    let mut output = String::new();

    writeln!(
        &mut output,
        "Plate {:.1} x {:.1} x {:.1} mm, pattern {}",
        layout.length,
        layout.width,
        layout.thickness,
        layout.pattern.code()
    )
    .expect("writing to string cannot fail");

    if layout.holes.is_empty() {
        output.push_str("Holes: none\n");
    }
    for (idx, hole) in layout.holes.iter().enumerate() {
        writeln!(
            &mut output,
            "Hole {}: centre ({:.1}, {:.1}) mm, diameter {:.1} mm",
            idx + 1,
            hole.center.x,
            hole.center.y,
            hole.diameter
        )
        .expect("writing to string cannot fail");
    }

    for (idx, slot) in layout.slots.iter().enumerate() {
        writeln!(
            &mut output,
            "Slot {}: x {:.1}..{:.1} mm, y {:.1}..{:.1} mm",
            idx + 1,
            slot.min.x,
            slot.max.x,
            slot.min.y,
            slot.max.y
        )
        .expect("writing to string cannot fail");
    }

    if layout.has_conflicts() {
        output.push_str("Net area and mass: not computed (layout has conflicts)\n");
        return output;
    }

    writeln!(
        &mut output,
        "Net area: {:.0} mm²",
        layout.net_area().get::<square_millimeter>()
    )
    .expect("writing to string cannot fail");

    match (layout.material, layout.net_mass()) {
        (Some(material), Some(mass)) => writeln!(
            &mut output,
            "Net mass: {:.2} kg ({})",
            mass.get::<kilogram>(),
            material.label()
        )
        .expect("writing to string cannot fail"),
        _ => output.push_str("Net mass: not available (unknown material)\n"),
    }

    output
}

/// Render the parameter table and rule list of a piece.
#[must_use]
pub fn render_piece(piece: &PieceSpec) -> String {
    let mut output = String::new();

    writeln!(
        &mut output,
        "{} [{}] {}/{}",
        piece.display_name, piece.code, piece.discipline, piece.category
    )
    .expect("writing to string cannot fail");
    if !piece.description.is_empty() {
        writeln!(&mut output, "{}", piece.description).expect("writing to string cannot fail");
    }

    output.push_str("\nParameters:\n");
    for parameter in &piece.parameters {
        let unit = if parameter.unit.is_empty() {
            String::new()
        } else {
            format!(" [{}]", parameter.unit)
        };
        let constraint = match &parameter.kind {
            ParameterKind::Float { min, max, .. } => {
                let bound = |b: &Option<f64>| b.map_or_else(|| "-".to_owned(), |v| v.to_string());
                format!("float {}..{}", bound(min), bound(max))
            }
            ParameterKind::Enum { options } => format!(
                "one of {}",
                options
                    .iter()
                    .map(|option| option.value.as_str())
                    .collect::<Vec<_>>()
                    .join("|")
            ),
            ParameterKind::Bool => "bool".to_owned(),
        };
        writeln!(
            &mut output,
            "  {:<22} {}{unit}: {constraint}, default {}",
            parameter.name, parameter.display_name, parameter.default
        )
        .expect("writing to string cannot fail");
        for (controller, required) in &parameter.depends_on {
            writeln!(&mut output, "  {:<22} shown when {controller} = {required}", "")
                .expect("writing to string cannot fail");
        }
    }

    output.push_str("\nRules:\n");
    for rule in &piece.validation_rules {
        writeln!(
            &mut output,
            "  {} ({}): {}",
            rule.rule_id, rule.severity, rule.expression
        )
        .expect("writing to string cannot fail");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::params::ParameterSet;
    use crate::validation::ValidationMessage;

    fn plate() -> PieceSpec {
        Catalog::builtin()
            .expect("embedded catalog loads")
            .piece("base_plate")
            .expect("base plate present")
            .clone()
    }

    #[test]
    fn clean_result_prints_all_clear() {
        let report = render_validation(&plate(), &ValidationResult::default());
        assert!(report.contains("valid"));
        assert!(report.contains("✓ All parameters are valid."));
    }

    #[test]
    fn marks_errors_and_warnings() {
        let result = ValidationResult::from_messages(vec![
            ValidationMessage::new("VR-BP-01", Severity::Error, "too thin"),
            ValidationMessage::new("VR-BP-02", Severity::Warning, "too slender"),
        ]);
        let report = render_validation(&plate(), &result);
        assert!(report.contains("invalid"));
        assert!(report.contains("✗ [VR-BP-01] too thin"));
        assert!(report.contains("⚠ [VR-BP-02] too slender"));
        assert!(report.contains("1 error(s), 1 warning(s)"));
    }

    #[test]
    fn layout_report_lists_holes_and_mass() {
        let piece = plate();
        let params = ParameterSet::defaults(&piece).expect("defaults coerce");
        let layout = PlateLayout::from_parameters(&params).expect("layout");
        let report = render_layout(&layout);
        assert!(report.contains("Hole 1: centre (30.0, 30.0) mm, diameter 18.0 mm"));
        assert!(report.contains("Net mass:"));
        assert!(report.contains("ASTM A36"));
    }

    #[test]
    fn conflicting_layout_omits_mass() {
        let piece = plate();
        let mut params = ParameterSet::defaults(&piece).expect("defaults coerce");
        params
            .apply_assignment(&piece, "margen_perforacion=5")
            .expect("assignment is valid");
        let layout = PlateLayout::from_parameters(&params).expect("layout");
        let report = render_layout(&layout);
        assert!(report.contains("Hole 1: centre (5.0, 5.0) mm"));
        assert!(report.contains("not computed (layout has conflicts)"));
        assert!(!report.contains("Net mass:"));
    }

    #[test]
    fn piece_report_lists_parameters_and_rules() {
        let report = render_piece(&plate());
        assert!(report.contains("espesor"));
        assert!(report.contains("shown when tiene_ranuras = true"));
        assert!(report.contains("VR-BP-09 (warning)"));
    }
}
