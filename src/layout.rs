//! Base plate layout: hole and slot placement, feasibility checks and mass.
//!
//! The CAD generator cuts holes and slots into a plate and only finds out that
//! the result is not a valid solid once the kernel rejects it. This module
//! places the same features up front so the conflicts can be reported as
//! validation messages alongside the catalog rules.

use uom::si::area::square_millimeter;
use uom::si::f64::{Area, Length, Mass, MassDensity, Volume};
use uom::si::length::millimeter;
use uom::si::mass_density::kilogram_per_cubic_meter;

use crate::catalog::PieceSpec;
use crate::errors::LayoutError;
use crate::expr::Value;
use crate::geometry::{point, Circle, Point, Rect};
use crate::params::ParameterSet;
use crate::validation::{Severity, ValidationMessage};

/// Code of the piece modelled by [`PlateLayout`].
pub const BASE_PLATE: &str = "base_plate";

/// Rule id reported when the layout cannot be computed at all.
pub const LAYOUT_UNAVAILABLE: &str = "GEO-00";

/// Whether `piece` is checked with a [`PlateLayout`].
#[must_use]
pub fn has_plate_layout(piece: &PieceSpec) -> bool {
    piece.code == BASE_PLATE
}

/// Arrangement of anchor bolt holes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HolePattern {
    /// No holes.
    None,
    /// One hole near each corner.
    Rectangular4,
    /// Corner holes plus one at the middle of each long edge.
    Rectangular6,
    /// Two holes on the longitudinal centre line.
    Linear2,
    /// User defined placement; laid out as [`HolePattern::Rectangular4`].
    Custom,
}

impl HolePattern {
    /// Look up a pattern by its catalog option value.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "none" => Some(Self::None),
            "rectangular_4" => Some(Self::Rectangular4),
            "rectangular_6" => Some(Self::Rectangular6),
            "lineal_2" => Some(Self::Linear2),
            "personalizado" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Catalog option value of the pattern.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Rectangular4 => "rectangular_4",
            Self::Rectangular6 => "rectangular_6",
            Self::Linear2 => "lineal_2",
            Self::Custom => "personalizado",
        }
    }

    /// Hole centres on a `length` × `width` plate with edge distance `margin`.
    ///
    /// # Examples
    /// ```
    /// use paramcad::layout::HolePattern;
    ///
    /// let centres = HolePattern::Linear2.hole_centers(300.0, 200.0, 30.0);
    /// assert_eq!(centres.len(), 2);
    /// assert_eq!(centres[1].x, 270.0);
    /// assert_eq!(centres[1].y, 100.0);
    /// ```
    #[must_use]
    pub fn hole_centers(self, length: f64, width: f64, margin: f64) -> Vec<Point> {
        let (e, l, w) = (margin, length, width);
        let corners = || vec![point(e, e), point(l - e, e), point(e, w - e), point(l - e, w - e)];
        match self {
            Self::None => Vec::new(),
            Self::Rectangular4 | Self::Custom => corners(),
            Self::Rectangular6 => {
                let mut centres = corners();
                centres.extend([point(l / 2.0, e), point(l / 2.0, w - e)]);
                centres
            }
            Self::Linear2 => vec![point(e, w / 2.0), point(l - e, w / 2.0)],
        }
    }
}

/// Plate materials with a known density.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Material {
    /// ASTM A36 structural steel.
    AstmA36,
    /// ASTM A572 Grade 50 high strength steel.
    AstmA572Gr50,
    /// AISI 304 stainless steel.
    Ss304,
    /// AISI 316 stainless steel.
    Ss316,
    /// Aluminium 6061-T6.
    Al6061T6,
}

impl Material {
    /// Look up a material by its catalog option value.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ASTM_A36" => Some(Self::AstmA36),
            "ASTM_A572_G50" => Some(Self::AstmA572Gr50),
            "SS304" => Some(Self::Ss304),
            "SS316" => Some(Self::Ss316),
            "AL6061T6" => Some(Self::Al6061T6),
            _ => None,
        }
    }

    /// Trade designation.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::AstmA36 => "ASTM A36",
            Self::AstmA572Gr50 => "ASTM A572 Gr.50",
            Self::Ss304 => "AISI 304",
            Self::Ss316 => "AISI 316",
            Self::Al6061T6 => "AL 6061-T6",
        }
    }

    /// Nominal density.
    #[must_use]
    pub fn density(self) -> MassDensity {
        let kg_per_m3 = match self {
            Self::AstmA36 | Self::AstmA572Gr50 => 7850.0,
            Self::Ss304 => 7930.0,
            Self::Ss316 => 7980.0,
            Self::Al6061T6 => 2700.0,
        };
        MassDensity::new::<kilogram_per_cubic_meter>(kg_per_m3)
    }
}

/// Hole and slot placement for one base plate.
#[derive(Clone, Debug, PartialEq)]
pub struct PlateLayout {
    /// Plate length along X in millimetres.
    pub length: f64,
    /// Plate width along Y in millimetres.
    pub width: f64,
    /// Plate thickness in millimetres.
    pub thickness: f64,
    /// Pattern code as requested.
    pub requested_pattern: String,
    /// Pattern actually laid out.
    pub pattern: HolePattern,
    /// Holes in placement order.
    pub holes: Vec<Circle>,
    /// Edge notches; empty when the plate has no slots.
    pub slots: Vec<Rect>,
    /// Plate material when it is one with a known density.
    pub material: Option<Material>,
}

impl PlateLayout {
    /// Lay out a plate from base plate parameters.
    ///
    /// Missing optional parameters take the values the CAD generator assumes.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] when a dimension is missing, mistyped or not
    /// strictly positive.
    pub fn from_parameters(params: &ParameterSet) -> Result<Self, LayoutError> {
        let length = positive(params, "largo", None)?;
        let width = positive(params, "ancho", None)?;
        let thickness = positive(params, "espesor", None)?;
        let requested_pattern = text(params, "patron_perforaciones", "rectangular_4")?;
        let diameter = positive(params, "diametro_perforacion", Some(18.0))?;
        let margin = positive(params, "margen_perforacion", Some(30.0))?;
        let has_slots = flag(params, "tiene_ranuras", false)?;
        let material = text(params, "material", "")
            .ok()
            .and_then(|code| Material::from_code(&code));

        let pattern = match HolePattern::from_code(&requested_pattern) {
            Some(HolePattern::Custom) | None => HolePattern::Rectangular4,
            Some(known) => known,
        };
        let holes = pattern
            .hole_centers(length, width, margin)
            .into_iter()
            .map(|center| Circle::new(center, diameter))
            .collect();

        let slots = if has_slots {
            let slot_width = positive(params, "ancho_ranura", Some(12.0))?;
            let slot_length = positive(params, "largo_ranura", Some(40.0))?;
            let start = length / 2.0 - slot_length / 2.0;
            let end = start + slot_length;
            vec![
                Rect::new(point(start, 0.0), point(end, slot_width)),
                Rect::new(point(start, width - slot_width), point(end, width)),
            ]
        } else {
            Vec::new()
        };

        Ok(Self {
            length,
            width,
            thickness,
            requested_pattern,
            pattern,
            holes,
            slots,
            material,
        })
    }

    /// Outline of the plate.
    #[must_use]
    pub fn outline(&self) -> Rect {
        Rect::new(point(0.0, 0.0), point(self.length, self.width))
    }

    /// Feasibility findings for the layout.
    ///
    /// * `GEO-01` a hole breaks out of the plate edge.
    /// * `GEO-02` two holes overlap.
    /// * `GEO-03` a hole runs into a slot.
    /// * `GEO-04` the slots meet across the plate width.
    /// * `GEO-05` the requested pattern was replaced by the corner pattern.
    /// * `GEO-06` a slot is longer than the plate.
    #[must_use]
    pub fn check(&self) -> Vec<ValidationMessage> {
        let mut messages = Vec::new();
        let outline = self.outline();

        if self.pattern.code() != self.requested_pattern {
            messages.push(ValidationMessage::new(
                "GEO-05",
                Severity::Warning,
                format!(
                    "Hole pattern '{}' has no automatic layout; holes are placed as rectangular_4.",
                    self.requested_pattern
                ),
            ));
        }

        for (idx, hole) in self.holes.iter().enumerate() {
            if !hole.within(&outline) {
                messages.push(ValidationMessage::new(
                    "GEO-01",
                    Severity::Error,
                    format!(
                        "Hole {} at ({:.1}, {:.1}) breaks out of the plate edge.",
                        idx + 1,
                        hole.center.x,
                        hole.center.y
                    ),
                ));
            }
        }

        for (i, first) in self.holes.iter().enumerate() {
            for (j, second) in self.holes.iter().enumerate().skip(i + 1) {
                if first.overlaps(second) {
                    messages.push(ValidationMessage::new(
                        "GEO-02",
                        Severity::Error,
                        format!(
                            "Holes {} and {} overlap (centre distance {:.1} mm).",
                            i + 1,
                            j + 1,
                            first.center.distance(second.center)
                        ),
                    ));
                }
            }
        }

        for (idx, hole) in self.holes.iter().enumerate() {
            for (slot_idx, slot) in self.slots.iter().enumerate() {
                if hole.intersects(slot) {
                    messages.push(ValidationMessage::new(
                        "GEO-03",
                        Severity::Error,
                        format!("Hole {} runs into slot {}.", idx + 1, slot_idx + 1),
                    ));
                }
            }
        }

        if let [first, second] = self.slots.as_slice() {
            if first.touches(second) {
                messages.push(ValidationMessage::new(
                    "GEO-04",
                    Severity::Error,
                    format!(
                        "Slots of width {:.1} mm meet across a plate {:.1} mm wide.",
                        first.height(),
                        self.width
                    ),
                ));
            }
            if first.width() > self.length {
                messages.push(ValidationMessage::new(
                    "GEO-06",
                    Severity::Error,
                    format!(
                        "Slot length {:.1} mm exceeds the plate length {:.1} mm.",
                        first.width(),
                        self.length
                    ),
                ));
            }
        }

        messages
    }

    /// Whether [`PlateLayout::check`] reports any error.
    ///
    /// Net area and mass assume holes and slots that stay inside the plate
    /// and do not cut into each other; they are approximate otherwise.
    #[must_use]
    pub fn has_conflicts(&self) -> bool {
        self.check()
            .iter()
            .any(|message| message.severity == Severity::Error)
    }

    /// Area of the plate outline.
    #[must_use]
    pub fn gross_area(&self) -> Area {
        length(self.length) * length(self.width)
    }

    /// Outline area minus holes and the slot parts inside the plate.
    ///
    /// Only exact when [`PlateLayout::has_conflicts`] is false.
    #[must_use]
    pub fn net_area(&self) -> Area {
        let outline = self.outline();
        let holes: f64 = self.holes.iter().map(Circle::area).sum();
        let slots: f64 = self
            .slots
            .iter()
            .map(|slot| {
                let x = (slot.max.x.min(outline.max.x) - slot.min.x.max(outline.min.x)).max(0.0);
                let y = (slot.max.y.min(outline.max.y) - slot.min.y.max(outline.min.y)).max(0.0);
                x * y
            })
            .sum();
        let net = (outline.area() - holes - slots).max(0.0);
        Area::new::<square_millimeter>(net)
    }

    /// Volume of material left after cutting.
    #[must_use]
    pub fn net_volume(&self) -> Volume {
        self.net_area() * length(self.thickness)
    }

    /// Mass of the finished plate, when the material density is known.
    #[must_use]
    pub fn net_mass(&self) -> Option<Mass> {
        self.material
            .map(|material| self.net_volume() * material.density())
    }
}

/// Millimetres as a uom length.
fn length(mm: f64) -> Length {
    Length::new::<millimeter>(mm)
}

/// A strictly positive dimension, or `fallback` when the parameter is absent.
fn positive(params: &ParameterSet, name: &str, fallback: Option<f64>) -> Result<f64, LayoutError> {
    let value = match (params.get(name), fallback) {
        (Some(Value::Number(n)), _) => *n,
        (Some(_), _) => {
            return Err(LayoutError::WrongType {
                parameter: name.to_owned(),
                expected: "a number",
            })
        }
        (None, Some(fallback)) => fallback,
        (None, None) => return Err(LayoutError::MissingParameter(name.to_owned())),
    };
    if value > 0.0 {
        Ok(value)
    } else {
        Err(LayoutError::NonPositiveDimension {
            parameter: name.to_owned(),
            value,
        })
    }
}

/// A string parameter, or `fallback` when absent.
fn text(params: &ParameterSet, name: &str, fallback: &str) -> Result<String, LayoutError> {
    match params.get(name) {
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(_) => Err(LayoutError::WrongType {
            parameter: name.to_owned(),
            expected: "a string",
        }),
        None => Ok(fallback.to_owned()),
    }
}

/// A boolean parameter, or `fallback` when absent.
fn flag(params: &ParameterSet, name: &str, fallback: bool) -> Result<bool, LayoutError> {
    match params.get(name) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(LayoutError::WrongType {
            parameter: name.to_owned(),
            expected: "a boolean",
        }),
        None => Ok(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use approx::assert_relative_eq;
    use uom::si::mass::kilogram;

    fn plate_params(assignments: &[&str]) -> ParameterSet {
        let catalog = Catalog::builtin().expect("embedded catalog loads");
        let piece = catalog.piece(BASE_PLATE).expect("base plate present");
        let mut params = ParameterSet::defaults(piece).expect("defaults coerce");
        for assignment in assignments {
            params
                .apply_assignment(piece, assignment)
                .expect("assignment is valid");
        }
        params
    }

    fn ids(messages: &[ValidationMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.rule_id.as_str()).collect()
    }

    #[test]
    fn default_plate_has_four_corner_holes_and_no_findings() {
        let layout = PlateLayout::from_parameters(&plate_params(&[])).expect("layout");
        assert_eq!(layout.pattern, HolePattern::Rectangular4);
        let centres: Vec<Point> = layout.holes.iter().map(|h| h.center).collect();
        assert_eq!(
            centres,
            vec![point(30.0, 30.0), point(270.0, 30.0), point(30.0, 170.0), point(270.0, 170.0)]
        );
        assert!(layout.slots.is_empty());
        assert!(layout.check().is_empty());
    }

    #[test]
    fn six_hole_pattern_adds_long_edge_midpoints() {
        let centres = HolePattern::Rectangular6.hole_centers(300.0, 200.0, 30.0);
        assert_eq!(centres.len(), 6);
        assert_eq!(centres[4], point(150.0, 30.0));
        assert_eq!(centres[5], point(150.0, 170.0));
        assert!(HolePattern::None.hole_centers(300.0, 200.0, 30.0).is_empty());
    }

    #[test]
    fn slots_are_centred_edge_notches() {
        let layout = PlateLayout::from_parameters(&plate_params(&["tiene_ranuras=true"])).expect("layout");
        assert_eq!(layout.slots.len(), 2);
        assert_eq!(layout.slots[0], Rect::new(point(130.0, 0.0), point(170.0, 12.0)));
        assert_eq!(layout.slots[1], Rect::new(point(130.0, 188.0), point(170.0, 200.0)));
        assert!(layout.check().is_empty());
    }

    #[test]
    fn custom_pattern_falls_back_with_warning() {
        let layout =
            PlateLayout::from_parameters(&plate_params(&["patron_perforaciones=personalizado"])).expect("layout");
        assert_eq!(layout.pattern, HolePattern::Rectangular4);
        let findings = layout.check();
        assert_eq!(ids(&findings), vec!["GEO-05"]);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn small_margin_breaks_out_of_edge() {
        let layout = PlateLayout::from_parameters(&plate_params(&["margen_perforacion=5"])).expect("layout");
        let findings = layout.check();
        assert_eq!(ids(&findings), vec!["GEO-01", "GEO-01", "GEO-01", "GEO-01"]);
    }

    #[test]
    fn crowded_holes_overlap() {
        let layout = PlateLayout::from_parameters(&plate_params(&[
            "largo=80",
            "ancho=80",
            "margen_perforacion=30",
            "diametro_perforacion=30",
        ]))
        .expect("layout");
        let findings = layout.check();
        assert!(ids(&findings).contains(&"GEO-02"));
        assert!(!ids(&findings).contains(&"GEO-01"));
    }

    #[test]
    fn midpoint_holes_run_into_slots() {
        let layout = PlateLayout::from_parameters(&plate_params(&[
            "patron_perforaciones=rectangular_6",
            "tiene_ranuras=true",
            "ancho_ranura=30",
        ]))
        .expect("layout");
        let findings = layout.check();
        assert_eq!(ids(&findings), vec!["GEO-03", "GEO-03"]);
    }

    #[test]
    fn wide_slots_meet_across_plate() {
        let layout = PlateLayout::from_parameters(&plate_params(&[
            "ancho=150",
            "patron_perforaciones=none",
            "tiene_ranuras=true",
            "ancho_ranura=80",
        ]))
        .expect("layout");
        assert_eq!(ids(&layout.check()), vec!["GEO-04"]);
    }

    #[test]
    fn long_slot_exceeds_plate() {
        let layout = PlateLayout::from_parameters(&plate_params(&[
            "largo=100",
            "ancho=200",
            "patron_perforaciones=none",
            "tiene_ranuras=true",
            "largo_ranura=150",
        ]))
        .expect("layout");
        assert_eq!(ids(&layout.check()), vec!["GEO-06"]);
    }

    #[test]
    fn net_mass_of_solid_steel_plate() {
        let layout = PlateLayout::from_parameters(&plate_params(&["patron_perforaciones=none"])).expect("layout");
        let mass = layout.net_mass().expect("A36 density is known");
        // 0.3 m x 0.2 m x 0.012 m x 7850 kg/m3
        assert_relative_eq!(mass.get::<kilogram>(), 5.652, epsilon = 1e-9);
    }

    #[test]
    fn holes_and_slots_reduce_mass() {
        let solid = PlateLayout::from_parameters(&plate_params(&["patron_perforaciones=none"])).expect("layout");
        let cut = PlateLayout::from_parameters(&plate_params(&["tiene_ranuras=true"])).expect("layout");
        let removed = solid.net_area().get::<square_millimeter>() - cut.net_area().get::<square_millimeter>();
        let expected = 4.0 * std::f64::consts::PI * 81.0 + 2.0 * 40.0 * 12.0;
        assert_relative_eq!(removed, expected, epsilon = 1e-6);
    }

    #[test]
    fn conflicts_follow_error_findings() {
        let clean = PlateLayout::from_parameters(&plate_params(&[])).expect("layout");
        assert!(!clean.has_conflicts());
        let custom =
            PlateLayout::from_parameters(&plate_params(&["patron_perforaciones=personalizado"])).expect("layout");
        assert!(!custom.has_conflicts());
        let broken = PlateLayout::from_parameters(&plate_params(&["margen_perforacion=5"])).expect("layout");
        assert!(broken.has_conflicts());
    }

    #[test]
    fn missing_dimensions_are_reported() {
        let error = PlateLayout::from_parameters(&ParameterSet::new()).expect_err("no largo");
        assert_eq!(error, LayoutError::MissingParameter("largo".into()));
    }
}
