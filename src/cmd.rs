//! Command handlers for the `paramcad` binary.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use paramcad::config::OutputFormat;
use paramcad::layout::has_plate_layout;
use paramcad::report::{render_layout, render_piece, render_validation};
use paramcad::{Catalog, LayoutError, ParameterSet, PieceSpec, PlateLayout, ValidationEngine};

use crate::ParamsInput;

/// Load the catalog at `path`, or the embedded one.
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => Catalog::builtin().context("Embedded catalog is invalid"),
    }
}

pub fn cmd_pieces(
    catalog: &Catalog,
    discipline: Option<&str>,
    category: Option<&str>,
) -> Result<ExitCode> {
    let pieces: Vec<&PieceSpec> = match (discipline, category) {
        (Some(discipline), Some(category)) => catalog.pieces_by_category(discipline, category),
        (Some(discipline), None) => catalog.pieces_by_discipline(discipline),
        (None, Some(category)) => catalog
            .pieces()
            .iter()
            .filter(|piece| piece.category == category)
            .collect(),
        (None, None) => catalog.pieces().iter().collect(),
    };
    if pieces.is_empty() {
        println!("No pieces found.");
    }
    for piece in pieces {
        println!(
            "{:<16} {:<32} {}/{}",
            piece.code, piece.display_name, piece.discipline, piece.category
        );
    }
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_disciplines(catalog: &Catalog) -> Result<ExitCode> {
    for discipline in catalog.disciplines() {
        println!("{discipline}");
    }
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_show(catalog: &Catalog, code: &str) -> Result<ExitCode> {
    let piece = catalog.require_piece(code)?;
    print!("{}", render_piece(piece));
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_defaults(catalog: &Catalog, code: &str) -> Result<ExitCode> {
    let piece = catalog.require_piece(code)?;
    let params = ParameterSet::defaults(piece)?;
    println!("{}", serde_json::to_string_pretty(&params.to_json())?);
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_validate(
    catalog: &Catalog,
    code: &str,
    input: &ParamsInput,
    format: OutputFormat,
    strict: bool,
) -> Result<ExitCode> {
    let piece = catalog.require_piece(code)?;
    let params = collect_params(piece, input)?;
    let mut result = ValidationEngine::new().check_piece(piece, &params);
    if strict {
        result = result.promote_warnings();
    }

    match format {
        OutputFormat::Text => print!("{}", render_validation(piece, &result)),
        OutputFormat::Json => {
            let document = serde_json::json!({
                "piece": piece.code,
                "strict": strict,
                "is_valid": result.is_valid(),
                "messages": result.messages(),
            });
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }

    Ok(if result.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

pub fn cmd_layout(catalog: &Catalog, code: &str, input: &ParamsInput) -> Result<ExitCode> {
    let piece = catalog.require_piece(code)?;
    if !has_plate_layout(piece) {
        return Err(LayoutError::Unsupported(piece.code.clone()).into());
    }
    let params = collect_params(piece, input)?;
    let layout = PlateLayout::from_parameters(&params)?;
    print!("{}", render_layout(&layout));
    let findings = layout.check();
    for finding in &findings {
        println!("[{}] {}: {}", finding.rule_id, finding.severity, finding.message);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_check_catalog(catalog: &Catalog) -> Result<ExitCode> {
    let mut problems = 0usize;

    for finding in catalog.audit() {
        println!("{} {}: {}", finding.piece, finding.rule_id, finding.problem);
        problems += 1;
    }

    let engine = ValidationEngine::new();
    for piece in catalog.pieces() {
        let params = ParameterSet::defaults(piece)?;
        let result = engine.check_piece(piece, &params);
        if result.is_valid() {
            println!("{}: defaults valid", piece.code);
        } else {
            print!("{}", render_validation(piece, &result));
            problems += 1;
        }
    }

    println!(
        "Catalog {}: {} piece(s), {} problem(s)",
        catalog.catalog_version,
        catalog.pieces().len(),
        problems
    );
    Ok(if problems == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Defaults, overlaid with the `--params` file, then each `--set`.
fn collect_params(piece: &PieceSpec, input: &ParamsInput) -> Result<ParameterSet> {
    let mut params = match &input.params {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read parameters file: {}", path.display()))?;
            let document: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?;
            let Some(object) = document.as_object() else {
                bail!("{} must contain a JSON object", path.display());
            };
            ParameterSet::from_json_object(piece, object)
                .with_context(|| format!("Invalid parameters in {}", path.display()))?
        }
        None => ParameterSet::defaults(piece)?,
    };
    for assignment in &input.assignments {
        params
            .apply_assignment(piece, assignment)
            .with_context(|| format!("Invalid --set {assignment}"))?;
    }
    Ok(params)
}
