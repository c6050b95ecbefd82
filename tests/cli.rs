//! Integration tests for the paramcad command line tool.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Command isolated from any settings file or environment of the host.
fn paramcad(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("paramcad");
    cmd.current_dir(dir.path())
        .env_remove("CAD_CATALOG_PATH")
        .env_remove("CAD_OUTPUT_FORMAT")
        .env_remove("CAD_STRICT")
        .env_remove("CAD_LOG")
        .env("XDG_CONFIG_HOME", dir.path().join("config"))
        .env("HOME", dir.path());
    cmd
}

fn workspace() -> TempDir {
    TempDir::new().expect("temp dir")
}

mod listing {
    use super::*;

    #[test]
    fn lists_pieces_and_disciplines() {
        let dir = workspace();
        paramcad(&dir)
            .arg("pieces")
            .assert()
            .success()
            .stdout(predicate::str::contains("base_plate"));
        paramcad(&dir)
            .arg("disciplines")
            .assert()
            .success()
            .stdout(predicate::str::contains("structural"));
    }

    #[test]
    fn filters_pieces_by_category() {
        let dir = workspace();
        paramcad(&dir)
            .args(["pieces", "--discipline", "structural", "--category", "beam"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No pieces found."));
    }

    #[test]
    fn shows_parameters_and_rules() {
        let dir = workspace();
        paramcad(&dir)
            .args(["show", "base_plate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("margen_perforacion"))
            .stdout(predicate::str::contains("VR-BP-04 (error)"));
    }

    #[test]
    fn prints_defaults_as_json() {
        let dir = workspace();
        let output = paramcad(&dir)
            .args(["defaults", "base_plate"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let value: serde_json::Value = serde_json::from_slice(&output).expect("stdout is JSON");
        assert_eq!(value["espesor"], serde_json::json!(12.0));
        assert_eq!(value["patron_perforaciones"], serde_json::json!("rectangular_4"));
    }

    #[test]
    fn unknown_piece_is_an_input_error() {
        let dir = workspace();
        paramcad(&dir)
            .args(["show", "gusset"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown piece 'gusset'"));
    }
}

mod validate {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let dir = workspace();
        paramcad(&dir)
            .args(["validate", "base_plate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("✓ All parameters are valid."));
    }

    #[test]
    fn invalid_parameters_exit_with_one() {
        let dir = workspace();
        paramcad(&dir)
            .args(["validate", "base_plate", "--set", "espesor=2"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("✗ [VR-BP-01]"));
    }

    #[test]
    fn reads_parameter_file_then_assignments() {
        let dir = workspace();
        let params = dir.path().join("plate.json");
        fs::write(&params, r#"{"espesor": 2, "largo": 3000}"#).expect("write params");
        paramcad(&dir)
            .args(["validate", "base_plate", "--params"])
            .arg(&params)
            .args(["--set", "espesor=12"])
            .assert()
            .success()
            .stdout(predicate::str::contains("⚠ [VR-BP-02]"))
            .stdout(predicate::str::contains("VR-BP-01").not());
    }

    #[test]
    fn strict_flag_fails_on_warnings() {
        let dir = workspace();
        paramcad(&dir)
            .args(["validate", "base_plate", "--set", "largo=3000", "--strict"])
            .assert()
            .code(1);
    }

    #[test]
    fn json_output_lists_messages() {
        let dir = workspace();
        let output = paramcad(&dir)
            .args(["validate", "base_plate", "--set", "espesor=2", "--format", "json"])
            .assert()
            .code(1)
            .get_output()
            .stdout
            .clone();
        let value: serde_json::Value = serde_json::from_slice(&output).expect("stdout is JSON");
        assert_eq!(value["is_valid"], serde_json::json!(false));
        assert_eq!(value["messages"][0]["rule_id"], serde_json::json!("VR-BP-01"));
        assert_eq!(value["messages"][0]["severity"], serde_json::json!("error"));
    }

    #[test]
    fn out_of_range_value_is_an_input_error() {
        let dir = workspace();
        paramcad(&dir)
            .args(["validate", "base_plate", "--set", "espesor=500"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("must lie within"));
    }

    #[test]
    fn settings_file_enables_strict_json_output() {
        let dir = workspace();
        fs::write(
            dir.path().join("paramcad.toml"),
            "[output]\nformat = \"json\"\nstrict = true\n",
        )
        .expect("write settings");
        paramcad(&dir)
            .args(["validate", "base_plate", "--set", "largo=3000"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("\"strict\": true"));
    }

    #[test]
    fn debug_log_names_the_settings_file() {
        let dir = workspace();
        fs::write(dir.path().join("paramcad.toml"), "[output]\nstrict = false\n")
            .expect("write settings");
        paramcad(&dir)
            .env("CAD_LOG", "paramcad=debug")
            .args(["validate", "base_plate"])
            .assert()
            .success()
            .stderr(predicate::str::contains("using settings file"))
            .stderr(predicate::str::contains("paramcad.toml"));
    }

    #[test]
    fn environment_selects_output_format() {
        let dir = workspace();
        paramcad(&dir)
            .env("CAD_OUTPUT_FORMAT", "json")
            .args(["validate", "base_plate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"is_valid\": true"));
    }
}

mod layout {
    use super::*;

    #[test]
    fn prints_hole_centres_and_mass() {
        let dir = workspace();
        paramcad(&dir)
            .args(["layout", "base_plate", "--set", "patron_perforaciones=lineal_2"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Hole 2: centre (270.0, 100.0) mm"))
            .stdout(predicate::str::contains("Net mass:"));
    }

    #[test]
    fn reports_layout_conflicts() {
        let dir = workspace();
        paramcad(&dir)
            .args([
                "layout",
                "base_plate",
                "--set",
                "patron_perforaciones=rectangular_6",
                "--set",
                "tiene_ranuras=true",
                "--set",
                "ancho_ranura=30",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("[GEO-03] error"))
            .stdout(predicate::str::contains("Net mass:").not());
    }
}

mod catalog {
    use super::*;

    #[test]
    fn builtin_catalog_checks_clean() {
        let dir = workspace();
        paramcad(&dir)
            .arg("check-catalog")
            .assert()
            .success()
            .stdout(predicate::str::contains("base_plate: defaults valid"))
            .stdout(predicate::str::contains("0 problem(s)"));
    }

    #[test]
    fn audit_problems_fail_the_check() {
        let dir = workspace();
        let catalog = dir.path().join("catalog.json");
        fs::write(
            &catalog,
            r#"{
                "catalog_version": "test",
                "pieces": [{
                    "code": "bracket",
                    "display_name": "Bracket",
                    "discipline": "structural",
                    "category": "connection",
                    "parameters": [
                        {"name": "t", "display_name": "Thickness", "type": "float", "default": 6, "min": 1, "max": 50}
                    ],
                    "validation_rules": [
                        {"rule_id": "BR-01", "expression": "thickness >= 4", "message": "Too thin."}
                    ]
                }]
            }"#,
        )
        .expect("write catalog");
        paramcad(&dir)
            .arg("--catalog")
            .arg(&catalog)
            .arg("check-catalog")
            .assert()
            .code(1)
            .stdout(predicate::str::contains(
                "bracket BR-01: expression references unknown parameter 'thickness'",
            ));
    }

    #[test]
    fn malformed_catalog_is_rejected() {
        let dir = workspace();
        let catalog = dir.path().join("catalog.json");
        fs::write(&catalog, r#"{"pieces": [{"code": "x"}]}"#).expect("write catalog");
        paramcad(&dir)
            .env("CAD_CATALOG_PATH", &catalog)
            .arg("pieces")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Failed to load catalog"));
    }
}
