//! Settings for the `paramcad` command line tool.
//!
//! Settings are layered: a TOML file, then `CAD_*` environment variables,
//! then command line flags. The file is taken from `--config` when given,
//! otherwise from `./paramcad.toml`, otherwise from
//! `<config dir>/paramcad/config.toml`. A missing file means defaults.
//!
//! ```toml
//! [catalog]
//! path = "catalogs/piece_catalog.json"
//!
//! [output]
//! format = "json"
//! strict = true
//!
//! [logging]
//! filter = "paramcad=debug"
//! json = false
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the settings file looked up in the working directory.
pub const LOCAL_FILE_NAME: &str = "paramcad.toml";

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable text.
    #[default]
    Text,
    /// Machine readable JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid output format '{}'. Valid values: text, json", s),
        }
    }
}

/// `[catalog]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Catalog file; the embedded catalog is used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// `[output]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Output format of `validate`.
    #[serde(default)]
    pub format: OutputFormat,
    /// Treat warnings as errors.
    #[serde(default)]
    pub strict: bool,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive used when `CAD_LOG` is unset.
    #[serde(default)]
    pub filter: Option<String>,
    /// Emit JSON log lines.
    #[serde(default)]
    pub json: bool,
}

/// Complete settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Catalog location.
    #[serde(default)]
    pub catalog: CatalogSettings,
    /// Output options.
    #[serde(default)]
    pub output: OutputSettings,
    /// Logging options.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error when the text is not valid TOML or does not match the
    /// settings schema.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse paramcad settings")
    }

    /// Read settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// The settings file to read: `explicit` when given, otherwise the first
    /// implicit location that exists.
    #[must_use]
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::candidates().into_iter().find(|path| path.is_file()),
        }
    }

    /// Read `source` (or start from defaults), then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error when `source` cannot be loaded or an environment
    /// override has an invalid value.
    pub fn load_from(source: Option<&Path>) -> Result<Self> {
        let mut settings = match source {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Locate and read the settings file, then apply environment overrides.
    ///
    /// An explicit path must exist; the implicit locations are optional.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Settings::load_from`].
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(Self::locate(explicit).as_deref())
    }

    /// Implicit settings locations in lookup order.
    #[must_use]
    pub fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("paramcad").join("config.toml"));
        }
        paths
    }

    /// Apply `CAD_CATALOG_PATH`, `CAD_OUTPUT_FORMAT` and `CAD_STRICT` as
    /// returned by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error when `CAD_OUTPUT_FORMAT` names an unknown format.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup("CAD_CATALOG_PATH").filter(|p| !p.is_empty()) {
            self.catalog.path = Some(PathBuf::from(path));
        }
        if let Some(format) = lookup("CAD_OUTPUT_FORMAT") {
            self.output.format = format.parse().context("CAD_OUTPUT_FORMAT")?;
        }
        if let Some(strict) = lookup("CAD_STRICT") {
            self.output.strict = matches!(
                strict.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::parse("").expect("empty TOML is valid");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.output.format, OutputFormat::Text);
        assert!(!settings.output.strict);
    }

    #[test]
    fn parses_all_sections() {
        let settings = Settings::parse(
            r#"
            [catalog]
            path = "pieces.json"

            [output]
            format = "json"
            strict = true

            [logging]
            filter = "paramcad=debug"
            json = true
            "#,
        )
        .expect("valid TOML");
        assert_eq!(settings.catalog.path, Some(PathBuf::from("pieces.json")));
        assert_eq!(settings.output.format, OutputFormat::Json);
        assert!(settings.output.strict);
        assert_eq!(settings.logging.filter.as_deref(), Some("paramcad=debug"));
        assert!(settings.logging.json);
    }

    #[test]
    fn rejects_unknown_format() {
        let error = Settings::parse("[output]\nformat = \"xml\"").expect_err("xml is not a format");
        assert!(error.to_string().contains("Failed to parse"));
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut settings = Settings::parse("[output]\nformat = \"json\"").expect("valid TOML");
        let env: HashMap<&str, &str> = [
            ("CAD_CATALOG_PATH", "/srv/catalog.json"),
            ("CAD_OUTPUT_FORMAT", "TEXT"),
            ("CAD_STRICT", "yes"),
        ]
        .into_iter()
        .collect();
        settings
            .apply_env_with(|key| env.get(key).map(|v| (*v).to_owned()))
            .expect("valid overrides");
        assert_eq!(settings.catalog.path, Some(PathBuf::from("/srv/catalog.json")));
        assert_eq!(settings.output.format, OutputFormat::Text);
        assert!(settings.output.strict);
    }

    #[test]
    fn invalid_environment_format_is_an_error() {
        let mut settings = Settings::default();
        let result = settings.apply_env_with(|key| (key == "CAD_OUTPUT_FORMAT").then(|| "yaml".to_owned()));
        assert!(result.is_err());
    }

    #[test]
    fn loads_explicit_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[output]\nstrict = true\n").expect("write settings");
        let settings = Settings::load(&path).expect("file loads");
        assert!(settings.output.strict);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let error = Settings::load(&dir.path().join("absent.toml")).expect_err("file is missing");
        assert!(error.to_string().contains("Failed to read settings file"));
    }

    #[test]
    fn explicit_path_is_located_even_when_absent() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("absent.toml");
        assert_eq!(Settings::locate(Some(&path)), Some(path.clone()));
        assert!(Settings::discover(Some(&path)).is_err());
    }
}
