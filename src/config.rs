//! qrsuite runtime configuration handling

use crate::error::{Error, Result};
use crate::font::{FontFamily, FontResolver};
use crate::input::FormInput;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure loaded from disk and environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrSuiteConfig {
    /// Initial widget fields
    pub defaults: DefaultsOptions,
    /// Export destination and font lookup
    pub export: ExportOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl QrSuiteConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No qrsuite.toml / qrsuite.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["qrsuite.toml", "qrsuite.yaml", "qrsuite.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("qrsuite");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.defaults.apply_env_overrides();
        self.export.apply_env_overrides();
        self.logging.apply_env_overrides();
    }
}

/// Optional overrides for the fields the widget mounts with.
///
/// Values go through the same clamping as form input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsOptions {
    pub content: Option<String>,
    pub label_text: Option<String>,
    pub label_color: Option<String>,
    pub label_font_size: Option<i64>,
    pub label_font_family: Option<FontFamily>,
    pub label_x_offset: Option<i32>,
    pub label_y_offset: Option<i32>,
    pub qr_size: Option<i64>,
    pub foreground_color: Option<String>,
    pub background_color: Option<String>,
}

impl DefaultsOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(content) = env::var("QRSUITE_CONTENT") {
            self.content = Some(content);
        }
        if let Ok(size) = env::var("QRSUITE_QR_SIZE") {
            if let Ok(parsed) = size.parse::<i64>() {
                self.qr_size = Some(parsed);
            }
        }
    }

    /// The configured overrides as form inputs, in field order.
    pub fn inputs(&self) -> Vec<FormInput> {
        let mut inputs = Vec::new();
        if let Some(v) = &self.content {
            inputs.push(FormInput::Content(v.clone()));
        }
        if let Some(v) = &self.label_text {
            inputs.push(FormInput::LabelText(v.clone()));
        }
        if let Some(v) = &self.label_color {
            inputs.push(FormInput::LabelColor(v.clone()));
        }
        if let Some(v) = self.label_font_size {
            inputs.push(FormInput::LabelFontSize(v));
        }
        if let Some(v) = self.label_font_family {
            inputs.push(FormInput::LabelFontFamily(v));
        }
        if let Some(v) = self.label_x_offset {
            inputs.push(FormInput::LabelXOffset(v.to_string()));
        }
        if let Some(v) = self.label_y_offset {
            inputs.push(FormInput::LabelYOffset(v.to_string()));
        }
        if let Some(v) = self.qr_size {
            inputs.push(FormInput::QrSize(v));
        }
        if let Some(v) = &self.foreground_color {
            inputs.push(FormInput::QrForeground(v.clone()));
        }
        if let Some(v) = &self.background_color {
            inputs.push(FormInput::QrBackground(v.clone()));
        }
        inputs
    }
}

/// Where exports are written and which fonts raster labels use
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Directory downloaded files are written to
    pub output_dir: PathBuf,
    /// Font file used for every label family, bypassing lookup
    pub font_path: Option<PathBuf>,
    /// Extra directories searched before the system font directories
    pub font_dirs: Vec<PathBuf>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            font_path: None,
            font_dirs: Vec::new(),
        }
    }
}

impl ExportOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var("QRSUITE_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
        if let Ok(font) = env::var("QRSUITE_FONT_PATH") {
            if font.trim().is_empty() {
                self.font_path = None;
            } else {
                self.font_path = Some(PathBuf::from(font));
            }
        }
    }

    pub fn font_resolver(&self) -> FontResolver {
        FontResolver::new(self.font_path.clone(), self.font_dirs.clone())
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `QRSUITE_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in terminal logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
    /// Collect export counters and log them on exit
    pub metrics: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            color: true,
            rotation: None,
            metrics: false,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("QRSUITE_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("QRSUITE_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Some(color) = env_flag("QRSUITE_LOG_COLOR") {
            self.color = color;
        }
        if let Ok(rotation) = env::var("QRSUITE_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::parse(&rotation) {
                self.rotation = Some(parsed);
            }
        }
        if let Some(metrics) = env_flag("QRSUITE_LOG_METRICS") {
            self.metrics = metrics;
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = env::var(name).ok()?;
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_defaults_section() {
        let config: QrSuiteConfig = toml::from_str(
            r##"
            [defaults]
            content = "https://rust-lang.org"
            label_font_family = "courier-new"
            qr_size = 300
            background_color = "#EEEEEE"

            [export]
            output_dir = "out"

            [logging]
            level = "debug"
            rotation = "daily"
            "##,
        )
        .unwrap();

        assert_eq!(config.export.output_dir, PathBuf::from("out"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.rotation, Some(LogRotation::Daily));
        assert_eq!(
            config.defaults.inputs(),
            vec![
                FormInput::Content("https://rust-lang.org".to_string()),
                FormInput::LabelFontFamily(FontFamily::CourierNew),
                FormInput::QrSize(300),
                FormInput::QrBackground("#EEEEEE".to_string()),
            ]
        );
    }

    #[test]
    fn test_yaml_file_loading() {
        let path = std::env::temp_dir().join(format!(
            "qrsuite-config-{}.yaml",
            crate::download::next_stamp()
        ));
        fs::write(&path, "defaults:\n  label_text: Hi\nlogging:\n  metrics: true\n").unwrap();

        let config = QrSuiteConfig::from_file(&path).unwrap();
        assert_eq!(config.defaults.label_text.as_deref(), Some("Hi"));
        assert!(config.logging.metrics);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let path = std::env::temp_dir().join(format!(
            "qrsuite-config-{}.ini",
            crate::download::next_stamp()
        ));
        fs::write(&path, "x").unwrap();
        assert!(matches!(
            QrSuiteConfig::from_file(&path),
            Err(Error::Config(_))
        ));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_defaults() {
        let config = QrSuiteConfig::default();
        assert_eq!(config.export.output_dir, PathBuf::from("."));
        assert!(config.defaults.inputs().is_empty());
        assert!(!config.logging.metrics);
    }
}
