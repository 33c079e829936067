use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_INDENT_WIDTH: usize = 4;
const DEFAULT_LOG_MARKER: &str = "# log";

/// Editor settings, stored in `<dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditorConfig {
    /// Spaces per nesting level when serializing XML
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,

    /// First-line token that switches a file's log flag on
    #[serde(default = "default_log_marker")]
    pub log_marker: String,

    /// Maximum undo depth per document (`None` keeps everything)
    #[serde(default)]
    pub history_limit: Option<usize>,

    /// Load unparsable XML as a placeholder root instead of failing
    #[serde(default = "default_recover_malformed_xml")]
    pub recover_malformed_xml: bool,
}

fn default_indent_width() -> usize {
    DEFAULT_INDENT_WIDTH
}

fn default_log_marker() -> String {
    DEFAULT_LOG_MARKER.to_string()
}

fn default_recover_malformed_xml() -> bool {
    true
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            log_marker: DEFAULT_LOG_MARKER.to_string(),
            history_limit: None,
            recover_malformed_xml: true,
        }
    }
}

impl EditorConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: EditorConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content)?;
        Ok(())
    }

    /// Indentation string for one nesting level
    pub fn indent(&self) -> String {
        " ".repeat(self.indent_width)
    }

    /// True when `line` (ignoring surrounding whitespace) is the log marker
    pub fn is_log_marker(&self, line: &str) -> bool {
        line.trim() == self.log_marker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.indent_width, 4);
        assert_eq!(config.log_marker, "# log");
        assert_eq!(config.history_limit, None);
        assert!(config.recover_malformed_xml);
    }

    #[test]
    fn test_indent() {
        let config = EditorConfig {
            indent_width: 2,
            ..EditorConfig::default()
        };
        assert_eq!(config.indent(), "  ");
    }

    #[test]
    fn test_is_log_marker_trims() {
        let config = EditorConfig::default();
        assert!(config.is_log_marker("# log"));
        assert!(config.is_log_marker("  # log\r"));
        assert!(!config.is_log_marker("# logging"));
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = EditorConfig::load(temp_dir.path().join("missing")).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested");

        let config = EditorConfig {
            indent_width: 2,
            history_limit: Some(50),
            ..EditorConfig::default()
        };
        config.save(&dir).unwrap();

        let loaded = EditorConfig::load(&dir).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: EditorConfig = serde_json::from_str(r#"{"indent_width": 8}"#).unwrap();
        assert_eq!(parsed.indent_width, 8);
        assert_eq!(parsed.log_marker, "# log");
        assert!(parsed.recover_malformed_xml);
    }
}
