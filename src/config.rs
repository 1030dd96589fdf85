use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::database::DatabaseConfig;

/// Run mode of the application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Verbose: every SQL statement is logged
    Debug,
    #[default]
    Release,
}

impl RunMode {
    pub fn is_debug(&self) -> bool {
        matches!(self, RunMode::Debug)
    }
}

impl FromStr for RunMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(RunMode::Debug),
            "release" => Ok(RunMode::Release),
            other => Err(anyhow!(
                "Invalid run mode '{}', expected 'debug' or 'release'",
                other
            )),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Debug => write!(f, "debug"),
            RunMode::Release => write!(f, "release"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeyondConfig {
    /// Path to the directory to hold beyond's data
    pub data_dir: String,

    /// Path to the SQLite database file
    pub db_path: String,

    /// Run mode (debug or release)
    pub mode: RunMode,

    /// Directory holding uploaded files
    pub file_dir: String,
}

const EMPTY_CONFIG: &str = r#"### beyond configuration file

### directory for data used by beyond
# data_dir = "~/.beyond"

### sqlite database file (default: {data_dir}/beyond.db)
# db_path = "~/.beyond/beyond.db"

### run mode: debug logs every SQL statement
# mode = "release"

### upload directory indexed on first start (default: {data_dir}/files)
# file_dir = "~/.beyond/files"
"#;

impl Default for BeyondConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());
        Self::with_data_dir(&format!("{}/.beyond", home_dir))
    }
}

impl BeyondConfig {
    /// Function to create and initialize a new configuration
    ///
    /// By default `$HOME/.beyond/beyond.toml` is used; a commented template is
    /// written when the file does not exist. Settings can be overridden with
    /// `BEYOND_`-prefixed environment variables, e.g. `BEYOND_MODE=debug`.
    pub fn new(path: &Option<String>) -> Result<BeyondConfig> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => {
                let home_dir =
                    dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
                let beyond_dir = format!("{}/.beyond", home_dir.to_string_lossy());
                std::fs::create_dir_all(beyond_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create beyond directory: {}", e))?;
                format!("{}/beyond.toml", beyond_dir)
            }
        };

        if !Path::new(config_path.as_str()).exists() {
            std::fs::write(config_path.as_str(), EMPTY_CONFIG).map_err(|e| {
                anyhow!("Unable to create config file {}: {}", config_path.as_str(), e)
            })?;
        }

        let builder = Config::builder()
            .add_source(config::File::with_name(config_path.as_str()))
            // E.g., `BEYOND_DATA_DIR=/srv/beyond ./beyond` would set the data directory
            .add_source(config::Environment::with_prefix("BEYOND"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let values = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_values(&values)
    }

    /// Build a configuration from already-loaded key/value settings
    pub fn from_values(values: &HashMap<String, String>) -> Result<BeyondConfig> {
        let data_dir = match values.get("data_dir") {
            Some(dir) => expand_home(dir),
            None => BeyondConfig::default().data_dir,
        };
        let mut config = Self::with_data_dir(&data_dir);

        if let Some(p) = values.get("db_path") {
            config.db_path = expand_home(p);
        }
        if let Some(p) = values.get("file_dir") {
            config.file_dir = expand_home(p);
        }
        if let Some(mode) = values.get("mode") {
            config.mode = mode.parse()?;
        }

        Ok(config)
    }

    fn with_data_dir(data_dir: &str) -> Self {
        let trimmed = data_dir.trim_end_matches('/');
        BeyondConfig {
            data_dir: data_dir.to_string(),
            db_path: format!("{}/beyond.db", trimmed),
            mode: RunMode::default(),
            file_dir: format!("{}/files", trimmed),
        }
    }

    /// Storage settings consumed by [`crate::database::BeyondDatabase::connect`]
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(PathBuf::from(&self.db_path), self.mode).with_file_dir(&self.file_dir)
    }

    /// Create the data directory and the parent of the database file
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(self.data_dir.as_str()).map_err(|e| {
            anyhow!("Failed to create data directory '{}': {}", self.data_dir, e)
        })?;
        if let Some(parent) = Path::new(&self.db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    anyhow!("Failed to create directory '{}': {}", parent.display(), e)
                })?;
            }
        }
        Ok(())
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Data Directory:     {}", self.data_dir),
            format!("SQLite Path:        {}", self.db_path),
            format!("Run Mode:           {}", self.mode),
            format!("File Directory:     {}", self.file_dir),
        ];

        if let Ok(meta) = std::fs::metadata(&self.db_path) {
            lines.push(format!("SQLite Size:        {}", format_size(meta.len())));
        }

        lines.join("\n")
    }
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &str) -> String {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            format!("{}{}", home.to_string_lossy(), rest)
        }
        _ => path.to_string(),
    }
}

/// Format a byte count with a binary unit suffix
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = BeyondConfig::default();
        assert!(config.data_dir.ends_with(".beyond"));
        assert!(config.db_path.ends_with(".beyond/beyond.db"));
        assert_eq!(config.mode, RunMode::Release);
    }

    #[test]
    fn test_from_values() {
        let config = BeyondConfig::from_values(&values(&[
            ("data_dir", "/srv/beyond/"),
            ("mode", "Debug"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, "/srv/beyond/beyond.db");
        assert_eq!(config.file_dir, "/srv/beyond/files");
        assert_eq!(config.mode, RunMode::Debug);
    }

    #[test]
    fn test_explicit_paths_override_data_dir() {
        let config = BeyondConfig::from_values(&values(&[
            ("data_dir", "/srv/beyond"),
            ("db_path", "/var/lib/beyond.db"),
            ("file_dir", "/mnt/uploads"),
        ]))
        .unwrap();

        let db = config.database_config();
        assert_eq!(db.path, PathBuf::from("/var/lib/beyond.db"));
        assert_eq!(db.file_dir, Some(PathBuf::from("/mnt/uploads")));
        assert_eq!(db.mode, RunMode::Release);
    }

    #[test]
    fn test_invalid_mode() {
        let result = BeyondConfig::from_values(&values(&[("mode", "verbose")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_run_mode_parse_and_display() {
        assert_eq!("debug".parse::<RunMode>().unwrap(), RunMode::Debug);
        assert_eq!(" RELEASE ".parse::<RunMode>().unwrap(), RunMode::Release);
        assert_eq!(RunMode::Debug.to_string(), "debug");
        assert!(RunMode::Debug.is_debug());
        assert!(!RunMode::Release.is_debug());
    }

    #[test]
    fn test_new_writes_template_and_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beyond.toml");
        let path_str = path.to_string_lossy().to_string();

        // template is all comments, so defaults apply
        let config = BeyondConfig::new(&Some(path_str.clone())).unwrap();
        assert!(path.exists());
        assert_eq!(config.mode, RunMode::Release);

        let data_dir = dir.path().join("data").to_string_lossy().to_string();
        std::fs::write(&path, format!("data_dir = \"{}\"\n", data_dir)).unwrap();
        let config = BeyondConfig::new(&Some(path_str)).unwrap();
        assert_eq!(config.data_dir, data_dir);
        assert_eq!(config.db_path, format!("{}/beyond.db", data_dir));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
