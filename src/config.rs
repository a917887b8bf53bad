use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration file structure for asilsync.
///
/// Holds the Jira endpoint plus the replication constants (source project,
/// template epic, custom-field ids). Configuration files are loaded from the
/// current directory or a specified path; the token usually comes from the
/// environment instead of the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Jira connection settings
    #[serde(default)]
    pub jira: JiraConfig,

    /// Replication constants
    #[serde(default)]
    pub replication: ReplicationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JiraConfig {
    /// Jira site base URL (e.g., 'https://example.atlassian.net')
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API token used as bearer auth
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReplicationConfig {
    /// Project key holding the template safety story
    #[serde(default = "default_source_project_key")]
    pub source_project_key: String,

    /// Issue key of the template epic
    #[serde(default = "default_source_epic_key")]
    pub source_epic_key: String,

    /// Custom field id carrying the ASIL level
    #[serde(default = "default_asil_field_id")]
    pub asil_field_id: String,

    /// Custom field id carrying the carline
    #[serde(default = "default_carline_field_id")]
    pub carline_field_id: String,

    /// Number of child creations issued concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between creation batches, in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Create children one at a time instead of in concurrent batches
    #[serde(default)]
    pub sequential: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jira: JiraConfig::default(),
            replication: ReplicationConfig::default(),
        }
    }
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
        }
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            source_project_key: default_source_project_key(),
            source_epic_key: default_source_epic_key(),
            asil_field_id: default_asil_field_id(),
            carline_field_id: default_carline_field_id(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            sequential: false,
        }
    }
}

fn default_base_url() -> String {
    "https://example.atlassian.net".to_string()
}

fn default_source_project_key() -> String {
    "FS".to_string()
}

fn default_source_epic_key() -> String {
    "FS-91".to_string()
}

fn default_asil_field_id() -> String {
    "customfield_10091".to_string()
}

fn default_carline_field_id() -> String {
    "customfield_10190".to_string()
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    10
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./asilsync.toml
    /// 3. ./asilsync.json
    /// 4. ./asilsync.yaml
    /// 5. ./asilsync.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "asilsync.toml",
            "asilsync.json",
            "asilsync.yaml",
            "asilsync.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        // No config file found, return defaults
        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }
}
