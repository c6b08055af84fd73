use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// GeneratorConfig
// ---------------------------------------------------------------------------

/// External text-generation command. The prompt is written to its stdin and
/// its stdout is streamed back as the completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

fn default_program() -> String {
    "llm".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_context_file")]
    pub context_file: PathBuf,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

fn default_context_file() -> PathBuf {
    PathBuf::from(paths::CONTEXT_FILE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            context_file: default_context_file(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl Config {
    /// Load `.assist/config.yaml`. Returns defaults if the file is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Absolute location of the context document for this project.
    pub fn context_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.context_file)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.generator.program.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "generator.program is empty".to_string(),
            });
        }

        if self.context_file.as_os_str().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "context_file is empty".to_string(),
            });
        } else if self
            .context_file
            .extension()
            .map(|e| e != "md")
            .unwrap_or(true)
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "context_file '{}' does not have a .md extension",
                    self.context_file.display()
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
