//! Configuration types for Forma.
//!
//! A project directory holds one tenant's form configuration snapshot and is
//! combined into a single `FormConfig` structure.
//!
//! # Configuration Files
//!
//! - **forma.yaml**: Main configuration file (tenant, file locations)
//! - **layouts/*.yaml**: Individual form layouts
//! - **access.yaml**: List of field access rules

pub mod access;
pub mod layout;
pub mod screen;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use access::{FieldAccessRule, FieldPermission, FieldSource};
pub use layout::{ConditionKind, FieldDependency, FormLayout, SectionDefinition};
pub use screen::ScreenType;

/// Complete Forma configuration loaded from files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    /// Tenant that owns every record in this snapshot.
    pub tenant_id: String,

    /// Directory containing layout files.
    #[serde(default)]
    pub layouts_dir: Option<PathBuf>,

    /// List of individual layout files.
    #[serde(default)]
    pub layout_files: Vec<PathBuf>,

    /// File containing the access rule list.
    #[serde(default)]
    pub access_rules_file: Option<PathBuf>,

    /// Inline layouts.
    #[serde(default)]
    pub layouts: Vec<FormLayout>,

    /// Inline access rules.
    #[serde(default)]
    pub access_rules: Vec<FieldAccessRule>,
}

impl FormConfig {
    /// Empty configuration for a tenant.
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            layouts_dir: None,
            layout_files: Vec::new(),
            access_rules_file: None,
            layouts: Vec::new(),
            access_rules: Vec::new(),
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration and resolve all external references.
    ///
    /// This loads:
    /// - Layouts from `layouts_dir` and `layout_files`
    /// - Access rules from `access_rules_file`
    ///
    /// Layouts are sorted by id so the snapshot is deterministic regardless
    /// of directory iteration order.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        if config.tenant_id.trim().is_empty() {
            return Err(ConfigError::Config("tenant_id must not be empty".to_string()));
        }

        // Load layouts from directory
        if let Some(layouts_dir) = &config.layouts_dir {
            let layouts_path = resolve_path(&base_dir, layouts_dir);
            if !layouts_path.is_dir() {
                return Err(ConfigError::Config(format!(
                    "Layouts directory not found: {}",
                    layouts_path.display()
                )));
            }
            for path in yaml_files_in(&layouts_path)? {
                config.layouts.push(FormLayout::from_file(&path)?);
            }
        }

        // Load layouts from individual files
        for layout_file in &config.layout_files.clone() {
            let layout_path = resolve_path(&base_dir, layout_file);
            if !layout_path.exists() {
                return Err(ConfigError::Config(format!(
                    "Layout file not found: {}",
                    layout_path.display()
                )));
            }
            config.layouts.push(FormLayout::from_file(&layout_path)?);
        }

        // Load access rules
        if let Some(rules_file) = &config.access_rules_file {
            let rules_path = resolve_path(&base_dir, rules_file);
            if rules_path.exists() {
                config
                    .access_rules
                    .extend(FieldAccessRule::list_from_file(&rules_path)?);
            } else {
                return Err(ConfigError::Config(format!(
                    "Access rules file not found: {}",
                    rules_path.display()
                )));
            }
        }

        config.layouts.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(config)
    }

    /// Get a layout by id.
    pub fn get_layout(&self, id: &str) -> Option<&FormLayout> {
        self.layouts.iter().find(|l| l.id == id)
    }

    /// Layouts targeting a screen type.
    pub fn layouts_for(&self, screen_type: ScreenType) -> Vec<&FormLayout> {
        self.layouts
            .iter()
            .filter(|l| l.screen_type == screen_type)
            .collect()
    }
}

/// Resolve a possibly relative path against the config directory.
pub fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// YAML files directly inside a directory, sorted by file name.
pub fn yaml_files_in(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
