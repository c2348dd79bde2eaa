//! Configuration handling for the template run.
//! Every value has a default, so a missing configuration file is not an
//! error. Supports JSON and YAML formats (mocra.json, mocra.yml, mocra.yaml).

use crate::error::{Error, Result};
use cruet::Inflector;
use log::debug;
use serde::Deserialize;
use std::path::Path;

/// Supported configuration file names, in lookup order
pub const CONFIG_FILES: [&str; 3] = ["mocra.json", "mocra.yml", "mocra.yaml"];

pub const DEFAULT_APP_NAME: &str = "rails-templates";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
    /// Short application name, used as DNS label and repository name
    pub app_name: String,
    pub domain: String,
    pub organization: String,
    pub organization_url: String,
    /// Description sent along with the OAuth application registration
    pub description: String,
    pub slice_list_command: String,
    pub github_user_command: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            domain: "mocra.com".to_string(),
            organization: "Mocra".to_string(),
            organization_url: "http://mocra.com".to_string(),
            description: "This is a cool app".to_string(),
            slice_list_command: "slicehost-slice list".to_string(),
            github_user_command: "git config --get github.user".to_string(),
        }
    }
}

impl TemplateConfig {
    /// Human readable title, `rails-templates` becomes `Rails Templates`.
    pub fn app_title(&self) -> String {
        self.app_name.to_title_case()
    }

    /// Public URL the application will be served from.
    pub fn app_url(&self) -> String {
        format!("http://{}.{}", self.app_name, self.domain)
    }

    pub fn app_host(&self) -> String {
        format!("{}.{}", self.app_name, self.domain)
    }
}

/// Parses configuration content, trying JSON first and YAML second.
pub fn parse_config(content: &str) -> Result<TemplateConfig> {
    if content.trim().is_empty() {
        return Ok(TemplateConfig::default());
    }
    match serde_json::from_str(content) {
        Ok(config) => Ok(config),
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration format: {e}"))),
    }
}

/// Loads the configuration of an application directory.
///
/// The first existing file from [`CONFIG_FILES`] wins. Without one the
/// defaults are used, with `app_name` taken from the directory name.
pub fn get_config<P: AsRef<Path>>(app_dir: P) -> Result<TemplateConfig> {
    let app_dir = app_dir.as_ref();
    for file in CONFIG_FILES {
        let config_path = app_dir.join(file);
        if config_path.exists() {
            return load_config_file(&config_path);
        }
    }

    debug!("No configuration file in {}, using defaults", app_dir.display());
    let mut config = TemplateConfig::default();
    if let Some(name) = app_name_from_dir(app_dir) {
        config.app_name = name;
    }
    Ok(config)
}

pub fn load_config_file<P: AsRef<Path>>(config_path: P) -> Result<TemplateConfig> {
    let config_path = config_path.as_ref();
    debug!("Loading configuration from {}", config_path.display());
    let content = std::fs::read_to_string(config_path).map_err(Error::IoError)?;
    parse_config(&content)
}

fn app_name_from_dir(app_dir: &Path) -> Option<String> {
    let dir = if app_dir.as_os_str().is_empty() || app_dir == Path::new(".") {
        std::env::current_dir().ok()?
    } else {
        app_dir.to_path_buf()
    };
    dir.file_name().and_then(|n| n.to_str()).map(str::to_string)
}
