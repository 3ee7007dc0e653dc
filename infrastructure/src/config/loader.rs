//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use musing_domain::ConfigIssue;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PROJECT_FILES: [&str; 2] = ["musing.toml", ".musing.toml"];
const ENV_PREFIX: &str = "MUSING_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration:\n{}", format_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {}", issue.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Files and variables merged into one configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub global: Option<PathBuf>,
    pub project: Option<PathBuf>,
    pub explicit: Option<PathBuf>,
    /// Merge `MUSING_*` environment variables last
    pub env: bool,
}

impl ConfigSources {
    /// The standard search locations.
    pub fn discover(explicit: Option<&Path>) -> Self {
        Self {
            global: ConfigLoader::global_config_path().filter(|p| p.exists()),
            project: ConfigLoader::project_config_path(),
            explicit: explicit.map(Path::to_path_buf),
            env: true,
        }
    }

    fn figment(&self) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));
        for path in [&self.global, &self.project, &self.explicit]
            .into_iter()
            .flatten()
        {
            figment = figment.merge(Toml::file(path));
        }
        if self.env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }
        figment
    }
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `MUSING_*` environment variables (nested keys split on `__`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./musing.toml` or `./.musing.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/musing/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::load_from(&ConfigSources::discover(config_path))
    }

    pub fn load_from(sources: &ConfigSources) -> Result<FileConfig, Box<figment::Error>> {
        sources.figment().extract().map_err(Box::new)
    }

    /// Load and validate. Errors are fatal; warnings are returned.
    pub fn load_validated(
        config_path: Option<&Path>,
    ) -> Result<(FileConfig, Vec<ConfigIssue>), ConfigError> {
        let config = Self::load(config_path)?;
        Self::check(config)
    }

    /// Split validation issues into a fatal error or returned warnings.
    pub fn check(config: FileConfig) -> Result<(FileConfig, Vec<ConfigIssue>), ConfigError> {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            config.validate().into_iter().partition(ConfigIssue::is_error);
        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }
        Ok((config, warnings))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("musing").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources() {
        println!("Configuration sources (in priority order):");
        println!("  [     ] Env:     {ENV_PREFIX}* (nested keys split on '__')");

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./musing.toml or ./.musing.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }

    /// Render the effective configuration as TOML.
    pub fn render(config: &FileConfig) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(config)
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
