//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use super::validation::ConfigIssue;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Project-level config file names, checked in order.
const PROJECT_FILES: &[&str] = &["medqa.toml", ".medqa.toml"];

/// Prefix of environment overrides, e.g. `MEDQA_RUN__TIMEOUT_SECONDS=60`.
pub const ENV_PREFIX: &str = "MEDQA_";

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
        .map(|issue| format!("  - {}", issue))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (`MEDQA_SECTION__KEY`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./medqa.toml` or `./.medqa.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/medqa-bench/config.toml`
    /// 5. Default values
    ///
    /// CLI flags are applied on top by the caller.
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// Load and validate. Warnings are logged; any error-level issue fails.
    pub fn load_validated(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let config = Self::load(config_path)?;
        Self::check(&config)?;
        Ok(config)
    }

    /// Validate an already merged config (e.g. after CLI overrides).
    pub fn check(config: &FileConfig) -> Result<(), ConfigError> {
        let issues = config.validate();
        for issue in issues.iter().filter(|i| !i.is_error()) {
            warn!("{}", issue.message);
        }
        if issues.iter().any(ConfigIssue::is_error) {
            return Err(ConfigError::Invalid(issues));
        }
        Ok(())
    }

    fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns `$XDG_CONFIG_HOME/medqa-bench/config.toml` if set,
    /// otherwise the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("medqa-bench").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for `--show-config`)
    pub fn print_config_sources(config_path: Option<&Path>) {
        println!("Configuration sources (in priority order):");
        println!("  [ env ] Environment: {}*  (nested keys separated by __)", ENV_PREFIX);

        if let Some(path) = config_path {
            let marker = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{:^5}] Explicit: {}", marker, path.display());
        }

        match Self::project_config_path() {
            Some(path) => println!("  [FOUND] Project: {}", path.display()),
            None => println!("  [     ] Project: ./medqa.toml or ./.medqa.toml"),
        }

        if let Some(path) = Self::global_config_path() {
            let marker = if path.exists() { "FOUND" } else { "     " };
            println!("  [{}] Global:  {}", marker, path.display());
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.backend.provider, "ollama");
        assert_eq!(config.run.timeout_seconds, 30);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("medqa-bench"));
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[run]\ntimeout_seconds = 90\n\n[debate]\nrounds = 4").unwrap();

        let config = ConfigLoader::load(Some(file.path())).unwrap();
        assert_eq!(config.run.timeout_seconds, 90);
        assert_eq!(config.debate.rounds, 4);
        assert_eq!(config.run.max_retries, 1);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[parallel]\nbranches = 0").unwrap();

        let err = ConfigLoader::load_validated(Some(file.path())).unwrap_err();
        match err {
            ConfigError::Invalid(issues) => {
                assert_eq!(issues.len(), 1);
                assert!(issues[0].message.contains("parallel.branches"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
