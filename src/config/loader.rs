use super::schema::{CompiledReplacement, Config, REQUIRED_SECTIONS};
use crate::error::ConfigError;
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable selecting an alternate config file.
pub const CONFIG_PATH_ENV: &str = "URL_PREVIEW_BOT_CONFIG_PATH";

const LOCAL_CONFIG_FILE: &str = "config.toml";
const HOME_CONFIG_DIR: &str = ".preview-bot";

/// Pick the config file: env override, then the CLI flag, then
/// `./config.toml`, then `~/.preview-bot/config.toml`.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = cli_path {
        return Ok(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Ok(local);
    }

    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .ok_or_else(|| ConfigError::Load("could not find home directory".into()))?;
    Ok(home.join(HOME_CONFIG_DIR).join(LOCAL_CONFIG_FILE))
}

impl Config {
    pub fn load(cli_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = resolve_config_path(cli_path)?;
        let mut config = Self::load_from_path(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(contents)
            .map_err(|e| ConfigError::Load(format!("failed to parse config: {e}")))?;

        for section in REQUIRED_SECTIONS {
            if !table.get(section).is_some_and(toml::Value::is_table) {
                return Err(ConfigError::MissingSection(section));
            }
        }

        table
            .try_into()
            .map_err(|e| ConfigError::Load(format!("failed to parse config: {e}")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.matrix.homeserver.trim().is_empty() {
            return Err(ConfigError::Validation(
                "matrix.homeserver must not be empty".into(),
            ));
        }
        if url::Url::parse(&self.matrix.homeserver).is_err() {
            return Err(ConfigError::Validation(format!(
                "matrix.homeserver is not a valid URL: {}",
                self.matrix.homeserver
            )));
        }
        if self.matrix.access_token.trim().is_empty() {
            return Err(ConfigError::Validation(
                "matrix.access_token must not be empty".into(),
            ));
        }
        if self.url_preview_bot.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "url_preview_bot.user_agent must not be empty".into(),
            ));
        }
        self.compiled_site_replacements()?;
        Ok(())
    }

    pub fn compiled_site_replacements(&self) -> Result<Vec<CompiledReplacement>, ConfigError> {
        self.url_preview_bot
            .site_replacements
            .iter()
            .map(super::schema::SiteReplacement::compile)
            .collect()
    }
}
