mod env_overrides;
mod loader;
pub mod schema;
#[cfg(test)]
mod test_env;

pub use loader::{CONFIG_PATH_ENV, resolve_config_path};
pub use schema::{
    BotConfig, CompiledReplacement, Config, DEFAULT_USER_AGENT, LinkListenerConfig, MatrixConfig,
    Presence, SiteReplacement,
};
