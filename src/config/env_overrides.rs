use super::schema::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(homeserver) = std::env::var("PREVIEW_BOT_HOMESERVER")
            && !homeserver.is_empty()
        {
            self.matrix.homeserver = homeserver;
        }

        if let Ok(token) = std::env::var("PREVIEW_BOT_ACCESS_TOKEN")
            && !token.is_empty()
        {
            self.matrix.access_token = token;
        }

        if let Ok(agent) = std::env::var("PREVIEW_BOT_USER_AGENT")
            && !agent.is_empty()
        {
            self.url_preview_bot.user_agent = agent;
        }

        if let Ok(level) = std::env::var("PREVIEW_BOT_LOG")
            && !level.is_empty()
        {
            self.log_level = level;
        }
    }
}
