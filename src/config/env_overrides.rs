use super::Config;

impl Config {
    /// Apply `STEPWISE_*` environment variables on top of the file values.
    /// Empty or unparsable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = std::env::var("STEPWISE_GATE_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.gate.endpoint = endpoint;
        }

        if let Ok(enabled) = std::env::var("STEPWISE_GATE_ENABLED")
            && let Some(enabled) = parse_bool(&enabled)
        {
            self.gate.enabled = enabled;
        }

        if let Ok(level) = std::env::var("STEPWISE_LOG_LEVEL")
            && !level.is_empty()
        {
            self.observability.log_level = level;
        }

        if let Ok(session) = std::env::var("STEPWISE_BROWSER_SESSION")
            && !session.is_empty()
        {
            self.browser.session_name = Some(session);
        }

        if let Ok(pause) = std::env::var("STEPWISE_ACTION_PAUSE_MS")
            && let Ok(pause) = pause.parse::<u64>()
        {
            self.executor.action_pause_ms = pause;
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
