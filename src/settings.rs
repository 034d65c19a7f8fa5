use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// SQLite file, created on first start.
    pub database_path: String,
    pub listen_addr: String,
}

impl Settings {
    /// Reads `.env` if present, then `TRIVIA_*` variables over the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_env(Environment::with_prefix("TRIVIA"))
    }

    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("database_path", "trivia.db")?
            .set_default("listen_addr", "0.0.0.0:8080")?
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("TRIVIA").source(Some(source))
    }

    #[test]
    fn defaults_apply_without_env() {
        let settings = Settings::from_env(env_of(&[])).unwrap();
        assert_eq!(settings.database_path, "trivia.db");
        assert_eq!(settings.listen_addr, "0.0.0.0:8080");
    }

    #[test]
    fn env_overrides_defaults() {
        let settings = Settings::from_env(env_of(&[
            ("TRIVIA_DATABASE_PATH", "/tmp/quiz.db"),
            ("TRIVIA_LISTEN_ADDR", "127.0.0.1:5000"),
        ]))
        .unwrap();
        assert_eq!(settings.database_path, "/tmp/quiz.db");
        assert_eq!(settings.listen_addr, "127.0.0.1:5000");
    }
}
