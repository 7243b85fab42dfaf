//! Process configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use quizforge_room::{BotConfig, QuestionBank, RegistryConfig, RoomConfig};

use crate::{DEFAULT_BIND_ADDR, QuizServerBuilder, QuizforgeError};

/// Listen address.
pub const ENV_BIND: &str = "QUIZFORGE_BIND";
/// Path to a JSON question file.
pub const ENV_QUESTIONS: &str = "QUIZFORGE_QUESTIONS";
/// Seconds per question.
pub const ENV_TIME_LIMIT_SECS: &str = "QUIZFORGE_TIME_LIMIT_SECS";
/// `true`/`false`: add the synthetic participant to new rooms.
pub const ENV_BOT: &str = "QUIZFORGE_BOT";

/// Everything the binary needs to build a server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// JSON question file; the built-in bank is used when `None`.
    pub questions: Option<PathBuf>,
    pub room: RoomConfig,
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND_ADDR.to_string(),
            questions: None,
            room: RoomConfig::default(),
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the `QUIZFORGE_*` environment variables. Unset variables keep
    /// their defaults; malformed ones are an error.
    pub fn from_env() -> Result<Self, QuizforgeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, QuizforgeError> {
        let mut config = Self::default();

        if let Some(bind) = lookup(ENV_BIND) {
            config.bind = bind;
        }
        if let Some(path) = lookup(ENV_QUESTIONS) {
            config.questions = Some(PathBuf::from(path));
        }
        if let Some(secs) = lookup(ENV_TIME_LIMIT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                QuizforgeError::Config(format!("{ENV_TIME_LIMIT_SECS} must be a number, got {secs:?}"))
            })?;
            if secs == 0 {
                return Err(QuizforgeError::Config(format!(
                    "{ENV_TIME_LIMIT_SECS} must be at least 1"
                )));
            }
            config.room.time_limit = Duration::from_secs(secs);
        }
        if let Some(flag) = lookup(ENV_BOT) {
            config.room.bot = match flag.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(BotConfig::default()),
                "false" | "0" | "no" | "off" => None,
                _ => {
                    return Err(QuizforgeError::Config(format!(
                        "{ENV_BOT} must be true or false, got {flag:?}"
                    )));
                }
            };
        }

        Ok(config)
    }

    /// Loads the question bank this config points at.
    pub fn question_bank(&self) -> Result<QuestionBank, QuizforgeError> {
        match &self.questions {
            Some(path) => Ok(QuestionBank::load_json(path)?),
            None => Ok(QuestionBank::builtin()),
        }
    }

    /// A server builder carrying this configuration.
    pub fn builder(&self) -> Result<QuizServerBuilder, QuizforgeError> {
        Ok(QuizServerBuilder::new()
            .bind(&self.bind)
            .room_config(self.room.clone())
            .registry_config(self.registry.clone())
            .question_bank(self.question_bank()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind, "0.0.0.0:50000");
        assert!(config.questions.is_none());
        assert_eq!(config.room.time_limit, Duration::from_secs(10));
        assert!(config.room.bot.is_some());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            (ENV_BIND, "127.0.0.1:4000"),
            (ENV_QUESTIONS, "/tmp/q.json"),
            (ENV_TIME_LIMIT_SECS, "20"),
            (ENV_BOT, "false"),
        ]))
        .unwrap();
        assert_eq!(config.bind, "127.0.0.1:4000");
        assert_eq!(config.questions, Some(PathBuf::from("/tmp/q.json")));
        assert_eq!(config.room.time_limit, Duration::from_secs(20));
        assert!(config.room.bot.is_none());
    }

    #[test]
    fn test_malformed_values_rejected() {
        for vars in [
            [(ENV_TIME_LIMIT_SECS, "soon")],
            [(ENV_TIME_LIMIT_SECS, "0")],
            [(ENV_BOT, "maybe")],
        ] {
            let result = ServerConfig::from_lookup(lookup(&vars));
            assert!(matches!(result, Err(QuizforgeError::Config(_))), "{vars:?}");
        }
    }

    #[test]
    fn test_builtin_bank_without_file() {
        let bank = ServerConfig::default().question_bank().unwrap();
        assert_eq!(bank.len(), QuestionBank::builtin().len());
    }

    #[test]
    fn test_missing_question_file_is_an_error() {
        let config = ServerConfig {
            questions: Some(PathBuf::from("/definitely/not/here.json")),
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.question_bank(),
            Err(QuizforgeError::Questions(_))
        ));
    }
}
