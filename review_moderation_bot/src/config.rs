use std::{fs, path::PathBuf};

use teloxide::types::UserId;

use crate::error::ConfigError;

const DEFAULT_DATA_FILE: &str = "bot_data.json";

/// Everything the bot needs to know before it can start.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    /// The one user allowed into the admin panel.
    pub admin_id: UserId,
    pub data_file: PathBuf,
}

impl Config {
    /// Load the config from the environment, after reading `.env` if there is one.
    ///
    /// If `BOT_TOKEN` is not set, the token is read from the `key` file
    /// (`key_debug` in debug builds).
    pub fn from_env() -> Result<Config, ConfigError> {
        if let Err(e) = dotenv::dotenv() {
            log::debug!("No .env file loaded: {e}");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let token = match lookup("BOT_TOKEN") {
            Some(token) => token,
            None => {
                let key_file = match cfg!(debug_assertions) {
                    true => "key_debug",
                    false => "key",
                };
                fs::read_to_string(key_file).map_err(|_| ConfigError::MissingToken)?
            }
        };
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        let admin_id = lookup("ADMIN_ID").ok_or(ConfigError::MissingAdmin)?;
        let admin_id = admin_id
            .trim()
            .parse()
            .map(UserId)
            .map_err(|_| ConfigError::BadAdmin(admin_id))?;

        let data_file = lookup("DATA_FILE")
            .filter(|x| !x.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string())
            .into();

        Ok(Config {
            token,
            admin_id,
            data_file,
        })
    }

    #[must_use]
    pub fn is_admin(&self, user: UserId) -> bool {
        user == self.admin_id
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn lookup_from(
        pairs: &'static [(&'static str, &'static str)],
    ) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn reads_everything() {
        let config = Config::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "123:abc\n"),
            ("ADMIN_ID", "42"),
            ("DATA_FILE", "/tmp/reviews.json"),
        ]))
        .unwrap();

        assert_eq!(config.token, "123:abc");
        assert_eq!(config.admin_id, UserId(42));
        assert_eq!(config.data_file, PathBuf::from("/tmp/reviews.json"));
        assert!(config.is_admin(UserId(42)));
        assert!(!config.is_admin(UserId(43)));
    }

    #[test]
    fn data_file_has_a_default() {
        let config =
            Config::from_lookup(lookup_from(&[("BOT_TOKEN", "t"), ("ADMIN_ID", "1")])).unwrap();
        assert_eq!(config.data_file, PathBuf::from(DEFAULT_DATA_FILE));
    }

    #[test]
    fn admin_is_required() {
        let err = Config::from_lookup(lookup_from(&[("BOT_TOKEN", "t")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingAdmin));

        let err = Config::from_lookup(lookup_from(&[("BOT_TOKEN", "t"), ("ADMIN_ID", "lol")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::BadAdmin(x) if x == "lol"));
    }
}
