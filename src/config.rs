use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::chat::TypingDelay;
use crate::storage::FileStore;

/// Runtime settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Directory holding favorites, completions and per-recipe progress
    #[arg(long, env = "SECRET_SAUCE_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Recipe catalog JSON file (uses the built-in catalog when unset)
    #[arg(long, env = "SECRET_SAUCE_CATALOG", global = true)]
    pub catalog: Option<PathBuf>,

    /// Seed for reproducible roulette spins and chat replies
    #[arg(long, env = "SECRET_SAUCE_SEED", global = true)]
    pub seed: Option<u64>,

    /// Shortest simulated typing delay before a chat reply, in milliseconds
    #[arg(long, env = "SECRET_SAUCE_TYPING_MIN_MS", default_value_t = 1000, global = true)]
    pub typing_min_ms: u64,

    /// Longest simulated typing delay before a chat reply, in milliseconds
    #[arg(long, env = "SECRET_SAUCE_TYPING_MAX_MS", default_value_t = 2000, global = true)]
    pub typing_max_ms: u64,

    /// How long the roulette wheel spins before settling, in milliseconds
    #[arg(long, env = "SECRET_SAUCE_SPIN_MS", default_value_t = 2000, global = true)]
    pub spin_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            catalog: None,
            seed: None,
            typing_min_ms: 1000,
            typing_max_ms: 2000,
            spin_ms: 2000,
        }
    }
}

impl Settings {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(FileStore::default_root)
    }

    pub fn typing_delay(&self) -> TypingDelay {
        TypingDelay {
            min: Duration::from_millis(self.typing_min_ms),
            max: Duration::from_millis(self.typing_max_ms),
        }
    }

    pub fn spin_duration(&self) -> Duration {
        Duration::from_millis(self.spin_ms)
    }

    /// Validate CLI/environment-derived settings.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(dir) = &self.data_dir {
            if dir.as_os_str().is_empty() {
                return Err("SECRET_SAUCE_DATA_DIR cannot be empty".to_string());
            }
        }
        if let Some(path) = &self.catalog {
            if path.as_os_str().is_empty() {
                return Err("SECRET_SAUCE_CATALOG cannot be empty".to_string());
            }
        }
        if self.typing_min_ms > self.typing_max_ms {
            return Err(format!(
                "SECRET_SAUCE_TYPING_MIN_MS ({}) is greater than SECRET_SAUCE_TYPING_MAX_MS ({})",
                self.typing_min_ms, self.typing_max_ms
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.typing_delay(), TypingDelay::default());
        assert_eq!(settings.spin_duration(), Duration::from_secs(2));
        assert!(settings.data_dir().ends_with("secret-sauce"));
    }

    #[test]
    fn inverted_typing_range_is_rejected() {
        let settings = Settings {
            typing_min_ms: 3000,
            ..Settings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.contains("SECRET_SAUCE_TYPING_MIN_MS"));
    }

    #[test]
    fn empty_data_dir_is_rejected() {
        let settings = Settings {
            data_dir: Some(PathBuf::new()),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
