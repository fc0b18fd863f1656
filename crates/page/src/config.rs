use std::path::{Path, PathBuf};
use std::time::Duration;

use net::NetConfig;
use serde::Deserialize;
use thiserror::Error;

pub const GENERIC_ERROR: &str = "Something went wrong ...";

/// Timing and behavior knobs for one page. Every field has a default.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Delay before a navigation asks for the loading indicator.
    pub nav_grace_ms: u64,
    /// Delay between the indicator's first `start` and the overlay appearing.
    pub indicator_grace_ms: u64,
    pub indicator_fade_ms: u64,
    pub toast_reveal_ms: u64,
    pub toast_dismiss_ms: u64,
    pub toast_fade_ms: u64,
    /// Intercept same-origin link clicks and navigate in place.
    pub smooth_nav: bool,
    pub generic_error: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            nav_grace_ms: 50,
            indicator_grace_ms: 120,
            indicator_fade_ms: 160,
            toast_reveal_ms: 10,
            toast_dismiss_ms: 5000,
            toast_fade_ms: 300,
            smooth_nav: true,
            generic_error: GENERIC_ERROR.to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn nav_grace(&self) -> Duration {
        Duration::from_millis(self.nav_grace_ms)
    }

    pub fn indicator_grace(&self) -> Duration {
        Duration::from_millis(self.indicator_grace_ms)
    }

    pub fn indicator_fade(&self) -> Duration {
        Duration::from_millis(self.indicator_fade_ms)
    }

    pub fn toast_reveal(&self) -> Duration {
        Duration::from_millis(self.toast_reveal_ms)
    }

    pub fn toast_dismiss(&self) -> Duration {
        Duration::from_millis(self.toast_dismiss_ms)
    }

    pub fn toast_fade(&self) -> Duration {
        Duration::from_millis(self.toast_fade_ms)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The on-disk settings file: a `[page]` and a `[net]` table, both optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub page: RuntimeConfig,
    pub net: NetConfig,
}

impl Settings {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(src)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let s = Settings::from_toml_str("").unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.page.nav_grace(), Duration::from_millis(50));
        assert_eq!(s.page.indicator_grace(), Duration::from_millis(120));
        assert_eq!(s.page.generic_error, GENERIC_ERROR);
    }

    #[test]
    fn partial_tables_override_only_named_fields() {
        let s = Settings::from_toml_str(
            "[page]\nnav_grace_ms = 5\nsmooth_nav = false\n\n[net]\ntimeout_secs = 3\n",
        )
        .unwrap();
        assert_eq!(s.page.nav_grace_ms, 5);
        assert!(!s.page.smooth_nav);
        assert_eq!(s.page.toast_dismiss_ms, 5000);
        assert_eq!(s.net.timeout_secs, 3);
        assert_eq!(s.net.user_agent, NetConfig::default().user_agent);
    }

    #[test]
    fn type_errors_are_reported() {
        let err = Settings::from_toml_str("[page]\nnav_grace_ms = \"soon\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Settings::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
