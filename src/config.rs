//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::state::DEFAULT_COMMAND_TIMEOUT;

/// Wake phrase used when none is configured
pub const DEFAULT_WAKE_PHRASE: &str = "hey trushna";

const WAKE_PHRASE_VAR: &str = "TRUSHNA_WAKE_PHRASE";
const COMMAND_TIMEOUT_VAR: &str = "TRUSHNA_COMMAND_TIMEOUT_MS";
const SOCKET_VAR: &str = "TRUSHNA_SOCKET";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Wake phrase, `None` when every final result counts as a command
    pub wake_phrase: Option<String>,

    /// How long to wait for a command after a bare wake phrase
    pub command_timeout: Duration,

    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = lookup("HOME").context("HOME is not set")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("trushna");

        let socket_path = lookup(SOCKET_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        // An empty value disables the wake phrase entirely
        let wake_phrase = match lookup(WAKE_PHRASE_VAR) {
            Some(phrase) if phrase.trim().is_empty() => None,
            Some(phrase) => Some(phrase.trim().to_string()),
            None => Some(DEFAULT_WAKE_PHRASE.to_string()),
        };

        let command_timeout = match lookup(COMMAND_TIMEOUT_VAR) {
            Some(raw) => {
                let millis: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid {COMMAND_TIMEOUT_VAR}: {raw:?}"))?;
                if millis == 0 {
                    bail!("{COMMAND_TIMEOUT_VAR} must be greater than zero");
                }
                Duration::from_millis(millis)
            }
            None => DEFAULT_COMMAND_TIMEOUT,
        };

        Ok(Self {
            wake_phrase,
            command_timeout,
            socket_path,
            data_dir,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("HOME", "/home/ada")]).unwrap();
        assert_eq!(config.wake_phrase.as_deref(), Some("hey trushna"));
        assert_eq!(config.command_timeout, Duration::from_millis(7000));
        assert_eq!(
            config.socket_path,
            PathBuf::from("/home/ada/.local/share/trushna/daemon.sock")
        );
        assert_eq!(config.data_dir, PathBuf::from("/home/ada/.local/share/trushna"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HOME", "/home/ada"),
            ("TRUSHNA_WAKE_PHRASE", " ok computer "),
            ("TRUSHNA_COMMAND_TIMEOUT_MS", "2500"),
            ("TRUSHNA_SOCKET", "/tmp/trushna.sock"),
        ])
        .unwrap();
        assert_eq!(config.wake_phrase.as_deref(), Some("ok computer"));
        assert_eq!(config.command_timeout, Duration::from_millis(2500));
        assert_eq!(config.socket_path, PathBuf::from("/tmp/trushna.sock"));
    }

    #[test]
    fn test_empty_wake_phrase_disables_it() {
        let config = load(&[("HOME", "/home/ada"), ("TRUSHNA_WAKE_PHRASE", "")]).unwrap();
        assert_eq!(config.wake_phrase, None);
    }

    #[test]
    fn test_invalid_timeout() {
        let err = load(&[("HOME", "/home/ada"), ("TRUSHNA_COMMAND_TIMEOUT_MS", "soon")])
            .unwrap_err();
        assert!(err.to_string().contains("TRUSHNA_COMMAND_TIMEOUT_MS"));

        assert!(load(&[("HOME", "/home/ada"), ("TRUSHNA_COMMAND_TIMEOUT_MS", "0")]).is_err());
    }

    #[test]
    fn test_missing_home() {
        assert!(load(&[]).is_err());
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().to_string_lossy().to_string();
        let config = load(&[("HOME", home.as_str())]).unwrap();

        config.ensure_dirs().unwrap();
        assert!(config.data_dir.is_dir());
    }
}
