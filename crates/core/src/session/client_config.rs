use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_ATTEMPTS, DEFAULT_MIN_RETRY_DELAY, DETECTION_DEADLINE,
    DETECTION_POLL_INTERVAL, DETECTION_POLL_MAX_INTERVAL, REGISTRATION_DEADLINE,
    REGISTRATION_POLL_INTERVAL,
};
use crate::shared::poll::PollPolicy;
use crate::shared::request_mode::RequestMode;

/// Tunables of a client session. Fields missing from a config file keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub registration_poll_ms: u64,
    pub registration_deadline_ms: u64,
    pub detection_poll_ms: u64,
    pub detection_poll_max_ms: u64,
    pub detection_deadline_ms: u64,
    pub max_attempts: u32,
    pub min_retry_delay_ms: u64,
    pub embedding_dim: usize,
    pub mode: RequestMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            registration_poll_ms: REGISTRATION_POLL_INTERVAL.as_millis() as u64,
            registration_deadline_ms: REGISTRATION_DEADLINE.as_millis() as u64,
            detection_poll_ms: DETECTION_POLL_INTERVAL.as_millis() as u64,
            detection_poll_max_ms: DETECTION_POLL_MAX_INTERVAL.as_millis() as u64,
            detection_deadline_ms: DETECTION_DEADLINE.as_millis() as u64,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_retry_delay_ms: DEFAULT_MIN_RETRY_DELAY.as_millis() as u64,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            mode: RequestMode::Identify,
        }
    }
}

impl ClientConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("face-dispatch").join("client.json"))
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Reads the per-user config file, falling back to defaults when it is
    /// missing or unreadable.
    pub fn load_or_default() -> Self {
        Self::config_path()
            .filter(|path| path.exists())
            .and_then(|path| match Self::load(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    log::warn!("Ignoring config {}: {e}", path.display());
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn registration_policy(&self) -> PollPolicy {
        PollPolicy::fixed(
            Duration::from_millis(self.registration_poll_ms),
            Duration::from_millis(self.registration_deadline_ms),
        )
    }

    pub fn detection_policy(&self) -> PollPolicy {
        PollPolicy::with_backoff(
            Duration::from_millis(self.detection_poll_ms),
            Duration::from_millis(self.detection_poll_max_ms),
            Duration::from_millis(self.detection_deadline_ms),
        )
    }

    pub fn min_retry_delay(&self) -> Duration {
        Duration::from_millis(self.min_retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_protocol_timing() {
        let config = ClientConfig::default();
        let registration = config.registration_policy();
        assert_eq!(registration.interval, Duration::from_millis(100));
        assert_eq!(registration.max_interval, Duration::from_millis(100));
        assert_eq!(registration.deadline, Duration::from_secs(10));
        assert_eq!(config.detection_policy().interval, Duration::from_millis(1));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_attempts": 2, "mode": "embed"}}"#).unwrap();
        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.mode, RequestMode::Embed);
        assert_eq!(config.embedding_dim, DEFAULT_EMBEDDING_DIM);
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = ClientConfig {
            min_retry_delay_ms: 250,
            ..ClientConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<ClientConfig>(&json).unwrap(), config);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"mode": "classify"}}"#).unwrap();
        assert!(ClientConfig::load(file.path()).is_err());
    }
}
