//! Session configuration loaded via OrthoConfig.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::DEFAULT_TOKEN_TTL_HOURS;
use crate::domain::SessionPolicy;
use crate::domain::ports::DEFAULT_SHARED_SECRET;

const DEFAULT_LOGIN_LATENCY_MS: u64 = 1000;
const DEFAULT_UPDATE_LATENCY_MS: u64 = 500;
const DEFAULT_STATE_DIR: &str = ".clinic-session";

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// Tokens must stay valid for at least one hour.
    #[error("token_ttl_hours must be positive, got {hours}")]
    NonPositiveTtl { hours: i64 },
}

/// Configuration values controlling token lifetime, latency, and storage.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CLINIC_SESSION")]
pub struct SessionSettings {
    /// Validity window of issued tokens, in hours.
    pub token_ttl_hours: Option<i64>,
    /// Simulated login round trip, in milliseconds.
    pub login_latency_ms: Option<u64>,
    /// Simulated profile update round trip, in milliseconds.
    pub update_latency_ms: Option<u64>,
    /// Secret every fixture principal logs in with.
    pub shared_secret: Option<String>,
    /// Directory holding the persisted session entries.
    pub state_dir: Option<PathBuf>,
    /// Principal records to load instead of the bundled set.
    pub directory_path: Option<PathBuf>,
}

impl SessionSettings {
    /// Token validity window, falling back to 24 hours.
    pub fn token_ttl_hours(&self) -> i64 {
        self.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS)
    }

    /// Login latency, falling back to one second.
    pub fn login_latency(&self) -> Duration {
        Duration::from_millis(self.login_latency_ms.unwrap_or(DEFAULT_LOGIN_LATENCY_MS))
    }

    /// Profile update latency, falling back to half a second.
    pub fn update_latency(&self) -> Duration {
        Duration::from_millis(self.update_latency_ms.unwrap_or(DEFAULT_UPDATE_LATENCY_MS))
    }

    /// Configured shared secret, falling back to the fixture secret.
    pub fn shared_secret(&self) -> Zeroizing<String> {
        Zeroizing::new(
            self.shared_secret
                .clone()
                .unwrap_or_else(|| DEFAULT_SHARED_SECRET.to_owned()),
        )
    }

    /// State directory, falling back to `.clinic-session` under the working
    /// directory.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
    }

    /// Timing policy for the session store.
    pub fn policy(&self) -> Result<SessionPolicy, SettingsError> {
        let hours = self.token_ttl_hours();
        if hours <= 0 {
            return Err(SettingsError::NonPositiveTtl { hours });
        }
        let token_ttl = TimeDelta::try_hours(hours).unwrap_or(TimeDelta::MAX);
        Ok(SessionPolicy {
            token_ttl,
            login_latency: self.login_latency(),
            update_latency: self.update_latency(),
        })
    }
}

impl fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSettings")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("login_latency_ms", &self.login_latency_ms)
            .field("update_latency_ms", &self.update_latency_ms)
            .field(
                "shared_secret",
                &self.shared_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("state_dir", &self.state_dir)
            .field("directory_path", &self.directory_path)
            .finish()
    }
}
