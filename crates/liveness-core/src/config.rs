use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Reference thresholds. These are tunable starting points, validated
/// empirically, not calibrated constants.
pub const DEFAULT_EAR_THRESHOLD: f64 = 0.2;
pub const DEFAULT_MAR_THRESHOLD: f64 = 0.6;
pub const DEFAULT_YAW_THRESHOLD_DEG: f64 = 30.0;
pub const DEFAULT_PITCH_THRESHOLD_DEG: f64 = 30.0;
pub const DEFAULT_COOLDOWN_MS: u64 = 2000;
const MAX_COOLDOWN_MS: u64 = 60_000;

/// Camera facing preference. Forwarded to the capture side; the core only
/// uses it to pick the default mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    Front,
    Rear,
}

/// Per-action detection thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Blink is credited when EAR drops below this.
    pub ear: f64,
    /// Open mouth is credited when MAR rises above this.
    pub mar: f64,
    /// Shake head is credited when |yaw| exceeds this many degrees.
    pub yaw_deg: f64,
    /// Nod is credited when |pitch| exceeds this many degrees.
    pub pitch_deg: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            ear: DEFAULT_EAR_THRESHOLD,
            mar: DEFAULT_MAR_THRESHOLD,
            yaw_deg: DEFAULT_YAW_THRESHOLD_DEG,
            pitch_deg: DEFAULT_PITCH_THRESHOLD_DEG,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("ear", self.ear, |v| v > 0.0 && v < 1.0, "0 < ear < 1")?;
        check("mar", self.mar, |v| v > 0.0, "mar > 0")?;
        check(
            "yaw_deg",
            self.yaw_deg,
            |v| v > 0.0 && v < 90.0,
            "0 < yaw_deg < 90",
        )?;
        check(
            "pitch_deg",
            self.pitch_deg,
            |v| v > 0.0 && v < 90.0,
            "0 < pitch_deg < 90",
        )?;
        Ok(())
    }
}

fn check(
    name: &'static str,
    value: f64,
    ok: impl Fn(f64) -> bool,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if value.is_finite() && ok(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold {
            name,
            value,
            expected,
        })
    }
}

/// Session configuration, accepted at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub facing: Facing,
    pub thresholds: Thresholds,
    /// Pause after a completed challenge during which nothing is detected.
    pub cooldown_ms: u64,
    /// Mirror x before scaling. Unset means "mirror when facing front".
    pub mirror: Option<bool>,
    /// Require the 10 refined iris landmarks (478-point mesh).
    pub require_iris: bool,
    /// Seed for challenge selection; unset draws from OS entropy.
    pub seed: Option<u64>,
    /// Minimum mean eye displacement (pixels/frame) for a challenge to be
    /// credited. Unset disables the motion gate.
    pub min_eye_motion: Option<f64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            facing: Facing::Front,
            thresholds: Thresholds::default(),
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            mirror: None,
            require_iris: true,
            seed: None,
            min_eye_motion: None,
        }
    }
}

impl SessionConfig {
    /// Defaults, then the optional TOML file, then `LIVENESS_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        tracing::debug!(?config, "session configuration loaded");
        Ok(config)
    }

    /// Parse a TOML file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from `LIVENESS_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Override fields from an arbitrary key lookup. Unparseable values are
    /// ignored with a warning.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let t = &mut self.thresholds;
        t.ear = parse_or(&lookup, "LIVENESS_EAR_THRESHOLD", t.ear);
        t.mar = parse_or(&lookup, "LIVENESS_MAR_THRESHOLD", t.mar);
        t.yaw_deg = parse_or(&lookup, "LIVENESS_YAW_THRESHOLD", t.yaw_deg);
        t.pitch_deg = parse_or(&lookup, "LIVENESS_PITCH_THRESHOLD", t.pitch_deg);
        self.cooldown_ms = parse_or(&lookup, "LIVENESS_COOLDOWN_MS", self.cooldown_ms);

        if let Some(v) = lookup("LIVENESS_MIRROR") {
            self.mirror = Some(v != "0");
        }
        if let Some(v) = lookup("LIVENESS_SEED") {
            match v.parse() {
                Ok(seed) => self.seed = Some(seed),
                Err(_) => tracing::warn!(key = "LIVENESS_SEED", value = %v, "ignoring unparseable value"),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        if self.cooldown_ms > MAX_COOLDOWN_MS {
            return Err(ConfigError::InvalidCooldown(self.cooldown_ms));
        }
        if let Some(m) = self.min_eye_motion {
            if !m.is_finite() || m < 0.0 {
                return Err(ConfigError::InvalidEyeMotion(m));
            }
        }
        Ok(())
    }

    /// Effective mirroring: explicit setting, else mirror the front camera.
    pub fn mirror(&self) -> bool {
        self.mirror.unwrap_or(self.facing == Facing::Front)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "ignoring unparseable value");
                default
            }
        },
        None => default,
    }
}
