use std::path::PathBuf;

use tracing::warn;

use crate::lifecycle::CompletionPolicy;
use crate::projector::DEFAULT_HORIZON_DAYS;

/// How a regeneration treats the occurrence set it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegenerationPolicy {
    /// Discard everything, including assignments on still-future occurrences.
    #[default]
    FullReplace,
    /// Carry assignments over to occurrences whose id survives.
    Reconcile,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub horizon_days: i64,
    pub user: String,
    pub regeneration: RegenerationPolicy,
    pub completion: CompletionPolicy,
}

impl Config {
    /// Reads `CHOREBOARD_*` variables on top of the defaults. Malformed values
    /// are reported and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("CHOREBOARD_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(horizon) = std::env::var("CHOREBOARD_HORIZON_DAYS") {
            match horizon.trim().parse::<i64>() {
                Ok(value) if value > 0 => config.horizon_days = value,
                _ => warn!(value = %horizon, "ignoring invalid CHOREBOARD_HORIZON_DAYS"),
            }
        }
        if let Ok(user) = std::env::var("CHOREBOARD_USER") {
            if !user.trim().is_empty() {
                config.user = user.trim().to_string();
            }
        }
        if let Ok(policy) = std::env::var("CHOREBOARD_REGENERATION") {
            match policy.trim().to_lowercase().as_str() {
                "replace" => config.regeneration = RegenerationPolicy::FullReplace,
                "reconcile" => config.regeneration = RegenerationPolicy::Reconcile,
                _ => warn!(value = %policy, "ignoring invalid CHOREBOARD_REGENERATION"),
            }
        }
        if let Ok(strict) = std::env::var("CHOREBOARD_STRICT_COMPLETION") {
            let strict = matches!(strict.trim().to_lowercase().as_str(), "1" | "true" | "yes");
            config.completion.allow_from_pending = !strict;
        }
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            user: "user_1".to_string(),
            regeneration: RegenerationPolicy::default(),
            completion: CompletionPolicy::default(),
        }
    }
}

/// `~/.local/share/choreboard` on Linux, falling back to the working directory.
fn default_data_dir() -> PathBuf {
    let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("choreboard");
    p
}
