//! Cooldown guard over the persisted retrain state
//!
//! Missing, empty or unreadable state is treated as "never retrained"
//! (the permissive cooldown policy): availability of retraining wins over
//! throttling when the state cannot be trusted.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Persisted record of the last retraining trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainState {
    pub last_retrain: DateTime<Utc>,
}

/// Result of reading the state file
#[derive(Debug, Clone, PartialEq)]
pub enum RetrainStateLoad {
    Missing,
    Empty,
    Corrupt(String),
    Loaded(RetrainState),
}

impl RetrainStateLoad {
    /// Read and classify the state file; never fails
    pub fn read(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::Missing,
            Err(e) => return Self::Corrupt(e.to_string()),
        };

        let content = content.trim();
        if content.is_empty() {
            return Self::Empty;
        }

        match serde_json::from_str::<RetrainState>(content) {
            Ok(state) => Self::Loaded(state),
            Err(e) => Self::Corrupt(e.to_string()),
        }
    }

    /// Last trigger time, if the state is trustworthy
    pub fn last_retrain(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Loaded(state) => Some(state.last_retrain),
            _ => None,
        }
    }
}

/// Hours elapsed between `since` and `now`; negative when `since` is in the future
pub fn elapsed_hours(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - since).num_milliseconds() as f64 / 3_600_000.0
}

/// Whether a retrain may be triggered at `now`
pub fn can_retrain(state_path: &Path, cooldown_hours: f64, now: DateTime<Utc>) -> bool {
    if cooldown_hours <= 0.0 {
        return true;
    }

    let state = RetrainStateLoad::read(state_path);
    let last_retrain = match &state {
        RetrainStateLoad::Loaded(s) => s.last_retrain,
        RetrainStateLoad::Missing | RetrainStateLoad::Empty => {
            debug!(path = %state_path.display(), "No retrain state, cooldown not active");
            return true;
        }
        RetrainStateLoad::Corrupt(reason) => {
            warn!(path = %state_path.display(), %reason, "Unreadable retrain state, cooldown not active");
            return true;
        }
    };

    let elapsed = elapsed_hours(last_retrain, now);
    if elapsed < cooldown_hours {
        info!(
            elapsed_hours = elapsed,
            cooldown_hours,
            "Cooldown active ({:.2}h elapsed)",
            elapsed
        );
        return false;
    }

    true
}

/// Record `now` as the last retraining trigger, replacing any previous state
pub fn update_retrain_state(state_path: &Path, now: DateTime<Utc>) -> Result<()> {
    if let Some(parent) = state_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(state_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &RetrainState { last_retrain: now })?;
    writer.flush()?;

    info!(path = %state_path.display(), last_retrain = %now.to_rfc3339(), "Retrain state updated");
    Ok(())
}

/// Cooldown guard bound to a state file and interval
#[derive(Debug, Clone)]
pub struct CooldownGuard {
    state_path: PathBuf,
    cooldown_hours: f64,
}

impl CooldownGuard {
    pub fn new(state_path: impl Into<PathBuf>, cooldown_hours: f64) -> Self {
        Self {
            state_path: state_path.into(),
            cooldown_hours,
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn cooldown_hours(&self) -> f64 {
        self.cooldown_hours
    }

    pub fn can_retrain(&self, now: DateTime<Utc>) -> bool {
        can_retrain(&self.state_path, self.cooldown_hours, now)
    }

    pub fn record_retrain(&self, now: DateTime<Utc>) -> Result<()> {
        update_retrain_state(&self.state_path, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn state_file() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retrain_state.json");
        (dir, path)
    }

    #[test]
    fn test_can_retrain_when_no_state() {
        let (_dir, path) = state_file();
        assert!(can_retrain(&path, 24.0, Utc::now()));
    }

    #[test]
    fn test_can_retrain_when_state_empty() {
        let (_dir, path) = state_file();
        fs::write(&path, "  \n").unwrap();
        assert_eq!(RetrainStateLoad::read(&path), RetrainStateLoad::Empty);
        assert!(can_retrain(&path, 24.0, Utc::now()));
    }

    #[test]
    fn test_can_retrain_when_state_corrupt() {
        let (_dir, path) = state_file();
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(RetrainStateLoad::read(&path), RetrainStateLoad::Corrupt(_)));
        assert!(can_retrain(&path, 24.0, Utc::now()));

        fs::write(&path, r#"{"last_retrain": "yesterday"}"#).unwrap();
        assert!(can_retrain(&path, 24.0, Utc::now()));

        fs::write(&path, r#"{"something_else": 1}"#).unwrap();
        assert!(can_retrain(&path, 24.0, Utc::now()));
    }

    #[test]
    fn test_can_retrain_blocked_by_cooldown() {
        let (_dir, path) = state_file();
        let now = Utc::now();
        update_retrain_state(&path, now).unwrap();

        assert!(!can_retrain(&path, 24.0, now));
        assert!(!can_retrain(&path, 24.0, now + Duration::hours(23)));
    }

    #[test]
    fn test_cooldown_boundary_is_inclusive() {
        let (_dir, path) = state_file();
        let last = Utc::now();
        update_retrain_state(&path, last).unwrap();

        assert!(!can_retrain(&path, 24.0, last + Duration::hours(24) - Duration::seconds(1)));
        assert!(can_retrain(&path, 24.0, last + Duration::hours(24)));
        assert!(can_retrain(&path, 24.0, last + Duration::hours(48)));
    }

    #[test]
    fn test_zero_or_negative_cooldown_always_passes() {
        let (_dir, path) = state_file();
        let now = Utc::now();
        update_retrain_state(&path, now).unwrap();

        assert!(can_retrain(&path, 0.0, now));
        assert!(can_retrain(&path, -5.0, now));
    }

    #[test]
    fn test_reads_python_isoformat_timestamps() {
        let (_dir, path) = state_file();
        fs::write(&path, r#"{"last_retrain": "2024-01-01T10:00:00.123456+00:00"}"#).unwrap();

        let state = RetrainStateLoad::read(&path);
        let last = state.last_retrain().unwrap();
        assert!(!can_retrain(&path, 2.0, last + Duration::hours(1)));
        assert!(can_retrain(&path, 2.0, last + Duration::hours(2)));
    }

    #[test]
    fn test_update_overwrites_and_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("retrain_state.json");
        let first = Utc::now() - Duration::days(3);
        let second = Utc::now();

        update_retrain_state(&path, first).unwrap();
        update_retrain_state(&path, second).unwrap();

        let last = RetrainStateLoad::read(&path).last_retrain().unwrap();
        assert_eq!(last.timestamp_millis(), second.timestamp_millis());
    }

    #[test]
    fn test_guard_wraps_free_functions() {
        let (_dir, path) = state_file();
        let guard = CooldownGuard::new(&path, 1.0);
        let now = Utc::now();

        assert!(guard.can_retrain(now));
        guard.record_retrain(now).unwrap();
        assert!(!guard.can_retrain(now));
        assert!(guard.can_retrain(now + Duration::hours(1)));
    }
}
