//! Stores usage readings over time, one JSON array per UTC day.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use gauge_paths::GaugePaths;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::errors::HistoryError;
use crate::refresh::MonitoringMode;
use crate::usage::UsageSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub timestamp: DateTime<Utc>,
    pub five_hour: Option<f64>,
    pub seven_day: Option<f64>,
    /// `None` when polling at a fixed interval.
    pub mode: Option<MonitoringMode>,
    pub interval_secs: u64,
}

impl UsageRecord {
    pub fn new(snapshot: &UsageSnapshot, mode: Option<MonitoringMode>, interval: Duration) -> Self {
        Self {
            timestamp: snapshot.fetched_at,
            five_hour: snapshot.five_hour.as_ref().map(|w| w.utilization),
            seven_day: snapshot.seven_day.as_ref().map(|w| w.utilization),
            mode,
            interval_secs: interval.as_secs(),
        }
    }
}

pub fn save_record(record: &UsageRecord) -> Result<(), HistoryError> {
    let paths = GaugePaths::resolve()?;
    save_record_to(&paths.history_dir(), record)
}

pub fn save_record_to(history_dir: &Path, record: &UsageRecord) -> Result<(), HistoryError> {
    fs::create_dir_all(history_dir)?;

    let filepath = history_dir.join(format!("{}.json", record.timestamp.format("%Y-%m-%d")));

    let mut records: Vec<UsageRecord> = match fs::read_to_string(&filepath) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(existing) => existing,
            Err(e) => {
                warn!(
                    event = "core.history.parse_failed",
                    file_path = %filepath.display(),
                    error = %e,
                    "Existing usage history file is corrupted - starting fresh"
                );
                Vec::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    records.push(record.clone());
    fs::write(&filepath, serde_json::to_string_pretty(&records)?)?;

    debug!(
        event = "core.history.record_saved",
        file_path = %filepath.display(),
        count = records.len()
    );
    Ok(())
}

pub fn load_history(days: u64) -> Result<Vec<UsageRecord>, HistoryError> {
    let paths = GaugePaths::resolve()?;
    Ok(load_history_from(&paths.history_dir(), days))
}

/// `days` before now, or `None` when that lies beyond what chrono can represent.
fn cutoff_before_now(days: u64) -> Option<DateTime<Utc>> {
    let delta = TimeDelta::try_days(i64::try_from(days).ok()?)?;
    Utc::now().checked_sub_signed(delta)
}

/// Records newer than `days` ago, oldest first. Unreadable files are skipped.
pub fn load_history_from(history_dir: &Path, days: u64) -> Vec<UsageRecord> {
    let cutoff = cutoff_before_now(days);

    let entries = match fs::read_dir(history_dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    event = "core.history.dir_read_failed",
                    history_dir = %history_dir.display(),
                    error = %e
                );
            }
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    event = "core.history.file_read_failed",
                    file_path = %path.display(),
                    error = %e
                );
                continue;
            }
        };

        match serde_json::from_str::<Vec<UsageRecord>>(&content) {
            Ok(day) => records.extend(
                day.into_iter()
                    .filter(|r| cutoff.is_none_or(|cutoff| r.timestamp > cutoff)),
            ),
            Err(e) => {
                warn!(
                    event = "core.history.file_parse_failed",
                    file_path = %path.display(),
                    error = %e,
                    "Could not parse usage history file - skipping"
                );
            }
        }
    }

    records.sort_by_key(|r| r.timestamp);
    records
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupResult {
    pub removed: usize,
    pub failed: usize,
}

pub fn cleanup_old_history(retention_days: u64) -> Result<CleanupResult, HistoryError> {
    let paths = GaugePaths::resolve()?;
    Ok(cleanup_old_history_in(&paths.history_dir(), retention_days))
}

/// Delete day files strictly older than the retention window.
pub fn cleanup_old_history_in(history_dir: &Path, retention_days: u64) -> CleanupResult {
    let mut result = CleanupResult::default();

    // Nothing can be older than a window chrono cannot represent.
    let Some(cutoff) = cutoff_before_now(retention_days) else {
        return result;
    };
    let cutoff_date = cutoff.format("%Y-%m-%d").to_string();

    let Ok(entries) = fs::read_dir(history_dir) else {
        return result;
    };

    for entry in entries.flatten() {
        let filename = entry.file_name().to_string_lossy().to_string();
        let Some(day) = filename.strip_suffix(".json") else {
            continue;
        };
        if day >= cutoff_date.as_str() {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => result.removed += 1,
            Err(e) => {
                result.failed += 1;
                warn!(
                    event = "core.history.cleanup_delete_failed",
                    file_path = %entry.path().display(),
                    error = %e
                );
            }
        }
    }

    if result.removed > 0 || result.failed > 0 {
        debug!(
            event = "core.history.cleanup_completed",
            removed = result.removed,
            failed = result.failed
        );
    }
    result
}
