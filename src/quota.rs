use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::Result;

pub const MAX_PROMPTS_PER_DAY: u32 = 25;

/// On-disk shape: two string-keyed values, written after every mutation and
/// read once at initialization.
#[derive(Debug, Serialize, Deserialize, Default)]
struct StoredQuota {
    #[serde(rename = "promptCount", default)]
    prompt_count: String,
    #[serde(rename = "lastResetDate", default)]
    last_reset_date: String,
}

/// Daily prompt counter with a calendar-day rollover.
///
/// The count resets to 0 whenever the persisted date differs from today's
/// local date, checked once at load. There is no decrement and no manual
/// reset; the only path back to 0 is the day boundary.
#[derive(Debug)]
pub struct QuotaGate {
    store_path: PathBuf,
    count: u32,
    last_reset: NaiveDate,
}

impl QuotaGate {
    pub fn load(store_path: impl Into<PathBuf>) -> Result<Self> {
        let store_path = store_path.into();
        let today = Local::now().date_naive();

        let stored = read_store(&store_path);
        let count = stored
            .as_ref()
            .and_then(|quota| quota.prompt_count.trim().parse::<u32>().ok())
            .unwrap_or(0);
        let last_reset = stored
            .as_ref()
            .and_then(|quota| quota.last_reset_date.trim().parse::<NaiveDate>().ok());

        let mut gate = Self {
            store_path,
            count,
            last_reset: last_reset.unwrap_or(today),
        };

        if last_reset != Some(today) {
            gate.count = 0;
            gate.last_reset = today;
            gate.persist()?;
        }

        Ok(gate)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn remaining(&self) -> u32 {
        MAX_PROMPTS_PER_DAY.saturating_sub(self.count)
    }

    pub fn limit_reached(&self) -> bool {
        self.count >= MAX_PROMPTS_PER_DAY
    }

    /// Single check-then-increment step: returns `true` and consumes one
    /// prompt when the daily budget allows it, `false` once exhausted.
    pub fn try_acquire(&mut self) -> Result<bool> {
        if self.limit_reached() {
            return Ok(false);
        }
        self.count += 1;
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<()> {
        let stored = StoredQuota {
            prompt_count: self.count.to_string(),
            last_reset_date: self.last_reset.to_string(),
        };
        let payload = serde_json::to_string(&stored)
            .map_err(|e| RelayError::Storage(e.to_string()))?;
        ensure_parent_dir(&self.store_path)?;
        std::fs::write(&self.store_path, payload)
            .map_err(|e| RelayError::Storage(e.to_string()))?;
        Ok(())
    }
}

fn read_store(path: &Path) -> Option<StoredQuota> {
    let raw = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| RelayError::Storage(e.to_string()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use tempfile::tempdir;

    fn seed(path: &Path, count: &str, date: &str) {
        let payload =
            serde_json::json!({"promptCount": count, "lastResetDate": date}).to_string();
        std::fs::write(path, payload).unwrap();
    }

    #[test]
    fn starts_at_zero_without_store() {
        let temp = tempdir().unwrap();
        let gate = QuotaGate::load(temp.path().join("quota.json")).unwrap();
        assert_eq!(gate.count(), 0);
        assert_eq!(gate.remaining(), MAX_PROMPTS_PER_DAY);
        assert!(!gate.limit_reached());
    }

    #[test]
    fn increment_at_boundary_reaches_limit() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("quota.json");
        let today = Local::now().date_naive().to_string();
        seed(&path, "24", &today);

        let mut gate = QuotaGate::load(&path).unwrap();
        assert_eq!(gate.count(), 24);
        assert!(!gate.limit_reached());

        assert!(gate.try_acquire().unwrap());
        assert_eq!(gate.count(), 25);
        assert!(gate.limit_reached());

        assert!(!gate.try_acquire().unwrap());
        assert_eq!(gate.count(), 25);
    }

    #[test]
    fn stale_date_resets_count_regardless_of_value() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("quota.json");
        let yesterday = Local::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap()
            .to_string();
        seed(&path, "25", &yesterday);

        let gate = QuotaGate::load(&path).unwrap();
        assert_eq!(gate.count(), 0);
        assert!(!gate.limit_reached());

        // Rollover is persisted immediately with today's date.
        let raw = std::fs::read_to_string(&path).unwrap();
        let stored: StoredQuota = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.prompt_count, "0");
        assert_eq!(stored.last_reset_date, Local::now().date_naive().to_string());
    }

    #[test]
    fn count_survives_reload_same_day() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("quota.json");

        let mut gate = QuotaGate::load(&path).unwrap();
        assert!(gate.try_acquire().unwrap());
        assert!(gate.try_acquire().unwrap());
        drop(gate);

        let reloaded = QuotaGate::load(&path).unwrap();
        assert_eq!(reloaded.count(), 2);
    }

    #[test]
    fn corrupt_store_degrades_to_zero() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("quota.json");
        std::fs::write(&path, "not json at all").unwrap();

        let gate = QuotaGate::load(&path).unwrap();
        assert_eq!(gate.count(), 0);

        let path = temp.path().join("quota2.json");
        seed(&path, "not-a-number", &Local::now().date_naive().to_string());
        let gate = QuotaGate::load(&path).unwrap();
        assert_eq!(gate.count(), 0);
    }
}
