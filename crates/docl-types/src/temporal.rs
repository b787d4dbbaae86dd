use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Ledger-assigned commit time of a revision.
///
/// A Hybrid Logical Clock value: a physical wall-clock component, a logical
/// counter and a node identifier. Commit timestamps within one ledger are
/// strictly increasing even when the wall clock stalls or steps backwards.
///
/// Ordering: `physical_ms` → `logical` → `node_id` (total order).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitTimestamp {
    /// Wall-clock milliseconds since UNIX epoch.
    pub physical_ms: u64,
    /// Logical counter for commits at the same physical time.
    pub logical: u32,
    /// Node identifier to break ties between ledger nodes.
    pub node_id: u16,
}

impl CommitTimestamp {
    pub fn new(physical_ms: u64, logical: u32, node_id: u16) -> Self {
        Self {
            physical_ms,
            logical,
            node_id,
        }
    }

    /// Timestamp for the current wall-clock time.
    pub fn now(node_id: u16) -> Self {
        Self::new(wall_clock_ms(), 0, node_id)
    }

    /// Next commit time for a ledger whose latest commit was `last`.
    ///
    /// The result is strictly after `last`.
    pub fn next_after(last: Option<&Self>, node_id: u16) -> Self {
        let now = Self::now(node_id);
        match last {
            None => now,
            Some(prev) if now.physical_ms > prev.physical_ms => now,
            Some(prev) => Self::new(prev.physical_ms, prev.logical.saturating_add(1), node_id),
        }
    }

    /// Wall-clock component as a UTC datetime.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.physical_ms)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }

    /// ISO-8601 rendering of the wall-clock component, millisecond precision.
    pub fn to_rfc3339(&self) -> String {
        self.to_datetime()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|| self.to_string())
    }
}

impl PartialOrd for CommitTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CommitTimestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.physical_ms
            .cmp(&other.physical_ms)
            .then(self.logical.cmp(&other.logical))
            .then(self.node_id.cmp(&other.node_id))
    }
}

impl fmt::Debug for CommitTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CommitTimestamp({}ms.{}.n{})",
            self.physical_ms, self.logical, self.node_id
        )
    }
}

impl fmt::Display for CommitTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.n{}", self.physical_ms, self.logical, self.node_id)
    }
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
