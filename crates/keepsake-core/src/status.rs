//! Per-asset task status map and its textual payload.
//!
//! The payload is a flat `name:code,name:code` list. It is decoded into a
//! [`TaskStatusMap`] when loaded and re-encoded right before it is written; no
//! other code touches the raw text.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Terminal outcome of one task for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Task did not apply to the asset.
    Skipped,
    /// The owner opted out.
    UserSkipped,
    Done,
    /// Processing, external tool or geocoder failure.
    Failed,
    /// Content could not be staged.
    FailedStorage,
    /// The task's own persistence write failed.
    FailedDb,
}

impl TaskStatus {
    pub fn code(self) -> i32 {
        match self {
            TaskStatus::Skipped => 0,
            TaskStatus::UserSkipped => 1,
            TaskStatus::Done => 2,
            TaskStatus::Failed => 3,
            TaskStatus::FailedStorage => 4,
            TaskStatus::FailedDb => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(TaskStatus::Skipped),
            1 => Some(TaskStatus::UserSkipped),
            2 => Some(TaskStatus::Done),
            3 => Some(TaskStatus::Failed),
            4 => Some(TaskStatus::FailedStorage),
            5 => Some(TaskStatus::FailedDb),
            _ => None,
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskStatus::Skipped => write!(f, "skipped"),
            TaskStatus::UserSkipped => write!(f, "user_skipped"),
            TaskStatus::Done => write!(f, "done"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::FailedStorage => write!(f, "failed_storage"),
            TaskStatus::FailedDb => write!(f, "failed_db"),
        }
    }
}

/// A stored status value. Codes this build does not know are kept verbatim so a
/// re-encode never loses them; they still count as recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedStatus {
    Known(TaskStatus),
    Unrecognized(String),
}

impl RecordedStatus {
    fn parse(raw: &str) -> Self {
        raw.parse::<i32>()
            .ok()
            .and_then(TaskStatus::from_code)
            .map(RecordedStatus::Known)
            .unwrap_or_else(|| RecordedStatus::Unrecognized(raw.to_string()))
    }

    pub fn status(&self) -> Option<TaskStatus> {
        match self {
            RecordedStatus::Known(status) => Some(*status),
            RecordedStatus::Unrecognized(_) => None,
        }
    }
}

impl Display for RecordedStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RecordedStatus::Known(status) => write!(f, "{}", status.code()),
            RecordedStatus::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// Decoded task name → status mapping. Entries keep the order they were
/// recorded in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStatusMap {
    entries: Vec<(String, RecordedStatus)>,
}

impl TaskStatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a stored payload. Pairs that do not split into exactly two
    /// colon-separated tokens are dropped with a warning.
    pub fn decode(payload: &str) -> Self {
        let mut map = Self::new();
        for pair in payload.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let tokens: Vec<&str> = pair.split(':').collect();
            match tokens.as_slice() {
                [name, code] if !name.trim().is_empty() => {
                    let name = name.trim();
                    if map.contains(name) {
                        tracing::warn!(pair = %pair, "Duplicate task status entry ignored");
                        continue;
                    }
                    map.entries
                        .push((name.to_string(), RecordedStatus::parse(code.trim())));
                }
                _ => {
                    tracing::warn!(pair = %pair, "Dropping malformed task status entry");
                }
            }
        }
        map
    }

    /// Regenerate the full payload from the map.
    pub fn encode(&self) -> String {
        self.entries
            .iter()
            .map(|(name, status)| format!("{}:{}", name, status))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn contains(&self, task: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == task)
    }

    pub fn get(&self, task: &str) -> Option<&RecordedStatus> {
        self.entries
            .iter()
            .find(|(name, _)| name == task)
            .map(|(_, status)| status)
    }

    /// Record an outcome, replacing any existing entry for the task.
    pub fn record(&mut self, task: &str, status: TaskStatus) {
        let value = RecordedStatus::Known(status);
        match self.entries.iter_mut().find(|(name, _)| name == task) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((task.to_string(), value)),
        }
    }

    pub fn task_names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_codes() {
        let map = TaskStatusMap::decode("location:0,video:1,metadata:2");
        assert_eq!(map.len(), 3);
        assert_eq!(
            map.get("video"),
            Some(&RecordedStatus::Known(TaskStatus::UserSkipped))
        );
        assert_eq!(
            map.get("metadata").and_then(RecordedStatus::status),
            Some(TaskStatus::Done)
        );
    }

    #[test]
    fn drops_malformed_pairs() {
        let map = TaskStatusMap::decode("location:0,garbage,thumb:2:9,:3,facedetect:2");
        assert_eq!(map.task_names(), vec!["location", "facedetect"]);
    }

    #[test]
    fn empty_payload_is_empty_map() {
        assert!(TaskStatusMap::decode("").is_empty());
        assert!(TaskStatusMap::decode(" , ").is_empty());
    }

    #[test]
    fn unknown_codes_survive_reencode() {
        let map = TaskStatusMap::decode("location:0,legacy:7");
        assert!(map.contains("legacy"));
        assert_eq!(map.get("legacy").and_then(RecordedStatus::status), None);
        assert_eq!(map.encode(), "location:0,legacy:7");
    }

    #[test]
    fn record_appends_in_order_and_replaces_existing() {
        let mut map = TaskStatusMap::new();
        map.record("location", TaskStatus::Skipped);
        map.record("video", TaskStatus::Failed);
        map.record("location", TaskStatus::Done);
        assert_eq!(map.encode(), "location:2,video:3");
    }

    #[test]
    fn codes_round_trip_through_from_code() {
        for status in [
            TaskStatus::Skipped,
            TaskStatus::UserSkipped,
            TaskStatus::Done,
            TaskStatus::Failed,
            TaskStatus::FailedStorage,
            TaskStatus::FailedDb,
        ] {
            assert_eq!(TaskStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(TaskStatus::Done.code(), 2);
        assert_eq!(TaskStatus::from_code(6), None);
    }
}
