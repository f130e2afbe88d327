//! Sync conflict model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::LogId;

/// One incoming log whose content diverges from the matched local log.
///
/// Transient: produced before the write phase and handed to a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConflict {
    /// Title shared by both versions
    pub title: String,
    /// Matched local log
    pub local_id: LogId,
    /// Local `updatedAt` (Unix ms)
    pub local_updated_at: i64,
    /// Incoming `updatedAt` (Unix ms)
    pub remote_updated_at: i64,
    pub local_content: String,
    pub remote_content: String,
}

impl SyncConflict {
    /// Whether the incoming version was edited more recently
    #[must_use]
    pub const fn remote_is_newer(&self) -> bool {
        self.remote_updated_at > self.local_updated_at
    }
}

/// Caller's answer for one conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncResolution {
    /// Keep the local log unchanged
    Local,
    /// Overwrite the local log with the incoming version
    Remote,
    /// Keep local and insert the incoming version as a separate log
    Both,
}

impl SyncResolution {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for SyncResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "l" => Ok(Self::Local),
            "remote" | "r" => Ok(Self::Remote),
            "both" | "b" => Ok(Self::Both),
            other => Err(format!("unknown resolution '{other}' (expected local, remote or both)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_parses_short_and_long_forms() {
        assert_eq!("local".parse::<SyncResolution>(), Ok(SyncResolution::Local));
        assert_eq!(" R ".parse::<SyncResolution>(), Ok(SyncResolution::Remote));
        assert_eq!("b".parse::<SyncResolution>(), Ok(SyncResolution::Both));
        assert!("mine".parse::<SyncResolution>().is_err());
    }

    #[test]
    fn resolution_serializes_lowercase() {
        let json = serde_json::to_string(&SyncResolution::Both).unwrap();
        assert_eq!(json, "\"both\"");
    }

    #[test]
    fn remote_is_newer_compares_timestamps() {
        let conflict = SyncConflict {
            title: "A".to_string(),
            local_id: LogId::new(1),
            local_updated_at: 10,
            remote_updated_at: 20,
            local_content: "x".to_string(),
            remote_content: "y".to_string(),
        };
        assert!(conflict.remote_is_newer());
    }
}
