// src/store/record.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What is remembered about a run once the lineage service has accepted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentityRecord {
    /// Run id issued by the lineage service. Opaque.
    pub lineage_run_id: String,
    /// When the mapping was written; drives retention.
    pub created_at: DateTime<Utc>,
}

impl RunIdentityRecord {
    pub fn new(lineage_run_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            lineage_run_id: lineage_run_id.into(),
            created_at,
        }
    }

    /// True once the record is older than `retention` at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, retention: chrono::Duration) -> bool {
        now.signed_duration_since(self.created_at) > retention
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn expiry_is_exclusive_of_the_boundary() {
        let created = Utc.with_ymd_and_hms(2019, 1, 31, 0, 0, 0).unwrap();
        let record = RunIdentityRecord::new("abc", created);
        let retention = chrono::Duration::hours(1);

        assert!(!record.is_expired(created, retention));
        assert!(!record.is_expired(created + retention, retention));
        assert!(record.is_expired(created + retention + chrono::Duration::seconds(1), retention));
    }
}
