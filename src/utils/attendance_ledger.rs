use chrono::{DateTime, NaiveDate, Utc};
use moka::future::Cache;
use std::time::Duration;

use crate::model::{AttendanceRecord, TeamId, WorkerId};

/// One present-record per (team, worker, UTC day). Entries outlive the day
/// they count for so late repeats still resolve to the original record.
#[derive(Debug, Clone)]
pub struct AttendanceLedger {
    cache: Cache<String, AttendanceRecord>,
}

impl Default for AttendanceLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AttendanceLedger {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(500_000) // tune based on memory
                .time_to_live(Duration::from_secs(2 * 86400)) // 48h TTL
                .build(),
        }
    }

    fn key(team_id: &TeamId, worker_id: &WorkerId, day: NaiveDate) -> String {
        format!("{team_id}|{worker_id}|{day}")
    }

    /// Insert a record unless one exists for that day. Returns the stored
    /// record and whether this call created it.
    pub async fn record(
        &self,
        team_id: &TeamId,
        worker_id: &WorkerId,
        at: DateTime<Utc>,
    ) -> (AttendanceRecord, bool) {
        let record = AttendanceRecord::present(team_id.clone(), worker_id.clone(), at);
        let entry = self
            .cache
            .entry(Self::key(team_id, worker_id, record.day()))
            .or_insert(record)
            .await;
        let fresh = entry.is_fresh();
        (entry.into_value(), fresh)
    }

    pub async fn lookup(
        &self,
        team_id: &TeamId,
        worker_id: &WorkerId,
        day: NaiveDate,
    ) -> Option<AttendanceRecord> {
        self.cache.get(&Self::key(team_id, worker_id, day)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn second_record_on_same_day_returns_first() {
        let ledger = AttendanceLedger::new();
        let team = TeamId::new("team-001");
        let worker = WorkerId::new("W-1001");
        let morning = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let noon = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();

        let (first, fresh) = ledger.record(&team, &worker, morning).await;
        assert!(fresh);
        let (second, fresh) = ledger.record(&team, &worker, noon).await;
        assert!(!fresh);
        assert_eq!(second.marked_at, first.marked_at);
    }

    #[tokio::test]
    async fn new_day_is_a_new_record() {
        let ledger = AttendanceLedger::new();
        let team = TeamId::new("team-001");
        let worker = WorkerId::new("W-1001");
        let monday = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let tuesday = Utc.with_ymd_and_hms(2026, 3, 3, 8, 0, 0).unwrap();

        assert!(ledger.record(&team, &worker, monday).await.1);
        assert!(ledger.record(&team, &worker, tuesday).await.1);
        assert!(
            ledger
                .lookup(&team, &worker, monday.date_naive())
                .await
                .is_some()
        );
    }
}
