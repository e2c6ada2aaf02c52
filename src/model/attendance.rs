use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::team::TeamId;
use super::worker::{AttendanceStatus, WorkerId};

/// Outcome of a committed verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[schema(value_type = String, example = "team-001")]
    pub team_id: TeamId,
    #[schema(value_type = String, example = "W-1001")]
    pub worker_id: WorkerId,
    pub marked_at: DateTime<Utc>,
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    pub fn present(team_id: TeamId, worker_id: WorkerId, marked_at: DateTime<Utc>) -> Self {
        Self {
            team_id,
            worker_id,
            marked_at,
            status: AttendanceStatus::Present,
        }
    }

    /// Calendar day (UTC) the record counts towards.
    pub fn day(&self) -> NaiveDate {
        self.marked_at.date_naive()
    }
}
