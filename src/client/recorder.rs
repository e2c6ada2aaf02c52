use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};

use super::directory::InMemoryDirectory;
use super::http::{ApiClient, ClientError};
use crate::model::{TeamId, WorkerId};
use crate::models::{MarkAttendanceReq, MarkAttendanceResponse};

/// Commits present-attendance for a worker. Callers are expected to gate
/// this on a cleared verification session.
#[async_trait]
pub trait AttendanceRecorder: Send + Sync {
    async fn mark_present(
        &self,
        team_id: &TeamId,
        worker_id: &WorkerId,
    ) -> Result<MarkAttendanceResponse, ClientError>;
}

#[async_trait]
impl AttendanceRecorder for InMemoryDirectory {
    #[instrument(skip(self), fields(team_id = %team_id, worker_id = %worker_id))]
    async fn mark_present(
        &self,
        team_id: &TeamId,
        worker_id: &WorkerId,
    ) -> Result<MarkAttendanceResponse, ClientError> {
        let teams = self.teams.read().await;
        let team = teams
            .iter()
            .find(|t| &t.id == team_id)
            .ok_or_else(|| ClientError::UnknownTeam(team_id.clone()))?;
        if team.worker(worker_id).is_none() {
            return Err(ClientError::UnknownWorker {
                team: team_id.clone(),
                worker: worker_id.clone(),
            });
        }

        drop(teams);

        let (record, fresh) = self.ledger.record(team_id, worker_id, Utc::now()).await;
        if fresh {
            info!("attendance recorded");
        } else {
            info!(marked_at = %record.marked_at, "attendance already recorded today");
        }

        Ok(MarkAttendanceResponse {
            ok: true,
            already_marked: !fresh,
            marked_at: Some(record.marked_at),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RemoteAttendanceRecorder {
    client: ApiClient,
}

impl RemoteAttendanceRecorder {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AttendanceRecorder for RemoteAttendanceRecorder {
    async fn mark_present(
        &self,
        team_id: &TeamId,
        worker_id: &WorkerId,
    ) -> Result<MarkAttendanceResponse, ClientError> {
        self.client
            .mark_attendance(&MarkAttendanceReq {
                team_id: team_id.clone(),
                worker_id: worker_id.clone(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DirectoryClient;
    use crate::model::AttendanceStatus;

    #[tokio::test]
    async fn marking_twice_on_one_day_is_idempotent() {
        let directory = InMemoryDirectory::seeded();
        let team = TeamId::new("team-001");
        let worker = WorkerId::new("W-1002");

        let first = directory.mark_present(&team, &worker).await.unwrap();
        assert!(first.ok && !first.already_marked);

        let second = directory.mark_present(&team, &worker).await.unwrap();
        assert!(second.ok && second.already_marked);
        assert_eq!(first.marked_at, second.marked_at);

        let teams = directory.list_teams().await.unwrap();
        let roster = teams.iter().find(|t| t.id == team).unwrap();
        let w = roster.worker(&worker).unwrap();
        assert_eq!(w.status, AttendanceStatus::Present);
        assert_eq!(w.marked_at, first.marked_at);
    }

    #[tokio::test]
    async fn unknown_team_or_worker_is_an_error() {
        let directory = InMemoryDirectory::seeded();
        assert!(matches!(
            directory
                .mark_present(&TeamId::new("team-404"), &WorkerId::new("W-1001"))
                .await,
            Err(ClientError::UnknownTeam(_))
        ));
        assert!(matches!(
            directory
                .mark_present(&TeamId::new("team-001"), &WorkerId::new("W-2001"))
                .await,
            Err(ClientError::UnknownWorker { .. })
        ));
    }
}
