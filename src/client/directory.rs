use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use super::http::{ApiClient, ClientError};
use crate::model::{
    AttendanceStatus, NewWorker, Team, TeamId, Worker, WorkerId, ensure_unassigned,
    validate_new_team,
};
use crate::models::CreateTeamReq;
use crate::utils::attendance_ledger::AttendanceLedger;
use crate::utils::ids::new_team_id;

/// Team and roster retrieval/creation.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn list_teams(&self) -> Result<Vec<Team>, ClientError>;

    /// The id of the returned team is assigned by the directory.
    async fn create_team(&self, name: &str, workers: Vec<NewWorker>) -> Result<Team, ClientError>;
}

/// In-process dataset. Serves both the mock client mode and the backend.
/// Stored rosters hold identities only; each day's marks live in the ledger.
#[derive(Debug)]
pub struct InMemoryDirectory {
    pub(crate) teams: RwLock<Vec<Team>>,
    pub(crate) ledger: AttendanceLedger,
}

impl InMemoryDirectory {
    pub fn new(teams: Vec<Team>) -> Self {
        Self {
            teams: RwLock::new(teams),
            ledger: AttendanceLedger::new(),
        }
    }

    /// The two reference work teams.
    pub fn seeded() -> Self {
        Self::new(vec![
            Team {
                id: TeamId::new("team-001"),
                name: "Canal Repair Unit A".into(),
                location: None,
                supervisor: None,
                workers: vec![
                    Worker::new("W-1001", "Ravi Kumar", "IIRS:RVKMR-1001"),
                    Worker::new("W-1002", "Sita Devi", "IIRS:STDV-1002"),
                    Worker::new("W-1003", "Amit Singh", "IIRS:AMSG-1003"),
                ],
            },
            Team {
                id: TeamId::new("team-002"),
                name: "Road Laying Crew B".into(),
                location: None,
                supervisor: None,
                workers: vec![
                    Worker::new("W-2001", "Pooja Sharma", "IIRS:PJSH-2001"),
                    Worker::new("W-2002", "Vikas Yadav", "IIRS:VKYD-2002"),
                ],
            },
        ])
    }

    pub async fn team(&self, id: &TeamId) -> Option<Team> {
        let team = self.teams.read().await.iter().find(|t| &t.id == id).cloned()?;
        Some(self.as_of_today(team).await)
    }

    /// Overlay today's (UTC) marks. Anything older reads as pending.
    async fn as_of_today(&self, mut team: Team) -> Team {
        let today = Utc::now().date_naive();
        for worker in &mut team.workers {
            match self.ledger.lookup(&team.id, &worker.id, today).await {
                Some(record) => {
                    worker.status = record.status;
                    worker.marked_at = Some(record.marked_at);
                }
                None => {
                    worker.status = AttendanceStatus::Pending;
                    worker.marked_at = None;
                }
            }
        }
        team
    }

    pub async fn find_worker(&self, id: &WorkerId) -> Option<(TeamId, Worker)> {
        self.teams.read().await.iter().find_map(|team| {
            team.worker(id).map(|w| (team.id.clone(), w.clone()))
        })
    }
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    async fn list_teams(&self) -> Result<Vec<Team>, ClientError> {
        let stored = self.teams.read().await.clone();
        let mut teams = Vec::with_capacity(stored.len());
        for team in stored {
            teams.push(self.as_of_today(team).await);
        }
        Ok(teams)
    }

    async fn create_team(&self, name: &str, workers: Vec<NewWorker>) -> Result<Team, ClientError> {
        validate_new_team(name, &workers)?;
        let mut teams = self.teams.write().await;
        ensure_unassigned(&teams, &workers)?;
        let mut id = new_team_id();
        while teams.iter().any(|t| t.id == id) {
            id = new_team_id();
        }
        let team = Team {
            id,
            name: name.trim().to_string(),
            location: None,
            supervisor: None,
            workers: workers.into_iter().map(NewWorker::into_worker).collect(),
        };
        teams.push(team.clone());
        info!(team_id = %team.id, workers = team.workers.len(), "team created");
        Ok(team)
    }
}

#[derive(Debug, Clone)]
pub struct RemoteDirectory {
    client: ApiClient,
}

impl RemoteDirectory {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DirectoryClient for RemoteDirectory {
    async fn list_teams(&self) -> Result<Vec<Team>, ClientError> {
        self.client.list_teams().await
    }

    async fn create_team(&self, name: &str, workers: Vec<NewWorker>) -> Result<Team, ClientError> {
        self.client
            .create_team(&CreateTeamReq {
                name: name.to_string(),
                workers,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RosterError;
    use chrono::Duration;

    #[tokio::test]
    async fn seeded_directory_lists_reference_teams() {
        let directory = InMemoryDirectory::seeded();
        let teams = directory.list_teams().await.unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].workers.len(), 3);
        assert_eq!(teams[1].name, "Road Laying Crew B");
    }

    #[tokio::test]
    async fn created_team_gets_a_fresh_id_and_is_listed() {
        let directory = InMemoryDirectory::seeded();
        let team = directory
            .create_team(
                "Canal Repair Unit C",
                vec![NewWorker::new("W-3011", "Meena Kumari", "IIRS:MNKM-3011")],
            )
            .await
            .unwrap();
        assert!(!team.id.as_str().is_empty());
        assert_ne!(team.id, TeamId::new("team-001"));
        let teams = directory.list_teams().await.unwrap();
        assert_eq!(teams.len(), 3);
        assert!(teams.iter().any(|t| t.id == team.id));
    }

    #[tokio::test]
    async fn invalid_team_is_rejected() {
        let directory = InMemoryDirectory::seeded();
        let err = directory.create_team("Empty crew", vec![]).await.unwrap_err();
        assert!(matches!(err, ClientError::Invalid(_)));
    }

    #[tokio::test]
    async fn worker_cannot_join_a_second_team() {
        let directory = InMemoryDirectory::seeded();
        let err = directory
            .create_team(
                "Canal Repair Unit C",
                vec![
                    NewWorker::new("W-3011", "Meena Kumari", "IIRS:MNKM-3011"),
                    NewWorker::new("W-1001", "Ravi Kumar", "IIRS:RVKMR-1001"),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Invalid(RosterError::AssignedElsewhere { ref worker, ref team })
                if worker == "W-1001" && team == "team-001"
        ));

        let teams = directory.list_teams().await.unwrap();
        assert_eq!(teams.len(), 2);
        let holders = teams
            .iter()
            .filter(|t| t.worker(&WorkerId::new("W-1001")).is_some())
            .count();
        assert_eq!(holders, 1);
    }

    #[tokio::test]
    async fn yesterdays_mark_reads_as_pending_today() {
        let team_id = TeamId::new("team-001");
        let worker_id = WorkerId::new("W-1001");
        let yesterday = Utc::now() - Duration::days(1);

        let mut stale = Worker::new("W-1001", "Ravi Kumar", "IIRS:RVKMR-1001");
        stale.status = AttendanceStatus::Present;
        stale.marked_at = Some(yesterday);
        let directory = InMemoryDirectory::new(vec![Team {
            id: team_id.clone(),
            name: "Canal Repair Unit A".into(),
            location: None,
            supervisor: None,
            workers: vec![stale],
        }]);
        directory.ledger.record(&team_id, &worker_id, yesterday).await;

        let team = directory.team(&team_id).await.unwrap();
        let worker = team.worker(&worker_id).unwrap();
        assert_eq!(worker.status, AttendanceStatus::Pending);
        assert_eq!(worker.marked_at, None);

        directory.ledger.record(&team_id, &worker_id, Utc::now()).await;
        let teams = directory.list_teams().await.unwrap();
        assert_eq!(teams[0].present_count(), 1);
    }
}
