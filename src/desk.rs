//! Supervisor-facing orchestration: team selection, worker selection and
//! the per-worker verification session, wired to the configured services.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::client::{ClientError, ClientServices};
use crate::model::{AttendanceRecord, NewWorker, RosterError, Supervisor, Team, TeamId, Worker, WorkerId};
use crate::session::{SessionError, SessionStore};
use crate::utils::search::{filter_teams, filter_workers};
use crate::workflow::{
    FrameSource, VerificationDeps, VerificationPolicy, VerificationSession, WorkflowError,
};

#[derive(Debug, Error)]
pub enum DeskError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Directory(#[from] ClientError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("no team is selected")]
    NoTeamSelected,
    #[error("no worker is selected")]
    NoWorkerSelected,
    #[error("unknown team {0}")]
    UnknownTeam(TeamId),
    #[error("worker {0} is not on the selected team")]
    UnknownWorker(WorkerId),
}

pub struct AttendanceDesk {
    supervisor: Supervisor,
    services: ClientServices,
    frames: Arc<dyn FrameSource>,
    policy: VerificationPolicy,
    teams: Vec<Team>,
    selected_team: Option<TeamId>,
    session: Option<VerificationSession>,
}

impl AttendanceDesk {
    /// Only an authenticated, fully restored session may open a desk.
    pub async fn open(
        store: &SessionStore,
        services: ClientServices,
        frames: Arc<dyn FrameSource>,
        policy: VerificationPolicy,
    ) -> Result<Self, DeskError> {
        let supervisor = store.require_supervisor().await?;
        info!(username = %supervisor.username, "attendance desk opened");
        Ok(Self {
            supervisor,
            services,
            frames,
            policy,
            teams: Vec::new(),
            selected_team: None,
            session: None,
        })
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Re-fetch teams. The selection survives if the team still exists,
    /// otherwise the first team is selected.
    #[instrument(skip(self))]
    pub async fn refresh_teams(&mut self) -> Result<&[Team], DeskError> {
        let teams = self.services.directory.list_teams().await?;
        let keep = self
            .selected_team
            .as_ref()
            .filter(|id| teams.iter().any(|t| &t.id == *id))
            .cloned();
        let next = keep.or_else(|| teams.first().map(|t| t.id.clone()));
        if next != self.selected_team {
            self.discard_session();
        }
        debug!(count = teams.len(), selected = ?next, "teams refreshed");
        self.teams = teams;
        self.selected_team = next;
        Ok(&self.teams)
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn search_teams(&self, query: &str) -> Vec<&Team> {
        filter_teams(&self.teams, query)
    }

    pub fn select_team(&mut self, id: &TeamId) -> Result<&Team, DeskError> {
        let index = self
            .teams
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| DeskError::UnknownTeam(id.clone()))?;
        if self.selected_team.as_ref() != Some(id) {
            self.discard_session();
            self.selected_team = Some(id.clone());
        }
        Ok(&self.teams[index])
    }

    pub fn selected_team(&self) -> Option<&Team> {
        let id = self.selected_team.as_ref()?;
        self.teams.iter().find(|t| &t.id == id)
    }

    pub fn search_workers(&self, query: &str) -> Vec<&Worker> {
        self.selected_team()
            .map(|team| filter_workers(team, query))
            .unwrap_or_default()
    }

    /// Start a fresh verification session for a worker on the selected
    /// team. Reselecting the current worker keeps the session.
    pub fn select_worker(&mut self, id: &WorkerId) -> Result<&mut VerificationSession, DeskError> {
        let team = self.selected_team().ok_or(DeskError::NoTeamSelected)?;
        let worker = team
            .worker(id)
            .cloned()
            .ok_or_else(|| DeskError::UnknownWorker(id.clone()))?;
        let team_id = team.id.clone();

        let same = self
            .session
            .as_ref()
            .is_some_and(|s| s.team_id() == &team_id && &s.worker().id == id);
        if !same {
            self.discard_session();
            let deps = VerificationDeps {
                frames: Arc::clone(&self.frames),
                document_matcher: Arc::clone(&self.services.document_matcher),
                biometric_matcher: Arc::clone(&self.services.biometric_matcher),
                policy: self.policy,
            };
            self.session = Some(VerificationSession::new(team_id, worker, deps));
        }
        self.session.as_mut().ok_or(DeskError::NoWorkerSelected)
    }

    pub fn session(&self) -> Option<&VerificationSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut VerificationSession> {
        self.session.as_mut()
    }

    /// Commit attendance for the cleared worker and mirror it into the
    /// cached roster. The session is reset but stays selected.
    #[instrument(skip(self))]
    pub async fn mark_present(&mut self) -> Result<AttendanceRecord, DeskError> {
        let session = self.session.as_mut().ok_or(DeskError::NoWorkerSelected)?;
        let record = session
            .commit_attendance(self.services.recorder.as_ref())
            .await?;
        let team = self
            .teams
            .iter_mut()
            .find(|t| t.id == record.team_id)
            .ok_or_else(|| DeskError::UnknownTeam(record.team_id.clone()))?;
        team.apply_attendance(&record)?;
        Ok(record)
    }

    /// Create a team through the directory and add it to the cached list.
    #[instrument(skip(self, workers), fields(workers = workers.len()))]
    pub async fn create_team(&mut self, name: &str, workers: Vec<NewWorker>) -> Result<&Team, DeskError> {
        let team = self.services.directory.create_team(name, workers).await?;
        info!(team_id = %team.id, "team created");
        self.teams.push(team);
        Ok(&self.teams[self.teams.len() - 1])
    }

    fn discard_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.reset();
        }
    }
}
