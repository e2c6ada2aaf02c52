use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use utoipa::ToSchema;

use super::attendance::AttendanceRecord;
use super::worker::{NewWorker, Worker, WorkerId};

/// Server-assigned team identifier. Callers must not parse it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TeamId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": "team-001",
        "name": "Canal Repair Unit A",
        "workers": [
            { "id": "W-1001", "name": "Ravi Kumar", "iirsData": "IIRS:RVKMR-1001", "status": "pending" }
        ]
    })
)]
pub struct Team {
    #[schema(value_type = String, example = "team-001")]
    pub id: TeamId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor: Option<String>,
    #[serde(default)]
    pub workers: Vec<Worker>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("team name must not be empty")]
    EmptyName,
    #[error("a team needs at least one worker")]
    EmptyRoster,
    #[error("worker {0:?} is missing an id, name or IIRS token")]
    IncompleteWorker(String),
    #[error("worker {0} appears more than once")]
    DuplicateWorker(String),
    #[error("worker {0} is not on this team")]
    UnknownWorker(String),
    #[error("worker {worker} already belongs to team {team}")]
    AssignedElsewhere { worker: String, team: String },
}

impl Team {
    pub fn worker(&self, id: &WorkerId) -> Option<&Worker> {
        self.workers.iter().find(|w| &w.id == id)
    }

    pub fn add_worker(&mut self, worker: NewWorker) -> Result<&Worker, RosterError> {
        validate_worker(&worker)?;
        let worker = worker.into_worker();
        if self.worker(&worker.id).is_some() {
            return Err(RosterError::DuplicateWorker(worker.id.to_string()));
        }
        self.workers.push(worker);
        Ok(&self.workers[self.workers.len() - 1])
    }

    pub fn remove_worker(&mut self, id: &WorkerId) -> Result<Worker, RosterError> {
        let idx = self
            .workers
            .iter()
            .position(|w| &w.id == id)
            .ok_or_else(|| RosterError::UnknownWorker(id.to_string()))?;
        Ok(self.workers.remove(idx))
    }

    /// Flip the worker named by `record` to its recorded status.
    pub fn apply_attendance(&mut self, record: &AttendanceRecord) -> Result<(), RosterError> {
        let worker = self
            .workers
            .iter_mut()
            .find(|w| w.id == record.worker_id)
            .ok_or_else(|| RosterError::UnknownWorker(record.worker_id.to_string()))?;
        worker.status = record.status;
        worker.marked_at = Some(record.marked_at);
        Ok(())
    }

    pub fn present_count(&self) -> usize {
        self.workers.iter().filter(|w| w.is_present()).count()
    }
}

fn validate_worker(worker: &NewWorker) -> Result<(), RosterError> {
    if worker.id.trim().is_empty()
        || worker.name.trim().is_empty()
        || worker.iirs_token.trim().is_empty()
    {
        return Err(RosterError::IncompleteWorker(worker.id.clone()));
    }
    Ok(())
}

/// Check a create-team request before any id is assigned.
pub fn validate_new_team(name: &str, workers: &[NewWorker]) -> Result<(), RosterError> {
    if name.trim().is_empty() {
        return Err(RosterError::EmptyName);
    }
    if workers.is_empty() {
        return Err(RosterError::EmptyRoster);
    }
    let mut seen = HashSet::with_capacity(workers.len());
    for worker in workers {
        validate_worker(worker)?;
        if !seen.insert(worker.id.trim()) {
            return Err(RosterError::DuplicateWorker(worker.id.trim().to_string()));
        }
    }
    Ok(())
}

/// A worker belongs to one team at a time.
pub fn ensure_unassigned(teams: &[Team], workers: &[NewWorker]) -> Result<(), RosterError> {
    for worker in workers {
        let id = WorkerId::new(worker.id.trim());
        if let Some(team) = teams.iter().find(|t| t.worker(&id).is_some()) {
            return Err(RosterError::AssignedElsewhere {
                worker: id.to_string(),
                team: team.id.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::worker::AttendanceStatus;
    use chrono::Utc;

    fn team() -> Team {
        Team {
            id: TeamId::new("team-001"),
            name: "Canal Repair Unit A".into(),
            location: None,
            supervisor: None,
            workers: vec![Worker::new("W-1001", "Ravi Kumar", "IIRS:RVKMR-1001")],
        }
    }

    #[test]
    fn apply_attendance_marks_worker_present() {
        let mut team = team();
        let record = AttendanceRecord::present(team.id.clone(), WorkerId::new("W-1001"), Utc::now());
        team.apply_attendance(&record).unwrap();
        let worker = team.worker(&WorkerId::new("W-1001")).unwrap();
        assert_eq!(worker.status, AttendanceStatus::Present);
        assert_eq!(worker.marked_at, Some(record.marked_at));
        assert_eq!(team.present_count(), 1);
    }

    #[test]
    fn apply_attendance_rejects_unknown_worker() {
        let mut team = team();
        let record = AttendanceRecord::present(team.id.clone(), WorkerId::new("W-9"), Utc::now());
        assert_eq!(
            team.apply_attendance(&record),
            Err(RosterError::UnknownWorker("W-9".into()))
        );
    }

    #[test]
    fn add_and_remove_workers() {
        let mut team = team();
        team.add_worker(NewWorker::new("W-1002", "Sita Devi", "IIRS:STDV-1002"))
            .unwrap();
        assert_eq!(
            team.add_worker(NewWorker::new("W-1002", "Again", "IIRS:X"))
                .unwrap_err(),
            RosterError::DuplicateWorker("W-1002".into())
        );
        let removed = team.remove_worker(&WorkerId::new("W-1001")).unwrap();
        assert_eq!(removed.name, "Ravi Kumar");
        assert_eq!(team.workers.len(), 1);
    }

    #[test]
    fn new_team_validation() {
        let worker = NewWorker::new("W-1", "A", "IIRS:A");
        assert_eq!(validate_new_team(" ", &[worker.clone()]), Err(RosterError::EmptyName));
        assert_eq!(validate_new_team("Crew", &[]), Err(RosterError::EmptyRoster));
        assert_eq!(
            validate_new_team("Crew", &[worker.clone(), worker.clone()]),
            Err(RosterError::DuplicateWorker("W-1".into()))
        );
        assert!(validate_new_team("Crew", &[worker]).is_ok());
    }

    #[test]
    fn worker_on_another_team_cannot_be_reassigned() {
        let teams = [team()];
        assert_eq!(
            ensure_unassigned(&teams, &[NewWorker::new(" W-1001 ", "Ravi", "IIRS:R")]),
            Err(RosterError::AssignedElsewhere {
                worker: "W-1001".into(),
                team: "team-001".into(),
            })
        );
        assert!(ensure_unassigned(&teams, &[NewWorker::new("W-1002", "Sita", "IIRS:S")]).is_ok());
    }
}
