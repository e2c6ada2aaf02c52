pub mod attendance;
pub mod supervisor;
pub mod team;
pub mod worker;

pub use attendance::AttendanceRecord;
pub use supervisor::{SUPERVISOR_ROLE, Supervisor};
pub use team::{RosterError, Team, TeamId, ensure_unassigned, validate_new_team};
pub use worker::{AttendanceStatus, NewWorker, Worker, WorkerId};
