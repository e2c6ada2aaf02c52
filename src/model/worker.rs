use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display as StrumDisplay, EnumString};
use utoipa::ToSchema;

/// Government ID token of a worker. Opaque to callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    StrumDisplay,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Pending,
    Present,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": "W-1001",
        "name": "Ravi Kumar",
        "iirsData": "IIRS:RVKMR-1001",
        "status": "pending"
    })
)]
pub struct Worker {
    #[schema(value_type = String, example = "W-1001")]
    pub id: WorkerId,
    pub name: String,
    /// Placeholder biometric / database reference.
    #[serde(rename = "iirsData")]
    pub iirs_token: String,
    #[serde(default)]
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_at: Option<DateTime<Utc>>,
}

impl Worker {
    pub fn new(id: impl Into<String>, name: impl Into<String>, iirs_token: impl Into<String>) -> Self {
        Self {
            id: WorkerId::new(id),
            name: name.into(),
            iirs_token: iirs_token.into(),
            status: AttendanceStatus::Pending,
            marked_at: None,
        }
    }

    pub fn is_present(&self) -> bool {
        self.status == AttendanceStatus::Present
    }
}

/// Worker as entered on the "new work" form, before it joins a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewWorker {
    #[schema(example = "W-3011")]
    pub id: String,
    #[schema(example = "Meena Kumari")]
    pub name: String,
    #[serde(rename = "iirsData")]
    #[schema(example = "IIRS:MNKM-3011")]
    pub iirs_token: String,
}

impl NewWorker {
    pub fn new(id: impl Into<String>, name: impl Into<String>, iirs_token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            iirs_token: iirs_token.into(),
        }
    }

    pub fn into_worker(self) -> Worker {
        Worker::new(self.id.trim(), self.name.trim(), self.iirs_token.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_lowercase_labels() {
        assert_eq!(AttendanceStatus::Present.to_string(), "present");
        assert_eq!(AttendanceStatus::from_str("absent").unwrap(), AttendanceStatus::Absent);
    }

    #[test]
    fn worker_uses_reference_wire_names() {
        let worker = Worker::new("W-1001", "Ravi Kumar", "IIRS:RVKMR-1001");
        let json = serde_json::to_value(&worker).unwrap();
        assert_eq!(json["iirsData"], "IIRS:RVKMR-1001");
        assert_eq!(json["status"], "pending");
        assert!(json.get("markedAt").is_none());
    }

    #[test]
    fn missing_status_defaults_to_pending() {
        let worker: Worker =
            serde_json::from_str(r#"{"id":"W-1","name":"A","iirsData":"IIRS:A"}"#).unwrap();
        assert_eq!(worker.status, AttendanceStatus::Pending);
    }
}
