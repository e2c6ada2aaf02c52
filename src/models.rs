use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{NewWorker, TeamId, WorkerId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "test1")]
    pub username: String,
    #[schema(example = "pass")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    /// Display name; older backends only send token and username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTeamReq {
    #[schema(example = "Canal Repair Unit C")]
    pub name: String,
    #[serde(default)]
    pub workers: Vec<NewWorker>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceReq {
    #[schema(value_type = String, example = "team-001")]
    pub team_id: TeamId,
    #[schema(value_type = String, example = "W-1001")]
    pub worker_id: WorkerId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceResponse {
    pub ok: bool,
    /// True when the worker was already marked present for the day.
    #[serde(default)]
    pub already_marked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_at: Option<DateTime<Utc>>,
}

/// Documentation-only shape of the `/verify-id` multipart body.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyIdUpload {
    #[schema(example = "W-1001")]
    pub worker_id: String,
    #[schema(example = "IIRS:RVKMR-1001")]
    pub iirs_token: String,
    #[schema(value_type = Option<String>, format = Binary)]
    pub id_image: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub role: String,
    pub exp: usize,
    pub jti: String,
}
