use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::model::{RosterError, Team, TeamId, WorkerId};
use crate::models::{
    CreateTeamReq, LoginReqDto, LoginResponse, MarkAttendanceReq, MarkAttendanceResponse,
};
use crate::workflow::{MatchOutcome, MatchRequest};

/// Bearer token shared between the session store and the HTTP client.
pub type TokenHandle = Arc<RwLock<Option<String>>>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("team {0} does not exist")]
    UnknownTeam(TeamId),
    #[error("worker {worker} is not on team {team}")]
    UnknownWorker { team: TeamId, worker: WorkerId },
    #[error(transparent)]
    Invalid(#[from] RosterError),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

/// Thin client for the attendance backend. One attempt per call.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: TokenHandle,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: TokenHandle) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let request = match self.token.read().await.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), %body, "backend returned an error status");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    #[instrument(skip(self, req), fields(username = %req.username))]
    pub async fn login(&self, req: &LoginReqDto) -> Result<LoginResponse, ClientError> {
        self.send(self.http.post(self.url("/login")).json(req)).await
    }

    #[instrument(skip(self))]
    pub async fn list_teams(&self) -> Result<Vec<Team>, ClientError> {
        self.send(self.http.get(self.url("/teams"))).await
    }

    #[instrument(skip(self, req), fields(name = %req.name, workers = req.workers.len()))]
    pub async fn create_team(&self, req: &CreateTeamReq) -> Result<Team, ClientError> {
        self.send(self.http.post(self.url("/teams")).json(req)).await
    }

    #[instrument(skip(self, req), fields(worker_id = %req.worker_id, has_image = req.has_image()))]
    pub async fn verify_id(&self, req: &MatchRequest) -> Result<MatchOutcome, ClientError> {
        let mut form = Form::new()
            .text("workerId", req.worker_id.to_string())
            .text("iirsToken", req.submitted_token.clone());
        if let Some(image) = req.image.as_ref().filter(|i| !i.is_empty()) {
            let part = Part::bytes(image.bytes.clone())
                .file_name("id-image")
                .mime_str(&image.content_type)?;
            form = form.part("idImage", part);
        }
        self.send(self.http.post(self.url("/verify-id")).multipart(form))
            .await
    }

    #[instrument(skip(self, req), fields(team_id = %req.team_id, worker_id = %req.worker_id))]
    pub async fn mark_attendance(
        &self,
        req: &MarkAttendanceReq,
    ) -> Result<MarkAttendanceResponse, ClientError> {
        self.send(self.http.post(self.url("/attendance")).json(req)).await
    }
}
