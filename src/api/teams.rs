use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{error, info};

use crate::auth::auth::AuthUser;
use crate::client::{ClientError, DirectoryClient};
use crate::models::CreateTeamReq;
use crate::state::AppState;

/// List all teams with their rosters
#[utoipa::path(
    get,
    path = "/api/teams",
    responses(
        (status = 200, description = "All teams", body = [crate::model::Team]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Teams"
)]
pub async fn list_teams(
    _auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let teams = state.directory.list_teams().await.map_err(|e| {
        error!(error = %e, "Listing teams failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;
    Ok(HttpResponse::Ok().json(teams))
}

/// Create a team; the server assigns its id
#[utoipa::path(
    post,
    path = "/api/teams",
    request_body = CreateTeamReq,
    responses(
        (status = 201, description = "Team created", body = crate::model::Team),
        (status = 400, description = "Missing name, empty roster or bad worker", body = Object, example = json!({
            "error": "a team needs at least one worker"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Teams"
)]
pub async fn create_team(
    auth: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<CreateTeamReq>,
) -> actix_web::Result<HttpResponse> {
    let CreateTeamReq { name, workers } = body.into_inner();

    match state.directory.create_team(&name, workers).await {
        Ok(team) => {
            info!(team_id = %team.id, created_by = auth.username(), "Team created");
            Ok(HttpResponse::Created().json(team))
        }
        Err(ClientError::Invalid(e)) => Ok(HttpResponse::BadRequest().json(json!({
            "error": e.to_string()
        }))),
        Err(e) => {
            error!(error = %e, "Creating team failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}
