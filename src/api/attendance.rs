use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

use crate::auth::auth::AuthUser;
use crate::client::{AttendanceRecorder, ClientError};
use crate::models::MarkAttendanceReq;
use crate::state::AppState;

/// Mark a worker present for today
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendanceReq,
    responses(
        (status = 200, description = "Recorded, or already recorded today", body = crate::models::MarkAttendanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown team or worker", body = Object, example = json!({
            "error": "worker W-9 is not on team team-001"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<MarkAttendanceReq>,
) -> actix_web::Result<impl Responder> {
    let MarkAttendanceReq { team_id, worker_id } = body.into_inner();

    match state.directory.mark_present(&team_id, &worker_id).await {
        Ok(receipt) => {
            tracing::info!(
                %team_id,
                %worker_id,
                already_marked = receipt.already_marked,
                marked_by = auth.username(),
                "Attendance marked"
            );
            Ok(HttpResponse::Ok().json(receipt))
        }
        Err(e @ (ClientError::UnknownTeam(_) | ClientError::UnknownWorker { .. })) => {
            Ok(HttpResponse::NotFound().json(json!({
                "error": e.to_string()
            })))
        }
        Err(e) => {
            tracing::error!(error = %e, %team_id, %worker_id, "Mark attendance failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}
