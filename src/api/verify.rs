use actix_multipart::form::{MultipartForm, bytes::Bytes, text::Text};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{error, info};

use crate::auth::auth::AuthUser;
use crate::model::WorkerId;
use crate::state::AppState;
use crate::workflow::{ImageBuffer, MatchRequest};

#[derive(Debug, MultipartForm)]
pub struct VerifyIdForm {
    #[multipart(rename = "workerId")]
    pub worker_id: Text<String>,
    #[multipart(rename = "iirsToken")]
    pub iirs_token: Text<String>,
    #[multipart(rename = "idImage")]
    pub id_image: Option<Bytes>,
}

/// Document verification
#[utoipa::path(
    post,
    path = "/api/verify-id",
    request_body(content = crate::models::VerifyIdUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Match decision; a non-match is still a 200", body = crate::workflow::MatchOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown worker", body = Object, example = json!({
            "error": "Worker not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Verification"
)]
pub async fn verify_id(
    _auth: AuthUser,
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<VerifyIdForm>,
) -> actix_web::Result<impl Responder> {
    let worker_id = WorkerId::new(form.worker_id.into_inner());
    if state.directory.find_worker(&worker_id).await.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "Worker not found"
        })));
    }

    let image = form.id_image.map(|file| {
        let content_type = file
            .content_type
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        ImageBuffer::new(file.data.to_vec(), content_type)
    });
    let request = MatchRequest {
        worker_id,
        submitted_token: form.iirs_token.into_inner(),
        image,
    };

    let outcome = state
        .document_matcher
        .match_submission(&request)
        .await
        .map_err(|e| {
            error!(worker_id = %request.worker_id, error = %e, "Document matcher failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    info!(
        worker_id = %request.worker_id,
        matched = outcome.matched,
        confidence = outcome.confidence,
        "Document verification answered"
    );
    Ok(HttpResponse::Ok().json(outcome))
}
