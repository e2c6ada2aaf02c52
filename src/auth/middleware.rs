use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;
use tracing::debug;

use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::SUPERVISOR_ROLE;

/// Reads `Authorization: Bearer <token>`; the error is the client message.
fn bearer_token(req: &ServiceRequest) -> Result<&str, &'static str> {
    let header = req
        .headers()
        .get("Authorization")
        .ok_or("Missing Authorization header")?;
    let value = header
        .to_str()
        .map_err(|_| "Invalid Authorization header encoding")?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or("Authorization header must start with Bearer")
}

fn unauthorized(req: ServiceRequest, message: &str) -> ServiceResponse<BoxBody> {
    let resp = HttpResponse::Unauthorized().json(json!({ "error": message }));
    req.into_response(resp.map_into_boxed_body())
}

/// Admits only requests carrying a valid supervisor token and attaches the
/// supervisor as an [`AuthUser`].
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let claims = match bearer_token(&req) {
        Ok(token) => verify_token(token, &config.jwt_secret),
        Err(message) => return Ok(unauthorized(req, message)),
    };
    let claims = match claims {
        Ok(c) if c.role == SUPERVISOR_ROLE => c,
        Ok(c) => {
            debug!(role = %c.role, "token role is not allowed to mark attendance");
            return Ok(unauthorized(req, "Supervisor role required"));
        }
        Err(e) => {
            debug!(error = %e, "rejected bearer token");
            return Ok(unauthorized(req, "Invalid or expired token"));
        }
    };

    req.extensions_mut().insert(AuthUser {
        supervisor: claims.into(),
    });

    next.call(req).await
}
