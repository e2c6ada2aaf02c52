use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{debug, error, info, instrument};

use crate::auth::auth::AuthUser;
use crate::auth::credentials;
use crate::auth::jwt::generate_access_token;
use crate::config::Config;
use crate::models::{LoginReqDto, LoginResponse};

/// Supervisor login
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "error": "Invalid credentials"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(config, user),
    fields(username = %user.username)
)]
pub async fn login(user: web::Json<LoginReqDto>, config: web::Data<Config>) -> impl Responder {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().json(json!({
            "error": "Username or password required"
        }));
    }

    // 2️⃣ Verify against the supervisor roster
    debug!("Verifying credentials");
    let LoginReqDto { username, password } = user.into_inner();
    let checked = web::block(move || credentials::authenticate(&username, &password)).await;

    let supervisor = match checked {
        Ok(Some(supervisor)) => supervisor,
        Ok(None) => {
            info!("Invalid credentials");
            return HttpResponse::Unauthorized().json(json!({
                "error": "Invalid credentials"
            }));
        }
        Err(e) => {
            error!(error = %e, "Credential check did not complete");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 3️⃣ Generate access token
    debug!("Generating access token");
    let token = match generate_access_token(&supervisor, &config.jwt_secret, config.access_token_ttl)
    {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        token,
        username: supervisor.username,
        name: Some(supervisor.name),
        role: Some(supervisor.role),
    })
}

/// Profile of the signed-in supervisor
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current supervisor", body = crate::model::Supervisor),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(auth.supervisor)
}
