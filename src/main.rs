use actix_multipart::form::MultipartFormConfig;
use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use std::sync::Arc;

use iirs_attendance::config::Config;
use iirs_attendance::docs::ApiDoc;
use iirs_attendance::routes::{self, RateLimits};
use iirs_attendance::state::AppState;

use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

/// ID photos are small JPEG stills.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[get("/")]
async fn index() -> impl Responder {
    "IIRS attendance backend"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    config.require_jwt_secret()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("LOG_LEVEL has an invalid value: {:?}", config.log_level))?;

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(addr = %config.server_addr, prefix = %config.api_prefix, "Server starting...");

    let limits = Arc::new(RateLimits::from_config(&config)?);
    let state = Data::new(AppState::from_config(&config));
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .app_data(config_data.clone())
            .app_data(
                MultipartFormConfig::default()
                    .total_limit(MAX_UPLOAD_BYTES)
                    .memory_limit(MAX_UPLOAD_BYTES),
            )
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config_data, &limits))
    })
    .bind(&config.server_addr)?
    .run()
    .await?;

    Ok(())
}
