use crate::{
    api::{attendance, teams, verify},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};

type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter settings, built once and shared by every worker.
pub struct RateLimits {
    login: LimiterConfig,
    protected: LimiterConfig,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<LimiterConfig> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests/min"))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    cfg.service(
        web::scope(&config.api_prefix)
            // Public
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&limits.login))
                    .route(web::post().to(handlers::login)),
            )
            // Protected
            .service(
                web::scope("")
                    .wrap(from_fn(auth_middleware))
                    .wrap(Governor::new(&limits.protected))
                    .service(web::resource("/me").route(web::get().to(handlers::me)))
                    .service(
                        web::resource("/teams")
                            .route(web::get().to(teams::list_teams))
                            .route(web::post().to(teams::create_team)),
                    )
                    .service(web::resource("/verify-id").route(web::post().to(verify::verify_id)))
                    .service(
                        web::resource("/attendance")
                            .route(web::post().to(attendance::mark_attendance)),
                    ),
            ),
    );
}

// LOGIN
//  └─ token (ACCESS_TOKEN_TTL seconds)

// API REQUEST
//  └─ Authorization: Bearer token
