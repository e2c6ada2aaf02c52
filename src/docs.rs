use crate::model::{AttendanceStatus, NewWorker, Supervisor, Team, Worker};
use crate::models::{
    CreateTeamReq, LoginReqDto, LoginResponse, MarkAttendanceReq, MarkAttendanceResponse,
    VerifyIdUpload,
};
use crate::workflow::MatchOutcome;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "IIRS Attendance API",
        version = "1.0.0",
        description = r#"
## MNREGA Worksite Attendance

Backend for supervisors marking daily attendance of worksite workers after a
two-stage identity check.

### Key Features
- **Teams**
  - List teams with their worker rosters, create new teams
- **Verification**
  - Match a worker's IIRS token and optional ID photo
- **Attendance**
  - Mark a worker present; repeated marks on the same day are no-ops

### Security
Every endpoint except `/login` needs a **JWT Bearer** token.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::teams::list_teams,
        crate::api::teams::create_team,

        crate::api::verify::verify_id,

        crate::api::attendance::mark_attendance,
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            Supervisor,
            Team,
            Worker,
            NewWorker,
            AttendanceStatus,
            CreateTeamReq,
            MarkAttendanceReq,
            MarkAttendanceResponse,
            MatchOutcome,
            VerifyIdUpload,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Supervisor login"),
        (name = "Teams", description = "Team and roster APIs"),
        (name = "Verification", description = "Document verification APIs"),
        (name = "Attendance", description = "Attendance marking APIs"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/api/login", "/api/me", "/api/teams", "/api/verify-id", "/api/attendance"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
