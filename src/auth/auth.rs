use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

use crate::model::Supervisor;

/// Supervisor attached to the request by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub supervisor: Supervisor,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("Missing token")),
        )
    }
}

impl AuthUser {
    pub fn username(&self) -> &str {
        &self.supervisor.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SUPERVISOR_ROLE;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn extracts_the_supervisor_set_by_the_middleware() {
        let req = TestRequest::default().to_http_request();
        assert!(AuthUser::extract(&req).await.is_err());

        req.extensions_mut().insert(AuthUser {
            supervisor: Supervisor {
                username: "test1".into(),
                name: "Test Admin 1".into(),
                role: SUPERVISOR_ROLE.into(),
            },
        });
        let user = AuthUser::extract(&req).await.unwrap();
        assert_eq!(user.username(), "test1");
    }
}
