use async_trait::async_trait;
use tracing::debug;

use super::http::{ApiClient, ClientError};
use crate::auth::credentials;
use crate::model::{SUPERVISOR_ROLE, Supervisor};
use crate::models::LoginReqDto;

/// Token handed out by the fixed-roster authenticator.
pub const DEMO_TOKEN: &str = "demo-token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub supervisor: Supervisor,
    pub token: String,
}

/// Checks supervisor credentials. `Ok(None)` means "not authenticated" and
/// never says which field was wrong.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Authenticated>, ClientError>;
}

/// Authenticates against the built-in supervisor roster.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticAuthenticator;

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Authenticated>, ClientError> {
        Ok(
            credentials::authenticate(username, password).map(|supervisor| Authenticated {
                supervisor,
                token: DEMO_TOKEN.to_string(),
            }),
        )
    }
}

#[derive(Debug, Clone)]
pub struct RemoteAuthenticator {
    client: ApiClient,
}

impl RemoteAuthenticator {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Authenticator for RemoteAuthenticator {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Authenticated>, ClientError> {
        let req = LoginReqDto {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.client.login(&req).await {
            Ok(resp) => {
                let supervisor = Supervisor {
                    name: resp.name.unwrap_or_else(|| resp.username.clone()),
                    role: resp.role.unwrap_or_else(|| SUPERVISOR_ROLE.to_string()),
                    username: resp.username,
                };
                Ok(Some(Authenticated {
                    supervisor,
                    token: resp.token,
                }))
            }
            Err(e) if e.is_unauthorized() || e.status() == Some(400) => {
                debug!("backend rejected credentials");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_roster_accepts_known_pairs_only() {
        let auth = StaticAuthenticator;
        let ok = auth.authenticate("test2", "pass2").await.unwrap().unwrap();
        assert_eq!(ok.supervisor.name, "Test Admin 2");
        assert_eq!(ok.supervisor.role, SUPERVISOR_ROLE);
        assert_eq!(ok.token, DEMO_TOKEN);

        assert!(auth.authenticate("test2", "pass").await.unwrap().is_none());
        assert!(auth.authenticate("nobody", "pass2").await.unwrap().is_none());
    }
}
