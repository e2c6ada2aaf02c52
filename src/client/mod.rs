//! Contracts the workflow consumes: HTTP transport, directory, attendance
//! recording and credential checks, each with an in-process and a remote
//! variant.

pub mod authenticator;
pub mod directory;
pub mod http;
pub mod recorder;

use std::sync::Arc;

pub use authenticator::{Authenticated, Authenticator, DEMO_TOKEN, RemoteAuthenticator, StaticAuthenticator};
pub use directory::{DirectoryClient, InMemoryDirectory, RemoteDirectory};
pub use http::{ApiClient, ClientError, TokenHandle};
pub use recorder::{AttendanceRecorder, RemoteAttendanceRecorder};

use crate::config::Config;
use crate::workflow::{
    Matcher, RemoteMatcher, SimulatedBiometricMatcher, SimulatedDocumentMatcher,
    SimulatedMatcherConfig,
};

/// The set of backends a client session talks to.
#[derive(Clone)]
pub struct ClientServices {
    pub authenticator: Arc<dyn Authenticator>,
    pub directory: Arc<dyn DirectoryClient>,
    pub recorder: Arc<dyn AttendanceRecorder>,
    pub document_matcher: Arc<dyn Matcher>,
    pub biometric_matcher: Arc<dyn Matcher>,
}

impl ClientServices {
    /// Everything in-process: fixed roster, seeded teams, simulated matchers.
    pub fn mock(matcher: SimulatedMatcherConfig) -> Self {
        Self::mock_with(
            Arc::new(InMemoryDirectory::seeded()),
            Arc::new(SimulatedDocumentMatcher::new(matcher)),
        )
    }

    pub fn mock_with(
        directory: Arc<InMemoryDirectory>,
        document_matcher: Arc<dyn Matcher>,
    ) -> Self {
        Self {
            authenticator: Arc::new(StaticAuthenticator),
            directory: directory.clone(),
            recorder: directory,
            document_matcher,
            biometric_matcher: Arc::new(SimulatedBiometricMatcher),
        }
    }

    /// Backend-backed services. The HTTP contract has no biometric
    /// endpoint, so that stage stays on the simulated matcher.
    pub fn remote(client: ApiClient) -> Self {
        Self {
            authenticator: Arc::new(RemoteAuthenticator::new(client.clone())),
            directory: Arc::new(RemoteDirectory::new(client.clone())),
            recorder: Arc::new(RemoteAttendanceRecorder::new(client.clone())),
            document_matcher: Arc::new(RemoteMatcher::new(client)),
            biometric_matcher: Arc::new(SimulatedBiometricMatcher),
        }
    }

    pub fn from_config(config: &Config, token: TokenHandle) -> Result<Self, ClientError> {
        if config.use_mocks {
            tracing::info!("using in-process mock services");
            Ok(Self::mock(config.simulated_matcher()))
        } else {
            tracing::info!(base_url = %config.api_base_url, "using remote services");
            Ok(Self::remote(ApiClient::new(config.api_base_url.clone(), token)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned()).unwrap()
    }

    #[tokio::test]
    async fn mock_mode_serves_the_seeded_roster() {
        let services = ClientServices::from_config(&config(&[]), Arc::new(RwLock::new(None))).unwrap();
        let teams = services.directory.list_teams().await.unwrap();
        assert_eq!(teams.len(), 2);
        let signed_in = services.authenticator.authenticate("test1", "pass").await.unwrap();
        assert_eq!(signed_in.map(|a| a.token).as_deref(), Some(DEMO_TOKEN));
    }

    #[tokio::test]
    async fn remote_mode_reports_transport_faults() {
        let services = ClientServices::from_config(
            &config(&[("USE_MOCKS", "false"), ("API_BASE_URL", "http://127.0.0.1:9/api")]),
            Arc::new(RwLock::new(None)),
        )
        .unwrap();
        let err = services.directory.list_teams().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
