use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::capture::ImageBuffer;
use crate::client::{ApiClient, ClientError};
use crate::model::WorkerId;

/// One submission to a matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRequest {
    pub worker_id: WorkerId,
    pub submitted_token: String,
    pub image: Option<ImageBuffer>,
}

impl MatchRequest {
    pub fn has_image(&self) -> bool {
        self.image.as_ref().is_some_and(|i| !i.is_empty())
    }
}

/// A non-match is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MatchOutcome {
    pub matched: bool,
    #[schema(example = 0.82)]
    pub confidence: f64,
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("no capture was supplied for worker {0}")]
    MissingCapture(WorkerId),
    #[error("verification backend failed: {0}")]
    Backend(#[from] ClientError),
}

/// Decides match / no-match for a submission.
#[async_trait]
pub trait Matcher: Send + Sync {
    async fn match_submission(&self, request: &MatchRequest) -> Result<MatchOutcome, MatchError>;
}

/// Baseline match probabilities for the simulated document matcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedMatcherConfig {
    pub with_image: f64,
    pub without_image: f64,
}

impl Default for SimulatedMatcherConfig {
    fn default() -> Self {
        Self {
            with_image: 0.75,
            without_image: 0.55,
        }
    }
}

/// Randomized stand-in for the document verification backend.
#[derive(Debug)]
pub struct SimulatedDocumentMatcher {
    config: SimulatedMatcherConfig,
    rng: Mutex<StdRng>,
}

impl SimulatedDocumentMatcher {
    pub fn new(config: SimulatedMatcherConfig) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(config: SimulatedMatcherConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn roll(&self, has_image: bool) -> MatchOutcome {
        let baseline = if has_image {
            self.config.with_image
        } else {
            self.config.without_image
        };
        let (draw, spread) = {
            let mut rng = self.rng.lock().expect("matcher rng poisoned");
            (rng.random::<f64>(), rng.random::<f64>())
        };

        let matched = draw < baseline;
        let confidence = if matched {
            truncate_hundredths(baseline + spread * (1.0 - baseline))
                .max(baseline)
                .min(1.0)
        } else {
            truncate_hundredths(spread * 0.5)
        };
        MatchOutcome {
            matched,
            confidence,
        }
    }
}

fn truncate_hundredths(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

#[async_trait]
impl Matcher for SimulatedDocumentMatcher {
    #[instrument(name = "simulated_document_match", skip(self, request), fields(worker_id = %request.worker_id))]
    async fn match_submission(&self, request: &MatchRequest) -> Result<MatchOutcome, MatchError> {
        let outcome = self.roll(request.has_image());
        debug!(
            matched = outcome.matched,
            confidence = outcome.confidence,
            has_image = request.has_image(),
            "simulated document match"
        );
        Ok(outcome)
    }
}

/// Matches any non-empty capture.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedBiometricMatcher;

#[async_trait]
impl Matcher for SimulatedBiometricMatcher {
    async fn match_submission(&self, request: &MatchRequest) -> Result<MatchOutcome, MatchError> {
        if !request.has_image() {
            return Err(MatchError::MissingCapture(request.worker_id.clone()));
        }
        Ok(MatchOutcome {
            matched: true,
            confidence: 1.0,
        })
    }
}

/// Delegates to `POST /verify-id` on the backend.
#[derive(Debug, Clone)]
pub struct RemoteMatcher {
    client: ApiClient,
}

impl RemoteMatcher {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Matcher for RemoteMatcher {
    async fn match_submission(&self, request: &MatchRequest) -> Result<MatchOutcome, MatchError> {
        Ok(self.client.verify_id(request).await?)
    }
}
