use std::sync::Arc;

use crate::client::InMemoryDirectory;
use crate::config::Config;
use crate::workflow::{Matcher, SimulatedDocumentMatcher};

/// Shared backend state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<InMemoryDirectory>,
    pub document_matcher: Arc<dyn Matcher>,
}

impl AppState {
    pub fn new(directory: Arc<InMemoryDirectory>, document_matcher: Arc<dyn Matcher>) -> Self {
        Self {
            directory,
            document_matcher,
        }
    }

    /// Seeded teams and the simulated document matcher.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(InMemoryDirectory::seeded()),
            Arc::new(SimulatedDocumentMatcher::new(config.simulated_matcher())),
        )
    }
}
