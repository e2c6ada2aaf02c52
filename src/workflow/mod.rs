//! Two-stage identity verification for a single worker.
//!
//! The document stage must reach `Verified` before the biometric stage may
//! capture or verify anything. Both rules are enforced by
//! [`VerificationSession`] itself, so every caller gets the same gating.

pub mod capture;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod state;

pub use capture::{CameraGuard, CaptureError, FrameSource, ImageBuffer, StillFrameSource};
pub use engine::{VerificationDeps, VerificationPolicy, VerificationSession, VerificationTicket};
pub use error::WorkflowError;
pub use matcher::{
    MatchError, MatchOutcome, MatchRequest, Matcher, RemoteMatcher, SimulatedBiometricMatcher,
    SimulatedDocumentMatcher, SimulatedMatcherConfig,
};
pub use state::{IllegalTransition, Stage, StageEvent, StageState, VerificationMethod};
