use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use thiserror::Error;

/// The two ordered verification stages. Each owns its own camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Document,
    Biometric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    Automated,
    ManualOverride,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Display, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum StageState {
    #[default]
    Idle,
    Capturing,
    Verifying,
    Verified {
        confidence: f64,
        method: VerificationMethod,
    },
    Failed {
        confidence: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum StageEvent {
    BeginCapture,
    Cancel,
    Submit,
    Resolve {
        matched: bool,
        confidence: f64,
    },
    /// The verification call failed; the capture is kept for another submit.
    Interrupt,
    ManualEntry {
        matched: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{from} cannot accept {event}")]
pub struct IllegalTransition {
    pub from: &'static str,
    pub event: &'static str,
}

impl StageState {
    pub fn is_idle(&self) -> bool {
        matches!(self, StageState::Idle)
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, StageState::Verified { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StageState::Failed { .. })
    }

    /// Single-stage transition table. Anything not listed is rejected.
    pub fn transition(self, event: StageEvent) -> Result<StageState, IllegalTransition> {
        use StageEvent as E;
        use StageState as S;

        let next = match (self, event) {
            (S::Idle | S::Failed { .. } | S::Capturing, E::BeginCapture) => S::Capturing,
            (S::Capturing, E::Cancel) => S::Idle,
            (S::Capturing, E::Submit) => S::Verifying,
            (S::Verifying, E::Resolve { matched: true, confidence }) => S::Verified {
                confidence,
                method: VerificationMethod::Automated,
            },
            (S::Verifying, E::Resolve { matched: false, confidence }) => S::Failed { confidence },
            (S::Verifying, E::Interrupt) => S::Capturing,
            (S::Idle | S::Capturing | S::Failed { .. }, E::ManualEntry { matched: true }) => {
                S::Verified {
                    confidence: 1.0,
                    method: VerificationMethod::ManualOverride,
                }
            }
            (S::Idle | S::Capturing | S::Failed { .. }, E::ManualEntry { matched: false }) => {
                S::Failed { confidence: 0.0 }
            }
            (from, event) => {
                return Err(IllegalTransition {
                    from: from.into(),
                    event: event.into(),
                });
            }
        };
        Ok(next)
    }
}
