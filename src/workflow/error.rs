use thiserror::Error;

use super::capture::CaptureError;
use super::matcher::MatchError;
use super::state::{IllegalTransition, Stage};
use crate::client::ClientError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("illegal {stage} transition: {source}")]
    IllegalTransition {
        stage: Stage,
        #[source]
        source: IllegalTransition,
    },

    #[error("biometric stage requires a verified document stage (document is {document})")]
    DocumentNotVerified { document: &'static str },

    #[error("automated document capture exhausted after {attempts} failed attempts; use manual override")]
    AutomatedCaptureExhausted { attempts: u32 },

    #[error("manual override opens after {required} failed document attempts ({attempts} so far)")]
    ManualOverrideUnavailable { attempts: u32, required: u32 },

    #[error("{0} stage has no open camera")]
    NoActiveCamera(Stage),

    #[error("discarded a verification response from an abandoned request")]
    StaleResponse,

    #[error("worker is not cleared (document {document}, biometric {biometric})")]
    NotCleared {
        document: &'static str,
        biometric: &'static str,
    },

    #[error("backend refused the attendance record")]
    AttendanceRejected,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("attendance commit failed: {0}")]
    Attendance(#[source] ClientError),
}
