use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::capture::{CameraGuard, CaptureError, FrameSource, ImageBuffer};
use super::error::WorkflowError;
use super::matcher::{MatchError, MatchOutcome, MatchRequest, Matcher};
use super::state::{IllegalTransition, Stage, StageEvent, StageState};
use crate::client::AttendanceRecorder;
use crate::model::{AttendanceRecord, TeamId, Worker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    /// Failed automated document checks before manual override opens.
    pub max_document_attempts: u32,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            max_document_attempts: 3,
        }
    }
}

/// Collaborators a session needs. Cheap to clone.
#[derive(Clone)]
pub struct VerificationDeps {
    pub frames: Arc<dyn FrameSource>,
    pub document_matcher: Arc<dyn Matcher>,
    pub biometric_matcher: Arc<dyn Matcher>,
    pub policy: VerificationPolicy,
}

impl fmt::Debug for VerificationDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationDeps")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct StageSlot {
    state: StageState,
    camera: Option<CameraGuard>,
    image: Option<ImageBuffer>,
}

impl StageSlot {
    fn clear(&mut self) {
        self.state = StageState::Idle;
        self.camera = None;
        self.image = None;
    }
}

/// Proof that a verification request was issued by a session. Results are
/// only accepted back while the session is still on the same generation.
#[derive(Debug, Clone)]
pub struct VerificationTicket {
    stage: Stage,
    generation: u64,
    request: MatchRequest,
}

impl VerificationTicket {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn request(&self) -> &MatchRequest {
        &self.request
    }
}

/// Transient per-worker verification state.
#[derive(Debug)]
pub struct VerificationSession {
    team_id: TeamId,
    worker: Worker,
    deps: VerificationDeps,
    document: StageSlot,
    biometric: StageSlot,
    document_attempts: u32,
    generation: u64,
    in_flight: Option<(Stage, u64)>,
}

impl VerificationSession {
    pub fn new(team_id: TeamId, worker: Worker, deps: VerificationDeps) -> Self {
        debug!(team_id = %team_id, worker_id = %worker.id, "verification session opened");
        Self {
            team_id,
            worker,
            deps,
            document: StageSlot::default(),
            biometric: StageSlot::default(),
            document_attempts: 0,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn team_id(&self) -> &TeamId {
        &self.team_id
    }

    pub fn worker(&self) -> &Worker {
        &self.worker
    }

    pub fn document_state(&self) -> StageState {
        self.document.state
    }

    pub fn biometric_state(&self) -> StageState {
        self.biometric.state
    }

    pub fn document_attempts(&self) -> u32 {
        self.document_attempts
    }

    pub fn policy(&self) -> VerificationPolicy {
        self.deps.policy
    }

    pub fn image(&self, stage: Stage) -> Option<&ImageBuffer> {
        self.slot(stage).image.as_ref()
    }

    pub fn holds_camera(&self, stage: Stage) -> bool {
        self.slot(stage).camera.is_some()
    }

    /// Idle on both stages, no attempts, nothing captured, no camera held.
    pub fn is_pristine(&self) -> bool {
        [Stage::Document, Stage::Biometric].into_iter().all(|stage| {
            let slot = self.slot(stage);
            slot.state.is_idle() && slot.camera.is_none() && slot.image.is_none()
        }) && self.document_attempts == 0
            && self.in_flight.is_none()
    }

    pub fn automated_capture_available(&self) -> bool {
        !self.document.state.is_verified()
            && self.document_attempts < self.deps.policy.max_document_attempts
    }

    pub fn manual_override_available(&self) -> bool {
        !self.document.state.is_verified()
            && !matches!(self.document.state, StageState::Verifying)
            && self.document_attempts >= self.deps.policy.max_document_attempts
    }

    pub fn is_cleared(&self) -> bool {
        self.document.state.is_verified() && self.biometric.state.is_verified()
    }

    // ---- document stage ----

    #[instrument(skip(self), fields(worker_id = %self.worker.id))]
    pub fn begin_document_capture(&mut self) -> Result<(), WorkflowError> {
        if !self.document.state.is_verified()
            && self.document_attempts >= self.deps.policy.max_document_attempts
        {
            return Err(WorkflowError::AutomatedCaptureExhausted {
                attempts: self.document_attempts,
            });
        }
        self.begin_capture(Stage::Document)
    }

    pub fn capture_document_frame(&mut self) -> Result<&ImageBuffer, WorkflowError> {
        self.capture_frame(Stage::Document)
    }

    /// Upload path: use an existing image instead of the camera.
    pub fn attach_document_image(&mut self, image: ImageBuffer) -> Result<(), WorkflowError> {
        if !matches!(self.document.state, StageState::Capturing) {
            return Err(self.not_capturing(Stage::Document));
        }
        if image.is_empty() {
            return Err(CaptureError::EmptyFrame.into());
        }
        self.document.camera = None;
        self.document.image = Some(image);
        Ok(())
    }

    pub fn cancel_document_capture(&mut self) -> Result<(), WorkflowError> {
        self.cancel_capture(Stage::Document)
    }

    /// Move the document stage to `Verifying` and hand out the request.
    /// `submitted_token` overrides the on-file IIRS token when non-blank.
    pub fn start_document_verification(
        &mut self,
        submitted_token: Option<&str>,
    ) -> Result<VerificationTicket, WorkflowError> {
        let token = submitted_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.worker.iirs_token)
            .to_string();
        self.start_verification(Stage::Document, token)
    }

    pub async fn verify_document(
        &mut self,
        submitted_token: Option<&str>,
    ) -> Result<StageState, WorkflowError> {
        let ticket = self.start_document_verification(submitted_token)?;
        let matcher = Arc::clone(&self.deps.document_matcher);
        let result = matcher.match_submission(ticket.request()).await;
        self.finish_verification(ticket, result)
    }

    /// Supervisor-typed ID compared exactly against the worker's on-file ID.
    #[instrument(skip(self, entered), fields(worker_id = %self.worker.id))]
    pub fn manual_override(&mut self, entered: &str) -> Result<StageState, WorkflowError> {
        let required = self.deps.policy.max_document_attempts;
        if !self.document.state.is_verified() && self.document_attempts < required {
            return Err(WorkflowError::ManualOverrideUnavailable {
                attempts: self.document_attempts,
                required,
            });
        }
        let matched = entered == self.worker.id.as_str();
        let next = self
            .document
            .state
            .transition(StageEvent::ManualEntry { matched })
            .map_err(|source| WorkflowError::IllegalTransition {
                stage: Stage::Document,
                source,
            })?;
        self.document.state = next;
        self.document.camera = None;
        info!(matched, "manual document override");
        Ok(next)
    }

    // ---- biometric stage ----

    pub fn begin_biometric_capture(&mut self) -> Result<(), WorkflowError> {
        self.ensure_document_verified()?;
        self.begin_capture(Stage::Biometric)
    }

    pub fn capture_biometric_frame(&mut self) -> Result<&ImageBuffer, WorkflowError> {
        self.ensure_document_verified()?;
        self.capture_frame(Stage::Biometric)
    }

    pub fn cancel_biometric_capture(&mut self) -> Result<(), WorkflowError> {
        self.cancel_capture(Stage::Biometric)
    }

    pub fn start_biometric_verification(&mut self) -> Result<VerificationTicket, WorkflowError> {
        self.ensure_document_verified()?;
        let token = self.worker.iirs_token.clone();
        self.start_verification(Stage::Biometric, token)
    }

    pub async fn verify_biometric(&mut self) -> Result<StageState, WorkflowError> {
        let ticket = self.start_biometric_verification()?;
        let matcher = Arc::clone(&self.deps.biometric_matcher);
        let result = matcher.match_submission(ticket.request()).await;
        self.finish_verification(ticket, result)
    }

    // ---- shared ----

    /// Apply a matcher result. Results for a request this session no longer
    /// waits on are discarded without touching any state.
    pub fn finish_verification(
        &mut self,
        ticket: VerificationTicket,
        result: Result<MatchOutcome, MatchError>,
    ) -> Result<StageState, WorkflowError> {
        if self.in_flight != Some((ticket.stage, ticket.generation)) {
            warn!(
                worker_id = %self.worker.id,
                stage = %ticket.stage,
                "stale verification response discarded"
            );
            return Err(WorkflowError::StaleResponse);
        }
        self.in_flight = None;
        let stage = ticket.stage;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.apply(stage, StageEvent::Interrupt)?;
                warn!(worker_id = %self.worker.id, %stage, error = %e, "verification call failed");
                return Err(e.into());
            }
        };

        let next = self.apply(
            stage,
            StageEvent::Resolve {
                matched: outcome.matched,
                confidence: outcome.confidence,
            },
        )?;
        if stage == Stage::Document && !outcome.matched {
            self.document_attempts += 1;
            if self.document_attempts >= self.deps.policy.max_document_attempts {
                info!(
                    worker_id = %self.worker.id,
                    attempts = self.document_attempts,
                    "automated document checks exhausted, manual override available"
                );
            }
        }
        info!(
            worker_id = %self.worker.id,
            %stage,
            matched = outcome.matched,
            confidence = outcome.confidence,
            "verification resolved"
        );
        Ok(next)
    }

    /// Record attendance for a cleared worker, then reset the session.
    #[instrument(skip(self, recorder), fields(team_id = %self.team_id, worker_id = %self.worker.id))]
    pub async fn commit_attendance(
        &mut self,
        recorder: &dyn AttendanceRecorder,
    ) -> Result<AttendanceRecord, WorkflowError> {
        if !self.is_cleared() {
            return Err(WorkflowError::NotCleared {
                document: self.document.state.into(),
                biometric: self.biometric.state.into(),
            });
        }
        let receipt = recorder
            .mark_present(&self.team_id, &self.worker.id)
            .await
            .map_err(WorkflowError::Attendance)?;
        if !receipt.ok {
            return Err(WorkflowError::AttendanceRejected);
        }
        let record = AttendanceRecord::present(
            self.team_id.clone(),
            self.worker.id.clone(),
            receipt.marked_at.unwrap_or_else(Utc::now),
        );
        info!(already_marked = receipt.already_marked, "attendance committed");
        self.reset();
        Ok(record)
    }

    /// Back to idle on both stages; drops images and releases cameras.
    pub fn reset(&mut self) {
        self.document.clear();
        self.biometric.clear();
        self.document_attempts = 0;
        self.in_flight = None;
        self.generation += 1;
        debug!(worker_id = %self.worker.id, generation = self.generation, "verification session reset");
    }

    fn slot(&self, stage: Stage) -> &StageSlot {
        match stage {
            Stage::Document => &self.document,
            Stage::Biometric => &self.biometric,
        }
    }

    fn slot_mut(&mut self, stage: Stage) -> &mut StageSlot {
        match stage {
            Stage::Document => &mut self.document,
            Stage::Biometric => &mut self.biometric,
        }
    }

    fn not_capturing(&self, stage: Stage) -> WorkflowError {
        WorkflowError::IllegalTransition {
            stage,
            source: IllegalTransition {
                from: self.slot(stage).state.into(),
                event: "capture",
            },
        }
    }

    fn apply(&mut self, stage: Stage, event: StageEvent) -> Result<StageState, WorkflowError> {
        let slot = self.slot_mut(stage);
        let next = slot
            .state
            .transition(event)
            .map_err(|source| WorkflowError::IllegalTransition { stage, source })?;
        slot.state = next;
        Ok(next)
    }

    fn ensure_document_verified(&self) -> Result<(), WorkflowError> {
        if self.document.state.is_verified() {
            Ok(())
        } else {
            Err(WorkflowError::DocumentNotVerified {
                document: self.document.state.into(),
            })
        }
    }

    fn begin_capture(&mut self, stage: Stage) -> Result<(), WorkflowError> {
        let next = self
            .slot(stage)
            .state
            .transition(StageEvent::BeginCapture)
            .map_err(|source| WorkflowError::IllegalTransition { stage, source })?;
        if self.slot(stage).camera.is_none() {
            let guard = CameraGuard::acquire(Arc::clone(&self.deps.frames), stage)?;
            self.slot_mut(stage).camera = Some(guard);
        }
        let slot = self.slot_mut(stage);
        if !matches!(slot.state, StageState::Capturing) {
            slot.image = None;
        }
        slot.state = next;
        Ok(())
    }

    fn capture_frame(&mut self, stage: Stage) -> Result<&ImageBuffer, WorkflowError> {
        if !matches!(self.slot(stage).state, StageState::Capturing) {
            return Err(self.not_capturing(stage));
        }
        let slot = self.slot_mut(stage);
        let frame = slot
            .camera
            .as_ref()
            .ok_or(WorkflowError::NoActiveCamera(stage))?
            .snapshot()?;
        slot.camera = None;
        Ok(slot.image.insert(frame))
    }

    fn cancel_capture(&mut self, stage: Stage) -> Result<(), WorkflowError> {
        self.apply(stage, StageEvent::Cancel)?;
        let slot = self.slot_mut(stage);
        slot.camera = None;
        slot.image = None;
        Ok(())
    }

    fn start_verification(
        &mut self,
        stage: Stage,
        submitted_token: String,
    ) -> Result<VerificationTicket, WorkflowError> {
        self.apply(stage, StageEvent::Submit)?;
        self.generation += 1;
        self.in_flight = Some((stage, self.generation));

        let slot = self.slot_mut(stage);
        slot.camera = None;
        let request = MatchRequest {
            worker_id: self.worker.id.clone(),
            submitted_token,
            image: self.slot(stage).image.clone(),
        };
        debug!(worker_id = %self.worker.id, %stage, has_image = request.has_image(), "verification submitted");
        Ok(VerificationTicket {
            stage,
            generation: self.generation,
            request,
        })
    }
}
