use crate::model::{Caption, PhotoRef, Poem};
use crate::session::SessionFailure;
use std::fmt::Display;
use uuid::Uuid;

/// Opaque correlation token for one session, used only in logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session_{}", self.0.simple())
    }
}

/// Where a capture session currently stands.
///
/// `Idle`, `Completed` and `Failed` are the resting states; everything in
/// between means a session is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Capturing,
    Describing,
    Composing,
    Printing,
    Completed,
    Failed,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        !matches!(
            self,
            SessionState::Idle | SessionState::Completed | SessionState::Failed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Capturing => "capturing",
            SessionState::Describing => "describing",
            SessionState::Composing => "composing",
            SessionState::Printing => "printing",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
        }
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of work for one shutter press.
///
/// Transitions are methods that take the artifact the next state depends on,
/// so a session cannot reach `Describing` without a photo, `Composing`
/// without a caption, or `Printing` without a poem.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    pub id: SessionId,
    state: SessionState,
    photo: Option<PhotoRef>,
    caption: Option<Caption>,
    poem: Option<Poem>,
    failure: Option<SessionFailure>,
    history: Vec<SessionState>,
}

impl CaptureSession {
    /// Opens a session and moves it straight into `Capturing`.
    pub fn start() -> Self {
        Self {
            id: SessionId::new(),
            state: SessionState::Capturing,
            photo: None,
            caption: None,
            poem: None,
            failure: None,
            history: vec![SessionState::Idle, SessionState::Capturing],
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn photo(&self) -> Option<&PhotoRef> {
        self.photo.as_ref()
    }

    pub fn caption(&self) -> Option<&Caption> {
        self.caption.as_ref()
    }

    pub fn poem(&self) -> Option<&Poem> {
        self.poem.as_ref()
    }

    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    /// Every state visited so far, starting with `Idle`.
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    pub fn describing(&mut self, photo: PhotoRef) -> &PhotoRef {
        self.enter(SessionState::Describing);
        self.photo.insert(photo)
    }

    pub fn composing(&mut self, caption: Caption) -> &Caption {
        self.enter(SessionState::Composing);
        self.caption.insert(caption)
    }

    pub fn printing(&mut self, poem: Poem) -> &Poem {
        self.enter(SessionState::Printing);
        self.poem.insert(poem)
    }

    pub fn complete(&mut self) {
        self.enter(SessionState::Completed);
    }

    pub fn fail(&mut self, failure: SessionFailure) {
        self.enter(SessionState::Failed);
        self.failure = Some(failure);
    }

    fn enter(&mut self, next: SessionState) {
        self.state = next;
        self.history.push(next);
    }
}

/// How a finished session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed(Poem),
    Failed(SessionFailure),
}

/// Summary of one accepted shutter press.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub id: SessionId,
    pub history: Vec<SessionState>,
    pub outcome: SessionOutcome,
}

impl SessionReport {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, SessionOutcome::Completed(_))
    }

    pub fn failure(&self) -> Option<&SessionFailure> {
        match &self.outcome {
            SessionOutcome::Failed(failure) => Some(failure),
            SessionOutcome::Completed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FailureKind;

    #[test]
    fn happy_path_history() {
        let mut session = CaptureSession::start();
        assert_eq!(session.state(), SessionState::Capturing);

        session.describing(PhotoRef::new("/tmp/image.jpg", 10));
        session.composing(Caption::new("a dog"));
        session.printing(Poem::new("woof"));
        session.complete();

        assert_eq!(
            session.history(),
            &[
                SessionState::Idle,
                SessionState::Capturing,
                SessionState::Describing,
                SessionState::Composing,
                SessionState::Printing,
                SessionState::Completed,
            ]
        );
        assert_eq!(session.caption().map(Caption::as_str), Some("a dog"));
        assert!(session.failure().is_none());
    }

    #[test]
    fn failure_is_recorded() {
        let mut session = CaptureSession::start();
        session.fail(SessionFailure::new(
            FailureKind::CameraUnavailable,
            SessionState::Capturing,
            "no frame",
        ));

        assert_eq!(session.state(), SessionState::Failed);
        assert!(session.photo().is_none());
        assert_eq!(
            session.failure().map(|f| f.kind),
            Some(FailureKind::CameraUnavailable)
        );
        assert_eq!(
            session.history(),
            &[SessionState::Idle, SessionState::Capturing, SessionState::Failed]
        );
    }

    #[test]
    fn active_states() {
        assert!(!SessionState::Idle.is_active());
        assert!(SessionState::Capturing.is_active());
        assert!(SessionState::Printing.is_active());
        assert!(!SessionState::Completed.is_active());
        assert!(!SessionState::Failed.is_active());
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert!(SessionId::new().to_string().starts_with("session_"));
    }
}
