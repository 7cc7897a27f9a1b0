// Single-slot session state machine.
//
// One logical session processes commands strictly one at a time: a new
// utterance is not accepted while a prior one is still resolving. The
// explicit machine (rather than an ad hoc flag) keeps the submit/complete
// transitions in one place.

/// Processing state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingResponse,
}

/// Submitting while a command is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitError;

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "A command is already being processed")
    }
}

impl std::error::Error for SubmitError {}

/// The session's single processing slot.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Claim the slot. Fails while a prior command is still resolving.
    pub fn submit(&mut self) -> Result<(), SubmitError> {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::AwaitingResponse;
                Ok(())
            }
            SessionState::AwaitingResponse => Err(SubmitError),
        }
    }

    /// Release the slot once the response has been produced.
    pub fn complete(&mut self) {
        self.state = SessionState::Idle;
    }
}
