use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use signon_core::{NegotiationError, Request, Response};

use crate::mode::Mode;

pub type Outcome = Result<Response, NegotiationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting behind another session on the same window
    Queued,
    Active,
    Completed,
    Failed,
}

/// Read-only view of a session handed to surface providers
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: Uuid,
    pub mode: Mode,
    pub request_id: Option<String>,
    pub window_id: u64,
    pub embedded: bool,
    pub created_at: DateTime<Utc>,
}

/// One in-flight negotiation. Owns its request and the reply channel;
/// completing consumes the session, so a reply is sent at most once.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    mode: Mode,
    state: SessionState,
    created_at: DateTime<Utc>,
    request: Request,
    reply: oneshot::Sender<Outcome>,
}

impl Session {
    pub fn new(request: Request, mode: Mode) -> (Self, oneshot::Receiver<Outcome>) {
        let (reply, rx) = oneshot::channel();
        let session = Self {
            id: Uuid::new_v4(),
            mode,
            state: SessionState::Queued,
            created_at: Utc::now(),
            request,
            reply,
        };
        (session, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            mode: self.mode,
            request_id: self.request.request_id.clone(),
            window_id: self.request.window_id(),
            embedded: self.request.client_data.embedded,
            created_at: self.created_at,
        }
    }

    pub fn activate(&mut self) {
        if self.state == SessionState::Queued {
            self.state = SessionState::Active;
        }
    }

    /// Deliver the outcome and end the session. Returns the terminal state.
    pub fn complete(self, outcome: Outcome) -> SessionState {
        let state = if outcome.is_ok() {
            SessionState::Completed
        } else {
            SessionState::Failed
        };
        let elapsed = Utc::now() - self.created_at;
        debug!(
            session = %self.id,
            mode = %self.mode,
            ?state,
            elapsed_ms = elapsed.num_milliseconds(),
            "session finished"
        );
        if self.reply.send(outcome).is_err() {
            debug!(session = %self.id, "caller went away before the reply");
        }
        state
    }
}
