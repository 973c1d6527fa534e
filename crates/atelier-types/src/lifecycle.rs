//! Request lifecycle rules.
//!
//! Only the creator of a request moves its status, and only along
//! `pending -> accepted | rejected` and `accepted -> closed`. Both parties
//! may post to the thread while the request is `pending` or `accepted`.

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Request, RequestStatus};

impl RequestStatus {
    /// Statuses reachable from `self` in one step.
    pub fn next_statuses(self) -> &'static [RequestStatus] {
        match self {
            Self::Pending => &[Self::Accepted, Self::Rejected],
            Self::Accepted => &[Self::Closed],
            Self::Rejected | Self::Closed => &[],
        }
    }

    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.next_statuses().is_empty()
    }

    pub fn accepts_messages(self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }
}

/// A user's relation to a particular request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Creator,
    Client,
    Outsider,
}

impl Party {
    pub fn of(request: &Request, user_id: Uuid) -> Self {
        if request.creator_id == user_id {
            Self::Creator
        } else if request.client_id == user_id {
            Self::Client
        } else {
            Self::Outsider
        }
    }

    pub fn is_participant(self) -> bool {
        !matches!(self, Self::Outsider)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("not a participant of this request")]
    NotParticipant,

    #[error("only the creator may change the status of a request")]
    NotCreator,

    #[error("cannot move a request from {from} to {to}")]
    IllegalTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("request is {0}; no further messages can be sent")]
    ThreadClosed(RequestStatus),
}

pub fn authorize_transition(
    request: &Request,
    actor: Uuid,
    next: RequestStatus,
) -> Result<(), LifecycleError> {
    match Party::of(request, actor) {
        Party::Outsider => return Err(LifecycleError::NotParticipant),
        Party::Client => return Err(LifecycleError::NotCreator),
        Party::Creator => {}
    }

    if !request.status.can_transition_to(next) {
        return Err(LifecycleError::IllegalTransition {
            from: request.status,
            to: next,
        });
    }

    Ok(())
}

pub fn authorize_message(request: &Request, sender: Uuid) -> Result<(), LifecycleError> {
    if !Party::of(request, sender).is_participant() {
        return Err(LifecycleError::NotParticipant);
    }
    if !request.status.accepts_messages() {
        return Err(LifecycleError::ThreadClosed(request.status));
    }
    Ok(())
}

/// What a viewer is allowed to do with a request right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestActions {
    pub party: Party,
    pub transitions: Vec<RequestStatus>,
    pub can_message: bool,
}

pub fn available_actions(request: &Request, viewer: Uuid) -> RequestActions {
    let party = Party::of(request, viewer);
    let transitions = match party {
        Party::Creator => request.status.next_statuses().to_vec(),
        Party::Client | Party::Outsider => Vec::new(),
    };

    RequestActions {
        party,
        transitions,
        can_message: party.is_participant() && request.status.accepts_messages(),
    }
}
