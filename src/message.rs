//! Prioritized message model
//!
//! This module defines the tagged units of work a session consumes: control
//! messages (roster and session lifecycle) and gameplay messages (day and
//! night actions). Control messages outrank gameplay messages; both carry
//! the session token used by transports to route them. Messages are
//! immutable once enqueued, and any transport may serialize them as long as
//! the priority order and token routing are preserved.

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{player::PlayerId, role::ActionArgs, token::SessionToken};

/// Dispatch priority of a message
///
/// Lower values are dequeued first; arrival order breaks ties between
/// messages of equal priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Control messages: roster and session lifecycle
    Ctrl = 0,
    /// Gameplay messages: day and night actions
    Gameplay = 1,
}

impl Priority {
    /// Returns the numeric rank of this priority
    pub fn rank(self) -> u8 {
        self as u8
    }
}

/// Errors produced when a message fails structural validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The message payload is malformed (e.g. an out-of-bounds player id)
    #[error("invalid message: {0}")]
    Invalid(String),
}

/// Roster-management control messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub enum PlayerCtrlMessage {
    /// Register a player in the session
    Register {
        /// The player to add to the roster
        #[garde(dive)]
        player_id: PlayerId,
    },
    /// Remove a player from the session
    Leave {
        /// The player to remove from the roster
        #[garde(dive)]
        player_id: PlayerId,
    },
}

/// Session-lifecycle control messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub enum SessionCtrlMessage {
    /// Acknowledge session creation
    Init,
    /// Start the game: seat roles over the current roster
    Run,
    /// Stop the session; no further messages are processed
    Stop,
    /// Reset per-player game state and the phase, keeping the roster
    Restart,
}

/// Control messages, dispatched ahead of all gameplay messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, derive_more::From)]
pub enum CtrlMessage {
    /// Roster management
    Player(#[garde(dive)] PlayerCtrlMessage),
    /// Session lifecycle
    Session(#[garde(dive)] SessionCtrlMessage),
}

/// Gameplay messages valid during the day phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub enum DayMessage {
    /// A player votes to eliminate another player
    Vote {
        /// The voting player
        #[garde(dive)]
        voter_id: PlayerId,
        /// The player voted against
        #[garde(dive)]
        target_id: PlayerId,
    },
    /// The condemned player takes their last word
    LastWord {
        /// The player speaking
        #[garde(dive)]
        player_id: PlayerId,
    },
    /// The day vote concludes with a hanging
    Hang {
        /// The player to eliminate
        #[garde(dive)]
        target_id: PlayerId,
    },
}

/// Gameplay messages valid during the night phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub enum NightMessage {
    /// A player performs their role-specific night action
    RoleAction {
        /// The acting player
        #[garde(dive)]
        player_id: PlayerId,
        /// Free-form arguments interpreted by the action resolver
        #[garde(skip)]
        args: ActionArgs,
    },
    /// A mafia member votes on tonight's victim
    MafiaVote {
        /// The voting mafia member
        #[garde(dive)]
        voter_id: PlayerId,
        /// The proposed victim
        #[garde(dive)]
        target_id: PlayerId,
    },
    /// The night concludes with a kill
    Kill {
        /// The player to eliminate
        #[garde(dive)]
        target_id: PlayerId,
    },
}

/// Gameplay messages, grouped by the phase they belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, derive_more::From)]
pub enum GameplayMessage {
    /// Day-phase gameplay
    Day(#[garde(dive)] DayMessage),
    /// Night-phase gameplay
    Night(#[garde(dive)] NightMessage),
}

/// The two message categories, discriminating dispatch priority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, derive_more::From)]
pub enum MessageBody {
    /// Control traffic, processed first
    Ctrl(#[garde(dive)] CtrlMessage),
    /// Gameplay traffic, processed after all pending control traffic
    Gameplay(#[garde(dive)] GameplayMessage),
}

impl MessageBody {
    /// Returns the dispatch priority of this message category
    pub fn priority(&self) -> Priority {
        match self {
            Self::Ctrl(_) => Priority::Ctrl,
            Self::Gameplay(_) => Priority::Gameplay,
        }
    }
}

/// A routed unit of work for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Message {
    /// Token of the session this message is addressed to
    #[garde(skip)]
    pub session_token: SessionToken,
    /// The message payload
    #[garde(dive)]
    pub body: MessageBody,
}

impl Message {
    /// Creates a message addressed to the given session
    pub fn new(session_token: SessionToken, body: impl Into<MessageBody>) -> Self {
        Self {
            session_token,
            body: body.into(),
        }
    }

    /// Returns the dispatch priority of this message
    pub fn priority(&self) -> Priority {
        self.body.priority()
    }

    /// Checks the message payload against its structural bounds
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalid`] describing every violated bound. The
    /// dispatch loop reports such messages and moves on; they never abort
    /// processing.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|report| Error::Invalid(report.to_string()))
    }
}
