//! Per-registrant player state
//!
//! This module tracks the state of a single registered player: their
//! externally supplied identity, the role assigned to them (if any), their
//! wake/sleep mode, alive/dead status, and their pending vote target. The
//! player object records what it is told; gating rules (who may vote when,
//! who is still eligible) belong to the session.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;

use crate::{
    constants,
    role::{ActionArgs, ActionReport, Role, RoleId},
};

/// Externally supplied identifier of a player, unique within a session
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::From,
    garde::Validate,
)]
#[serde(transparent)]
pub struct PlayerId(
    #[garde(length(
        min = constants::player::MIN_ID_LENGTH,
        max = constants::player::MAX_ID_LENGTH,
    ))]
    String,
);

impl PlayerId {
    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl Display for PlayerId {
    /// Formats the identifier as the caller-supplied string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a player is currently awake or asleep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerMode {
    /// The player is asleep and not following the current stage
    Asleep,
    /// The player is awake
    Awakened,
}

/// Whether a player is still in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    /// The player is alive and participating
    Alive,
    /// The player has been eliminated; this state is terminal
    Dead,
}

/// Errors that can occur when invoking role-delegated behavior
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A night action was requested before any role was assigned
    #[error("player has no assigned role")]
    NoRoleAssigned,
}

/// State of a single registered player
///
/// Created on registration with no role, awake, and alive. The vote target
/// slot is shared between day votes and the mafia's night vote, and is
/// cleared by the session whenever a new day begins.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// The player's external identity
    id: PlayerId,
    /// The role assigned to this player, if any
    role: Option<Role>,
    /// Current wake/sleep mode
    mode: PlayerMode,
    /// Current alive/dead status
    status: PlayerStatus,
    /// The player this player currently wants eliminated
    vote_target: Option<PlayerId>,
}

impl Player {
    /// Creates a fresh, roleless player in the awake and alive state
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            role: None,
            mode: PlayerMode::Awakened,
            status: PlayerStatus::Alive,
            vote_target: None,
        }
    }

    /// Returns the player's identifier
    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// Returns the kind of the player's assigned role, if any
    pub fn role_id(&self) -> Option<RoleId> {
        self.role.as_ref().map(Role::id)
    }

    /// Returns the player's assigned role instance, if any
    pub fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }

    /// Assigns a role to this player
    ///
    /// A fresh instance is materialized from the factory. Overwriting an
    /// existing assignment is permitted by contract; normal flow assigns
    /// exactly once per game.
    pub fn set_role(&mut self, role: RoleId) {
        self.role = Some(Role::new(role));
    }

    /// Records who this player currently wants eliminated
    ///
    /// The same slot backs day votes and the mafia's night vote.
    pub fn set_killing_candidate(&mut self, target: PlayerId) {
        self.vote_target = Some(target);
    }

    /// Records this player's day vote against the given target
    ///
    /// Valid in any phase by contract; the session decides when votes are
    /// actually solicited and tallied.
    pub fn day_vote(&mut self, target: PlayerId) {
        self.set_killing_candidate(target);
    }

    /// Returns the player's pending vote target, if any
    pub fn vote_target(&self) -> Option<&PlayerId> {
        self.vote_target.as_ref()
    }

    /// Clears the pending vote target
    pub fn clear_vote(&mut self) {
        self.vote_target = None;
    }

    /// Performs the assigned role's night action
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRoleAssigned`] if no role has been assigned yet.
    pub fn night_action(&self, args: ActionArgs) -> Result<ActionReport, Error> {
        self.role
            .as_ref()
            .map(|role| role.perform_action(args))
            .ok_or(Error::NoRoleAssigned)
    }

    /// Puts the player to sleep
    pub fn sleep(&mut self) {
        self.mode = PlayerMode::Asleep;
    }

    /// Wakes the player up
    pub fn wakeup(&mut self) {
        self.mode = PlayerMode::Awakened;
    }

    /// Returns the player's current wake/sleep mode
    pub fn mode(&self) -> PlayerMode {
        self.mode
    }

    /// Eliminates the player
    ///
    /// The transition to dead is terminal; there is no resurrection. The
    /// session is responsible for excluding dead players from vote tallies
    /// and night-action eligibility.
    pub fn kill(&mut self) {
        self.status = PlayerStatus::Dead;
    }

    /// Returns the player's current alive/dead status
    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    /// Returns whether the player is still alive
    pub fn is_alive(&self) -> bool {
        self.status == PlayerStatus::Alive
    }
}
