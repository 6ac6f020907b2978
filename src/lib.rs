//! # Mafia Game Engine Library
//!
//! This library provides the server-side core for a Mafia/Werewolf social
//! deduction game. It handles player registration, fair role assignment
//! under configurable scarcity constraints, the day/night session state
//! machine, and priority-ordered processing of control and gameplay
//! messages.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use serde::Serialize;

pub mod constants;

pub mod assign;
pub mod game;
pub mod inbox;
pub mod message;
pub mod player;
pub mod role;
pub mod sink;
pub mod token;

use game::GamePhase;
use player::PlayerId;
use role::{RoleId, Team};
use token::SessionToken;

/// Structured events emitted by the engine
///
/// The engine never logs directly; everything an operator would want to
/// observe is reported as one of these events through an injected
/// [`sink::EventSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Event {
    /// A session was created and is ready to register players
    SessionCreated {
        /// Token identifying the new session
        token: SessionToken,
        /// The clamped mafia head-count divisor in effect
        mafia_coefficient: usize,
        /// Roles eligible for assignment in this session
        enabled_roles: Vec<RoleId>,
    },
    /// The session acknowledged an init control message
    SessionInitialized {
        /// Token of the acknowledging session
        token: SessionToken,
    },
    /// The session reset its phase and per-player game state
    SessionRestarted {
        /// Token of the restarted session
        token: SessionToken,
    },
    /// The session stopped; no further messages will be processed
    SessionStopped {
        /// Token of the stopped session
        token: SessionToken,
    },
    /// A player joined the roster
    PlayerRegistered {
        /// The newly registered player
        player: PlayerId,
    },
    /// A registration arrived for an id already on the roster
    PlayerAlreadyRegistered {
        /// The player that was already present
        player: PlayerId,
    },
    /// A player left the roster
    PlayerLeft {
        /// The removed player
        player: PlayerId,
    },
    /// A removal arrived for an id not on the roster
    PlayerNotRegistered {
        /// The unknown player id
        player: PlayerId,
    },
    /// The assignment engine packed one team's roles
    TeamPacked {
        /// The team the roles were packed for
        team: Team,
        /// The packed roles, highest priority first
        roles: Vec<RoleId>,
    },
    /// The assignment engine shuffled the combined role list
    RolesShuffled {
        /// The shuffled roles, in seating order
        roles: Vec<RoleId>,
    },
    /// Roles were applied to the roster
    RolesAssigned {
        /// Number of players that received a role
        assigned: usize,
        /// Number of players left roleless by under-provisioning
        unassigned: usize,
    },
    /// The game clock toggled between day and night
    PhaseSwitched {
        /// The phase being left
        from: GamePhase,
        /// The phase being entered
        to: GamePhase,
    },
    /// A player cast a day vote
    DayVoteCast {
        /// The voting player
        voter: PlayerId,
        /// The player voted against
        target: PlayerId,
    },
    /// A mafia member voted on tonight's victim
    MafiaVoteCast {
        /// The voting mafia member
        voter: PlayerId,
        /// The proposed victim
        target: PlayerId,
    },
    /// The condemned player took their last word
    LastWord {
        /// The speaking player
        player: PlayerId,
    },
    /// A player was eliminated by the day vote
    PlayerHanged {
        /// The hanged player
        player: PlayerId,
    },
    /// A player was eliminated during the night
    PlayerKilled {
        /// The killed player
        player: PlayerId,
    },
    /// A player performed their role's night action
    NightActionPerformed {
        /// The acting player
        player: PlayerId,
        /// The role that acted
        role: RoleId,
    },
    /// A message was understood but deliberately not applied
    MessageIgnored {
        /// Why the message was ignored
        reason: String,
    },
    /// A message failed structural validation and was dropped
    MessageRejected {
        /// Why the message was rejected
        reason: String,
    },
}

impl Event {
    /// Converts the event to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}
