//! Session state machine and dispatch loop
//!
//! This module contains the main session struct and logic for managing one
//! running game: the player roster, the day/night phase state, the
//! enabled-role set, and the dispatch loop that drains the session's
//! priority inbox, routing control messages to roster/session management and
//! gameplay messages to the handler of the current phase.

use std::{
    collections::{HashMap, HashSet},
    fmt::Debug,
    sync::Arc,
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    Event, assign,
    constants::session::{DEFAULT_MAFIA_COEFFICIENT, QUEUE_POLL_INTERVAL},
    inbox::Inbox,
    message::{
        CtrlMessage, DayMessage, GameplayMessage, Message, MessageBody, NightMessage,
        PlayerCtrlMessage, SessionCtrlMessage,
    },
    player::{Player, PlayerId},
    role::{RoleId, Team},
    sink::EventSink,
    token::SessionToken,
};

/// The coarse game clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Public discussion and voting
    Day,
    /// Private role-specific actions
    Night,
}

/// Finer state within the day phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayStage {
    /// Players vote on who to eliminate
    Voting,
    /// The voted player is hanged
    Hanging,
    /// The condemned player speaks one last time
    LastWord,
}

/// Finer state within the night phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NightStage {
    /// Civilian specials act
    Civilians,
    /// The mafia votes on tonight's victim
    Mafia,
}

/// Current phase together with its sub-stage
///
/// The sub-stage only exists for the phase it belongs to, so a day session
/// can never carry a stale night stage or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseState {
    /// Day phase with its current stage
    Day(DayStage),
    /// Night phase with its current stage
    Night(NightStage),
}

impl PhaseState {
    /// Returns the coarse phase without the sub-stage
    pub fn phase(&self) -> GamePhase {
        match self {
            Self::Day(_) => GamePhase::Day,
            Self::Night(_) => GamePhase::Night,
        }
    }
}

/// Configuration options for creating a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOptions {
    /// Divisor for the mafia head-count; non-positive values are silently
    /// clamped to 1
    pub mafia_coefficient: usize,
    /// Role kinds excluded from assignment in this session
    pub banned_roles: HashSet<RoleId>,
}

impl Default for GameOptions {
    /// Default options: coefficient of 4, no banned roles
    fn default() -> Self {
        Self {
            mafia_coefficient: DEFAULT_MAFIA_COEFFICIENT,
            banned_roles: HashSet::new(),
        }
    }
}

/// Informational outcome of a registration request
///
/// Registering an id that is already on the roster is not an error; the
/// outcome exists for observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The player was added to the roster
    Registered,
    /// The id was already present; the roster is unchanged
    AlreadyRegistered,
}

/// Informational outcome of a removal request
///
/// Removing an absent id is not an error; the outcome exists for
/// observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The player was removed from the roster
    Removed,
    /// No such id was on the roster; nothing changed
    NotRegistered,
}

/// One running game session
///
/// A session exclusively owns its roster, phase state, and inbox: external
/// producers only ever enqueue messages, and the single dispatch loop is the
/// only code that mutates session state. Independent sessions may run their
/// loops concurrently without sharing anything.
pub struct Game {
    /// Opaque token transports use to route messages here
    token: SessionToken,
    /// All registered players, keyed by their external id
    players: HashMap<PlayerId, Player>,
    /// Divisor for the mafia head-count, clamped to ≥ 1
    mafia_coefficient: usize,
    /// Role kinds eligible for assignment
    enabled_roles: HashSet<RoleId>,
    /// Current phase and sub-stage
    phase: PhaseState,
    /// Source of randomness for the assignment shuffle
    rng: fastrand::Rng,
    /// Ordered message inbox; the only cross-thread boundary
    inbox: Arc<Inbox>,
    /// Whether the dispatch loop should keep draining
    running: bool,
}

impl Debug for Game {
    /// Custom debug implementation that avoids printing the full roster
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("token", &self.token)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl Game {
    /// Creates a new session with a random token and randomness source
    ///
    /// # Arguments
    ///
    /// * `options` - Session configuration; the coefficient is clamped to ≥ 1
    /// * `sink` - Collector the session reports its events to
    pub fn new<S: EventSink>(options: GameOptions, sink: &S) -> Self {
        Self::with_rng(options, fastrand::Rng::new(), sink)
    }

    /// Creates a new session with an explicit randomness source
    ///
    /// The shuffle during role assignment is the only nondeterministic step
    /// of a session; passing a seeded [`fastrand::Rng`] makes assignments
    /// reproducible.
    pub fn with_rng<S: EventSink>(options: GameOptions, rng: fastrand::Rng, sink: &S) -> Self {
        let GameOptions {
            mafia_coefficient,
            banned_roles,
        } = options;

        let game = Self {
            token: SessionToken::new(),
            players: HashMap::new(),
            mafia_coefficient: mafia_coefficient.max(1),
            enabled_roles: RoleId::all()
                .filter(|role| !banned_roles.contains(role))
                .collect(),
            phase: PhaseState::Day(DayStage::Voting),
            rng,
            inbox: Arc::new(Inbox::new()),
            running: false,
        };

        sink.emit(&Event::SessionCreated {
            token: game.token,
            mafia_coefficient: game.mafia_coefficient,
            enabled_roles: RoleId::all()
                .filter(|role| game.enabled_roles.contains(role))
                .collect_vec(),
        });

        game
    }

    /// Returns the session's routing token
    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Returns a handle for enqueueing messages to this session
    ///
    /// Producers on any thread may push through the handle; they must never
    /// touch session state directly.
    pub fn inbox(&self) -> Arc<Inbox> {
        Arc::clone(&self.inbox)
    }

    /// Returns the current coarse phase
    pub fn phase(&self) -> GamePhase {
        self.phase.phase()
    }

    /// Returns the current phase together with its sub-stage
    pub fn phase_state(&self) -> PhaseState {
        self.phase
    }

    /// Returns the clamped mafia coefficient in effect
    pub fn mafia_coefficient(&self) -> usize {
        self.mafia_coefficient
    }

    /// Returns the role kinds eligible for assignment
    pub fn enabled_roles(&self) -> &HashSet<RoleId> {
        &self.enabled_roles
    }

    /// Returns whether the dispatch loop is draining messages
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Looks up a registered player
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Returns the number of registered players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Registers a player, if not already present
    ///
    /// Idempotent: a duplicate registration leaves the existing player —
    /// role, status, and all — untouched and only reports the fact.
    pub fn register_player<S: EventSink>(&mut self, id: PlayerId, sink: &S) -> RegisterOutcome {
        if self.players.contains_key(&id) {
            sink.emit(&Event::PlayerAlreadyRegistered { player: id });
            return RegisterOutcome::AlreadyRegistered;
        }

        self.players.insert(id.clone(), Player::new(id.clone()));
        sink.emit(&Event::PlayerRegistered { player: id });
        RegisterOutcome::Registered
    }

    /// Removes a player, if present
    ///
    /// Removal never reassigns roles or recomputes the mafia quota for the
    /// players who stay.
    pub fn remove_player<S: EventSink>(&mut self, id: &PlayerId, sink: &S) -> RemoveOutcome {
        if self.players.remove(id).is_some() {
            sink.emit(&Event::PlayerLeft { player: id.clone() });
            RemoveOutcome::Removed
        } else {
            sink.emit(&Event::PlayerNotRegistered { player: id.clone() });
            RemoveOutcome::NotRegistered
        }
    }

    /// Toggles the game clock between day and night
    ///
    /// This is the sole mutator of the phase. The entered phase starts at
    /// its first sub-stage, and a fresh day begins with a clean voting
    /// slate. When to switch is decided by the (out-of-scope) sub-stage
    /// progression, not here.
    pub fn switch_phase<S: EventSink>(&mut self, sink: &S) {
        let from = self.phase();
        self.phase = match self.phase {
            PhaseState::Day(_) => PhaseState::Night(NightStage::Civilians),
            PhaseState::Night(_) => {
                for player in self.players.values_mut() {
                    player.clear_vote();
                }
                PhaseState::Day(DayStage::Voting)
            }
        };
        sink.emit(&Event::PhaseSwitched {
            from,
            to: self.phase(),
        });
    }

    /// Assigns roles to the current roster
    ///
    /// Triggered by the `Run` control message at game start. Players beyond
    /// the packable role supply stay roleless; that outcome is reported, not
    /// raised.
    pub fn seat_roles<S: EventSink>(&mut self, sink: &S) {
        let roster = self.players.keys().cloned().collect_vec();
        let assignment = assign::assign_roles(
            &roster,
            &self.enabled_roles,
            self.mafia_coefficient,
            &mut self.rng,
            sink,
        );

        for (id, role) in &assignment {
            if let Some(player) = self.players.get_mut(id) {
                player.set_role(*role);
            }
        }

        sink.emit(&Event::RolesAssigned {
            assigned: assignment.len(),
            unassigned: roster.len() - assignment.len(),
        });
    }

    /// Applies one message to the session
    ///
    /// Malformed payloads are reported and dropped; they never abort
    /// processing. Control messages dispatch to roster and session
    /// management, gameplay messages to the handler of the current phase.
    pub fn process_message<S: EventSink>(&mut self, message: Message, sink: &S) {
        if let Err(error) = message.check() {
            sink.emit(&Event::MessageRejected {
                reason: error.to_string(),
            });
            return;
        }

        match message.body {
            MessageBody::Ctrl(ctrl) => self.process_ctrl(ctrl, sink),
            MessageBody::Gameplay(gameplay) => self.process_gameplay(gameplay, sink),
        }
    }

    /// Dispatches a control message
    fn process_ctrl<S: EventSink>(&mut self, message: CtrlMessage, sink: &S) {
        match message {
            CtrlMessage::Player(PlayerCtrlMessage::Register { player_id }) => {
                self.register_player(player_id, sink);
            }
            CtrlMessage::Player(PlayerCtrlMessage::Leave { player_id }) => {
                self.remove_player(&player_id, sink);
            }
            CtrlMessage::Session(SessionCtrlMessage::Init) => {
                sink.emit(&Event::SessionInitialized { token: self.token });
            }
            CtrlMessage::Session(SessionCtrlMessage::Run) => {
                self.seat_roles(sink);
            }
            CtrlMessage::Session(SessionCtrlMessage::Stop) => {
                self.running = false;
                sink.emit(&Event::SessionStopped { token: self.token });
            }
            CtrlMessage::Session(SessionCtrlMessage::Restart) => {
                self.restart(sink);
            }
        }
    }

    /// Resets the phase and per-player game state, keeping the roster
    fn restart<S: EventSink>(&mut self, sink: &S) {
        self.phase = PhaseState::Day(DayStage::Voting);
        for player in self.players.values_mut() {
            *player = Player::new(player.id().clone());
        }
        sink.emit(&Event::SessionRestarted { token: self.token });
    }

    /// Routes a gameplay message to the handler of the current phase
    ///
    /// A message for the other phase is not an error: it is acknowledged
    /// with an ignored-message event and processing continues.
    fn process_gameplay<S: EventSink>(&mut self, message: GameplayMessage, sink: &S) {
        match (self.phase(), message) {
            (GamePhase::Day, GameplayMessage::Day(day)) => self.handle_day_message(day, sink),
            (GamePhase::Night, GameplayMessage::Night(night)) => {
                self.handle_night_message(night, sink);
            }
            (phase, _) => sink.emit(&Event::MessageIgnored {
                reason: format!("gameplay message does not match current phase {phase:?}"),
            }),
        }
    }

    /// Handles gameplay messages while the phase is day
    fn handle_day_message<S: EventSink>(&mut self, message: DayMessage, sink: &S) {
        match message {
            DayMessage::Vote {
                voter_id,
                target_id,
            } => match self.players.get_mut(&voter_id) {
                Some(voter) if voter.is_alive() => {
                    voter.day_vote(target_id.clone());
                    sink.emit(&Event::DayVoteCast {
                        voter: voter_id,
                        target: target_id,
                    });
                }
                Some(_) => sink.emit(&Event::MessageIgnored {
                    reason: format!("dead player {voter_id} cannot vote"),
                }),
                None => sink.emit(&Event::MessageIgnored {
                    reason: format!("unregistered player {voter_id} cannot vote"),
                }),
            },
            DayMessage::LastWord { player_id } => {
                if self.players.contains_key(&player_id) {
                    sink.emit(&Event::LastWord { player: player_id });
                } else {
                    sink.emit(&Event::MessageIgnored {
                        reason: format!("unregistered player {player_id} has no last word"),
                    });
                }
            }
            DayMessage::Hang { target_id } => self.eliminate(target_id, GamePhase::Day, sink),
        }
    }

    /// Handles gameplay messages while the phase is night
    fn handle_night_message<S: EventSink>(&mut self, message: NightMessage, sink: &S) {
        match message {
            NightMessage::RoleAction { player_id, args } => match self.players.get(&player_id) {
                Some(player) if player.is_alive() => match player.night_action(args) {
                    Ok(report) => sink.emit(&Event::NightActionPerformed {
                        player: player_id,
                        role: report.role,
                    }),
                    Err(error) => sink.emit(&Event::MessageRejected {
                        reason: error.to_string(),
                    }),
                },
                Some(_) => sink.emit(&Event::MessageIgnored {
                    reason: format!("dead player {player_id} cannot act"),
                }),
                None => sink.emit(&Event::MessageIgnored {
                    reason: format!("unregistered player {player_id} cannot act"),
                }),
            },
            NightMessage::MafiaVote {
                voter_id,
                target_id,
            } => match self.players.get_mut(&voter_id) {
                Some(voter)
                    if voter.is_alive()
                        && voter.role().is_some_and(|role| role.team() == Team::Mafia) =>
                {
                    voter.set_killing_candidate(target_id.clone());
                    sink.emit(&Event::MafiaVoteCast {
                        voter: voter_id,
                        target: target_id,
                    });
                }
                Some(_) => sink.emit(&Event::MessageIgnored {
                    reason: format!("{voter_id} is not an eligible mafia voter"),
                }),
                None => sink.emit(&Event::MessageIgnored {
                    reason: format!("unregistered player {voter_id} cannot vote"),
                }),
            },
            NightMessage::Kill { target_id } => self.eliminate(target_id, GamePhase::Night, sink),
        }
    }

    /// Eliminates a living target, reporting the phase-appropriate event
    fn eliminate<S: EventSink>(&mut self, target: PlayerId, phase: GamePhase, sink: &S) {
        match self.players.get_mut(&target) {
            Some(player) if player.is_alive() => {
                player.kill();
                sink.emit(&match phase {
                    GamePhase::Day => Event::PlayerHanged { player: target },
                    GamePhase::Night => Event::PlayerKilled { player: target },
                });
            }
            Some(_) => sink.emit(&Event::MessageIgnored {
                reason: format!("{target} is already dead"),
            }),
            None => sink.emit(&Event::MessageIgnored {
                reason: format!("unregistered player {target} cannot be eliminated"),
            }),
        }
    }

    /// Drains the inbox until a stop message arrives
    ///
    /// Messages are applied strictly in `(priority, arrival)` order, each
    /// one atomically with respect to session state. The loop blocks on the
    /// inbox for at most the poll interval, then re-checks the running flag
    /// and retries; that bounded wait is its only suspension point.
    pub fn run<S: EventSink>(&mut self, sink: &S) {
        self.running = true;
        while self.running {
            if let Some(message) = self.inbox.pop_timeout(QUEUE_POLL_INTERVAL) {
                self.process_message(message, sink);
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::role::ActionArgs;

    // Test helper recording every emitted event
    #[derive(Debug, Clone, Default)]
    struct RecordingSink {
        events: Rc<RefCell<Vec<Event>>>,
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: &Event) {
            self.events.borrow_mut().push(event.clone());
        }
    }

    impl RecordingSink {
        fn contains(&self, wanted: &Event) -> bool {
            self.events.borrow().iter().any(|event| event == wanted)
        }
    }

    fn seeded_game(options: GameOptions) -> Game {
        Game::with_rng(options, fastrand::Rng::with_seed(7), &())
    }

    fn register_roster(game: &mut Game, count: usize) {
        for i in 0..count {
            game.register_player(format!("player-{i}").into(), &());
        }
    }

    fn day_vote(game: &Game, voter: &str, target: &str) -> Message {
        Message::new(
            game.token(),
            GameplayMessage::from(DayMessage::Vote {
                voter_id: voter.into(),
                target_id: target.into(),
            }),
        )
    }

    fn session_ctrl(game: &Game, ctrl: SessionCtrlMessage) -> Message {
        Message::new(game.token(), CtrlMessage::from(ctrl))
    }

    #[test]
    fn test_new_game_defaults() {
        let game = Game::new(GameOptions::default(), &());
        assert_eq!(game.phase_state(), PhaseState::Day(DayStage::Voting));
        assert_eq!(game.mafia_coefficient(), 4);
        assert_eq!(game.player_count(), 0);
        assert_eq!(game.enabled_roles().len(), 4);
        assert!(!game.is_running());
    }

    #[test]
    fn test_non_positive_coefficient_is_clamped() {
        let game = Game::new(
            GameOptions {
                mafia_coefficient: 0,
                ..GameOptions::default()
            },
            &(),
        );
        assert_eq!(game.mafia_coefficient(), 1);
    }

    #[test]
    fn test_banned_roles_excluded_from_enabled_set() {
        let game = Game::new(
            GameOptions {
                banned_roles: [RoleId::Detective].into(),
                ..GameOptions::default()
            },
            &(),
        );
        assert!(!game.enabled_roles().contains(&RoleId::Detective));
        assert_eq!(game.enabled_roles().len(), 3);
    }

    #[test]
    fn test_creation_event_reports_configuration() {
        let sink = RecordingSink::default();
        let game = Game::new(GameOptions::default(), &sink);
        assert!(sink.contains(&Event::SessionCreated {
            token: game.token(),
            mafia_coefficient: 4,
            enabled_roles: vec![
                RoleId::Villager,
                RoleId::Mafia,
                RoleId::Healer,
                RoleId::Detective,
            ],
        }));
    }

    #[test]
    fn test_register_player_is_idempotent() {
        let sink = RecordingSink::default();
        let mut game = seeded_game(GameOptions::default());

        assert_eq!(
            game.register_player("alice".into(), &sink),
            RegisterOutcome::Registered
        );
        game.seat_roles(&());
        let before = game.player(&"alice".into()).unwrap().clone();

        assert_eq!(
            game.register_player("alice".into(), &sink),
            RegisterOutcome::AlreadyRegistered
        );
        assert_eq!(game.player_count(), 1);
        assert_eq!(game.player(&"alice".into()).unwrap(), &before);
        assert!(sink.contains(&Event::PlayerAlreadyRegistered {
            player: "alice".into(),
        }));
    }

    #[test]
    fn test_remove_absent_player_is_informational() {
        let sink = RecordingSink::default();
        let mut game = seeded_game(GameOptions::default());
        register_roster(&mut game, 3);

        assert_eq!(
            game.remove_player(&"ghost".into(), &sink),
            RemoveOutcome::NotRegistered
        );
        assert_eq!(game.player_count(), 3);
        assert!(sink.contains(&Event::PlayerNotRegistered {
            player: "ghost".into(),
        }));

        assert_eq!(
            game.remove_player(&"player-0".into(), &sink),
            RemoveOutcome::Removed
        );
        assert_eq!(game.player_count(), 2);
    }

    #[test]
    fn test_switch_phase_is_involutive() {
        let sink = RecordingSink::default();
        let mut game = seeded_game(GameOptions::default());

        game.switch_phase(&sink);
        assert_eq!(game.phase_state(), PhaseState::Night(NightStage::Civilians));
        game.switch_phase(&sink);
        assert_eq!(game.phase_state(), PhaseState::Day(DayStage::Voting));

        assert!(sink.contains(&Event::PhaseSwitched {
            from: GamePhase::Day,
            to: GamePhase::Night,
        }));
        assert!(sink.contains(&Event::PhaseSwitched {
            from: GamePhase::Night,
            to: GamePhase::Day,
        }));
    }

    #[test]
    fn test_new_day_clears_vote_targets() {
        let mut game = seeded_game(GameOptions::default());
        register_roster(&mut game, 4);

        game.process_message(day_vote(&game, "player-0", "player-1"), &());
        assert!(
            game.player(&"player-0".into())
                .unwrap()
                .vote_target()
                .is_some()
        );

        game.switch_phase(&());
        game.switch_phase(&());
        assert!(
            game.player(&"player-0".into())
                .unwrap()
                .vote_target()
                .is_none()
        );
    }

    #[test]
    fn test_seat_roles_example_distribution() {
        let mut game = seeded_game(GameOptions::default());
        register_roster(&mut game, 8);
        game.seat_roles(&());

        let count = |role| {
            (0..8)
                .filter(|i| {
                    game.player(&format!("player-{i}").into())
                        .unwrap()
                        .role_id()
                        == Some(role)
                })
                .count()
        };
        assert_eq!(count(RoleId::Mafia), 2);
        assert_eq!(count(RoleId::Healer), 1);
        assert_eq!(count(RoleId::Detective), 1);
        assert_eq!(count(RoleId::Villager), 4);
    }

    #[test]
    fn test_seat_roles_reports_under_provisioning() {
        let sink = RecordingSink::default();
        let mut game = seeded_game(GameOptions {
            banned_roles: [RoleId::Villager, RoleId::Mafia].into(),
            ..GameOptions::default()
        });
        register_roster(&mut game, 5);
        game.seat_roles(&sink);

        assert!(sink.contains(&Event::RolesAssigned {
            assigned: 2,
            unassigned: 3,
        }));
    }

    #[test]
    fn test_day_vote_requires_living_registered_voter() {
        let sink = RecordingSink::default();
        let mut game = seeded_game(GameOptions::default());
        register_roster(&mut game, 3);

        game.process_message(day_vote(&game, "player-0", "player-1"), &sink);
        assert_eq!(
            game.player(&"player-0".into()).unwrap().vote_target(),
            Some(&"player-1".into())
        );
        assert!(sink.contains(&Event::DayVoteCast {
            voter: "player-0".into(),
            target: "player-1".into(),
        }));

        // A hanged player no longer votes.
        game.process_message(
            Message::new(
                game.token(),
                GameplayMessage::from(DayMessage::Hang {
                    target_id: "player-0".into(),
                }),
            ),
            &sink,
        );
        game.process_message(day_vote(&game, "player-0", "player-2"), &sink);
        assert_eq!(
            game.player(&"player-0".into()).unwrap().vote_target(),
            Some(&"player-1".into())
        );

        // Unregistered voters are ignored without failing the loop.
        game.process_message(day_vote(&game, "ghost", "player-1"), &sink);
        assert_eq!(game.player_count(), 3);
    }

    #[test]
    fn test_hang_eliminates_target_once() {
        let sink = RecordingSink::default();
        let mut game = seeded_game(GameOptions::default());
        register_roster(&mut game, 3);

        let hang = Message::new(
            game.token(),
            GameplayMessage::from(DayMessage::Hang {
                target_id: "player-1".into(),
            }),
        );
        game.process_message(hang.clone(), &sink);
        assert!(!game.player(&"player-1".into()).unwrap().is_alive());
        assert!(sink.contains(&Event::PlayerHanged {
            player: "player-1".into(),
        }));

        game.process_message(hang, &sink);
        assert!(sink.contains(&Event::MessageIgnored {
            reason: "player-1 is already dead".to_owned(),
        }));
    }

    #[test]
    fn test_night_kill_eliminates_target() {
        let mut game = seeded_game(GameOptions::default());
        register_roster(&mut game, 3);
        game.switch_phase(&());

        game.process_message(
            Message::new(
                game.token(),
                GameplayMessage::from(NightMessage::Kill {
                    target_id: "player-2".into(),
                }),
            ),
            &(),
        );
        assert!(!game.player(&"player-2".into()).unwrap().is_alive());
    }

    #[test]
    fn test_night_action_delegates_to_role() {
        let sink = RecordingSink::default();
        let mut game = seeded_game(GameOptions::default());
        register_roster(&mut game, 4);
        game.seat_roles(&());
        game.switch_phase(&());

        game.process_message(
            Message::new(
                game.token(),
                GameplayMessage::from(NightMessage::RoleAction {
                    player_id: "player-0".into(),
                    args: ActionArgs::default(),
                }),
            ),
            &sink,
        );

        let role = game.player(&"player-0".into()).unwrap().role_id().unwrap();
        assert!(sink.contains(&Event::NightActionPerformed {
            player: "player-0".into(),
            role,
        }));
    }

    #[test]
    fn test_night_action_without_role_is_reported_not_fatal() {
        let sink = RecordingSink::default();
        let mut game = seeded_game(GameOptions::default());
        register_roster(&mut game, 2);
        game.switch_phase(&());

        game.process_message(
            Message::new(
                game.token(),
                GameplayMessage::from(NightMessage::RoleAction {
                    player_id: "player-0".into(),
                    args: ActionArgs::default(),
                }),
            ),
            &sink,
        );
        assert!(sink.contains(&Event::MessageRejected {
            reason: "player has no assigned role".to_owned(),
        }));

        // The session keeps processing afterwards.
        game.process_message(
            Message::new(
                game.token(),
                CtrlMessage::from(PlayerCtrlMessage::Register {
                    player_id: "late".into(),
                }),
            ),
            &sink,
        );
        assert_eq!(game.player_count(), 3);
    }

    #[test]
    fn test_mafia_vote_requires_mafia_membership() {
        let sink = RecordingSink::default();

        // Coefficient 1 seats the whole roster on the mafia team.
        let mut game = seeded_game(GameOptions {
            mafia_coefficient: 1,
            ..GameOptions::default()
        });
        register_roster(&mut game, 3);
        game.seat_roles(&());
        game.switch_phase(&());

        game.process_message(
            Message::new(
                game.token(),
                GameplayMessage::from(NightMessage::MafiaVote {
                    voter_id: "player-0".into(),
                    target_id: "player-1".into(),
                }),
            ),
            &sink,
        );
        assert!(sink.contains(&Event::MafiaVoteCast {
            voter: "player-0".into(),
            target: "player-1".into(),
        }));
        assert_eq!(
            game.player(&"player-0".into()).unwrap().vote_target(),
            Some(&"player-1".into())
        );

        // A large coefficient seats no mafia at all; the vote is ignored.
        let mut civilians = seeded_game(GameOptions {
            mafia_coefficient: 10,
            ..GameOptions::default()
        });
        register_roster(&mut civilians, 3);
        civilians.seat_roles(&());
        civilians.switch_phase(&());

        civilians.process_message(
            Message::new(
                civilians.token(),
                GameplayMessage::from(NightMessage::MafiaVote {
                    voter_id: "player-0".into(),
                    target_id: "player-1".into(),
                }),
            ),
            &sink,
        );
        assert!(sink.contains(&Event::MessageIgnored {
            reason: "player-0 is not an eligible mafia voter".to_owned(),
        }));
    }

    #[test]
    fn test_phase_mismatched_gameplay_is_ignored_without_error() {
        let sink = RecordingSink::default();
        let mut game = seeded_game(GameOptions::default());
        register_roster(&mut game, 3);

        // A night message during the day is acknowledged, not applied.
        game.process_message(
            Message::new(
                game.token(),
                GameplayMessage::from(NightMessage::Kill {
                    target_id: "player-0".into(),
                }),
            ),
            &sink,
        );
        assert!(game.player(&"player-0".into()).unwrap().is_alive());
        assert!(
            sink.events
                .borrow()
                .iter()
                .any(|event| matches!(event, Event::MessageIgnored { .. }))
        );
    }

    #[test]
    fn test_malformed_payload_is_rejected_not_fatal() {
        let sink = RecordingSink::default();
        let mut game = seeded_game(GameOptions::default());

        game.process_message(
            Message::new(
                game.token(),
                CtrlMessage::from(PlayerCtrlMessage::Register {
                    player_id: "".into(),
                }),
            ),
            &sink,
        );
        assert_eq!(game.player_count(), 0);
        assert!(
            sink.events
                .borrow()
                .iter()
                .any(|event| matches!(event, Event::MessageRejected { .. }))
        );
    }

    #[test]
    fn test_restart_resets_state_but_keeps_roster() {
        let mut game = seeded_game(GameOptions::default());
        register_roster(&mut game, 4);
        game.seat_roles(&());
        game.switch_phase(&());
        game.process_message(
            Message::new(
                game.token(),
                GameplayMessage::from(NightMessage::Kill {
                    target_id: "player-3".into(),
                }),
            ),
            &(),
        );

        game.process_message(session_ctrl(&game, SessionCtrlMessage::Restart), &());

        assert_eq!(game.phase_state(), PhaseState::Day(DayStage::Voting));
        assert_eq!(game.player_count(), 4);
        for i in 0..4 {
            let player = game.player(&format!("player-{i}").into()).unwrap();
            assert!(player.is_alive());
            assert_eq!(player.role_id(), None);
            assert_eq!(player.vote_target(), None);
        }
    }

    #[test]
    fn test_run_drains_ctrl_messages_in_arrival_order() {
        let sink = RecordingSink::default();
        let mut game = seeded_game(GameOptions::default());

        let inbox = game.inbox();
        for name in ["alice", "bob", "carol"] {
            inbox.push(Message::new(
                game.token(),
                CtrlMessage::from(PlayerCtrlMessage::Register {
                    player_id: name.into(),
                }),
            ));
        }
        inbox.push(session_ctrl(&game, SessionCtrlMessage::Run));
        inbox.push(session_ctrl(&game, SessionCtrlMessage::Stop));

        game.run(&sink);

        assert!(!game.is_running());
        assert_eq!(game.player_count(), 3);
        assert!(game.player(&"alice".into()).unwrap().role_id().is_some());
        assert!(sink.contains(&Event::SessionStopped {
            token: game.token(),
        }));
    }

    #[test]
    fn test_run_wakes_for_cross_thread_stop() {
        let mut game = seeded_game(GameOptions::default());
        let token = game.token();
        let inbox = game.inbox();

        let session = std::thread::spawn(move || {
            game.run(&());
            game
        });

        std::thread::sleep(std::time::Duration::from_millis(20));
        inbox.push(Message::new(
            token,
            CtrlMessage::from(SessionCtrlMessage::Stop),
        ));

        let game = session.join().unwrap();
        assert!(!game.is_running());
    }

    #[test]
    fn test_init_is_acknowledged() {
        let sink = RecordingSink::default();
        let mut game = seeded_game(GameOptions::default());
        game.process_message(session_ctrl(&game, SessionCtrlMessage::Init), &sink);
        assert!(sink.contains(&Event::SessionInitialized {
            token: game.token(),
        }));
    }
}
