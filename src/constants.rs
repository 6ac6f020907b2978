//! Configuration constants for the Mafia game engine
//!
//! This module contains the configuration limits and intervals used
//! throughout the engine to ensure data integrity and provide consistent
//! boundaries for the different game components.

/// Session-level configuration constants
pub mod session {
    /// Length of generated session tokens in characters
    pub const TOKEN_LENGTH: usize = 4;
    /// Default divisor for computing the mafia head-count from the roster size
    pub const DEFAULT_MAFIA_COEFFICIENT: usize = 4;
    /// Bounded wait of the dispatch loop before re-checking the running flag
    pub const QUEUE_POLL_INTERVAL: web_time::Duration = web_time::Duration::from_secs(1);
}

/// Player configuration constants
pub mod player {
    /// Minimum length of an externally supplied player identifier
    pub const MIN_ID_LENGTH: usize = 1;
    /// Maximum length of an externally supplied player identifier
    pub const MAX_ID_LENGTH: usize = 30;
}
