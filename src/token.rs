//! Session token generation and management
//!
//! This module provides functionality for generating and managing the opaque
//! tokens that identify game sessions. Tokens are short uppercase-alphanumeric
//! codes so they stay easy to communicate out-of-band, and every message
//! routed to a session carries one.

use std::{fmt::Display, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

use crate::constants::session::TOKEN_LENGTH;

/// Characters a session token may be built from
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A unique identifier for a game session
///
/// Tokens are generated randomly at session creation and have a fixed length.
/// They are opaque to the engine; transports use them to route messages to
/// the right session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct SessionToken([u8; TOKEN_LENGTH]);

/// Errors that can occur when parsing a session token
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The string has the wrong number of characters
    #[error("token must be exactly {TOKEN_LENGTH} characters long")]
    Length,
    /// The string contains a character outside the token alphabet
    #[error("token may only contain uppercase letters and digits")]
    Charset,
}

impl SessionToken {
    /// Creates a new random session token
    pub fn new() -> Self {
        Self(std::array::from_fn(|_| {
            ALPHABET[fastrand::usize(..ALPHABET.len())]
        }))
    }
}

impl Default for SessionToken {
    /// Creates a new random session token (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionToken {
    /// Formats the token as its uppercase-alphanumeric string form
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(std::str::from_utf8(&self.0).expect("token bytes are always ASCII"))
    }
}

impl FromStr for SessionToken {
    type Err = Error;

    /// Parses a session token from its string representation
    ///
    /// # Errors
    ///
    /// Returns [`Error::Length`] if the string is not exactly
    /// [`TOKEN_LENGTH`] characters, or [`Error::Charset`] if it contains a
    /// character that is not an uppercase ASCII letter or digit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; TOKEN_LENGTH] = s.as_bytes().try_into().map_err(|_| Error::Length)?;
        if bytes.iter().all(|b| ALPHABET.contains(b)) {
            Ok(Self(bytes))
        } else {
            Err(Error::Charset)
        }
    }
}
