//! Role catalog, factory, and role instances
//!
//! This module defines the closed set of roles a player can hold, the static
//! catalog describing each role kind (team affiliation, packing priority,
//! relative weight, uniqueness), and the materialized [`Role`] instances that
//! carry the role-delegated behavior. Night-action resolution is deliberately
//! not implemented here; a role only reports what it did so the surrounding
//! scheduler can resolve the effects.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use enum_map::{Enum, EnumMap, enum_map};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

/// The two opposing teams that determine win-condition alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum Team {
    /// The informed minority trying to eliminate the civilians
    Mafia,
    /// The uninformed majority trying to root out the mafia
    Civilian,
}

/// Identifier of a role kind
///
/// The enumeration is closed; its declaration order is the catalog iteration
/// order, which also serves as the (implementation-defined) tie-break between
/// equal-priority roles during assignment packing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, SerializeDisplay, DeserializeFromStr,
)]
pub enum RoleId {
    /// Plain civilian with no special ability
    Villager,
    /// Mafia-team member participating in the night kill
    Mafia,
    /// Civilian-team member able to protect a player at night
    Healer,
    /// Civilian-team member able to investigate a player at night
    Detective,
}

/// Errors that can occur when resolving role identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The supplied name does not identify any catalogued role
    #[error("unknown role `{0}`")]
    Unknown(String),
}

/// Static description of a role kind
///
/// Exactly one descriptor exists per [`RoleId`]. Descriptors are immutable
/// catalog data: the assignment engine keys on `priority`, while `weight` is
/// metadata exposed for integrators (balance heuristics, display ordering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDescriptor {
    /// The role kind this descriptor belongs to
    pub id: RoleId,
    /// Team affiliation of the role
    pub team: Team,
    /// Packing priority; higher-priority roles are seated first
    pub priority: u32,
    /// Relative weight of the role, not consulted by the packing algorithm
    pub weight: u32,
    /// Whether at most one live instance may be assigned per game
    pub unique: bool,
}

/// Returns the full role catalog in catalog iteration order
///
/// The catalog is total over the closed [`RoleId`] enumeration: every role
/// kind has exactly one descriptor.
pub fn catalog() -> EnumMap<RoleId, RoleDescriptor> {
    enum_map! {
        RoleId::Villager => RoleDescriptor {
            id: RoleId::Villager,
            team: Team::Civilian,
            priority: 0,
            weight: 1,
            unique: false,
        },
        RoleId::Mafia => RoleDescriptor {
            id: RoleId::Mafia,
            team: Team::Mafia,
            priority: 0,
            weight: 3,
            unique: false,
        },
        RoleId::Healer => RoleDescriptor {
            id: RoleId::Healer,
            team: Team::Civilian,
            priority: 10,
            weight: 2,
            unique: true,
        },
        RoleId::Detective => RoleDescriptor {
            id: RoleId::Detective,
            team: Team::Civilian,
            priority: 5,
            weight: 2,
            unique: true,
        },
    }
}

impl RoleId {
    /// Looks up this role's catalog descriptor
    pub fn describe(self) -> RoleDescriptor {
        catalog()[self]
    }

    /// Iterates over every role kind in catalog order
    pub fn all() -> impl Iterator<Item = RoleId> {
        catalog().into_iter().map(|(id, _)| id)
    }
}

impl Display for RoleId {
    /// Formats the role id as its lower-case wire name
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Villager => "villager",
            Self::Mafia => "mafia",
            Self::Healer => "healer",
            Self::Detective => "detective",
        })
    }
}

impl FromStr for RoleId {
    type Err = Error;

    /// Parses a role id from its lower-case wire name
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unknown`] for any string that is not the name of a
    /// catalogued role.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "villager" => Ok(Self::Villager),
            "mafia" => Ok(Self::Mafia),
            "healer" => Ok(Self::Healer),
            "detective" => Ok(Self::Detective),
            other => Err(Error::Unknown(other.to_owned())),
        }
    }
}

/// Free-form arguments carried by a night action
pub type ActionArgs = HashMap<String, serde_json::Value>;

/// Record of a performed night action
///
/// The engine does not resolve night effects (kill, heal, investigate); it
/// reports the acting role and its arguments so the integrating scheduler
/// can apply whatever resolution policy it implements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
    /// The role kind that acted
    pub role: RoleId,
    /// The arguments the action was invoked with
    pub args: ActionArgs,
}

/// A materialized role instance
///
/// Instances are created by the factory ([`Role::new`]) and independently
/// owned by a single player; no role state is shared between instances. The
/// closed variant set dispatches behavior by `match`, keeping the capability
/// surface (`team`, `priority`, `weight`, `is_unique`, `perform_action`)
/// identical across kinds without open-ended subclassing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// A villager instance
    Villager,
    /// A mafia instance
    Mafia,
    /// A healer instance
    Healer,
    /// A detective instance
    Detective,
}

impl Role {
    /// Creates a fresh role instance of the given kind
    ///
    /// This is the role factory: side-effect free apart from allocation and
    /// total over the closed [`RoleId`] enumeration.
    pub fn new(id: RoleId) -> Self {
        match id {
            RoleId::Villager => Self::Villager,
            RoleId::Mafia => Self::Mafia,
            RoleId::Healer => Self::Healer,
            RoleId::Detective => Self::Detective,
        }
    }

    /// Returns the role kind of this instance
    pub fn id(&self) -> RoleId {
        match self {
            Self::Villager => RoleId::Villager,
            Self::Mafia => RoleId::Mafia,
            Self::Healer => RoleId::Healer,
            Self::Detective => RoleId::Detective,
        }
    }

    /// Returns the team this role fights for
    pub fn team(&self) -> Team {
        self.id().describe().team
    }

    /// Returns the packing priority of this role
    pub fn priority(&self) -> u32 {
        self.id().describe().priority
    }

    /// Returns the relative weight of this role
    pub fn weight(&self) -> u32 {
        self.id().describe().weight
    }

    /// Returns whether at most one instance of this role may be assigned
    pub fn is_unique(&self) -> bool {
        self.id().describe().unique
    }

    /// Performs this role's night action
    ///
    /// Resolution is delegated to the integrating scheduler: the returned
    /// report states which role acted and with what arguments, nothing more.
    pub fn perform_action(&self, args: ActionArgs) -> ActionReport {
        ActionReport {
            role: self.id(),
            args,
        }
    }
}
