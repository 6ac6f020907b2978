//! Role assignment engine
//!
//! This module computes which role each registered player receives at game
//! start. The mafia head-count follows the session's scarcity coefficient,
//! each team's roles are packed highest-priority-first while honoring
//! uniqueness, and the combined list is shuffled before seating so the
//! packing order reveals nothing about who holds what.

use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
};

use itertools::Itertools;

use crate::{
    Event,
    player::PlayerId,
    role::{Role, RoleDescriptor, RoleId, Team},
    sink::EventSink,
};

/// Computes the mafia head-count for a roster of `player_count`
///
/// The count is `player_count / mafia_coefficient`, floored at zero. A
/// non-positive coefficient is silently normalized to 1, never an error.
pub fn mafia_count(player_count: usize, mafia_coefficient: usize) -> usize {
    player_count / mafia_coefficient.max(1)
}

/// Assigns roles to players
///
/// The returned mapping pairs each player with the role they are to hold.
/// Players beyond the number of packable roles are absent from the mapping
/// and simply receive no role — a legitimate under-provisioning outcome.
/// The shuffle draws from `rng`, the only nondeterministic step; seed it
/// for reproducible assignments.
///
/// Packed and shuffled role lists are reported through `sink`; apart from
/// those events the engine has no side effects, and callers apply the
/// mapping to player state themselves.
///
/// # Arguments
///
/// * `players` - The roster, in seating order
/// * `enabled_roles` - Role kinds eligible for this game
/// * `mafia_coefficient` - Divisor for the mafia head-count, clamped to ≥ 1
/// * `rng` - Source of randomness for the shuffle
/// * `sink` - Collector for assignment events
pub fn assign_roles<S: EventSink>(
    players: &[PlayerId],
    enabled_roles: &HashSet<RoleId>,
    mafia_coefficient: usize,
    rng: &mut fastrand::Rng,
    sink: &S,
) -> HashMap<PlayerId, RoleId> {
    let mut available = enabled_roles.clone();

    // Candidate pool in catalog order, one descriptor per enabled role.
    let (mafia_pool, civilian_pool): (Vec<_>, Vec<_>) = RoleId::all()
        .filter(|id| available.contains(id))
        .map(RoleId::describe)
        .partition(|descriptor| descriptor.team == Team::Mafia);

    let mafia_quota = mafia_count(players.len(), mafia_coefficient);
    let mafias = pack_team(mafia_pool, mafia_quota, &mut available);
    sink.emit(&Event::TeamPacked {
        team: Team::Mafia,
        roles: mafias.clone(),
    });

    let civilian_quota = players.len().saturating_sub(mafia_quota);
    let civilians = pack_team(civilian_pool, civilian_quota, &mut available);
    sink.emit(&Event::TeamPacked {
        team: Team::Civilian,
        roles: civilians.clone(),
    });

    let mut shuffled = mafias.into_iter().chain(civilians).collect_vec();
    rng.shuffle(&mut shuffled);
    sink.emit(&Event::RolesShuffled {
        roles: shuffled.clone(),
    });

    players.iter().cloned().zip(shuffled).collect()
}

/// Packs one team's roles up to `quota`
///
/// Candidates are considered in descending priority (catalog order breaks
/// ties; this tie-break is implementation-defined). A still-available
/// candidate is materialized through the factory and consumes quota without
/// being removed, so non-unique roles may fill the rest of the quota by
/// themselves; a unique pick disables its role id in `available` for the
/// remainder of the assignment pass. A candidate disabled by a prior unique
/// pick is discarded without consuming quota.
fn pack_team(
    candidates: Vec<RoleDescriptor>,
    mut quota: usize,
    available: &mut HashSet<RoleId>,
) -> Vec<RoleId> {
    let candidates = candidates
        .into_iter()
        .sorted_by_key(|descriptor| Reverse(descriptor.priority))
        .collect_vec();

    let mut packed = Vec::new();
    let mut index = 0;
    while quota > 0 && index < candidates.len() {
        let candidate = &candidates[index];
        if available.contains(&candidate.id) {
            let role = Role::new(candidate.id);
            if role.is_unique() {
                available.remove(&candidate.id);
            }
            packed.push(role.id());
            quota -= 1;
        } else {
            index += 1;
        }
    }
    packed
}
