// Roster construction, lineup membership and substitutions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::player::{Player, PlayerId};

/// Players in a complete starting lineup.
pub const STARTING_SIZE: usize = 11;
/// Maximum number of players on the bench.
pub const MAX_SUBSTITUTES: usize = 11;
/// Maximum number of distinct players on a roster.
pub const MAX_SQUAD: usize = STARTING_SIZE + MAX_SUBSTITUTES;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("starting lineup already has {max} players", max = STARTING_SIZE)]
    StartingFull,

    #[error("bench is full ({bench} substitutes, {squad} players in total)", bench = MAX_SUBSTITUTES, squad = MAX_SQUAD)]
    BenchFull,

    #[error("{0} is already on the roster")]
    AlreadyRostered(PlayerId),

    #[error("{0} is not in the starting lineup")]
    NotInStarting(PlayerId),

    #[error("{0} is not an eligible substitute")]
    NotEligibleSubstitute(PlayerId),
}

impl RosterError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// A team's starting XI and bench.
///
/// The two lists are only changed through the methods below, so a player
/// is never in both at once and the squad never exceeds [`MAX_SQUAD`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    starting: Vec<Player>,
    substitutes: Vec<Player>,
    /// Players substituted off in the current match; they cannot come back.
    #[serde(default)]
    withdrawn: Vec<PlayerId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player to the starting lineup.
    pub fn add_starting(&mut self, player: Player) -> Result<(), RosterError> {
        if self.contains(player.id()) {
            return Err(RosterError::AlreadyRostered(player.id().clone()));
        }
        if self.starting.len() >= STARTING_SIZE {
            return Err(RosterError::StartingFull);
        }
        self.starting.push(player);
        Ok(())
    }

    /// Add a player to the bench.
    pub fn add_substitute(&mut self, player: Player) -> Result<(), RosterError> {
        if self.contains(player.id()) {
            return Err(RosterError::AlreadyRostered(player.id().clone()));
        }
        if self.substitutes.len() >= MAX_SUBSTITUTES || self.len() >= MAX_SQUAD {
            return Err(RosterError::BenchFull);
        }
        self.substitutes.push(player);
        Ok(())
    }

    /// Whether the player is currently starting or on the bench.
    pub fn contains(&self, id: &PlayerId) -> bool {
        self.is_starting(id) || self.is_substitute(id)
    }

    pub fn is_starting(&self, id: &PlayerId) -> bool {
        self.starting.iter().any(|p| p.id() == id)
    }

    pub fn is_substitute(&self, id: &PlayerId) -> bool {
        self.substitutes.iter().any(|p| p.id() == id)
    }

    /// Whether the player has already been substituted off in this match.
    pub fn is_withdrawn(&self, id: &PlayerId) -> bool {
        self.withdrawn.contains(id)
    }

    pub fn starting(&self) -> &[Player] {
        &self.starting
    }

    pub fn substitutes(&self) -> &[Player] {
        &self.substitutes
    }

    /// Every player on the roster, starters first.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.starting.iter().chain(self.substitutes.iter())
    }

    pub fn find(&self, id: &PlayerId) -> Option<&Player> {
        self.players().find(|p| p.id() == id)
    }

    pub(crate) fn find_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.starting
            .iter_mut()
            .chain(self.substitutes.iter_mut())
            .find(|p| p.id() == id)
    }

    /// Number of players on the roster.
    pub fn len(&self) -> usize {
        self.starting.len() + self.substitutes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the starting lineup has exactly [`STARTING_SIZE`] players.
    pub fn is_complete(&self) -> bool {
        self.starting.len() == STARTING_SIZE
    }

    /// Swap a starter for a bench player.
    ///
    /// The incoming player takes the outgoing player's place in the lineup
    /// order; the outgoing player moves to the bench and is marked as
    /// withdrawn so they cannot come back on. The substitution quota is the
    /// caller's responsibility.
    pub fn substitute(&mut self, out: &PlayerId, incoming: &PlayerId) -> Result<(), RosterError> {
        let out_idx = self
            .starting
            .iter()
            .position(|p| p.id() == out)
            .ok_or_else(|| RosterError::NotInStarting(out.clone()))?;

        let in_idx = self
            .substitutes
            .iter()
            .position(|p| p.id() == incoming && p.is_eligible())
            .filter(|_| !self.is_withdrawn(incoming))
            .ok_or_else(|| RosterError::NotEligibleSubstitute(incoming.clone()))?;

        let in_player = self.substitutes.remove(in_idx);
        let out_player = std::mem::replace(&mut self.starting[out_idx], in_player);
        self.substitutes.push(out_player);
        self.withdrawn.push(out.clone());
        Ok(())
    }

    /// Remove a sent-off player from whichever list holds them.
    pub(crate) fn send_off(&mut self, id: &PlayerId) -> Option<Player> {
        if let Some(idx) = self.starting.iter().position(|p| p.id() == id) {
            return Some(self.starting.remove(idx));
        }
        self.substitutes
            .iter()
            .position(|p| p.id() == id)
            .map(|idx| self.substitutes.remove(idx))
    }

    /// A match-scoped copy: same lineup, zeroed counters, nobody withdrawn.
    pub fn for_match(&self) -> Roster {
        Roster {
            starting: self.starting.iter().map(Player::fresh).collect(),
            substitutes: self.substitutes.iter().map(Player::fresh).collect(),
            withdrawn: Vec::new(),
        }
    }
}
