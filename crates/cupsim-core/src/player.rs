// Player identity, playing positions, and card/goal counters.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Football positions used when building a lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    /// Parse a position abbreviation ("GK", "DF", "MF", "FW").
    ///
    /// Also accepts the long names and single-letter forms used by some
    /// squad lists ("G", "D", "M", "F").
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GK" | "G" | "GOALKEEPER" => Some(Position::Goalkeeper),
            "DF" | "D" | "DEFENDER" => Some(Position::Defender),
            "MF" | "M" | "MIDFIELDER" => Some(Position::Midfielder),
            "FW" | "F" | "FORWARD" => Some(Position::Forward),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DF",
            Position::Midfielder => "MF",
            Position::Forward => "FW",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

/// Card colours a referee can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardKind {
    Yellow,
    Red,
}

impl CardKind {
    pub fn display_str(&self) -> &'static str {
        match self {
            CardKind::Yellow => "YELLOW",
            CardKind::Red => "RED",
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

/// Returned when a card colour string is neither yellow nor red.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCardKind(pub String);

impl FromStr for CardKind {
    type Err = UnknownCardKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "YELLOW" | "Y" => Ok(CardKind::Yellow),
            "RED" | "R" => Ok(CardKind::Red),
            _ => Err(UnknownCardKind(s.to_string())),
        }
    }
}

/// The identity of a player: name, shirt number and position.
///
/// Two players are the same player exactly when their identities are equal;
/// counters never take part in equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId {
    pub name: String,
    pub shirt_number: u8,
    pub position: Position,
}

impl PlayerId {
    pub fn new(name: impl Into<String>, shirt_number: u8, position: Position) -> Self {
        PlayerId {
            name: name.into(),
            shirt_number,
            position,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ({})", self.shirt_number, self.name, self.position)
    }
}

/// A squad member with goal and card counters.
///
/// Counters only move through the match ledger (and through a team applying
/// a finished match), so the send-off rule always reflects the recorded
/// cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    goals: u32,
    yellow_cards: u32,
    red_cards: u32,
}

impl Player {
    pub fn new(name: impl Into<String>, shirt_number: u8, position: Position) -> Self {
        Player {
            id: PlayerId::new(name, shirt_number, position),
            goals: 0,
            yellow_cards: 0,
            red_cards: 0,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn shirt_number(&self) -> u8 {
        self.id.shirt_number
    }

    pub fn position(&self) -> Position {
        self.id.position
    }

    pub fn goals(&self) -> u32 {
        self.goals
    }

    pub fn yellow_cards(&self) -> u32 {
        self.yellow_cards
    }

    pub fn red_cards(&self) -> u32 {
        self.red_cards
    }

    /// A player is sent off after any red card or a second yellow.
    pub fn is_sent_off(&self) -> bool {
        self.red_cards >= 1 || self.yellow_cards >= 2
    }

    /// Whether the player may be selected (e.g. brought on as a substitute).
    pub fn is_eligible(&self) -> bool {
        !self.is_sent_off()
    }

    pub(crate) fn record_goal(&mut self) {
        self.goals += 1;
    }

    /// Book the player. Returns `true` when this card is the one that sends
    /// the player off.
    pub(crate) fn record_card(&mut self, kind: CardKind) -> bool {
        let was_sent_off = self.is_sent_off();
        match kind {
            CardKind::Yellow => self.yellow_cards += 1,
            CardKind::Red => self.red_cards += 1,
        }
        !was_sent_off && self.is_sent_off()
    }

    /// A copy with every counter at zero, used for match-scoped bookings.
    pub(crate) fn fresh(&self) -> Player {
        Player::new(self.id.name.clone(), self.id.shirt_number, self.id.position)
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Player {}

impl Hash for Player {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
