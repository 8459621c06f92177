// Round-of-16 cross pairing.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::error::ErrorKind;
use crate::qualification::Qualifiers;

/// The eight group letters, in draw order.
pub const GROUP_LETTERS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Groups that feed each other: the winner of one plays the runner-up of
/// the other, in both directions.
const CROSS_PAIRS: [(char, char); 4] = [('A', 'B'), ('C', 'D'), ('E', 'F'), ('G', 'H')];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("no qualifiers for group {0}")]
    MissingGroup(char),
}

impl BracketError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::IncompleteData
    }
}

/// Lay out the sixteen qualifiers so that entries `2i` and `2i + 1` meet
/// in the round of 16:
///
/// `A1 B2 B1 A2 C1 D2 D1 C2 E1 F2 F1 E2 G1 H2 H1 G2`
pub fn build_round_of_16(
    qualifiers: &BTreeMap<char, Qualifiers>,
) -> Result<Vec<String>, BracketError> {
    let get = |g: char| qualifiers.get(&g).ok_or(BracketError::MissingGroup(g));

    // Report the first missing letter in draw order, not pair order.
    for g in GROUP_LETTERS {
        get(g)?;
    }

    let mut bracket = Vec::with_capacity(16);
    for (left, right) in CROSS_PAIRS {
        let l = get(left)?;
        let r = get(right)?;
        bracket.push(l.winner.clone());
        bracket.push(r.runner_up.clone());
        bracket.push(r.winner.clone());
        bracket.push(l.runner_up.clone());
    }
    Ok(bracket)
}
