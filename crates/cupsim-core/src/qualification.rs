// Group winners and runners-up.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::standings::StandingRow;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QualificationError {
    #[error("group {0} has fewer than two teams in its table")]
    IncompleteGroup(char),
}

impl QualificationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::IncompleteData
    }
}

/// The two teams a group sends to the knockout stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifiers {
    pub winner: String,
    pub runner_up: String,
}

/// Take the top two rows of every (already ordered) group table.
pub fn select_qualifiers(
    tables: &BTreeMap<char, Vec<StandingRow>>,
) -> Result<BTreeMap<char, Qualifiers>, QualificationError> {
    tables
        .iter()
        .map(|(&group, rows)| match rows.as_slice() {
            [first, second, ..] => Ok((
                group,
                Qualifiers {
                    winner: first.team.clone(),
                    runner_up: second.team.clone(),
                },
            )),
            _ => Err(QualificationError::IncompleteGroup(group)),
        })
        .collect()
}
