// Error classification shared by every engine component.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad category of an engine failure.
///
/// Each component error maps onto one of these through its `kind()` method,
/// so callers can decide whether a failure is recoverable without matching
/// on every concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Illegal argument: wrong roster size, bad minute, bad card type.
    Validation,
    /// Operation not allowed in the current state: finished match,
    /// exhausted substitutions, completed tournament.
    State,
    /// A player or team referenced in a match it is not part of.
    Consistency,
    /// Required data is missing: group without qualifiers, bracket without
    /// a group, unfinished round robin.
    IncompleteData,
}

impl ErrorKind {
    /// Whether a simulation may skip the offending event and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ErrorKind::Validation)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::State => "state",
            ErrorKind::Consistency => "consistency",
            ErrorKind::IncompleteData => "incomplete data",
        };
        f.write_str(s)
    }
}
