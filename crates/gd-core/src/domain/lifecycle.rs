use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::TransitionError;

// ---------------------------------------------------------------------------
// Status — grievance lifecycle states
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Submitted,
    InProgress,
    Resolved,
    Rejected,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Submitted => "submitted",
            Status::InProgress => "in_progress",
            Status::Resolved => "resolved",
            Status::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Resolved | Status::Rejected)
    }

    /// Check a lifecycle transition.
    ///
    /// Allowed: `submitted -> in_progress` (claim), `in_progress -> resolved`
    /// (close), `submitted -> rejected` (discard before any work starts).
    /// Terminal states admit nothing.
    pub fn transition(from: Status, to: Status) -> Result<(), TransitionError> {
        if from.is_terminal() {
            return Err(TransitionError::Terminal { from });
        }
        match (from, to) {
            (Status::Submitted, Status::InProgress)
            | (Status::Submitted, Status::Rejected)
            | (Status::InProgress, Status::Resolved) => Ok(()),
            _ => Err(TransitionError::Invalid { from, to }),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
