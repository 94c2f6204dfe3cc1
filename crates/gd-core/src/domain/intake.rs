use serde::{Deserialize, Serialize};

use crate::domain::{
    Category, Classification, ClassifyError, DepartmentDirectory, DepartmentId, Status,
};

// ---------------------------------------------------------------------------
// Draft types — ephemeral citizen input
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Raw citizen input. Lives only until classified; a rejected draft is never
/// persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrievanceDraft {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

// ---------------------------------------------------------------------------
// NewGrievance — accepted intake payload, pre-identity
// ---------------------------------------------------------------------------

/// The record the pipeline emits on acceptance. The store assigns identity
/// and timestamps; the initial status is always `Submitted`.
#[derive(Clone, Debug, PartialEq)]
pub struct NewGrievance {
    pub draft: GrievanceDraft,
    pub classification: Classification,
    pub department: DepartmentId,
}

impl NewGrievance {
    pub fn initial_status(&self) -> Status {
        Status::Submitted
    }
}

// ---------------------------------------------------------------------------
// IntakeDecision + decide — the acceptance policy
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum IntakeDecision {
    /// Valid civic grievance; persist with the routed department.
    Accepted(NewGrievance),
    /// The model judged the input out of domain. Normal terminal outcome,
    /// not an error; nothing is persisted.
    Rejected { reason: String },
    /// Classification failed (credential, transport, or malformed output).
    /// The caller decides what to do; nothing is persisted.
    Unavailable,
}

/// Turn a classifier outcome into an intake decision.
///
/// Pure: no I/O, no clock. Every classifier failure collapses to
/// `Unavailable` here rather than inside the client, so the policy stays in
/// one place.
pub fn decide(
    draft: GrievanceDraft,
    outcome: Result<Classification, ClassifyError>,
    directory: &DepartmentDirectory,
) -> IntakeDecision {
    let classification = match outcome {
        Ok(c) => c,
        Err(_) => return IntakeDecision::Unavailable,
    };

    if classification.category == Category::Irrelevant {
        return IntakeDecision::Rejected {
            reason: classification.summary,
        };
    }

    // The directory is validated complete at bootstrap, so every routable
    // category resolves; this branch cannot reject a valid classification.
    let Some(department) = directory.route(classification.category) else {
        return IntakeDecision::Unavailable;
    };

    IntakeDecision::Accepted(NewGrievance {
        draft,
        classification,
        department: department.clone(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
