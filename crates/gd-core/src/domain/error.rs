use crate::domain::{Category, DepartmentId, ProfileId, Status};

// ---------------------------------------------------------------------------
// Sub-error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("classifier API key not configured")]
    MissingCredential,
    #[error("classifier connection failed: {0}")]
    Transport(String),
    #[error("classifier returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("malformed classifier output: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("invalid API key")]
    InvalidApiKey,
    #[error("profile {profile} is inactive")]
    InactiveProfile { profile: ProfileId },
    #[error("profile {profile} may not update grievances of department {department}")]
    DepartmentScope {
        profile: ProfileId,
        department: DepartmentId,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("status {from} is terminal")]
    Terminal { from: Status },
    #[error("invalid status transition {from} -> {to}")]
    Invalid { from: Status, to: Status },
}

#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("category {category} has no department route")]
    UnroutedCategory { category: Category },
    #[error("category {category} routed more than once")]
    DuplicateRoute { category: Category },
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
