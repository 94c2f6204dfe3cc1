use chrono::{DateTime, Utc};
use gd_core::domain::{
    Category, DepartmentId, GeoPoint, Priority, ProfileId, Sentiment, Status,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted grievance. Identity and timestamps are assigned by the store;
/// the classification fields are merged in from the accepted intake payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrievanceRecord {
    pub id: Uuid,
    pub reporter: ProfileId,
    pub description: String,
    pub location: Option<GeoPoint>,
    pub photo_url: Option<String>,
    pub category: Category,
    pub priority: Priority,
    pub sentiment: Sentiment,
    pub summary: String,
    pub confidence: u8,
    pub department: DepartmentId,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// One entry in a grievance's append-only status history. The first entry is
/// always the creation event with status `submitted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: Uuid,
    pub grievance_id: Uuid,
    pub status: Status,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
