use std::io::{Error as IoError, ErrorKind};
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use gd_core::domain::{
    Category, DepartmentId, GeoPoint, NewGrievance, Priority, ProfileId, Sentiment, Status,
    TransitionError,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::{GrievanceRecord, StatusChange};

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS grievances (
    id TEXT PRIMARY KEY,
    reporter_id TEXT NOT NULL,
    description TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    photo_url TEXT,
    category TEXT NOT NULL,
    priority TEXT NOT NULL,
    sentiment TEXT NOT NULL,
    summary TEXT NOT NULL,
    confidence INTEGER NOT NULL,
    department_id TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    resolved_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_grievances_department ON grievances(department_id);
CREATE INDEX IF NOT EXISTS idx_grievances_reporter ON grievances(reporter_id);

CREATE TABLE IF NOT EXISTS status_changes (
    id TEXT PRIMARY KEY,
    grievance_id TEXT NOT NULL REFERENCES grievances(id),
    status TEXT NOT NULL,
    note TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_status_changes_grievance ON status_changes(grievance_id);
"#;

const GRIEVANCE_COLUMNS: &str = "id, reporter_id, description, latitude, longitude, photo_url, \
     category, priority, sentiment, summary, confidence, department_id, status, \
     created_at, resolved_at";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

pub trait GrievanceStore: Send + Sync {
    fn init(&self) -> Result<(), StoreError>;
    fn insert_grievance(
        &self,
        reporter: &ProfileId,
        new: &NewGrievance,
    ) -> Result<GrievanceRecord, StoreError>;
    fn get_grievance(&self, id: &Uuid) -> Result<Option<GrievanceRecord>, StoreError>;
    fn list_all(&self) -> Result<Vec<GrievanceRecord>, StoreError>;
    fn list_for_reporter(&self, reporter: &ProfileId) -> Result<Vec<GrievanceRecord>, StoreError>;
    fn list_for_department(
        &self,
        department: &DepartmentId,
    ) -> Result<Vec<GrievanceRecord>, StoreError>;
    fn record_transition(
        &self,
        id: &Uuid,
        to: Status,
        note: Option<String>,
    ) -> Result<GrievanceRecord, StoreError>;
    fn history(&self, id: &Uuid) -> Result<Vec<StatusChange>, StoreError>;
}

pub struct SqliteGrievanceStore {
    conn: Mutex<Connection>,
}

impl SqliteGrievanceStore {
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock_conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("sqlite mutex poisoned")
    }
}

impl GrievanceStore for SqliteGrievanceStore {
    fn init(&self) -> Result<(), StoreError> {
        let conn = self.lock_conn();
        let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < SCHEMA_VERSION {
            conn.execute_batch(SCHEMA_SQL)?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        } else {
            conn.execute_batch(SCHEMA_SQL)?;
        }

        Ok(())
    }

    fn insert_grievance(
        &self,
        reporter: &ProfileId,
        new: &NewGrievance,
    ) -> Result<GrievanceRecord, StoreError> {
        let mut conn = self.lock_conn();
        let tx = conn.transaction()?;

        let record = GrievanceRecord {
            id: Uuid::new_v4(),
            reporter: reporter.clone(),
            description: new.draft.description.clone(),
            location: new.draft.location,
            photo_url: new.draft.photo_url.clone(),
            category: new.classification.category,
            priority: new.classification.priority,
            sentiment: new.classification.sentiment,
            summary: new.classification.summary.clone(),
            confidence: new.classification.confidence,
            department: new.department.clone(),
            status: new.initial_status(),
            created_at: Utc::now(),
            resolved_at: None,
        };

        tx.execute(
            &format!("INSERT INTO grievances ({GRIEVANCE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"),
            params![
                record.id.to_string(),
                record.reporter.as_str(),
                record.description,
                record.location.map(|p| p.latitude),
                record.location.map(|p| p.longitude),
                record.photo_url,
                record.category.as_str(),
                record.priority.as_str(),
                record.sentiment.as_str(),
                record.summary,
                record.confidence,
                record.department.as_str(),
                record.status.as_str(),
                record.created_at.to_rfc3339(),
                Option::<String>::None,
            ],
        )?;

        // Creation event lands in the same transaction as the row itself.
        tx.execute(
            "INSERT INTO status_changes (id, grievance_id, status, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Uuid::new_v4().to_string(),
                record.id.to_string(),
                record.status.as_str(),
                Option::<String>::None,
                record.created_at.to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(record)
    }

    fn get_grievance(&self, id: &Uuid) -> Result<Option<GrievanceRecord>, StoreError> {
        let conn = self.lock_conn();
        let record = conn
            .query_row(
                &format!("SELECT {GRIEVANCE_COLUMNS} FROM grievances WHERE id = ?1"),
                params![id.to_string()],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn list_all(&self) -> Result<Vec<GrievanceRecord>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GRIEVANCE_COLUMNS} FROM grievances ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map([], row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn list_for_reporter(&self, reporter: &ProfileId) -> Result<Vec<GrievanceRecord>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GRIEVANCE_COLUMNS} FROM grievances WHERE reporter_id = ?1 ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map(params![reporter.as_str()], row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn list_for_department(
        &self,
        department: &DepartmentId,
    ) -> Result<Vec<GrievanceRecord>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GRIEVANCE_COLUMNS} FROM grievances WHERE department_id = ?1 ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map(params![department.as_str()], row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn record_transition(
        &self,
        id: &Uuid,
        to: Status,
        note: Option<String>,
    ) -> Result<GrievanceRecord, StoreError> {
        let mut conn = self.lock_conn();
        let tx = conn.transaction()?;

        let current = tx
            .query_row(
                &format!("SELECT {GRIEVANCE_COLUMNS} FROM grievances WHERE id = ?1"),
                params![id.to_string()],
                row_to_record,
            )
            .optional()?;

        let Some(mut record) = current else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        // The transition check runs inside the transaction so a concurrent
        // writer cannot move the row past a terminal state underneath us.
        Status::transition(record.status, to)?;

        let now = Utc::now();
        record.status = to;
        if to == Status::Resolved {
            record.resolved_at = Some(now);
        }

        tx.execute(
            "UPDATE grievances SET status = ?1, resolved_at = ?2 WHERE id = ?3",
            params![
                record.status.as_str(),
                record.resolved_at.map(|t| t.to_rfc3339()),
                id.to_string(),
            ],
        )?;

        tx.execute(
            "INSERT INTO status_changes (id, grievance_id, status, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Uuid::new_v4().to_string(),
                id.to_string(),
                to.as_str(),
                note,
                now.to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(record)
    }

    fn history(&self, id: &Uuid) -> Result<Vec<StatusChange>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT id, grievance_id, status, note, created_at
             FROM status_changes WHERE grievance_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![id.to_string()], |row| {
            Ok(StatusChange {
                id: parse_uuid(row.get::<_, String>(0)?.as_str(), 0)?,
                grievance_id: parse_uuid(row.get::<_, String>(1)?.as_str(), 1)?,
                status: status_from_str(row.get::<_, String>(2)?.as_str(), 2)?,
                note: row.get(3)?,
                created_at: parse_timestamp(row.get::<_, String>(4)?.as_str(), 4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

// ---------------------------------------------------------------------------
// Row conversion helpers
// ---------------------------------------------------------------------------

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<GrievanceRecord> {
    let latitude: Option<f64> = row.get(3)?;
    let longitude: Option<f64> = row.get(4)?;
    let location = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    };

    let resolved_at: Option<String> = row.get(14)?;
    let resolved_at = match resolved_at {
        Some(raw) => Some(parse_timestamp(&raw, 14)?),
        None => None,
    };

    Ok(GrievanceRecord {
        id: parse_uuid(row.get::<_, String>(0)?.as_str(), 0)?,
        reporter: ProfileId::new(row.get::<_, String>(1)?),
        description: row.get(2)?,
        location,
        photo_url: row.get(5)?,
        category: category_from_str(row.get::<_, String>(6)?.as_str(), 6)?,
        priority: priority_from_str(row.get::<_, String>(7)?.as_str(), 7)?,
        sentiment: sentiment_from_str(row.get::<_, String>(8)?.as_str(), 8)?,
        summary: row.get(9)?,
        confidence: row.get(10)?,
        department: DepartmentId::new(row.get::<_, String>(11)?),
        status: status_from_str(row.get::<_, String>(12)?.as_str(), 12)?,
        created_at: parse_timestamp(row.get::<_, String>(13)?.as_str(), 13)?,
        resolved_at,
    })
}

fn column_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        Box::new(IoError::new(ErrorKind::InvalidData, message)),
    )
}

fn parse_uuid(raw: &str, idx: usize) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| column_error(idx, format!("invalid uuid: {e}")))
}

fn parse_timestamp(raw: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| column_error(idx, format!("invalid timestamp: {e}")))
}

fn status_from_str(raw: &str, idx: usize) -> rusqlite::Result<Status> {
    match raw {
        "submitted" => Ok(Status::Submitted),
        "in_progress" => Ok(Status::InProgress),
        "resolved" => Ok(Status::Resolved),
        "rejected" => Ok(Status::Rejected),
        other => Err(column_error(idx, format!("unknown status: {other}"))),
    }
}

fn category_from_str(raw: &str, idx: usize) -> rusqlite::Result<Category> {
    match raw {
        "sanitation" => Ok(Category::Sanitation),
        "roads" => Ok(Category::Roads),
        "electricity" => Ok(Category::Electricity),
        "water" => Ok(Category::Water),
        "law_and_order" => Ok(Category::LawAndOrder),
        "other" => Ok(Category::Other),
        "irrelevant" => Ok(Category::Irrelevant),
        other => Err(column_error(idx, format!("unknown category: {other}"))),
    }
}

fn priority_from_str(raw: &str, idx: usize) -> rusqlite::Result<Priority> {
    match raw {
        "high" => Ok(Priority::High),
        "medium" => Ok(Priority::Medium),
        "low" => Ok(Priority::Low),
        other => Err(column_error(idx, format!("unknown priority: {other}"))),
    }
}

fn sentiment_from_str(raw: &str, idx: usize) -> rusqlite::Result<Sentiment> {
    match raw {
        "negative" => Ok(Sentiment::Negative),
        "neutral" => Ok(Sentiment::Neutral),
        "positive" => Ok(Sentiment::Positive),
        other => Err(column_error(idx, format!("unknown sentiment: {other}"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
