use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Database model for drawings
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Drawing {
    pub id: Uuid,
    pub title: String,
    /// Object key in the file store, always under `drawings/`
    pub file: String,
    pub created: DateTime<Utc>,
}

impl fmt::Display for Drawing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Row to insert; `created` is assigned by the database
#[derive(Debug, Clone)]
pub struct NewDrawing {
    pub id: Uuid,
    pub title: String,
    pub file: String,
}

/// Column changes for an update, `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct DrawingPatch {
    pub title: Option<String>,
    pub file: Option<String>,
}
