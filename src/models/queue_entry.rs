use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::interceptors::AppError;

/// Lifecycle of a customer in the shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    Waiting,
    InProgress,
    Done,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "WAITING",
            QueueStatus::InProgress => "IN_PROGRESS",
            QueueStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WAITING" => Ok(QueueStatus::Waiting),
            "IN_PROGRESS" => Ok(QueueStatus::InProgress),
            "DONE" => Ok(QueueStatus::Done),
            other => Err(AppError::StorageError(format!("Unknown queue status: {}", other))),
        }
    }
}

/// A single customer's queue record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: String,
    pub customer_name: String,
    pub service_type: String,
    pub status: QueueStatus,
    pub barber_id: Option<String>,
    pub joined_at: DateTime<Utc>,
    /// 1-based rank in the line; only set while `status` is `Waiting`
    pub position: Option<u32>,
}

impl QueueEntry {
    /// Create a new waiting entry at the given position
    pub fn new(customer_name: String, service_type: String, position: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            customer_name,
            service_type,
            status: QueueStatus::Waiting,
            barber_id: None,
            joined_at: Utc::now(),
            position: Some(position),
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.status == QueueStatus::Waiting
    }

    /// Move the entry into service with the given barber
    pub fn mark_in_progress(&mut self, barber_id: &str) {
        self.status = QueueStatus::InProgress;
        self.barber_id = Some(barber_id.to_string());
        self.position = None;
    }

    pub fn mark_done(&mut self) {
        self.status = QueueStatus::Done;
        self.position = None;
    }
}

/// Database row for `queue_entries`
#[derive(Debug, Clone, FromRow)]
pub struct QueueEntryRow {
    pub id: String,
    pub customer_name: String,
    pub service_type: String,
    pub status: String,
    pub barber_id: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub position: Option<i32>,
}

impl TryFrom<QueueEntryRow> for QueueEntry {
    type Error = AppError;

    fn try_from(row: QueueEntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            customer_name: row.customer_name,
            service_type: row.service_type,
            status: row.status.parse()?,
            barber_id: row.barber_id,
            joined_at: row.joined_at,
            position: row.position.map(|p| p.max(0) as u32),
        })
    }
}
