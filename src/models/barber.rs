use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::interceptors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarberStatus {
    Available,
    Busy,
}

impl BarberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarberStatus::Available => "available",
            BarberStatus::Busy => "busy",
        }
    }
}

impl fmt::Display for BarberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BarberStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BarberStatus::Available),
            "busy" => Ok(BarberStatus::Busy),
            other => Err(AppError::StorageError(format!("Unknown barber status: {}", other))),
        }
    }
}

/// Barber model (a staff member working one chair)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barber {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub chair_no: i32,
    pub status: BarberStatus,
    /// Queue entry currently in this barber's chair
    pub current_entry_id: Option<String>,
}

impl Barber {
    /// Create a new barber; new barbers always start available
    pub fn new(name: String, phone: Option<String>, chair_no: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            phone,
            chair_no,
            status: BarberStatus::Available,
            current_entry_id: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == BarberStatus::Available
    }

    pub fn assign(&mut self, entry_id: &str) {
        self.status = BarberStatus::Busy;
        self.current_entry_id = Some(entry_id.to_string());
    }

    pub fn free(&mut self) {
        self.status = BarberStatus::Available;
        self.current_entry_id = None;
    }
}

/// Database row for `barbers`
#[derive(Debug, Clone, FromRow)]
pub struct BarberRow {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub chair_no: i32,
    pub status: String,
    pub current_entry_id: Option<String>,
}

impl TryFrom<BarberRow> for Barber {
    type Error = AppError;

    fn try_from(row: BarberRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            phone: row.phone,
            chair_no: row.chair_no,
            status: row.status.parse()?,
            current_entry_id: row.current_entry_id,
        })
    }
}
