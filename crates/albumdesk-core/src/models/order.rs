use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::AppError;
use crate::models::{Folder, FolderRecord};

/// Lifecycle status of an order.
///
/// `new -> on-process -> complete -> history`; rejected orders are deleted
/// outright and never stored with a status. `history` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    New,
    OnProcess,
    Complete,
    History,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OrderStatus::New => write!(f, "new"),
            OrderStatus::OnProcess => write!(f, "on-process"),
            OrderStatus::Complete => write!(f, "complete"),
            OrderStatus::History => write!(f, "history"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // "pending" appears in older backend records as a synonym of new
            "new" | "pending" => Ok(OrderStatus::New),
            "on-process" => Ok(OrderStatus::OnProcess),
            "complete" => Ok(OrderStatus::Complete),
            "history" => Ok(OrderStatus::History),
            _ => Err(AppError::Parse(format!("Invalid order status: {}", s))),
        }
    }
}

/// Customer contact on an order. `whatsapp` may be in local (`08...`) or
/// international (`+62...`) format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub whatsapp: String,
}

/// Order as the backend serializes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(
        rename = "trackingId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tracking_id: Option<String>,
    pub sender: Sender,
    #[serde(default)]
    pub folders: Vec<FolderRecord>,
    #[serde(
        rename = "mainFolderId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub main_folder_id: Option<String>,
    #[serde(rename = "uploadDate")]
    pub upload_date: DateTime<Utc>,
    pub status: String,
    #[serde(
        rename = "estimatedFinish",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_finish: Option<DateTime<Utc>>,
    #[serde(
        rename = "workingNotes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub working_notes: Option<String>,
}

/// One customer submission containing one or more folders of work.
///
/// Invariant: `tracking_id` is present iff the order has passed acceptance
/// at least once.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub tracking_id: Option<String>,
    pub sender: Sender,
    pub folders: Vec<Folder>,
    pub main_folder_id: Option<String>,
    pub upload_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub estimated_finish: Option<DateTime<Utc>>,
    pub working_notes: Option<String>,
}

impl Order {
    pub fn folder(&self, folder_id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == folder_id)
    }

    pub fn folder_index(&self, folder_id: &str) -> Option<usize> {
        self.folders.iter().position(|f| f.id == folder_id)
    }

    /// Whether every folder has a checklist and its last step is done; used
    /// to offer the complete action without forcing.
    pub fn all_folders_complete(&self) -> bool {
        self.folders
            .iter()
            .all(|f| f.has_checklist() && f.is_complete())
    }
}

impl TryFrom<OrderRecord> for Order {
    type Error = AppError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        let status = record.status.parse::<OrderStatus>()?;
        Ok(Order {
            id: record.id,
            tracking_id: record.tracking_id,
            sender: record.sender,
            folders: record.folders.into_iter().map(Folder::from).collect(),
            main_folder_id: record.main_folder_id,
            upload_date: record.upload_date,
            status,
            estimated_finish: record.estimated_finish,
            working_notes: record.working_notes,
        })
    }
}
