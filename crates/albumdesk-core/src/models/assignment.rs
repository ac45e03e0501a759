use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Folder, FolderRecord, Sender};

/// Order header embedded in a worker assignment, as returned by
/// `GET /order/user/{userId}`. Folders are not repeated here; the paired
/// folder rides alongside in [`AssignmentRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummaryRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(
        rename = "trackingId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tracking_id: Option<String>,
    pub sender: Sender,
    #[serde(rename = "uploadDate")]
    pub upload_date: DateTime<Utc>,
    #[serde(
        rename = "estimatedFinish",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_finish: Option<DateTime<Utc>>,
}

/// Flattened order+folder pair assigned to one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub order: OrderSummaryRecord,
    pub folder: FolderRecord,
}

/// Domain form of [`OrderSummaryRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub id: String,
    pub tracking_id: Option<String>,
    pub sender: Sender,
    pub upload_date: DateTime<Utc>,
    pub estimated_finish: Option<DateTime<Utc>>,
}

/// The worker view's projection of the canonical order/folder pair: one
/// folder of work joined with its parent order's header.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub order: OrderSummary,
    pub folder: Folder,
}

impl From<AssignmentRecord> for Assignment {
    fn from(record: AssignmentRecord) -> Self {
        Assignment {
            order: OrderSummary {
                id: record.order.id,
                tracking_id: record.order.tracking_id,
                sender: record.order.sender,
                upload_date: record.order.upload_date,
                estimated_finish: record.order.estimated_finish,
            },
            folder: Folder::from(record.folder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_decodes_nested_pair() {
        let json = serde_json::json!({
            "order": {
                "_id": "o7",
                "trackingId": "TRK-7",
                "sender": { "name": "Sari", "whatsapp": "+62 812-1111" },
                "uploadDate": "2024-02-01T00:00:00Z"
            },
            "folder": {
                "_id": "f7",
                "tipe": "Magazine",
                "ukuran": "A4",
                "description": "yearbook",
                "stepChecklist": ["Admin - Terima (done)"]
            }
        });
        let record: AssignmentRecord = serde_json::from_value(json).unwrap();
        let assignment = Assignment::from(record);
        assert_eq!(assignment.order.tracking_id.as_deref(), Some("TRK-7"));
        assert_eq!(assignment.folder.current_step(), Some("Admin - Terima"));
    }
}
