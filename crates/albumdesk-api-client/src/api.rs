//! Domain methods for the Albumdesk API client.
//!
//! One method per backend endpoint, with request bodies matching the
//! backend's JSON field names. Response schemas are inferred from the
//! production call sites: unknown fields are ignored and only the fields
//! the core consumes are required.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ApiClient;
use albumdesk_core::checklist;
use albumdesk_core::models::{AssignmentRecord, OrderRecord, UserRecord};
use albumdesk_core::process_types;
use albumdesk_core::{Assignment, Order, WorkType, Worker};

/// Tracking allocation response from `POST /tracking/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingRecord {
    #[serde(rename = "trackingId")]
    pub tracking_id: String,
}

/// Bulk sender/folder edit payload for `PATCH /order/update/{orderId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub sender: albumdesk_core::Sender,
    pub folders: Vec<FolderUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderUpdate {
    #[serde(default)]
    pub tipe: String,
    #[serde(default)]
    pub ukuran: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "kodeOrder", default, skip_serializing_if = "Option::is_none")]
    pub kode_order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

#[derive(Serialize)]
struct IdBody<'a> {
    #[serde(rename = "_id")]
    id: &'a str,
}

impl ApiClient {
    /// List all orders.
    pub async fn list_orders(&self) -> Result<Vec<OrderRecord>> {
        self.get("/order/get").await
    }

    /// List all orders, decoded to domain form. Records that fail to decode
    /// (unknown status strings) are skipped with a warning so one malformed
    /// order cannot blank the dashboard.
    pub async fn fetch_orders(&self) -> Result<Vec<Order>> {
        let records = self.list_orders().await?;
        Ok(decode_orders(records))
    }

    /// List the {order, folder} pairs assigned to one worker. The backend
    /// returns a bare object instead of an array when there is exactly one
    /// assignment; both shapes are accepted.
    pub async fn list_assignments(&self, user_id: &str) -> Result<Vec<AssignmentRecord>> {
        let value: serde_json::Value = self.get(&format!("/order/user/{}", user_id)).await?;
        let records = if value.is_array() {
            serde_json::from_value(value)
        } else {
            serde_json::from_value(value).map(|single| vec![single])
        };
        records.context("Failed to parse assignment list")
    }

    /// Assignments for one worker in domain form.
    pub async fn fetch_assignments(&self, user_id: &str) -> Result<Vec<Assignment>> {
        let records = self.list_assignments(user_id).await?;
        Ok(records.into_iter().map(Assignment::from).collect())
    }

    /// List all workers.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        self.get("/user").await
    }

    pub async fn fetch_workers(&self) -> Result<Vec<Worker>> {
        let records = self.list_users().await?;
        Ok(records.into_iter().map(Worker::from).collect())
    }

    /// Flip an order to on-process.
    pub async fn accept_order(&self, order_id: &str) -> Result<()> {
        self.patch_ok("/order/accept", &IdBody { id: order_id }).await
    }

    /// Allocate a tracking id for an order.
    pub async fn create_tracking(&self, order_id: &str) -> Result<TrackingRecord> {
        self.post_json("/tracking/create", &IdBody { id: order_id })
            .await
    }

    /// Attach an allocated tracking id to its order.
    pub async fn attach_tracking(&self, order_id: &str, tracking_id: &str) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            #[serde(rename = "_id")]
            id: &'a str,
            #[serde(rename = "trackingId")]
            tracking_id: &'a str,
        }
        self.patch_ok(
            "/order/tracking",
            &Body {
                id: order_id,
                tracking_id,
            },
        )
        .await
    }

    /// Assign a worker and working description to one folder.
    pub async fn assign_folder(
        &self,
        order_id: &str,
        folder_id: &str,
        assignee_id: &str,
        working_description: &str,
        folder_index: usize,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            #[serde(rename = "assigneeId")]
            assignee_id: &'a str,
            #[serde(rename = "orderId")]
            order_id: &'a str,
            #[serde(rename = "folderId")]
            folder_id: &'a str,
            #[serde(rename = "workingDescription")]
            working_description: &'a str,
            #[serde(rename = "folderIndex")]
            folder_index: usize,
        }
        self.patch_ok(
            "/order/folder/assign",
            &Body {
                assignee_id,
                order_id,
                folder_id,
                working_description,
                folder_index,
            },
        )
        .await
    }

    /// Set a folder's full checklist to the template for `work_type`. The
    /// template is read fresh from the process-type table and encoded to
    /// wire strings here.
    pub async fn assign_checklist(&self, folder_id: &str, work_type: WorkType) -> Result<()> {
        let template = process_types::template_checklist(work_type);
        self.assign_checklist_raw(folder_id, &checklist::encode_checklist(&template))
            .await
    }

    /// Set a folder's checklist to an explicit list of wire step strings.
    pub async fn assign_checklist_raw(&self, folder_id: &str, steps: &[String]) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            #[serde(rename = "folderId")]
            folder_id: &'a str,
            checklist: &'a [String],
        }
        self.patch_ok(
            "/order/assign/checklist",
            &Body {
                folder_id,
                checklist: steps,
            },
        )
        .await
    }

    /// Assign a worker to one folder (worker-initiated path).
    pub async fn assign_single_folder(&self, folder_id: &str, user_id: &str) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            #[serde(rename = "folderId")]
            folder_id: &'a str,
            #[serde(rename = "selectedUser")]
            selected_user: &'a str,
        }
        self.patch_ok(
            "/order/assign/singlefolder",
            &Body {
                folder_id,
                selected_user: user_id,
            },
        )
        .await
    }

    /// Toggle one checklist index done or undone.
    pub async fn set_step(&self, folder_id: &str, index: usize, done: bool) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            #[serde(rename = "folderId")]
            folder_id: &'a str,
            #[serde(rename = "checklistIndex")]
            checklist_index: usize,
        }
        let path = if done {
            "/order/checklist/done"
        } else {
            "/order/checklist/undone"
        };
        self.patch_ok(
            path,
            &Body {
                folder_id,
                checklist_index: index,
            },
        )
        .await
    }

    /// Record a folder's derived current-step string.
    pub async fn update_folder_status(
        &self,
        order_id: &str,
        folder_id: &str,
        status: &str,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            #[serde(rename = "orderId")]
            order_id: &'a str,
            #[serde(rename = "folderId")]
            folder_id: &'a str,
            status: &'a str,
        }
        self.patch_ok(
            "/order/folder/updatestatus",
            &Body {
                order_id,
                folder_id,
                status,
            },
        )
        .await
    }

    /// Flip an order to complete.
    pub async fn complete_order(&self, order_id: &str) -> Result<()> {
        self.patch_ok("/order/complete", &IdBody { id: order_id })
            .await
    }

    /// Flip an order to history.
    pub async fn archive_order(&self, order_id: &str) -> Result<()> {
        self.patch_ok("/order/history", &IdBody { id: order_id })
            .await
    }

    /// Soft-delete an order (finish flow).
    pub async fn delete_order(&self, order_id: &str) -> Result<()> {
        self.post_ok("/order/delete", &IdBody { id: order_id }).await
    }

    /// Delete an order and its folders entirely (reject flow).
    pub async fn delete_full_order(&self, order_id: &str) -> Result<()> {
        self.post_ok("/order/delete/fullorder", &IdBody { id: order_id })
            .await
    }

    /// Delete an order's tracking record.
    pub async fn delete_tracking(&self, order_id: &str) -> Result<()> {
        self.post_ok("/tracking/delete", &IdBody { id: order_id })
            .await
    }

    /// Bulk-update sender and folder fields.
    pub async fn update_order(&self, order_id: &str, update: &OrderUpdate) -> Result<()> {
        self.patch_ok(&format!("/order/update/{}", order_id), update)
            .await
    }

    /// Set the estimated delivery date.
    pub async fn set_estimated_finish(
        &self,
        order_id: &str,
        estimated_finish: DateTime<Utc>,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct Body {
            #[serde(rename = "estimatedFinish")]
            estimated_finish: DateTime<Utc>,
        }
        self.patch_ok(
            &format!("/order/update/estimatedFinish/{}", order_id),
            &Body { estimated_finish },
        )
        .await
    }
}

/// Decode order records, skipping any that fail with a warning.
pub fn decode_orders(records: Vec<OrderRecord>) -> Vec<Order> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.id.clone();
            match Order::try_from(record) {
                Ok(order) => Some(order),
                Err(e) => {
                    tracing::warn!(order_id = %id, error = %e, "Skipping undecodable order");
                    None
                }
            }
        })
        .collect()
}
