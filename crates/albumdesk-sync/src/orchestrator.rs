//! Action orchestrator
//!
//! Turns the reducer's effect lists into backend calls, strictly in order:
//! later steps consume identifiers produced by earlier ones (the tracking id
//! must exist before it can be attached or mentioned in a notification).
//! The orchestrator does no business computation of its own; transitions
//! and effect sequences come from `albumdesk_core::reducer`.
//!
//! Failure policy: a failing step aborts the remaining pipeline and
//! surfaces the error; effects already committed on the backend stay
//! committed (no compensating rollback), and the caller retries the whole
//! action. The accept pipeline is the exception for *folder-scoped* steps:
//! folders are independent units of work, so one folder's failure is
//! recorded and its remaining sub-steps skipped while sibling folders
//! proceed.
//!
//! A per-(action, order) busy guard rejects re-invocation while a pipeline
//! is in flight, so a double-click cannot allocate two tracking ids or send
//! the WhatsApp message twice.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use albumdesk_api_client::ApiClient;
use albumdesk_core::models::Assignment;
use albumdesk_core::reducer::{self, Effect, FolderAssignment, OrderAction, StepToggle};
use albumdesk_core::{notify, AppError, Order};

/// Delivery hook for the WhatsApp deep link. The default implementation
/// only logs the link; delivery is a side effect the orchestrator triggers
/// but does not validate.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, link: &str) -> Result<()>;
}

/// Logs the prepared link and reports success.
pub struct LinkNotifier;

#[async_trait]
impl Notifier for LinkNotifier {
    async fn send(&self, link: &str) -> Result<()> {
        tracing::info!(link, "WhatsApp notification prepared");
        Ok(())
    }
}

/// Result of one orchestrated action.
#[derive(Debug, Default)]
pub struct ActionOutcome {
    /// Tracking id allocated during this pipeline, if any.
    pub tracking_id: Option<String>,
    /// Prepared `wa.me` link, when the pipeline reached its notification.
    pub notification_link: Option<String>,
    /// Folders whose sub-steps failed while siblings proceeded.
    pub folder_failures: Vec<FolderFailure>,
}

#[derive(Debug)]
pub struct FolderFailure {
    pub folder_id: String,
    pub error: String,
}

pub struct Orchestrator {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
    in_flight: Mutex<HashSet<(&'static str, String)>>,
}

impl Orchestrator {
    pub fn new(client: ApiClient) -> Self {
        Self::with_notifier(client, Arc::new(LinkNotifier))
    }

    pub fn with_notifier(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            notifier,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Accept a new order: flip status, allocate and attach a tracking id,
    /// set up every folder's worker and checklist, notify the customer.
    pub async fn accept(
        &self,
        order: &Order,
        assignments: Vec<FolderAssignment>,
    ) -> Result<ActionOutcome> {
        self.run(order, &OrderAction::Accept { assignments }, true)
            .await
    }

    /// Flip an order to complete and prepare the pickup notification.
    pub async fn complete(&self, order: &Order, forced: bool) -> Result<ActionOutcome> {
        self.run(order, &OrderAction::Complete { forced }, false).await
    }

    /// Archive a completed order and delete its tracking record.
    pub async fn finish(&self, order: &Order) -> Result<ActionOutcome> {
        self.run(order, &OrderAction::Finish, false).await
    }

    /// Delete an order (and its tracking record) entirely.
    pub async fn reject(&self, order: &Order) -> Result<ActionOutcome> {
        self.run(order, &OrderAction::Reject, false).await
    }

    /// Assign one folder to a worker (admin path).
    pub async fn assign_folder(
        &self,
        order: &Order,
        folder_id: &str,
        assignee_id: &str,
        working_description: &str,
    ) -> Result<ActionOutcome> {
        self.run(
            order,
            &OrderAction::AssignFolder {
                folder_id: folder_id.to_string(),
                assignee_id: assignee_id.to_string(),
                working_description: working_description.to_string(),
            },
            false,
        )
        .await
    }

    /// Apply a batch of checklist toggles, record the derived current step,
    /// and optionally hand the folder to another worker (worker confirm
    /// flow).
    pub async fn confirm_steps(
        &self,
        order: &Order,
        folder_id: &str,
        toggles: Vec<StepToggle>,
        assign_to: Option<String>,
    ) -> Result<ActionOutcome> {
        self.run(
            order,
            &OrderAction::MarkSteps {
                folder_id: folder_id.to_string(),
                toggles,
                assign_to,
            },
            false,
        )
        .await
    }

    /// Backfill checklists for assigned folders that have none yet (the
    /// worker view repairs folders accepted before checklists existed).
    /// Returns how many folders were backfilled.
    pub async fn ensure_checklists(&self, assignments: &[Assignment]) -> Result<usize> {
        let mut assigned = 0;
        for assignment in assignments {
            if !assignment.folder.has_checklist() {
                self.client
                    .assign_checklist(&assignment.folder.id, assignment.folder.work_type())
                    .await?;
                assigned += 1;
            }
        }
        Ok(assigned)
    }

    async fn run(
        &self,
        order: &Order,
        action: &OrderAction,
        contain_folder_failures: bool,
    ) -> Result<ActionOutcome> {
        let transition = reducer::apply(order, action)?;
        let _guard = self.begin(action.name(), &order.id)?;

        tracing::info!(
            order_id = %order.id,
            action = action.name(),
            steps = transition.effects.len(),
            "Running action pipeline"
        );

        self.run_effects(order, transition.effects, contain_folder_failures)
            .await
    }

    async fn run_effects(
        &self,
        order: &Order,
        effects: Vec<Effect>,
        contain_folder_failures: bool,
    ) -> Result<ActionOutcome> {
        let mut outcome = ActionOutcome::default();
        let mut failed_folders: HashSet<String> = HashSet::new();

        for effect in effects {
            if let Some(folder_id) = effect.folder_scope() {
                if failed_folders.contains(folder_id) {
                    continue;
                }
            }

            if let Err(e) = self.execute(order, &effect, &mut outcome).await {
                match effect.folder_scope() {
                    Some(folder_id) if contain_folder_failures => {
                        tracing::error!(
                            order_id = %order.id,
                            folder_id = %folder_id,
                            error = %e,
                            "Folder step failed, continuing with remaining folders"
                        );
                        failed_folders.insert(folder_id.to_string());
                        outcome.folder_failures.push(FolderFailure {
                            folder_id: folder_id.to_string(),
                            error: e.to_string(),
                        });
                    }
                    _ => {
                        tracing::error!(order_id = %order.id, error = %e, "Action pipeline aborted");
                        return Err(e);
                    }
                }
            }
        }

        Ok(outcome)
    }

    async fn execute(
        &self,
        order: &Order,
        effect: &Effect,
        outcome: &mut ActionOutcome,
    ) -> Result<()> {
        match effect {
            Effect::AcceptOrder { order_id } => self.client.accept_order(order_id).await,
            Effect::CreateTracking { order_id } => {
                let tracking = self.client.create_tracking(order_id).await?;
                outcome.tracking_id = Some(tracking.tracking_id);
                Ok(())
            }
            Effect::AttachTracking { order_id } => {
                let tracking_id = self.allocated_tracking(outcome)?;
                self.client.attach_tracking(order_id, &tracking_id).await
            }
            Effect::AssignFolder {
                order_id,
                folder_id,
                assignee_id,
                working_description,
                folder_index,
            } => {
                self.client
                    .assign_folder(
                        order_id,
                        folder_id,
                        assignee_id,
                        working_description,
                        *folder_index,
                    )
                    .await
            }
            Effect::AssignChecklist {
                folder_id,
                work_type,
            } => self.client.assign_checklist(folder_id, *work_type).await,
            Effect::MarkStep {
                folder_id,
                index,
                done,
            } => self.client.set_step(folder_id, *index, *done).await,
            Effect::RecordFolderStatus {
                order_id,
                folder_id,
                status,
            } => {
                self.client
                    .update_folder_status(order_id, folder_id, status)
                    .await
            }
            Effect::AssignSingleFolder { folder_id, user_id } => {
                self.client.assign_single_folder(folder_id, user_id).await
            }
            Effect::CompleteOrder { order_id } => self.client.complete_order(order_id).await,
            Effect::DeleteTracking { order_id } => self.client.delete_tracking(order_id).await,
            Effect::SoftDeleteOrder { order_id } => self.client.delete_order(order_id).await,
            Effect::ArchiveOrder { order_id } => self.client.archive_order(order_id).await,
            Effect::DeleteFullOrder { order_id } => self.client.delete_full_order(order_id).await,
            Effect::NotifyAccepted => {
                let tracking_id = self.allocated_tracking(outcome)?;
                let message = notify::acceptance_message(order, &tracking_id);
                self.deliver(order, message, outcome).await
            }
            Effect::NotifyCompleted => {
                let message = notify::completion_message(order);
                self.deliver(order, message, outcome).await
            }
        }
    }

    fn allocated_tracking(&self, outcome: &ActionOutcome) -> Result<String> {
        outcome
            .tracking_id
            .clone()
            .ok_or_else(|| anyhow!("tracking id was not allocated earlier in the pipeline"))
    }

    async fn deliver(
        &self,
        order: &Order,
        message: String,
        outcome: &mut ActionOutcome,
    ) -> Result<()> {
        let link = notify::wa_link(&order.sender.whatsapp, &message);
        self.notifier.send(&link).await?;
        outcome.notification_link = Some(link);
        Ok(())
    }

    fn begin(&self, action: &'static str, order_id: &str) -> Result<FlightGuard<'_>, AppError> {
        let key = (action, order_id.to_string());
        let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
        if !in_flight.insert(key.clone()) {
            return Err(AppError::ActionInFlight {
                action,
                order_id: order_id.to_string(),
            });
        }
        Ok(FlightGuard {
            set: &self.in_flight,
            key,
        })
    }
}

/// Releases the busy-guard entry on drop, also when the pipeline errors.
struct FlightGuard<'a> {
    set: &'a Mutex<HashSet<(&'static str, String)>>,
    key: (&'static str, String),
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use albumdesk_core::checklist::decode_step;
    use albumdesk_core::models::{Folder, OrderStatus, Sender};
    use albumdesk_core::process_types;
    use albumdesk_core::WorkType;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn folder(id: &str, tipe: &str, raw_checklist: &[&str]) -> Folder {
        Folder {
            id: id.to_string(),
            tipe: tipe.to_string(),
            ukuran: "20x30".to_string(),
            description: "album".to_string(),
            drive_link: None,
            current_status: None,
            assignee: None,
            assignee_name: None,
            kode_order: None,
            working_description: None,
            checklist: raw_checklist.iter().map(|s| decode_step(s)).collect(),
        }
    }

    fn order(status: OrderStatus, tracking: Option<&str>, folders: Vec<Folder>) -> Order {
        Order {
            id: "o1".to_string(),
            tracking_id: tracking.map(str::to_string),
            sender: Sender {
                name: "Budi".to_string(),
                whatsapp: "0812-345 678".to_string(),
            },
            folders,
            main_folder_id: None,
            upload_date: Utc::now(),
            status,
            estimated_finish: None,
            working_notes: None,
        }
    }

    fn orchestrator_for(server: &mockito::ServerGuard) -> Orchestrator {
        let client = ApiClient::new(server.url(), Duration::from_secs(5)).unwrap();
        Orchestrator::new(client)
    }

    fn folder_body(folder_id: &str) -> mockito::Matcher {
        mockito::Matcher::PartialJson(serde_json::json!({ "folderId": folder_id }))
    }

    #[tokio::test]
    async fn accept_happy_path_runs_the_full_pipeline() {
        let mut server = mockito::Server::new_async().await;
        let accept = server
            .mock("PATCH", "/order/accept")
            .with_status(200)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/tracking/create")
            .with_status(200)
            .with_body(serde_json::json!({ "trackingId": "TRK-1" }).to_string())
            .create_async()
            .await;
        let attach = server
            .mock("PATCH", "/order/tracking")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({ "_id": "o1", "trackingId": "TRK-1" }),
            ))
            .with_status(200)
            .create_async()
            .await;
        let kolase_template: Vec<&str> = process_types::steps_for(WorkType::Kolase).to_vec();
        let checklist = server
            .mock("PATCH", "/order/assign/checklist")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "folderId": "f1",
                "checklist": kolase_template
            })))
            .with_status(200)
            .create_async()
            .await;
        let first_step = server
            .mock("PATCH", "/order/checklist/done")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "folderId": "f1",
                "checklistIndex": 0
            })))
            .with_status(200)
            .create_async()
            .await;

        let order = order(OrderStatus::New, None, vec![folder("f1", "Kolase", &[])]);
        let orchestrator = orchestrator_for(&server);
        let outcome = orchestrator
            .accept(&order, vec![FolderAssignment::default()])
            .await
            .unwrap();

        accept.assert_async().await;
        create.assert_async().await;
        attach.assert_async().await;
        checklist.assert_async().await;
        first_step.assert_async().await;

        assert_eq!(outcome.tracking_id.as_deref(), Some("TRK-1"));
        assert!(outcome.folder_failures.is_empty());
        let link = outcome.notification_link.unwrap();
        assert!(link.starts_with("https://wa.me/62812345678?text="));
        assert!(link.contains("TRK-1"));
    }

    #[tokio::test]
    async fn accept_contains_per_folder_failures() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PATCH", "/order/accept")
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("POST", "/tracking/create")
            .with_status(200)
            .with_body(serde_json::json!({ "trackingId": "TRK-2" }).to_string())
            .create_async()
            .await;
        server
            .mock("PATCH", "/order/tracking")
            .with_status(200)
            .create_async()
            .await;
        let checklist_f1 = server
            .mock("PATCH", "/order/assign/checklist")
            .match_body(folder_body("f1"))
            .with_status(200)
            .create_async()
            .await;
        let checklist_f2 = server
            .mock("PATCH", "/order/assign/checklist")
            .match_body(folder_body("f2"))
            .with_status(500)
            .with_body("checklist store down")
            .create_async()
            .await;
        let step_f1 = server
            .mock("PATCH", "/order/checklist/done")
            .match_body(folder_body("f1"))
            .with_status(200)
            .create_async()
            .await;
        let step_f2 = server
            .mock("PATCH", "/order/checklist/done")
            .match_body(folder_body("f2"))
            .expect(0)
            .create_async()
            .await;

        let order = order(
            OrderStatus::New,
            None,
            vec![folder("f1", "Kolase", &[]), folder("f2", "Magazine", &[])],
        );
        let orchestrator = orchestrator_for(&server);
        let outcome = orchestrator
            .accept(
                &order,
                vec![FolderAssignment::default(), FolderAssignment::default()],
            )
            .await
            .unwrap();

        checklist_f1.assert_async().await;
        checklist_f2.assert_async().await;
        step_f1.assert_async().await;
        // failed folder's remaining sub-steps are skipped
        step_f2.assert_async().await;

        assert_eq!(outcome.folder_failures.len(), 1);
        assert_eq!(outcome.folder_failures[0].folder_id, "f2");
        // pipeline still reached the notification: no rollback of acceptance
        assert!(outcome.notification_link.is_some());
    }

    #[tokio::test]
    async fn accept_aborts_when_tracking_allocation_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PATCH", "/order/accept")
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("POST", "/tracking/create")
            .with_status(503)
            .with_body("tracking service down")
            .create_async()
            .await;
        let checklist = server
            .mock("PATCH", "/order/assign/checklist")
            .expect(0)
            .create_async()
            .await;

        let order = order(OrderStatus::New, None, vec![folder("f1", "Kolase", &[])]);
        let orchestrator = orchestrator_for(&server);
        let err = orchestrator
            .accept(&order, vec![FolderAssignment::default()])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("503"));
        checklist.assert_async().await;
    }

    #[tokio::test]
    async fn reject_deletes_tracking_and_full_order() {
        let mut server = mockito::Server::new_async().await;
        let tracking = server
            .mock("POST", "/tracking/delete")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({ "_id": "o1" }),
            ))
            .with_status(200)
            .create_async()
            .await;
        let delete = server
            .mock("POST", "/order/delete/fullorder")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({ "_id": "o1" }),
            ))
            .with_status(200)
            .create_async()
            .await;

        let order = order(OrderStatus::OnProcess, Some("TRK-1"), vec![]);
        let orchestrator = orchestrator_for(&server);
        orchestrator.reject(&order).await.unwrap();

        tracking.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn finish_archives_in_order() {
        let mut server = mockito::Server::new_async().await;
        let tracking = server
            .mock("POST", "/tracking/delete")
            .with_status(200)
            .create_async()
            .await;
        let soft_delete = server
            .mock("POST", "/order/delete")
            .with_status(200)
            .create_async()
            .await;
        let history = server
            .mock("PATCH", "/order/history")
            .with_status(200)
            .create_async()
            .await;

        let order = order(OrderStatus::Complete, Some("TRK-1"), vec![]);
        orchestrator_for(&server).finish(&order).await.unwrap();

        tracking.assert_async().await;
        soft_delete.assert_async().await;
        history.assert_async().await;
    }

    #[tokio::test]
    async fn confirm_steps_toggles_then_records_status() {
        let mut server = mockito::Server::new_async().await;
        let done = server
            .mock("PATCH", "/order/checklist/done")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "folderId": "f1",
                "checklistIndex": 1
            })))
            .with_status(200)
            .create_async()
            .await;
        let status = server
            .mock("PATCH", "/order/folder/updatestatus")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "orderId": "o1",
                "folderId": "f1",
                "status": "Bojes - Grafir"
            })))
            .with_status(200)
            .create_async()
            .await;

        let order = order(
            OrderStatus::OnProcess,
            Some("TRK-1"),
            vec![folder(
                "f1",
                "Flash Disk",
                &["Admin - Terima (done)", "Bojes - Grafir", "Bojes - Selesai"],
            )],
        );
        orchestrator_for(&server)
            .confirm_steps(
                &order,
                "f1",
                vec![StepToggle {
                    index: 1,
                    done: true,
                }],
                None,
            )
            .await
            .unwrap();

        done.assert_async().await;
        status.assert_async().await;
    }

    #[tokio::test]
    async fn refused_transition_never_reaches_the_backend() {
        let mut server = mockito::Server::new_async().await;
        let accept = server
            .mock("PATCH", "/order/accept")
            .expect(0)
            .create_async()
            .await;

        let order = order(OrderStatus::OnProcess, Some("TRK-1"), vec![]);
        let err = orchestrator_for(&server)
            .accept(&order, vec![])
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::InvalidTransition { .. })
        ));
        accept.assert_async().await;
    }

    #[tokio::test]
    async fn ensure_checklists_backfills_only_empty_folders() {
        let mut server = mockito::Server::new_async().await;
        let backfill = server
            .mock("PATCH", "/order/assign/checklist")
            .match_body(folder_body("f-empty"))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let assignments = vec![
            Assignment {
                order: summary("o1"),
                folder: folder("f-empty", "Kolase", &[]),
            },
            Assignment {
                order: summary("o2"),
                folder: folder("f-full", "Kolase", &["Admin - Terima (done)"]),
            },
        ];
        let assigned = orchestrator_for(&server)
            .ensure_checklists(&assignments)
            .await
            .unwrap();

        assert_eq!(assigned, 1);
        backfill.assert_async().await;
    }

    fn summary(id: &str) -> albumdesk_core::models::OrderSummary {
        albumdesk_core::models::OrderSummary {
            id: id.to_string(),
            tracking_id: None,
            sender: Sender {
                name: "Budi".to_string(),
                whatsapp: "0812".to_string(),
            },
            upload_date: Utc::now(),
            estimated_finish: None,
        }
    }

    /// Notifier that parks until released, keeping its pipeline in flight.
    struct ParkedNotifier {
        release: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl Notifier for ParkedNotifier {
        async fn send(&self, _link: &str) -> Result<()> {
            let rx = self.release.lock().unwrap().take();
            if let Some(rx) = rx {
                let _ = rx.await;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn busy_guard_rejects_concurrent_invocation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PATCH", "/order/complete")
            .with_status(200)
            .expect(2)
            .create_async()
            .await;

        let (release_tx, release_rx) = oneshot::channel();
        let client = ApiClient::new(server.url(), Duration::from_secs(5)).unwrap();
        let orchestrator = Arc::new(Orchestrator::with_notifier(
            client,
            Arc::new(ParkedNotifier {
                release: Mutex::new(Some(release_rx)),
            }),
        ));

        let order = Arc::new(order(OrderStatus::OnProcess, Some("TRK-1"), vec![]));
        let first = {
            let orchestrator = Arc::clone(&orchestrator);
            let order = Arc::clone(&order);
            tokio::spawn(async move { orchestrator.complete(&order, false).await })
        };

        // Wait for the first pipeline to reach the parked notifier.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = orchestrator.complete(&order, false).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::ActionInFlight { .. })
        ));

        release_tx.send(()).unwrap();
        first.await.unwrap().unwrap();

        // Guard released: the same action can run again.
        orchestrator.complete(&order, false).await.unwrap();
    }
}
