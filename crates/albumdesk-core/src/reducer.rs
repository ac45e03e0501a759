//! Folder/order status reducer
//!
//! Pure state machine over [`OrderStatus`]. Given an order and an action it
//! computes the next state and the ordered list of backend [`Effect`]s that
//! must fire; it performs no I/O itself. The orchestrator in
//! `albumdesk-sync` interprets the effect list, so every sequencing rule
//! (tracking id before attachment, notification last) is decided here, in
//! one testable place.
//!
//! Transition table:
//!
//! | action       | precondition                       | next            |
//! |--------------|------------------------------------|-----------------|
//! | accept       | status = new                       | on-process      |
//! | assign       | status != history                  | unchanged       |
//! | mark-steps   | folder has a checklist             | unchanged       |
//! | complete     | status = on-process, or forced     | complete        |
//! | finish       | status = complete                  | history         |
//! | reject       | status in {new,on-process,complete}| deleted         |

use crate::checklist;
use crate::error::AppError;
use crate::models::{Order, OrderStatus, WorkType};

/// One backend call the orchestrator must issue. Effects are ordered; later
/// effects may depend on identifiers produced by earlier ones (the tracking
/// id from `CreateTracking` feeds `AttachTracking` and the notification).
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// PATCH /order/accept
    AcceptOrder { order_id: String },
    /// POST /tracking/create; yields the tracking id for the rest of the
    /// pipeline.
    CreateTracking { order_id: String },
    /// PATCH /order/tracking with the id produced by `CreateTracking`.
    AttachTracking { order_id: String },
    /// PATCH /order/folder/assign
    AssignFolder {
        order_id: String,
        folder_id: String,
        assignee_id: String,
        working_description: String,
        folder_index: usize,
    },
    /// PATCH /order/assign/checklist with the template for `work_type`.
    AssignChecklist {
        folder_id: String,
        work_type: WorkType,
    },
    /// PATCH /order/checklist/done or /undone
    MarkStep {
        folder_id: String,
        index: usize,
        done: bool,
    },
    /// PATCH /order/folder/updatestatus with the derived current step.
    RecordFolderStatus {
        order_id: String,
        folder_id: String,
        status: String,
    },
    /// PATCH /order/assign/singlefolder (worker-initiated path)
    AssignSingleFolder { folder_id: String, user_id: String },
    /// PATCH /order/complete
    CompleteOrder { order_id: String },
    /// POST /tracking/delete
    DeleteTracking { order_id: String },
    /// POST /order/delete (soft)
    SoftDeleteOrder { order_id: String },
    /// PATCH /order/history
    ArchiveOrder { order_id: String },
    /// POST /order/delete/fullorder
    DeleteFullOrder { order_id: String },
    /// WhatsApp acceptance message; must run last, after persistence.
    NotifyAccepted,
    /// WhatsApp completion message; must run last, after persistence.
    NotifyCompleted,
}

impl Effect {
    /// Folder this effect belongs to, when it is a per-folder sub-step.
    /// Per-folder failures are contained to their folder; effects without a
    /// folder scope abort the whole pipeline on failure.
    pub fn folder_scope(&self) -> Option<&str> {
        match self {
            Effect::AssignFolder { folder_id, .. }
            | Effect::AssignChecklist { folder_id, .. }
            | Effect::MarkStep { folder_id, .. }
            | Effect::RecordFolderStatus { folder_id, .. }
            | Effect::AssignSingleFolder { folder_id, .. } => Some(folder_id),
            _ => None,
        }
    }
}

/// Per-folder input to the accept action, aligned by folder index. A folder
/// without a chosen worker still gets its checklist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderAssignment {
    pub assignee_id: Option<String>,
    pub working_description: String,
}

/// One done/undone toggle within a folder's checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepToggle {
    pub index: usize,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderAction {
    /// Admin accepts a new order, optionally assigning workers per folder.
    Accept { assignments: Vec<FolderAssignment> },
    /// Admin assigns one folder to a worker.
    AssignFolder {
        folder_id: String,
        assignee_id: String,
        working_description: String,
    },
    /// Toggle one or more checklist steps, then record the derived current
    /// step; optionally hand the folder to another worker afterwards.
    MarkSteps {
        folder_id: String,
        toggles: Vec<StepToggle>,
        assign_to: Option<String>,
    },
    /// Flip the order to complete. `forced` lets an admin complete
    /// regardless of checklist state.
    Complete { forced: bool },
    /// Archive a completed order.
    Finish,
    /// Delete the order and its folders entirely.
    Reject,
}

impl OrderAction {
    pub fn name(&self) -> &'static str {
        match self {
            OrderAction::Accept { .. } => "accept",
            OrderAction::AssignFolder { .. } => "assign-folder",
            OrderAction::MarkSteps { .. } => "mark-steps",
            OrderAction::Complete { .. } => "complete",
            OrderAction::Finish => "finish",
            OrderAction::Reject => "reject",
        }
    }
}

/// Where the order ends up after the effects commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextState {
    Status(OrderStatus),
    Unchanged,
    /// Order (and tracking record) cease to exist.
    Deleted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: NextState,
    pub effects: Vec<Effect>,
}

/// Compute the transition for `action` against the current `order`, or
/// refuse it. Refusals are the reducer's own guards, independent of
/// transport: accepting a non-new order (double acceptance), finishing an
/// order that is not complete, touching a folder without a checklist.
pub fn apply(order: &Order, action: &OrderAction) -> Result<Transition, AppError> {
    match action {
        OrderAction::Accept { assignments } => accept(order, assignments),
        OrderAction::AssignFolder {
            folder_id,
            assignee_id,
            working_description,
        } => assign_folder(order, folder_id, assignee_id, working_description),
        OrderAction::MarkSteps {
            folder_id,
            toggles,
            assign_to,
        } => mark_steps(order, folder_id, toggles, assign_to.as_deref()),
        OrderAction::Complete { forced } => complete(order, *forced),
        OrderAction::Finish => finish(order),
        OrderAction::Reject => reject(order),
    }
}

fn refuse(order: &Order, action: &'static str) -> AppError {
    AppError::InvalidTransition {
        from: order.status,
        action,
    }
}

fn accept(order: &Order, assignments: &[FolderAssignment]) -> Result<Transition, AppError> {
    if order.status != OrderStatus::New {
        return Err(refuse(order, "accept"));
    }

    let mut effects = vec![
        Effect::AcceptOrder {
            order_id: order.id.clone(),
        },
        Effect::CreateTracking {
            order_id: order.id.clone(),
        },
        Effect::AttachTracking {
            order_id: order.id.clone(),
        },
    ];

    for (index, folder) in order.folders.iter().enumerate() {
        let assignment = assignments.get(index);
        if let Some(assignee_id) = assignment.and_then(|a| a.assignee_id.as_deref()) {
            effects.push(Effect::AssignFolder {
                order_id: order.id.clone(),
                folder_id: folder.id.clone(),
                assignee_id: assignee_id.to_string(),
                working_description: assignment
                    .map(|a| a.working_description.clone())
                    .unwrap_or_default(),
                folder_index: index,
            });
        }
        effects.push(Effect::AssignChecklist {
            folder_id: folder.id.clone(),
            work_type: folder.work_type(),
        });
        // Every template starts with "Admin - Terima"; acceptance completes it.
        effects.push(Effect::MarkStep {
            folder_id: folder.id.clone(),
            index: 0,
            done: true,
        });
    }

    effects.push(Effect::NotifyAccepted);

    Ok(Transition {
        next: NextState::Status(OrderStatus::OnProcess),
        effects,
    })
}

fn assign_folder(
    order: &Order,
    folder_id: &str,
    assignee_id: &str,
    working_description: &str,
) -> Result<Transition, AppError> {
    if order.status == OrderStatus::History {
        return Err(refuse(order, "assign-folder"));
    }
    let folder_index = order
        .folder_index(folder_id)
        .ok_or_else(|| AppError::NotFound(format!("folder {}", folder_id)))?;

    Ok(Transition {
        next: NextState::Unchanged,
        effects: vec![Effect::AssignFolder {
            order_id: order.id.clone(),
            folder_id: folder_id.to_string(),
            assignee_id: assignee_id.to_string(),
            working_description: working_description.to_string(),
            folder_index,
        }],
    })
}

fn mark_steps(
    order: &Order,
    folder_id: &str,
    toggles: &[StepToggle],
    assign_to: Option<&str>,
) -> Result<Transition, AppError> {
    let folder = order
        .folder(folder_id)
        .ok_or_else(|| AppError::NotFound(format!("folder {}", folder_id)))?;
    if !folder.has_checklist() {
        return Err(AppError::InvalidInput(format!(
            "folder {} has no checklist assigned",
            folder_id
        )));
    }

    // Validate all indices and derive the resulting current step before
    // emitting anything, so a bad toggle refuses the whole batch.
    let mut steps = folder.checklist.clone();
    for toggle in toggles {
        checklist::set_done(&mut steps, toggle.index, toggle.done)?;
    }

    let mut effects: Vec<Effect> = toggles
        .iter()
        .map(|toggle| Effect::MarkStep {
            folder_id: folder_id.to_string(),
            index: toggle.index,
            done: toggle.done,
        })
        .collect();

    if let Some(status) = checklist::current_step(&steps) {
        effects.push(Effect::RecordFolderStatus {
            order_id: order.id.clone(),
            folder_id: folder_id.to_string(),
            status: status.to_string(),
        });
    }

    if let Some(user_id) = assign_to {
        effects.push(Effect::AssignSingleFolder {
            folder_id: folder_id.to_string(),
            user_id: user_id.to_string(),
        });
    }

    Ok(Transition {
        next: NextState::Unchanged,
        effects,
    })
}

fn complete(order: &Order, forced: bool) -> Result<Transition, AppError> {
    let allowed = match order.status {
        OrderStatus::OnProcess => true,
        OrderStatus::New => forced,
        OrderStatus::Complete | OrderStatus::History => false,
    };
    if !allowed {
        return Err(refuse(order, "complete"));
    }

    Ok(Transition {
        next: NextState::Status(OrderStatus::Complete),
        effects: vec![
            Effect::CompleteOrder {
                order_id: order.id.clone(),
            },
            Effect::NotifyCompleted,
        ],
    })
}

fn finish(order: &Order) -> Result<Transition, AppError> {
    if order.status != OrderStatus::Complete {
        return Err(refuse(order, "finish"));
    }

    Ok(Transition {
        next: NextState::Status(OrderStatus::History),
        effects: vec![
            Effect::DeleteTracking {
                order_id: order.id.clone(),
            },
            Effect::SoftDeleteOrder {
                order_id: order.id.clone(),
            },
            Effect::ArchiveOrder {
                order_id: order.id.clone(),
            },
        ],
    })
}

fn reject(order: &Order) -> Result<Transition, AppError> {
    if order.status == OrderStatus::History {
        return Err(refuse(order, "reject"));
    }

    let mut effects = Vec::new();
    if order.tracking_id.is_some() {
        effects.push(Effect::DeleteTracking {
            order_id: order.id.clone(),
        });
    }
    effects.push(Effect::DeleteFullOrder {
        order_id: order.id.clone(),
    });

    Ok(Transition {
        next: NextState::Deleted,
        effects,
    })
}
