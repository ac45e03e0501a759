//! Albumdesk Core Library
//!
//! This crate provides the domain models, order lifecycle state machine,
//! checklist codec, and view derivation logic shared across all Albumdesk
//! components. Everything here is pure: network calls live in
//! `albumdesk-api-client`, scheduling in `albumdesk-sync`.

pub mod checklist;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod process_types;
pub mod reducer;
pub mod view;

// Re-export commonly used types
pub use checklist::ChecklistStep;
pub use config::Config;
pub use error::AppError;
pub use models::{Assignment, Folder, Order, OrderStatus, Sender, WorkType, Worker};
pub use reducer::{Effect, FolderAssignment, NextState, OrderAction, StepToggle, Transition};
