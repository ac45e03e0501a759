//! Data models for the application
//!
//! Wire records mirror the backend's JSON exactly (`_id`, `trackingId`,
//! `stepChecklist` strings with the done marker); domain types are the
//! decoded forms the rest of the workspace operates on. The same canonical
//! `Order`/`Folder` pair backs every view; the worker view's flattened
//! order+folder shape is the [`Assignment`] projection.

mod assignment;
mod folder;
mod order;
mod user;

pub use assignment::*;
pub use folder::*;
pub use order::*;
pub use user::*;
