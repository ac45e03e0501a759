//! Albumdesk synchronization layer
//!
//! Two halves: the [`poller::Poller`] keeps a snapshot of the backend's
//! order/user lists fresh without a push channel, and the
//! [`orchestrator::Orchestrator`] turns reducer transitions into ordered
//! backend calls with busy guards and partial-failure handling.

pub mod orchestrator;
pub mod poller;

pub use orchestrator::{ActionOutcome, FolderFailure, LinkNotifier, Notifier, Orchestrator};
pub use poller::{OrderSource, Poller, Snapshot};
