//! Audit repository provisioning: request validation, branch resolution and
//! the create → clone → resolve → push workflow with rollback.

pub mod events;
pub mod orchestrator;
pub mod request;
pub mod resolver;

pub use events::{
    EventLevel, LogObserver, ProvisionEvent, ProvisionObserver, ProvisionState, RecordingObserver,
};
pub use orchestrator::{ProvisionOutcome, Provisioner};
pub use request::{ProvisioningRequest, SourceRepository};
pub use resolver::{BranchPrompter, BranchResolver, SelectionStrategy};

/// Branch the audit repository is published on.
pub const MAIN_BRANCH_NAME: &str = "main";
