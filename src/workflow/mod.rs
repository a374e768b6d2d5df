//! Report lifecycle in the blob store: `draft -> submitted -> final -> sent`.

pub mod manual;
pub mod orchestrator;
pub mod stage;
pub mod workspace;

pub use manual::{MANUAL_END, MANUAL_START, strip_manual_blocks};
pub use orchestrator::Workflow;
pub use stage::{ArtifactKey, ArtifactKind, Stage, TRANSITIONS};
pub use workspace::Workspace;
