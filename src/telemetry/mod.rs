pub mod init;
pub mod metrics;

pub use init::{TelemetryGuard, init_telemetry};
pub use metrics::{
    BLOB_BYTES, BLOB_ERROR_COUNT, BLOB_OPERATION_DURATION, BLOB_OPERATIONS, RENDER_DURATION,
    WORKFLOW_DURATION, WORKFLOW_RUNS,
};
