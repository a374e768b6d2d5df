use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::LazyLock;

pub static METER: LazyLock<Meter> = LazyLock::new(|| global::meter("paperdash"));

// --- Blob gateway ---

pub static BLOB_OPERATIONS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("blob.operations")
        .with_description("Number of remote blob operations")
        .with_unit("{operation}")
        .build()
});

pub static BLOB_OPERATION_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("blob.operation.duration")
        .with_description("Duration of remote blob operations in seconds")
        .with_unit("s")
        .build()
});

pub static BLOB_BYTES: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("blob.transfer.bytes")
        .with_description("Bytes uploaded to or downloaded from the blob store")
        .with_unit("By")
        .build()
});

pub static BLOB_ERROR_COUNT: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("blob.error.count")
        .with_description("Number of failed remote blob operations")
        .with_unit("{error}")
        .build()
});

// --- Rendering ---

pub static RENDER_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("report.render.duration")
        .with_description("Duration of the external document compiler in seconds")
        .with_unit("s")
        .build()
});

// --- Workflow ---

pub static WORKFLOW_RUNS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("workflow.runs")
        .with_description("Number of report lifecycle transitions attempted")
        .with_unit("{run}")
        .build()
});

pub static WORKFLOW_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("workflow.duration")
        .with_description("Duration of report lifecycle transitions in seconds")
        .with_unit("s")
        .build()
});
