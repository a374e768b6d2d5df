//! Markdown reports rendered to PDF through pandoc, with a staged review
//! workflow (draft, submitted, final, sent) kept in Azure Blob Storage.
//!
//! ```no_run
//! use paperdash::{Config, Workflow, Workspace, init_telemetry};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let telemetry = init_telemetry(&config)?;
//! let workflow = Workflow::from_config(&config)?;
//! let workspace = Workspace::temporary()?;
//!
//! let link = workflow
//!     .generate_draft(&workspace, "2024-w01", "weekly", |scratch| {
//!         let mut report = paperdash::Report::new(scratch)?;
//!         report.add_text("Weekly", "title1")?;
//!         Ok(report)
//!     })
//!     .await?;
//! println!("{link}");
//! telemetry.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod render;
pub mod report;
pub mod storage;
pub mod telemetry;
pub mod theme;
pub mod workflow;

pub use config::Config;
pub use error::{PaperError, PaperResult};
pub use render::{DocumentCompiler, PandocCompiler, RenderOptions};
pub use report::{Figure, ImageFile, PngBytes, Report, SaveOptions, Table, TextStyle};
pub use storage::{AzureBlobStore, BlobGateway, BlobInfo, BlobStore, MemoryBlobStore};
pub use telemetry::{TelemetryGuard, init_telemetry};
pub use theme::Theme;
pub use workflow::{ArtifactKey, Stage, Workflow, Workspace};
