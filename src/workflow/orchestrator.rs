use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use opentelemetry::KeyValue;

use super::manual::strip_manual_blocks;
use super::stage::{ArtifactKey, Stage};
use super::workspace::Workspace;
use crate::archive;
use crate::config::{Config, DEFAULT_LINK_HOURS};
use crate::error::{PaperError, PaperResult};
use crate::render::{DocumentCompiler, PandocCompiler, RenderOptions};
use crate::report::{MARKDOWN_FILE, Report, SaveOptions};
use crate::storage::{AzureBlobStore, BlobGateway};
use crate::telemetry::metrics::{WORKFLOW_DURATION, WORKFLOW_RUNS};

/// Moves reports through draft, submitted, final and sent in the blob
/// store.
pub struct Workflow {
    gateway: BlobGateway,
    compiler: Arc<dyn DocumentCompiler>,
    link_hours: u32,
    allow_draft_finalize: bool,
}

impl Workflow {
    pub fn new(gateway: BlobGateway, compiler: Arc<dyn DocumentCompiler>) -> Self {
        Self {
            gateway,
            compiler,
            link_hours: DEFAULT_LINK_HOURS,
            allow_draft_finalize: true,
        }
    }

    /// Azure store and pandoc, both configured from the environment.
    pub fn from_config(config: &Config) -> PaperResult<Self> {
        let store = AzureBlobStore::from_config(config)?;
        let compiler = PandocCompiler::locate(config)?;
        Ok(Self::new(BlobGateway::new(Arc::new(store)), Arc::new(compiler))
            .with_link_hours(config.link_hours)
            .with_draft_finalize(config.allow_draft_finalize))
    }

    pub fn with_link_hours(mut self, hours: u32) -> Self {
        self.link_hours = hours;
        self
    }

    /// Whether `generate_final` may fall back to an unreviewed draft.
    pub fn with_draft_finalize(mut self, allow: bool) -> Self {
        self.allow_draft_finalize = allow;
        self
    }

    pub fn gateway(&self) -> &BlobGateway {
        &self.gateway
    }

    /// Builds a report in the workspace, zips its scratch directory and
    /// uploads it as a new draft. Returns a signed link to the archive.
    #[tracing::instrument(name = "workflow draft", skip(self, workspace, build))]
    pub async fn generate_draft<F>(
        &self,
        workspace: &Workspace,
        batch: &str,
        name: &str,
        build: F,
    ) -> PaperResult<String>
    where
        F: FnOnce(&Path) -> PaperResult<Report>,
    {
        let start = Instant::now();
        let result = self.draft(workspace, batch, name, build).await;
        record_step("draft", start, &result);
        result
    }

    async fn draft<F>(
        &self,
        workspace: &Workspace,
        batch: &str,
        name: &str,
        build: F,
    ) -> PaperResult<String>
    where
        F: FnOnce(&Path) -> PaperResult<Report>,
    {
        let scratch = workspace.reset_scratch()?;
        let archive_path = workspace.archive_path(name);
        if archive_path.exists() {
            std::fs::remove_file(&archive_path)?;
        }

        let report = build(&scratch)?;
        let options = SaveOptions {
            filename: Some(format!("{name}.pdf")),
            generate_markdown: true,
            generate_pdf: false,
            zip_to: Some(archive_path.clone()),
            ..Default::default()
        };
        report.save(&options, self.compiler.as_ref()).await?;

        let content = std::fs::read(&archive_path)?;
        let key = ArtifactKey::new(Stage::Draft, batch, name).to_string();
        let link = self
            .gateway
            .upload_and_link(&key, content, self.link_hours, false)
            .await?;
        std::fs::remove_file(&archive_path)?;

        tracing::info!(key = %key, "draft uploaded");
        Ok(link)
    }

    /// Stores a reviewed scratch archive as the submitted version of an
    /// existing draft.
    #[tracing::instrument(name = "workflow submit", skip(self, archive), fields(archive.size = archive.len()))]
    pub async fn submit(&self, batch: &str, name: &str, archive: Vec<u8>) -> PaperResult<String> {
        let start = Instant::now();
        let result: PaperResult<String> = async {
            let draft = ArtifactKey::new(Stage::Draft, batch, name);
            if !self.gateway.exists(&draft.to_string()).await? {
                return Err(PaperError::ArtifactNotFound(draft.to_string()));
            }
            let key = draft.at(Stage::Draft.transition(Stage::Submitted)?).to_string();
            self.gateway
                .upload_and_link(&key, archive, self.link_hours, true)
                .await
        }
        .await;
        record_step("submit", start, &result);
        result
    }

    /// Renders the submitted archive (or the draft, when allowed) without
    /// its manual blocks and uploads the PDF as the final version.
    #[tracing::instrument(name = "workflow final", skip(self, workspace), fields(workflow.source = tracing::field::Empty))]
    pub async fn generate_final(
        &self,
        workspace: &Workspace,
        batch: &str,
        name: &str,
    ) -> PaperResult<String> {
        let start = Instant::now();
        let result = self.finalize(workspace, batch, name).await;
        record_step("final", start, &result);
        result
    }

    async fn finalize(&self, workspace: &Workspace, batch: &str, name: &str) -> PaperResult<String> {
        let submitted = ArtifactKey::new(Stage::Submitted, batch, name);
        let source = if self.gateway.exists(&submitted.to_string()).await? {
            submitted
        } else {
            let draft = submitted.at(Stage::Draft);
            if !self.allow_draft_finalize || !self.gateway.exists(&draft.to_string()).await? {
                return Err(PaperError::ArtifactNotFound(name.to_string()));
            }
            tracing::warn!(key = %draft, "no submitted version, finalizing the unreviewed draft");
            draft
        };
        let target = source.at(source.stage.transition(Stage::Final)?);
        tracing::Span::current().record("workflow.source", source.stage.as_str());

        let content = self.gateway.download(&source.to_string(), None).await?;
        let scratch = workspace.reset_scratch()?;
        archive::unzip_into(&content, &scratch)?;

        let markdown_path = scratch.join(MARKDOWN_FILE);
        let markdown = std::fs::read_to_string(&markdown_path)
            .map_err(|_| PaperError::MissingMarkdown(markdown_path.display().to_string()))?;
        std::fs::write(&markdown_path, strip_manual_blocks(&markdown))?;

        let filename = format!("{name}.pdf");
        let report = Report::load(&scratch)?;
        let options = SaveOptions {
            filename: Some(filename.clone()),
            render: RenderOptions {
                header_footer_first: true,
                ..Default::default()
            },
            return_bytes: true,
            generate_markdown: false,
            generate_pdf: true,
            ..Default::default()
        };
        let pdf = report
            .save(&options, self.compiler.as_ref())
            .await?
            .ok_or(PaperError::NothingToReturn)?;

        let key = target.to_string();
        let link = self
            .gateway
            .upload_and_link(&key, pdf, self.link_hours, true)
            .await?;
        std::fs::remove_file(scratch.join(&filename))?;

        tracing::info!(key = %key, "final uploaded");
        Ok(link)
    }

    /// Copies the final PDF to the sent stage.
    #[tracing::instrument(name = "workflow send", skip(self))]
    pub async fn mark_sent(&self, batch: &str, name: &str) -> PaperResult<String> {
        let start = Instant::now();
        let result: PaperResult<String> = async {
            let final_key = ArtifactKey::new(Stage::Final, batch, name);
            if !self.gateway.exists(&final_key.to_string()).await? {
                return Err(PaperError::ArtifactNotFound(final_key.to_string()));
            }
            let sent = final_key.at(Stage::Final.transition(Stage::Sent)?);
            let pdf = self.gateway.download(&final_key.to_string(), None).await?;
            self.gateway
                .upload_and_link(&sent.to_string(), pdf, self.link_hours, true)
                .await
        }
        .await;
        record_step("send", start, &result);
        result
    }

    /// Most advanced stage holding an artifact for this report.
    #[tracing::instrument(name = "workflow status", skip(self))]
    pub async fn current_stage(&self, batch: &str, name: &str) -> PaperResult<Option<Stage>> {
        let key = ArtifactKey::new(Stage::Draft, batch, name);
        for stage in Stage::ALL.into_iter().rev() {
            if self.gateway.exists(&key.at(stage).to_string()).await? {
                return Ok(Some(stage));
            }
        }
        Ok(None)
    }

    /// Deletes every artifact of `batch` at `stage`; returns the count.
    /// Nested batches and blobs that are not artifacts are left alone.
    #[tracing::instrument(name = "workflow prune", skip(self))]
    pub async fn prune(&self, stage: Stage, batch: &str) -> PaperResult<usize> {
        let prefix = ArtifactKey::batch_prefix(stage, batch);
        let mut deleted = 0;
        for blob in self.gateway.list(Some(prefix.as_str())).await? {
            match ArtifactKey::parse(&blob.name) {
                Ok(key) if key.stage == stage && key.batch == batch => {
                    self.gateway.delete(&blob.name).await?;
                    deleted += 1;
                }
                _ => tracing::debug!(key = %blob.name, "not an artifact of this batch, kept"),
            }
        }
        Ok(deleted)
    }
}

fn record_step<T>(step: &'static str, start: Instant, result: &PaperResult<T>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(err) => err.kind(),
    };
    let attrs = [
        KeyValue::new("workflow.step", step),
        KeyValue::new("workflow.outcome", outcome),
    ];
    WORKFLOW_RUNS.add(1, &attrs);
    WORKFLOW_DURATION.record(start.elapsed().as_secs_f64(), &attrs);
    if let Err(err) = result {
        tracing::error!(step, error = %err, "workflow step failed");
    }
}
