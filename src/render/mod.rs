pub mod pandoc;

use std::path::{Path, PathBuf};
use std::time::Instant;

use opentelemetry::KeyValue;

use crate::error::{PaperError, PaperResult};
use crate::telemetry::metrics::RENDER_DURATION;
use crate::theme::Theme;

pub use pandoc::PandocCompiler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub toc: bool,
    pub cover: bool,
    pub header_footer: bool,
    /// Also draw the header/footer on the first page.
    pub header_footer_first: bool,
    pub chapter_break: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            toc: false,
            cover: false,
            header_footer: true,
            header_footer_first: false,
            chapter_break: false,
        }
    }
}

/// Everything a compiler needs to turn `report.md` in `scratch` into `output`.
#[derive(Debug)]
pub struct CompileJob<'a> {
    pub scratch: &'a Path,
    pub theme: &'static Theme,
    pub options: &'a RenderOptions,
    /// File name relative to `scratch`.
    pub output: &'a str,
}

#[async_trait::async_trait]
pub trait DocumentCompiler: Send + Sync {
    async fn compile(&self, job: &CompileJob<'_>) -> PaperResult<()>;
    fn name(&self) -> &str;
}

/// Renders the scratch directory's `report.md` to `scratch/output` and
/// returns the path of the produced file.
#[tracing::instrument(
    name = "render pdf",
    skip(compiler, theme),
    fields(
        render.compiler = compiler.name(),
        render.theme = theme.name,
        render.duration_ms = tracing::field::Empty,
    )
)]
pub async fn render_pdf(
    scratch: &Path,
    theme: &'static Theme,
    options: &RenderOptions,
    output: &str,
    compiler: &dyn DocumentCompiler,
) -> PaperResult<PathBuf> {
    if options.cover {
        return Err(PaperError::NotImplemented("cover page".to_string()));
    }

    let target = scratch.join(output);
    if target.exists() {
        std::fs::remove_file(&target)?;
    }

    let start = Instant::now();
    let job = CompileJob {
        scratch,
        theme,
        options,
        output,
    };
    let result = compiler.compile(&job).await;
    let duration = start.elapsed();

    RENDER_DURATION.record(
        duration.as_secs_f64(),
        &[
            KeyValue::new("render.compiler", compiler.name().to_string()),
            KeyValue::new("render.success", result.is_ok()),
        ],
    );
    tracing::Span::current().record("render.duration_ms", duration.as_millis() as u64);
    result?;

    if !target.exists() {
        return Err(PaperError::Render(format!(
            "{} finished without producing {output}",
            compiler.name()
        )));
    }
    Ok(target)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    pub const FAKE_PDF: &[u8] = b"%PDF-1.4 fake";

    /// Writes a fixed PDF and remembers what it was asked to compile.
    #[derive(Default)]
    pub struct FakeCompiler {
        pub markdown_seen: Mutex<Vec<String>>,
        pub options_seen: Mutex<Vec<RenderOptions>>,
    }

    #[async_trait::async_trait]
    impl DocumentCompiler for FakeCompiler {
        async fn compile(&self, job: &CompileJob<'_>) -> PaperResult<()> {
            let markdown =
                std::fs::read_to_string(job.scratch.join(crate::report::MARKDOWN_FILE))?;
            self.markdown_seen.lock().unwrap().push(markdown);
            self.options_seen.lock().unwrap().push(*job.options);
            std::fs::write(job.scratch.join(job.output), FAKE_PDF)?;
            Ok(())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    /// Exits cleanly without writing anything.
    pub struct SilentCompiler;

    #[async_trait::async_trait]
    impl DocumentCompiler for SilentCompiler {
        async fn compile(&self, _job: &CompileJob<'_>) -> PaperResult<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "silent"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FAKE_PDF, FakeCompiler, SilentCompiler};
    use super::*;
    use crate::theme;

    fn scratch_with_markdown() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.md"), "# Title\n\n").unwrap();
        dir
    }

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert!(!options.toc);
        assert!(!options.cover);
        assert!(options.header_footer);
        assert!(!options.header_footer_first);
        assert!(!options.chapter_break);
    }

    #[tokio::test]
    async fn test_cover_is_not_implemented() {
        let dir = scratch_with_markdown();
        let options = RenderOptions {
            cover: true,
            ..Default::default()
        };
        let compiler = FakeCompiler::default();

        let err = render_pdf(dir.path(), &theme::DEFAULT, &options, "out.pdf", &compiler)
            .await
            .unwrap_err();

        assert!(matches!(err, PaperError::NotImplemented(ref what) if what == "cover page"));
        assert!(compiler.markdown_seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replaces_existing_output() {
        let dir = scratch_with_markdown();
        std::fs::write(dir.path().join("out.pdf"), b"stale").unwrap();

        let path = render_pdf(
            dir.path(),
            &theme::DEFAULT,
            &RenderOptions::default(),
            "out.pdf",
            &FakeCompiler::default(),
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(path).unwrap(), FAKE_PDF);
    }

    #[tokio::test]
    async fn test_missing_output_is_render_error() {
        let dir = scratch_with_markdown();
        std::fs::write(dir.path().join("out.pdf"), b"stale").unwrap();

        let err = render_pdf(
            dir.path(),
            &theme::DEFAULT,
            &RenderOptions::default(),
            "out.pdf",
            &SilentCompiler,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PaperError::Render(_)));
        assert!(!dir.path().join("out.pdf").exists());
    }
}
