use std::path::PathBuf;

use super::{CompileJob, DocumentCompiler, RenderOptions};
use crate::config::Config;
use crate::error::{PaperError, PaperResult};
use crate::report::MARKDOWN_FILE;
use crate::theme::Theme;

const INPUT_FORMAT: &str = "markdown+pipe_tables+link_attributes+yaml_metadata_block";

/// Runs the `pandoc` binary with a LaTeX PDF engine.
#[derive(Debug, Clone)]
pub struct PandocCompiler {
    program: PathBuf,
    pdf_engine: String,
}

impl PandocCompiler {
    pub fn new(program: impl Into<PathBuf>, pdf_engine: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            pdf_engine: pdf_engine.into(),
        }
    }

    /// Uses `PANDOC_PATH` when set, otherwise searches `PATH`.
    pub fn locate(config: &Config) -> PaperResult<Self> {
        let program = match &config.pandoc_path {
            Some(path) => path.clone(),
            None => which::which("pandoc").map_err(|e| {
                PaperError::Config(format!("pandoc not found on PATH ({e}); set PANDOC_PATH"))
            })?,
        };
        tracing::debug!(program = %program.display(), engine = %config.pdf_engine, "using pandoc");
        Ok(Self::new(program, config.pdf_engine.clone()))
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

#[async_trait::async_trait]
impl DocumentCompiler for PandocCompiler {
    async fn compile(&self, job: &CompileJob<'_>) -> PaperResult<()> {
        let args = pandoc_args(job.theme, job.options, job.output, &self.pdf_engine);
        tracing::debug!(args = ?args, "running pandoc");

        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .current_dir(job.scratch)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PaperError::Render(format!(
                "pandoc failed (exit {}): {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "pandoc"
    }
}

/// Command line for rendering `report.md` in the working directory.
pub fn pandoc_args(
    theme: &Theme,
    options: &RenderOptions,
    output: &str,
    pdf_engine: &str,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        MARKDOWN_FILE.into(),
        "--from".into(),
        INPUT_FORMAT.into(),
        format!("--pdf-engine={pdf_engine}"),
        "--highlight-style".into(),
        "pygments.theme".into(),
        "--include-in-header".into(),
        "basic_headers.tex".into(),
        "-V".into(),
        "linkcolor:blue".into(),
        "-V".into(),
        "mainfont=DejaVu Sans".into(),
        "-V".into(),
        "monofont=DejaVu Sans Mono".into(),
    ];

    for header in theme.tex_headers {
        args.push("--include-in-header".into());
        args.push((*header).into());
    }
    if options.header_footer {
        args.push("--include-in-header".into());
        args.push("header_footer.tex".into());
    }
    if !options.header_footer_first {
        args.push("--include-before-body".into());
        args.push("header_footer_no_first.tex".into());
    }
    if options.chapter_break {
        args.push("--include-in-header".into());
        args.push("chapter_break.tex".into());
    }
    if options.toc {
        args.push("--toc".into());
        args.push("-V".into());
        args.push("toc-title=Table of contents".into());
    }

    args.push("-o".into());
    args.push(output.into());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    fn position(args: &[String], value: &str) -> Option<usize> {
        args.iter().position(|a| a == value)
    }

    #[test]
    fn test_default_arguments() {
        let args = pandoc_args(&theme::DEFAULT, &RenderOptions::default(), "out.pdf", "xelatex");

        assert_eq!(args[0], "report.md");
        assert_eq!(args[1], "--from");
        assert_eq!(args[2], INPUT_FORMAT);
        assert_eq!(args[3], "--pdf-engine=xelatex");
        assert!(position(&args, "header_footer.tex").is_some());
        assert!(position(&args, "header_footer_no_first.tex").is_some());
        assert!(position(&args, "chapter_break.tex").is_none());
        assert!(position(&args, "--toc").is_none());
        assert_eq!(&args[args.len() - 2..], ["-o", "out.pdf"]);
    }

    #[test]
    fn test_theme_headers_in_order() {
        let args = pandoc_args(&theme::DEFAULT, &RenderOptions::default(), "out.pdf", "xelatex");
        let positions: Vec<usize> = theme::DEFAULT
            .tex_headers
            .iter()
            .map(|h| position(&args, h).unwrap())
            .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        for p in positions {
            assert_eq!(args[p - 1], "--include-in-header");
        }
    }

    #[test]
    fn test_optional_fragments() {
        let options = RenderOptions {
            toc: true,
            header_footer: false,
            header_footer_first: true,
            chapter_break: true,
            ..Default::default()
        };
        let args = pandoc_args(&theme::MINIMAL, &options, "final.pdf", "lualatex");

        assert!(args.contains(&"--pdf-engine=lualatex".to_string()));
        assert!(position(&args, "header_footer.tex").is_none());
        assert!(position(&args, "header_footer_no_first.tex").is_none());
        let chapter = position(&args, "chapter_break.tex").unwrap();
        assert_eq!(args[chapter - 1], "--include-in-header");
        let toc = position(&args, "--toc").unwrap();
        assert_eq!(args[toc + 2], "toc-title=Table of contents");
    }

    #[test]
    fn test_locate_prefers_configured_path() {
        let config = Config {
            pandoc_path: Some(PathBuf::from("/opt/pandoc/bin/pandoc")),
            pdf_engine: "tectonic".to_string(),
            ..Default::default()
        };
        let compiler = PandocCompiler::locate(&config).unwrap();
        assert_eq!(compiler.program(), &PathBuf::from("/opt/pandoc/bin/pandoc"));
        assert_eq!(compiler.pdf_engine, "tectonic");
    }
}
