use std::path::PathBuf;

use uuid::Uuid;

use super::builder::Report;
use super::snapshot::MARKDOWN_FILE;
use crate::archive;
use crate::error::{PaperError, PaperResult};
use crate::render::{self, DocumentCompiler, RenderOptions};
use crate::theme::Theme;

/// Controls what `Report::save` produces and returns.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Output PDF name inside the scratch directory. A random `<uuid>.pdf` is
    /// used when unset, and the bytes are then always returned.
    pub filename: Option<String>,
    pub render: RenderOptions,
    pub return_bytes: bool,
    pub generate_markdown: bool,
    pub clean_scratch: bool,
    /// Where to write a zip of the scratch directory.
    pub zip_to: Option<PathBuf>,
    pub generate_pdf: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            filename: None,
            render: RenderOptions::default(),
            return_bytes: false,
            generate_markdown: true,
            clean_scratch: false,
            zip_to: None,
            generate_pdf: true,
        }
    }
}

impl Report {
    #[tracing::instrument(
        name = "report save",
        skip(self, options, compiler),
        fields(
            report.engine = %self.engine,
            report.scratch = %self.scratch_dir().display(),
            report.filename = tracing::field::Empty,
        )
    )]
    pub async fn save(
        &self,
        options: &SaveOptions,
        compiler: &dyn DocumentCompiler,
    ) -> PaperResult<Option<Vec<u8>>> {
        let scratch = self.scratch_dir();
        std::fs::create_dir_all(scratch)?;

        let mut return_bytes = options.return_bytes;
        let filename = match &options.filename {
            Some(name) => name.clone(),
            None => {
                return_bytes = true;
                format!("{}.pdf", Uuid::new_v4())
            }
        };
        if !filename.ends_with("pdf") {
            return Err(PaperError::UnsupportedFormat(filename));
        }
        tracing::Span::current().record("report.filename", filename.as_str());

        let theme = Theme::by_name(&self.engine)?;
        let missing = theme.missing_variables(&self.variables);
        if !missing.is_empty() {
            tracing::warn!(
                theme = theme.name,
                missing = ?missing,
                "theme variables not set, placeholders stay in the output"
            );
        }
        theme.materialize(scratch, &self.variables)?;
        self.config().write(scratch)?;

        let markdown_path = scratch.join(MARKDOWN_FILE);
        if options.generate_markdown {
            std::fs::write(&markdown_path, self.markdown())?;
        } else if !markdown_path.exists() {
            return Err(PaperError::MissingMarkdown(
                markdown_path.display().to_string(),
            ));
        }

        let pdf_path = if options.generate_pdf {
            Some(render::render_pdf(scratch, theme, &options.render, &filename, compiler).await?)
        } else {
            None
        };

        let zipped = match &options.zip_to {
            Some(target) => {
                let bytes = archive::zip_dir(scratch)?;
                std::fs::write(target, &bytes)?;
                tracing::debug!(target = %target.display(), bytes = bytes.len(), "scratch zipped");
                Some(bytes)
            }
            None => None,
        };

        let response = if !return_bytes {
            None
        } else if let Some(path) = &pdf_path {
            Some(std::fs::read(path)?)
        } else if zipped.is_some() {
            zipped
        } else {
            return Err(PaperError::NothingToReturn);
        };

        if options.clean_scratch {
            std::fs::remove_dir_all(scratch)?;
        }

        Ok(response)
    }
}
