use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use uuid::Uuid;

use super::figure::Figure;
use super::snapshot::ReportConfig;
use super::table::Table;
use crate::error::{PaperError, PaperResult};
use crate::workflow::manual::{MANUAL_END, MANUAL_START};

pub const DEFAULT_ENGINE: &str = "default";
pub const DEFAULT_GRAPH_WIDTH: &str = "100%";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Title1,
    Title2,
    Normal,
}

impl TextStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextStyle::Title1 => "title1",
            TextStyle::Title2 => "title2",
            TextStyle::Normal => "normal",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            TextStyle::Title1 => "# ",
            TextStyle::Title2 => "## ",
            TextStyle::Normal => "",
        }
    }
}

impl fmt::Display for TextStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextStyle {
    type Err = PaperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title1" => Ok(TextStyle::Title1),
            "title2" => Ok(TextStyle::Title2),
            "normal" => Ok(TextStyle::Normal),
            other => Err(PaperError::UnsupportedStyle(other.to_string())),
        }
    }
}

/// Markdown accumulator bound to a scratch directory.
#[derive(Debug, Clone)]
pub struct Report {
    pub variables: BTreeMap<String, String>,
    pub engine: String,
    pub verbosity: u8,
    markdown: String,
    scratch: PathBuf,
}

impl Report {
    pub fn new(scratch: impl Into<PathBuf>) -> PaperResult<Self> {
        let scratch = scratch.into();
        std::fs::create_dir_all(&scratch)?;
        Ok(Self {
            variables: BTreeMap::new(),
            engine: DEFAULT_ENGINE.to_string(),
            verbosity: 0,
            markdown: String::new(),
            scratch,
        })
    }

    /// Rebuilds a report from the `config.json` of a preserved scratch
    /// directory. The Markdown buffer starts empty; the existing `report.md`
    /// stays on disk for a later `save` with `generate_markdown = false`.
    pub fn load(path: impl AsRef<Path>) -> PaperResult<Self> {
        let path = path.as_ref();
        let config = ReportConfig::read(path)?;
        Ok(Self {
            variables: config.variables,
            engine: config.engine,
            verbosity: config.verbosity,
            markdown: String::new(),
            scratch: path.to_path_buf(),
        })
    }

    pub fn with_variables<I, K, V>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.variables
            .extend(variables.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn config(&self) -> ReportConfig {
        ReportConfig {
            engine: self.engine.clone(),
            variables: self.variables.clone(),
            verbosity: self.verbosity,
        }
    }

    /// Appends a line in one of the named styles (`title1`, `title2`,
    /// `normal`).
    pub fn add_text(&mut self, text: &str, style: &str) -> PaperResult<()> {
        let style = style.parse::<TextStyle>()?;
        self.push_text(text, style);
        Ok(())
    }

    pub fn push_text(&mut self, text: &str, style: TextStyle) {
        let block = format!("{}{}\n\n", style.prefix(), text);
        if self.verbosity > 0 {
            tracing::info!(style = %style, text = %text, "report text added");
        }
        self.markdown.push_str(&block);
    }

    /// Appends author-only guidance that finalization strips out.
    pub fn add_manual(&mut self, text: &str) {
        self.markdown.push_str(MANUAL_START);
        self.markdown.push('\n');
        self.markdown.push_str(text.trim_end_matches('\n'));
        self.markdown.push('\n');
        self.markdown.push_str(MANUAL_END);
        self.markdown.push_str("\n\n");
    }

    /// Writes the figure as `<uuid>.png` and references it with the given
    /// width (`100%`, `8cm`, ...). Returns the generated file name.
    pub fn add_graph<F: Figure>(&mut self, figure: F, width: &str) -> PaperResult<String> {
        std::fs::create_dir_all(&self.scratch)?;
        let file_name = format!("{}.png", Uuid::new_v4());
        figure.write_png(&self.scratch.join(&file_name))?;
        self.markdown
            .push_str(&format!("\n\n![]({file_name}){{width={width}}}\\ \n\n"));
        if self.verbosity > 0 {
            tracing::info!(file = %file_name, width = %width, "report graph added");
        }
        Ok(file_name)
    }

    pub fn add_table(&mut self, table: &Table, show_index: bool) {
        let text = table.to_markdown(show_index);
        if self.verbosity > 0 {
            tracing::info!(rows = table.len(), "report table added");
        }
        self.markdown.push_str("\n\n");
        self.markdown.push_str(&text);
        self.markdown.push_str("\n\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::figure::PngBytes;

    fn report() -> (tempfile::TempDir, Report) {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::new(dir.path().join("scratch")).unwrap();
        (dir, report)
    }

    #[test]
    fn test_text_styles() {
        let cases = vec![
            ("title1", "# Overview\n\n"),
            ("title2", "## Overview\n\n"),
            ("normal", "Overview\n\n"),
        ];

        for (style, expected) in cases {
            let (_dir, mut report) = report();
            report.add_text("Overview", style).unwrap();
            assert_eq!(report.markdown(), expected, "style {style}");
        }
    }

    #[test]
    fn test_unsupported_style() {
        let (_dir, mut report) = report();
        for style in ["title3", "Title1", "", "bold"] {
            let err = report.add_text("x", style).unwrap_err();
            assert!(matches!(err, PaperError::UnsupportedStyle(_)));
        }
        assert!(report.markdown().is_empty());
    }

    #[test]
    fn test_style_round_trip() {
        for style in [TextStyle::Title1, TextStyle::Title2, TextStyle::Normal] {
            assert_eq!(style.as_str().parse::<TextStyle>().unwrap(), style);
        }
    }

    #[test]
    fn test_buffer_concatenation() {
        let (_dir, mut report) = report();
        report.add_text("Report", "title1").unwrap();
        report.add_text("Empty", "normal").unwrap();
        assert_eq!(report.markdown(), "# Report\n\nEmpty\n\n");
    }

    #[test]
    fn test_add_graph_writes_png() {
        let (_dir, mut report) = report();
        let file = report
            .add_graph(PngBytes(vec![0x89, b'P', b'N', b'G']), "50%")
            .unwrap();

        assert!(file.ends_with(".png"));
        assert_eq!(
            std::fs::read(report.scratch_dir().join(&file)).unwrap(),
            vec![0x89, b'P', b'N', b'G']
        );
        assert_eq!(
            report.markdown(),
            format!("\n\n![]({file}){{width=50%}}\\ \n\n")
        );
    }

    #[test]
    fn test_graph_names_are_unique() {
        let (_dir, mut report) = report();
        let png = PngBytes(vec![1, 2, 3]);
        let first = report.add_graph(&png, DEFAULT_GRAPH_WIDTH).unwrap();
        let second = report.add_graph(&png, DEFAULT_GRAPH_WIDTH).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_add_table() {
        let (_dir, mut report) = report();
        let mut table = Table::new(["a"]);
        table.push_row(["x"]).unwrap();
        report.add_table(&table, false);
        assert_eq!(
            report.markdown(),
            format!("\n\n{}\n\n", table.to_markdown(false))
        );
    }

    #[test]
    fn test_add_manual_wraps_markers() {
        let (_dir, mut report) = report();
        report.add_manual("Check the numbers with finance.\n");
        assert_eq!(
            report.markdown(),
            "==[MANUAL]==\nCheck the numbers with finance.\n==[END OF MANUAL]==\n\n"
        );
    }

    #[test]
    fn test_builder_defaults() {
        let (_dir, report) = report();
        let report = report
            .with_variables([("title", "Weekly")])
            .with_engine("minimal")
            .with_verbosity(2);
        assert_eq!(report.engine, "minimal");
        assert_eq!(report.verbosity, 2);
        assert_eq!(report.variables["title"], "Weekly");
        assert!(report.scratch_dir().exists());
    }
}
