use thiserror::Error;

use crate::workflow::Stage;

#[derive(Error, Debug)]
pub enum PaperError {
    #[error("Unsupported style: {0}")]
    UnsupportedStyle(String),

    #[error("Unsupported format: {0} (only pdf output is supported)")]
    UnsupportedFormat(String),

    #[error("Markdown file should already exist if you do not want to generate it: {0}")]
    MissingMarkdown(String),

    #[error("Nothing to return: enable pdf generation or zip the scratch directory")]
    NothingToReturn,

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Blob already exists: {0}")]
    BlobExists(String),

    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    #[error("No report found for {0}")]
    ArtifactNotFound(String),

    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    #[error("Not an artifact key: {0}")]
    InvalidArtifactKey(String),

    #[error("Invalid stage transition: {from} -> {to}")]
    InvalidTransition { from: Stage, to: Stage },

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error ({status}): {message}")]
    Storage { status: u16, message: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),
}

impl PaperError {
    /// Short machine-friendly label used as a span/metric attribute.
    pub fn kind(&self) -> &'static str {
        match self {
            PaperError::UnsupportedStyle(_) => "unsupported_style",
            PaperError::UnsupportedFormat(_) => "unsupported_format",
            PaperError::MissingMarkdown(_) => "missing_markdown",
            PaperError::NothingToReturn => "nothing_to_return",
            PaperError::NotImplemented(_) => "not_implemented",
            PaperError::InvalidTable(_) => "invalid_table",
            PaperError::UnknownTheme(_) => "unknown_theme",
            PaperError::BlobExists(_) => "blob_exists",
            PaperError::BlobNotFound(_) => "blob_not_found",
            PaperError::ArtifactNotFound(_) => "artifact_not_found",
            PaperError::UnknownStage(_) => "unknown_stage",
            PaperError::InvalidArtifactKey(_) => "invalid_artifact_key",
            PaperError::InvalidTransition { .. } => "invalid_transition",
            PaperError::InvalidConnectionString(_) => "invalid_connection_string",
            PaperError::Config(_) => "config",
            PaperError::Storage { .. } => "storage",
            PaperError::Render(_) => "render",
            PaperError::Io(_) => "io",
            PaperError::Json(_) => "json",
            PaperError::Http(_) => "http",
            PaperError::Archive(_) => "archive",
            PaperError::Xml(_) => "xml",
        }
    }
}

pub type PaperResult<T> = Result<T, PaperError>;
