use std::env;
use std::path::PathBuf;

use crate::error::{PaperError, PaperResult};

pub const DEFAULT_CONTAINER: &str = "reports";
pub const DEFAULT_LINK_HOURS: u32 = 168;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub blob_conn_string: Option<String>,
    pub blob_container: String,
    pub link_hours: u32,
    pub pandoc_path: Option<PathBuf>,
    pub pdf_engine: String,
    pub allow_draft_finalize: bool,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            blob_conn_string: None,
            blob_container: DEFAULT_CONTAINER.to_string(),
            link_hours: DEFAULT_LINK_HOURS,
            pandoc_path: None,
            pdf_engine: "xelatex".to_string(),
            allow_draft_finalize: true,
            otel_service_name: "paperdash".to_string(),
            otel_exporter_endpoint: None,
        }
    }
}

impl Config {
    pub fn from_env() -> PaperResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> PaperResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let link_hours = match lookup("REPORT_LINK_HOURS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                PaperError::Config(format!("REPORT_LINK_HOURS must be a number, got {raw:?}"))
            })?,
            None => defaults.link_hours,
        };

        let allow_draft_finalize = match lookup("ALLOW_DRAFT_FINALIZE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                PaperError::Config(format!(
                    "ALLOW_DRAFT_FINALIZE must be true or false, got {raw:?}"
                ))
            })?,
            None => defaults.allow_draft_finalize,
        };

        Ok(Self {
            environment: lookup("PAPERDASH_ENVIRONMENT").unwrap_or(defaults.environment),
            blob_conn_string: lookup("BLOB_CONN_STRING").filter(|s| !s.trim().is_empty()),
            blob_container: lookup("BLOB_CONTAINER").unwrap_or(defaults.blob_container),
            link_hours,
            pandoc_path: lookup("PANDOC_PATH").map(PathBuf::from),
            pdf_engine: lookup("PDF_ENGINE").unwrap_or(defaults.pdf_engine),
            allow_draft_finalize,
            otel_service_name: lookup("OTEL_SERVICE_NAME").unwrap_or(defaults.otel_service_name),
            otel_exporter_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
                .filter(|s| !s.trim().is_empty()),
        })
    }

    pub fn require_conn_string(&self) -> PaperResult<&str> {
        self.blob_conn_string
            .as_deref()
            .ok_or_else(|| PaperError::Config("BLOB_CONN_STRING must be set".to_string()))
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.blob_container, "reports");
        assert_eq!(config.link_hours, 168);
        assert_eq!(config.pdf_engine, "xelatex");
        assert!(config.allow_draft_finalize);
        assert!(config.blob_conn_string.is_none());
        assert!(config.otel_exporter_endpoint.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_reads_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("BLOB_CONN_STRING", "AccountName=a;AccountKey=b;"),
            ("BLOB_CONTAINER", "archive"),
            ("REPORT_LINK_HOURS", "24"),
            ("ALLOW_DRAFT_FINALIZE", "false"),
            ("PAPERDASH_ENVIRONMENT", "production"),
            ("PANDOC_PATH", "/opt/pandoc/bin/pandoc"),
        ]))
        .unwrap();

        assert_eq!(config.require_conn_string().unwrap(), "AccountName=a;AccountKey=b;");
        assert_eq!(config.blob_container, "archive");
        assert_eq!(config.link_hours, 24);
        assert!(!config.allow_draft_finalize);
        assert!(config.is_production());
        assert_eq!(
            config.pandoc_path.as_deref(),
            Some(std::path::Path::new("/opt/pandoc/bin/pandoc"))
        );
    }

    #[test]
    fn test_invalid_link_hours() {
        let err = Config::from_lookup(lookup_from(&[("REPORT_LINK_HOURS", "a week")])).unwrap_err();
        assert!(matches!(err, PaperError::Config(_)));
    }

    #[test]
    fn test_invalid_bool() {
        let err =
            Config::from_lookup(lookup_from(&[("ALLOW_DRAFT_FINALIZE", "maybe")])).unwrap_err();
        assert!(matches!(err, PaperError::Config(_)));
    }

    #[test]
    fn test_missing_conn_string() {
        let config = Config::from_lookup(lookup_from(&[("BLOB_CONN_STRING", "  ")])).unwrap();
        assert!(matches!(
            config.require_conn_string(),
            Err(PaperError::Config(_))
        ));
    }
}
