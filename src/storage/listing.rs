//! Response bodies of the blob service.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::BlobInfo;
use crate::error::{PaperError, PaperResult};

#[derive(Debug, Deserialize)]
struct EnumerationResults {
    #[serde(rename = "Blobs", default)]
    blobs: Blobs,
    #[serde(rename = "NextMarker", default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Blobs {
    #[serde(rename = "Blob", default)]
    blob: Vec<Blob>,
}

#[derive(Debug, Deserialize)]
struct Blob {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Properties")]
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Properties {
    #[serde(rename = "Last-Modified")]
    last_modified: String,
    #[serde(rename = "Content-Length", default)]
    content_length: u64,
}

/// One page of a List Blobs response.
#[derive(Debug)]
pub(crate) struct ListPage {
    pub blobs: Vec<BlobInfo>,
    pub next_marker: Option<String>,
}

pub(crate) fn parse_list_page(xml: &str) -> PaperResult<ListPage> {
    let results: EnumerationResults = quick_xml::de::from_str(xml)?;
    let blobs = results
        .blobs
        .blob
        .into_iter()
        .map(|blob| {
            Ok(BlobInfo {
                last_modified: parse_http_date(&blob.properties.last_modified)?,
                name: blob.name,
                size: blob.properties.content_length,
            })
        })
        .collect::<PaperResult<Vec<_>>>()?;

    Ok(ListPage {
        blobs,
        next_marker: results.next_marker.filter(|m| !m.trim().is_empty()),
    })
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

/// Best-effort `Code: Message` summary of an error response body.
pub(crate) fn error_summary(body: &str) -> Option<String> {
    let parsed: ErrorBody = quick_xml::de::from_str(body).ok()?;
    Some(match parsed.message {
        Some(message) => {
            let first_line = message.lines().next().unwrap_or_default();
            format!("{}: {}", parsed.code, first_line)
        }
        None => parsed.code,
    })
}

/// `Last-Modified` is an RFC 1123 date (`Wed, 09 Sep 2009 09:20:02 GMT`).
pub(crate) fn parse_http_date(value: &str) -> PaperResult<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .map(|date| date.with_timezone(&Utc))
        .map_err(|e| PaperError::Storage {
            status: 0,
            message: format!("invalid Last-Modified {value:?}: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const PAGE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://acme.blob.core.windows.net/" ContainerName="reports">
  <Prefix>draft/</Prefix>
  <Blobs>
    <Blob>
      <Name>draft/2024-w01/weekly.zip</Name>
      <Properties>
        <Creation-Time>Mon, 01 Jan 2024 08:00:00 GMT</Creation-Time>
        <Last-Modified>Mon, 01 Jan 2024 09:30:00 GMT</Last-Modified>
        <Etag>0x8DC0A</Etag>
        <Content-Length>2048</Content-Length>
        <Content-Type>application/octet-stream</Content-Type>
      </Properties>
    </Blob>
    <Blob>
      <Name>draft/2024-w01/monthly.zip</Name>
      <Properties>
        <Last-Modified>Tue, 02 Jan 2024 10:00:00 GMT</Last-Modified>
        <Content-Length>10</Content-Length>
      </Properties>
    </Blob>
  </Blobs>
  <NextMarker>2!88!MDAwMDI</NextMarker>
</EnumerationResults>"#;

    #[test]
    fn test_parse_list_page() {
        let page = parse_list_page(PAGE).unwrap();
        assert_eq!(page.blobs.len(), 2);
        assert_eq!(page.blobs[0].name, "draft/2024-w01/weekly.zip");
        assert_eq!(page.blobs[0].size, 2048);
        assert_eq!(
            page.blobs[0].last_modified,
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap()
        );
        assert_eq!(page.next_marker.as_deref(), Some("2!88!MDAwMDI"));
    }

    #[test]
    fn test_last_page_has_no_marker() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ContainerName="reports"><Blobs /><NextMarker /></EnumerationResults>"#;
        let page = parse_list_page(xml).unwrap();
        assert!(page.blobs.is_empty());
        assert!(page.next_marker.is_none());
    }

    #[test]
    fn test_error_summary() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<Error><Code>AuthenticationFailed</Code><Message>Server failed to authenticate the request.
RequestId:abc</Message></Error>"#;
        assert_eq!(
            error_summary(body).as_deref(),
            Some("AuthenticationFailed: Server failed to authenticate the request.")
        );
        assert!(error_summary("").is_none());
    }

    #[test]
    fn test_bad_date() {
        assert!(parse_http_date("yesterday").is_err());
    }
}
