use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{
    AUTHORIZATION, CONTENT_ENCODING, CONTENT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderName,
    HeaderValue, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_UNMODIFIED_SINCE, RANGE,
};
use reqwest::{Method, StatusCode, Url};
use sha2::Sha256;

use super::connection::ConnectionString;
use super::listing::{error_summary, parse_list_page};
use super::{BlobInfo, BlobStore};
use crate::config::Config;
use crate::error::{PaperError, PaperResult};

const API_VERSION: &str = "2021-08-06";
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
const SAS_EXPIRY: &str = "%Y-%m-%dT%H:%M:%SZ";

type HmacSha256 = Hmac<Sha256>;

/// Azure Blob Storage over its REST API, authenticated with the account key.
pub struct AzureBlobStore {
    client: reqwest::Client,
    account: String,
    key: Vec<u8>,
    endpoint: Url,
    container: String,
}

impl AzureBlobStore {
    pub fn new(connection: &ConnectionString, container: &str) -> PaperResult<Self> {
        let key = STANDARD
            .decode(connection.account_key.as_bytes())
            .map_err(|e| PaperError::InvalidConnectionString(format!("AccountKey: {e}")))?;
        let endpoint = Url::parse(&connection.blob_endpoint).map_err(|e| {
            PaperError::InvalidConnectionString(format!(
                "blob endpoint {}: {e}",
                connection.blob_endpoint
            ))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(PaperError::InvalidConnectionString(format!(
                "blob endpoint {} is not a base URL",
                connection.blob_endpoint
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            account: connection.account_name.clone(),
            key,
            endpoint,
            container: container.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> PaperResult<Self> {
        let connection = ConnectionString::parse(config.require_conn_string()?)?;
        Self::new(&connection, &config.blob_container)
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    fn url(&self, key: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.container);
            if let Some(key) = key {
                segments.extend(key.split('/'));
            }
        }
        url
    }

    fn blob_url(&self, key: &str) -> Url {
        self.url(Some(key))
    }

    fn canonical_resource(&self, url: &Url) -> String {
        let mut resource = format!("/{}{}", self.account, url.path());
        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in url.query_pairs() {
            params
                .entry(name.to_ascii_lowercase())
                .or_default()
                .push(value.into_owned());
        }
        for (name, mut values) in params {
            values.sort();
            resource.push_str(&format!("\n{}:{}", name, values.join(",")));
        }
        resource
    }

    fn sign(&self, string_to_sign: &str) -> PaperResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| PaperError::InvalidConnectionString(format!("AccountKey: {e}")))?;
        mac.update(string_to_sign.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        mut headers: HeaderMap,
        body: Vec<u8>,
    ) -> PaperResult<reqwest::Response> {
        let date = Utc::now().format(HTTP_DATE).to_string();
        headers.insert(HeaderName::from_static("x-ms-date"), header_value(&date)?);
        headers.insert(
            HeaderName::from_static("x-ms-version"),
            HeaderValue::from_static(API_VERSION),
        );

        let to_sign = string_to_sign(
            &method,
            &headers,
            body.len(),
            &self.canonical_resource(&url),
        );
        let authorization = format!("SharedKey {}:{}", self.account, self.sign(&to_sign)?);
        headers.insert(AUTHORIZATION, header_value(&authorization)?);

        tracing::debug!(method = %method, path = url.path(), "blob request");
        let response = self
            .client
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;
        Ok(response)
    }

    /// URL with a service SAS granting read access to one blob until
    /// `expires_at`.
    pub fn sas_url(&self, key: &str, expires_at: DateTime<Utc>) -> PaperResult<String> {
        let expiry = expires_at.format(SAS_EXPIRY).to_string();
        let resource = format!("/blob/{}/{}/{}", self.account, self.container, key);
        let fields = [
            "r",
            "",
            expiry.as_str(),
            resource.as_str(),
            "",
            "",
            "",
            API_VERSION,
            "b",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
        ];
        let signature = self.sign(&fields.join("\n"))?;

        let mut url = self.blob_url(key);
        url.query_pairs_mut()
            .append_pair("sv", API_VERSION)
            .append_pair("se", &expiry)
            .append_pair("sr", "b")
            .append_pair("sp", "r")
            .append_pair("sig", &signature);
        Ok(url.to_string())
    }
}

fn header_value(value: &str) -> PaperResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| PaperError::Storage {
        status: 0,
        message: format!("invalid header value: {e}"),
    })
}

/// SharedKey string-to-sign: verb, the standard headers in fixed order,
/// then the `x-ms-*` headers and the canonical resource.
fn string_to_sign(
    method: &Method,
    headers: &HeaderMap,
    content_length: usize,
    canonical_resource: &str,
) -> String {
    let get = |name: &HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    let mut out = String::new();
    for field in [
        method.as_str().to_string(),
        get(&CONTENT_ENCODING),
        get(&CONTENT_LANGUAGE),
        length,
        headers
            .get("content-md5")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        get(&CONTENT_TYPE),
        String::new(),
        get(&IF_MODIFIED_SINCE),
        get(&IF_MATCH),
        get(&IF_NONE_MATCH),
        get(&IF_UNMODIFIED_SINCE),
        get(&RANGE),
    ] {
        out.push_str(&field);
        out.push('\n');
    }

    let mut ms_headers: Vec<(&str, &str)> = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-ms-"))
        .map(|(name, value)| (name.as_str(), value.to_str().unwrap_or_default().trim()))
        .collect();
    ms_headers.sort();
    for (name, value) in ms_headers {
        out.push_str(&format!("{name}:{value}\n"));
    }

    out.push_str(canonical_resource);
    out
}

/// Maps a failed response to `BlobNotFound` or `Storage`.
async fn check(response: reqwest::Response, key: &str) -> PaperResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(PaperError::BlobNotFound(key.to_string()));
    }

    let code = response
        .headers()
        .get("x-ms-error-code")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    let message = error_summary(&body)
        .or(code)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
    Err(PaperError::Storage {
        status: status.as_u16(),
        message,
    })
}

#[async_trait::async_trait]
impl BlobStore for AzureBlobStore {
    async fn exists(&self, key: &str) -> PaperResult<bool> {
        let response = self
            .send(Method::HEAD, self.blob_url(key), HeaderMap::new(), Vec::new())
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(response, key).await?;
        Ok(true)
    }

    async fn put(&self, key: &str, content: Vec<u8>) -> PaperResult<()> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-ms-blob-type"),
            HeaderValue::from_static("BlockBlob"),
        );
        let response = self
            .send(Method::PUT, self.blob_url(key), headers, content)
            .await?;
        check(response, key).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> PaperResult<Vec<u8>> {
        let response = self
            .send(Method::GET, self.blob_url(key), HeaderMap::new(), Vec::new())
            .await?;
        let response = check(response, key).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn delete(&self, key: &str) -> PaperResult<()> {
        let response = self
            .send(Method::DELETE, self.blob_url(key), HeaderMap::new(), Vec::new())
            .await?;
        check(response, key).await?;
        Ok(())
    }

    async fn list(&self, prefix: Option<&str>) -> PaperResult<Vec<BlobInfo>> {
        let mut blobs = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let mut url = self.url(None);
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("restype", "container")
                    .append_pair("comp", "list");
                if let Some(prefix) = prefix {
                    query.append_pair("prefix", prefix);
                }
                if let Some(marker) = &marker {
                    query.append_pair("marker", marker);
                }
            }

            let response = self
                .send(Method::GET, url, HeaderMap::new(), Vec::new())
                .await?;
            let response = check(response, &self.container).await?;
            let page = parse_list_page(&response.text().await?)?;
            blobs.extend(page.blobs);

            match page.next_marker {
                Some(next) => marker = Some(next),
                None => break,
            }
        }
        Ok(blobs)
    }

    fn signed_url(&self, key: &str, expiry: chrono::Duration) -> PaperResult<String> {
        self.sas_url(key, Utc::now() + expiry)
    }

    fn name(&self) -> &str {
        "azure"
    }
}
