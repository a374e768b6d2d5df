use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{PaperError, PaperResult};

const DEV_ACCOUNT: &str = "devstoreaccount1";
const DEV_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

/// Parsed `Key=Value;...` storage account connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub account_name: String,
    pub account_key: String,
    /// Base URL of the blob service, without a trailing slash.
    pub blob_endpoint: String,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> PaperResult<Self> {
        let mut pairs: HashMap<String, String> = HashMap::new();
        for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                PaperError::InvalidConnectionString(format!("segment without '=': {part}"))
            })?;
            pairs.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        if pairs
            .get("usedevelopmentstorage")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Ok(Self {
                account_name: DEV_ACCOUNT.to_string(),
                account_key: DEV_KEY.to_string(),
                blob_endpoint: DEV_BLOB_ENDPOINT.to_string(),
            });
        }

        let account_name = pairs
            .remove("accountname")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PaperError::InvalidConnectionString("missing AccountName".into()))?;
        let account_key = pairs
            .remove("accountkey")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PaperError::InvalidConnectionString("missing AccountKey".into()))?;

        let blob_endpoint = match pairs.remove("blobendpoint") {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => {
                let protocol = pairs
                    .remove("defaultendpointsprotocol")
                    .unwrap_or_else(|| "https".to_string());
                let suffix = pairs
                    .remove("endpointsuffix")
                    .unwrap_or_else(|| "core.windows.net".to_string());
                format!("{protocol}://{account_name}.blob.{suffix}")
            }
        };

        Ok(Self {
            account_name,
            account_key,
            blob_endpoint,
        })
    }
}

impl FromStr for ConnectionString {
    type Err = PaperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
