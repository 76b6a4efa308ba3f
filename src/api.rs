// OSF client module: a small blocking HTTP client for the OSF files API
// (WaterButler). It resolves the destination `raw` folder and PUTs files
// into a repository's osfstorage provider.

use crate::config::Settings;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

/// Root listing of a repository's storage provider.
#[derive(Deserialize, Debug)]
pub struct StorageListing {
    pub data: Option<Vec<StorageEntry>>,
}

#[derive(Deserialize, Debug)]
pub struct StorageEntry {
    pub attributes: EntryAttributes,
}

#[derive(Deserialize, Debug)]
pub struct EntryAttributes {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
}

/// Per-file result of a PUT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    Succeeded,
    /// The file already exists at the destination.
    Skipped,
    Failed(String),
}

impl UploadOutcome {
    /// 201 is a new file, 409 a file already present; any other status is
    /// an upload error.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::CREATED => UploadOutcome::Succeeded,
            StatusCode::CONFLICT => UploadOutcome::Skipped,
            other => UploadOutcome::Failed(
                Error::Upload {
                    status: other.as_u16(),
                    reason: other.canonical_reason().unwrap_or("").to_string(),
                }
                .to_string(),
            ),
        }
    }
}

/// Client for one OSF API base URL. Cheap to clone.
#[derive(Clone)]
pub struct OsfClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl OsfClient {
    pub fn new(client: Client, settings: &Settings) -> Self {
        if settings.token.is_none() {
            warn!("no OSF token configured; uploads will be sent without credentials");
        }
        OsfClient {
            client,
            api_url: settings.api_url.clone(),
            token: settings.token.clone(),
        }
    }

    /// `<api>/<repo>/providers/osfstorage` followed by `path`.
    pub fn storage_url(&self, repo_id: &str, path: &str) -> String {
        format!("{}/{}/providers/osfstorage{}", self.api_url, repo_id, path)
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(t) = &self.token {
            match HeaderValue::from_str(&format!("Bearer {}", t)) {
                Ok(val) => {
                    headers.insert(AUTHORIZATION, val);
                }
                Err(_) => warn!("OSF token contains characters not allowed in a header"),
            }
        }
        headers
    }

    /// Storage path of the repository's top-level `raw` folder, e.g.
    /// `/5f1c0a.../`. The path is opaque and is only ever appended to
    /// upload URLs.
    pub fn resolve_raw_path(&self, repo_id: &str) -> Result<String> {
        let url = self.storage_url(repo_id, "/");
        debug!(url = %url, "resolving raw folder");
        let listing: StorageListing = self
            .client
            .get(&url)
            .send()
            .and_then(|res| res.json())
            .map_err(|e| {
                debug!(url = %url, error = %e, "storage listing unavailable");
                Error::Connection(url.clone())
            })?;
        let entries = listing.data.ok_or_else(|| Error::Connection(url.clone()))?;
        raw_path_in(&entries).ok_or_else(|| Error::NotFound(repo_id.to_string()))
    }

    /// PUT `body` as a new file called `name` inside the folder at
    /// `folder_path`.
    pub fn upload(
        &self,
        repo_id: &str,
        folder_path: &str,
        name: &str,
        body: Vec<u8>,
    ) -> UploadOutcome {
        let url = self.storage_url(repo_id, folder_path);
        debug!(url = %url, name, bytes = body.len(), "uploading");
        let res = self
            .client
            .put(&url)
            .query(&[("kind", "file"), ("name", name)])
            .headers(self.auth_headers())
            .body(body)
            .send();
        match res {
            Ok(res) => UploadOutcome::from_status(res.status()),
            Err(e) => UploadOutcome::Failed(e.to_string()),
        }
    }
}

/// Path of the first entry named `raw`.
pub fn raw_path_in(entries: &[StorageEntry]) -> Option<String> {
    entries
        .iter()
        .find(|e| e.attributes.name == "raw")
        .map(|e| e.attributes.path.clone())
}
