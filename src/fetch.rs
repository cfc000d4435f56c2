// src/fetch.rs

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};
use url::Url;

/// Fetches data files by path relative to a base location, the way a page
/// resolves relative URLs against its own address.
///
/// The base is either an `http(s)://` URL or a local directory.
#[derive(Clone, Debug)]
pub struct Loader {
    client: Client,
    base: Url,
}

impl Loader {
    pub fn new(client: Client, base: &str) -> Result<Self> {
        let base = match Url::parse(base) {
            Ok(url) if matches!(url.scheme(), "http" | "https" | "file") => as_directory(url),
            _ => dir_url(Path::new(base))?,
        };
        debug!(%base, "loader base");
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute location of `path`.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("resolving {} against {}", path, self.base))
    }

    /// Load the raw bytes behind `path`.
    ///
    /// A missing file, a transport error or a non-success HTTP status is an
    /// error. Nothing is retried.
    #[instrument(level = "debug", skip(self), fields(base = %self.base))]
    pub async fn load(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.resolve(path)?;
        let bytes = match url.scheme() {
            "http" | "https" => self
                .client
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("GET {} failed", url))?
                .error_for_status()
                .with_context(|| format!("Non-success status {}", url))?
                .bytes()
                .await
                .with_context(|| format!("Reading body from {}", url))?
                .to_vec(),
            "file" => {
                let p = url
                    .to_file_path()
                    .map_err(|_| anyhow!("{} is not a local path", url))?;
                fs::read(&p)
                    .await
                    .with_context(|| format!("reading {}", p.display()))?
            }
            other => bail!("unsupported scheme {} in {}", other, url),
        };
        debug!(%url, bytes = bytes.len(), "loaded");
        Ok(bytes)
    }
}

/// Make `url` join like a directory: `a/b` → `a/b/`.
fn as_directory(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn dir_url(dir: &Path) -> Result<Url> {
    let abs = std::fs::canonicalize(dir)
        .with_context(|| format!("base directory {} not found", dir.display()))?;
    Url::from_directory_path(&abs).map_err(|_| anyhow!("{} is not an absolute path", abs.display()))
}
