// src/render/mod.rs

pub mod page;

pub use page::write_page;

use anyhow::{bail, Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

use crate::spec::ChartSpec;

/// Takes a finished specification and draws it into the output location
/// named `target`.
pub trait Renderer: Send + Sync {
    fn embed<'a>(&'a self, target: &'a str, spec: &'a ChartSpec) -> BoxFuture<'a, Result<()>>;
}

/// Reject specs the drawing engine could not use at all.
pub fn check_spec(target: &str, spec: &ChartSpec) -> Result<()> {
    if target.trim().is_empty() {
        bail!("empty output location");
    }
    if target.contains(['/', '\\']) {
        bail!("output location {:?} must be a plain id", target);
    }
    if spec.data.is_none() {
        bail!("spec for {} has no data source", target);
    }
    if spec.field_refs().iter().any(|f| f.is_empty()) {
        bail!("spec for {} encodes an empty field name", target);
    }
    Ok(())
}

/// Writes each spec as `<out_dir>/<target>.vl.json`, picked up by the host
/// page's embed script.
#[derive(Debug, Clone)]
pub struct FileRenderer {
    out_dir: PathBuf,
}

impl FileRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn spec_path(&self, target: &str) -> PathBuf {
        self.out_dir.join(spec_file_name(target))
    }

    async fn write_spec(&self, target: &str, spec: &ChartSpec) -> Result<()> {
        check_spec(target, spec)?;
        let json = serde_json::to_string_pretty(spec).context("serializing spec")?;
        fs::create_dir_all(&self.out_dir)
            .await
            .with_context(|| format!("creating {:?}", self.out_dir))?;
        let path = self.spec_path(target);
        fs::write(&path, json.as_bytes())
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        debug!(bytes = json.len(), "spec written");
        info!(target_id = %target, path = %path.display(), "rendered");
        Ok(())
    }
}

impl Renderer for FileRenderer {
    fn embed<'a>(&'a self, target: &'a str, spec: &'a ChartSpec) -> BoxFuture<'a, Result<()>> {
        self.write_spec(target, spec).boxed()
    }
}

/// `earnings-chart` → `earnings-chart.vl.json`
pub fn spec_file_name(target: &str) -> String {
    format!("{}.vl.json", target)
}
