// src/pipeline/mod.rs

//! Chart pipelines: load → decode → (remap) → build spec → render.
//!
//! Every job runs as its own tokio task. Tasks share only read-only state
//! (loader, renderer, settings), so a failure in one chart never touches
//! another.

pub mod error;

pub use error::PipelineError;

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn, Level};

use crate::charts::{self, BOUNDARY_NAME_PATH, INCOME_FIELD};
use crate::config::{ChartJob, ChartKind, Settings};
use crate::data::{decode_csv, decode_json, remap_states, Dataset, STATE_COLUMN};
use crate::fetch::Loader;
use crate::render::Renderer;
use crate::spec::{resolve_path, ChartSpec, Data, Transform};

/// What a successful pipeline produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub rows: usize,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub job: ChartJob,
    pub result: Result<PipelineOutcome, PipelineError>,
}

impl PipelineReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Boundary names that did / did not pick up an income value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryCoverage {
    pub matched: Vec<String>,
    pub unmatched: Vec<String>,
    /// Dataset states no boundary refers to.
    pub unused: Vec<String>,
}

/// Build the spec for `kind` around `rows`; the map remaps states first.
pub fn build_spec(kind: ChartKind, rows: Dataset, settings: &Settings) -> ChartSpec {
    match kind {
        ChartKind::Bar => charts::earnings_bar(rows),
        ChartKind::Line => charts::earnings_line(rows),
        ChartKind::Map => charts::income_map(remap_states(rows), &settings.boundaries),
    }
}

/// Join `spec`'s income values onto `features` and report which boundaries
/// would stay uncoloured.
pub fn boundary_coverage(spec: &ChartSpec, features: &Dataset) -> Result<BoundaryCoverage> {
    let lookup = charts::map_lookup(spec).context("spec has no lookup transform")?;
    let joined = lookup.apply(features)?;

    let mut cov = BoundaryCoverage::default();
    let mut seen = HashSet::new();
    for rec in &joined {
        let Some(name) = resolve_path(rec, BOUNDARY_NAME_PATH).and_then(Value::as_str) else {
            continue;
        };
        seen.insert(name.to_string());
        match rec.get(INCOME_FIELD) {
            Some(v) if !v.is_null() => cov.matched.push(name.to_string()),
            _ => cov.unmatched.push(name.to_string()),
        }
    }

    if let Data::Inline { values } = &lookup.from.data {
        cov.unused = values
            .iter()
            .filter_map(|r| match r.get(STATE_COLUMN) {
                Some(Value::String(s)) if !seen.contains(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
    }
    Ok(cov)
}

async fn check_boundaries(loader: &Loader, spec: &ChartSpec, boundaries: &str) -> Result<()> {
    let bytes = loader.load(boundaries).await?;
    let features = decode_json(&bytes, Some("features"))?;
    let cov = boundary_coverage(spec, &features)?;

    info!(
        matched = cov.matched.len(),
        unmatched = cov.unmatched.len(),
        "boundary coverage"
    );
    for name in &cov.unmatched {
        warn!(state = %name, "boundary has no income value");
    }
    for name in &cov.unused {
        warn!(state = %name, "income row matches no boundary");
    }
    Ok(())
}

fn log_long_form(spec: &ChartSpec) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    let Some(values) = spec.inline_values() else {
        return;
    };
    for t in &spec.transform {
        if let Transform::Fold(f) = t {
            debug!(rows = values.len(), folded = f.apply(values).len(), "long-form rows");
        }
    }
}

/// Run one chart pipeline start to finish.
///
/// Steps run strictly in order; the first failure ends the pipeline.
#[instrument(level = "info", skip_all, fields(chart = %job.target, kind = job.kind.as_str()))]
pub async fn run_pipeline<R: Renderer + ?Sized>(
    loader: &Loader,
    renderer: &R,
    job: &ChartJob,
    settings: &Settings,
) -> Result<PipelineOutcome, PipelineError> {
    let start = Instant::now();

    let bytes = loader
        .load(&job.source)
        .await
        .map_err(|cause| PipelineError::Fetch {
            path: job.source.clone(),
            cause,
        })?;

    let rows = decode_csv(&bytes).map_err(|cause| PipelineError::Decode {
        path: job.source.clone(),
        cause,
    })?;
    let row_count = rows.len();
    info!(source = %job.source, rows = row_count, "loaded");

    let spec = build_spec(job.kind, rows, settings);
    log_long_form(&spec);

    if job.kind == ChartKind::Map && settings.check_boundaries {
        if let Err(e) = check_boundaries(loader, &spec, &settings.boundaries).await {
            warn!(
                boundaries = %settings.boundaries,
                error = %format!("{:#}", e),
                "boundary check skipped"
            );
        }
    }

    renderer
        .embed(&job.target, &spec)
        .await
        .map_err(|cause| PipelineError::Render {
            target: job.target.clone(),
            cause,
        })?;

    info!(elapsed = ?start.elapsed(), "chart done");
    Ok(PipelineOutcome { rows: row_count })
}

/// Launch every configured pipeline concurrently and wait for all of them.
///
/// Failures are logged and reported per job; they are never retried.
pub async fn run_all<R: Renderer + ?Sized + 'static>(
    loader: Arc<Loader>,
    renderer: Arc<R>,
    settings: Arc<Settings>,
) -> Vec<PipelineReport> {
    let mut handles = Vec::with_capacity(settings.charts.len());
    for job in settings.charts.iter().cloned() {
        let loader = Arc::clone(&loader);
        let renderer = Arc::clone(&renderer);
        let settings = Arc::clone(&settings);
        let task_job = job.clone();
        let handle = tokio::spawn(async move {
            run_pipeline(&loader, renderer.as_ref(), &task_job, &settings).await
        });
        handles.push((job, handle));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for (job, handle) in handles {
        let result = match handle.await {
            Ok(r) => r,
            Err(e) => Err(PipelineError::Task {
                target: job.target.clone(),
                message: e.to_string(),
            }),
        };
        if let Err(e) = &result {
            error!(chart = %job.target, kind = e.kind(), "{}", e);
        }
        reports.push(PipelineReport { job, result });
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use reqwest::Client;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    use crate::render::FileRenderer;

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,earnings_charts=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    /// Keeps every embedded spec; fails for targets listed in `fail_on`.
    #[derive(Default)]
    struct RecordingRenderer {
        fail_on: Vec<String>,
        embedded: Mutex<Vec<(String, ChartSpec)>>,
    }

    impl RecordingRenderer {
        fn targets(&self) -> Vec<String> {
            let mut t: Vec<String> = self
                .embedded
                .lock()
                .unwrap()
                .iter()
                .map(|(t, _)| t.clone())
                .collect();
            t.sort();
            t
        }

        fn spec_for(&self, target: &str) -> Option<ChartSpec> {
            self.embedded
                .lock()
                .unwrap()
                .iter()
                .find(|(t, _)| t == target)
                .map(|(_, s)| s.clone())
        }
    }

    impl Renderer for RecordingRenderer {
        fn embed<'a>(
            &'a self,
            target: &'a str,
            spec: &'a ChartSpec,
        ) -> BoxFuture<'a, Result<()>> {
            async move {
                if self.fail_on.iter().any(|t| t == target) {
                    bail!("engine rejected spec for {}", target);
                }
                self.embedded
                    .lock()
                    .unwrap()
                    .push((target.to_string(), spec.clone()));
                Ok(())
            }
            .boxed()
        }
    }

    fn write_fixtures(dir: &Path) {
        std::fs::write(
            dir.join("cleaned_data_by_industry.csv"),
            "Industry,Males,Females\nMining,2900,2400\nRetail,1000,900\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("cleaned_data_by_time.csv"),
            "Time,Males,Females\nMay-2012,1100,800\nNov-2012,1120,815\nMay-2013,1150,830\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("cleaned_data_by_state.csv"),
            "State,Average Income\nNSW,1500\nVic.,1400\nUnknown,1200\n",
        )
        .unwrap();
        let geo = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"STATE_NAME": "New South Wales"}, "geometry": null},
                {"type": "Feature", "properties": {"STATE_NAME": "Victoria"}, "geometry": null},
                {"type": "Feature", "properties": {"STATE_NAME": "Other Territories"}, "geometry": null}
            ]
        });
        std::fs::write(
            dir.join("australian-states.min.geojson"),
            serde_json::to_vec(&geo).unwrap(),
        )
        .unwrap();
    }

    fn setup(dir: &Path) -> (Arc<Loader>, Arc<Settings>) {
        let loader = Loader::new(Client::new(), dir.to_str().unwrap()).unwrap();
        let settings = Settings {
            base: dir.display().to_string(),
            out_dir: dir.to_path_buf(),
            ..Settings::default()
        };
        (Arc::new(loader), Arc::new(settings))
    }

    #[tokio::test]
    async fn test_all_pipelines_render() -> Result<()> {
        init_test_logging();
        let tmp = tempdir()?;
        write_fixtures(tmp.path());
        let (loader, settings) = setup(tmp.path());
        let renderer = Arc::new(RecordingRenderer::default());

        let reports = run_all(loader, Arc::clone(&renderer), settings).await;

        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(PipelineReport::is_ok));
        let rows: Vec<usize> = reports
            .iter()
            .map(|r| r.result.as_ref().unwrap().rows)
            .collect();
        assert_eq!(rows, vec![2, 3, 3]);
        assert_eq!(
            renderer.targets(),
            vec!["earnings-chart", "line-chart", "map-container"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_failure_is_isolated() -> Result<()> {
        init_test_logging();
        let tmp = tempdir()?;
        write_fixtures(tmp.path());
        std::fs::remove_file(tmp.path().join("cleaned_data_by_industry.csv"))?;
        let (loader, settings) = setup(tmp.path());
        let renderer = Arc::new(RecordingRenderer::default());

        let reports = run_all(loader, Arc::clone(&renderer), settings).await;

        let failed: Vec<&PipelineReport> = reports.iter().filter(|r| !r.is_ok()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].job.target, "earnings-chart");
        assert!(matches!(
            failed[0].result,
            Err(PipelineError::Fetch { ref path, .. }) if path == "cleaned_data_by_industry.csv"
        ));
        assert_eq!(renderer.targets(), vec!["line-chart", "map-container"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_render_failure_is_isolated() -> Result<()> {
        let tmp = tempdir()?;
        write_fixtures(tmp.path());
        let (loader, settings) = setup(tmp.path());
        let renderer = Arc::new(RecordingRenderer {
            fail_on: vec!["line-chart".to_string()],
            ..RecordingRenderer::default()
        });

        let reports = run_all(loader, Arc::clone(&renderer), settings).await;

        let kinds: Vec<Option<&str>> = reports
            .iter()
            .map(|r| r.result.as_ref().err().map(PipelineError::kind))
            .collect();
        assert_eq!(kinds, vec![None, Some("render"), None]);
        assert_eq!(renderer.targets(), vec!["earnings-chart", "map-container"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_map_pipeline_remaps_states() -> Result<()> {
        let tmp = tempdir()?;
        write_fixtures(tmp.path());
        let (loader, settings) = setup(tmp.path());
        let renderer = RecordingRenderer::default();

        run_pipeline(&loader, &renderer, &settings.charts[2], &settings)
            .await
            .unwrap();

        let spec = renderer.spec_for("map-container").unwrap();
        let lookup = charts::map_lookup(&spec).unwrap();
        let Data::Inline { values } = &lookup.from.data else {
            panic!("lookup source should be inline");
        };
        let states: Vec<&Value> = values.iter().map(|r| &r["State"]).collect();
        assert_eq!(
            states,
            vec![&json!("New South Wales"), &json!("Victoria"), &json!("Unknown")]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_boundaries_do_not_block_map() -> Result<()> {
        let tmp = tempdir()?;
        write_fixtures(tmp.path());
        std::fs::remove_file(tmp.path().join("australian-states.min.geojson"))?;
        let (loader, settings) = setup(tmp.path());
        let renderer = RecordingRenderer::default();

        let outcome = run_pipeline(&loader, &renderer, &settings.charts[2], &settings)
            .await
            .unwrap();
        assert_eq!(outcome.rows, 3);
        assert_eq!(renderer.targets(), vec!["map-container"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_csv_is_decode_error() -> Result<()> {
        let tmp = tempdir()?;
        write_fixtures(tmp.path());
        std::fs::write(
            tmp.path().join("cleaned_data_by_time.csv"),
            b"Time,Males\n\xff,1\n",
        )?;
        let (loader, settings) = setup(tmp.path());
        let renderer = RecordingRenderer::default();

        let err = run_pipeline(&loader, &renderer, &settings.charts[1], &settings)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "decode");
        assert!(renderer.targets().is_empty());
        Ok(())
    }

    #[test]
    fn test_boundary_coverage() -> Result<()> {
        let income: Dataset = serde_json::from_value(json!([
            {"State": "NSW", "Average Income": 1500},
            {"State": "Qld", "Average Income": 1350},
            {"State": "Unknown", "Average Income": 1200},
        ]))?;
        let features: Dataset = serde_json::from_value(json!([
            {"properties": {"STATE_NAME": "New South Wales"}},
            {"properties": {"STATE_NAME": "Queensland"}},
            {"properties": {"STATE_NAME": "Other Territories"}},
            {"properties": {}},
        ]))?;
        let spec = build_spec(ChartKind::Map, income, &Settings::default());

        let cov = boundary_coverage(&spec, &features)?;
        assert_eq!(cov.matched, vec!["New South Wales", "Queensland"]);
        assert_eq!(cov.unmatched, vec!["Other Territories"]);
        assert_eq!(cov.unused, vec!["Unknown"]);

        let bar = build_spec(ChartKind::Bar, Vec::new(), &Settings::default());
        assert!(boundary_coverage(&bar, &features).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_end_to_end_with_file_renderer() -> Result<()> {
        let tmp = tempdir()?;
        write_fixtures(tmp.path());
        let (loader, settings) = setup(tmp.path());
        let out = tmp.path().join("site");
        let renderer = Arc::new(FileRenderer::new(&out));

        let reports = run_all(loader, renderer, settings).await;
        assert!(reports.iter().all(PipelineReport::is_ok));

        let line: Value =
            serde_json::from_slice(&std::fs::read(out.join("line-chart.vl.json"))?)?;
        assert_eq!(line["data"]["values"][2]["Time"], json!("May-2013"));
        assert!(out.join("earnings-chart.vl.json").exists());
        assert!(out.join("map-container.vl.json").exists());
        Ok(())
    }
}
