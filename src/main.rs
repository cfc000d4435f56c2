use anyhow::Result;
use earnings_charts::{
    config::{Settings, SETTINGS_FILE},
    fetch::Loader,
    pipeline,
    render::{write_page, FileRenderer},
};
use reqwest::Client;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,earnings_charts=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) settings + collaborators ─────────────────────────────────
    let settings = Settings::load_or_default(SETTINGS_FILE)?;
    let loader = Loader::new(Client::new(), &settings.base)?;
    let renderer = FileRenderer::new(&settings.out_dir);
    info!(base = %loader.base(), out_dir = %settings.out_dir.display(), "configured");

    // ─── 3) host page ────────────────────────────────────────────────
    write_page(&settings.out_dir, &settings.title, &settings.targets()).await?;

    // ─── 4) fan out one task per chart ───────────────────────────────
    let start = Instant::now();
    let reports = pipeline::run_all(
        Arc::new(loader),
        Arc::new(renderer),
        Arc::new(settings),
    )
    .await;

    // ─── 5) summary ──────────────────────────────────────────────────
    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    for r in reports.iter().filter(|r| !r.is_ok()) {
        if let Err(e) = &r.result {
            warn!(chart = %r.job.target, kind = e.kind(), "not rendered");
        }
    }
    if failed == reports.len() && !reports.is_empty() {
        error!("no chart rendered");
    }
    info!(
        rendered = reports.len() - failed,
        failed,
        elapsed = ?start.elapsed(),
        "all done"
    );
    Ok(())
}
