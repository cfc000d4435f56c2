// src/render/page.rs

use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use super::spec_file_name;

const VEGA_SCRIPTS: &[&str] = &[
    "https://cdn.jsdelivr.net/npm/vega@5",
    "https://cdn.jsdelivr.net/npm/vega-lite@5",
    "https://cdn.jsdelivr.net/npm/vega-embed@6",
];

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Host page markup: one container per target, each filled from its
/// `<target>.vl.json` once the page has loaded.
pub fn page_html(title: &str, targets: &[&str]) -> String {
    let title = escape_html(title);
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("  <meta charset=\"utf-8\">\n");
    html.push_str(&format!("  <title>{}</title>\n", title));
    for src in VEGA_SCRIPTS {
        html.push_str(&format!("  <script src=\"{}\"></script>\n", src));
    }
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("  <h1>{}</h1>\n", title));
    for t in targets {
        html.push_str(&format!("  <div id=\"{}\"></div>\n", escape_html(t)));
    }

    let specs = targets
        .iter()
        .map(|t| {
            format!(
                "[{}, {}]",
                serde_json::Value::from(format!("#{}", t)),
                serde_json::Value::from(spec_file_name(t))
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    html.push_str("  <script>\n");
    html.push_str("    document.addEventListener('DOMContentLoaded', function () {\n");
    html.push_str(&format!("      [{}].forEach(function ([el, file]) {{\n", specs));
    html.push_str("        fetch(file)\n");
    html.push_str("          .then(function (r) { if (!r.ok) throw new Error(file + ': ' + r.status); return r.json(); })\n");
    html.push_str("          .then(function (spec) { return vegaEmbed(el, spec); })\n");
    html.push_str("          .catch(function (error) { console.error(error); });\n");
    html.push_str("      });\n");
    html.push_str("    });\n");
    html.push_str("  </script>\n");
    html.push_str(&format!(
        "  <footer><small>Generated {}</small></footer>\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    html.push_str("</body>\n</html>\n");
    html
}

/// Write `index.html` into `out_dir`, returning its path.
pub async fn write_page(out_dir: &Path, title: &str, targets: &[&str]) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("creating {:?}", out_dir))?;
    let path = out_dir.join("index.html");
    fs::write(&path, page_html(title, targets))
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), charts = targets.len(), "wrote host page");
    Ok(path)
}
