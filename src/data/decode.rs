// src/data/decode.rs

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde_json::Value;
use tracing::{debug, trace};

use super::utils::parse_scalar;
use super::{Dataset, Row};

/// Decode CSV bytes into rows keyed by the header.
///
/// Short records are accepted and simply lack the trailing columns; cells
/// beyond the header width are dropped. An empty input yields no rows.
pub fn decode_csv(bytes: &[u8]) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header")?
        .iter()
        .map(str::to_string)
        .collect();
    trace!(?headers, "csv header");

    let mut rows = Dataset::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("reading CSV record {}", idx + 1))?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(name, cell)| (name.clone(), parse_scalar(cell)))
            .collect();
        rows.push(row);
    }

    debug!(rows = rows.len(), columns = headers.len(), "decoded csv");
    Ok(rows)
}

/// Decode a JSON document into rows, reading the record array from
/// `property` when given (e.g. `features` of a GeoJSON collection).
pub fn decode_json(bytes: &[u8], property: Option<&str>) -> Result<Dataset> {
    let doc: Value = serde_json::from_slice(bytes).context("parsing JSON document")?;
    let records = match property {
        Some(p) => doc
            .get(p)
            .with_context(|| format!("JSON document has no `{}` property", p))?,
        None => &doc,
    };
    let rows: Dataset = serde_json::from_value(records.clone())
        .context("JSON records are not an array of objects")?;
    debug!(rows = rows.len(), "decoded json");
    Ok(rows)
}
