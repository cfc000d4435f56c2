// src/spec/transform.rs

use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;

use super::Data;
use crate::data::{Dataset, Row};

/// Post-load transforms, applied in order by the renderer.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Transform {
    Fold(FoldTransform),
    Lookup(LookupTransform),
}

impl Transform {
    /// Evaluate a self-contained transform over `rows`.
    ///
    /// A lookup only runs locally when its secondary source is inline.
    pub fn apply(&self, rows: &[Row]) -> Result<Dataset> {
        match self {
            Transform::Fold(f) => Ok(f.apply(rows)),
            Transform::Lookup(l) => l.apply(rows),
        }
    }
}

/// Wide → long: each folded column becomes its own row.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FoldTransform {
    pub fold: Vec<String>,
    /// `[key, value]` output column names.
    #[serde(rename = "as")]
    pub as_: [String; 2],
}

impl FoldTransform {
    pub fn new<S: Into<String>>(
        fields: impl IntoIterator<Item = S>,
        key: &str,
        value: &str,
    ) -> Self {
        Self {
            fold: fields.into_iter().map(Into::into).collect(),
            as_: [key.to_string(), value.to_string()],
        }
    }

    pub fn apply(&self, rows: &[Row]) -> Dataset {
        fold(rows, &self.fold, &self.as_[0], &self.as_[1])
    }
}

/// Join fields from a secondary dataset onto each record.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LookupTransform {
    /// Dotted path into the primary record.
    pub lookup: String,
    pub from: LookupData,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LookupData {
    pub data: Data,
    pub key: String,
    pub fields: Vec<String>,
}

impl LookupTransform {
    pub fn apply(&self, primary: &[Row]) -> Result<Dataset> {
        match &self.from.data {
            Data::Inline { values } => Ok(lookup(
                primary,
                &self.lookup,
                values,
                &self.from.key,
                &self.from.fields,
            )),
            Data::Url { url, .. } => bail!("lookup source {} is not inline", url),
        }
    }
}

/// Fold `fields` of every row into `key`/`value` pairs.
///
/// Output is row-major: all folded rows of input row 0, then row 1, and so
/// on, `rows.len() * fields.len()` in total. Columns not being folded are
/// copied to every output row; a missing folded column yields a null value.
pub fn fold(rows: &[Row], fields: &[String], key: &str, value: &str) -> Dataset {
    let mut out = Vec::with_capacity(rows.len() * fields.len());
    for row in rows {
        let base: Row = row
            .iter()
            .filter(|(name, _)| !fields.contains(*name))
            .map(|(name, v)| (name.clone(), v.clone()))
            .collect();
        for field in fields {
            let mut r = base.clone();
            r.insert(key.to_string(), Value::String(field.clone()));
            r.insert(
                value.to_string(),
                row.get(field).cloned().unwrap_or(Value::Null),
            );
            out.push(r);
        }
    }
    out
}

/// Resolve a dotted path such as `properties.STATE_NAME`.
pub fn resolve_path<'a>(row: &'a Row, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut cur = row.get(parts.next()?)?;
    for part in parts {
        cur = cur.as_object()?.get(part)?;
    }
    Some(cur)
}

/// Text form of a join key: strings as-is, other scalars as printed, so
/// `"1"` and `1` land on the same key.
fn key_text(v: &Value) -> Cow<'_, str> {
    match v {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Copy `fields` from the `from` row whose `key` equals the record's
/// `lookup_path` value.
///
/// Records without a match are returned without the joined fields. When
/// several `from` rows share a key the last one wins.
pub fn lookup(
    primary: &[Row],
    lookup_path: &str,
    from: &[Row],
    key: &str,
    fields: &[String],
) -> Dataset {
    let index: HashMap<Cow<'_, str>, &Row> = from
        .iter()
        .filter_map(|r| r.get(key).map(|k| (key_text(k), r)))
        .collect();

    primary
        .iter()
        .map(|rec| {
            let mut out = rec.clone();
            let matched =
                resolve_path(rec, lookup_path).and_then(|k| index.get(&*key_text(k)));
            if let Some(m) = matched {
                for f in fields {
                    if let Some(v) = m.get(f) {
                        out.insert(f.clone(), v.clone());
                    }
                }
            }
            out
        })
        .collect()
}
