//! Vega-Lite specification model.
//!
//! Only the subset of the grammar the charts use is modelled. Every type is
//! plain data: it is built once, serialized, and handed to the renderer.
//! Optional members are skipped when unset so the emitted JSON stays close
//! to what one would write by hand.

pub mod encoding;
pub mod transform;

pub use encoding::{Axis, Encoding, FieldDef, FieldType, Legend, Scale, Sort, SortOrder};
pub use transform::{
    fold, lookup, resolve_path, FoldTransform, LookupData, LookupTransform, Transform,
};

use serde::Serialize;

use crate::data::Dataset;

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Top-level single-view Vega-Lite specification.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartSpec {
    #[serde(rename = "$schema")]
    pub schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transform: Vec<Transform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<Projection>,
    pub mark: Mark,
    pub encoding: Encoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Config>,
}

impl ChartSpec {
    pub fn new(mark: impl Into<Mark>) -> Self {
        Self {
            schema: VEGA_LITE_SCHEMA.to_string(),
            title: None,
            description: None,
            width: None,
            height: None,
            data: None,
            transform: Vec::new(),
            projection: None,
            mark: mark.into(),
            encoding: Encoding::default(),
            config: None,
        }
    }

    /// Every field name referenced by an encoding channel, in channel order.
    pub fn field_refs(&self) -> Vec<&str> {
        let e = &self.encoding;
        [&e.x, &e.y, &e.color, &e.y_offset]
            .into_iter()
            .flatten()
            .chain(e.tooltip.iter().flatten())
            .map(|f| f.field.as_str())
            .collect()
    }

    /// Inline rows carried by the top-level data source, if any.
    pub fn inline_values(&self) -> Option<&Dataset> {
        match &self.data {
            Some(Data::Inline { values }) => Some(values),
            _ => None,
        }
    }
}

/// Either rows embedded in the spec or a URL the renderer fetches itself.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Data {
    Inline {
        values: Dataset,
    },
    Url {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<DataFormat>,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DataFormat {
    #[serde(rename = "type")]
    pub kind: String,
    /// JSON property holding the record array, e.g. `features`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    Bar,
    Line,
    Geoshape,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Mark {
    Bare(MarkType),
    Def(MarkDef),
}

impl Mark {
    pub fn kind(&self) -> MarkType {
        match self {
            Mark::Bare(t) => *t,
            Mark::Def(d) => d.kind,
        }
    }
}

impl From<MarkType> for Mark {
    fn from(t: MarkType) -> Self {
        Mark::Bare(t)
    }
}

impl From<MarkDef> for Mark {
    fn from(d: MarkDef) -> Self {
        Mark::Def(d)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarkDef {
    #[serde(rename = "type")]
    pub kind: MarkType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point: Option<PointOverlay>,
}

impl MarkDef {
    pub fn new(kind: MarkType) -> Self {
        Self {
            kind,
            tooltip: None,
            size: None,
            point: None,
        }
    }
}

/// Point markers drawn on top of a line.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PointOverlay {
    pub filled: bool,
    pub fill: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProjectionType {
    EqualEarth,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Projection {
    #[serde(rename = "type")]
    pub kind: ProjectionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet: Option<FacetConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis: Option<AxisConfig>,
}

impl Config {
    /// Drop the border around the plotting area.
    pub fn borderless() -> Self {
        Self {
            view: Some(ViewConfig {
                stroke: "transparent".to_string(),
            }),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ViewConfig {
    pub stroke: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FacetConfig {
    pub spacing: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AxisConfig {
    pub label_font_size: u32,
}
