// src/charts.rs

//! The three chart templates. Each builder takes ownership of its dataset
//! and embeds it inline in the returned specification.

use crate::data::{Dataset, STATE_COLUMN};
use crate::spec::{
    Axis, AxisConfig, ChartSpec, Config, Data, DataFormat, FacetConfig, FieldDef, FieldType,
    FoldTransform, LookupData, LookupTransform, MarkDef, MarkType, PointOverlay, Projection,
    ProjectionType, Scale, Sort, SortOrder, Transform,
};

pub const GENDER_FIELDS: [&str; 2] = ["Males", "Females"];
pub const GENDER_COLORS: [&str; 2] = ["#1f77b4", "#ff7f0e"];
pub const GENDER: &str = "Gender";
pub const VALUE: &str = "value";
pub const INCOME_FIELD: &str = "Average Income";
pub const BOUNDARY_NAME_PATH: &str = "properties.STATE_NAME";

fn gender_fold() -> Transform {
    Transform::Fold(FoldTransform::new(GENDER_FIELDS, GENDER, VALUE))
}

fn gender_scale() -> Scale {
    Scale {
        domain: Some(GENDER_FIELDS.iter().map(|s| s.to_string()).collect()),
        range: Some(GENDER_COLORS.iter().map(|s| s.to_string()).collect()),
        scheme: None,
    }
}

/// Male vs female weekly earnings per industry, grouped bars.
pub fn earnings_bar(values: Dataset) -> ChartSpec {
    let mut mark = MarkDef::new(MarkType::Bar);
    mark.tooltip = Some(true);
    mark.size = Some(10.0);

    let mut spec = ChartSpec::new(mark);
    spec.description = Some("Average weekly earnings by industry.".to_string());
    spec.width = Some(800);
    spec.height = Some(400);
    spec.data = Some(Data::Inline { values });
    spec.transform = vec![gender_fold()];

    spec.encoding.x = Some(
        FieldDef::new(VALUE, FieldType::Quantitative).with_axis(Axis::titled("Earnings ($)")),
    );
    spec.encoding.y = Some(
        FieldDef::new("Industry", FieldType::Nominal)
            .with_axis(Axis {
                label_limit: Some(400),
                label_font_size: Some(12),
                label_padding: Some(10),
                ..Axis::titled("Industry")
            })
            .sorted(Sort::ByField {
                field: VALUE.to_string(),
                order: SortOrder::Descending,
            }),
    );
    spec.encoding.color =
        Some(FieldDef::new(GENDER, FieldType::Nominal).with_scale(gender_scale()));
    spec.encoding.y_offset = Some(FieldDef::new(GENDER, FieldType::Nominal));

    spec.config = Some(Config {
        facet: Some(FacetConfig { spacing: 15 }),
        axis: Some(AxisConfig { label_font_size: 12 }),
        ..Config::borderless()
    });
    spec
}

/// Male and female weekly cash earnings over time, one line each.
pub fn earnings_line(values: Dataset) -> ChartSpec {
    let mut mark = MarkDef::new(MarkType::Line);
    mark.tooltip = Some(true);
    mark.point = Some(PointOverlay {
        filled: true,
        fill: "white".to_string(),
    });

    let mut spec = ChartSpec::new(mark);
    spec.description =
        Some("Average weekly cash earnings for males and females over time.".to_string());
    spec.width = Some(800);
    spec.height = Some(300);
    spec.data = Some(Data::Inline { values });
    spec.transform = vec![gender_fold()];

    // rows are already chronological; sorting would reorder labels like "May-2012"
    spec.encoding.x = Some(
        FieldDef::new("Time", FieldType::Ordinal)
            .with_axis(Axis {
                label_angle: Some(-45),
                ..Axis::titled("Time")
            })
            .sorted(Sort::Natural),
    );
    spec.encoding.y = Some(
        FieldDef::new(VALUE, FieldType::Quantitative).with_axis(Axis::titled("Earnings (AUD)")),
    );
    spec.encoding.color = Some(
        FieldDef::new(GENDER, FieldType::Nominal)
            .with_scale(gender_scale())
            .with_legend(GENDER),
    );
    spec.encoding.tooltip = Some(vec![
        FieldDef::new("Time", FieldType::Ordinal).titled("Time"),
        FieldDef::new(GENDER, FieldType::Nominal).titled(GENDER),
        FieldDef::new(VALUE, FieldType::Quantitative)
            .titled("Earnings (AUD)")
            .formatted("$,.2f"),
    ]);

    spec.config = Some(Config::borderless());
    spec
}

/// Choropleth of average weekly income, joining `values` (full state names)
/// onto the boundary features at `boundaries_url`.
pub fn income_map(values: Dataset, boundaries_url: &str) -> ChartSpec {
    let mut spec = ChartSpec::new(MarkType::Geoshape);
    spec.title = Some("Average Income Weekly in Australia".to_string());
    spec.width = Some(800);
    spec.height = Some(450);
    spec.data = Some(Data::Url {
        url: boundaries_url.to_string(),
        format: Some(DataFormat {
            kind: "json".to_string(),
            property: Some("features".to_string()),
        }),
    });
    spec.transform = vec![Transform::Lookup(LookupTransform {
        lookup: BOUNDARY_NAME_PATH.to_string(),
        from: LookupData {
            data: Data::Inline { values },
            key: STATE_COLUMN.to_string(),
            fields: vec![INCOME_FIELD.to_string()],
        },
    })];
    spec.projection = Some(Projection {
        kind: ProjectionType::EqualEarth,
        center: Some([132.0, -28.0]),
        rotate: Some([0.0, 0.0, 0.0]),
        scale: Some(800.0),
    });

    spec.encoding.color = Some(
        FieldDef::new(INCOME_FIELD, FieldType::Quantitative)
            .with_scale(Scale {
                scheme: Some("blues".to_string()),
                ..Scale::default()
            })
            .with_legend(INCOME_FIELD),
    );
    spec.encoding.tooltip = Some(vec![
        FieldDef::new(BOUNDARY_NAME_PATH, FieldType::Nominal).titled("State"),
        FieldDef::new(INCOME_FIELD, FieldType::Quantitative).titled("Income"),
    ]);

    spec.config = Some(Config::borderless());
    spec
}

/// The lookup transform of a map spec, if it has one.
pub fn map_lookup(spec: &ChartSpec) -> Option<&LookupTransform> {
    spec.transform.iter().find_map(|t| match t {
        Transform::Lookup(l) => Some(l),
        _ => None,
    })
}
