// src/data/remap.rs

use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;

use super::{Dataset, Row};

/// Column holding the state abbreviation in the by-state CSV.
pub const STATE_COLUMN: &str = "State";

static STATE_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("NSW", "New South Wales"),
        ("Vic.", "Victoria"),
        ("Qld", "Queensland"),
        ("SA", "South Australia"),
        ("WA", "Western Australia"),
        ("Tas.", "Tasmania"),
        ("NT", "Northern Territory"),
        ("ACT", "Australian Capital Territory"),
    ])
});

/// Full name for a known abbreviation, otherwise the input itself.
pub fn full_state_name(name: &str) -> &str {
    STATE_NAMES.get(name).copied().unwrap_or(name)
}

fn remap_row(mut row: Row) -> Row {
    if let Some(Value::String(state)) = row.get_mut(STATE_COLUMN) {
        let full = full_state_name(state);
        if full != state.as_str() {
            *state = full.to_string();
        }
    }
    row
}

/// Replace abbreviated `State` values with full names, row by row.
pub fn remap_states(rows: Dataset) -> Dataset {
    rows.into_iter().map(remap_row).collect()
}
