// src/data/mod.rs

pub mod decode;
pub mod remap;
pub mod utils;

pub use decode::{decode_csv, decode_json};
pub use remap::{full_state_name, remap_states, STATE_COLUMN};

/// One CSV record: column name → scalar, in header order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Records in source order.
pub type Dataset = Vec<Row>;
