pub mod charts;
pub mod config;
pub mod data;
pub mod fetch;
pub mod pipeline;
pub mod render;
pub mod spec;
