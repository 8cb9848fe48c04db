//! Data-shaping and interaction layer behind a per-region crime choropleth.

pub mod aggregate;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod map;
pub mod names;
pub mod server;
pub mod sort;
pub mod store;
pub mod types;
pub mod viewport;
