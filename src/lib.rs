//! Administrative borders from OpenStreetMap extracts.
//!
//! An OSM document is streamed through `etl::graph_builder::GraphBuilder`,
//! each relation's ways are stitched by `data::border::Border::assemble`, and
//! the result lands in an xz-compressed border store that `store::search`
//! scans by name.

pub mod data;
pub mod errors;
pub mod etl;
pub mod store;
