//! Incremental topology building and export.

pub mod build;
pub mod csv;
pub mod label;

pub use build::{apply_hop, build_topology, finalize, reset};
pub use csv::{export_csv, CSV_HEADER};
pub use label::hop_label;
